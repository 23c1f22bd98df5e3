//! Fast-path function call message.

use crate::error::{Error, Result};
use crate::protocol::codec::{
    MessageBuilder, ensure_frame_len, ensure_i16_len, ensure_i32_len, length_prefixed_len,
};
use crate::protocol::types::{FormatCode, Oid};

/// FunctionCall message - call a server function by OID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    function_id: Oid,
    argument_formats: Vec<FormatCode>,
    arguments: Vec<Option<Vec<u8>>>,
    result_format: FormatCode,
}

impl FunctionCall {
    /// Create a FunctionCall message.
    ///
    /// `argument_formats` follows the same zero/one/per-argument rule as Bind.
    pub fn new(
        function_id: Oid,
        argument_formats: Vec<FormatCode>,
        arguments: Vec<Option<Vec<u8>>>,
        result_format: FormatCode,
    ) -> Result<Self> {
        ensure_i16_len("argument_formats", argument_formats.len())?;
        ensure_i16_len("arguments", arguments.len())?;
        if argument_formats.len() > 1 && argument_formats.len() != arguments.len() {
            return Err(Error::InvalidField {
                field: "argument_formats",
                reason: "must have zero, one, or one entry per argument",
            });
        }
        for value in arguments.iter().flatten() {
            ensure_i32_len("arguments", value.len())?;
        }
        let payload_len = (10 + 2 * argument_formats.len())
            .saturating_add(length_prefixed_len(arguments.iter().map(Option::as_deref)));
        ensure_frame_len("arguments", payload_len)?;
        Ok(Self {
            function_id,
            argument_formats,
            arguments,
            result_format,
        })
    }

    /// Function OID.
    pub fn function_id(&self) -> Oid {
        self.function_id
    }

    /// Argument format codes as sent.
    pub fn argument_formats(&self) -> &[FormatCode] {
        &self.argument_formats
    }

    /// Argument values, `None` for NULL.
    pub fn arguments(&self) -> &[Option<Vec<u8>>] {
        &self.arguments
    }

    /// Requested result format.
    pub fn result_format(&self) -> FormatCode {
        self.result_format
    }

    /// Append the encoded message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut msg = MessageBuilder::new(buf, super::msg_type::FUNCTION_CALL);
        msg.write_u32(self.function_id);
        msg.write_i16(self.argument_formats.len() as i16);
        for format in &self.argument_formats {
            msg.write_i16(format.code());
        }
        msg.write_i16(self.arguments.len() as i16);
        for value in &self.arguments {
            msg.write_length_prefixed(value.as_deref());
        }
        msg.write_i16(self.result_format.code());
        msg.finish()
    }
}
