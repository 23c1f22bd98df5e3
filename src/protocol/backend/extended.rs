//! Extended query protocol and function call backend messages.
//!
//! ParseComplete, BindComplete, CloseComplete, NoData and PortalSuspended
//! carry no payload and are unit variants of
//! [`BackendMessage`](super::BackendMessage).

use crate::error::{Error, Result};
use crate::protocol::codec::{MessageBuilder, ReadBuf, ensure_i16_len, ensure_i32_len};
use crate::protocol::types::Oid;

/// ParameterDescription message - describes parameters for a prepared statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescription {
    parameter_types: Vec<Oid>,
}

impl ParameterDescription {
    /// Create a ParameterDescription message.
    pub fn new(parameter_types: Vec<Oid>) -> Result<Self> {
        ensure_i16_len("parameter_types", parameter_types.len())?;
        Ok(Self { parameter_types })
    }

    /// Get the number of parameters.
    pub fn len(&self) -> usize {
        self.parameter_types.len()
    }

    /// Check if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.parameter_types.is_empty()
    }

    /// Get parameter type OIDs.
    pub fn oids(&self) -> &[Oid] {
        &self.parameter_types
    }

    pub(crate) fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        let num_params = buf.read_i16()?;
        if num_params < 0 {
            return Err(Error::Protocol(format!(
                "negative parameter count {}",
                num_params
            )));
        }

        let mut parameter_types = Vec::with_capacity(num_params as usize);
        for _ in 0..num_params {
            parameter_types.push(buf.read_u32()?);
        }
        Ok(Self { parameter_types })
    }

    pub(crate) fn write_payload(&self, msg: &mut MessageBuilder<'_>) {
        msg.write_i16(self.parameter_types.len() as i16);
        for &oid in &self.parameter_types {
            msg.write_u32(oid);
        }
    }
}

/// FunctionCallResponse message - result of a FunctionCall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCallResponse {
    value: Option<Vec<u8>>,
}

impl FunctionCallResponse {
    /// Create a FunctionCallResponse message (`None` for a NULL result).
    pub fn new(value: Option<Vec<u8>>) -> Result<Self> {
        if let Some(value) = &value {
            ensure_i32_len("value", value.len())?;
        }
        Ok(Self { value })
    }

    /// Function result, `None` for NULL.
    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    pub(crate) fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        Ok(Self {
            value: buf.read_length_prefixed()?.map(<[u8]>::to_vec),
        })
    }

    pub(crate) fn write_payload(&self, msg: &mut MessageBuilder<'_>) {
        msg.write_length_prefixed(self.value.as_deref());
    }
}
