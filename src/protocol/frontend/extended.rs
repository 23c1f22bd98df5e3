//! Extended query protocol messages.
//!
//! Sync and Flush carry no payload and are unit variants of
//! [`FrontendMessage`](super::FrontendMessage).

use crate::error::{Error, Result};
use crate::protocol::codec::{
    MessageBuilder, ensure_cstr, ensure_frame_len, ensure_i16_len, ensure_i32_len,
    length_prefixed_len,
};
use crate::protocol::types::{FormatCode, Oid, Target};

/// Parse message - create a prepared statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    name: String,
    query: String,
    parameter_types: Vec<Oid>,
}

impl Parse {
    /// Create a Parse message.
    ///
    /// - `name`: Statement name (empty string for unnamed statement)
    /// - `query`: SQL query with $1, $2, ... placeholders
    /// - `parameter_types`: Parameter type OIDs (0 = let server infer)
    pub fn new(
        name: impl Into<String>,
        query: impl Into<String>,
        parameter_types: Vec<Oid>,
    ) -> Result<Self> {
        let name = name.into();
        let query = query.into();
        ensure_cstr("name", &name)?;
        ensure_cstr("query", &query)?;
        ensure_i16_len("parameter_types", parameter_types.len())?;
        let payload_len = (name.len() + 1)
            .saturating_add(query.len() + 1)
            .saturating_add(2 + 4 * parameter_types.len());
        ensure_frame_len("query", payload_len)?;
        Ok(Self {
            name,
            query,
            parameter_types,
        })
    }

    /// Statement name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Query text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Declared parameter types.
    pub fn parameter_types(&self) -> &[Oid] {
        &self.parameter_types
    }

    /// Append the encoded message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut msg = MessageBuilder::new(buf, super::msg_type::PARSE);
        msg.write_cstr(&self.name);
        msg.write_cstr(&self.query);
        msg.write_i16(self.parameter_types.len() as i16);
        for &oid in &self.parameter_types {
            msg.write_u32(oid);
        }
        msg.finish()
    }
}

/// Bind message - create a portal from a prepared statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bind {
    portal: String,
    statement: String,
    parameter_formats: Vec<FormatCode>,
    parameters: Vec<Option<Vec<u8>>>,
    result_formats: Vec<FormatCode>,
}

impl Bind {
    /// Create a Bind message.
    ///
    /// `parameter_formats` may be empty (all text), hold one code applied to
    /// every parameter, or hold one code per parameter. `None` parameters
    /// are sent as NULL.
    pub fn new(
        portal: impl Into<String>,
        statement: impl Into<String>,
        parameter_formats: Vec<FormatCode>,
        parameters: Vec<Option<Vec<u8>>>,
        result_formats: Vec<FormatCode>,
    ) -> Result<Self> {
        let portal = portal.into();
        let statement = statement.into();
        ensure_cstr("portal", &portal)?;
        ensure_cstr("statement", &statement)?;
        ensure_i16_len("parameter_formats", parameter_formats.len())?;
        ensure_i16_len("parameters", parameters.len())?;
        ensure_i16_len("result_formats", result_formats.len())?;

        if parameter_formats.len() > 1 && parameter_formats.len() != parameters.len() {
            return Err(Error::InvalidField {
                field: "parameter_formats",
                reason: "must have zero, one, or one entry per parameter",
            });
        }
        for value in parameters.iter().flatten() {
            ensure_i32_len("parameters", value.len())?;
        }
        let payload_len = (portal.len() + 1)
            .saturating_add(statement.len() + 1)
            .saturating_add(6 + 2 * (parameter_formats.len() + result_formats.len()))
            .saturating_add(length_prefixed_len(parameters.iter().map(Option::as_deref)));
        ensure_frame_len("parameters", payload_len)?;

        Ok(Self {
            portal,
            statement,
            parameter_formats,
            parameters,
            result_formats,
        })
    }

    /// Portal name.
    pub fn portal(&self) -> &str {
        &self.portal
    }

    /// Source statement name.
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Parameter format codes as sent.
    pub fn parameter_formats(&self) -> &[FormatCode] {
        &self.parameter_formats
    }

    /// Parameter values, `None` for NULL.
    pub fn parameters(&self) -> &[Option<Vec<u8>>] {
        &self.parameters
    }

    /// Result column format codes.
    pub fn result_formats(&self) -> &[FormatCode] {
        &self.result_formats
    }

    /// Append the encoded message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut msg = MessageBuilder::new(buf, super::msg_type::BIND);

        msg.write_cstr(&self.portal);
        msg.write_cstr(&self.statement);

        msg.write_i16(self.parameter_formats.len() as i16);
        for format in &self.parameter_formats {
            msg.write_i16(format.code());
        }

        // Parameter values (count + length-prefixed data)
        msg.write_i16(self.parameters.len() as i16);
        for value in &self.parameters {
            msg.write_length_prefixed(value.as_deref());
        }

        msg.write_i16(self.result_formats.len() as i16);
        for format in &self.result_formats {
            msg.write_i16(format.code());
        }

        msg.finish()
    }
}

/// Describe message - request metadata for a statement or portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Describe {
    target: Target,
    name: String,
}

impl Describe {
    /// Create a Describe message.
    pub fn new(target: Target, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        ensure_cstr("name", &name)?;
        ensure_frame_len("name", name.len() + 2)?;
        Ok(Self { target, name })
    }

    /// Whether a statement or a portal is described.
    pub fn target(&self) -> Target {
        self.target
    }

    /// Statement or portal name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append the encoded message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut msg = MessageBuilder::new(buf, super::msg_type::DESCRIBE);
        msg.write_u8(self.target.as_byte());
        msg.write_cstr(&self.name);
        msg.finish()
    }
}

/// Close message - release a statement or portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Close {
    target: Target,
    name: String,
}

impl Close {
    /// Create a Close message.
    pub fn new(target: Target, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        ensure_cstr("name", &name)?;
        ensure_frame_len("name", name.len() + 2)?;
        Ok(Self { target, name })
    }

    /// Whether a statement or a portal is closed.
    pub fn target(&self) -> Target {
        self.target
    }

    /// Statement or portal name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append the encoded message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut msg = MessageBuilder::new(buf, super::msg_type::CLOSE);
        msg.write_u8(self.target.as_byte());
        msg.write_cstr(&self.name);
        msg.finish()
    }
}

/// Execute message - run a portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execute {
    portal: String,
    max_rows: u32,
}

impl Execute {
    /// Create an Execute message. `max_rows` of 0 means no limit.
    pub fn new(portal: impl Into<String>, max_rows: u32) -> Result<Self> {
        let portal = portal.into();
        ensure_cstr("portal", &portal)?;
        ensure_frame_len("portal", portal.len() + 5)?;
        if i32::try_from(max_rows).is_err() {
            return Err(Error::InvalidField {
                field: "max_rows",
                reason: "is too large",
            });
        }
        Ok(Self { portal, max_rows })
    }

    /// Portal name.
    pub fn portal(&self) -> &str {
        &self.portal
    }

    /// Row limit, 0 for none.
    pub fn max_rows(&self) -> u32 {
        self.max_rows
    }

    /// Append the encoded message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut msg = MessageBuilder::new(buf, super::msg_type::EXECUTE);
        msg.write_cstr(&self.portal);
        msg.write_u32(self.max_rows);
        msg.finish()
    }
}
