//! Session options.

use no_panic::no_panic;
use url::Url;

use crate::error::Error;
use crate::protocol::frame::DEFAULT_MAX_MESSAGE_LEN;
use crate::protocol::frontend::startup::{PROTOCOL_VERSION_3_0, PROTOCOL_VERSION_3_2};

/// Options for the startup and authentication exchange.
///
/// Transport concerns (host, port, TLS) belong to whoever owns the socket;
/// the host part of a URL is accepted but not recorded here.
#[derive(Debug, Clone)]
pub struct Opts {
    /// Username for authentication.
    ///
    /// Default: `""`
    pub user: String,

    /// Database name to use.
    ///
    /// Default: `None`
    pub database: Option<String>,

    /// Password for authentication.
    ///
    /// Default: `None`
    pub password: Option<String>,

    /// Application name to report to the server.
    ///
    /// Default: `None`
    pub application_name: Option<String>,

    /// Additional startup parameters, sent in order.
    ///
    /// Default: `[]`
    pub params: Vec<(String, String)>,

    /// Protocol version requested in the StartupMessage.
    ///
    /// Default: `3.0`
    pub protocol_version: i32,

    /// Largest backend message accepted by a [`FrameReader`](crate::protocol::FrameReader).
    ///
    /// Default: 1 GiB
    pub max_message_len: usize,
}

impl Default for Opts {
    #[no_panic]
    fn default() -> Self {
        Self {
            user: String::new(),
            database: None,
            password: None,
            application_name: None,
            params: Vec::new(),
            protocol_version: PROTOCOL_VERSION_3_0,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

impl Opts {
    /// Startup parameters in the order they are sent.
    ///
    /// `client_encoding` is always `UTF8`: every text field is decoded as UTF-8.
    pub fn startup_parameters(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("user".to_string(), self.user.clone()),
            ("client_encoding".to_string(), "UTF8".to_string()),
        ];
        if let Some(db) = &self.database {
            params.push(("database".to_string(), db.clone()));
        }
        if let Some(app) = &self.application_name {
            params.push(("application_name".to_string(), app.clone()));
        }
        params.extend(self.params.iter().cloned());
        params
    }
}

impl TryFrom<&Url> for Opts {
    type Error = Error;

    /// Parse a PostgreSQL connection URL.
    ///
    /// Format: `postgres://[user[:password]@]host[:port][/database][?param1=value1&param2=value2&..]`
    ///
    /// Supported query parameters:
    /// - `application_name`: application name
    /// - `protocol_version`: `3.0` or `3.2`
    /// - `max_message_len`: largest accepted backend message in bytes (at least 5)
    ///
    /// Any other parameter is passed through as a startup parameter.
    fn try_from(url: &Url) -> Result<Self, Self::Error> {
        if !["postgres", "postgresql", "pg"].contains(&url.scheme()) {
            return Err(Error::InvalidUsage(format!(
                "Invalid scheme: expected 'postgres://' or 'pg://', got '{}://'",
                url.scheme()
            )));
        }

        let mut opts = Opts {
            user: url.username().to_string(),
            password: url.password().map(|s| s.to_string()),
            database: url
                .path()
                .strip_prefix('/')
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string()),
            ..Opts::default()
        };

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "application_name" => {
                    opts.application_name = Some(value.to_string());
                }
                "protocol_version" => {
                    opts.protocol_version = match value.as_ref() {
                        "3.0" => PROTOCOL_VERSION_3_0,
                        "3.2" => PROTOCOL_VERSION_3_2,
                        _ => {
                            return Err(Error::InvalidUsage(format!(
                                "Invalid protocol_version: expected one of ['3.0', '3.2'], got {}",
                                value
                            )));
                        }
                    };
                }
                "max_message_len" => {
                    opts.max_message_len = value
                        .parse()
                        .ok()
                        .filter(|&len: &usize| len >= 5)
                        .ok_or_else(|| {
                            Error::InvalidUsage(format!("Invalid max_message_len: {}", value))
                        })?;
                }
                "channel_binding" if value != "disable" => {
                    return Err(Error::Unsupported(format!(
                        "channel_binding={}",
                        value
                    )));
                }
                "channel_binding" => {}
                _ => {
                    opts.params.push((key.to_string(), value.to_string()));
                }
            }
        }

        Ok(opts)
    }
}

impl TryFrom<&str> for Opts {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let url = Url::parse(s).map_err(|e| Error::InvalidUsage(format!("Invalid URL: {}", e)))?;
        Self::try_from(&url)
    }
}
