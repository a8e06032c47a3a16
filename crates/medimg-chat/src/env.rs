use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::time::Duration;

use medimg_chat_core::{ChatSession, ChatSessionBuilder, DEFAULT_TURN_TIMEOUT};
use medimg_chat_http::{ChatHttpConfigBuilder, HttpTransport};

const BASE_URL_VAR: &str = "MEDIMG_BASE_URL";
const SESSION_ID_VAR: &str = "MEDIMG_SESSION_ID";
const CSRF_TOKEN_VAR: &str = "MEDIMG_CSRF_TOKEN";
const TURN_TIMEOUT_VAR: &str = "MEDIMG_TURN_TIMEOUT_SECS";

/// The error type for reading [`EnvConfig`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnvError {
    /// A required variable is not set.
    Missing(&'static str),
    /// A variable is set to a value that can't be used.
    Invalid(&'static str, String),
}

impl Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvError::Missing(name) => {
                write!(f, "{name} environment variable is not set")
            }
            EnvError::Invalid(name, value) => {
                write!(f, "{name} environment variable is invalid: {value:?}")
            }
        }
    }
}

impl StdError for EnvError {}

/// Client settings read from `MEDIMG_*` environment variables.
#[derive(Clone, PartialEq, Eq)]
pub struct EnvConfig {
    /// Origin of the backend, required.
    pub base_url: String,
    /// Value of the `sessionid` cookie.
    pub session_id: Option<String>,
    /// CSRF token sent with every request.
    pub csrf_token: Option<String>,
    /// Ceiling of one turn.
    pub turn_timeout: Duration,
}

impl EnvConfig {
    /// Reads the settings from the process environment.
    #[inline]
    pub fn from_env() -> Result<Self, EnvError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the settings with `lookup`, which returns the value of the
    /// given variable.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, EnvError> {
        let lookup =
            |name: &str| lookup(name).filter(|value| !value.is_empty());

        let base_url =
            lookup(BASE_URL_VAR).ok_or(EnvError::Missing(BASE_URL_VAR))?;
        let turn_timeout = match lookup(TURN_TIMEOUT_VAR) {
            None => DEFAULT_TURN_TIMEOUT,
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(EnvError::Invalid(TURN_TIMEOUT_VAR, value)),
            },
        };

        Ok(Self {
            base_url,
            session_id: lookup(SESSION_ID_VAR),
            csrf_token: lookup(CSRF_TOKEN_VAR),
            turn_timeout,
        })
    }

    /// Creates the HTTP transport for these settings.
    pub fn transport(&self) -> HttpTransport {
        let mut builder = ChatHttpConfigBuilder::with_base_url(&self.base_url);
        if let Some(session_id) = &self.session_id {
            builder = builder.with_session_cookie(session_id);
        }
        if let Some(token) = &self.csrf_token {
            builder = builder.with_csrf_token(token);
        }
        HttpTransport::new(builder.build())
    }

    /// Creates a session builder talking to the configured backend.
    #[inline]
    pub fn session_builder(&self) -> ChatSessionBuilder {
        ChatSessionBuilder::with_transport(self.transport())
            .turn_timeout(self.turn_timeout)
    }

    /// Creates a session talking to the configured backend.
    #[inline]
    pub fn session(&self) -> ChatSession {
        self.session_builder().build()
    }
}

impl fmt::Debug for EnvConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted =
            |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("EnvConfig")
            .field("base_url", &self.base_url)
            .field("session_id", &redacted(&self.session_id))
            .field("csrf_token", &redacted(&self.csrf_token))
            .field("turn_timeout", &self.turn_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_in(
        vars: &[(&str, &str)],
    ) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let config = EnvConfig::from_lookup(lookup_in(&[
            ("MEDIMG_BASE_URL", "https://pacs.example.org"),
            ("MEDIMG_SESSION_ID", "s3cret"),
            ("MEDIMG_CSRF_TOKEN", ""),
            ("MEDIMG_TURN_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://pacs.example.org");
        assert_eq!(config.session_id.as_deref(), Some("s3cret"));
        assert_eq!(config.csrf_token, None);
        assert_eq!(config.turn_timeout, Duration::from_secs(30));

        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_defaults_and_errors() {
        let config = EnvConfig::from_lookup(lookup_in(&[(
            "MEDIMG_BASE_URL",
            "http://localhost:8000",
        )]))
        .unwrap();
        assert_eq!(config.turn_timeout, DEFAULT_TURN_TIMEOUT);
        assert_eq!(config.session_id, None);

        assert_eq!(
            EnvConfig::from_lookup(lookup_in(&[])),
            Err(EnvError::Missing("MEDIMG_BASE_URL"))
        );
        assert_eq!(
            EnvConfig::from_lookup(lookup_in(&[
                ("MEDIMG_BASE_URL", "http://localhost:8000"),
                ("MEDIMG_TURN_TIMEOUT_SECS", "soon"),
            ])),
            Err(EnvError::Invalid(
                "MEDIMG_TURN_TIMEOUT_SECS",
                "soon".to_owned()
            ))
        );
    }
}
