use std::fmt::Debug;

const DEFAULT_ENDPOINT: &str = "/api/ai/chat/stream/";

/// Builder for [`ChatHttpConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ChatHttpConfigBuilder {
    base_url: String,
    endpoint: Option<String>,
    session_cookie: Option<String>,
    csrf_token: Option<String>,
    correlation_id: Option<String>,
}

impl ChatHttpConfigBuilder {
    /// Creates a builder for the backend at the given base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint: None,
            session_cookie: None,
            csrf_token: None,
            correlation_id: None,
        }
    }

    /// Sets a custom path of the chat stream endpoint.
    #[inline]
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the session id to authenticate with.
    #[inline]
    pub fn with_session_cookie<S: Into<String>>(mut self, session: S) -> Self {
        self.session_cookie = Some(session.into());
        self
    }

    /// Sets the CSRF token to send along with the request.
    #[inline]
    pub fn with_csrf_token<S: Into<String>>(mut self, token: S) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    /// Sets a fixed correlation id.
    ///
    /// A new id is generated for each request if this is not set.
    #[inline]
    pub fn with_correlation_id<S: Into<String>>(mut self, id: S) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> ChatHttpConfig {
        ChatHttpConfig {
            base_url: self.base_url.trim_end_matches('/').to_owned(),
            endpoint: self
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
            session_cookie: self.session_cookie,
            csrf_token: self.csrf_token,
            correlation_id: self.correlation_id,
        }
    }
}

impl Debug for ChatHttpConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatHttpConfigBuilder")
            .field("base_url", &self.base_url)
            .field("endpoint", &self.endpoint)
            .field("session_cookie", &redacted(&self.session_cookie))
            .field("csrf_token", &redacted(&self.csrf_token))
            .field("correlation_id", &self.correlation_id)
            .finish()
    }
}

/// Configuration for the HTTP chat transport.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ChatHttpConfig {
    pub(crate) base_url: String,
    pub(crate) endpoint: String,
    pub(crate) session_cookie: Option<String>,
    pub(crate) csrf_token: Option<String>,
    pub(crate) correlation_id: Option<String>,
}

impl ChatHttpConfig {
    /// Returns the full URL of the chat stream endpoint.
    #[inline]
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.starts_with('/') {
            format!("{}{}", self.base_url, self.endpoint)
        } else {
            format!("{}/{}", self.base_url, self.endpoint)
        }
    }
}

impl Debug for ChatHttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatHttpConfig")
            .field("base_url", &self.base_url)
            .field("endpoint", &self.endpoint)
            .field("session_cookie", &redacted(&self.session_cookie))
            .field("csrf_token", &redacted(&self.csrf_token))
            .field("correlation_id", &self.correlation_id)
            .finish()
    }
}

#[inline]
fn redacted(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "<redacted>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let config =
            ChatHttpConfigBuilder::with_base_url("http://localhost:8000/")
                .build();
        assert_eq!(
            config.endpoint_url(),
            "http://localhost:8000/api/ai/chat/stream/"
        );

        let config = ChatHttpConfigBuilder::with_base_url("https://pacs.test")
            .with_endpoint("v2/chat")
            .build();
        assert_eq!(config.endpoint_url(), "https://pacs.test/v2/chat");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let builder = ChatHttpConfigBuilder::with_base_url("https://pacs.test")
            .with_session_cookie("s3ss10n")
            .with_csrf_token("t0k3n");
        let debug = format!("{builder:?} {:?}", builder.clone().build());
        assert!(!debug.contains("s3ss10n"));
        assert!(!debug.contains("t0k3n"));
        assert!(debug.contains("<redacted>"));
    }
}
