//! An HTTP transport for the medical-imaging chat stream endpoint.

#[macro_use]
extern crate tracing;

mod body;
mod config;

use std::sync::Arc;

use medimg_chat_model::{
    ChatRequest, ChatTransport, ErrorKind, TransportError,
};
use mime::Mime;
use reqwest::{Client, Response, StatusCode, header};
use serde::Deserialize;
use tracing::Instrument;
use uuid::Uuid;

pub use body::HttpBody;
pub use config::{ChatHttpConfig, ChatHttpConfigBuilder};

const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";
const CSRF_TOKEN_HEADER: &str = "X-CSRFToken";
const SESSION_COOKIE_NAME: &str = "sessionid";

/// Chat transport that posts requests to the backend over HTTP.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ChatHttpConfig>,
}

impl HttpTransport {
    /// Creates a new `HttpTransport` with the given configuration.
    #[inline]
    pub fn new(config: ChatHttpConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Creates a new `HttpTransport` that sends requests with `client`.
    #[inline]
    pub fn with_client(client: Client, config: ChatHttpConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }
}

impl ChatTransport for HttpTransport {
    type Body = HttpBody;

    fn open_stream(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Body, TransportError>> + Send + 'static
    {
        let correlation_id = self
            .config
            .correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut builder = self
            .client
            .post(self.config.endpoint_url())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, mime::TEXT_EVENT_STREAM.as_ref())
            .header(CORRELATION_ID_HEADER, &correlation_id)
            .json(req);
        if let Some(token) = &self.config.csrf_token {
            builder = builder.header(CSRF_TOKEN_HEADER, token);
        }
        if let Some(session) = &self.config.session_cookie {
            builder = builder.header(
                header::COOKIE,
                format!("{SESSION_COOKIE_NAME}={session}"),
            );
        }
        let resp_fut = builder.send();

        let span = debug_span!("open chat stream", %correlation_id);
        async move {
            let resp = resp_fut.await.map_err(|err| {
                error!("failed to send the request: {err}");
                TransportError::new(ErrorKind::Network, format!("{err}"))
            })?;

            let status = resp.status();
            if !status.is_success() {
                return Err(status_error(status, resp).await);
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            if !is_event_stream(content_type) {
                return Err(TransportError::new(
                    ErrorKind::ContentType,
                    format!("Unexpected content type: {content_type:?}"),
                ));
            }

            // Here we got a successful response.
            debug!("chat stream opened");
            Ok(HttpBody::from_response(resp))
        }
        .instrument(span)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    // The chat view answers with `error`, the framework's authentication
    // and throttling layers with `detail`.
    #[serde(alias = "detail")]
    error: String,
}

async fn status_error(status: StatusCode, resp: Response) -> TransportError {
    let retry_after = (status == StatusCode::TOO_MANY_REQUESTS)
        .then(|| resp.headers().get(header::RETRY_AFTER))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);

    let body = resp.text().await.unwrap_or_default();
    let mut message = serde_json::from_str::<ErrorBody>(&body)
        .map(|body| body.error)
        .unwrap_or_else(|_| status.to_string());
    if let Some(retry_after) = retry_after {
        message.push_str(&format!(" (Retry-After: {retry_after})"));
    }
    error!("chat stream rejected with {status}: {message}");
    TransportError::status(status.as_u16(), message)
}

#[inline]
fn is_event_stream(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|v| v.parse().ok())
        .map(|m: Mime| {
            m.essence_str() == mime::TEXT_EVENT_STREAM.essence_str()
        })
        .unwrap_or(false)
}
