//! The I/O seam between `TodoClient` requests and the network.
//!
//! Mobile hosts usually execute requests themselves and only use the
//! build/parse halves. `UreqTransport` is the blocking implementation used by
//! the CLI-style tools and the integration tests.

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one request. Non-2xx statuses are returned as responses, not
/// errors; only failures to get a response at all are `Err`.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

#[cfg(feature = "http")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "http")]
mod ureq_transport {
    use std::time::Duration;

    use tracing::debug;
    use ureq::{Agent, RequestBuilder};

    use super::Transport;
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport with a single global timeout. No retries.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: Agent,
    }

    impl UreqTransport {
        pub fn new(timeout: Duration) -> Self {
            // Statuses are the client's business, so 4xx/5xx come back as data.
            let agent = Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(Some(timeout))
                .build()
                .new_agent();
            Self { agent }
        }
    }

    fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    fn network(e: ureq::Error) -> ApiError {
        ApiError::Network(e.to_string())
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            debug!(method = %request.method, url = %request.path, "sending request");
            let url = request.path.as_str();
            let body = request.body.as_deref().map(str::as_bytes);
            let result = match request.method {
                HttpMethod::Get => with_headers(self.agent.get(url), &request.headers).call(),
                HttpMethod::Delete => with_headers(self.agent.delete(url), &request.headers).call(),
                HttpMethod::Post => {
                    let builder = with_headers(self.agent.post(url), &request.headers);
                    match body {
                        Some(bytes) => builder.send(bytes),
                        None => builder.send_empty(),
                    }
                }
                HttpMethod::Put => {
                    let builder = with_headers(self.agent.put(url), &request.headers);
                    match body {
                        Some(bytes) => builder.send(bytes),
                        None => builder.send_empty(),
                    }
                }
            };
            let mut response = result.map_err(network)?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response.body_mut().read_to_string().map_err(network)?;
            debug!(status, "response received");

            Ok(HttpResponse { status, headers, body })
        }
    }
}
