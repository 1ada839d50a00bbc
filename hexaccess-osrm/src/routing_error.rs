use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("failure building routing client: {0}")]
    Client(String),
    #[error("routing request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("routing service responded with HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("routing service response could not be decoded: {0}")]
    MalformedResponse(String),
    #[error("routing service found no route: {0}")]
    NoRoute(String),
}

impl RoutingError {
    /// true for failures that may succeed on a later attempt: network
    /// errors, timeouts, throttling and server-side errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            RoutingError::Transport { .. } => true,
            RoutingError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            RoutingError::Client(_) => false,
            RoutingError::MalformedResponse(_) => false,
            RoutingError::NoRoute(_) => false,
        }
    }
}
