use thiserror::Error;

/// Failures from a single detection backend. These never leave the
/// backend chain: they are logged and turned into a miss.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("no detection backend could be initialized")]
    Unavailable,
    #[error("backend {0} is not initialized")]
    NotReady(&'static str),
    #[error("model inference failed: {0}")]
    Inference(#[from] anyhow::Error),
    #[error("backend returned malformed output: {0}")]
    MalformedOutput(String),
}

#[derive(Debug, Error, Clone)]
pub enum AssetError {
    #[error("asset {0} is still loading")]
    NotReady(String),
    #[error("asset {path} failed to load: {reason}")]
    Failed { path: String, reason: String },
}

#[derive(Debug, Error)]
#[error("renderer {renderer} faulted: {reason}")]
pub struct RenderFault {
    pub renderer: &'static str,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no input stream available")]
    NoInputStream,
}

#[derive(Debug, Error, PartialEq)]
pub enum FilterParseError {
    #[error("unknown filter function `{0}`")]
    UnknownFunction(String),
    #[error("malformed filter expression `{0}`")]
    Malformed(String),
    #[error("invalid argument `{arg}` for {function}")]
    InvalidArgument { function: String, arg: String },
}
