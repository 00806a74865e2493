use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("network error: {message}")]
    Network { message: String },
    #[error("HTTP {status}: {detail}")]
    Server { status: u16, detail: String },
}

impl RemoteError {
    pub fn network(message: impl Into<String>) -> Self {
        RemoteError::Network {
            message: message.into(),
        }
    }

    pub fn server(status: u16, detail: impl Into<String>) -> Self {
        RemoteError::Server {
            status,
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Network { .. } => None,
            RemoteError::Server { status, .. } => Some(*status),
        }
    }
}
