use thiserror::Error;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("ClientTransportError: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("ClientStatusError: {status} from {url}")]
    Status { status: reqwest::StatusCode, url: String },

    #[error("ClientUrlError: {0}")]
    Url(#[from] url::ParseError),

    #[error("ClientInvalidResponse: {0}")]
    InvalidResponse(String),

    #[error("ClientEncodeError: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("ClientForbidden: {0}")]
    Forbidden(String),
}

impl ClientError {
    pub fn invalid_response<S: Into<String>>(details: S) -> Self {
        Self::InvalidResponse(details.into())
    }

    pub fn status_code(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(reqwest::StatusCode::NOT_FOUND)
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::Transport(_) => String::from("Backend is unreachable."),
            Self::Status { status, .. } if status.is_client_error() => {
                String::from("Backend rejected the request.")
            }
            Self::Status { .. } => String::from("Backend error, try again later."),
            Self::Url(_) => String::from("Backend url is invalid, check the configuration."),
            Self::InvalidResponse(_) => String::from("Backend returned an unexpected response."),
            Self::Encode(_) => String::from("Unable to encode request."),
            Self::Forbidden(reason) => format!("Not allowed: {reason}."),
        }
    }
}
