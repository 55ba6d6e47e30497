use thiserror::Error;

/// Failures talking to the document store. Every call is a single attempt;
/// callers get these unmodified.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to document store failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("document store responded with status {status}")]
    Status { status: u16 },
    #[error("document store sent an unreadable body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl StoreError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            _ => None,
        }
    }

    /// True when no usable response came back.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Decode(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else if e.is_decode() {
            Self::Decode(e)
        } else {
            Self::Transport(e)
        }
    }
}
