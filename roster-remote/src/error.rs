//! Error types for roster-remote.

use thiserror::Error;

use roster_sync::HostingError;

const BODY_SNIPPET: usize = 200;

#[derive(Debug, Error)]
pub enum RemoteError {
    /// Non-2xx response.
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// DNS, TLS, connect or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

impl RemoteError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Map onto the reconciler's taxonomy. `what` names the thing addressed.
    pub fn into_hosting(self, what: &str) -> HostingError {
        match self {
            RemoteError::Status { status: 404, .. } => HostingError::NotFound(what.to_string()),
            err @ RemoteError::Status { .. } => HostingError::Rejected(err.to_string()),
            err => HostingError::Transport(err.to_string()),
        }
    }
}

impl From<ureq::Error> for RemoteError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => {
                let url = response.get_url().to_string();
                let mut body = response.into_string().unwrap_or_default();
                if body.len() > BODY_SNIPPET {
                    let cut = (0..=BODY_SNIPPET)
                        .rev()
                        .find(|i| body.is_char_boundary(*i))
                        .unwrap_or(0);
                    body.truncate(cut);
                }
                RemoteError::Status { status, url, body }
            }
            ureq::Error::Transport(transport) => RemoteError::Transport(transport.to_string()),
        }
    }
}
