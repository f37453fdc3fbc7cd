use shared::domain::ItemId;
use thiserror::Error;

/// Failure of a single remote store call.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network failure or a non-2xx answer other than a 404 on an item route.
    #[error("transport error{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },
    #[error("cart item {id} not found")]
    NotFound { id: ItemId },
    /// The response body did not decode into the expected shape.
    #[error("malformed response body: {0}")]
    Validation(String),
}

impl StoreError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport {
            status: value.status().map(|status| status.as_u16()),
            message: value.to_string(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|status| format!(" (status {status})"))
        .unwrap_or_default()
}
