use storewidgets_core::config::OrderLabels;
use thiserror::Error;

/// Failures of the catalog and cart backend calls.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network or TLS failure, or a non-2xx status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint URL in the configuration could not be parsed.
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    /// The GraphQL response carried an `errors` array.
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced inline by the quick order form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Submitted with an empty or whitespace-only code.
    #[error("no code entered")]
    Validation,
    /// The lookup settled without a usable product id. Transport failures of
    /// the lookup land here too.
    #[error("code not found")]
    NotFound,
    /// The add-to-cart mutation failed.
    #[error("could not add the product to the cart")]
    CartFailed,
}

impl OrderError {
    /// The configured user-facing text for this error.
    pub fn message<'a>(&self, labels: &'a OrderLabels) -> &'a str {
        match self {
            OrderError::Validation => &labels.no_code,
            OrderError::NotFound => &labels.not_found,
            OrderError::CartFailed => &labels.cart_failed,
        }
    }
}
