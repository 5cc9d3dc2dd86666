use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("No delivery address selected")]
    NoAddressSelected,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Payment service unavailable: {0}")]
    PaymentUnavailable(String),

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Cart changed while payment was in progress")]
    StaleCheckout,

    #[error("Backend request failed: {0}")]
    RemoteRequestFailed(String),

    #[error("Not found")]
    NotFound,

    #[error("Status change not allowed: {from} -> {to}")]
    InvalidStatusChange { from: String, to: String },

    #[error("Amount not representable in minor units: {0}")]
    InvalidAmount(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
