//! Storefront core for a plant e-commerce shop: catalog browsing, the
//! session cart, checkout against a hosted payment widget, order tracking
//! with live status updates, and the nursery inventory dashboard.
//!
//! Persistence, auth, file storage and change notification are all owned by
//! a hosted backend. `domain::ports` defines one trait per collaborator,
//! `application` holds the flows that orchestrate them, and
//! `infrastructure` implements the ports over the backend's REST surface.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::BackendConfig;
pub use domain::cart::{CartLine, CartLineInput, CartStore};
pub use domain::errors::StorefrontError;
