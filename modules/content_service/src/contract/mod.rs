//! Contract layer - public API for inter-module communication
//!
//! This layer contains transport-agnostic models and the native client trait.

pub mod client;
pub mod error;
pub mod model;

pub use client::ContentApi;
pub use error::{ContentError, FieldErrors};
pub use model::*;
