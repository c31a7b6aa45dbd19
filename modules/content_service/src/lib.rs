//! Content Service Module
//!
//! Dynamic content modeling and page composition: runtime-defined content
//! types with typed fields stored entity-attribute-value style, a
//! theme/template/section/widget layout hierarchy, and saved content queries
//! that feed widgets at render time.

// Public exports
pub mod contract;
pub use contract::{
    client::ContentApi, error::ContentError, error::FieldErrors, Actor, ContentItem, ContentType, FieldDefinition,
    FieldType, FieldValue, Page, PageLayout, QueryDefinition,
};

pub mod module;
pub use module::ContentServiceModule;

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
