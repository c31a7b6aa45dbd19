//! Domain layer - business logic and services

pub mod collaborators;
pub mod events;
pub mod field_types;
pub mod query;
pub mod repository;
pub mod service;
pub mod tree;
pub mod validation;

pub use collaborators::{MediaLibrary, NoOpMediaLibrary, PassthroughSanitizer, RichTextSanitizer};
pub use events::{ContentEvent, EventPublisher, NoOpEventPublisher, TracingEventPublisher};
pub use field_types::FieldTypeRegistry;
pub use repository::Repositories;
pub use service::Service;
