//! SeaORM entities for database tables
//!
//! Relations are enforced by the migrations; entities carry no relation
//! metadata and repositories join by explicit id filters.

pub mod content;
pub mod fields;
pub mod layout;
pub mod queries;
