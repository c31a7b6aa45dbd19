//! Infrastructure layer - persistence adapters

pub mod storage;
