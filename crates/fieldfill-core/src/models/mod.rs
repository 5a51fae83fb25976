//! Data models shared across the pipeline.

pub mod config;
pub mod document;
pub mod field;
pub mod value;
