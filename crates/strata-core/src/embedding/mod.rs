//! Embedding computation port.

pub mod box_service;
pub mod service;
