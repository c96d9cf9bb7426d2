//! Ingestion pipeline: upload trigger to stored dimension variants.

pub mod driver;
pub mod job_config;
pub mod machine;
pub mod metadata;
pub mod orchestrator;
pub mod report;
pub mod trigger;
pub mod writer;
