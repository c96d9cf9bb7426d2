//! Observability for Strata: tracing subscriber setup and the GenAI
//! semantic-convention vocabulary used on embedding and generation spans.

pub mod genai_attrs;
pub mod tracing_setup;
