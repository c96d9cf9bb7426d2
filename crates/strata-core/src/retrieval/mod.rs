//! Query-side pipeline: search, evidence, citations and answers.

pub mod citation;
pub mod engine;
pub mod evidence;
pub mod service;
