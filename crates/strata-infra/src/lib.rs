//! Infrastructure layer for Strata.
//!
//! Contains implementations of the ports defined in `strata-core`: the
//! Bedrock embedding and generation clients, LanceDB and in-memory vector
//! indexes, the local blob store with its document artifact discovery, and
//! the configuration loader.

pub mod bedrock;
pub mod config;
pub mod storage;
pub mod vector;
