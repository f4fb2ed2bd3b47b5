//! Modules layer - Infrastructure components for external integrations
//!
//! Contains adapters for the blob stores uploaded attachments are written to.

pub mod storage;
