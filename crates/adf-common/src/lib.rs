//! ADF Common Library
//!
//! Shared building blocks for the MGI → Alliance datafeed extractors:
//! result indexing, wire timestamps, symbol markup, common DTO fields,
//! the streamed JSON envelope, and the ambient concerns every extractor
//! shares (errors, logging, configuration, database pool).

pub mod config;
pub mod db;
pub mod dto;
pub mod envelope;
pub mod error;
pub mod index;
pub mod logging;
pub mod markup;
pub mod sample;
pub mod timestamp;
pub mod vocab;

pub use error::{AdfError, Result};
