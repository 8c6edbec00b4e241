//! Entity extractors for the MGI → Alliance datafeed
//!
//! One module per submitted entity type. Each follows the same protocol:
//! run the auxiliary queries and reduce them to indexes, run the primary
//! query (sample-mode aware), assemble one DTO per primary record through
//! pure functions, and stream the DTOs into the output envelope.
//! Record-level failures are logged and skipped; the run continues.

pub mod agms;
pub mod alleles;
pub mod constructs;
pub mod disease;
pub mod genes;
pub mod refs;
pub mod variants;
