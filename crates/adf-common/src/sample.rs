//! Sample-mode truncation
//!
//! Development runs set `ADF_SAMPLE` to cap each primary result set at a
//! fixed prefix so a full extract isn't needed to eyeball the output.

use tracing::info;

/// Truncate `rows` to the configured sample limit, if one is set.
pub fn sample_rows<T>(mut rows: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        if rows.len() > limit {
            info!(total = rows.len(), limit, "Sample mode: truncating result set");
            rows.truncate(limit);
        }
    }
    rows
}
