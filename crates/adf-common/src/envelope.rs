//! Streamed output envelope
//!
//! Every extractor writes one JSON document to stdout:
//!
//! ```json
//! {
//!   "linkml_version": "v2.9.1",
//!   "alliance_member_release_version": "...",
//!   "<entity>_ingest_set": [ {...}, {...} ],
//!   ...
//! }
//! ```
//!
//! DTOs are streamed one at a time rather than built into one in-memory
//! document. `EnvelopeWriter` owns element-separator placement, so callers
//! never track "is this the first element" state themselves.

use serde::Serialize;
use std::io::Write;

use crate::config::Config;
use crate::error::{AdfError, Result};
use crate::timestamp;

/// The two header fields at the top of every document.
#[derive(Debug, Clone)]
pub struct HeaderAttributes {
    pub linkml_version: String,
    pub alliance_member_release_version: String,
}

impl HeaderAttributes {
    /// Header fields for a run. The release version falls back to the run
    /// timestamp when not configured, so every submission is tagged.
    pub fn from_config(config: &Config) -> Self {
        Self {
            linkml_version: config.schema_version.clone(),
            alliance_member_release_version: config
                .release_version
                .clone()
                .unwrap_or_else(timestamp::now),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Created,
    Open,
    InSet,
    Finished,
}

/// Incremental writer for one output document.
///
/// Call sequence: `begin`, then one or more (`begin_set`, `write_dto`*,
/// `end_set`) groups, then `finish`. Anything else is an
/// [`AdfError::Envelope`].
pub struct EnvelopeWriter<W: Write> {
    out: W,
    header: HeaderAttributes,
    state: State,
    wrote_set: bool,
    first_element: bool,
}

impl<W: Write> EnvelopeWriter<W> {
    pub fn new(out: W, header: HeaderAttributes) -> Self {
        Self {
            out,
            header,
            state: State::Created,
            wrote_set: false,
            first_element: true,
        }
    }

    /// Open the document and emit the header fields.
    pub fn begin(&mut self) -> Result<()> {
        if self.state != State::Created {
            return Err(AdfError::Envelope("begin() called twice"));
        }
        writeln!(self.out, "{{")?;
        writeln!(
            self.out,
            "\"linkml_version\": {},",
            serde_json::to_string(&self.header.linkml_version)?
        )?;
        write!(
            self.out,
            "\"alliance_member_release_version\": {}",
            serde_json::to_string(&self.header.alliance_member_release_version)?
        )?;
        self.state = State::Open;
        Ok(())
    }

    /// Open a named ingest set.
    pub fn begin_set(&mut self, name: &str) -> Result<()> {
        if self.state != State::Open {
            return Err(AdfError::Envelope("begin_set() outside an open document"));
        }
        writeln!(self.out, ",")?;
        writeln!(self.out, "{}: [", serde_json::to_string(name)?)?;
        self.state = State::InSet;
        self.wrote_set = true;
        self.first_element = true;
        Ok(())
    }

    /// Append one DTO to the open ingest set.
    pub fn write_dto<T: Serialize>(&mut self, dto: &T) -> Result<()> {
        if self.state != State::InSet {
            return Err(AdfError::Envelope("write_dto() outside an ingest set"));
        }
        if !self.first_element {
            writeln!(self.out, ",")?;
        }
        serde_json::to_writer(&mut self.out, dto)?;
        self.first_element = false;
        Ok(())
    }

    /// Close the open ingest set.
    pub fn end_set(&mut self) -> Result<()> {
        if self.state != State::InSet {
            return Err(AdfError::Envelope("end_set() without an open set"));
        }
        writeln!(self.out)?;
        write!(self.out, "]")?;
        self.state = State::Open;
        Ok(())
    }

    /// Close the document and flush.
    pub fn finish(mut self) -> Result<()> {
        if self.state != State::Open {
            return Err(AdfError::Envelope("finish() with an unclosed set"));
        }
        if !self.wrote_set {
            return Err(AdfError::Envelope("finish() with no ingest set written"));
        }
        writeln!(self.out)?;
        writeln!(self.out, "}}")?;
        self.out.flush()?;
        self.state = State::Finished;
        Ok(())
    }
}
