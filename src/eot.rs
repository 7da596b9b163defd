//! End-of-transmission framing for streamed clone transfers.
//!
//! The server streams the whole dataset as newline-delimited JSON and has to
//! commit to a `200` before it knows whether the dump will finish. Success is
//! therefore signalled in-band: the last line is the sentinel record
//! `{"__eot__":true}`. A stream that ends without it was aborted and whatever
//! reached the sink is an incomplete, invalid dataset.
//!
//! [`EotFilter`] is a push-based state machine:
//!
//! ```text
//! ACCUMULATING --newline--> SCANNING_LINE --data------> EMIT --> ACCUMULATING
//!                                         --sentinel--> SENTINEL_SEEN (terminal)
//!                                         --bad json--> MALFORMED     (terminal)
//! ```
//!
//! Only the current partial line is buffered, so memory use does not grow
//! with the size of the transfer. [`pipe`] drives the filter from a blocking
//! reader; each chunk is written to the sink before the next one is read.
//!
//! ```
//! use hecate_cli::eot::{EotFilter, TransferOutcome};
//!
//! let mut sink = Vec::new();
//! let mut filter = EotFilter::new();
//! filter.push(b"{\"id\":1}\n{\"__eot__\":true}\n", &mut sink).unwrap();
//!
//! assert_eq!(filter.finish(), TransferOutcome::Complete { records: 1 });
//! assert_eq!(sink, b"{\"id\":1}\n");
//! ```

use std::io::{self, Read, Write};

use serde_json::Value;
use tracing::{debug, warn};

use crate::api::CancelToken;
use crate::error::{HecateError, Result};

/// Key of the sentinel record. The full record is `{"__eot__":true}`.
pub const SENTINEL_KEY: &str = "__eot__";

/// Read size used by [`pipe`]. Also the most the filter holds beyond one line.
pub const CHUNK_SIZE: usize = 32 * 1024;

/// How a transfer ended. Never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The sentinel was observed; `records` data records were forwarded.
    Complete { records: u64 },
    /// The source ended first; `records` were forwarded and must be discarded.
    Truncated { records: u64 },
}

impl TransferOutcome {
    /// `Truncated` becomes [`HecateError::TruncatedTransfer`].
    pub fn into_result(self) -> Result<u64> {
        match self {
            TransferOutcome::Complete { records } => Ok(records),
            TransferOutcome::Truncated { records } => {
                Err(HecateError::TruncatedTransfer { records })
            }
        }
    }
}

/// What the caller should do after a [`EotFilter::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// Keep reading.
    NeedMore,
    /// Sentinel seen (or the filter already stopped); stop reading.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Accumulating,
    SentinelSeen,
    Malformed,
}

enum Record {
    Data,
    Sentinel,
}

fn classify(line: &[u8]) -> std::result::Result<Record, serde_json::Error> {
    let value: Value = serde_json::from_slice(line)?;
    Ok(if is_sentinel(&value) {
        Record::Sentinel
    } else {
        Record::Data
    })
}

/// True for exactly `{"__eot__": true}`.
pub fn is_sentinel(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.len() == 1 && obj.get(SENTINEL_KEY) == Some(&Value::Bool(true)))
}

/// Re-frames a byte stream into records and forwards data records to a sink.
#[derive(Debug)]
pub struct EotFilter {
    /// Unterminated bytes carried over from previous chunks.
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to contain no newline.
    scanned: usize,
    state: State,
    forwarded: u64,
    lines: u64,
    cancel: Option<CancelToken>,
}

impl Default for EotFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl EotFilter {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            state: State::Accumulating,
            forwarded: 0,
            lines: 0,
            cancel: None,
        }
    }

    /// Check `token` before every forwarded record.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Data records written to the sink so far.
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    pub fn sentinel_seen(&self) -> bool {
        self.state == State::SentinelSeen
    }

    /// Append `chunk` and forward every complete data record it finishes.
    ///
    /// Once the sentinel has been seen, or a line failed to decode, further
    /// input is ignored.
    pub fn push<W: Write + ?Sized>(&mut self, chunk: &[u8], sink: &mut W) -> Result<Scan> {
        if self.state != State::Accumulating {
            return Ok(Scan::Done);
        }

        self.buffer.extend_from_slice(chunk);

        let mut consumed = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.buffer[search_from..].iter().position(|b| *b == b'\n') {
            let end = search_from + offset;
            self.lines += 1;

            let line = &self.buffer[consumed..end];
            match classify(line) {
                Ok(Record::Sentinel) => {
                    debug!(records = self.forwarded, "end of transmission");
                    self.state = State::SentinelSeen;
                    self.buffer = Vec::new();
                    self.scanned = 0;
                    return Ok(Scan::Done);
                }
                Ok(Record::Data) => {
                    if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                        return Err(HecateError::Cancelled);
                    }
                    sink.write_all(line)?;
                    sink.write_all(b"\n")?;
                    self.forwarded += 1;
                }
                Err(source) => {
                    self.state = State::Malformed;
                    self.buffer = Vec::new();
                    self.scanned = 0;
                    return Err(HecateError::MalformedRecord {
                        line: self.lines,
                        source,
                    });
                }
            }

            consumed = end + 1;
            search_from = consumed;
        }

        self.buffer.drain(..consumed);
        self.scanned = self.buffer.len();
        Ok(Scan::NeedMore)
    }

    /// The source has ended. Any unterminated trailing bytes are dropped.
    pub fn finish(self) -> TransferOutcome {
        if self.state == State::SentinelSeen {
            return TransferOutcome::Complete {
                records: self.forwarded,
            };
        }
        if !self.buffer.is_empty() {
            debug!(bytes = self.buffer.len(), "discarding partial trailing line");
        }
        TransferOutcome::Truncated {
            records: self.forwarded,
        }
    }
}

/// Stream `source` through an [`EotFilter`] into `sink`.
///
/// A read error from the source after the response started counts as the
/// source ending: the transfer is reported `Truncated`. The sink is flushed
/// on `Complete`.
pub fn pipe<R, W>(mut source: R, sink: &mut W, cancel: &CancelToken) -> Result<TransferOutcome>
where
    R: Read,
    W: Write + ?Sized,
{
    let mut filter = EotFilter::new().with_cancel(cancel.clone());
    let mut chunk = vec![0u8; CHUNK_SIZE];

    loop {
        if cancel.is_cancelled() {
            return Err(HecateError::Cancelled);
        }

        let n = match source.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, records = filter.forwarded(), "clone stream failed mid-transfer");
                break;
            }
        };

        if filter.push(&chunk[..n], sink)? == Scan::Done {
            break;
        }
    }

    let outcome = filter.finish();
    if let TransferOutcome::Complete { .. } = outcome {
        sink.flush()?;
    }
    Ok(outcome)
}
