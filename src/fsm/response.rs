//! Response emission contract.
//!
//! Processing one request emits zero or more records followed by exactly
//! one terminal response (SUCCESS, FAILURE or IGNORED). GOODBYE is the
//! exception and emits nothing.

use std::collections::VecDeque;

use crate::bolt::error::BoltResult;
use crate::bolt::message::{BoltResponse, FailureMessage, RecordMessage, SuccessMessage};
use crate::bolt::value::BoltValue;

/// Receives the responses produced while processing one request.
///
/// An `Err` from any method is an I/O fault and is propagated out of
/// `process`.
pub trait ResponseHandler {
    /// A result record.
    fn on_record(&mut self, fields: Vec<BoltValue>) -> BoltResult<()>;

    /// Terminal SUCCESS.
    fn on_success(&mut self, success: SuccessMessage) -> BoltResult<()>;

    /// Terminal FAILURE.
    fn on_failure(&mut self, failure: FailureMessage) -> BoltResult<()>;

    /// Terminal IGNORED.
    fn on_ignored(&mut self) -> BoltResult<()>;
}

/// Terminal response computed by a state handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
    /// SUCCESS with metadata
    Success(SuccessMessage),
    /// FAILURE
    Failure(FailureMessage),
    /// IGNORED
    Ignored,
}

impl Terminal {
    /// Empty SUCCESS.
    pub fn success() -> Self {
        Terminal::Success(SuccessMessage::new())
    }

    /// Send to a handler.
    pub fn emit(self, handler: &mut dyn ResponseHandler) -> BoltResult<()> {
        match self {
            Terminal::Success(success) => handler.on_success(success),
            Terminal::Failure(failure) => handler.on_failure(failure),
            Terminal::Ignored => handler.on_ignored(),
        }
    }

    /// Response name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Terminal::Success(_) => "SUCCESS",
            Terminal::Failure(_) => "FAILURE",
            Terminal::Ignored => "IGNORED",
        }
    }
}

/// Everything one request produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedResponse {
    /// Records, in emission order
    pub records: Vec<RecordMessage>,
    /// Terminal response
    pub terminal: BoltResponse,
}

impl RecordedResponse {
    /// SUCCESS metadata, if the terminal was a SUCCESS.
    pub fn success(&self) -> Option<&SuccessMessage> {
        match &self.terminal {
            BoltResponse::Success(success) => Some(success),
            _ => None,
        }
    }

    /// FAILURE, if the terminal was a FAILURE.
    pub fn failure(&self) -> Option<&FailureMessage> {
        match &self.terminal {
            BoltResponse::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    /// Check if the terminal was IGNORED.
    pub fn is_ignored(&self) -> bool {
        matches!(self.terminal, BoltResponse::Ignored)
    }
}

/// Collects responses in memory, grouped per request.
#[derive(Debug, Default)]
pub struct BoltResponseRecorder {
    responses: VecDeque<RecordedResponse>,
    pending_records: Vec<RecordMessage>,
}

impl BoltResponseRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the oldest complete response.
    pub fn next_response(&mut self) -> Option<RecordedResponse> {
        self.responses.pop_front()
    }

    /// Number of complete responses not yet taken.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty() && self.pending_records.is_empty()
    }

    /// Records emitted without a terminal response yet.
    pub fn pending_records(&self) -> &[RecordMessage] {
        &self.pending_records
    }

    fn finish(&mut self, terminal: BoltResponse) -> BoltResult<()> {
        let records = std::mem::take(&mut self.pending_records);
        self.responses.push_back(RecordedResponse { records, terminal });
        Ok(())
    }
}

impl ResponseHandler for BoltResponseRecorder {
    fn on_record(&mut self, fields: Vec<BoltValue>) -> BoltResult<()> {
        self.pending_records.push(RecordMessage::new(fields));
        Ok(())
    }

    fn on_success(&mut self, success: SuccessMessage) -> BoltResult<()> {
        self.finish(BoltResponse::Success(success))
    }

    fn on_failure(&mut self, failure: FailureMessage) -> BoltResult<()> {
        self.finish(BoltResponse::Failure(failure))
    }

    fn on_ignored(&mut self) -> BoltResult<()> {
        self.finish(BoltResponse::Ignored)
    }
}
