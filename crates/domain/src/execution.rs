//! Execution records
//!
//! One [`ExecutionInfo`] is produced per top-level call and handed to every
//! registered observer, successful or not. The record is append-only: the
//! builder collects the command at call start and the response metadata at
//! call end, then freezes into the immutable record.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::command::Command;
use crate::response::{ApiErrorDetail, ApiResponse};

/// Immutable record of one command execution.
#[derive(Debug, Clone)]
pub struct ExecutionInfo {
    command: Command,
    response: Option<ApiResponse>,
    http_status: Option<u16>,
    http_headers: HashMap<String, String>,
    started_at: DateTime<Utc>,
    elapsed: Duration,
}

impl ExecutionInfo {
    /// The command this record describes.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Parsed response envelope, absent when the call failed before a
    /// response existed.
    pub fn response(&self) -> Option<&ApiResponse> {
        self.response.as_ref()
    }

    /// HTTP status of the final attempt.
    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    /// Response headers of the final attempt.
    pub fn http_headers(&self) -> &HashMap<String, String> {
        &self.http_headers
    }

    /// Wall-clock time the call started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Wall-clock time from call start to record construction.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Application-level errors the response carried, empty on success.
    pub fn error_details(&self) -> &[ApiErrorDetail] {
        self.response.as_ref().map_or(&[], |response| response.errors.as_slice())
    }
}

/// Builder collecting execution metadata as a call progresses.
#[derive(Debug)]
pub struct ExecutionInfoBuilder {
    command: Command,
    response: Option<ApiResponse>,
    http_status: Option<u16>,
    http_headers: HashMap<String, String>,
    started_at: DateTime<Utc>,
    started_instant: Instant,
}

impl ExecutionInfoBuilder {
    /// Start recording for the given command. Captures the start time.
    pub fn new(command: &Command) -> Self {
        Self {
            command: command.clone(),
            response: None,
            http_status: None,
            http_headers: HashMap::new(),
            started_at: Utc::now(),
            started_instant: Instant::now(),
        }
    }

    /// Record the HTTP status and headers of the final attempt.
    pub fn http_response(&mut self, status: u16, headers: HashMap<String, String>) {
        self.http_status = Some(status);
        self.http_headers = headers;
    }

    /// Record the parsed response envelope.
    pub fn api_response(&mut self, response: &ApiResponse) {
        self.response = Some(response.clone());
    }

    /// Freeze into the immutable record, stamping the elapsed time.
    pub fn build(self) -> ExecutionInfo {
        ExecutionInfo {
            command: self.command,
            response: self.response,
            http_status: self.http_status,
            http_headers: self.http_headers,
            started_at: self.started_at,
            elapsed: self.started_instant.elapsed(),
        }
    }
}
