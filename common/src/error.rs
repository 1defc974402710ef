// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Error Kinds
//!
//! Every failure the engine can report. The variants map onto how callers
//! react to them:
//!
//! * [`ForwardError::Validation`] and [`ForwardError::Privilege`] are surfaced
//!   immediately and never leave a trace in the OS or on disk.
//! * [`ForwardError::CommandExecution`], [`ForwardError::Timeout`] and
//!   [`ForwardError::Parse`] are logged; listings degrade instead of failing.
//! * [`ForwardError::Persistence`] never blocks the in-memory operation that
//!   triggered it.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForwardError>;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("elevated privileges required: {0}")]
    Privilege(String),

    #[error("command `{command}` failed: {message}")]
    CommandExecution { command: String, message: String },

    #[error("command `{command}` did not finish within {}s", timeout.as_secs_f32())]
    Timeout { command: String, timeout: Duration },

    #[error("could not parse {what}: {message}")]
    Parse { what: String, message: String },

    #[error("failed to persist {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("profile not found: {0}")]
    NotFound(String),

    #[error("profile already exists: {0}")]
    DuplicateName(String),

    #[error("invalid document {}: {message}", path.display())]
    InvalidDocument { path: PathBuf, message: String },

    #[error("profile '{profile}' stopped after {applied} of {total} rules: {source}")]
    PartialLoad {
        profile: String,
        applied: usize,
        total: usize,
        #[source]
        source: Box<ForwardError>,
    },
}

impl ForwardError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Errors the caller has to act on rather than ones to log and move past.
    pub fn is_caller_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::Privilege(_) | Self::NotFound(_) | Self::DuplicateName(_)
        )
    }
}
