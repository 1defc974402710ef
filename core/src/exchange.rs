// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! Export and import of a single profile.
//!
//! Exports are wrapped in an envelope with the time and the crate version.
//! Imports take either that envelope or a bare profile, and every profile
//! field except `name` may be missing.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use pfwd_common::error::{ForwardError, Result};
use pfwd_common::models::profile::RuleProfile;

pub const FORMAT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument<'a> {
    pub profile: &'a RuleProfile,
    pub timestamp: DateTime<Local>,
    pub version: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImportDocument {
    Envelope {
        profile: RuleProfile,
        #[serde(default)]
        version: Option<String>,
    },
    Bare(RuleProfile),
}

pub fn export_profile(profile: &RuleProfile, path: &Path) -> Result<()> {
    let document = ExportDocument {
        profile,
        timestamp: Local::now(),
        version: FORMAT_VERSION,
    };
    crate::settings::write_json_atomic(path, &document)
}

/// Reads a profile document. Anything that does not parse, or carries an
/// invalid rule, fails as a whole.
pub fn import_profile(path: &Path) -> Result<(RuleProfile, Option<String>)> {
    let text = fs::read_to_string(path).map_err(|e| ForwardError::persistence(path, e))?;
    parse_document(&text).map_err(|message| ForwardError::InvalidDocument {
        path: path.to_path_buf(),
        message,
    })
}

/// Returns the profile and the version that wrote it, if recorded.
fn parse_document(text: &str) -> std::result::Result<(RuleProfile, Option<String>), String> {
    let document: ImportDocument = serde_json::from_str(text)
        .map_err(|e| format!("not a profile document: {e}"))?;

    let (profile, version) = match document {
        ImportDocument::Envelope { profile, version, .. } => (profile, version),
        ImportDocument::Bare(profile) => (profile, None),
    };

    if profile.name.trim().is_empty() {
        return Err("profile name is empty".into());
    }
    for (index, rule) in profile.rules.iter().enumerate() {
        rule.validate()
            .map_err(|e| format!("rule #{}: {e}", index + 1))?;
    }
    Ok((profile, version))
}
