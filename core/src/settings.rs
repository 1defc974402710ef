// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use pfwd_common::error::{ForwardError, Result};
use pfwd_common::logging::{EventLog, LogEvent};
use pfwd_common::models::settings::AppSettings;

/// Durable home of [`AppSettings`].
pub struct SettingsRepository {
    path: PathBuf,
    log: Arc<dyn EventLog>,
}

impl SettingsRepository {
    pub fn new(path: impl Into<PathBuf>, log: Arc<dyn EventLog>) -> Self {
        Self {
            path: path.into(),
            log,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing file gives defaults, a broken one gives
    /// defaults and an error event.
    pub fn load(&self) -> AppSettings {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return AppSettings::default(),
            Err(e) => {
                self.log.record(LogEvent::error(format!(
                    "cannot read settings {}: {e}; using defaults",
                    self.path.display()
                )));
                return AppSettings::default();
            }
        };

        match serde_json::from_str::<AppSettings>(&text) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                self.log.record(LogEvent::error(format!(
                    "settings {} are malformed ({e}); using defaults",
                    self.path.display()
                )));
                AppSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &AppSettings) -> Result<()> {
        write_json_atomic(&self.path, settings)
    }
}

/// Writes pretty JSON next to `path` first, then renames it into place.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ForwardError::persistence(path, io::Error::other(e)))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ForwardError::persistence(parent, e))?;
    }

    let staging = path.with_extension("json.tmp");
    fs::write(&staging, json).map_err(|e| ForwardError::persistence(&staging, e))?;
    fs::rename(&staging, path).map_err(|e| ForwardError::persistence(path, e))
}
