// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Backup & Retention Manager
//!
//! A snapshot is one JSON file under the backup directory holding the live
//! rules, the full settings and the time it was taken. File names embed a
//! sortable stamp, so sorting names sorts snapshots by age. Files are only
//! ever created (never rewritten) and removed by [`BackupManager::prune`].

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use pfwd_common::error::{ForwardError, Result};
use pfwd_common::logging::{EventLog, LogEvent};
use pfwd_common::models::rule::PortRule;
use pfwd_common::models::settings::AppSettings;
use pfwd_common::utils::timing::sortable_stamp;

pub const PREFIX: &str = "backup_";
pub const EXTENSION: &str = "json";

/// Suffixes tried when two snapshots land on the same millisecond.
const MAX_COLLISIONS: u32 = 99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupDocument {
    pub timestamp: DateTime<Local>,
    #[serde(default)]
    pub rules: Vec<PortRule>,
    #[serde(default)]
    pub settings: AppSettings,
}

pub struct BackupManager {
    dir: PathBuf,
    log: Arc<dyn EventLog>,
}

impl BackupManager {
    pub fn new(dir: impl Into<PathBuf>, log: Arc<dyn EventLog>) -> Self {
        Self {
            dir: dir.into(),
            log,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn snapshot(&self, rules: &[PortRule], settings: &AppSettings) -> Result<String> {
        self.snapshot_at(Local::now(), rules, settings)
    }

    /// Writes a snapshot stamped `at` and returns its file name. The name
    /// carries the UTC stamp, the document keeps local time.
    pub fn snapshot_at<Tz: TimeZone>(
        &self,
        at: DateTime<Tz>,
        rules: &[PortRule],
        settings: &AppSettings,
    ) -> Result<String> {
        fs::create_dir_all(&self.dir).map_err(|e| ForwardError::persistence(&self.dir, e))?;

        let document = BackupDocument {
            timestamp: at.with_timezone(&Local),
            rules: rules.to_vec(),
            settings: settings.clone(),
        };
        let json = serde_json::to_vec_pretty(&document)
            .map_err(|e| ForwardError::persistence(&self.dir, io::Error::other(e)))?;

        let stamp = sortable_stamp(&at);
        for attempt in 0..=MAX_COLLISIONS {
            let name = match attempt {
                0 => format!("{PREFIX}{stamp}.{EXTENSION}"),
                n => format!("{PREFIX}{stamp}_{n:02}.{EXTENSION}"),
            };
            let path = self.dir.join(&name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(&json)
                        .map_err(|e| ForwardError::persistence(&path, e))?;
                    return Ok(name);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(ForwardError::persistence(&path, e)),
            }
        }

        Err(ForwardError::persistence(
            &self.dir,
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("every name for stamp {stamp} is taken"),
            ),
        ))
    }

    /// Snapshot file names, newest first. A missing directory is empty.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ForwardError::persistence(&self.dir, e)),
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_backup_name(name))
            .collect();
        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names)
    }

    /// Keeps the newest `max_backups` snapshots and returns how many were removed.
    /// Failures are logged and skipped.
    pub fn prune(&self, max_backups: usize) -> usize {
        let names = match self.list() {
            Ok(names) => names,
            Err(e) => {
                self.log.record(LogEvent::warn(format!("backup cleanup skipped: {e}")));
                return 0;
            }
        };

        let mut removed = 0;
        for name in names.iter().skip(max_backups.max(1)) {
            let path = self.dir.join(name);
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => self.log.record(LogEvent::warn(format!(
                    "could not delete old backup {}: {e}",
                    path.display()
                ))),
            }
        }
        if removed > 0 {
            self.log.record(LogEvent::debug(format!("pruned {removed} old backup(s)")));
        }
        removed
    }

    pub fn read(&self, name: &str) -> Result<BackupDocument> {
        if !is_backup_name(name) || name.contains(['/', '\\']) {
            return Err(ForwardError::NotFound(format!("backup {name}")));
        }
        let path = self.dir.join(name);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ForwardError::NotFound(format!("backup {name}")));
            }
            Err(e) => return Err(ForwardError::persistence(&path, e)),
        };
        serde_json::from_str(&text).map_err(|e| ForwardError::InvalidDocument {
            path,
            message: e.to_string(),
        })
    }
}

fn is_backup_name(name: &str) -> bool {
    name.starts_with(PREFIX)
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext == EXTENSION)
}
