// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

use crate::models::profile::RuleProfile;

pub const DEFAULT_MAX_BACKUPS: usize = 10;

/// Everything that survives a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub profiles: Vec<RuleProfile>,
    #[serde(default = "default_create_backups")]
    pub create_backups: bool,
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,
    /// Name of the profile to restore on the next session. May dangle.
    #[serde(default)]
    pub last_active_profile: String,
}

fn default_create_backups() -> bool {
    true
}

fn default_max_backups() -> usize {
    DEFAULT_MAX_BACKUPS
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            profiles: Vec::new(),
            create_backups: default_create_backups(),
            max_backups: default_max_backups(),
            last_active_profile: String::new(),
        }
    }
}

impl AppSettings {
    /// Repairs values a hand-edited file may carry.
    pub fn sanitized(mut self) -> Self {
        self.max_backups = self.max_backups.max(1);
        self
    }
}
