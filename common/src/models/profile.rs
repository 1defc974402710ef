// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::models::rule::PortRule;

/// A named, ordered set of rules. Order is application order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleProfile {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<PortRule>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default = "Local::now")]
    pub created_at: DateTime<Local>,
    #[serde(default = "Local::now")]
    pub modified_at: DateTime<Local>,
}

impl RuleProfile {
    pub fn new(name: impl Into<String>, rules: Vec<PortRule>) -> Self {
        let now = Local::now();
        Self {
            name: name.into(),
            rules,
            is_active: false,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn replace_rules(&mut self, rules: Vec<PortRule>) {
        self.rules = rules;
        self.modified_at = Local::now();
    }
}
