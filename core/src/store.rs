// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Rule/Profile Store
//!
//! In-memory owner of [`AppSettings`] and therefore of every profile. Names
//! are unique and compared exactly. Profiles handed in are moved in, profiles
//! handed out are clones, so no two profiles ever share a rule list.

use chrono::Local;

use pfwd_common::error::{ForwardError, Result};
use pfwd_common::models::profile::RuleProfile;
use pfwd_common::models::rule::PortRule;
use pfwd_common::models::settings::AppSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportMode {
    /// Append under the requested name (or the document's), made unique.
    CreateNew { name: Option<String> },
    /// Overwrite the rules of the last active profile.
    ReplaceActive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Created(String),
    /// Rules of this profile were replaced and should be pushed live.
    Replaced(String),
}

#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    settings: AppSettings,
}

impl ProfileStore {
    pub fn new(settings: AppSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn profiles(&self) -> &[RuleProfile] {
        &self.settings.profiles
    }

    pub fn names(&self) -> Vec<String> {
        self.settings.profiles.iter().map(|p| p.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&RuleProfile> {
        self.settings.profiles.iter().find(|p| p.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut RuleProfile> {
        self.settings.profiles.iter_mut().find(|p| p.name == name)
    }

    pub fn create_profile(&mut self, name: &str, rules: Vec<PortRule>) -> Result<&RuleProfile> {
        let name = checked_name(name)?;
        if self.get(&name).is_some() {
            return Err(ForwardError::DuplicateName(name));
        }
        self.settings.profiles.push(RuleProfile::new(name, rules));
        Ok(&self.settings.profiles[self.settings.profiles.len() - 1])
    }

    pub fn save_profile(&mut self, name: &str, rules: Vec<PortRule>) -> Result<&RuleProfile> {
        let profile = self
            .get_mut(name)
            .ok_or_else(|| ForwardError::NotFound(name.to_string()))?;
        profile.replace_rules(rules);
        Ok(profile)
    }

    /// Number of profiles removed. Zero is not an error.
    pub fn delete_profile(&mut self, name: &str) -> usize {
        let before = self.settings.profiles.len();
        self.settings.profiles.retain(|p| p.name != name);
        before - self.settings.profiles.len()
    }

    pub fn rename_profile(&mut self, old: &str, new: &str) -> Result<()> {
        let new = checked_name(new)?;
        if old == new {
            return self.get(old).map(|_| ()).ok_or_else(|| ForwardError::NotFound(old.to_string()));
        }
        if self.get(&new).is_some() {
            return Err(ForwardError::DuplicateName(new));
        }
        let profile = self
            .get_mut(old)
            .ok_or_else(|| ForwardError::NotFound(old.to_string()))?;
        profile.name = new.clone();
        profile.modified_at = Local::now();

        if self.settings.last_active_profile == old {
            self.settings.last_active_profile = new;
        }
        Ok(())
    }

    /// Deep copy of `source` under `new`.
    pub fn duplicate_profile(&mut self, source: &str, new: &str) -> Result<&RuleProfile> {
        let rules = self
            .get(source)
            .ok_or_else(|| ForwardError::NotFound(source.to_string()))?
            .rules
            .clone();
        self.create_profile(new, rules)
    }

    pub fn import_profile(&mut self, data: RuleProfile, mode: ImportMode) -> Result<ImportOutcome> {
        match mode {
            ImportMode::CreateNew { name } => {
                let wanted = name.unwrap_or_else(|| data.name.clone());
                let name = self.unique_name(&checked_name(&wanted)?);
                let mut profile = RuleProfile::new(name.clone(), data.rules);
                profile.created_at = data.created_at;
                self.settings.profiles.push(profile);
                Ok(ImportOutcome::Created(name))
            }
            ImportMode::ReplaceActive => {
                let active = self.settings.last_active_profile.clone();
                if active.is_empty() {
                    return Err(ForwardError::NotFound("no active profile".into()));
                }
                self.save_profile(&active, data.rules)?;
                Ok(ImportOutcome::Replaced(active))
            }
        }
    }

    /// `base`, else `base (2)`, `base (3)`, ...
    pub fn unique_name(&self, base: &str) -> String {
        if self.get(base).is_none() {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base} ({n})"))
            .find(|candidate| self.get(candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    /// Records the session to restore. The name is not checked.
    pub fn set_last_active(&mut self, name: &str) {
        self.settings.last_active_profile = name.to_string();
    }

    pub fn last_active(&self) -> Option<&str> {
        Some(self.settings.last_active_profile.as_str()).filter(|n| !n.is_empty())
    }

    /// Flags exactly `name` as active.
    pub fn mark_active(&mut self, name: &str) {
        for profile in &mut self.settings.profiles {
            profile.is_active = profile.name == name;
        }
    }

    pub fn set_backup_policy(&mut self, create_backups: bool, max_backups: usize) -> Result<()> {
        if max_backups == 0 {
            return Err(ForwardError::validation("max backups", "must be at least 1"));
        }
        self.settings.create_backups = create_backups;
        self.settings.max_backups = max_backups;
        Ok(())
    }

    /// Swaps in a whole settings document, e.g. one read from a backup.
    pub fn replace_settings(&mut self, settings: AppSettings) {
        self.settings = settings.sanitized();
    }
}

fn checked_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ForwardError::validation("profile name", "must not be empty"));
    }
    Ok(trimmed.to_string())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
