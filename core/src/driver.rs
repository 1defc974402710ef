// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Reconciliation Driver
//!
//! Every request that touches the live table walks the same stages:
//!
//! `Validated → Authorized → BackedUp → Applied → Refreshed → Logged`
//!
//! A failing stage ends the request; what was already applied stays applied.
//! There is no rollback, since the OS table is not transactional.
//!
//! ### Concurrency
//! - **Table**: mutators hold the write half of a [`RwLock`], listings and
//!   probes the read half. At most one mutator runs at a time and no listing
//!   observes a half-loaded profile.
//! - **Store**: a short-lived [`Mutex`], never held across an `.await`.
//! - **Progress**: [`LoadProgress`] counters can be read from another task
//!   while a profile replays.

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::RwLock;

use pfwd_common::config::Config;
use pfwd_common::error::{ForwardError, Result};
use pfwd_common::logging::{EventLog, LogEvent};
use pfwd_common::models::listing::Listing;
use pfwd_common::models::profile::RuleProfile;
use pfwd_common::models::rule::{PortRule, Protocol, validate_port};
use pfwd_common::models::settings::AppSettings;
use pfwd_common::models::status::PortStatus;
use pfwd_common::system::{FirewallAllowance, ForwardingGateway};

use crate::backup::{BackupDocument, BackupManager};
use crate::command::SystemRunner;
use crate::exchange;
use crate::firewall::NetshFirewall;
use crate::gateway::NetshGateway;
use crate::probe::OccupancyProber;
use crate::settings::SettingsRepository;
use crate::store::{ImportMode, ImportOutcome, ProfileStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Validated,
    Authorized,
    BackedUp,
    Applied,
    Refreshed,
    Logged,
}

/// Raw user input for a new rule. Checked before anything else happens.
#[derive(Debug, Clone, Default)]
pub struct RuleRequest {
    pub protocol: Protocol,
    pub listen_port: u32,
    pub target: String,
    pub target_port: u32,
    pub description: Option<String>,
    pub open_firewall: bool,
}

/// What a finished mutation leaves behind.
#[derive(Debug, Clone)]
pub struct Applied {
    /// Snapshot written before the change, if backups are on and it succeeded.
    pub backup: Option<String>,
    /// The table as re-read after the change.
    pub listing: Listing,
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub profile: String,
    pub applied: usize,
    pub backup: Option<String>,
    pub listing: Listing,
}

/// Replay counters of the profile load in flight.
#[derive(Debug, Default)]
pub struct LoadProgress {
    applied: AtomicUsize,
    total: AtomicUsize,
}

impl LoadProgress {
    fn start(&self, total: usize) {
        self.applied.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    fn advance(&self) {
        self.applied.fetch_add(1, Ordering::Relaxed);
    }

    /// `(applied, total)`.
    pub fn get(&self) -> (usize, usize) {
        (
            self.applied.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }
}

/// Tracks how far one request got, so a failure can say where it stopped.
struct Attempt<'a> {
    operation: String,
    reached: Option<Stage>,
    log: &'a dyn EventLog,
}

impl<'a> Attempt<'a> {
    fn begin(operation: impl Into<String>, log: &'a dyn EventLog) -> Self {
        Self {
            operation: operation.into(),
            reached: None,
            log,
        }
    }

    fn reach(&mut self, stage: Stage) {
        self.reached = Some(stage);
    }

    fn fail(&self, err: ForwardError) -> ForwardError {
        let stage = match self.reached {
            Some(stage) => format!("after {stage:?}"),
            None => "before validation".to_string(),
        };
        self.log.record(LogEvent::error(format!(
            "{} failed {stage}: {err}",
            self.operation
        )));
        err
    }

    fn finish(mut self, message: String) {
        self.reach(Stage::Logged);
        self.log.record(LogEvent::success(message));
    }
}

pub struct Reconciler {
    gateway: Arc<dyn ForwardingGateway>,
    firewall: Arc<dyn FirewallAllowance>,
    prober: Arc<OccupancyProber>,
    store: Mutex<ProfileStore>,
    repository: SettingsRepository,
    backups: BackupManager,
    table: RwLock<()>,
    progress: Arc<LoadProgress>,
    log: Arc<dyn EventLog>,
}

impl Reconciler {
    /// Loads settings from `repository` and wires the collaborators.
    pub fn new(
        gateway: Arc<dyn ForwardingGateway>,
        firewall: Arc<dyn FirewallAllowance>,
        prober: OccupancyProber,
        repository: SettingsRepository,
        backups: BackupManager,
        log: Arc<dyn EventLog>,
    ) -> Self {
        let settings = repository.load();
        Self {
            gateway,
            firewall,
            prober: Arc::new(prober),
            store: Mutex::new(ProfileStore::new(settings)),
            repository,
            backups,
            table: RwLock::new(()),
            progress: Arc::new(LoadProgress::default()),
            log,
        }
    }

    /// The real `netsh`, firewall, socket table and files under `cfg.data_dir`.
    pub fn system(cfg: &Config, log: Arc<dyn EventLog>) -> Self {
        let runner = Arc::new(SystemRunner::new(cfg.command_timeout));
        Self::new(
            Arc::new(NetshGateway::new(runner.clone(), cfg.listen_binding, log.clone())),
            Arc::new(NetshFirewall::new(runner)),
            OccupancyProber::system(cfg.command_timeout),
            SettingsRepository::new(cfg.settings_path(), log.clone()),
            BackupManager::new(cfg.backup_dir(), log.clone()),
            log,
        )
    }

    fn store(&self) -> MutexGuard<'_, ProfileStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn progress(&self) -> Arc<LoadProgress> {
        self.progress.clone()
    }

    pub fn settings(&self) -> AppSettings {
        self.store().settings().clone()
    }

    pub fn profiles(&self) -> Vec<RuleProfile> {
        self.store().profiles().to_vec()
    }

    pub fn profile(&self, name: &str) -> Option<RuleProfile> {
        self.store().get(name).cloned()
    }

    pub fn is_elevated(&self) -> bool {
        self.gateway.is_elevated()
    }

    /// Current table. Command and parse failures degrade to an empty listing;
    /// privilege and validation failures are returned.
    pub async fn list_rules(&self) -> Result<Listing> {
        let _read = self.table.read().await;
        self.read_table().await
    }

    async fn read_table(&self) -> Result<Listing> {
        match self.gateway.list_rules().await {
            Ok(listing) => Ok(listing),
            Err(e) if e.is_caller_facing() => Err(e),
            Err(e) => {
                self.log
                    .record(LogEvent::warn(format!("could not read the forwarding table: {e}")));
                Ok(Listing::failed(e.to_string()))
            }
        }
    }

    /// Re-reads the table after a change. Never fails.
    async fn refresh(&self) -> Listing {
        match self.gateway.list_rules().await {
            Ok(listing) => listing,
            Err(e) => {
                self.log
                    .record(LogEvent::warn(format!("refresh after change failed: {e}")));
                Listing::failed(e.to_string())
            }
        }
    }

    fn authorize(&self) -> Result<()> {
        if self.gateway.is_elevated() {
            Ok(())
        } else {
            Err(ForwardError::Privilege(
                "changing the forwarding table needs an elevated shell".into(),
            ))
        }
    }

    /// Pre-image of the table and settings. Write failures are logged and do
    /// not stop the mutation that follows. An unreadable table gives no
    /// snapshot at all: restoring an empty one would wipe the live rules.
    async fn backup(&self) -> Option<String> {
        let settings = {
            let store = self.store();
            if !store.settings().create_backups {
                return None;
            }
            store.settings().clone()
        };

        let rules = match self.gateway.list_rules().await {
            Ok(listing) => listing.to_rules(),
            Err(e) => {
                self.log.record(LogEvent::warn(format!(
                    "no backup written, the live table could not be read: {e}"
                )));
                return None;
            }
        };

        match self.backups.snapshot(&rules, &settings) {
            Ok(name) => {
                self.backups.prune(settings.max_backups);
                self.log.record(LogEvent::debug(format!("backup written: {name}")));
                Some(name)
            }
            Err(e) => {
                self.log.record(LogEvent::error(format!("backup failed: {e}")));
                None
            }
        }
    }

    /// Saves settings. Failures are logged; the in-memory state stays authoritative.
    fn persist(&self) {
        let settings = self.store().settings().clone();
        if let Err(e) = self.repository.save(&settings) {
            self.log.record(LogEvent::error(format!("{e}")));
        }
    }

    pub async fn add_rule(&self, request: RuleRequest) -> Result<Applied> {
        let mut attempt = Attempt::begin(
            format!("add rule on port {}", request.listen_port),
            self.log.as_ref(),
        );

        let rule = PortRule::new(
            request.protocol,
            request.listen_port,
            &request.target,
            request.target_port,
            request.description,
        )
        .map_err(|e| attempt.fail(e))?;
        attempt.reach(Stage::Validated);

        self.authorize().map_err(|e| attempt.fail(e))?;
        attempt.reach(Stage::Authorized);

        let _write = self.table.write().await;
        let backup = self.backup().await;
        attempt.reach(Stage::BackedUp);

        self.gateway
            .add_rule(&rule)
            .await
            .map_err(|e| attempt.fail(e))?;
        attempt.reach(Stage::Applied);

        if request.open_firewall {
            if let Err(e) = self.firewall.allow_inbound(rule.listen_port).await {
                self.log.record(LogEvent::warn(format!(
                    "forwarding for port {} is active but the firewall rule failed: {e}",
                    rule.listen_port
                )));
            }
        }

        let listing = self.refresh().await;
        attempt.reach(Stage::Refreshed);

        attempt.finish(format!("added {rule}"));
        Ok(Applied { backup, listing })
    }

    /// Removes the rule listening on `listen_port`.
    ///
    /// Family and listen address come from the live table when the port is
    /// listed there; otherwise from the caller, falling back to the address
    /// shape.
    pub async fn remove_rule(
        &self,
        listen_port: u32,
        listen_address: Option<IpAddr>,
        protocol: Option<Protocol>,
    ) -> Result<Applied> {
        let mut attempt = Attempt::begin(
            format!("remove rule on port {listen_port}"),
            self.log.as_ref(),
        );

        let port = validate_port("listen port", listen_port).map_err(|e| attempt.fail(e))?;
        attempt.reach(Stage::Validated);

        self.authorize().map_err(|e| attempt.fail(e))?;
        attempt.reach(Stage::Authorized);

        let _write = self.table.write().await;
        let live = self.read_table().await.map_err(|e| attempt.fail(e))?;
        let listed = live
            .rules()
            .iter()
            .find(|r| r.listen.port() == port && listen_address.is_none_or(|a| a == r.listen.ip()));

        let (protocol, address) = match listed {
            Some(found) => (protocol.unwrap_or(found.protocol), found.listen.ip()),
            None => {
                let address = listen_address.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
                let text = address.to_string();
                (protocol.unwrap_or_else(|| Protocol::guess(&text, &text)), address)
            }
        };

        let backup = self.backup().await;
        attempt.reach(Stage::BackedUp);

        self.gateway
            .remove_rule(protocol, port, address)
            .await
            .map_err(|e| attempt.fail(e))?;
        attempt.reach(Stage::Applied);

        let listing = self.refresh().await;
        attempt.reach(Stage::Refreshed);

        attempt.finish(format!("removed {} {address}:{port}", protocol.token()));
        Ok(Applied { backup, listing })
    }

    /// Clears the live table and replays a profile in stored order. `None`
    /// loads the last active profile.
    pub async fn load_profile(&self, name: Option<&str>) -> Result<LoadReport> {
        let mut attempt = Attempt::begin("load profile", self.log.as_ref());

        let (name, rules) = {
            let store = self.store();
            let name = match name {
                Some(name) => name.to_string(),
                None => store
                    .last_active()
                    .map(str::to_string)
                    .ok_or_else(|| attempt.fail(ForwardError::NotFound("no last active profile".into())))?,
            };
            let rules = store
                .get(&name)
                .map(|p| p.rules.clone())
                .ok_or_else(|| attempt.fail(ForwardError::NotFound(name.clone())))?;
            (name, rules)
        };
        attempt.operation = format!("load profile '{name}'");
        attempt.reach(Stage::Validated);

        self.authorize().map_err(|e| attempt.fail(e))?;
        attempt.reach(Stage::Authorized);

        let _write = self.table.write().await;
        let backup = self.backup().await;
        attempt.reach(Stage::BackedUp);

        let applied = self
            .replay(&name, &rules)
            .await
            .map_err(|e| attempt.fail(e))?;
        attempt.reach(Stage::Applied);

        {
            let mut store = self.store();
            store.set_last_active(&name);
            store.mark_active(&name);
        }
        self.persist();

        let listing = self.refresh().await;
        attempt.reach(Stage::Refreshed);

        attempt.finish(format!("profile '{name}' loaded with {applied} rule(s)"));
        Ok(LoadReport {
            profile: name,
            applied,
            backup,
            listing,
        })
    }

    /// Reset, then add each rule. Caller holds the write lock.
    async fn replay(&self, label: &str, rules: &[PortRule]) -> Result<usize> {
        self.progress.start(rules.len());
        self.gateway.reset_all().await?;

        for (index, rule) in rules.iter().enumerate() {
            if let Err(source) = self.gateway.add_rule(rule).await {
                return Err(ForwardError::PartialLoad {
                    profile: label.to_string(),
                    applied: index,
                    total: rules.len(),
                    source: Box::new(source),
                });
            }
            self.progress.advance();
        }
        Ok(rules.len())
    }

    /// Puts the rules of a snapshot back live. With `restore_settings` the
    /// snapshot's settings replace the current ones as well.
    pub async fn restore_backup(&self, name: &str, restore_settings: bool) -> Result<LoadReport> {
        let mut attempt = Attempt::begin(format!("restore {name}"), self.log.as_ref());

        let BackupDocument { rules, settings, .. } =
            self.backups.read(name).map_err(|e| attempt.fail(e))?;
        attempt.reach(Stage::Validated);

        self.authorize().map_err(|e| attempt.fail(e))?;
        attempt.reach(Stage::Authorized);

        let _write = self.table.write().await;
        let backup = self.backup().await;
        attempt.reach(Stage::BackedUp);

        let applied = self
            .replay(name, &rules)
            .await
            .map_err(|e| attempt.fail(e))?;
        attempt.reach(Stage::Applied);

        if restore_settings {
            self.store().replace_settings(settings);
            self.persist();
        }

        let listing = self.refresh().await;
        attempt.reach(Stage::Refreshed);

        attempt.finish(format!("restored {applied} rule(s) from {name}"));
        Ok(LoadReport {
            profile: name.to_string(),
            applied,
            backup,
            listing,
        })
    }

    pub async fn check_ports(&self) -> Result<Vec<PortStatus>> {
        let rules = self.list_rules().await?.to_rules();
        let statuses = self.check_rules(rules).await;
        self.log
            .record(LogEvent::info(format!("checked {} port(s)", statuses.len())));
        Ok(statuses)
    }

    /// Reads the socket table within the probe timeout, then resolves process
    /// names on the blocking pool. An unreadable table reads as all ports free.
    pub async fn check_rules(&self, rules: Vec<PortRule>) -> Vec<PortStatus> {
        let entries = match self.prober.entries().await {
            Ok(entries) => entries,
            Err(e) => {
                self.log
                    .record(LogEvent::warn(format!("socket table unavailable: {e}")));
                Vec::new()
            }
        };
        let prober = self.prober.clone();
        match tokio::task::spawn_blocking(move || prober.statuses(&entries, &rules)).await {
            Ok(statuses) => statuses,
            Err(e) => {
                self.log.record(LogEvent::error(format!("occupancy probe aborted: {e}")));
                Vec::new()
            }
        }
    }

    pub fn create_profile(&self, name: &str, rules: Vec<PortRule>) -> Result<RuleProfile> {
        let profile = self.store().create_profile(name, rules)?.clone();
        self.persist();
        self.log.record(LogEvent::success(format!(
            "profile '{}' created with {} rule(s)",
            profile.name,
            profile.rules.len()
        )));
        Ok(profile)
    }

    pub async fn create_profile_from_live(&self, name: &str) -> Result<RuleProfile> {
        let rules = self.list_rules().await?.to_rules();
        self.create_profile(name, rules)
    }

    pub fn save_profile(&self, name: &str, rules: Vec<PortRule>) -> Result<RuleProfile> {
        let profile = self.store().save_profile(name, rules)?.clone();
        self.persist();
        self.log.record(LogEvent::success(format!(
            "profile '{name}' saved with {} rule(s)",
            profile.rules.len()
        )));
        Ok(profile)
    }

    pub async fn save_profile_from_live(&self, name: &str) -> Result<RuleProfile> {
        let rules = self.list_rules().await?.to_rules();
        self.save_profile(name, rules)
    }

    pub fn delete_profile(&self, name: &str) -> usize {
        let removed = self.store().delete_profile(name);
        if removed > 0 {
            self.persist();
            self.log.record(LogEvent::success(format!("profile '{name}' deleted")));
        }
        removed
    }

    pub fn rename_profile(&self, old: &str, new: &str) -> Result<()> {
        self.store().rename_profile(old, new)?;
        self.persist();
        self.log
            .record(LogEvent::success(format!("profile '{old}' renamed to '{new}'")));
        Ok(())
    }

    pub fn duplicate_profile(&self, source: &str, new: &str) -> Result<RuleProfile> {
        let profile = self.store().duplicate_profile(source, new)?.clone();
        self.persist();
        Ok(profile)
    }

    pub fn export_profile(&self, name: &str, path: &Path) -> Result<()> {
        let profile = self
            .profile(name)
            .ok_or_else(|| ForwardError::NotFound(name.to_string()))?;
        exchange::export_profile(&profile, path)?;
        self.log.record(LogEvent::success(format!(
            "profile '{name}' exported to {}",
            path.display()
        )));
        Ok(())
    }

    /// Imports a document. Replacing the active profile also pushes it live.
    pub async fn import_profile(&self, path: &Path, mode: ImportMode) -> Result<ImportOutcome> {
        let (profile, version) = exchange::import_profile(path)?;
        if let Some(version) = version.filter(|v| v != exchange::FORMAT_VERSION) {
            self.log.record(LogEvent::debug(format!(
                "importing a document written by version {version}"
            )));
        }

        if matches!(mode, ImportMode::ReplaceActive) {
            self.authorize()?;
        }
        let outcome = self.store().import_profile(profile, mode)?;
        self.persist();

        match &outcome {
            ImportOutcome::Created(name) => {
                self.log
                    .record(LogEvent::success(format!("imported as profile '{name}'")));
            }
            ImportOutcome::Replaced(name) => {
                self.load_profile(Some(name)).await?;
            }
        }
        Ok(outcome)
    }

    pub fn set_backup_policy(&self, create_backups: bool, max_backups: usize) -> Result<()> {
        self.store().set_backup_policy(create_backups, max_backups)?;
        self.persist();
        self.backups.prune(max_backups);
        Ok(())
    }

    pub fn backups(&self) -> Result<Vec<String>> {
        self.backups.list()
    }
}
