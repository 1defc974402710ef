// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Port Occupancy Prober
//!
//! Read-only view of which process owns a local TCP port. The socket table
//! and the pid-to-name lookup are separate seams: the table is OS specific
//! ([`IpHelperTable`] on Windows, [`SsTable`] elsewhere) while names always
//! come from `sysinfo`.
//!
//! Reading the table is bounded by the probe timeout and its failures,
//! expiry included, come back from [`OccupancyProber::entries`]. The lookups
//! built on top treat an unreadable table as "no owner" and never fail.

pub mod process;
pub mod table;

#[cfg(not(windows))]
pub mod ss;
#[cfg(windows)]
pub mod windows;

use std::time::Duration;

use async_trait::async_trait;
use rayon::prelude::*;

use pfwd_common::config::DEFAULT_COMMAND_TIMEOUT;
use pfwd_common::error::{ForwardError, Result};
use pfwd_common::models::rule::PortRule;
use pfwd_common::models::status::{PortStatus, UNKNOWN};

pub use process::SysinfoResolver;
pub use table::SocketEntry;

#[cfg(not(windows))]
pub use ss::SsTable;
#[cfg(windows)]
pub use windows::IpHelperTable;

/// Source of socket-to-pid rows.
#[async_trait]
pub trait SocketTable: Send + Sync {
    async fn entries(&self) -> Result<Vec<SocketEntry>>;
}

pub trait ProcessResolver: Send + Sync {
    /// `None` when the process is gone or cannot be inspected.
    fn process_name(&self, pid: u32) -> Option<String>;
}

/// Result of looking one port up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    None,
    /// Bound, but the table did not say by whom.
    Anonymous,
    Pid(u32),
}

pub struct OccupancyProber {
    table: Box<dyn SocketTable>,
    resolver: Box<dyn ProcessResolver>,
    timeout: Duration,
}

impl OccupancyProber {
    pub fn new(table: Box<dyn SocketTable>, resolver: Box<dyn ProcessResolver>) -> Self {
        Self {
            table,
            resolver,
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The platform table with `sysinfo` names. `timeout` bounds every
    /// table read.
    pub fn system(timeout: Duration) -> Self {
        #[cfg(windows)]
        let table: Box<dyn SocketTable> = Box::new(IpHelperTable);
        #[cfg(not(windows))]
        let table: Box<dyn SocketTable> = Box::new(SsTable::new(std::sync::Arc::new(
            crate::command::SystemRunner::new(timeout),
        )));

        Self::new(table, Box::new(SysinfoResolver)).with_timeout(timeout)
    }

    /// One read of the socket table.
    pub async fn entries(&self) -> Result<Vec<SocketEntry>> {
        match tokio::time::timeout(self.timeout, self.table.entries()).await {
            Ok(result) => result,
            Err(_) => Err(ForwardError::Timeout {
                command: "socket table query".into(),
                timeout: self.timeout,
            }),
        }
    }

    pub async fn find_owning_process(&self, port: u16) -> Owner {
        match self.entries().await {
            Ok(entries) => lookup(&entries, port),
            Err(_) => Owner::None,
        }
    }

    pub fn describe_process(&self, pid: u32) -> String {
        self.resolver
            .process_name(pid)
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    /// One status per rule, in rule order. The table is read once.
    pub async fn check_all(&self, rules: &[PortRule]) -> Vec<PortStatus> {
        let entries = self.entries().await.unwrap_or_default();
        self.statuses(&entries, rules)
    }

    /// Statuses against an already read table. Name lookups may block.
    pub fn statuses(&self, entries: &[SocketEntry], rules: &[PortRule]) -> Vec<PortStatus> {
        rules
            .par_iter()
            .map(|rule| self.status_for(entries, rule.listen_port))
            .collect()
    }

    fn status_for(&self, entries: &[SocketEntry], port: u16) -> PortStatus {
        match lookup(entries, port) {
            Owner::None => PortStatus::available(port),
            Owner::Anonymous => PortStatus::occupied(port, None, None),
            Owner::Pid(pid) => PortStatus::occupied(port, Some(pid), self.resolver.process_name(pid)),
        }
    }
}

fn lookup(entries: &[SocketEntry], port: u16) -> Owner {
    match entries.iter().find(|e| e.local_port == port) {
        None => Owner::None,
        Some(SocketEntry { pid: None, .. }) => Owner::Anonymous,
        Some(SocketEntry { pid: Some(pid), .. }) => Owner::Pid(*pid),
    }
}
