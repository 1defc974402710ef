// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;
use std::time::Duration;

use crate::models::rule::Protocol;

/// Folder under the platform data directory that holds settings, backups and logs.
pub const APP_DIR: &str = "PortForwardManager";

/// Overrides the data directory when set.
pub const DATA_DIR_ENV: &str = "PFWD_DATA_DIR";

pub const SETTINGS_FILE: &str = "portforward_settings.json";
pub const BACKUP_DIR: &str = "Backups";
pub const LOG_FILE: &str = "portforward.log";

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Which address a new rule listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenBinding {
    /// `0.0.0.0` for every family, including the IPv6-listening ones.
    #[default]
    AnyV4,
    /// `0.0.0.0` for IPv4-listening families, `::` for IPv6-listening ones.
    FamilyAny,
}

impl ListenBinding {
    pub fn listen_address(&self, protocol: Protocol) -> IpAddr {
        match self {
            ListenBinding::FamilyAny if protocol.listens_on_v6() => {
                IpAddr::V6(Ipv6Addr::UNSPECIFIED)
            }
            _ => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

/// Global configuration options for a single invocation.
///
/// Built from CLI arguments. The durable part of the state (profiles,
/// backup policy) lives in the settings document instead.
#[derive(Debug, Clone)]
pub struct Config {
    /// Toggles the display of the startup banner.
    pub no_banner: bool,

    /// Controls the visual density of the terminal output.
    ///
    /// # Levels
    /// * **0** (Default): Full UI, including colors, spinners and tables.
    /// * **1**: Reduced styling.
    /// * **2**: Raw mode. One rule per line, suitable for piping.
    pub quiet: u8,

    /// Where settings, backups and the log file live.
    pub data_dir: PathBuf,

    /// Upper bound for a single external command. Expiry is reported as a
    /// timeout, distinct from a failed command.
    pub command_timeout: Duration,

    pub listen_binding: ListenBinding,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            no_banner: false,
            quiet: 0,
            data_dir: default_data_dir(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            listen_binding: ListenBinding::default(),
        }
    }
}

impl Config {
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join(BACKUP_DIR)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }
}

pub fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(APP_DIR))
}
