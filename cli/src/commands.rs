// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Command Line Interface Definitions
//!
//! The shape of every subcommand and flag lives here. Execution lives in the
//! submodules, which receive the already-validated arguments.
//!
//! * [`CommandLine`]: global flags (output density, data directory, timeouts).
//! * [`Commands`]: the operation to run; [`ProfileCommand`],
//!   [`BackupCommand`] and [`LogCommand`] group the profile, snapshot and
//!   log file operations.
//!
//! `From<&CommandLine> for Config` keeps the core crates unaware of `clap`.

pub mod backup;
pub mod check;
pub mod info;
pub mod log;
pub mod profile;
pub mod rules;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use pfwd_common::config::{self, Config, ListenBinding};
use pfwd_common::models::rule::Protocol;

#[derive(Parser)]
#[command(name = "pfwd")]
#[command(about = "Manage port-proxy forwarding rules, profiles and backups.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Keep logs and colors but hide the ASCII art
    #[arg(long = "no-banner", global = true)]
    pub no_banner: bool,

    /// Reduce UI visual density (-q: reduce styling, -qq: raw lines)
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Increase logging detail (-v: debug logs)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Where settings, backups and the log file live [env: PFWD_DATA_DIR]
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Seconds to wait for a single netsh call
    #[arg(long = "timeout", value_name = "SECS", global = true, default_value_t = config::DEFAULT_COMMAND_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Listen on `::` for IPv6-listening families instead of 0.0.0.0
    #[arg(long = "bind-family-any", global = true)]
    pub bind_family_any: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the live forwarding table
    #[command(alias = "ls")]
    List,

    /// Add a forwarding rule
    #[command(alias = "a")]
    Add {
        #[arg(value_name = "LISTEN_PORT")]
        listen_port: u32,
        /// IP literal or `localhost`
        #[arg(value_name = "TARGET")]
        target: String,
        #[arg(value_name = "TARGET_PORT")]
        target_port: u32,
        /// v4tov4, v4tov6, v6tov4 or v6tov6
        #[arg(short = 'p', long = "protocol", default_value = "v4tov4")]
        protocol: Protocol,
        #[arg(short = 'd', long = "description")]
        description: Option<String>,
        /// Also allow inbound TCP on the listen port
        #[arg(long = "firewall")]
        firewall: bool,
    },

    /// Remove the rule listening on a port
    #[command(alias = "rm")]
    Remove {
        #[arg(value_name = "LISTEN_PORT")]
        listen_port: u32,
        /// Listen address, when several rules share the port
        #[arg(long = "address")]
        address: Option<std::net::IpAddr>,
        #[arg(short = 'p', long = "protocol")]
        protocol: Option<Protocol>,
    },

    /// Show which processes own the listen ports
    #[command(alias = "c")]
    Check,

    /// Show tool, system and data directory details
    #[command(alias = "i")]
    Info,

    /// Manage saved profiles
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Inspect and restore snapshots
    #[command(subcommand)]
    Backup(BackupCommand),

    /// Maintain the persistent log file
    #[command(subcommand)]
    Log(LogCommand),
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// List saved profiles
    List,
    /// Show the rules of one profile
    Show { name: String },
    /// Save the live table as a new profile
    Create { name: String },
    /// Overwrite a profile with the live table
    Save { name: String },
    Delete { name: String },
    Rename { old: String, new: String },
    /// Copy a profile under a new name
    Duplicate { source: String, new: String },
    /// Replace the live table with a profile (default: the last active one)
    Load { name: Option<String> },
    Export { name: String, path: PathBuf },
    Import {
        path: PathBuf,
        /// Name for the new profile; defaults to the one in the document
        #[arg(long = "name", conflicts_with = "replace_active")]
        name: Option<String>,
        /// Overwrite the active profile and apply it
        #[arg(long = "replace-active")]
        replace_active: bool,
    },
}

#[derive(Subcommand)]
pub enum BackupCommand {
    /// List snapshots, newest first
    List,
    /// Reset the table to a snapshot's rules
    Restore {
        name: String,
        /// Restore the snapshot's settings and profiles as well
        #[arg(long = "with-settings")]
        with_settings: bool,
    },
    /// Show or change snapshot settings
    Policy {
        #[arg(long = "enable", conflicts_with = "disable")]
        enable: bool,
        #[arg(long = "disable")]
        disable: bool,
        /// How many snapshots to keep (at least 1)
        #[arg(long = "keep", value_parser = clap::value_parser!(u64).range(1..))]
        keep: Option<u64>,
    },
}

#[derive(Subcommand)]
pub enum LogCommand {
    /// Empty the log file
    Clear,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl From<&CommandLine> for Config {
    fn from(cmd: &CommandLine) -> Self {
        Self {
            no_banner: cmd.no_banner,
            quiet: cmd.quiet,
            data_dir: cmd.data_dir.clone().unwrap_or_else(config::default_data_dir),
            command_timeout: Duration::from_secs(cmd.timeout.max(1)),
            listen_binding: if cmd.bind_family_any {
                ListenBinding::FamilyAny
            } else {
                ListenBinding::AnyV4
            },
        }
    }
}
