// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # pfwd CLI Entry Point
//!
//! Bootstraps the runtime and owns the process lifecycle.
//!
//! 1.  **Runtime Initialization**: `#[tokio::main]` sets up the multi-threaded runtime.
//! 2.  **Global State Setup**: Installs the `tracing` subscriber (terminal and
//!     log file) and the terminal output mode.
//! 3.  **Configuration Mapping**: Converts parsed arguments into [`Config`].
//! 4.  **Command Dispatch**: Routes execution to the modules in `commands/`.
//! 5.  **Error Boundary**: Errors that reach this point are logged and turned
//!     into a non-zero `ExitCode`.

mod commands;
mod terminal;

use std::process::ExitCode;
use std::sync::Arc;

use pfwd_common::logging::TracingLog;
use pfwd_common::{config::Config, error};
use pfwd_core::driver::Reconciler;

use crate::{
    commands::{CommandLine, Commands, backup, check, info, log, profile, rules},
    terminal::{print::Print, spinner},
};

#[tokio::main]
async fn main() -> ExitCode {
    let commands = CommandLine::parse_args();
    let cfg = Config::from(&commands);

    spinner::init_logging(commands.verbosity, Some(&cfg.log_path()));

    let _ = Print::init(&cfg);
    Print::banner();

    let driver = Reconciler::system(&cfg, Arc::new(TracingLog));

    let result = match &commands.command {
        Commands::List => rules::list(&driver).await,
        Commands::Add {
            listen_port,
            target,
            target_port,
            protocol,
            description,
            firewall,
        } => {
            let request = pfwd_core::driver::RuleRequest {
                protocol: *protocol,
                listen_port: *listen_port,
                target: target.clone(),
                target_port: *target_port,
                description: description.clone(),
                open_firewall: *firewall,
            };
            rules::add(&driver, request).await
        }
        Commands::Remove {
            listen_port,
            address,
            protocol,
        } => rules::remove(&driver, *listen_port, *address, *protocol).await,
        Commands::Check => check::check(&driver).await,
        Commands::Info => info::info(&cfg, &driver),
        Commands::Profile(cmd) => profile::run(cmd, &driver).await,
        Commands::Backup(cmd) => backup::run(cmd, &driver).await,
        Commands::Log(cmd) => log::run(cmd, &cfg),
    };

    let exit_code = match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Critical failure: {e:#}");
            ExitCode::FAILURE
        }
    };

    Print::end_of_program();

    exit_code
}
