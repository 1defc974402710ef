// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::env;

use colored::*;
use pfwd_common::config::{Config, ListenBinding};
use pfwd_core::driver::Reconciler;

use crate::{
    pprint,
    terminal::{
        colors,
        print::{self, GLOBAL_KEY_WIDTH, Print},
    },
};

pub fn info(cfg: &Config, driver: &Reconciler) -> anyhow::Result<()> {
    Print::header("about the tool");
    pprint!(
        "{}",
        "pfwd keeps port-proxy forwarding rules in named profiles and backs up every change."
            .color(colors::TEXT_DEFAULT)
    );
    pprint!();
    GLOBAL_KEY_WIDTH.set(12);

    print_about_the_tool();
    print_local_system(driver)?;
    print_data(cfg, driver);
    Ok(())
}

fn print_about_the_tool() {
    print::aligned_line("Version", env!("CARGO_PKG_VERSION"));
    print::aligned_line("License", "MPL-2.0");
}

fn print_local_system(driver: &Reconciler) -> anyhow::Result<()> {
    Print::header("local system");
    let hostname: String = sys_info::hostname()?;
    print::aligned_line("Hostname", hostname);
    let release = sys_info::os_release().unwrap_or_default();
    let os_name = sys_info::os_type()?;
    print::aligned_line("OS", format!("{} {}", os_name, release).as_str());
    if let Ok(user) = env::var("USER").or_else(|_| env::var("USERNAME")) {
        print::aligned_line("User", user);
    }
    let elevated: ColoredString = if driver.is_elevated() {
        "yes".green().bold()
    } else {
        "no (changes to the table will be refused)".yellow()
    };
    print::aligned_line("Elevated", elevated);
    Ok(())
}

fn print_data(cfg: &Config, driver: &Reconciler) {
    Print::header("data");
    let settings = driver.settings();

    print::aligned_line("Settings", cfg.settings_path().display().to_string());
    print::aligned_line("Backups", cfg.backup_dir().display().to_string());
    print::aligned_line("Log file", cfg.log_path().display().to_string());
    print::aligned_line("Profiles", settings.profiles.len().to_string());

    let last_active: ColoredString = if settings.last_active_profile.is_empty() {
        "none".bright_black()
    } else {
        settings.last_active_profile.color(colors::PRIMARY)
    };
    print::aligned_line("Last active", last_active);

    let snapshots: String = if settings.create_backups {
        format!("on, keeping {}", settings.max_backups)
    } else {
        "off".to_string()
    };
    print::aligned_line("Snapshots", snapshots);

    let binding = match cfg.listen_binding {
        ListenBinding::AnyV4 => "0.0.0.0 for every family",
        ListenBinding::FamilyAny => "0.0.0.0 or :: by family",
    };
    print::aligned_line("Listen on", binding);
    print::aligned_line("Timeout", format!("{}s", cfg.command_timeout.as_secs()));
}
