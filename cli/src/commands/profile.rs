// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use anyhow::bail;
use colored::*;
use pfwd_common::{info, success, warn};
use pfwd_core::driver::{LoadReport, Reconciler};
use pfwd_core::store::{ImportMode, ImportOutcome};
use tracing::info_span;

use crate::commands::ProfileCommand;
use crate::terminal::{
    colors,
    print::{self, Print},
    spinner::SpinnerGuard,
};

pub async fn run(cmd: &ProfileCommand, driver: &Reconciler) -> anyhow::Result<()> {
    match cmd {
        ProfileCommand::List => {
            Print::header("profiles");
            let settings = driver.settings();
            Print::profiles(&settings.profiles, &settings.last_active_profile);
        }
        ProfileCommand::Show { name } => {
            let Some(profile) = driver.profile(name) else {
                bail!("profile '{name}' does not exist");
            };
            Print::header(&format!("profile {name}"));
            Print::rules(&profile.rules);
        }
        ProfileCommand::Create { name } => {
            let profile = driver.create_profile_from_live(name).await?;
            Print::rules(&profile.rules);
        }
        ProfileCommand::Save { name } => {
            let profile = driver.save_profile_from_live(name).await?;
            Print::rules(&profile.rules);
        }
        ProfileCommand::Delete { name } => {
            if driver.delete_profile(name) == 0 {
                warn!("No profile named '{name}', nothing deleted");
            }
        }
        ProfileCommand::Rename { old, new } => driver.rename_profile(old, new)?,
        ProfileCommand::Duplicate { source, new } => {
            let copy = driver.duplicate_profile(source, new)?;
            success!("'{source}' copied to '{}'", copy.name);
        }
        ProfileCommand::Load { name } => {
            Print::header("load profile");
            let report = load_with_spinner(driver, name.as_deref()).await?;
            summarize(&report);
        }
        ProfileCommand::Export { name, path } => driver.export_profile(name, path)?,
        ProfileCommand::Import {
            path,
            name,
            replace_active,
        } => {
            let mode = if *replace_active {
                ImportMode::ReplaceActive
            } else {
                ImportMode::CreateNew { name: name.clone() }
            };
            if let ImportOutcome::Replaced(active) = driver.import_profile(path, mode).await? {
                info!("Rules of '{active}' replaced and applied");
                Print::listing(&driver.list_rules().await?);
            }
        }
    }
    Ok(())
}

async fn load_with_spinner(driver: &Reconciler, name: Option<&str>) -> anyhow::Result<LoadReport> {
    let _guard: SpinnerGuard = run_spinner(driver);
    Ok(driver.load_profile(name).await?)
}

fn run_spinner(driver: &Reconciler) -> SpinnerGuard {
    let span = info_span!("load", indicatif.pb_show = true);
    let _enter = span.enter();

    let progress = driver.progress();
    SpinnerGuard::with_status(span.clone(), move || {
        let (applied, total) = progress.get();
        format!(
            "Applied {} of {} rules...",
            applied.to_string().green().bold(),
            total
        )
        .color(colors::TEXT_DEFAULT)
        .italic()
    })
}

fn summarize(report: &LoadReport) {
    if let Some(name) = &report.backup {
        info!("Previous state saved as {name}");
    }
    if !Print::is_raw() {
        print::divider();
    }
    Print::listing(&report.listing);
}
