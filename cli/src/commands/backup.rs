// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use pfwd_common::{info, success};
use pfwd_core::driver::Reconciler;

use crate::commands::BackupCommand;
use crate::terminal::print::{self, GLOBAL_KEY_WIDTH, Print};

pub async fn run(cmd: &BackupCommand, driver: &Reconciler) -> anyhow::Result<()> {
    match cmd {
        BackupCommand::List => {
            Print::header("backups");
            Print::backups(&driver.backups()?);
        }
        BackupCommand::Restore {
            name,
            with_settings,
        } => {
            Print::header("restore backup");
            let report = driver.restore_backup(name, *with_settings).await?;
            if let Some(previous) = &report.backup {
                info!("State before the restore saved as {previous}");
            }
            Print::listing(&report.listing);
        }
        BackupCommand::Policy {
            enable,
            disable,
            keep,
        } => {
            let current = driver.settings();
            let create = match (enable, disable) {
                (true, _) => true,
                (_, true) => false,
                _ => current.create_backups,
            };
            let max = keep.map(|k| k as usize).unwrap_or(current.max_backups);

            if *enable || *disable || keep.is_some() {
                driver.set_backup_policy(create, max)?;
                success!("Backup policy updated");
            }

            Print::header("backup policy");
            GLOBAL_KEY_WIDTH.set(8);
            print::aligned_line("Enabled", create.to_string());
            print::aligned_line("Keep", max.to_string());
        }
    }
    Ok(())
}
