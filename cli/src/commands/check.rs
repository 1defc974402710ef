// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use colored::*;
use pfwd_core::driver::Reconciler;

use crate::terminal::{
    colors,
    print::{self, Print},
};

pub async fn check(driver: &Reconciler) -> anyhow::Result<()> {
    Print::header("port occupancy");
    let statuses = driver.check_ports().await?;
    Print::statuses(&statuses);

    if Print::is_raw() || statuses.is_empty() {
        return Ok(());
    }

    let busy = statuses.iter().filter(|s| !s.is_available).count();
    let summary: String = format!(
        "{} free, {} in use",
        (statuses.len() - busy).to_string().color(colors::FREE).bold(),
        busy.to_string().color(colors::BUSY).bold()
    );
    print::divider();
    print::centerln(&summary);
    Ok(())
}
