// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::net::IpAddr;

use pfwd_common::models::rule::Protocol;
use pfwd_common::{info, success};
use pfwd_core::driver::{Applied, Reconciler, RuleRequest};

use crate::terminal::print::{self, Print};

pub async fn list(driver: &Reconciler) -> anyhow::Result<()> {
    Print::header("forwarding table");
    let listing = driver.list_rules().await?;
    Print::listing(&listing);
    Ok(())
}

pub async fn add(driver: &Reconciler, request: RuleRequest) -> anyhow::Result<()> {
    Print::header("add rule");
    let applied = driver.add_rule(request).await?;
    after_change(&applied);
    Ok(())
}

pub async fn remove(
    driver: &Reconciler,
    listen_port: u32,
    address: Option<IpAddr>,
    protocol: Option<Protocol>,
) -> anyhow::Result<()> {
    Print::header("remove rule");
    let applied = driver.remove_rule(listen_port, address, protocol).await?;
    after_change(&applied);
    Ok(())
}

pub fn after_change(applied: &Applied) {
    if let Some(name) = &applied.backup {
        info!("Previous state saved as {name}");
    }
    if !Print::is_raw() {
        print::divider();
    }
    Print::listing(&applied.listing);
    if !applied.listing.is_degraded() {
        success!("{} rule(s) active", applied.listing.rules().len());
    }
}
