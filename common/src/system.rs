// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::listing::Listing;
use crate::models::rule::{PortRule, Protocol};
use std::net::IpAddr;

/// Defines the contract for the OS port-forwarding table.
///
/// Every mutating call needs elevated privileges. Implementations report a
/// missing elevation as [`crate::error::ForwardError::Privilege`], never as a
/// generic command failure.
#[async_trait]
pub trait ForwardingGateway: Send + Sync {
    /// Whether the current process may mutate the table.
    fn is_elevated(&self) -> bool;

    /// Reads and parses the live table.
    async fn list_rules(&self) -> Result<Listing>;

    /// Adds `rule`. The listen address is chosen by the implementation.
    async fn add_rule(&self, rule: &PortRule) -> Result<()>;

    async fn remove_rule(
        &self,
        protocol: Protocol,
        listen_port: u16,
        listen_address: IpAddr,
    ) -> Result<()>;

    /// Clears the whole table.
    async fn reset_all(&self) -> Result<()>;
}

/// Opens inbound firewall allowances. Fire-and-forget: nothing tracks them.
#[async_trait]
pub trait FirewallAllowance: Send + Sync {
    async fn allow_inbound(&self, listen_port: u16) -> Result<()>;
}
