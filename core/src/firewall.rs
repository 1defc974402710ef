// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;

use pfwd_common::error::{ForwardError, Result};
use pfwd_common::system::FirewallAllowance;

use crate::command::{self, CommandRunner};
use crate::gateway::netsh::{NETSH, mentions_elevation};

pub fn rule_name(listen_port: u16) -> String {
    format!("PortForward_{listen_port}")
}

/// Inbound TCP allow rules through `netsh advfirewall`. Rules are only ever
/// added; nothing tracks or removes them afterwards.
pub struct NetshFirewall<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> NetshFirewall<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

pub fn allow_args(listen_port: u16) -> Vec<String> {
    vec![
        "advfirewall".into(),
        "firewall".into(),
        "add".into(),
        "rule".into(),
        format!("name={}", rule_name(listen_port)),
        "dir=in".into(),
        "action=allow".into(),
        "protocol=TCP".into(),
        format!("localport={listen_port}"),
    ]
}

#[async_trait]
impl<R: CommandRunner> FirewallAllowance for NetshFirewall<R> {
    async fn allow_inbound(&self, listen_port: u16) -> Result<()> {
        let args = allow_args(listen_port);
        let output = self.runner.run(NETSH, &args).await?;
        if output.success {
            return Ok(());
        }
        let diagnostic = output.diagnostic().to_string();
        if mentions_elevation(&diagnostic) {
            return Err(ForwardError::Privilege(diagnostic));
        }
        Err(ForwardError::CommandExecution {
            command: command::render(NETSH, &args),
            message: diagnostic,
        })
    }
}
