// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;

use pfwd_common::config::ListenBinding;
use pfwd_common::error::{ForwardError, Result};
use pfwd_common::logging::{EventLog, LogEvent};
use pfwd_common::models::listing::Listing;
use pfwd_common::models::rule::{PortRule, Protocol};
use pfwd_common::system::ForwardingGateway;

use super::parser;
use crate::command::{self, CommandOutput, CommandRunner};

pub const NETSH: &str = "netsh";

/// Fragments the tool prints when the caller is not elevated. Lowercased.
const ELEVATION_MARKERS: [&str; 4] = [
    "requires elevation",
    "run as administrator",
    "access is denied",
    "запрошенная операция требует повышения",
];

pub struct NetshGateway<R: CommandRunner> {
    runner: R,
    binding: ListenBinding,
    log: Arc<dyn EventLog>,
    elevated: fn() -> bool,
}

impl<R: CommandRunner> NetshGateway<R> {
    pub fn new(runner: R, binding: ListenBinding, log: Arc<dyn EventLog>) -> Self {
        Self {
            runner,
            binding,
            log,
            elevated: is_root::is_root,
        }
    }

    /// Replaces the elevation probe.
    pub fn with_elevation(mut self, elevated: fn() -> bool) -> Self {
        self.elevated = elevated;
        self
    }

    pub fn listen_address(&self, protocol: Protocol) -> IpAddr {
        self.binding.listen_address(protocol)
    }

    async fn portproxy(&self, sub: &[String]) -> Result<CommandOutput> {
        let mut args: Vec<String> = vec!["interface".into(), "portproxy".into()];
        args.extend_from_slice(sub);
        let rendered = command::render(NETSH, &args);

        let output = self.runner.run(NETSH, &args).await?;

        if !output.stderr.trim().is_empty() {
            self.log.record(LogEvent::warn(format!(
                "{rendered}: {}",
                output.stderr.trim()
            )));
        }

        if output.success {
            return Ok(output);
        }

        let diagnostic = output.diagnostic().to_string();
        if mentions_elevation(&diagnostic) {
            return Err(ForwardError::Privilege(diagnostic));
        }
        Err(ForwardError::CommandExecution {
            command: rendered,
            message: match output.code {
                Some(code) if diagnostic.is_empty() => format!("exit code {code}"),
                Some(code) => format!("exit code {code}: {diagnostic}"),
                None => format!("terminated by signal: {diagnostic}"),
            },
        })
    }
}

pub fn mentions_elevation(text: &str) -> bool {
    let lower = text.to_lowercase();
    ELEVATION_MARKERS.iter().any(|m| lower.contains(m))
}

fn kv(key: &str, value: impl ToString) -> String {
    format!("{key}={}", value.to_string())
}

#[async_trait]
impl<R: CommandRunner> ForwardingGateway for NetshGateway<R> {
    fn is_elevated(&self) -> bool {
        (self.elevated)()
    }

    async fn list_rules(&self) -> Result<Listing> {
        let output = self.portproxy(&["show".into(), "all".into()]).await?;
        let listing = parser::parse_table(&output.stdout);
        if listing.rules().is_empty() && !parser::has_table_shape(&output.stdout) {
            return Err(ForwardError::Parse {
                what: "portproxy listing".into(),
                message: output.stdout.trim().lines().next().unwrap_or_default().to_string(),
            });
        }
        for warning in listing.warnings() {
            self.log.record(LogEvent::warn(format!("listing: {warning}")));
        }
        Ok(listing)
    }

    async fn add_rule(&self, rule: &PortRule) -> Result<()> {
        let args = [
            "add".to_string(),
            rule.protocol.token().to_string(),
            kv("listenport", rule.listen_port),
            kv("listenaddress", self.listen_address(rule.protocol)),
            kv("connectport", rule.target_port),
            kv("connectaddress", rule.target_address),
        ];
        self.portproxy(&args).await?;
        self.log.record(LogEvent::debug(format!("portproxy add {rule}")));
        Ok(())
    }

    async fn remove_rule(
        &self,
        protocol: Protocol,
        listen_port: u16,
        listen_address: IpAddr,
    ) -> Result<()> {
        let args = [
            "delete".to_string(),
            protocol.token().to_string(),
            kv("listenport", listen_port),
            kv("listenaddress", listen_address),
        ];
        self.portproxy(&args).await?;
        self.log.record(LogEvent::debug(format!(
            "portproxy delete {} {listen_address}:{listen_port}",
            protocol.token()
        )));
        Ok(())
    }

    async fn reset_all(&self) -> Result<()> {
        self.portproxy(&["reset".into()]).await?;
        self.log.record(LogEvent::debug("portproxy reset"));
        Ok(())
    }
}
