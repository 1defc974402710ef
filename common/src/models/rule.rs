// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Port Rule Model
//!
//! A single `listen port -> target address:port` redirection.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::{ForwardError, Result};
use crate::utils::ip;

/// Address families on both ends of a redirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Protocol {
    #[default]
    #[serde(rename = "IPv4_to_IPv4", alias = "v4tov4")]
    V4ToV4,
    #[serde(rename = "IPv4_to_IPv6", alias = "v4tov6")]
    V4ToV6,
    #[serde(rename = "IPv6_to_IPv4", alias = "v6tov4")]
    V6ToV4,
    #[serde(rename = "IPv6_to_IPv6", alias = "v6tov6")]
    V6ToV6,
}

impl Protocol {
    pub const ALL: [Protocol; 4] = [
        Protocol::V4ToV4,
        Protocol::V4ToV6,
        Protocol::V6ToV4,
        Protocol::V6ToV6,
    ];

    pub fn from_families(listen_v6: bool, connect_v6: bool) -> Self {
        match (listen_v6, connect_v6) {
            (false, false) => Protocol::V4ToV4,
            (false, true) => Protocol::V4ToV6,
            (true, false) => Protocol::V6ToV4,
            (true, true) => Protocol::V6ToV6,
        }
    }

    /// Family guess from the textual shape of two addresses.
    pub fn guess(listen: &str, target: &str) -> Self {
        Self::from_families(ip::looks_like_v6(listen), ip::looks_like_v6(target))
    }

    /// Family token understood by the forwarding-table tool.
    pub fn token(&self) -> &'static str {
        match self {
            Protocol::V4ToV4 => "v4tov4",
            Protocol::V4ToV6 => "v4tov6",
            Protocol::V6ToV4 => "v6tov4",
            Protocol::V6ToV6 => "v6tov6",
        }
    }

    pub fn listens_on_v6(&self) -> bool {
        matches!(self, Protocol::V6ToV4 | Protocol::V6ToV6)
    }

    pub fn connects_to_v6(&self) -> bool {
        matches!(self, Protocol::V4ToV6 | Protocol::V6ToV6)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Protocol::V4ToV4 => "IPv4 → IPv4",
            Protocol::V4ToV6 => "IPv4 → IPv6",
            Protocol::V6ToV4 => "IPv6 → IPv4",
            Protocol::V6ToV6 => "IPv6 → IPv6",
        };
        f.write_str(label)
    }
}

impl FromStr for Protocol {
    type Err = ForwardError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace(['_', '-'], "");
        Protocol::ALL
            .into_iter()
            .find(|p| {
                let long = match p {
                    Protocol::V4ToV4 => "ipv4toipv4",
                    Protocol::V4ToV6 => "ipv4toipv6",
                    Protocol::V6ToV4 => "ipv6toipv4",
                    Protocol::V6ToV6 => "ipv6toipv6",
                };
                wanted == p.token() || wanted == long
            })
            .ok_or_else(|| {
                ForwardError::validation(
                    "protocol",
                    format!("'{s}' is not one of v4tov4, v4tov6, v6tov4, v6tov6"),
                )
            })
    }
}

/// A redirection as stored in profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortRule {
    #[serde(default)]
    pub protocol: Protocol,
    pub listen_port: u16,
    pub target_address: IpAddr,
    pub target_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "Local::now")]
    pub created_at: DateTime<Local>,
}

impl PortRule {
    /// Builds a rule from raw input, enforcing every invariant.
    ///
    /// Ports arrive as `u32` so that out-of-range input such as `65536` is
    /// reported as a validation failure instead of being truncated.
    pub fn new(
        protocol: Protocol,
        listen_port: u32,
        target: &str,
        target_port: u32,
        description: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            protocol,
            listen_port: validate_port("listen port", listen_port)?,
            target_address: ip::normalize_target(target)?,
            target_port: validate_port("target port", target_port)?,
            description: description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            created_at: Local::now(),
        })
    }

    /// Re-checks a rule that came from a document rather than from [`PortRule::new`].
    pub fn validate(&self) -> Result<()> {
        validate_port("listen port", u32::from(self.listen_port))?;
        validate_port("target port", u32::from(self.target_port))?;
        Ok(())
    }
}

impl fmt::Display for PortRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = std::net::SocketAddr::new(self.target_address, self.target_port);
        write!(f, "{} → {} ({})", self.listen_port, target, self.protocol)
    }
}

pub fn validate_port(field: &'static str, port: u32) -> Result<u16> {
    match u16::try_from(port) {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(ForwardError::validation(
            field,
            format!("{port} is outside 1-65535"),
        )),
    }
}
