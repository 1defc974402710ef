// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Live Table Listing
//!
//! What the forwarding table reported the last time it was asked. Nothing
//! here is authoritative between two queries.

use std::fmt;
use std::net::SocketAddr;

use chrono::Local;

use crate::models::rule::{PortRule, Protocol};

/// One row of the OS forwarding table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedRule {
    pub protocol: Protocol,
    pub listen: SocketAddr,
    pub target: SocketAddr,
    /// The family was guessed from address shape instead of read from a section heading.
    pub family_guessed: bool,
}

impl ListedRule {
    /// Copies the row into a profile rule.
    pub fn to_rule(&self) -> PortRule {
        PortRule {
            protocol: self.protocol,
            listen_port: self.listen.port(),
            target_address: self.target.ip(),
            target_port: self.target.port(),
            description: None,
            created_at: Local::now(),
        }
    }

    pub fn matches(&self, rule: &PortRule) -> bool {
        self.listen.port() == rule.listen_port
            && self.target.ip() == rule.target_address
            && self.target.port() == rule.target_port
    }
}

impl fmt::Display for ListedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.listen, self.target)
    }
}

/// Outcome of reading the forwarding table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Clean(Vec<ListedRule>),
    /// Some lines could not be understood, or the listing failed outright.
    Degraded {
        rules: Vec<ListedRule>,
        warnings: Vec<String>,
    },
}

impl Listing {
    pub fn from_parts(rules: Vec<ListedRule>, warnings: Vec<String>) -> Self {
        if warnings.is_empty() {
            Listing::Clean(rules)
        } else {
            Listing::Degraded { rules, warnings }
        }
    }

    pub fn failed(warning: impl Into<String>) -> Self {
        Listing::Degraded {
            rules: Vec::new(),
            warnings: vec![warning.into()],
        }
    }

    pub fn rules(&self) -> &[ListedRule] {
        match self {
            Listing::Clean(rules) | Listing::Degraded { rules, .. } => rules,
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            Listing::Clean(_) => &[],
            Listing::Degraded { warnings, .. } => warnings,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Listing::Degraded { .. })
    }

    pub fn to_rules(&self) -> Vec<PortRule> {
        self.rules().iter().map(ListedRule::to_rule).collect()
    }

    pub fn find_port(&self, port: u16) -> Option<&ListedRule> {
        self.rules().iter().find(|r| r.listen.port() == port)
    }
}
