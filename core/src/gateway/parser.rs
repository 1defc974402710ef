// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! Structural reader for the `show all` table.
//!
//! Nothing here matches header words, which are translated by the OS. A
//! section heading is the only line naming two address families, a data row
//! is the only line with ports in its 2nd and 4th columns, and everything
//! else is either a column header (before the first row of a section) or
//! noise worth a warning.

use std::net::{IpAddr, SocketAddr};

use pfwd_common::models::listing::{ListedRule, Listing};
use pfwd_common::models::rule::Protocol;
use pfwd_common::utils::ip;

#[derive(Debug, Default)]
struct Section {
    protocol: Option<Protocol>,
    seen_row: bool,
}

pub fn parse_table(output: &str) -> Listing {
    let mut rules: Vec<ListedRule> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();
    let mut section = Section::default();

    for (index, raw) in output.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || is_separator(line) {
            continue;
        }

        if let Some(protocol) = section_heading(line) {
            section = Section {
                protocol: Some(protocol),
                seen_row: false,
            };
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 4 {
            continue;
        }

        let ports = (tokens[1].parse::<u16>(), tokens[3].parse::<u16>());
        let (Ok(listen_port), Ok(target_port)) = ports else {
            if section.seen_row {
                warnings.push(format!("line {}: unrecognized row '{line}'", index + 1));
            }
            continue;
        };
        section.seen_row = true;

        let Some(listen_ip) = ip::parse_listen_address(tokens[0]) else {
            warnings.push(format!(
                "line {}: listen address '{}' is not an IP literal",
                index + 1,
                tokens[0]
            ));
            continue;
        };
        let Ok(target_ip) = ip::normalize_target(tokens[2]) else {
            warnings.push(format!(
                "line {}: target '{}' is not an IP literal, row skipped",
                index + 1,
                tokens[2]
            ));
            continue;
        };

        let (protocol, family_guessed) = match section.protocol {
            Some(protocol) => (protocol, false),
            None => (Protocol::guess(tokens[0], tokens[2]), true),
        };

        rules.push(ListedRule {
            protocol,
            listen: SocketAddr::new(listen_ip, listen_port),
            target: SocketAddr::new(target_ip, target_port),
            family_guessed,
        });
    }

    Listing::from_parts(rules, warnings)
}

/// False when `output` says something but nothing in it looks like the table:
/// no section heading, no dash row, no data row.
pub fn has_table_shape(output: &str) -> bool {
    let mut lines = output.lines().map(str::trim).filter(|l| !l.is_empty()).peekable();
    if lines.peek().is_none() {
        return true;
    }
    lines.any(|line| {
        is_separator(line) || section_heading(line).is_some() || !parse_table(line).rules().is_empty()
    })
}

fn is_separator(line: &str) -> bool {
    line.chars().all(|c| c == '-' || c.is_whitespace())
}

/// `Listen on ipv4:   Connect to ipv6:` in whatever language.
fn section_heading(line: &str) -> Option<Protocol> {
    let families: Vec<bool> = line
        .split_whitespace()
        .filter_map(|token| {
            let token = token.trim_end_matches(':').to_ascii_lowercase();
            match token.as_str() {
                "ipv4" => Some(false),
                "ipv6" => Some(true),
                _ => None,
            }
        })
        .collect();

    match families.as_slice() {
        [listen_v6, connect_v6] => Some(Protocol::from_families(*listen_v6, *connect_v6)),
        _ => None,
    }
}

/// Renders the table the way the English tool prints it.
pub fn render_table(sections: &[(Protocol, Vec<(IpAddr, u16, IpAddr, u16)>)]) -> String {
    let mut out = String::new();
    for (protocol, rows) in sections {
        if rows.is_empty() {
            continue;
        }
        let fam = |v6: bool| if v6 { "ipv6" } else { "ipv4" };
        out.push_str(&format!(
            "\nListen on {}:             Connect to {}:\n\n",
            fam(protocol.listens_on_v6()),
            fam(protocol.connects_to_v6())
        ));
        out.push_str("Address         Port        Address         Port\n");
        out.push_str("--------------- ----------  --------------- ----------\n");
        for (listen, lport, target, tport) in rows {
            out.push_str(&format!(
                "{:<15} {:<10}  {:<15} {}\n",
                listen.to_string(),
                lport,
                target.to_string(),
                tport
            ));
        }
    }
    out.push('\n');
    out
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
