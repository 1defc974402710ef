// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::net::{IpAddr, Ipv4Addr};

use crate::error::{ForwardError, Result};

pub const LOCALHOST: &str = "localhost";

/// Turns user input into a target address.
///
/// `localhost` (any case) becomes `127.0.0.1`. Zone suffixes (`fe80::1%3`)
/// are not supported and fail like any other non-literal.
pub fn normalize_target(input: &str) -> Result<IpAddr> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case(LOCALHOST) {
        return Ok(IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    trimmed
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map_err(|_| {
            ForwardError::validation("target address", format!("'{trimmed}' is not an IP literal"))
        })
}

/// Reads a listen address as printed by the forwarding table.
///
/// The table prints `*` for "all interfaces".
pub fn parse_listen_address(token: &str) -> Option<IpAddr> {
    if token == "*" {
        return Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }
    token
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .ok()
}

/// Textual family guess used when nothing better is known.
pub fn looks_like_v6(text: &str) -> bool {
    text.contains(':')
}
