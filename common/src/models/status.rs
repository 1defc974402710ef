// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use serde::Serialize;

pub const UNKNOWN: &str = "unknown";

/// Occupancy of one local port at the time of the probe. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortStatus {
    pub port_number: u16,
    pub is_available: bool,
    pub service_name: String,
    pub process_descriptor: String,
}

impl PortStatus {
    pub fn available(port: u16) -> Self {
        Self {
            port_number: port,
            is_available: true,
            service_name: UNKNOWN.to_string(),
            process_descriptor: UNKNOWN.to_string(),
        }
    }

    /// A bound port. `name` is `None` when the owner could not be resolved,
    /// in which case the descriptor is just [`UNKNOWN`].
    pub fn occupied(port: u16, pid: Option<u32>, name: Option<String>) -> Self {
        let process_descriptor = match (&name, pid) {
            (Some(name), Some(pid)) => format!("{name} (PID: {pid})"),
            _ => UNKNOWN.to_string(),
        };
        Self {
            port_number: port,
            is_available: false,
            service_name: name.unwrap_or_else(|| UNKNOWN.to_string()),
            process_descriptor,
        }
    }
}
