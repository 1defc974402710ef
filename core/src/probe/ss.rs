// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use async_trait::async_trait;

use pfwd_common::error::{ForwardError, Result};

use super::SocketTable;
use super::table::SocketEntry;
use crate::command::{CommandRunner, render};

const PROGRAM: &str = "ss";
const LISTENING_TCP: &str = "-ltnpH";

/// Listening TCP sockets as reported by `ss`.
pub struct SsTable {
    runner: Arc<dyn CommandRunner>,
}

impl SsTable {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl SocketTable for SsTable {
    async fn entries(&self) -> Result<Vec<SocketEntry>> {
        let args = [LISTENING_TCP.to_string()];
        let output = self.runner.run(PROGRAM, &args).await?;
        if !output.success {
            return Err(ForwardError::CommandExecution {
                command: render(PROGRAM, &args),
                message: output.diagnostic().to_string(),
            });
        }
        Ok(parse_ss(&output.stdout))
    }
}

pub fn parse_ss(stdout: &str) -> Vec<SocketEntry> {
    stdout
        .lines()
        .filter_map(|line| {
            // State Recv-Q Send-Q Local_Address:Port Peer_Address:Port [Process]
            // e.g. LISTEN 0 128 0.0.0.0:22 0.0.0.0:* users:(("sshd",pid=123,fd=3))
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 5 {
                return None;
            }
            let local = parts[3];
            let port: u16 = local.rsplit_once(':')?.1.parse().ok()?;
            let pid = parts
                .get(5..)
                .and_then(|rest| rest.iter().find_map(|p| first_pid(p)));
            Some(SocketEntry {
                local_port: port,
                pid,
            })
        })
        .collect()
}

fn first_pid(users: &str) -> Option<u32> {
    let start = users.find("pid=")? + 4;
    let digits: String = users[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
