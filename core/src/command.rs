// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # External Command Execution
//!
//! Every OS interaction of the gateway goes through a [`CommandRunner`].
//!
//! [`SystemRunner`] spawns the process with both output pipes captured and
//! drains them concurrently while waiting for exit, so a chatty child cannot
//! block on a full pipe. The whole wait is bounded; expiry kills the child
//! and is reported as [`ForwardError::Timeout`].

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use pfwd_common::error::{ForwardError, Result};

/// Captured result of one finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Whatever the command said, preferring stderr.
    pub fn diagnostic(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

#[async_trait]
impl<R: CommandRunner + ?Sized> CommandRunner for Arc<R> {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        (**self).run(program, args).await
    }
}

/// Runs real processes.
#[derive(Debug, Clone, Copy)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let rendered = render(program, args);

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ForwardError::CommandExecution {
                    command: rendered.clone(),
                    message: format!("'{program}' was not found on this system"),
                },
                std::io::ErrorKind::PermissionDenied => {
                    ForwardError::Privilege(format!("not allowed to start '{program}': {e}"))
                }
                _ => ForwardError::CommandExecution {
                    command: rendered.clone(),
                    message: e.to_string(),
                },
            })?;

        // Dropping the future on expiry drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| ForwardError::CommandExecution {
                command: rendered.clone(),
                message: format!("could not read output: {e}"),
            })?,
            Err(_) => {
                return Err(ForwardError::Timeout {
                    command: rendered,
                    timeout: self.timeout,
                });
            }
        };

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: decode_console(&output.stdout),
            stderr: decode_console(&output.stderr),
        })
    }
}

/// Decodes console output. Non-UTF-8 bytes are read as the IBM866 OEM code
/// page, which is what the forwarding tool emits on Cyrillic Windows installs.
pub fn decode_console(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, _) = encoding_rs::IBM866.decode(bytes);
            text.into_owned()
        }
    }
}

pub fn render(program: &str, args: &[String]) -> String {
    let mut out = String::from(program);
    for arg in args {
        out.push(' ');
        out.push_str(arg);
    }
    out
}
