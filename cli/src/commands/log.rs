// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use pfwd_common::{config::Config, info, success};
use pfwd_core::logfile;

use crate::commands::LogCommand;

pub fn run(cmd: &LogCommand, cfg: &Config) -> anyhow::Result<()> {
    match cmd {
        LogCommand::Clear => {
            let path = cfg.log_path();
            let dropped = logfile::clear(&path)?;
            if dropped == 0 {
                info!("Log {} is already empty", path.display());
            } else {
                success!("Logs cleared ({dropped} bytes from {})", path.display());
            }
        }
    }
    Ok(())
}
