// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use super::ProcessResolver;

/// Resolves names through `sysinfo`, refreshing only the asked-for pid.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoResolver;

impl ProcessResolver for SysinfoResolver {
    fn process_name(&self, pid: u32) -> Option<String> {
        let pid = Pid::from_u32(pid);
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing(),
        );
        system
            .process(pid)
            .map(|p| p.name().to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
    }
}
