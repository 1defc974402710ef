// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::ffi::c_void;

use async_trait::async_trait;
use windows_sys::Win32::Foundation::{ERROR_INSUFFICIENT_BUFFER, NO_ERROR};
use windows_sys::Win32::NetworkManagement::IpHelper::{
    GetExtendedTcpTable, MIB_TCP6ROW_OWNER_PID, MIB_TCPROW_OWNER_PID, TCP_TABLE_OWNER_PID_ALL,
};
use windows_sys::Win32::Networking::WinSock::{AF_INET, AF_INET6};

use pfwd_common::error::{ForwardError, Result};

use super::SocketTable;
use super::table::{RowLayout, SocketEntry, decode_owner_table};

const QUERY: &str = "GetExtendedTcpTable";

/// Listener and connection entries from `GetExtendedTcpTable`, both families.
#[derive(Debug, Default, Clone, Copy)]
pub struct IpHelperTable;

#[async_trait]
impl SocketTable for IpHelperTable {
    async fn entries(&self) -> Result<Vec<SocketEntry>> {
        tokio::task::spawn_blocking(read_both)
            .await
            .map_err(|e| ForwardError::CommandExecution {
                command: QUERY.into(),
                message: e.to_string(),
            })?
    }
}

fn read_both() -> Result<Vec<SocketEntry>> {
    let mut all = fetch(u32::from(AF_INET), RowLayout::V4, size_of::<MIB_TCPROW_OWNER_PID>())
        .ok_or_else(|| ForwardError::Parse {
            what: "IPv4 owner table".into(),
            message: format!("{QUERY} gave no table that fits the row layout"),
        })?;
    // An IPv6 stack can be absent. That is not a reason to lose the v4 view.
    if let Some(v6) = fetch(
        u32::from(AF_INET6),
        RowLayout::V6,
        size_of::<MIB_TCP6ROW_OWNER_PID>(),
    ) {
        all.extend(v6);
    }
    Ok(all)
}

const ATTEMPTS: usize = 3;

fn fetch(family: u32, layout: RowLayout, native_stride: usize) -> Option<Vec<SocketEntry>> {
    if native_stride != layout.stride {
        return None;
    }

    let mut size: u32 = 0;
    // SAFETY: a null table pointer asks only for the required size.
    unsafe {
        GetExtendedTcpTable(
            std::ptr::null_mut(),
            &mut size,
            0,
            family,
            TCP_TABLE_OWNER_PID_ALL,
            0,
        );
    }

    // The table can grow between the two calls.
    for _ in 0..ATTEMPTS {
        if size == 0 {
            return None;
        }
        let mut buffer: Vec<u32> = vec![0; (size as usize).div_ceil(4)];
        // SAFETY: `buffer` holds at least `size` bytes and is DWORD aligned.
        let status = unsafe {
            GetExtendedTcpTable(
                buffer.as_mut_ptr() as *mut c_void,
                &mut size,
                0,
                family,
                TCP_TABLE_OWNER_PID_ALL,
                0,
            )
        };

        match status {
            NO_ERROR => {
                let bytes: Vec<u8> = buffer.iter().flat_map(|w| w.to_ne_bytes()).collect();
                let filled = bytes.get(..size as usize)?;
                return decode_owner_table(filled, layout);
            }
            ERROR_INSUFFICIENT_BUFFER => continue,
            _ => return None,
        }
    }
    None
}
