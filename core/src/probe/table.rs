// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! Typed decoder for the owner-annotated TCP tables.
//!
//! The OS hands back `dwNumEntries` followed by fixed-size rows. Offsets and
//! stride are explicit here; a count that does not fit the buffer yields
//! `None` instead of a partial read.

/// Position of the two fields we need inside one table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    pub stride: usize,
    pub local_port_offset: usize,
    pub pid_offset: usize,
}

impl RowLayout {
    /// `MIB_TCPROW_OWNER_PID`: state, local addr, local port, remote addr, remote port, pid.
    pub const V4: RowLayout = RowLayout {
        stride: 24,
        local_port_offset: 8,
        pid_offset: 20,
    };

    /// `MIB_TCP6ROW_OWNER_PID`: local addr[16], scope, local port, remote addr[16], scope, remote port, state, pid.
    pub const V6: RowLayout = RowLayout {
        stride: 56,
        local_port_offset: 20,
        pid_offset: 52,
    };

    fn is_sound(&self) -> bool {
        self.stride > 0
            && self.local_port_offset + 4 <= self.stride
            && self.pid_offset + 4 <= self.stride
    }
}

/// One socket with its owner, if the OS reported one. The IpHelper tables
/// always carry a pid; `ss` omits it for sockets owned by other users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketEntry {
    pub local_port: u16,
    pub pid: Option<u32>,
}

/// Offset of the first row. The count is a `DWORD` followed directly by rows.
const HEADER_LEN: usize = 4;

pub fn decode_owner_table(bytes: &[u8], layout: RowLayout) -> Option<Vec<SocketEntry>> {
    if !layout.is_sound() {
        return None;
    }

    let count = u32::from_ne_bytes(bytes.get(..HEADER_LEN)?.try_into().ok()?) as usize;
    let rows_len = count.checked_mul(layout.stride)?;
    let rows = bytes.get(HEADER_LEN..HEADER_LEN.checked_add(rows_len)?)?;

    rows.chunks_exact(layout.stride)
        .map(|row| {
            let port_word = word(row, layout.local_port_offset)?;
            let pid = u32::from_ne_bytes(word(row, layout.pid_offset)?);
            Some(SocketEntry {
                local_port: port_from_word(port_word),
                pid: Some(pid),
            })
        })
        .collect()
}

/// The port sits in network byte order in the first two bytes of its `DWORD`,
/// which is the upper half once the word is read big-endian.
pub fn port_from_word(word: [u8; 4]) -> u16 {
    (u32::from_be_bytes(word) >> 16) as u16
}

fn word(row: &[u8], offset: usize) -> Option<[u8; 4]> {
    row.get(offset..offset + 4)?.try_into().ok()
}
