// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # OS Forwarding Gateway
//!
//! The live forwarding table is owned by the OS and only reachable through
//! `netsh interface portproxy`. [`NetshGateway`] turns the
//! [`ForwardingGateway`] operations into those invocations and reads the
//! `show all` table back through [`parser::parse_table`].
//!
//! [`ForwardingGateway`]: pfwd_common::system::ForwardingGateway

pub mod netsh;
pub mod parser;

pub use netsh::NetshGateway;
pub use parser::parse_table;
