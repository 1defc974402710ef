// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Port Forwarding Engine
//!
//! Reconciles a durable set of forwarding rules with the OS port-proxy table.
//!
//! * [`gateway`]: issues table operations and parses what the table reports.
//! * [`probe`]: maps local ports to the processes that own them.
//! * [`store`]: named profiles and the settings document they live in.
//! * [`backup`]: pre-mutation snapshots and their retention.
//! * [`driver`]: the [`driver::Reconciler`] tying the above together.

pub mod backup;
pub mod command;
pub mod driver;
pub mod exchange;
pub mod firewall;
pub mod gateway;
pub mod logfile;
pub mod probe;
pub mod settings;
pub mod store;
