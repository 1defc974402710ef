// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Forwarding Data Model
//!
//! Rules, profiles and settings are the durable state; [`status::PortStatus`]
//! and [`listing::Listing`] are recomputed every time they are needed.

pub mod listing;
pub mod profile;
pub mod rule;
pub mod settings;
pub mod status;
