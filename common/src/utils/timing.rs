// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, TimeZone, Utc};

/// Format whose lexicographic order equals chronological order.
pub const SORTABLE_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

/// Stamps `at` in UTC, which never repeats an hour the way local time does
/// when daylight saving ends.
pub fn sortable_stamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    at.with_timezone(&Utc).format(SORTABLE_FORMAT).to_string()
}
