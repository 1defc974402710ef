// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use colored::*;

use crate::pprint;

const ART: &str = r"
           ___                 __
    ____  / _/_    ______  ___/ /
   / __ \/ _/ | /| / / _ \/ _  /
  / /_/ / /   | |/ |/ /  __/ // /
 / .___/_/    |__/|__/\___/\_,_/
/_/";

pub const EMPTY_TABLE: &str = r"
        ┌────────────┐      ┌────────────┐
        │   listen   │ ──×─ │   target   │
        └────────────┘      └────────────┘";

pub fn print() {
    for line in ART.lines().skip(1) {
        pprint!("{}", line.bright_green().bold());
    }
}
