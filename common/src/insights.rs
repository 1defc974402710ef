// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use rand::seq::SliceRandom;
use rand::{Rng, rng};

/// Operational guidance for the forwarding tool.
const USAGE_TIPS: &[&str] = &[
    "'pfwd profile load' without a name restores the last active profile",
    "A backup is written before every change to the forwarding table",
    "'pfwd check' shows which process owns each forwarded port",
    "Use '--firewall' on add to open an inbound allowance as well",
    "'pfwd backup restore <name>' replays an earlier snapshot",
    "Targets may be written as 'localhost'; they are stored as 127.0.0.1",
];

/// Technical facts and networking trivia.
const TECH_TRIVIA: &[&str] = &[
    "Ports below 1024 were once called 'privileged' on every Unix",
    "Port 0 is reserved; asking to bind it means 'pick one for me'",
    "RFC 6335 splits ports into system, user and dynamic ranges",
    "IPv6 has no NAT by design, yet port proxies still find work",
];

/// Industry jokes and developer humor.
const DEV_HUMOR: &[&str] = &[
    "UDP: I'd tell you a joke, but you might not get it",
    "TCP: I'll tell you a joke. Do you want to hear a joke?",
    "It forwards on my machine though",
    "There's no place like 127.0.0.1",
];

/// Generates a randomized list of UI messages.
///
/// Every slot in the resulting list has a 50% probability of being an
/// operational tip and a 50% probability of being flavor text (trivia/humor),
/// provided both pools still have remaining items.
pub fn get_shuffled_insights() -> Vec<&'static str> {
    let mut rng = rng();

    let mut tips = USAGE_TIPS.to_vec();
    tips.shuffle(&mut rng);

    let mut flavor: Vec<&str> = TECH_TRIVIA
        .iter()
        .chain(DEV_HUMOR.iter())
        .copied()
        .collect();
    flavor.shuffle(&mut rng);

    let total_len = tips.len() + flavor.len();
    let mut output = Vec::with_capacity(total_len);

    while !tips.is_empty() && !flavor.is_empty() {
        let pick_tip = rng.random_bool(0.5);
        if pick_tip {
            output.push(tips.remove(0));
        } else {
            output.push(flavor.remove(0));
        }
    }

    output.extend(tips);
    output.extend(flavor);
    output
}
