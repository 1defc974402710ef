// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

#![cfg(test)]
use pfwd_common::models::rule::{PortRule, Protocol};
use pfwd_core::driver::RuleRequest;

use crate::utils::{FakeNetsh, Harness, Host};

fn rule(port: u32) -> PortRule {
    PortRule::new(Protocol::V4ToV4, port, "127.0.0.1", 80, None).unwrap()
}

fn busy_host() -> Harness {
    Harness::with(
        FakeNetsh::new(),
        Host {
            listeners: vec![(8080, 4242, "nginx.exe"), (3389, 1100, "svchost.exe")],
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn free_and_bound_ports() {
    let h = busy_host();
    let statuses = h.driver.check_rules(vec![rule(8080), rule(9090)]).await;

    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].port_number, 8080);
    assert!(!statuses[0].is_available);
    assert_eq!(statuses[0].service_name, "nginx.exe");
    assert_eq!(statuses[0].process_descriptor, "nginx.exe (PID: 4242)");

    assert_eq!(statuses[1].port_number, 9090);
    assert!(statuses[1].is_available);
}

#[tokio::test]
async fn check_ports_follows_the_live_table() {
    let h = busy_host();
    for port in [3389, 5000] {
        h.driver
            .add_rule(RuleRequest {
                listen_port: port,
                target: "10.0.0.9".into(),
                target_port: port,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let statuses = h.driver.check_ports().await.unwrap();
    let summary: Vec<(u16, bool)> = statuses.iter().map(|s| (s.port_number, s.is_available)).collect();
    assert_eq!(summary, [(3389, false), (5000, true)]);
}

#[tokio::test]
async fn nothing_to_check() {
    let h = busy_host();
    assert!(h.driver.check_rules(Vec::new()).await.is_empty());
    assert!(h.driver.check_ports().await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn system_prober_sees_a_real_listener() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let prober = pfwd_core::probe::OccupancyProber::system(std::time::Duration::from_secs(10));
    let statuses = prober.check_all(&[rule(u32::from(port))]).await;
    assert!(!statuses[0].is_available);
}
