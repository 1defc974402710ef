// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

#![cfg(test)]
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use pfwd_common::config::ListenBinding;
use pfwd_common::error::ForwardError;
use pfwd_common::logging::{MemoryLog, Severity};
use pfwd_common::models::rule::{PortRule, Protocol};
use pfwd_common::system::ForwardingGateway;
use pfwd_core::driver::RuleRequest;
use pfwd_core::gateway::NetshGateway;

use crate::utils::{FakeNetsh, Harness, Host, NO_SUCH_ENTRY};

fn request(protocol: Protocol, port: u32, target: &str, target_port: u32) -> RuleRequest {
    RuleRequest {
        protocol,
        listen_port: port,
        target: target.into(),
        target_port,
        ..Default::default()
    }
}

fn any_v4() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

#[tokio::test]
async fn add_list_remove_8080() {
    let h = Harness::new();

    h.driver
        .add_rule(request(Protocol::V4ToV4, 8080, "127.0.0.1", 80))
        .await
        .unwrap();

    let listing = h.driver.list_rules().await.unwrap();
    assert!(!listing.is_degraded());
    let listed = listing.find_port(8080).expect("8080 should be listed");
    assert_eq!(listed.protocol, Protocol::V4ToV4);
    assert_eq!(listed.listen, SocketAddr::new(any_v4(), 8080));
    assert_eq!(listed.target, "127.0.0.1:80".parse().unwrap());

    h.driver.remove_rule(8080, None, None).await.unwrap();

    let listing = h.driver.list_rules().await.unwrap();
    assert!(listing.find_port(8080).is_none());
    assert!(h.netsh.ports().is_empty());
}

#[tokio::test]
async fn listed_rules_match_what_was_added() {
    let h = Harness::new();
    let cases = [
        (Protocol::V4ToV4, 1, "10.0.0.1", 65535),
        (Protocol::V4ToV4, 3389, "localhost", 3389),
        (Protocol::V4ToV6, 65535, "::1", 1),
        (Protocol::V6ToV6, 443, "fe80::1", 8443),
    ];

    for (protocol, port, target, target_port) in cases {
        h.driver
            .add_rule(request(protocol, port, target, target_port))
            .await
            .unwrap();
    }

    let listing = h.driver.list_rules().await.unwrap();
    assert_eq!(listing.rules().len(), cases.len());
    for (protocol, port, target, target_port) in cases {
        let expected = PortRule::new(protocol, port, target, target_port, None).unwrap();
        let listed = listing.find_port(expected.listen_port).unwrap();
        assert_eq!(listed.target.ip(), expected.target_address);
        assert_eq!(listed.target.port(), expected.target_port);
        assert_eq!(listed.protocol, protocol);
        assert!(!listed.family_guessed);
    }
}

#[tokio::test]
async fn adding_the_same_port_overwrites() {
    let h = Harness::new();
    h.driver
        .add_rule(request(Protocol::V4ToV4, 8080, "10.0.0.1", 80))
        .await
        .unwrap();
    let applied = h
        .driver
        .add_rule(request(Protocol::V4ToV4, 8080, "10.0.0.2", 81))
        .await
        .unwrap();

    assert_eq!(applied.listing.rules().len(), 1);
    assert_eq!(
        applied.listing.find_port(8080).unwrap().target,
        "10.0.0.2:81".parse().unwrap()
    );
}

#[tokio::test]
async fn reset_leaves_an_empty_table() {
    let netsh = Arc::new(
        FakeNetsh::new()
            .seed(Protocol::V4ToV4, (any_v4(), 80, IpAddr::V4(Ipv4Addr::LOCALHOST), 8080))
            .seed(
                Protocol::V6ToV6,
                (IpAddr::V6(Ipv6Addr::UNSPECIFIED), 443, IpAddr::V6(Ipv6Addr::LOCALHOST), 8443),
            ),
    );
    let gateway = NetshGateway::new(netsh.clone(), ListenBinding::default(), Arc::new(MemoryLog::new()));

    assert_eq!(gateway.list_rules().await.unwrap().rules().len(), 2);
    gateway.reset_all().await.unwrap();

    let listing = gateway.list_rules().await.unwrap();
    assert!(listing.rules().is_empty());
    assert!(!listing.is_degraded());
}

#[tokio::test]
async fn invalid_input_never_reaches_the_table() {
    let h = Harness::new();
    let rejected = [
        request(Protocol::V4ToV4, 0, "127.0.0.1", 80),
        request(Protocol::V4ToV4, 65536, "127.0.0.1", 80),
        request(Protocol::V4ToV4, 8080, "127.0.0.1", 0),
        request(Protocol::V4ToV4, 8080, "not-an-ip", 80),
        request(Protocol::V4ToV4, 8080, "example.com", 80),
    ];

    for req in rejected {
        let err = h.driver.add_rule(req).await.unwrap_err();
        assert!(matches!(err, ForwardError::Validation { .. }), "{err}");
    }
    assert!(h.netsh.calls().is_empty());
    assert!(h.driver.backups().unwrap().is_empty());

    let applied = h
        .driver
        .add_rule(request(Protocol::V4ToV4, 8080, "LOCALHOST", 80))
        .await
        .unwrap();
    assert_eq!(
        applied.listing.find_port(8080).unwrap().target.ip(),
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    );
}

#[tokio::test]
async fn unelevated_caller_is_stopped_before_anything_runs() {
    let h = Harness::with(
        FakeNetsh::new(),
        Host {
            elevated: || false,
            ..Default::default()
        },
    );

    let err = h
        .driver
        .add_rule(request(Protocol::V4ToV4, 8080, "127.0.0.1", 80))
        .await
        .unwrap_err();

    assert!(matches!(err, ForwardError::Privilege(_)));
    assert!(h.netsh.calls().is_empty());
    assert!(h.driver.backups().unwrap().is_empty());

    // Reads do not need elevation.
    assert!(h.driver.list_rules().await.is_ok());
}

#[tokio::test]
async fn elevation_refused_by_the_tool_is_a_privilege_error() {
    let h = Harness::with(FakeNetsh::new().denying(), Host::default());

    let err = h
        .driver
        .remove_rule(8080, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, ForwardError::Privilege(_)), "{err}");
    assert!(h.log.contains(Severity::Error, "after BackedUp"));
}

#[tokio::test]
async fn removing_an_unknown_port_reports_the_tool_message() {
    let h = Harness::new();
    let err = h.driver.remove_rule(9999, None, None).await.unwrap_err();

    match err {
        ForwardError::CommandExecution { command, message } => {
            assert!(command.contains("delete v4tov4"));
            assert!(message.contains(NO_SUCH_ENTRY));
        }
        other => panic!("unexpected {other}"),
    }
}

#[tokio::test]
async fn remove_uses_the_listed_family() {
    let v6_any = IpAddr::V6(Ipv6Addr::UNSPECIFIED);
    let h = Harness::with(
        FakeNetsh::new().seed(Protocol::V6ToV4, (v6_any, 5000, IpAddr::V4(Ipv4Addr::LOCALHOST), 5000)),
        Host::default(),
    );

    h.driver.remove_rule(5000, None, None).await.unwrap();

    let delete = h.netsh.calls().into_iter().find(|c| c[2] == "delete").unwrap();
    assert_eq!(delete[3], "v6tov4");
    assert!(delete.contains(&"listenaddress=::".to_string()));
    assert!(h.netsh.rows(Protocol::V6ToV4).is_empty());
}

#[tokio::test]
async fn ipv6_listeners_follow_the_binding() {
    let default = Harness::new();
    default
        .driver
        .add_rule(request(Protocol::V6ToV4, 7000, "127.0.0.1", 7000))
        .await
        .unwrap();
    assert_eq!(default.netsh.rows(Protocol::V6ToV4)[0].0, any_v4());

    let family = Harness::with(
        FakeNetsh::new(),
        Host {
            binding: ListenBinding::FamilyAny,
            ..Default::default()
        },
    );
    family
        .driver
        .add_rule(request(Protocol::V6ToV4, 7000, "127.0.0.1", 7000))
        .await
        .unwrap();
    assert_eq!(
        family.netsh.rows(Protocol::V6ToV4)[0].0,
        IpAddr::V6(Ipv6Addr::UNSPECIFIED)
    );
}

#[tokio::test]
async fn firewall_rule_is_named_after_the_port() {
    let h = Harness::new();
    let mut req = request(Protocol::V4ToV4, 3389, "10.0.0.5", 3389);
    req.open_firewall = true;

    h.driver.add_rule(req).await.unwrap();
    assert_eq!(h.netsh.firewall_rules(), vec!["PortForward_3389".to_string()]);
}

#[tokio::test]
async fn unreadable_lines_degrade_the_listing() {
    let h = Harness::with(
        FakeNetsh::new()
            .seed(Protocol::V4ToV4, (any_v4(), 80, IpAddr::V4(Ipv4Addr::LOCALHOST), 8080))
            .with_noise("garbled output from some other tool"),
        Host::default(),
    );

    let listing = h.driver.list_rules().await.unwrap();
    assert!(listing.is_degraded());
    assert_eq!(listing.rules().len(), 1);
    assert_eq!(listing.warnings().len(), 1);
    assert!(h.log.contains(Severity::Warn, "unrecognized row"));
}
