// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

#![cfg(test)]
use std::net::{IpAddr, Ipv4Addr};

use pfwd_common::error::ForwardError;
use pfwd_common::models::rule::{PortRule, Protocol};
use pfwd_core::store::{ImportMode, ImportOutcome};

use crate::utils::{FakeNetsh, Harness, Host};

fn rule(port: u32, target: &str) -> PortRule {
    PortRule::new(Protocol::V4ToV4, port, target, 80, None).unwrap()
}

fn office() -> Vec<PortRule> {
    vec![
        rule(8080, "10.0.0.1"),
        rule(8081, "10.0.0.2"),
        PortRule::new(Protocol::V4ToV6, 8082, "fd00::2", 443, Some("api".into())).unwrap(),
    ]
}

#[tokio::test]
async fn loading_a_profile_replaces_the_live_table() {
    let stale = (IpAddr::V4(Ipv4Addr::UNSPECIFIED), 1234, IpAddr::V4(Ipv4Addr::LOCALHOST), 1234);
    let h = Harness::with(FakeNetsh::new().seed(Protocol::V4ToV4, stale), Host::default());
    h.driver.create_profile("office", office()).unwrap();

    let report = h.driver.load_profile(Some("office")).await.unwrap();

    assert_eq!(report.applied, 3);
    assert_eq!(h.netsh.count("reset"), 1);
    assert_eq!(h.netsh.ports(), vec![8080, 8081, 8082]);

    let live = report.listing.rules();
    assert_eq!(live.len(), 3);
    for (listed, stored) in live.iter().zip(office()) {
        assert!(listed.matches(&stored), "{listed:?} vs {stored:?}");
    }
}

#[tokio::test]
async fn load_order_is_stored_order() {
    let h = Harness::new();
    let rules = vec![rule(9003, "10.0.0.3"), rule(9001, "10.0.0.1"), rule(9002, "10.0.0.2")];
    h.driver.create_profile("shuffled", rules).unwrap();

    h.driver.load_profile(Some("shuffled")).await.unwrap();

    let added: Vec<String> = h
        .netsh
        .calls()
        .into_iter()
        .filter(|c| c[2] == "add")
        .map(|c| c[4].clone())
        .collect();
    assert_eq!(added, ["listenport=9003", "listenport=9001", "listenport=9002"]);
}

#[tokio::test]
async fn failing_add_leaves_a_partial_table() {
    let h = Harness::with(FakeNetsh::new().failing_adds_after(2), Host::default());
    h.driver.create_profile("office", office()).unwrap();

    let err = h.driver.load_profile(Some("office")).await.unwrap_err();

    match err {
        ForwardError::PartialLoad {
            profile,
            applied,
            total,
            ..
        } => {
            assert_eq!(profile, "office");
            assert_eq!((applied, total), (2, 3));
        }
        other => panic!("unexpected {other}"),
    }
    assert_eq!(h.netsh.ports(), vec![8080, 8081]);
    assert_eq!(h.driver.settings().last_active_profile, "");
    assert_eq!(h.driver.progress().get(), (2, 3));
}

#[tokio::test]
async fn unknown_profile_is_not_found() {
    let h = Harness::new();
    let err = h.driver.load_profile(Some("nope")).await.unwrap_err();
    assert!(matches!(err, ForwardError::NotFound(_)));
    assert!(h.netsh.calls().is_empty());
}

#[tokio::test]
async fn session_survives_a_restart() {
    let h = Harness::new();
    h.driver.create_profile("home", vec![rule(2222, "192.168.1.10")]).unwrap();
    h.driver.load_profile(Some("home")).await.unwrap();

    let again = h.restart();
    let settings = again.settings();
    assert_eq!(settings.last_active_profile, "home");
    assert!(settings.profiles[0].is_active);

    let report = again.load_profile(None).await.unwrap();
    assert_eq!(report.profile, "home");
    assert_eq!(h.netsh.ports(), vec![2222]);
}

#[tokio::test]
async fn live_table_can_be_captured() {
    let h = Harness::new();
    for port in [5000, 5001] {
        h.driver
            .add_rule(pfwd_core::driver::RuleRequest {
                listen_port: port,
                target: "127.0.0.1".into(),
                target_port: port,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let captured = h.driver.create_profile_from_live("snapshot").await.unwrap();
    let ports: Vec<u16> = captured.rules.iter().map(|r| r.listen_port).collect();
    assert_eq!(ports, vec![5000, 5001]);

    assert!(matches!(
        h.driver.create_profile_from_live("snapshot").await,
        Err(ForwardError::DuplicateName(_))
    ));
}

#[tokio::test]
async fn export_then_import_creates_an_equal_copy() {
    let h = Harness::new();
    h.driver.create_profile("office", office()).unwrap();
    let path = h.dir.path().join("exports").join("office.json");

    h.driver.export_profile("office", &path).unwrap();
    let outcome = h
        .driver
        .import_profile(&path, ImportMode::CreateNew { name: None })
        .await
        .unwrap();

    let ImportOutcome::Created(name) = outcome else {
        panic!("expected a new profile");
    };
    assert_eq!(name, "office (2)");
    assert_eq!(h.driver.profile(&name).unwrap().rules, office_rules(&h));
    assert!(h.netsh.calls().is_empty());
}

fn office_rules(h: &Harness) -> Vec<PortRule> {
    h.driver.profile("office").unwrap().rules
}

#[tokio::test]
async fn import_can_take_a_new_name() {
    let h = Harness::new();
    h.driver.create_profile("office", office()).unwrap();
    let path = h.dir.path().join("office.json");
    h.driver.export_profile("office", &path).unwrap();

    let outcome = h
        .driver
        .import_profile(&path, ImportMode::CreateNew { name: Some("lab".into()) })
        .await
        .unwrap();

    assert_eq!(outcome, ImportOutcome::Created("lab".into()));
    assert_eq!(h.driver.profile("lab").unwrap().rules.len(), 3);
}

#[tokio::test]
async fn replacing_the_active_profile_pushes_it_live() {
    let h = Harness::new();
    h.driver.create_profile("office", office()).unwrap();
    h.driver.create_profile("home", vec![rule(2222, "192.168.1.10")]).unwrap();
    h.driver.load_profile(Some("home")).await.unwrap();

    let path = h.dir.path().join("office.json");
    h.driver.export_profile("office", &path).unwrap();
    let outcome = h
        .driver
        .import_profile(&path, ImportMode::ReplaceActive)
        .await
        .unwrap();

    assert_eq!(outcome, ImportOutcome::Replaced("home".into()));
    assert_eq!(h.driver.profile("home").unwrap().rules.len(), 3);
    assert_eq!(h.netsh.ports(), vec![8080, 8081, 8082]);
}

#[tokio::test]
async fn replacing_without_elevation_keeps_the_stored_profile() {
    let h = Harness::new();
    h.driver.create_profile("office", office()).unwrap();
    h.driver.create_profile("home", vec![rule(2222, "192.168.1.10")]).unwrap();
    h.driver.load_profile(Some("home")).await.unwrap();
    let path = h.dir.path().join("office.json");
    h.driver.export_profile("office", &path).unwrap();

    let plain = h.restart_as(|| false);
    let err = plain
        .import_profile(&path, ImportMode::ReplaceActive)
        .await
        .unwrap_err();

    assert!(matches!(err, ForwardError::Privilege(_)), "{err}");
    assert_eq!(plain.profile("home").unwrap().rules, vec![rule(2222, "192.168.1.10")]);
    assert_eq!(h.restart().profile("home").unwrap().rules.len(), 1);
    assert_eq!(h.netsh.ports(), vec![2222]);
}

#[tokio::test]
async fn unreadable_import_changes_nothing() {
    let h = Harness::new();
    let path = h.dir.path().join("broken.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    let err = h
        .driver
        .import_profile(&path, ImportMode::CreateNew { name: None })
        .await
        .unwrap_err();

    assert!(matches!(err, ForwardError::InvalidDocument { .. }), "{err}");
    assert!(h.driver.profiles().is_empty());
}

#[tokio::test]
async fn profile_bookkeeping() {
    let h = Harness::new();
    h.driver.create_profile("a", vec![rule(1, "10.0.0.1")]).unwrap();
    h.driver.duplicate_profile("a", "b").unwrap();
    h.driver.rename_profile("b", "c").unwrap();

    let names: Vec<String> = h.driver.profiles().into_iter().map(|p| p.name).collect();
    assert_eq!(names, ["a", "c"]);

    assert!(matches!(
        h.driver.rename_profile("a", "c"),
        Err(ForwardError::DuplicateName(_))
    ));
    assert_eq!(h.driver.delete_profile("a"), 1);
    assert_eq!(h.driver.delete_profile("a"), 0);
}
