// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

#![cfg(test)]
use std::time::Duration;

use pfwd_common::error::ForwardError;
use pfwd_common::models::rule::Protocol;
use pfwd_core::driver::RuleRequest;

use crate::utils::Harness;

fn request(port: u32) -> RuleRequest {
    RuleRequest {
        protocol: Protocol::V4ToV4,
        listen_port: port,
        target: "127.0.0.1".into(),
        target_port: port,
        ..Default::default()
    }
}

#[tokio::test]
async fn retention_keeps_the_most_recent() {
    let h = Harness::new();
    h.driver.set_backup_policy(true, 3).unwrap();

    let mut written = Vec::new();
    for port in 1..=7 {
        let applied = h.driver.add_rule(request(port)).await.unwrap();
        written.push(applied.backup.expect("backups are on"));
        // Distinct millisecond stamps.
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let kept = h.driver.backups().unwrap();
    let mut newest: Vec<String> = written[written.len() - 3..].to_vec();
    newest.reverse();
    assert_eq!(kept, newest);
}

#[tokio::test]
async fn every_mutation_snapshots_the_pre_image() {
    let h = Harness::new();
    h.driver.add_rule(request(7000)).await.unwrap();
    let applied = h.driver.add_rule(request(7001)).await.unwrap();

    let name = applied.backup.unwrap();
    assert!(name.starts_with("backup_") && name.ends_with(".json"));

    let report = h.driver.restore_backup(&name, false).await.unwrap();
    assert_eq!(report.applied, 1);
    assert_eq!(h.netsh.ports(), vec![7000]);
}

#[tokio::test]
async fn restore_can_bring_settings_back() {
    let h = Harness::new();
    h.driver.create_profile("before", Vec::new()).unwrap();
    let name = h.driver.add_rule(request(7000)).await.unwrap().backup.unwrap();

    h.driver.delete_profile("before");
    assert!(h.driver.profiles().is_empty());

    h.driver.restore_backup(&name, true).await.unwrap();
    assert!(h.driver.profile("before").is_some());
    assert!(h.restart().profile("before").is_some());
}

#[tokio::test]
async fn disabled_backups_write_nothing() {
    let h = Harness::new();
    h.driver.set_backup_policy(false, 10).unwrap();

    let applied = h.driver.add_rule(request(8080)).await.unwrap();
    assert!(applied.backup.is_none());
    assert!(!h.dir.path().join("Backups").exists());
}

#[tokio::test]
async fn shrinking_retention_prunes_immediately() {
    let h = Harness::new();
    for port in 1..=4 {
        h.driver.add_rule(request(port)).await.unwrap();
    }
    assert_eq!(h.driver.backups().unwrap().len(), 4);

    h.driver.set_backup_policy(true, 1).unwrap();
    assert_eq!(h.driver.backups().unwrap().len(), 1);

    assert!(matches!(
        h.driver.set_backup_policy(true, 0),
        Err(ForwardError::Validation { .. })
    ));
}

#[tokio::test]
async fn unknown_backup_is_not_found() {
    let h = Harness::new();
    let err = h
        .driver
        .restore_backup("backup_19700101_000000_000.json", false)
        .await
        .unwrap_err();
    assert!(matches!(err, ForwardError::NotFound(_)));
    assert!(h.netsh.calls().is_empty());
}
