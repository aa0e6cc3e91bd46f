mod common;

use tempfile::TempDir;

use common::{charm, TestEnv, TestHost};
use glance::error::CharmError;
use glance::hooks::{Dispatcher, Hook};

#[test]
fn hook_names_parse() {
    let cases = &[
        ("install", Hook::Install),
        ("config-changed", Hook::ConfigChanged),
        ("upgrade-charm", Hook::UpgradeCharm),
        ("shared-db-relation-joined", Hook::DbJoined),
        ("shared-db-relation-changed", Hook::DbChanged),
        ("identity-service-relation-joined", Hook::KeystoneJoined),
        ("identity-service-relation-changed", Hook::KeystoneChanged),
        ("image-service-relation-joined", Hook::ImageServiceJoined),
        ("object-store-relation-joined", Hook::ObjectStoreJoined),
        ("object-store-relation-changed", Hook::ObjectStoreChanged),
        ("ceph-relation-joined", Hook::CephJoined),
        ("ceph-relation-changed", Hook::CephChanged),
        ("cluster-relation-changed", Hook::ClusterChanged),
        ("ha-relation-joined", Hook::HaJoined),
        ("ha-relation-changed", Hook::HaChanged),
    ];

    for (name, hook) in cases {
        assert_eq!(name.parse::<Hook>().unwrap(), *hook);
    }
}

#[test]
fn unrecognized_hook_is_a_deployment_error() {
    match "start".parse::<Hook>() {
        Err(CharmError::UnknownHook(name)) => assert_eq!(name, "start"),
        other => panic!("expected UnknownHook, got {:?}", other),
    }
}

#[test]
fn dispatch_invokes_the_mapped_handler() {
    let env = TestEnv::new();
    let host = TestHost::new();
    let dir = TempDir::new().unwrap();
    let mut charm = charm(&env, &host, dir.path());

    Dispatcher::new().dispatch(&mut charm, Hook::DbJoined).unwrap();

    // db_joined publishes the access request, proving the mapping fired
    let calls = env.set_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1[0].0, "database");
}

#[test]
fn dispatch_handles_every_hook_name() {
    let dispatcher = Dispatcher::new();
    let env = TestEnv::new();
    let host = TestHost::new();
    let dir = TempDir::new().unwrap();
    let mut charm = charm(&env, &host, dir.path());

    // Hooks that only read incomplete relation state and log are safe to
    // fire against an empty environment.
    for hook in &[
        Hook::DbChanged,
        Hook::KeystoneChanged,
        Hook::ObjectStoreJoined,
        Hook::CephChanged,
        Hook::ClusterChanged,
    ] {
        dispatcher.dispatch(&mut charm, *hook).unwrap();
    }
}
