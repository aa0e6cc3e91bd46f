mod common;

use tempfile::TempDir;

use common::{db_unit, identity_unit, settings, TestEnv};
use glance::contexts::{ContextKind, Contexts};
use glance::error::CharmError;
use glance::render::{
    ConfigRegistry, WriteOutcome, GLANCE_API_CONF, GLANCE_API_PASTE_INI, GLANCE_REGISTRY_CONF,
    HAPROXY_CONF,
};

fn db_env() -> TestEnv {
    let mut env = TestEnv::new();
    env.add_relation("shared-db", "shared-db:0", vec![("mysql/0", db_unit())]);
    env
}

#[test]
fn rewrite_with_unchanged_inputs_is_a_noop() {
    let env = db_env();
    let contexts = Contexts::collect(&env).unwrap();
    let dir = TempDir::new().unwrap();
    let registry = ConfigRegistry::rooted(dir.path());

    assert_eq!(
        registry.write(&contexts, GLANCE_REGISTRY_CONF).unwrap(),
        WriteOutcome::Written
    );
    assert_eq!(
        registry.write(&contexts, GLANCE_REGISTRY_CONF).unwrap(),
        WriteOutcome::Unchanged
    );
}

#[test]
fn changed_inputs_rewrite_the_file() {
    let env = db_env();
    let dir = TempDir::new().unwrap();
    let registry = ConfigRegistry::rooted(dir.path());

    let contexts = Contexts::collect(&env).unwrap();
    registry.write(&contexts, GLANCE_REGISTRY_CONF).unwrap();

    let mut env = TestEnv::new();
    env.add_relation(
        "shared-db",
        "shared-db:0",
        vec![(
            "mysql/0",
            settings(&[("db_host", "10.5.0.99"), ("password", "other")]),
        )],
    );
    let contexts = Contexts::collect(&env).unwrap();

    assert_eq!(
        registry.write(&contexts, GLANCE_REGISTRY_CONF).unwrap(),
        WriteOutcome::Written
    );
    let content =
        std::fs::read_to_string(dir.path().join("etc/glance/glance-registry.conf")).unwrap();
    assert!(content.contains("10.5.0.99"));
}

#[test]
fn unknown_path_is_a_hard_error() {
    let env = TestEnv::new();
    let contexts = Contexts::collect(&env).unwrap();
    let registry = ConfigRegistry::rooted("/nonexistent");

    match registry.write(&contexts, "/etc/passwd") {
        Err(CharmError::UnknownConfigFile(path)) => assert_eq!(path, "/etc/passwd"),
        other => panic!("expected UnknownConfigFile, got {:?}", other),
    }
}

#[test]
fn incomplete_context_gates_rendering() {
    let env = TestEnv::new();
    let contexts = Contexts::collect(&env).unwrap();
    let dir = TempDir::new().unwrap();
    let registry = ConfigRegistry::rooted(dir.path());

    assert_eq!(
        registry.write(&contexts, GLANCE_API_PASTE_INI).unwrap(),
        WriteOutcome::Incomplete(ContextKind::IdentityService)
    );
    assert_eq!(
        registry.write(&contexts, HAPROXY_CONF).unwrap(),
        WriteOutcome::Incomplete(ContextKind::Cluster)
    );
    assert!(!dir.path().join("etc").exists());
}

#[test]
fn complete_contexts_reflect_relation_state() {
    let mut env = db_env();
    env.add_relation(
        "identity-service",
        "identity-service:0",
        vec![("keystone/0", identity_unit())],
    );
    let contexts = Contexts::collect(&env).unwrap();

    assert_eq!(
        contexts.complete(),
        vec![ContextKind::SharedDb, ContextKind::IdentityService]
    );
}

#[test]
fn api_conf_uses_file_store_without_backends() {
    let env = db_env();
    let contexts = Contexts::collect(&env).unwrap();
    let dir = TempDir::new().unwrap();
    let registry = ConfigRegistry::rooted(dir.path());

    registry.write(&contexts, GLANCE_API_CONF).unwrap();

    let content = std::fs::read_to_string(dir.path().join("etc/glance/glance-api.conf")).unwrap();
    assert!(content.contains("default_store = file"));
    assert!(content.contains("bind_port = 9292"));
}
