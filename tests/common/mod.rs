//! Recorded hook-environment and host doubles for exercising handlers.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use glance::error::CharmError;
use glance::hookenv::{CharmConfig, HookEnv};
use glance::hooks::Charm;
use glance::host::Host;
use glance::render::ConfigRegistry;

pub type Settings = HashMap<String, String>;

pub fn settings(pairs: &[(&str, &str)]) -> Settings {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[derive(Default)]
pub struct TestEnv {
    pub config: CharmConfig,
    pub address: String,
    pub leader: bool,
    relations: HashMap<String, Vec<(String, Vec<(String, Settings)>)>>,
    pub current: Settings,
    logs: RefCell<Vec<String>>,
    set_calls: RefCell<Vec<(Option<String>, Vec<(String, String)>)>>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            address: "glance.foohost.com".to_string(),
            leader: true,
            ..Default::default()
        }
    }

    pub fn add_relation(&mut self, name: &str, rid: &str, units: Vec<(&str, Settings)>) {
        self.relations
            .entry(name.to_string())
            .or_insert_with(Vec::new)
            .push((
                rid.to_string(),
                units
                    .into_iter()
                    .map(|(unit, data)| (unit.to_string(), data))
                    .collect(),
            ));
    }

    pub fn logged(&self, needle: &str) -> bool {
        self.logs.borrow().iter().any(|line| line.contains(needle))
    }

    pub fn set_calls(&self) -> Vec<(Option<String>, Vec<(String, String)>)> {
        self.set_calls.borrow().clone()
    }
}

impl HookEnv for TestEnv {
    fn log(&self, msg: &str) {
        self.logs.borrow_mut().push(msg.to_string());
    }

    fn config(&self) -> Result<CharmConfig, CharmError> {
        Ok(self.config.clone())
    }

    fn relation_ids(&self, relation: &str) -> Result<Vec<String>, CharmError> {
        Ok(self
            .relations
            .get(relation)
            .map(|rels| rels.iter().map(|(rid, _)| rid.clone()).collect())
            .unwrap_or_default())
    }

    fn related_units(&self, relation_id: &str) -> Result<Vec<String>, CharmError> {
        for rels in self.relations.values() {
            for (rid, units) in rels {
                if rid == relation_id {
                    return Ok(units.iter().map(|(unit, _)| unit.clone()).collect());
                }
            }
        }
        Ok(Vec::new())
    }

    fn relation_get(&self) -> Result<Settings, CharmError> {
        Ok(self.current.clone())
    }

    fn relation_get_unit(&self, relation_id: &str, unit: &str) -> Result<Settings, CharmError> {
        for rels in self.relations.values() {
            for (rid, units) in rels {
                if rid == relation_id {
                    for (name, data) in units {
                        if name == unit {
                            return Ok(data.clone());
                        }
                    }
                }
            }
        }
        Ok(Settings::new())
    }

    fn relation_set(
        &self,
        relation_id: Option<&str>,
        values: &[(&str, String)],
    ) -> Result<(), CharmError> {
        self.set_calls.borrow_mut().push((
            relation_id.map(String::from),
            values
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        ));
        Ok(())
    }

    fn private_address(&self) -> Result<String, CharmError> {
        Ok(self.address.clone())
    }

    fn is_leader(&self) -> Result<bool, CharmError> {
        Ok(self.leader)
    }
}

#[derive(Default)]
pub struct TestHost {
    calls: RefCell<Vec<String>>,
    fail: RefCell<Vec<String>>,
    outputs: RefCell<HashMap<String, (i32, String)>>,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future invocation of `command` fail.
    pub fn fail_on(&self, command: &str) {
        self.fail.borrow_mut().push(command.to_string());
    }

    /// Canned (exit code, stdout) for an exact command line.
    pub fn set_output(&self, cmdline: &str, code: i32, stdout: &str) {
        self.outputs
            .borrow_mut()
            .insert(cmdline.to_string(), (code, stdout.to_string()));
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.calls.borrow().iter().any(|line| line.contains(needle))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

fn cmdline(command: &str, args: &[&str]) -> String {
    let mut line = command.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

impl Host for TestHost {
    fn run(&self, command: &str, args: &[&str]) -> Result<(), CharmError> {
        self.calls.borrow_mut().push(cmdline(command, args));

        if self.fail.borrow().iter().any(|f| f == command) {
            Err(CharmError::SubcommandError(
                command.to_string(),
                "forced failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn output(&self, command: &str, args: &[&str]) -> Result<(i32, String), CharmError> {
        let line = cmdline(command, args);
        self.calls.borrow_mut().push(line.clone());

        Ok(self
            .outputs
            .borrow()
            .get(&line)
            .cloned()
            .unwrap_or((0, String::new())))
    }

    fn add_apt_source(&self, name: &str, line: &str) -> Result<(), CharmError> {
        self.calls
            .borrow_mut()
            .push(format!("add-apt-source {} {}", name, line));
        Ok(())
    }
}

pub fn charm<'a>(env: &'a TestEnv, host: &'a TestHost, root: &Path) -> Charm<'a> {
    Charm::new(env, host, ConfigRegistry::rooted(root))
}

pub fn db_unit() -> Settings {
    settings(&[("db_host", "10.5.0.2"), ("password", "dbpass")])
}

pub fn identity_unit() -> Settings {
    settings(&[
        ("service_host", "10.5.0.5"),
        ("service_port", "5000"),
        ("auth_host", "10.5.0.5"),
        ("auth_port", "35357"),
        ("service_username", "glance"),
        ("service_password", "ks-pass"),
        ("service_tenant", "services"),
    ])
}

pub fn identity_https_unit() -> Settings {
    let mut data = identity_unit();
    data.insert("ssl_cert".to_string(), "CERT".to_string());
    data.insert("ssl_key".to_string(), "KEY".to_string());
    data
}

pub fn clustered_ha_unit() -> Settings {
    settings(&[("clustered", "yes")])
}
