//! Access to the Juju hook tools available inside a hook execution.
//!
//! Everything the orchestrator exposes to a running hook goes through the
//! `HookEnv` trait so that handlers can be exercised against a recorded
//! environment in tests. `JujuEnv` is the real thing: it shells out to the
//! hook tools with `--format yaml` and deserializes their output.

use std::collections::HashMap;

use serde_derive::Deserialize;
use serde_yaml::{from_slice, Value};

use crate::cmd;
use crate::error::CharmError;

/// The charm's local configuration, as returned by `config-get`.
///
/// Key spelling is preserved from the charm's config.yaml, which mixes
/// kebab-case and snake_case.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CharmConfig {
    #[serde(rename = "openstack-origin", default)]
    pub openstack_origin: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub vip: Option<String>,

    #[serde(default)]
    pub vip_iface: Option<String>,

    #[serde(default)]
    pub vip_cidr: Option<u8>,

    #[serde(rename = "ha-bindiface", default)]
    pub ha_bindiface: Option<String>,

    #[serde(rename = "ha-mcastport", default)]
    pub ha_mcastport: Option<u16>,
}

impl CharmConfig {
    pub fn openstack_origin(&self) -> Option<&str> {
        non_empty(&self.openstack_origin)
    }

    pub fn region(&self) -> &str {
        non_empty(&self.region).unwrap_or("RegionOne")
    }

    pub fn vip(&self) -> Option<&str> {
        non_empty(&self.vip)
    }

    pub fn vip_iface(&self) -> &str {
        non_empty(&self.vip_iface).unwrap_or("eth0")
    }

    pub fn vip_cidr(&self) -> u8 {
        self.vip_cidr.unwrap_or(24)
    }

    pub fn ha_bindiface(&self) -> &str {
        non_empty(&self.ha_bindiface).unwrap_or("eth0")
    }

    pub fn ha_mcastport(&self) -> u16 {
        self.ha_mcastport.unwrap_or(5444)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    match value.as_ref().map(String::as_str) {
        Some("") | None => None,
        Some(v) => Some(v),
    }
}

/// The hook tools this charm uses. One hook invocation, one implementation.
pub trait HookEnv {
    /// Log through `juju-log`. Best-effort: logging never fails the hook.
    fn log(&self, msg: &str);

    fn config(&self) -> Result<CharmConfig, CharmError>;

    fn relation_ids(&self, relation: &str) -> Result<Vec<String>, CharmError>;

    fn related_units(&self, relation_id: &str) -> Result<Vec<String>, CharmError>;

    /// Settings published by the remote unit that triggered the current hook.
    fn relation_get(&self) -> Result<HashMap<String, String>, CharmError>;

    /// Settings published by a specific unit on a specific relation.
    fn relation_get_unit(
        &self,
        relation_id: &str,
        unit: &str,
    ) -> Result<HashMap<String, String>, CharmError>;

    /// Publish settings on a relation; `None` means the current relation.
    fn relation_set(
        &self,
        relation_id: Option<&str>,
        settings: &[(&str, String)],
    ) -> Result<(), CharmError>;

    fn private_address(&self) -> Result<String, CharmError>;

    fn is_leader(&self) -> Result<bool, CharmError>;
}

/// Whether any `ha` subordinate unit reports this service as clustered
/// behind a virtual IP.
pub fn is_clustered(env: &dyn HookEnv) -> Result<bool, CharmError> {
    for rid in env.relation_ids("ha")? {
        for unit in env.related_units(&rid)? {
            let data = env.relation_get_unit(&rid, &unit)?;
            if data.get("clustered").map(|v| truthy(v)).unwrap_or(false) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

pub fn truthy(value: &str) -> bool {
    matches!(value, "yes" | "Yes" | "true" | "True")
}

pub struct JujuEnv;

impl HookEnv for JujuEnv {
    fn log(&self, msg: &str) {
        let _ = cmd::run("juju-log", &[msg]);
    }

    fn config(&self) -> Result<CharmConfig, CharmError> {
        let out = cmd::get_output("config-get", &["--format", "yaml"])?;
        Ok(from_slice(&out)?)
    }

    fn relation_ids(&self, relation: &str) -> Result<Vec<String>, CharmError> {
        let out = cmd::get_output("relation-ids", &["--format", "yaml", relation])?;
        let ids: Option<Vec<String>> = from_slice(&out)?;
        Ok(ids.unwrap_or_default())
    }

    fn related_units(&self, relation_id: &str) -> Result<Vec<String>, CharmError> {
        let out = cmd::get_output("relation-list", &["--format", "yaml", "-r", relation_id])?;
        let units: Option<Vec<String>> = from_slice(&out)?;
        Ok(units.unwrap_or_default())
    }

    fn relation_get(&self) -> Result<HashMap<String, String>, CharmError> {
        let out = cmd::get_output("relation-get", &["--format", "yaml", "-"])?;
        string_map(&out)
    }

    fn relation_get_unit(
        &self,
        relation_id: &str,
        unit: &str,
    ) -> Result<HashMap<String, String>, CharmError> {
        let out = cmd::get_output(
            "relation-get",
            &["--format", "yaml", "-r", relation_id, "-", unit],
        )?;
        string_map(&out)
    }

    fn relation_set(
        &self,
        relation_id: Option<&str>,
        settings: &[(&str, String)],
    ) -> Result<(), CharmError> {
        let mut args = Vec::new();
        if let Some(rid) = relation_id {
            args.push(format!("-r={}", rid));
        }
        for (key, value) in settings {
            args.push(format!("{}={}", key, value));
        }
        cmd::run("relation-set", &args)
    }

    fn private_address(&self) -> Result<String, CharmError> {
        let out = cmd::get_output("unit-get", &["private-address"])?;
        Ok(String::from_utf8_lossy(&out).trim().to_string())
    }

    fn is_leader(&self) -> Result<bool, CharmError> {
        let out = cmd::get_output("is-leader", &["--format", "yaml"])?;
        Ok(from_slice(&out)?)
    }
}

/// Relation data is stringly typed on the wire, but `--format yaml` hands
/// back scalars. Flatten everything to strings at the boundary.
fn string_map(bytes: &[u8]) -> Result<HashMap<String, String>, CharmError> {
    let raw: Option<HashMap<String, Value>> = from_slice(bytes)?;

    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| {
            match value {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            }
            .map(|s| (key, s))
        })
        .collect())
}
