//! Hook dispatch and the relation handlers themselves.
//!
//! The orchestrator delivers exactly one named event per invocation. `Hook`
//! parses the event name, and `Dispatcher` holds an enum-keyed handler map
//! built once at startup. Handlers are idempotent: re-running one against
//! unchanged relation data rewrites nothing and restarts nothing.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use crate::contexts::{ContextKind, Contexts};
use crate::endpoint;
use crate::error::CharmError;
use crate::hookenv::{self, HookEnv};
use crate::host::Host;
use crate::openstack::{self, Release};
use crate::render::{
    ConfigRegistry, WriteOutcome, CEPH_CONF, GLANCE_API_CONF, GLANCE_API_PASTE_INI,
    GLANCE_REGISTRY_CONF, GLANCE_REGISTRY_PASTE_INI, HAPROXY_CONF, HTTPS_SITE,
};
use crate::utils::{self, CEPH_PACKAGES, PACKAGES, SERVICE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    Install,
    ConfigChanged,
    UpgradeCharm,
    DbJoined,
    DbChanged,
    KeystoneJoined,
    KeystoneChanged,
    ImageServiceJoined,
    ObjectStoreJoined,
    ObjectStoreChanged,
    CephJoined,
    CephChanged,
    ClusterChanged,
    HaJoined,
    HaChanged,
}

impl FromStr for Hook {
    type Err = CharmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "install" => Ok(Hook::Install),
            "config-changed" => Ok(Hook::ConfigChanged),
            "upgrade-charm" => Ok(Hook::UpgradeCharm),
            "shared-db-relation-joined" => Ok(Hook::DbJoined),
            "shared-db-relation-changed" => Ok(Hook::DbChanged),
            "identity-service-relation-joined" => Ok(Hook::KeystoneJoined),
            "identity-service-relation-changed" => Ok(Hook::KeystoneChanged),
            "image-service-relation-joined" => Ok(Hook::ImageServiceJoined),
            "object-store-relation-joined" => Ok(Hook::ObjectStoreJoined),
            "object-store-relation-changed" => Ok(Hook::ObjectStoreChanged),
            "ceph-relation-joined" => Ok(Hook::CephJoined),
            "ceph-relation-changed" => Ok(Hook::CephChanged),
            "cluster-relation-changed" => Ok(Hook::ClusterChanged),
            "ha-relation-joined" => Ok(Hook::HaJoined),
            "ha-relation-changed" => Ok(Hook::HaChanged),
            _ => Err(CharmError::UnknownHook(s.to_string())),
        }
    }
}

/// Everything a handler needs: the hook tools, the machine, and the
/// managed-config registry.
pub struct Charm<'a> {
    pub env: &'a dyn HookEnv,
    pub host: &'a dyn Host,
    pub configs: ConfigRegistry,
}

type Handler = fn(&mut Charm) -> Result<(), CharmError>;

pub struct Dispatcher {
    handlers: HashMap<Hook, Handler>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let mut handlers: HashMap<Hook, Handler> = HashMap::new();

        handlers.insert(Hook::Install, install);
        handlers.insert(Hook::ConfigChanged, config_changed);
        handlers.insert(Hook::UpgradeCharm, upgrade_charm);
        handlers.insert(Hook::DbJoined, db_joined);
        handlers.insert(Hook::DbChanged, db_changed);
        handlers.insert(Hook::KeystoneJoined, |charm| keystone_joined(charm, None));
        handlers.insert(Hook::KeystoneChanged, keystone_changed);
        handlers.insert(Hook::ImageServiceJoined, |charm| {
            image_service_joined(charm, None)
        });
        handlers.insert(Hook::ObjectStoreJoined, object_store_joined);
        handlers.insert(Hook::ObjectStoreChanged, object_store_joined);
        handlers.insert(Hook::CephJoined, ceph_joined);
        handlers.insert(Hook::CephChanged, ceph_changed);
        handlers.insert(Hook::ClusterChanged, cluster_changed);
        handlers.insert(Hook::HaJoined, ha_relation_joined);
        handlers.insert(Hook::HaChanged, ha_relation_changed);

        Self { handlers }
    }

    pub fn dispatch(&self, charm: &mut Charm, hook: Hook) -> Result<(), CharmError> {
        match self.handlers.get(&hook) {
            Some(handler) => handler(charm),
            None => Err(CharmError::UnknownHook(format!("{:?}", hook))),
        }
    }
}

impl<'a> Charm<'a> {
    pub fn new(env: &'a dyn HookEnv, host: &'a dyn Host, configs: ConfigRegistry) -> Self {
        Self { env, host, configs }
    }

    fn contexts(&self) -> Result<Contexts, CharmError> {
        Contexts::collect(self.env)
    }

    /// Render the given files and restart each affected service at most
    /// once, only when on-disk content actually changed.
    fn write_restart(&self, contexts: &Contexts, paths: &[&str]) -> Result<(), CharmError> {
        let mut restart: Vec<&str> = Vec::new();

        for path in paths {
            match self.configs.write(contexts, path)? {
                WriteOutcome::Written => {
                    for &service in self.configs.services_for(path)? {
                        if !restart.contains(&service) {
                            restart.push(service);
                        }
                    }
                }
                WriteOutcome::Unchanged => {}
                WriteOutcome::Incomplete(kind) => {
                    self.env.log(&format!(
                        "Not rendering {}: {} context incomplete",
                        path,
                        kind.name()
                    ));
                }
            }
        }

        for service in restart {
            self.host.service_restart(service)?;
        }

        Ok(())
    }

    /// The URL peers should reach this API on, given cluster and TLS state.
    fn api_url(&self, contexts: &Contexts) -> Result<String, CharmError> {
        let clustered = hookenv::is_clustered(self.env)?;
        let https = contexts.is_complete(ContextKind::Https);
        let address = self.env.private_address()?;

        Ok(endpoint::canonical_url(
            clustered,
            https,
            contexts.config.vip(),
            &address,
        ))
    }
}

pub fn install(charm: &mut Charm) -> Result<(), CharmError> {
    let config = charm.env.config()?;
    if let Some(origin) = config.openstack_origin() {
        openstack::configure_installation_source(charm.host, origin)?;
    }

    charm.host.apt_update()?;
    charm.host.apt_install(PACKAGES)
}

pub fn db_joined(charm: &mut Charm) -> Result<(), CharmError> {
    let hostname = charm.env.private_address()?;

    charm.env.relation_set(
        None,
        &[
            ("database", SERVICE.to_string()),
            ("username", SERVICE.to_string()),
            ("hostname", hostname),
        ],
    )
}

pub fn db_changed(charm: &mut Charm) -> Result<(), CharmError> {
    let contexts = charm.contexts()?;
    if !contexts.is_complete(ContextKind::SharedDb) {
        charm.env.log("shared-db relation incomplete. Peer not ready?");
        return Ok(());
    }

    let release = openstack::installed_release(charm.host, "glance-common")?;
    if release == Some(Release::Essex) {
        // Essex can't run the API against a freshly synced schema until the
        // version stamp exists, so only the registry config is rendered here.
        charm.write_restart(&contexts, &[GLANCE_REGISTRY_CONF])?;
    } else {
        charm.write_restart(&contexts, &[GLANCE_REGISTRY_CONF, GLANCE_API_CONF])?;
    }

    if charm.env.is_leader()? {
        if release == Some(Release::Essex) {
            utils::ensure_db_version_control(charm.host)?;
        }
        charm.env.log("Cluster leader, performing db sync");
        utils::migrate_database(charm.host)?;
    }

    Ok(())
}

pub fn keystone_joined(charm: &mut Charm, relation_id: Option<&str>) -> Result<(), CharmError> {
    let contexts = charm.contexts()?;
    let url = charm.api_url(&contexts)?;
    let region = contexts.config.region().to_string();

    charm.env.relation_set(
        relation_id,
        &[
            ("service", SERVICE.to_string()),
            ("region", region),
            ("public_url", url.clone()),
            ("admin_url", url.clone()),
            ("internal_url", url),
        ],
    )
}

pub fn keystone_changed(charm: &mut Charm) -> Result<(), CharmError> {
    let contexts = charm.contexts()?;
    if !contexts.is_complete(ContextKind::IdentityService) {
        charm
            .env
            .log("identity-service relation incomplete. Peer not ready?");
        return Ok(());
    }

    charm.write_restart(
        &contexts,
        &[
            GLANCE_API_CONF,
            GLANCE_REGISTRY_CONF,
            GLANCE_API_PASTE_INI,
            GLANCE_REGISTRY_PASTE_INI,
        ],
    )?;

    // A swift backend may have been waiting on these credentials.
    if !charm.env.relation_ids("object-store")?.is_empty() {
        object_store_joined(charm)?;
    }

    configure_https(charm)
}

pub fn image_service_joined(charm: &mut Charm, relation_id: Option<&str>) -> Result<(), CharmError> {
    if !charm.env.is_leader()? {
        return Ok(());
    }

    let contexts = charm.contexts()?;
    let url = charm.api_url(&contexts)?;

    charm
        .env
        .relation_set(relation_id, &[("glance_api_server", url)])
}

pub fn object_store_joined(charm: &mut Charm) -> Result<(), CharmError> {
    let contexts = charm.contexts()?;

    if !contexts.is_complete(ContextKind::IdentityService) {
        charm.env.log(
            "Deferring swift storage configuration until an identity-service relation exists",
        );
        return Ok(());
    }

    if !contexts.is_complete(ContextKind::ObjectStore) {
        charm.env.log("swift relation incomplete");
        return Ok(());
    }

    charm.write_restart(&contexts, &[GLANCE_API_CONF])
}

pub fn ceph_joined(charm: &mut Charm) -> Result<(), CharmError> {
    charm.configs.ensure_dir("/etc/ceph")?;
    charm.host.apt_install(CEPH_PACKAGES)
}

pub fn ceph_changed(charm: &mut Charm) -> Result<(), CharmError> {
    let contexts = charm.contexts()?;

    let ceph = match &contexts.ceph {
        Some(ceph) => ceph,
        None => {
            charm.env.log("ceph relation incomplete. Peer not ready?");
            return Ok(());
        }
    };

    if !utils::ensure_ceph_keyring(charm.host, SERVICE, &ceph.key) {
        charm.env.log("Could not create ceph keyring: peer not ready?");
        return Ok(());
    }

    charm.write_restart(&contexts, &[GLANCE_API_CONF, CEPH_CONF])?;
    utils::ensure_ceph_pool(charm.host, SERVICE)
}

pub fn cluster_changed(charm: &mut Charm) -> Result<(), CharmError> {
    let contexts = charm.contexts()?;
    charm.write_restart(&contexts, &[GLANCE_API_CONF, HAPROXY_CONF])
}

pub fn upgrade_charm(charm: &mut Charm) -> Result<(), CharmError> {
    cluster_changed(charm)
}

pub fn ha_relation_joined(charm: &mut Charm) -> Result<(), CharmError> {
    let config = charm.env.config()?;
    let vip = config
        .vip()
        .ok_or(CharmError::MissingConfigOption("vip"))?
        .to_string();

    let mut resources = BTreeMap::new();
    resources.insert("res_glance_vip", "ocf:heartbeat:IPaddr2".to_string());
    resources.insert("res_glance_haproxy", "lsb:haproxy".to_string());

    let mut resource_params = BTreeMap::new();
    resource_params.insert(
        "res_glance_vip",
        format!(
            "params ip=\"{}\" cidr_netmask=\"{}\" nic=\"{}\"",
            vip,
            config.vip_cidr(),
            config.vip_iface()
        ),
    );
    resource_params.insert("res_glance_haproxy", "op monitor interval=\"5s\"".to_string());

    let mut init_services = BTreeMap::new();
    init_services.insert("res_glance_haproxy", "haproxy".to_string());

    let mut clones = BTreeMap::new();
    clones.insert("cl_glance_haproxy", "res_glance_haproxy".to_string());

    charm.env.relation_set(
        None,
        &[
            ("corosync_bindiface", config.ha_bindiface().to_string()),
            ("corosync_mcastport", config.ha_mcastport().to_string()),
            ("resources", to_yaml(&resources)?),
            ("resource_params", to_yaml(&resource_params)?),
            ("init_services", to_yaml(&init_services)?),
            ("clones", to_yaml(&clones)?),
        ],
    )
}

pub fn ha_relation_changed(charm: &mut Charm) -> Result<(), CharmError> {
    let data = charm.env.relation_get()?;
    let clustered = data
        .get("clustered")
        .map(|value| hookenv::truthy(value))
        .unwrap_or(false);

    if !clustered {
        charm.env.log("glance subordinate is not fully clustered.");
        return Ok(());
    }

    if !charm.env.is_leader()? {
        return Ok(());
    }

    charm
        .env
        .log("glance: Cluster configured, notifying other services");

    let contexts = charm.contexts()?;
    charm.write_restart(&contexts, &[GLANCE_API_CONF])?;

    for rid in charm.env.relation_ids("identity-service")? {
        keystone_joined(charm, Some(&rid))?;
    }
    for rid in charm.env.relation_ids("image-service")? {
        image_service_joined(charm, Some(&rid))?;
    }

    Ok(())
}

pub fn config_changed(charm: &mut Charm) -> Result<(), CharmError> {
    let config = charm.env.config()?;

    if openstack::upgrade_available(charm.host, &config, "glance-common")? {
        charm.env.log("Upgrading OpenStack release");
        do_openstack_upgrade(charm)?;
    }

    configure_https(charm)
}

/// Upgrade to the release the configured install source provides, then
/// re-run the relation handlers so already-established relations pick up
/// any config schema changes.
pub fn do_openstack_upgrade(charm: &mut Charm) -> Result<(), CharmError> {
    let config = charm.env.config()?;
    let origin = config
        .openstack_origin()
        .ok_or(CharmError::MissingConfigOption("openstack-origin"))?
        .to_string();

    openstack::configure_installation_source(charm.host, &origin)?;
    charm.host.apt_update()?;
    charm.host.apt_upgrade(PACKAGES)?;

    if !charm.env.relation_ids("shared-db")?.is_empty() {
        charm.env.log("Configuring database after upgrade");
        db_changed(charm)?;
    }

    if !charm.env.relation_ids("identity-service")?.is_empty() {
        charm.env.log("Configuring identity service after upgrade");
        keystone_changed(charm)?;
    }

    if !charm.env.relation_ids("ceph")?.is_empty() {
        charm.host.apt_install(CEPH_PACKAGES)?;
        ceph_changed(charm)?;
    }

    if !charm.env.relation_ids("object-store")?.is_empty() {
        object_store_joined(charm)?;
    }

    Ok(())
}

/// Reconcile the HTTPS frontend with current certificate availability and
/// republish endpoint URLs to every consumer.
pub fn configure_https(charm: &mut Charm) -> Result<(), CharmError> {
    let contexts = charm.contexts()?;

    if contexts.is_complete(ContextKind::Https) {
        charm.host.enable_site(HTTPS_SITE)?;
    } else {
        charm.host.disable_site(HTTPS_SITE)?;
    }

    for rid in charm.env.relation_ids("identity-service")? {
        keystone_joined(charm, Some(&rid))?;
    }
    for rid in charm.env.relation_ids("image-service")? {
        image_service_joined(charm, Some(&rid))?;
    }

    Ok(())
}

fn to_yaml(map: &BTreeMap<&str, String>) -> Result<String, CharmError> {
    let yaml = serde_yaml::to_string(map)?;
    Ok(yaml.trim_start_matches("---").trim().to_string())
}
