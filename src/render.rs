//! The managed-config registry.
//!
//! A fixed table of output files, each with the context that gates its
//! rendering, the services to bounce when its content changes, and a pure
//! render function over the collected contexts. Writes are idempotent:
//! re-rendering with unchanged inputs produces byte-identical output and
//! reports `Unchanged`, so no-op writes never restart anything.

use std::path::PathBuf;

use crate::contexts::{ContextKind, Contexts};
use crate::endpoint::{API_BACKEND_PORT, API_PORT};
use crate::error::CharmError;

pub const GLANCE_REGISTRY_CONF: &str = "/etc/glance/glance-registry.conf";
pub const GLANCE_API_CONF: &str = "/etc/glance/glance-api.conf";
pub const GLANCE_API_PASTE_INI: &str = "/etc/glance/glance-api-paste.ini";
pub const GLANCE_REGISTRY_PASTE_INI: &str = "/etc/glance/glance-registry-paste.ini";
pub const HAPROXY_CONF: &str = "/etc/haproxy/haproxy.cfg";
pub const CEPH_CONF: &str = "/etc/ceph/ceph.conf";

pub const HTTPS_SITE: &str = "openstack_https_frontend";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Content changed on disk; the file's services need a restart.
    Written,
    /// Rendered byte-identical content; nothing touched.
    Unchanged,
    /// The gating context is incomplete; the file was not rendered.
    Incomplete(ContextKind),
}

struct ManagedFile {
    path: &'static str,
    /// Context that must be complete before this file is worth writing.
    requires: Option<ContextKind>,
    services: &'static [&'static str],
    render: fn(&Contexts) -> String,
}

const REGISTRY: &[ManagedFile] = &[
    ManagedFile {
        path: GLANCE_REGISTRY_CONF,
        requires: Some(ContextKind::SharedDb),
        services: &["glance-registry"],
        render: render_registry_conf,
    },
    ManagedFile {
        path: GLANCE_API_CONF,
        requires: Some(ContextKind::SharedDb),
        services: &["glance-api"],
        render: render_api_conf,
    },
    ManagedFile {
        path: GLANCE_API_PASTE_INI,
        requires: Some(ContextKind::IdentityService),
        services: &["glance-api"],
        render: render_api_paste,
    },
    ManagedFile {
        path: GLANCE_REGISTRY_PASTE_INI,
        requires: Some(ContextKind::IdentityService),
        services: &["glance-registry"],
        render: render_registry_paste,
    },
    ManagedFile {
        path: HAPROXY_CONF,
        requires: Some(ContextKind::Cluster),
        services: &["haproxy"],
        render: render_haproxy_cfg,
    },
    ManagedFile {
        path: CEPH_CONF,
        requires: Some(ContextKind::Ceph),
        services: &["glance-api", "glance-registry"],
        render: render_ceph_conf,
    },
];

/// Registry of the config files this charm owns, rooted at a directory
/// prefix so tests can render into a scratch tree.
pub struct ConfigRegistry {
    root: PathBuf,
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::rooted("/")
    }
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rooted<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    pub fn services_for(&self, path: &str) -> Result<&'static [&'static str], CharmError> {
        Ok(lookup(path)?.services)
    }

    /// Create a directory under the registry root, e.g. /etc/ceph before
    /// the ceph packages land.
    pub fn ensure_dir(&self, path: &str) -> Result<(), CharmError> {
        let target = self.resolve(path);
        if !target.is_dir() {
            std::fs::create_dir_all(target)?;
        }
        Ok(())
    }

    /// Render one managed file, reporting whether on-disk content changed.
    pub fn write(&self, contexts: &Contexts, path: &str) -> Result<WriteOutcome, CharmError> {
        let file = lookup(path)?;

        if let Some(required) = file.requires {
            if !contexts.is_complete(required) {
                return Ok(WriteOutcome::Incomplete(required));
            }
        }

        let content = (file.render)(contexts);
        let target = self.resolve(path);

        if let Ok(existing) = std::fs::read(&target) {
            if existing == content.as_bytes() {
                return Ok(WriteOutcome::Unchanged);
            }
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        ex::fs::write(target, content)?;

        Ok(WriteOutcome::Written)
    }
}

fn lookup(path: &str) -> Result<&'static ManagedFile, CharmError> {
    REGISTRY
        .iter()
        .find(|file| file.path == path)
        .ok_or_else(|| CharmError::UnknownConfigFile(path.to_string()))
}

fn sql_connection(contexts: &Contexts) -> Option<String> {
    contexts.shared_db.as_ref().map(|db| {
        format!(
            "sql_connection = mysql://glance:{}@{}/glance\nsql_idle_timeout = 3600\n",
            db.password, db.db_host
        )
    })
}

fn paste_deploy(contexts: &Contexts) -> &'static str {
    if contexts.identity.is_some() {
        "\n[paste_deploy]\nflavor = keystone\n"
    } else {
        ""
    }
}

/// Port the API process binds. When peers front the service with haproxy,
/// the listener owns the public port and the API moves down.
fn api_bind_port(contexts: &Contexts) -> u16 {
    if contexts.cluster.is_some() {
        API_BACKEND_PORT
    } else {
        API_PORT
    }
}

fn render_registry_conf(contexts: &Contexts) -> String {
    let mut out = String::from(
        "[DEFAULT]\n\
         verbose = True\n\
         debug = False\n\
         bind_host = 0.0.0.0\n\
         bind_port = 9191\n\
         log_file = /var/log/glance/registry.log\n\
         backlog = 4096\n\
         api_limit_max = 1000\n\
         limit_param_default = 25\n",
    );

    if let Some(sql) = sql_connection(contexts) {
        out.push_str(&sql);
    }
    out.push_str(paste_deploy(contexts));

    out
}

fn render_api_conf(contexts: &Contexts) -> String {
    let mut out = format!(
        "[DEFAULT]\n\
         verbose = True\n\
         debug = False\n\
         bind_host = 0.0.0.0\n\
         bind_port = {}\n\
         log_file = /var/log/glance/api.log\n\
         backlog = 4096\n\
         registry_host = 0.0.0.0\n\
         registry_port = 9191\n",
        api_bind_port(contexts)
    );

    // rbd wins over swift when both backends are related
    let default_store = if contexts.ceph.is_some() {
        "rbd"
    } else if contexts.object_store.is_some() && contexts.identity.is_some() {
        "swift"
    } else {
        "file"
    };
    out.push_str(&format!("default_store = {}\n", default_store));
    out.push_str("filesystem_store_datadir = /var/lib/glance/images/\n");

    if let Some(sql) = sql_connection(contexts) {
        out.push_str(&sql);
    }

    if contexts.object_store.is_some() {
        if let Some(identity) = &contexts.identity {
            out.push_str(&format!(
                "\nswift_store_auth_version = 2\n\
                 swift_store_auth_address = http://{}:{}/v2.0/\n\
                 swift_store_user = {}:{}\n\
                 swift_store_key = {}\n\
                 swift_store_create_container_on_put = True\n\
                 swift_store_container = glance\n",
                identity.auth_host,
                identity.auth_port,
                identity.service_tenant,
                identity.service_username,
                identity.service_password
            ));
        }
    }

    if contexts.ceph.is_some() {
        out.push_str(
            "\nrbd_store_ceph_conf = /etc/ceph/ceph.conf\n\
             rbd_store_user = glance\n\
             rbd_store_pool = glance\n\
             rbd_store_chunk_size = 8\n",
        );
    }

    out.push_str(paste_deploy(contexts));

    out
}

fn authtoken_filter(contexts: &Contexts) -> String {
    match &contexts.identity {
        Some(identity) => format!(
            "\n[filter:authtoken]\n\
             paste.filter_factory = keystone.middleware.auth_token:filter_factory\n\
             service_host = {}\n\
             service_port = {}\n\
             auth_host = {}\n\
             auth_port = {}\n\
             auth_uri = http://{}:{}/\n\
             admin_tenant_name = {}\n\
             admin_user = {}\n\
             admin_password = {}\n",
            identity.service_host,
            identity.service_port,
            identity.auth_host,
            identity.auth_port,
            identity.auth_host,
            identity.auth_port,
            identity.service_tenant,
            identity.service_username,
            identity.service_password
        ),
        None => String::new(),
    }
}

fn render_api_paste(contexts: &Contexts) -> String {
    let mut out = String::from(
        "[pipeline:glance-api]\n\
         pipeline = versionnegotiation authtoken context apiv1app\n\
         \n\
         [app:apiv1app]\n\
         paste.app_factory = glance.common.wsgi:app_factory\n\
         glance.app_factory = glance.api.v1.router:API\n\
         \n\
         [filter:versionnegotiation]\n\
         paste.filter_factory = glance.common.wsgi:filter_factory\n\
         glance.filter_factory = glance.api.middleware.version_negotiation:VersionNegotiationFilter\n\
         \n\
         [filter:context]\n\
         paste.filter_factory = glance.common.wsgi:filter_factory\n\
         glance.filter_factory = glance.common.context:ContextMiddleware\n",
    );

    out.push_str(&authtoken_filter(contexts));

    out
}

fn render_registry_paste(contexts: &Contexts) -> String {
    let mut out = String::from(
        "[pipeline:glance-registry]\n\
         pipeline = authtoken context registryapp\n\
         \n\
         [app:registryapp]\n\
         paste.app_factory = glance.common.wsgi:app_factory\n\
         glance.app_factory = glance.registry.api.v1:API\n\
         \n\
         [filter:context]\n\
         paste.filter_factory = glance.common.wsgi:filter_factory\n\
         glance.filter_factory = glance.common.context:ContextMiddleware\n",
    );

    out.push_str(&authtoken_filter(contexts));

    out
}

fn render_haproxy_cfg(contexts: &Contexts) -> String {
    let mut out = format!(
        "global\n\
         \tlog 127.0.0.1 local0\n\
         \tmaxconn 20000\n\
         \tuser haproxy\n\
         \tgroup haproxy\n\
         \tdaemon\n\
         \n\
         defaults\n\
         \tlog global\n\
         \tmode http\n\
         \toption httplog\n\
         \tretries 3\n\
         \ttimeout connect 5000\n\
         \ttimeout client 30000\n\
         \ttimeout server 30000\n\
         \n\
         listen glance_api 0.0.0.0:{}\n\
         \tbalance roundrobin\n\
         \toption tcplog\n\
         \tserver glance-self {}:{} check\n",
        API_PORT, contexts.private_address, API_BACKEND_PORT
    );

    if let Some(cluster) = &contexts.cluster {
        for peer in &cluster.peers {
            out.push_str(&format!(
                "\tserver {} {}:{} check\n",
                peer.unit.replace('/', "-"),
                peer.address,
                API_BACKEND_PORT
            ));
        }
    }

    out
}

fn render_ceph_conf(contexts: &Contexts) -> String {
    match &contexts.ceph {
        Some(ceph) => format!(
            "[global]\n\
             \tauth supported = {}\n\
             \tkeyring = /etc/ceph/$cluster.$name.keyring\n\
             \tmon host = {}\n",
            ceph.auth,
            ceph.mon_hosts.join(" ")
        ),
        None => String::new(),
    }
}
