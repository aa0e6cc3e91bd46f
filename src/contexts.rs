//! Collection of render contexts from current relation state.
//!
//! A context is complete when its typed record could be parsed from the
//! relation data currently on the bus. Handlers gate on completeness;
//! render functions consume whatever is present.

use crate::error::CharmError;
use crate::hookenv::{CharmConfig, HookEnv};
use crate::relations::{
    CephClient, ClusterPeers, HttpsCerts, IdentityService, ObjectStore, Peer, SharedDb,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    SharedDb,
    IdentityService,
    ObjectStore,
    Ceph,
    Https,
    Cluster,
}

pub const ALL_CONTEXTS: &[ContextKind] = &[
    ContextKind::SharedDb,
    ContextKind::IdentityService,
    ContextKind::ObjectStore,
    ContextKind::Ceph,
    ContextKind::Https,
    ContextKind::Cluster,
];

impl ContextKind {
    pub fn name(self) -> &'static str {
        match self {
            ContextKind::SharedDb => "shared-db",
            ContextKind::IdentityService => "identity-service",
            ContextKind::ObjectStore => "object-store",
            ContextKind::Ceph => "ceph",
            ContextKind::Https => "https",
            ContextKind::Cluster => "cluster",
        }
    }
}

/// Everything the renderer can draw on: local config, this unit's address,
/// and one typed record per relation kind when its data is complete.
#[derive(Debug, Clone)]
pub struct Contexts {
    pub config: CharmConfig,
    pub private_address: String,
    pub shared_db: Option<SharedDb>,
    pub identity: Option<IdentityService>,
    pub object_store: Option<ObjectStore>,
    pub ceph: Option<CephClient>,
    pub https: Option<HttpsCerts>,
    pub cluster: Option<ClusterPeers>,
}

impl Contexts {
    pub fn collect(env: &dyn HookEnv) -> Result<Self, CharmError> {
        let config = env.config()?;
        let private_address = env.private_address()?;

        let mut shared_db = None;
        for (_, _, data) in relation_scan(env, "shared-db")? {
            if let Some(db) = SharedDb::parse(&data) {
                shared_db = Some(db);
            }
        }

        let mut identity = None;
        let mut https = None;
        for (_, _, data) in relation_scan(env, "identity-service")? {
            if let Some(id) = IdentityService::parse(&data) {
                identity = Some(id);
            }
            if let Some(certs) = HttpsCerts::parse(&data) {
                https = Some(certs);
            }
        }

        let mut object_store = None;
        for (_, _, data) in relation_scan(env, "object-store")? {
            if let Some(store) = ObjectStore::parse(&data) {
                object_store = Some(store);
            }
        }

        let ceph_units: Vec<_> = relation_scan(env, "ceph")?
            .into_iter()
            .map(|(_, _, data)| data)
            .collect();
        let ceph = CephClient::aggregate(&ceph_units);

        let mut peers = Vec::new();
        for (_, unit, data) in relation_scan(env, "cluster")? {
            if let Some(address) = data.get("private-address") {
                peers.push(Peer {
                    unit,
                    address: address.clone(),
                });
            }
        }
        let cluster = ClusterPeers::from_units(peers);

        Ok(Self {
            config,
            private_address,
            shared_db,
            identity,
            object_store,
            ceph,
            https,
            cluster,
        })
    }

    pub fn is_complete(&self, kind: ContextKind) -> bool {
        match kind {
            ContextKind::SharedDb => self.shared_db.is_some(),
            ContextKind::IdentityService => self.identity.is_some(),
            ContextKind::ObjectStore => self.object_store.is_some(),
            ContextKind::Ceph => self.ceph.is_some(),
            ContextKind::Https => self.https.is_some(),
            ContextKind::Cluster => self.cluster.is_some(),
        }
    }

    pub fn complete(&self) -> Vec<ContextKind> {
        ALL_CONTEXTS
            .iter()
            .copied()
            .filter(|kind| self.is_complete(*kind))
            .collect()
    }
}

type UnitData = (String, String, std::collections::HashMap<String, String>);

fn relation_scan(env: &dyn HookEnv, relation: &str) -> Result<Vec<UnitData>, CharmError> {
    let mut out = Vec::new();
    for rid in env.relation_ids(relation)? {
        for unit in env.related_units(&rid)? {
            let data = env.relation_get_unit(&rid, &unit)?;
            out.push((rid.clone(), unit, data));
        }
    }
    Ok(out)
}
