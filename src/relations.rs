//! Typed views over relation data.
//!
//! Relation payloads arrive as flat string maps. Each relation this charm
//! consumes gets a record type that parses the map once, at the boundary;
//! a record only exists if every field it needs is present, so "is this
//! relation complete" is `Option::is_some` everywhere else in the charm.

use std::collections::HashMap;

/// Database access settings received from a mysql unit on `shared-db`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedDb {
    pub db_host: String,
    pub password: String,
}

impl SharedDb {
    pub fn parse(data: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            db_host: data.get("db_host")?.clone(),
            password: data.get("password")?.clone(),
        })
    }
}

/// Keystone endpoint and service credentials received on `identity-service`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityService {
    pub service_host: String,
    pub service_port: String,
    pub auth_host: String,
    pub auth_port: String,
    pub service_username: String,
    pub service_password: String,
    pub service_tenant: String,
}

impl IdentityService {
    pub fn parse(data: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            service_host: data.get("service_host")?.clone(),
            service_port: data.get("service_port")?.clone(),
            auth_host: data.get("auth_host")?.clone(),
            auth_port: data.get("auth_port")?.clone(),
            service_username: data.get("service_username")?.clone(),
            service_password: data.get("service_password")?.clone(),
            service_tenant: data.get("service_tenant")?.clone(),
        })
    }
}

/// TLS material published alongside the identity-service data when the
/// deployment fronts the API with HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpsCerts {
    pub cert: String,
    pub key: String,
}

impl HttpsCerts {
    pub fn parse(data: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            cert: data.get("ssl_cert")?.clone(),
            key: data.get("ssl_key")?.clone(),
        })
    }
}

/// A swift proxy unit reachable on `object-store`. Credentials for the
/// swift store come from the identity relation, so presence of a peer
/// address is all this record carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStore {
    pub address: String,
}

impl ObjectStore {
    pub fn parse(data: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            address: data.get("private-address")?.clone(),
        })
    }
}

/// Aggregated ceph client settings across every mon unit on the relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CephClient {
    pub key: String,
    pub auth: String,
    pub mon_hosts: Vec<String>,
}

impl CephClient {
    /// Fold per-unit payloads into one client view. `None` until at least
    /// one mon has published its key, auth mode and address.
    pub fn aggregate<'a, I>(units: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a HashMap<String, String>>,
    {
        let mut key = None;
        let mut auth = None;
        let mut mon_hosts = Vec::new();

        for data in units {
            if let Some(k) = data.get("key") {
                key = Some(k.clone());
            }
            if let Some(a) = data.get("auth") {
                auth = Some(a.clone());
            }
            if let Some(addr) = data
                .get("ceph-public-address")
                .or_else(|| data.get("private-address"))
            {
                if !mon_hosts.contains(addr) {
                    mon_hosts.push(addr.clone());
                }
            }
        }

        mon_hosts.sort();

        match (key, auth) {
            (Some(key), Some(auth)) if !mon_hosts.is_empty() => Some(Self {
                key,
                auth,
                mon_hosts,
            }),
            _ => None,
        }
    }
}

/// A peer glance unit on the `cluster` relation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Peer {
    pub unit: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterPeers {
    pub peers: Vec<Peer>,
}

impl ClusterPeers {
    pub fn from_units(mut peers: Vec<Peer>) -> Option<Self> {
        if peers.is_empty() {
            return None;
        }
        peers.sort();
        Some(Self { peers })
    }
}
