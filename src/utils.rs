//! Glance service management helpers shared by several hooks.

use crate::error::CharmError;
use crate::host::Host;

pub const SERVICE: &str = "glance";

pub const PACKAGES: &[&str] = &[
    "apache2",
    "glance",
    "python-mysqldb",
    "python-swift",
    "python-keystone",
    "uuid",
    "haproxy",
];

pub const CEPH_PACKAGES: &[&str] = &["ceph-common", "python-ceph"];

/// Run the schema migration. Callers gate on leadership.
pub fn migrate_database(host: &dyn Host) -> Result<(), CharmError> {
    host.run("glance-manage", &["db_sync"])
}

/// Essex schemas predate automatic version control: when the version probe
/// fails, stamp the schema at version 0 so db_sync has a baseline.
pub fn ensure_db_version_control(host: &dyn Host) -> Result<(), CharmError> {
    let (status, _) = host.output("glance-manage", &["db", "version"])?;
    if status != 0 {
        host.run("glance-manage", &["version_control", "0"])?;
    }
    Ok(())
}

/// Write the ceph client keyring for this service. Returns false when the
/// keyring could not be created; callers treat that as "peer not ready".
pub fn ensure_ceph_keyring(host: &dyn Host, service: &str, key: &str) -> bool {
    let keyring = format!("/etc/ceph/ceph.client.{}.keyring", service);

    host.run(
        "ceph-authtool",
        &[
            &keyring,
            "--create-keyring",
            &format!("--name=client.{}", service),
            &format!("--add-key={}", key),
        ],
    )
    .is_ok()
}

/// Create the rbd pool backing the image store if it does not exist yet.
pub fn ensure_ceph_pool(host: &dyn Host, service: &str) -> Result<(), CharmError> {
    let (code, pools) = host.output("rados", &["lspools"])?;
    if code == 0 && pools.lines().any(|pool| pool == service) {
        return Ok(());
    }

    host.run("rados", &["mkpool", service])
}
