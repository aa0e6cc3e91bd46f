//! Derivation of the API endpoint URL published to peer services.

/// Port the glance API is reachable on from outside the unit. When the
/// deployment is clustered this is the haproxy (or TLS frontend) port; the
/// API process itself binds one of the backend ports below.
pub const API_PORT: u16 = 9292;

/// Backend port for the API process when haproxy fronts it.
pub const API_BACKEND_PORT: u16 = 9282;

/// The canonical URL for this service: scheme follows TLS availability,
/// host follows cluster mode. All of public, admin and internal resolve to
/// the same URL in this charm.
pub fn canonical_url(
    clustered: bool,
    https: bool,
    vip: Option<&str>,
    private_address: &str,
) -> String {
    let scheme = if https { "https" } else { "http" };
    let host = match (clustered, vip) {
        (true, Some(vip)) => vip,
        _ => private_address,
    };

    format!("{}://{}:{}", scheme, host, API_PORT)
}
