//! OpenStack release handling: mapping install sources and package versions
//! to release codenames, and reconfiguring apt accordingly.

use std::fmt;
use std::str::FromStr;

use crate::error::CharmError;
use crate::hookenv::CharmConfig;
use crate::host::Host;

/// Known OpenStack releases, oldest first. Ordering matters: an upgrade is
/// available when the configured source maps to a later release than the
/// installed package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Release {
    Essex,
    Folsom,
    Grizzly,
    Havana,
    Icehouse,
}

impl Release {
    pub fn name(self) -> &'static str {
        match self {
            Release::Essex => "essex",
            Release::Folsom => "folsom",
            Release::Grizzly => "grizzly",
            Release::Havana => "havana",
            Release::Icehouse => "icehouse",
        }
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Release {
    type Err = CharmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "essex" => Ok(Release::Essex),
            "folsom" => Ok(Release::Folsom),
            "grizzly" => Ok(Release::Grizzly),
            "havana" => Ok(Release::Havana),
            "icehouse" => Ok(Release::Icehouse),
            _ => Err(CharmError::InvalidInstallSource(s.to_string())),
        }
    }
}

/// Map an `openstack-origin` value to the release it would install.
///
/// Accepted forms: `distro` (the series' stock archive), `cloud:<series>-<release>`
/// with an optional `/updates`-style pocket, and `ppa:<owner>/<release>`.
pub fn release_from_source(source: &str) -> Result<Release, CharmError> {
    if source == "distro" {
        // precise ships essex
        return Ok(Release::Essex);
    }

    let invalid = || CharmError::InvalidInstallSource(source.to_string());

    if let Some(archive) = source.strip_prefix("cloud:") {
        let pocket = archive.split('/').next().ok_or_else(invalid)?;
        let release = pocket.splitn(2, '-').nth(1).ok_or_else(invalid)?;
        return release.parse().map_err(|_| invalid());
    }

    if let Some(ppa) = source.strip_prefix("ppa:") {
        let release = ppa.rsplit('/').next().ok_or_else(invalid)?;
        return release.parse().map_err(|_| invalid());
    }

    Err(invalid())
}

/// Map a packaged OpenStack version string to its release.
pub fn release_from_version(version: &str) -> Option<Release> {
    let series = version.split(|c| c == '-' || c == '~').next()?;
    let mut parts = series.split('.');
    let year = parts.next()?;
    let minor = parts.next()?;

    match (year, minor) {
        ("2012", "1") => Some(Release::Essex),
        ("2012", "2") => Some(Release::Folsom),
        ("2013", "1") => Some(Release::Grizzly),
        ("2013", "2") => Some(Release::Havana),
        ("2014", "1") => Some(Release::Icehouse),
        _ => None,
    }
}

/// The release of the currently installed package, or `None` when the
/// package is missing or its version is not a known OpenStack release.
pub fn installed_release(host: &dyn Host, package: &str) -> Result<Option<Release>, CharmError> {
    let (code, version) = host.output("dpkg-query", &["-W", "-f=${Version}", package])?;
    if code != 0 {
        return Ok(None);
    }

    // Strip any epoch prefix, e.g. "1:2013.1-0ubuntu1".
    let version = match version.find(':') {
        Some(i) => &version[i + 1..],
        None => version.as_str(),
    };

    Ok(release_from_version(version))
}

/// Whether the configured install source provides a newer release than the
/// one the given package was installed from.
pub fn upgrade_available(
    host: &dyn Host,
    config: &CharmConfig,
    package: &str,
) -> Result<bool, CharmError> {
    let source = match config.openstack_origin() {
        Some(source) => source,
        None => return Ok(false),
    };

    let installed = match installed_release(host, package)? {
        Some(release) => release,
        None => return Ok(false),
    };

    Ok(release_from_source(source)? > installed)
}

/// Point apt at the configured installation source. `distro` is a no-op.
pub fn configure_installation_source(host: &dyn Host, source: &str) -> Result<(), CharmError> {
    if source == "distro" {
        return Ok(());
    }

    if let Some(archive) = source.strip_prefix("cloud:") {
        let pocket = archive.split('/').next().unwrap_or(archive);
        let mut parts = pocket.splitn(2, '-');
        let series = parts.next().unwrap_or_default();
        let release = parts
            .next()
            .ok_or_else(|| CharmError::InvalidInstallSource(source.to_string()))?;

        host.apt_install(&["ubuntu-cloud-keyring"])?;
        host.add_apt_source(
            "cloud-archive",
            &format!(
                "deb http://ubuntu-cloud.archive.canonical.com/ubuntu {}-updates/{} main",
                series, release
            ),
        )?;
        return Ok(());
    }

    if source.starts_with("ppa:") {
        return host.run("add-apt-repository", &["--yes", source]);
    }

    Err(CharmError::InvalidInstallSource(source.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_forms() {
        assert_eq!(release_from_source("distro").unwrap(), Release::Essex);
        assert_eq!(
            release_from_source("cloud:precise-folsom").unwrap(),
            Release::Folsom
        );
        assert_eq!(
            release_from_source("cloud:precise-grizzly/updates").unwrap(),
            Release::Grizzly
        );
        assert_eq!(
            release_from_source("ppa:cloud-archive/havana").unwrap(),
            Release::Havana
        );
        assert!(release_from_source("cloud:precise").is_err());
        assert!(release_from_source("nonsense").is_err());
    }

    #[test]
    fn version_mapping() {
        assert_eq!(release_from_version("2012.1-0ubuntu1"), Some(Release::Essex));
        assert_eq!(
            release_from_version("2013.1.4-0ubuntu1~cloud0"),
            Some(Release::Grizzly)
        );
        assert_eq!(release_from_version("9.99"), None);
    }

    #[test]
    fn releases_are_ordered() {
        assert!(Release::Grizzly > Release::Essex);
        assert!(Release::Folsom < Release::Icehouse);
    }
}
