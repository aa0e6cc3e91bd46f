//! Machine-local side effects: packages, services, apt sources, and the
//! handful of OpenStack management commands the hooks shell out to.
//!
//! Only `run`, `output` and `add_apt_source` touch the machine; everything
//! else is expressed in terms of them so a test double gets the full surface
//! by recording three methods.

use crate::cmd;
use crate::error::CharmError;

pub trait Host {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<(), CharmError>;

    /// Run a command, returning its exit code and stdout instead of failing
    /// on non-zero exit.
    fn output(&self, cmd: &str, args: &[&str]) -> Result<(i32, String), CharmError>;

    /// Install an apt source list under /etc/apt/sources.list.d.
    fn add_apt_source(&self, name: &str, line: &str) -> Result<(), CharmError>;

    fn apt_update(&self) -> Result<(), CharmError> {
        self.run("apt-get", &["update"])
    }

    fn apt_install(&self, packages: &[&str]) -> Result<(), CharmError> {
        let mut args = vec!["install", "-y", "--no-install-recommends"];
        args.extend_from_slice(packages);
        self.run("apt-get", &args)
    }

    /// Upgrade already-installed packages, preferring the packaged config
    /// files over locally modified ones. Used during OpenStack upgrades.
    fn apt_upgrade(&self, packages: &[&str]) -> Result<(), CharmError> {
        let mut args = vec![
            "--option",
            "Dpkg::Options::=--force-confnew",
            "install",
            "-y",
            "--no-install-recommends",
        ];
        args.extend_from_slice(packages);
        self.run("apt-get", &args)
    }

    fn service_start(&self, service: &str) -> Result<(), CharmError> {
        self.run("service", &[service, "start"])
    }

    fn service_stop(&self, service: &str) -> Result<(), CharmError> {
        self.run("service", &[service, "stop"])
    }

    fn service_restart(&self, service: &str) -> Result<(), CharmError> {
        self.run("service", &[service, "restart"])
    }

    fn enable_site(&self, site: &str) -> Result<(), CharmError> {
        self.run("a2ensite", &[site])
    }

    fn disable_site(&self, site: &str) -> Result<(), CharmError> {
        self.run("a2dissite", &[site])
    }
}

pub struct SystemHost;

impl Host for SystemHost {
    fn run(&self, command: &str, args: &[&str]) -> Result<(), CharmError> {
        cmd::run(command, args)
    }

    fn output(&self, command: &str, args: &[&str]) -> Result<(i32, String), CharmError> {
        cmd::try_output(command, args)
    }

    fn add_apt_source(&self, name: &str, line: &str) -> Result<(), CharmError> {
        let path = format!("/etc/apt/sources.list.d/{}.list", name);
        ex::fs::write(path, format!("{}\n", line))?;
        Ok(())
    }
}
