use std::env::args;
use std::path::Path;

use glance::error::CharmError;
use glance::hookenv::JujuEnv;
use glance::hooks::{Charm, Dispatcher, Hook};
use glance::host::SystemHost;
use glance::render::ConfigRegistry;

fn main() -> Result<(), String> {
    // Juju invokes hooks through symlinks named after the event; a hook
    // name as the first argument wins for manual runs.
    let argv: Vec<String> = args().collect();
    let name = argv
        .get(1)
        .cloned()
        .or_else(|| {
            argv.get(0).and_then(|program| {
                Path::new(program)
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
            })
        })
        .ok_or_else(|| "No hook name given".to_string())?;

    let hook: Hook = name.parse().map_err(|err: CharmError| String::from(err))?;

    let env = JujuEnv;
    let host = SystemHost;
    let mut charm = Charm::new(&env, &host, ConfigRegistry::new());

    Dispatcher::new().dispatch(&mut charm, hook).map_err(String::from)
}
