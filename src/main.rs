/// Arena engine command line
/// Lists templates, or provisions a working copy and disposes it again,
/// against an in-process host.
///
/// Usage: arena-engine [config.toml] <list|provision NAME|random>

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arena_engine::persistence::tree_size;
use arena_engine::{EngineConfig, HeadlessHost, Instance, InstanceFactory};

const DEFAULT_CONFIG: &str = "arena-engine.toml";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = match args.first() {
        Some(first) if first.ends_with(".toml") => args.remove(0),
        _ => DEFAULT_CONFIG.to_string(),
    };

    let config = EngineConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load {}", config_path))?;
    std::fs::create_dir_all(&config.container_dir)
        .with_context(|| format!("Failed to create {}", config.container_dir.display()))?;

    let host = Arc::new(HeadlessHost::new(&config.container_dir, config.max_height));
    let factory = InstanceFactory::new(config, host)?;

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["list"] | [] => {
            for template in factory.templates() {
                println!("{}\t{}", template.name(), template.path().display());
            }
        }
        ["provision", name] => {
            let instance = factory
                .get_instance(name)
                .with_context(|| format!("Failed to provision '{}'", name))?;
            report_and_dispose(&factory, instance)?;
        }
        ["random"] => {
            let instance = factory.get_random_instance().context("Failed to provision")?;
            report_and_dispose(&factory, instance)?;
        }
        other => bail!("Unknown command {:?}, expected list, provision NAME or random", other),
    }

    Ok(())
}

fn report_and_dispose(factory: &InstanceFactory, mut instance: Instance) -> Result<()> {
    let folder = instance.world_folder()?;
    println!(
        "{} -> {} ({} spawns, {} bytes)",
        instance.name()?,
        folder.display(),
        instance.spawns()?.len(),
        tree_size(folder)?
    );
    factory.dispose(&mut instance, true)?;
    Ok(())
}
