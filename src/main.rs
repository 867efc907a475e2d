//! Main entry point for the resfind CLI application.
//!
//! Resolves every `--path` into a path item, runs one lookup across them in
//! order and prints the URIs of the matches, or streams the first match.

use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use resfind::{Cli, Resource, ResourceLoader};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let loader = ResourceLoader::new(cli.config());
    for path in &cli.paths {
        loader
            .add_path(path)
            .with_context(|| format!("cannot open {}", path))?;
    }

    let resources = lookup(&loader, &cli)?;
    if resources.is_empty() {
        bail!("no resource found");
    }

    if cli.cat {
        return cat(&resources[0]);
    }

    let mut stdout = io::stdout().lock();
    for resource in &resources {
        writeln!(stdout, "{}", resource)?;
    }
    Ok(())
}

/// Logs go to stderr so that `--cat` output stays clean.
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Run the lookup the command line asks for.
///
/// Name lookups return only the first match unless `-a` is given; extension
/// lookups always return every match.
fn lookup(loader: &ResourceLoader, cli: &Cli) -> Result<Vec<Resource>> {
    if let Some(extension) = &cli.extension {
        return Ok(loader.find_resources_for_extension(extension)?);
    }

    let Some(name) = &cli.name else {
        bail!("a resource name or --extension is required");
    };

    if cli.all {
        Ok(loader.find_resources(name)?)
    } else {
        Ok(loader.find_resource(name)?.into_iter().collect())
    }
}

fn cat(resource: &Resource) -> Result<()> {
    let mut stream = resource
        .open()
        .with_context(|| format!("cannot open {}", resource))?;
    let mut stdout = io::stdout().lock();
    io::copy(&mut stream, &mut stdout).with_context(|| format!("cannot read {}", resource))?;
    stdout.flush()?;
    Ok(())
}
