use std::path::PathBuf;

use clap::Parser;

use crate::config::ResourceConfig;
use crate::item::Recursion;

#[derive(Parser, Debug)]
#[command(name = "resfind")]
#[command(version)]
#[command(about = "Find resources in directories, ZIP/JAR and TAR archives and SFTP servers", long_about = None)]
#[command(after_help = "Examples:\n  \
  resfind -p assets -p lib/app.jar config/app.toml     first match, searched in order\n  \
  resfind -r -e png -p assets.tar.gz                   every .png anywhere in the archive\n  \
  resfind --cat -p jar:https://example.com/x.jar!/ META-INF/MANIFEST.MF")]
pub struct Cli {
    /// Resource name to look up (relative, `/` or `\\` separated)
    #[arg(value_name = "NAME", required_unless_present = "extension")]
    pub name: Option<String>,

    /// Directory, archive or URI to search; repeat to search several, in order
    #[arg(short = 'p', long = "path", value_name = "PATH", required = true)]
    pub paths: Vec<String>,

    /// List every match instead of the first one
    #[arg(short = 'a', long)]
    pub all: bool,

    /// Find every resource with this extension instead of a name
    #[arg(short = 'e', long, value_name = "EXT", conflicts_with = "name")]
    pub extension: Option<String>,

    /// Search whole subtrees, not just the named directory
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Write the first match to stdout
    #[arg(long, conflicts_with = "all")]
    pub cat: bool,

    /// Extra directories or archives to scan for `.extension` descriptors
    #[arg(long, value_name = "PATH")]
    pub extension_path: Vec<PathBuf>,

    /// More logging (-vv for trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Less logging (-qq => none)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn recursion(&self) -> Recursion {
        if self.recursive {
            Recursion::Recursive
        } else {
            Recursion::NonRecursive
        }
    }

    /// Default log directive when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match (self.verbose, self.quiet) {
            (_, q) if q > 1 => "off",
            (_, 1) => "error",
            (0, _) => "warn",
            (1, _) => "debug",
            _ => "trace",
        }
    }

    /// Environment defaults overlaid with the command line.
    pub fn config(&self) -> ResourceConfig {
        let mut config = ResourceConfig::from_env();
        config.recursion = self.recursion();
        config.extension_path.extend(self.extension_path.iter().cloned());
        config
    }
}
