// src/main.rs

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use gumshield::archive::ARCHIVE_FILE_EXTENSION;
use gumshield::fetch::SourceClient;
use gumshield::ops::{self, BuildOptions, InstallOptions, UninstallOptions};
use gumshield::{Config, PackageDefinition, show};
use std::io;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "gumshield")]
#[command(author, version, about = "Source-based package builder and installer", long_about = None)]
struct Cli {
    /// Configuration file (default: /etc/gumshield.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Installed-package index directory
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a package archive from a definition file
    Build {
        /// Path to the package definition file
        definition_file: PathBuf,
        /// Output archive (default: <name>.tar in the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Build directory
        #[arg(short, long)]
        build_dir: Option<PathBuf>,
        /// Fake root directory
        #[arg(short, long)]
        fake_root_dir: Option<PathBuf>,
        /// Temp directory
        #[arg(short, long)]
        temp_dir: Option<PathBuf>,
        /// Look for sources in this directory before downloading them
        #[arg(long)]
        sources_dir: Option<PathBuf>,
        /// Print output from build scripts
        #[arg(short, long)]
        verbose: bool,
    },
    /// Install a package from an archive file
    Install {
        /// Path to the package archive
        #[arg(value_parser = existing_file)]
        archive_file: PathBuf,
        /// Install root directory
        #[arg(long)]
        root: Option<PathBuf>,
        /// Do not record the package in the index
        #[arg(long)]
        disable_index: bool,
        /// Print output from install scripts
        #[arg(short, long)]
        verbose: bool,
    },
    /// Uninstall an installed package
    Uninstall {
        /// Package name
        package_name: String,
        /// Install root directory
        #[arg(long)]
        root: Option<PathBuf>,
        /// Print output from the uninstall script
        #[arg(short, long)]
        verbose: bool,
    },
    /// Display information
    Show {
        #[command(subcommand)]
        what: ShowCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ShowCommands {
    /// Show installed packages
    Installed,
    /// Show package files
    Files { package_name: String },
    /// Show package information
    Package { package_name: String },
    /// Show package lifecycle scripts
    Triggers { package_name: String },
    /// Show effective configuration
    Config,
}

fn existing_file(path: &str) -> std::result::Result<PathBuf, String> {
    let path = PathBuf::from(path);
    match path.metadata() {
        Ok(meta) if meta.is_dir() => Err(format!("{} is a directory", path.display())),
        Ok(_) => Ok(path),
        Err(e) => Err(format!("{}: {}", path.display(), e)),
    }
}

/// Default archive path for a package: `<name>.tar` in the current directory
fn default_output(name: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", name, ARCHIVE_FILE_EXTENSION))
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(index_dir) = &cli.index_dir {
        config.index_dir = index_dir.clone();
    }
    Ok(config)
}

fn override_path(target: &mut PathBuf, value: Option<PathBuf>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Build {
            definition_file,
            out,
            build_dir,
            fake_root_dir,
            temp_dir,
            sources_dir,
            verbose,
        } => {
            override_path(&mut config.build_dir, build_dir);
            override_path(&mut config.fake_root_dir, fake_root_dir);
            override_path(&mut config.temp_dir, temp_dir);

            let definition = PackageDefinition::from_file(&definition_file)
                .with_context(|| format!("Failed to load {}", definition_file.display()))?;
            let output = out.unwrap_or_else(|| default_output(&definition.name));

            let mut options = BuildOptions::from_config(&config, &output)?;
            options.sources_dir = sources_dir;
            options.verbose = verbose;

            let client = SourceClient::new()?;
            let built = ops::build(definition, &options, &client)?;
            println!(
                "Built package: {} version {} ({} files)",
                built.name,
                built.version,
                built.files.len()
            );
            println!("  Archive: {}", options.output.display());
            Ok(())
        }
        Commands::Install {
            archive_file,
            root,
            disable_index,
            verbose,
        } => {
            override_path(&mut config.root_dir, root);
            info!("Installing package: {}", archive_file.display());

            let index = gumshield::index::open(&config)?;
            let mut options = InstallOptions::from_config(&config)?;
            options.register = !disable_index;
            options.verbose = verbose;

            let installed = ops::install(&archive_file, index.as_ref(), &options)?;
            println!(
                "Installed package: {} version {}",
                installed.name, installed.version
            );
            println!("  Files: {}", installed.files.len());
            Ok(())
        }
        Commands::Uninstall {
            package_name,
            root,
            verbose,
        } => {
            override_path(&mut config.root_dir, root);
            info!("Removing package: {}", package_name);

            let index = gumshield::index::open(&config)?;
            let mut options = UninstallOptions::from_config(&config)?;
            options.verbose = verbose;

            let removed = ops::uninstall(&package_name, index.as_ref(), &options)?;
            println!(
                "Removed package: {} version {}",
                removed.name, removed.version
            );
            println!("  Files: {}", removed.files.len());
            Ok(())
        }
        Commands::Show { what } => {
            let mut stdout = io::stdout().lock();
            let open_index = || gumshield::index::open(&config);
            match what {
                ShowCommands::Installed => show::installed(open_index()?.as_ref(), &mut stdout)?,
                ShowCommands::Files { package_name } => {
                    show::files(open_index()?.as_ref(), &package_name, &mut stdout)?
                }
                ShowCommands::Package { package_name } => {
                    show::package(open_index()?.as_ref(), &package_name, &mut stdout)?
                }
                ShowCommands::Triggers { package_name } => {
                    show::triggers(open_index()?.as_ref(), &package_name, &mut stdout)?
                }
                ShowCommands::Config => show::config(&config, &mut stdout)?,
            }
            Ok(())
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "gumshield", &mut io::stdout());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_output() {
        assert_eq!(default_output("foo"), Path::new("foo.tar"));
    }

    #[test]
    fn test_existing_file_validation() {
        let dir = tempfile::tempdir().unwrap();
        assert!(existing_file(dir.path().to_str().unwrap()).is_err());
        assert!(existing_file("/nonexistent/archive.tar").is_err());

        let file = dir.path().join("pkg.tar");
        std::fs::write(&file, b"").unwrap();
        assert_eq!(existing_file(file.to_str().unwrap()).unwrap(), file);
    }

    #[test]
    fn test_parse_build_command() {
        let cli = Cli::parse_from([
            "gumshield",
            "build",
            "foo.elplan",
            "-o",
            "out.tar",
            "--sources-dir",
            "/srv/sources",
            "-v",
        ]);
        match cli.command {
            Commands::Build {
                definition_file,
                out,
                sources_dir,
                verbose,
                ..
            } => {
                assert_eq!(definition_file, PathBuf::from("foo.elplan"));
                assert_eq!(out, Some(PathBuf::from("out.tar")));
                assert_eq!(sources_dir, Some(PathBuf::from("/srv/sources")));
                assert!(verbose);
            }
            _ => panic!("expected build command"),
        }
    }
}
