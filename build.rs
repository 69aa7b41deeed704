// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn verbose_arg(help: &'static str) -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::SetTrue)
        .help(help)
}

fn root_arg() -> Arg {
    Arg::new("root")
        .long("root")
        .value_name("PATH")
        .help("Install root directory")
}

fn package_name_arg() -> Arg {
    Arg::new("package_name").required(true).help("Package name")
}

fn build_cli() -> Command {
    Command::new("gumshield")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Gumshield Contributors")
        .about("Source-based package builder and installer")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .global(true)
                .help("Configuration file (default: /etc/gumshield.toml if present)"),
        )
        .arg(
            Arg::new("index_dir")
                .long("index-dir")
                .value_name("PATH")
                .global(true)
                .help("Installed-package index directory"),
        )
        .subcommand(
            Command::new("build")
                .about("Build a package archive from a definition file")
                .arg(
                    Arg::new("definition_file")
                        .required(true)
                        .help("Path to the package definition file"),
                )
                .arg(
                    Arg::new("out")
                        .short('o')
                        .long("out")
                        .value_name("PATH")
                        .help("Output archive (default: <name>.tar in the current directory)"),
                )
                .arg(
                    Arg::new("build_dir")
                        .short('b')
                        .long("build-dir")
                        .value_name("PATH")
                        .help("Build directory"),
                )
                .arg(
                    Arg::new("fake_root_dir")
                        .short('f')
                        .long("fake-root-dir")
                        .value_name("PATH")
                        .help("Fake root directory"),
                )
                .arg(
                    Arg::new("temp_dir")
                        .short('t')
                        .long("temp-dir")
                        .value_name("PATH")
                        .help("Temp directory"),
                )
                .arg(
                    Arg::new("sources_dir")
                        .long("sources-dir")
                        .value_name("PATH")
                        .help("Look for sources in this directory before downloading them"),
                )
                .arg(verbose_arg("Print output from build scripts")),
        )
        .subcommand(
            Command::new("install")
                .about("Install a package from an archive file")
                .arg(
                    Arg::new("archive_file")
                        .required(true)
                        .help("Path to the package archive"),
                )
                .arg(root_arg())
                .arg(
                    Arg::new("disable_index")
                        .long("disable-index")
                        .action(ArgAction::SetTrue)
                        .help("Do not record the package in the index"),
                )
                .arg(verbose_arg("Print output from install scripts")),
        )
        .subcommand(
            Command::new("uninstall")
                .about("Uninstall an installed package")
                .arg(package_name_arg())
                .arg(root_arg())
                .arg(verbose_arg("Print output from the uninstall script")),
        )
        .subcommand(
            Command::new("show")
                .about("Display information")
                .subcommand_required(true)
                .subcommand(Command::new("installed").about("Show installed packages"))
                .subcommand(
                    Command::new("files")
                        .about("Show package files")
                        .arg(package_name_arg()),
                )
                .subcommand(
                    Command::new("package")
                        .about("Show package information")
                        .arg(package_name_arg()),
                )
                .subcommand(
                    Command::new("triggers")
                        .about("Show package lifecycle scripts")
                        .arg(package_name_arg()),
                )
                .subcommand(Command::new("config").about("Show effective configuration")),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("gumshield.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
