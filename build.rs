// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn packages_arg(help: &'static str) -> Arg {
    Arg::new("packages").num_args(0..).help(help)
}

fn build_cli() -> Command {
    Command::new("repkg")
        .version(env!("CARGO_PKG_VERSION"))
        .author("repkg Contributors")
        .about("Automatically rebuild packages after their dependencies were updated")
        .subcommand_required(false)
        .arg(
            Arg::new("config")
                .global(true)
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Configuration file (default: $REPKG_CONFIG or /etc/repkg/config.toml)"),
        )
        .arg(
            Arg::new("db_path")
                .global(true)
                .long("db-path")
                .value_name("PATH")
                .help("Path to the state database"),
        )
        .arg(
            Arg::new("verbose")
                .global(true)
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Log more details (repeat for more)"),
        )
        .arg(
            Arg::new("quiet")
                .global(true)
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .help("Only log errors"),
        )
        .subcommand(Command::new("rebuild").about("Rebuild all pending packages (default command)"))
        .subcommand(
            Command::new("update")
                .about("Mark packages as updated and propagate rebuild triggers")
                .arg(packages_arg("Packages that were installed or upgraded"))
                .arg(
                    Arg::new("stdin")
                        .long("stdin")
                        .action(ArgAction::SetTrue)
                        .help("Also read package names from stdin"),
                ),
        )
        .subcommand(
            Command::new("create")
                .about("Create a rule file for a package")
                .arg(Arg::new("package").required(true).help("Package that needs rebuilding"))
                .arg(
                    Arg::new("dependencies")
                        .num_args(0..)
                        .help("Trigger packages, each as name or name=scope"),
                )
                .arg(
                    Arg::new("auto")
                        .short('a')
                        .long("auto")
                        .action(ArgAction::SetTrue)
                        .help("Append the package's installed dependencies"),
                ),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove the rule files of packages")
                .arg(packages_arg("Packages whose rules should be removed").num_args(1..).required(true)),
        )
        .subcommand(
            Command::new("list").about("List packages pending a rebuild").arg(
                Arg::new("detail")
                    .short('d')
                    .long("detail")
                    .action(ArgAction::SetTrue)
                    .help("Show what triggered each rebuild"),
            ),
        )
        .subcommand(
            Command::new("rules")
                .about("List the loaded rules")
                .arg(
                    Arg::new("short")
                        .short('s')
                        .long("short")
                        .action(ArgAction::SetTrue)
                        .help("Only print the package names"),
                )
                .arg(
                    Arg::new("user")
                        .short('u')
                        .long("user")
                        .action(ArgAction::SetTrue)
                        .help("Only show rules of the caller's tier"),
                ),
        )
        .subcommand(
            Command::new("clear")
                .about("Forget pending rebuilds, all of them if no package is given")
                .arg(packages_arg("Packages to remove from the pending list")),
        )
        .subcommand(
            Command::new("frontend")
                .about("Show or configure the rebuild frontend")
                .arg(
                    Arg::new("set")
                        .long("set")
                        .action(ArgAction::SetTrue)
                        .requires("tool")
                        .help("Store TOOL as the frontend"),
                )
                .arg(
                    Arg::new("waved")
                        .long("waved")
                        .action(ArgAction::SetTrue)
                        .help("Run the frontend once per wave"),
                )
                .arg(
                    Arg::new("reset")
                        .long("reset")
                        .action(ArgAction::SetTrue)
                        .conflicts_with_all(["set", "waved"])
                        .help("Go back to the automatically detected frontend"),
                )
                .arg(
                    Arg::new("tool")
                        .num_args(0..)
                        .trailing_var_arg(true)
                        .allow_hyphen_values(true)
                        .requires("set")
                        .help("Frontend command line; package names are appended"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let cli = build_cli();
    // same argument graph checks as `Cli::command().debug_assert()` in the cli tests
    cli.clone().debug_assert();

    let man = Man::new(cli);
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("repkg.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
