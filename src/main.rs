//! Modrun - pluggable module dispatcher.
//!
//! Discovers self-describing tool modules and exposes every module command
//! as a CLI subcommand with typed flags.

use std::collections::HashMap;
use std::io;

use anyhow::Result;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use modrun::module::{cli as module_cli, Module, ModuleCommand, ModuleManager};
use modrun::Config;

/// Pluggable module dispatcher
#[derive(Parser)]
#[command(name = "modrun")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List all discovered modules
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Filter by source type (builtin, user, project, remote)
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Show details for one module
    Info {
        /// Module name
        name: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// Containerized terraform-tools wrapper. The process bridge spawns
    /// this; it runs the module's image with the working directory mounted.
    #[command(hide = true)]
    Tf {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Containerized ai-investigate wrapper, spawned by the process bridge.
    #[command(hide = true)]
    Ai {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging is initialized before argument parsing because the argument
    // tree itself depends on discovery, which already wants to log.
    let verbose = std::env::args().any(|a| a == "-v" || a == "--verbose");
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };
    tracing_subscriber::registry().with(fmt::layer().with_target(false).with_writer(std::io::stderr)).with(filter).init();

    let config = Config::load()?;
    let manager = ModuleManager::new(&config.modules);
    manager.load().await;
    let modules = manager.modules();

    // Register one root-level subcommand per discovered module command.
    // First-seen command names win, same rule as the catalog, and a name
    // already taken by the static surface is skipped rather than letting
    // clap reject the duplicate.
    let mut root = Cli::command();
    let mut bindings: HashMap<String, (usize, usize)> = HashMap::new();
    for (module_idx, module) in modules.iter().enumerate() {
        for (command_idx, command) in module.spec.commands.iter().enumerate() {
            let name = command.name.as_str();
            if name == "help" || root.find_subcommand(name).is_some() {
                tracing::warn!(
                    module = %module.metadata.name,
                    command = name,
                    "Skipping module command that shadows an existing subcommand"
                );
                continue;
            }
            root = root.subcommand(module_cli::subcommand_for(command));
            bindings.insert(name.to_string(), (module_idx, command_idx));
        }
    }
    let completion_root = root.clone();

    let matches = root.get_matches();

    if let Some((name, sub_matches)) = matches.subcommand() {
        if let Some(&(module_idx, command_idx)) = bindings.get(name) {
            let module = &modules[module_idx];
            let spec = &module.spec.commands[command_idx];
            let exit_code = run_module_command(&manager, module, spec, sub_matches).await?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
            return Ok(());
        }
    }

    let cli = Cli::from_arg_matches(&matches)?;
    match cli.command {
        None => {
            cmd_list(&modules, "text", None)?;
        }
        Some(Commands::List { format, source }) => {
            cmd_list(&modules, &format, source.as_deref())?;
        }
        Some(Commands::Info { name }) => {
            cmd_info(&modules, &name)?;
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = completion_root;
            generate(shell, &mut cmd, "modrun", &mut io::stdout());
        }
        Some(Commands::Tf { args }) => {
            let code = run_wrapper(&modules, "terraform-tools", &args).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Some(Commands::Ai { args }) => {
            let code = run_wrapper(&modules, "ai-investigate", &args).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}

/// Run one dynamically registered module command and relay its output.
async fn run_module_command(
    manager: &ModuleManager,
    module: &Module,
    spec: &ModuleCommand,
    matches: &ArgMatches,
) -> Result<i32> {
    let flags = module_cli::decode_flags(spec, matches)?;
    let args = module_cli::free_args(matches);

    let result = manager.execute(&module.metadata.name, &spec.name, &args, &flags).await?;

    // Relay output verbatim before surfacing the exit code.
    if !result.stdout.is_empty() {
        print!("{}", result.stdout);
    }
    if !result.stderr.is_empty() {
        eprint!("{}", result.stderr);
    }

    Ok(result.exit_code)
}

/// Run a builtin module's container image with the working directory
/// mounted. This is the other end of the process bridge.
async fn run_wrapper(modules: &[Module], module_name: &str, args: &[String]) -> Result<i32> {
    let module = modules
        .iter()
        .find(|m| m.metadata.name == module_name)
        .ok_or_else(|| anyhow::anyhow!("module not found: {module_name}"))?;
    let docker = module
        .spec
        .docker
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("module '{module_name}' has no docker config"))?;

    let cwd = std::env::current_dir()?;
    let workdir = docker.working_dir.as_deref().unwrap_or("/workspace");

    let mut cmd = tokio::process::Command::new("docker");
    cmd.arg("run")
        .arg("--rm")
        .arg("-v")
        .arg(format!("{}:/workspace", cwd.display()))
        .arg("-w")
        .arg(workdir);

    let mut env_keys: Vec<_> = docker.env.keys().collect();
    env_keys.sort();
    for key in env_keys {
        cmd.arg("-e").arg(format!("{key}={}", docker.env[key]));
    }

    cmd.arg(&docker.image).args(args);

    let status = cmd
        .status()
        .await
        .map_err(|e| anyhow::anyhow!("failed to launch docker: {e}"))?;
    Ok(status.code().unwrap_or(1))
}

fn cmd_list(modules: &[Module], format: &str, source: Option<&str>) -> Result<()> {
    let filtered: Vec<&Module> = modules
        .iter()
        .filter(|m| source.map_or(true, |s| m.source == s))
        .collect();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&filtered)?);
        }
        _ => {
            if filtered.is_empty() {
                println!("No modules discovered.");
                return Ok(());
            }
            for module in filtered {
                let trust = if module.trusted { "trusted" } else { "untrusted" };
                println!(
                    "{} {} [{}, {}]",
                    module.metadata.name, module.metadata.version, module.source, trust
                );
                if !module.metadata.description.is_empty() {
                    println!("    {}", module.metadata.description);
                }
                for command in &module.spec.commands {
                    println!("    {} - {}", command.name, command.description);
                }
            }
        }
    }

    Ok(())
}

fn cmd_info(modules: &[Module], name: &str) -> Result<()> {
    let module = modules
        .iter()
        .find(|m| m.metadata.name == name)
        .ok_or_else(|| anyhow::anyhow!("module not found: {name}"))?;

    println!("{}", serde_json::to_string_pretty(module)?);
    Ok(())
}
