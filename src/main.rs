use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use clap::{arg, crate_version, value_parser, ArgAction, ArgMatches, Command};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use beacon::commit::CommandCommitAction;
use beacon::config::{Config, WatchConfig};
use beacon::indicator::Indicator;
use beacon::monitor::StatusMonitor;
use beacon::presenter::ChannelPresenter;
use beacon::query;
use beacon::status::StatusTuple;
use beacon::workspace::Workspace;

fn cli() -> Command {
    let dir_arg =
        arg!([dir] "The directory to use. Defaults to the current directory")
            .value_parser(value_parser!(PathBuf));

    Command::new("beacon")
        .about("A light that tells you whether your work is committed and pushed.")
        .version(crate_version!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("watch")
                .about("Add a directory to the monitored workspace")
                .arg(dir_arg.clone())
                .arg(
                    arg!(-i --include <include> "Overrides excludes by re-including these subdirectories")
                        .value_delimiter(',')
                        .action(ArgAction::Append)
                        .required(false),
                )
                .arg(
                    arg!(-e --exclude <exclude> "Excludes these subdirectories from repository discovery")
                        .value_delimiter(',')
                        .action(ArgAction::Append)
                        .required(false),
                )
                .arg(
                    arg!(-d --maxdepth <max_depth> "Maximum depth to search for repositories")
                        .value_parser(value_parser!(u8))
                        .default_value("255")
                        .required(false),
                ),
        )
        .subcommand(
            Command::new("unwatch")
                .about("Remove a directory from the monitored workspace")
                .arg(dir_arg),
        )
        .subcommand(
            Command::new("status")
                .about("Query every repository once and print the status")
                .arg(arg!(--json "Print the status as JSON")),
        )
        .subcommand(
            Command::new("serve")
                .about("Keep polling and print the indicator whenever it changes")
                .arg(
                    arg!(--interval <secs> "Seconds between polls. Overrides the config file")
                        .value_parser(value_parser!(u64))
                        .required(false),
                ),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("watch", arg_matches)) => watch_dir(arg_matches),
        Some(("unwatch", arg_matches)) => unwatch_dir(arg_matches),
        Some(("status", arg_matches)) => print_status(arg_matches.get_flag("json")).await,
        Some(("serve", arg_matches)) => {
            serve(arg_matches.get_one::<u64>("interval").copied()).await
        }
        _ => unreachable!(),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("BEACON_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn config_error(e: Box<dyn Error>) -> anyhow::Error {
    anyhow!("{e}")
}

fn target_dir(matches: &ArgMatches) -> anyhow::Result<PathBuf> {
    match matches.get_one::<PathBuf>("dir") {
        Some(dir) => Ok(dir.clone()),
        None => Ok(env::current_dir()?),
    }
}

fn strings(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn watch_dir(matches: &ArgMatches) -> anyhow::Result<()> {
    let dir = target_dir(matches)?;
    let cfg = WatchConfig {
        include: strings(matches, "include"),
        exclude: strings(matches, "exclude"),
        max_depth: matches.get_one::<u8>("maxdepth").copied().unwrap_or(255),
    };

    let mut config = Config::load_for_update().map_err(config_error)?;
    if config.set_watch(&dir, cfg).map_err(config_error)? {
        config.save().map_err(config_error)?;
        println!("Started watching {}", dir.display());
    } else {
        println!("{} is already being watched", dir.display());
    }
    Ok(())
}

fn unwatch_dir(matches: &ArgMatches) -> anyhow::Result<()> {
    let dir = target_dir(matches)?;
    let mut config = Config::load_for_update().map_err(config_error)?;
    if config.set_unwatch(&dir).map_err(config_error)? {
        config.save().map_err(config_error)?;
        println!("Stopped watching {}", dir.display());
    } else {
        println!("{} is not being watched", dir.display());
    }
    Ok(())
}

async fn print_status(json: bool) -> anyhow::Result<()> {
    let config = Config::load();
    if config.workspaces.is_empty() {
        eprintln!("Nothing is being watched yet. Run `beacon watch` inside a repository.");
    }

    let workspace = config.workspace();
    let vcs = config.backend.build();
    let status = tokio::task::spawn_blocking(move || {
        query::aggregate_status(vcs.as_ref(), &workspace.repositories())
    })
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{}", Indicator::detect().line(&status));
    }
    Ok(())
}

async fn serve(interval: Option<u64>) -> anyhow::Result<()> {
    let config = Config::load();
    let period = interval
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| config.poll_interval());

    let (presenter, mut updates) = ChannelPresenter::new();
    let monitor = StatusMonitor::new(Arc::new(config.workspace()), config.backend.build(), Arc::new(presenter))
        .with_period(period)
        .with_commit_action(Arc::new(CommandCommitAction::new(config.commit_command())));

    let indicator = Indicator::detect();
    println!("{}", indicator.line(&StatusTuple::CLEAN));
    println!("Commands: c = commit, r = refresh, q = quit");
    monitor.start();

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(event) = updates.recv() => {
                println!(
                    "{} {}",
                    event.changed_at.format("%H:%M:%S"),
                    indicator.line(&event.status)
                );
            }
            line = input.next_line(), if input_open => match line {
                Ok(Some(cmd)) => match cmd.trim() {
                    "c" => {
                        if let Err(e) = tokio::task::block_in_place(|| monitor.click()) {
                            warn!("{e:#}");
                        }
                    }
                    "r" => monitor.refresh(),
                    "q" => break,
                    "" => {}
                    other => eprintln!("Unknown command {other:?}"),
                },
                // stdin closed or unreadable; keep serving until Ctrl-C
                Ok(None) | Err(_) => input_open = false,
            },
            _ = &mut shutdown => break,
        }
    }

    monitor.dispose().await;
    Ok(())
}
