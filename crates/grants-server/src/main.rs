//! grants-ui server binary

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use grants_config::{AppConfig, LogConfig};
use grants_server::{init_tracing, serve, VERSION};

#[tokio::main]
async fn main() {
    let cli = Command::new("grants-ui")
        .version(VERSION)
        .about("Grant application frontend")
        .subcommand(
            Command::new("serve")
                .about("Serve the application (default)")
                .arg(
                    Arg::new("port")
                        .long("port")
                        .value_parser(value_parser!(u16))
                        .help("Override PORT"),
                ),
        )
        .subcommand(
            Command::new("check-config")
                .about("Load and validate configuration, then exit")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the effective configuration as JSON"),
                ),
        );

    let matches = cli.get_matches();

    if let Err(err) = run(&matches).await {
        tracing::error!(error = %format!("{err:#}"), "grants-ui failed");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let log = config
        .as_ref()
        .map_or_else(|_| LogConfig::default(), |c| c.log.clone());
    init_tracing(&log)?;
    let mut config = config.context("invalid configuration")?;

    match matches.subcommand() {
        Some(("check-config", args)) => {
            config.log_summary();
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            Ok(())
        }
        Some(("serve", args)) => {
            if let Some(port) = args.get_one::<u16>("port") {
                config.server.port = *port;
            }
            serve(config).await
        }
        _ => serve(config).await,
    }
}
