use talos_runner::{RobotService, RunnerConfig};

fn print_help() {
    eprintln!(
        r#"Talos Runner - trading robot execution engine

USAGE:
    talos-runner [OPTIONS]

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter (default: info)

EXAMPLES:
    # Run with the built-in robots and simulator
    talos-runner

    # Run with config file
    talos-runner --config robots.json
"#
    );
}

/// What the command line asked for
#[derive(Debug, PartialEq, Eq)]
enum Invocation {
    Help,
    Run { config_path: Option<String> },
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Invocation, String> {
    let mut args = args.into_iter();
    let mut config_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Invocation::Help),
            "--config" | "-c" => match args.next() {
                Some(path) => config_path = Some(path),
                None => return Err("--config requires a path argument".to_string()),
            },
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }

    Ok(Invocation::Run { config_path })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = match parse_args(std::env::args().skip(1)) {
        Ok(Invocation::Help) => {
            print_help();
            return Ok(());
        }
        Ok(Invocation::Run { config_path }) => config_path,
        Err(message) => {
            eprintln!("Error: {}", message);
            print_help();
            std::process::exit(1);
        }
    };

    let config = match config_path {
        Some(path) => {
            log::info!("Loading configuration from: {}", path);
            RunnerConfig::from_file(&path)?
        }
        None => {
            log::info!("Using default configuration");
            RunnerConfig::default()
        }
    };
    log::info!("Robots: {}", config.robots.len());
    log::info!("Tickers: {}", config.simulator.tickers.len());

    let service = RobotService::new(config);
    let clean = service
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await?;

    if !clean {
        log::warn!("Some robots were still running when the grace period expired");
    }
    log::info!("Shutdown complete");
    Ok(())
}
