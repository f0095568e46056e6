use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use statsd_rewrite_proxy::{load_rules, Args, DogStatsdBackend, Relay, RelayResult, RuleSet};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Some(descriptor) = args.expvar_descriptor() {
        print!("{descriptor}");
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> RelayResult<()> {
    let rules = match &args.rules {
        Some(path) => {
            let rules = load_rules(path)?;
            info!("Loaded {} rules from {}", rules.len(), path.display());
            rules
        }
        None => {
            warn!("No rule file given, every metric passes through unchanged");
            RuleSet::default()
        }
    };

    let backend = DogStatsdBackend::connect(
        args.backend_bind_addr(),
        args.backend,
        args.backend_options(),
    )?;

    let options = args.relay_options();
    let workers = options.worker_count();
    let relay = Relay::start(options, rules, Arc::new(backend))?;

    info!(
        "Listening on {} with {workers} workers, forwarding to {}",
        relay.local_addr(),
        args.backend
    );

    relay.wait();
    Ok(())
}
