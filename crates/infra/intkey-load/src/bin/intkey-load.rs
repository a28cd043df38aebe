use anyhow::Result;
use clap::{Parser, error::ErrorKind};
use intkey_client::HttpEndpointClient;
use intkey_load::load_test::{
    LoadTest, LoadTestError,
    config::{LoadArgs, LogFormat},
    metrics::save_results,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(args: &LoadArgs) {
    let filter = EnvFilter::new(args.log_level.to_string());
    match args.log_format {
        LogFormat::Json => {
            tracing_subscriber::fmt().json().with_env_filter(filter).with_ansi(false).init()
        }
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn run(args: &LoadArgs, test: &mut LoadTest<HttpEndpointClient, ChaCha8Rng>) -> Result<()> {
    test.populate(args.keys).await?;
    test.validate().await?;
    test.run_rounds(args.keys, args.rounds, args.interval()).await?;
    if args.missing_dep {
        test.run_with_missing_dependency(args.keys, 1).await?;
    }
    test.validate().await?;
    test.ledger_state().await?;
    Ok(())
}

/// Returns the run's error first; a failed results write only surfaces after a clean run.
fn settle(outcome: Result<()>, saved: Result<(), LoadTestError>) -> Result<()> {
    if let Err(e) = &saved {
        error!(error = %e, "failed to save results");
    }
    outcome.and(saved.map_err(Into::into))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = match LoadArgs::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            // clap already explains the offending argument
            let _ = e.print();
            std::process::exit(1);
        }
    };

    init_tracing(&args);

    let urls = args.endpoint_urls();
    info!(
        count = args.count,
        url = %args.url,
        port = args.port,
        keys = args.keys,
        rounds = args.rounds,
        interval_ms = args.interval,
        missing_dep = args.missing_dep,
        ?urls,
        "testing transaction load"
    );

    let rng = match args.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let mut test = LoadTest::connect(&urls, args.client_config(), rng, args.load_test_config())?;

    let outcome = run(&args, &mut test).await;
    if let Err(e) = &outcome {
        error!(error = %e, "load test failed");
    }

    match args.output.as_ref() {
        Some(path) => settle(outcome, save_results(&test.results(args.test_config()), path)),
        None => outcome,
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn test_run_error_wins_over_save_error() {
        let err = settle(Err(anyhow!("state validation failed")), Err(LoadTestError::NoEndpoints))
            .unwrap_err();
        assert_eq!(err.to_string(), "state validation failed");
    }

    #[test]
    fn test_save_error_surfaces_after_clean_run() {
        let err = settle(Ok(()), Err(LoadTestError::NoEndpoints)).unwrap_err();
        assert!(matches!(err.downcast_ref::<LoadTestError>(), Some(LoadTestError::NoEndpoints)));
    }

    #[test]
    fn test_clean_run_and_save() {
        settle(Ok(()), Ok(())).unwrap();
    }
}
