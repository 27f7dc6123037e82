use clap::Parser;
use env_logger::{Builder, Env, Target};
use log::{error, info};
use std::panic::{self, PanicHookInfo};
use thermistor_poller::app::{Options, RunError, RunOutcome, run_with_io};
use thermistor_poller::client::HttpFetcher;
use thermistor_poller::clock::TokioSleeper;
use thermistor_poller::scheduler::EnabledFlag;

/// Exit codes for the application
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_PANIC: i32 = 2;
const EXIT_INTERRUPTED: i32 = 130;

/// Log to stderr so stdout carries only readings.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .target(Target::Stderr)
        .init();
}

/// Clear `flag` on the first Ctrl-C so the poll in flight can complete;
/// exit on the second.
fn stop_on_ctrl_c(flag: EnabledFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        info!("Interrupted, stopping after the current poll (Ctrl-C again to quit)");
        flag.disable();

        if tokio::signal::ctrl_c().await.is_ok() {
            error!("Interrupted twice, exiting");
            std::process::exit(EXIT_INTERRUPTED);
        }
    });
}

async fn run(options: Options) -> Result<RunOutcome, RunError> {
    let fetcher = HttpFetcher::new(options.timeout)?;
    let flag = EnabledFlag::new();
    // A one-shot poll has nothing to stop early; keep the default SIGINT.
    if !options.once {
        stop_on_ctrl_c(flag.clone());
    }

    let mut out = std::io::stdout();
    let mut err = std::io::stderr();
    run_with_io(options, &fetcher, &TokioSleeper, flag, &mut out, &mut err).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set up panic hook to ensure clean exit codes for process managers
    // (e.g., systemd, Telegraf execd) that monitor exit status
    panic::set_hook(Box::new(move |info: &PanicHookInfo| {
        eprintln!("Panic! {}", info);
        std::process::exit(EXIT_PANIC);
    }));

    let options = Options::parse();
    init_logging(options.verbose);
    info!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match run(options).await {
        Ok(outcome) if outcome.is_success() => std::process::exit(EXIT_SUCCESS),
        Ok(outcome) => {
            error!("finished unsuccessfully: {outcome:?}");
            std::process::exit(EXIT_ERROR);
        }
        Err(why) => {
            error!("{why}");
            std::process::exit(EXIT_ERROR);
        }
    }
}
