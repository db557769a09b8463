// Run command - replay an event log through the reporter fan-out

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cli::args::RunArgs;
use crate::config::{self, Config};
use crate::events::{EventSource, Runner, read_events};
use crate::multi::{
    Fanout, OptionMap, OutputRedirector, ReporterRegistry, ReporterSpec, parse_setup,
    resolve_setup,
};
use crate::state::RunStats;
use crate::utils::FileUtils;

/// Exit code after an interrupt (128 + SIGINT)
pub const EXIT_INTERRUPTED: i32 = 130;

/// Resolve the setup: `--reporters`, then the config table, then `$multi`
pub fn resolve_reporters(
    flag: Option<&str>,
    config: Option<&Config>,
    env: Option<&str>,
) -> crate::error::Result<Vec<ReporterSpec>> {
    if let Some(definition) = flag {
        debug!("Using reporters from --reporters");
        return parse_setup(definition);
    }
    resolve_setup(config.map(|c| &c.reporters), env)
}

/// Config `[options]` overlaid by `--option` flags
pub fn shared_options(config: Option<&Config>, overrides: &[(String, String)]) -> OptionMap {
    let mut options = config.map(|c| c.options.clone()).unwrap_or_default();
    for (key, value) in overrides {
        options.insert(key.clone(), value.clone());
    }
    options
}

/// Replay the event log into every configured reporter and return the exit
/// code the process must terminate with.
pub async fn run_reporters(args: &RunArgs, config: Option<&Config>) -> Result<i32> {
    let env_setup = std::env::var(config::ENV_MULTI).ok();
    let setup = resolve_reporters(args.reporters.as_deref(), config, env_setup.as_deref())?;
    let options = shared_options(config, &args.options);

    let reader = FileUtils::open_input(args.events.as_deref())?;
    let events = read_events(reader).context("Failed to read event log")?;
    info!("Replaying {} event(s) into {} reporter(s)", events.len(), setup.len());

    let runner = Arc::new(Runner::new());
    let source: Arc<dyn EventSource> = runner.clone();
    let registry = ReporterRegistry::new();
    let fanout = Fanout::new(
        source,
        &setup,
        &options,
        &registry,
        OutputRedirector::stdio(),
    )?;

    // The first interrupt halts the replay so done hooks only ever run on
    // this task; a second one exits without waiting.
    let interrupt = {
        let runner = runner.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            warn!("Interrupted, draining reporters");
            runner.halt();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(EXIT_INTERRUPTED);
            }
        })
    };

    let failures = runner.replay(&events);
    let (failures, code) = if runner.is_halted() {
        (failures, fanout.drain(EXIT_INTERRUPTED, failures).await)
    } else {
        let failures = fanout.done(failures).await;
        let stats = RunStats {
            failures,
            ..Default::default()
        };
        (failures, fanout.drain(stats.exit_code(), failures).await)
    };

    interrupt.abort();
    debug!("Run finished with {} failure(s), exit code {}", failures, code);
    Ok(code)
}
