//! `watch`: drive `Monitor::update` on an interval until Ctrl-C or `--count`.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use web888_core::{Monitor, Snapshot, clamp_poll_interval};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output::{self, Painter};

use super::status;

fn render_tick(
    snapshot: &Snapshot,
    global: &GlobalOpts,
    painter: Painter,
) -> Result<String, CliError> {
    match global.output {
        OutputFormat::Table => Ok(status::summary_line(snapshot, painter)),
        // One JSON document per line.
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(snapshot, true),
        OutputFormat::Yaml => output::render_yaml(snapshot).map(|doc| format!("---\n{doc}")),
    }
}

pub async fn handle(
    args: WatchArgs,
    resolved: Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let address = resolved.address();
    let Resolved {
        profile_name,
        config,
    } = resolved;

    let period: Duration = args
        .interval
        .map_or(config.poll_interval, clamp_poll_interval);
    let monitor =
        Monitor::new(config).map_err(|e| CliError::from_core(e, &address, &profile_name))?;
    let painter = Painter::new(&global.color);

    info!(
        %address,
        mode = %monitor.mode(),
        interval_secs = period.as_secs(),
        "watching receiver"
    );

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut ticks: u64 = 0;
    let mut last_error = None;
    loop {
        let result = tokio::select! {
            biased;
            _ = &mut ctrl_c => {
                info!("interrupted, shutting down");
                break;
            }
            _ = ticker.tick() => {
                tokio::select! {
                    biased;
                    _ = &mut ctrl_c => {
                        info!("interrupted, shutting down");
                        break;
                    }
                    r = monitor.update() => r,
                }
            }
        };

        match result {
            Ok(snapshot) => {
                last_error = None;
                let out = render_tick(&snapshot, global, painter)?;
                output::print_output(&out, global.quiet);
            }
            Err(e) => {
                let err = CliError::from_core(e, &address, &profile_name);
                if matches!(err, CliError::AuthFailed { .. }) {
                    monitor.shutdown().await;
                    return Err(err);
                }
                warn!(error = %err, "update failed");
                eprintln!("{}", painter.bad(&format!("✗ {err}")));
                last_error = Some(err);
            }
        }

        ticks += 1;
        if args.count.is_some_and(|n| ticks >= n) {
            break;
        }
    }

    monitor.shutdown().await;
    last_error.map_or(Ok(()), Err)
}
