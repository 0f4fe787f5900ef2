//! `sweep` and `watch`: auto-reset from the command line.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::{Context, GlobalOptions};
use crate::config::parse_duration;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::sweep;

pub struct WatchOptions {
    pub interval: Option<String>,
    pub ticks: Option<u64>,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct SweepOutput {
    reset: Vec<Uuid>,
}

#[derive(Serialize)]
struct WatchOutput {
    interval_secs: u64,
    ticks: u64,
}

fn sweep_human(reset: &[Uuid], warning: Option<&str>) -> HumanOutput {
    let mut human = HumanOutput::new(if reset.is_empty() {
        "Nothing to reset"
    } else {
        "Checklists reset"
    });
    for id in reset {
        human.push_detail(id.to_string());
    }
    human.push_warning_opt(warning);
    human
}

pub fn run_sweep(global: GlobalOptions) -> Result<()> {
    let ctx = Context::load(&global)?;
    let outcome = ctx.store.sweep(Utc::now())?;
    let human = sweep_human(&outcome.value, outcome.warning.as_deref());
    emit_success(
        ctx.output,
        "sweep",
        &SweepOutput {
            reset: outcome.value,
        },
        Some(&human),
    )
}

pub fn run_watch(options: WatchOptions) -> Result<()> {
    let ctx = Context::load(&options.global)?;
    let interval = match options.interval.as_deref() {
        Some(text) => parse_duration(text)?,
        None => ctx.config.sweep_interval()?,
    };
    let output = ctx.output;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| Error::OperationFailed(format!("failed to start runtime: {err}")))?;

    tracing::info!(interval_secs = interval.as_secs(), "watching for due checklists");
    let ticks = runtime.block_on(sweep::watch(
        ctx.store,
        interval,
        options.ticks,
        |outcome| {
            if output.json || (outcome.value.is_empty() && outcome.warning.is_none()) {
                return;
            }
            let human = sweep_human(&outcome.value, outcome.warning.as_deref());
            if let Err(err) = emit_success(output, "watch", &(), Some(&human)) {
                tracing::warn!(error = %err, "failed to report sweep");
            }
        },
    ))?;

    let mut human = HumanOutput::new("Watch stopped");
    human.push_summary("Sweeps", ticks.to_string());
    emit_success(
        output,
        "watch",
        &WatchOutput {
            interval_secs: interval.as_secs(),
            ticks,
        },
        Some(&human),
    )
}
