use anyhow::Context;
use carrier_core::cache::{AppliedSet, RedisAppliedSet};
use carrier_core::config::LoadConfig;
use carrier_core::controller::{IngestController, Progress, RunStatus};
use carrier_core::endpoint::SparqlEndpoint;
use carrier_core::faillog::FailureLog;
use carrier_core::signal::StopFile;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

struct BarProgress(ProgressBar);

impl Progress for BarProgress {
    fn on_unit(&mut self, name: &str, done: usize, total: usize) {
        self.0.set_length(total as u64);
        self.0.set_position(done as u64);
        self.0.set_message(name.to_string());
    }
}

pub fn run(config_path: &Path, quiet: bool, json: bool) -> anyhow::Result<()> {
    let cfg = LoadConfig::load(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    // The store is a hard dependency: without the applied-set there is no
    // resume guarantee, so an unreachable store aborts before any unit is
    // touched.
    let mut cache = RedisAppliedSet::open(&cfg.redis.url(), &cfg.redis.key)
        .context("cannot open the applied-set store, refusing to run without resume state")?;
    tracing::info!(already_applied = cache.all().len(), "opened applied-set store");

    let endpoint =
        SparqlEndpoint::with_timeout(&cfg.endpoint, Duration::from_secs(cfg.timeout_secs))?;
    let faillog = FailureLog::new(&cfg.failed_log);
    let signal = StopFile(cfg.stop_file.clone());

    let bar = if cfg.show_progress && !quiet && !json {
        ProgressBar::new(0)
    } else {
        ProgressBar::hidden()
    };
    bar.set_style(
        ProgressStyle::with_template("{prefix:8} [{bar:25}] {pos}/{len}  {msg}")?
            .progress_chars("=>-"),
    );
    bar.set_prefix("Loading");
    let mut progress = BarProgress(bar.clone());

    let mut controller = IngestController::new(&mut cache, &endpoint, &signal, &faillog);
    let report = controller.run(&cfg.units_dir, Some(&mut progress))?;
    bar.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if report.status == RunStatus::Stopped {
            println!(
                "Stopped early: {} is present. Remove it to resume.",
                cfg.stop_file.display()
            );
        }
        println!(
            "applied {}, skipped {}, rejected {}, deferred {}",
            report.applied, report.skipped, report.rejected, report.deferred
        );
        if report.rejected > 0 {
            println!("rejected units are listed in {}", cfg.failed_log.display());
        }
    }

    // Nonzero exit when follow-up is needed, for pipeline integration.
    if report.rejected + report.deferred > 0 {
        anyhow::bail!(
            "{} rejected, {} deferred; a future run will retry the deferred units",
            report.rejected,
            report.deferred
        );
    }
    Ok(())
}
