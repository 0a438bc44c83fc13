use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};

use mirror_core::{ConfigError, MirrorConfig};
use mirror_sync::{ensure_roots, run_pass, PassReport, SyncError};

use crate::error::DaemonError;

/// Counters returned when the driver shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub passes: u64,
    pub failed_passes: u64,
}

/// Configure logging, start a tokio runtime and drive passes until Ctrl-C.
pub fn start_blocking(config: &MirrorConfig) -> Result<DriverStats, DaemonError> {
    config.validate()?;

    let rotated = crate::log_rotation::rotate_log(&config.log_file)
        .map_err(|e| crate::error::io_err(&config.log_file, e))?;
    crate::logging::init_tracing(&config.log_file, true)?;
    if rotated {
        tracing::info!(path = %config.log_file.display(), "log file rotated");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| crate::error::io_err("tokio-runtime", e))?;

    runtime.block_on(async {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(4);
        let signal_handle = {
            let shutdown = shutdown_tx.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => tracing::info!("received ctrl-c, stopping after the current pass"),
                    Err(err) => tracing::error!(error = %err, "ctrl-c handler failed"),
                }
                let _ = shutdown.send(());
            })
        };

        let result = run(config.clone(), shutdown_rx).await;
        signal_handle.abort();
        result
    })
}

/// Initialise the roots once, then run a pass every `config.interval()`.
///
/// A root initialisation failure before the first pass is returned to the
/// caller; any failure after that is logged and the loop keeps going.
pub async fn run(
    config: MirrorConfig,
    shutdown_rx: broadcast::Receiver<()>,
) -> Result<DriverStats, DaemonError> {
    let roots = config.roots();
    tracing::info!(
        source = %roots.source.display(),
        replica = %roots.replica.display(),
        interval_secs = config.interval_secs,
        "starting mirror",
    );

    let status = {
        let roots = roots.clone();
        tokio::task::spawn_blocking(move || ensure_roots(&roots))
            .await
            .map_err(|err| DaemonError::Runtime(format!("root init join error: {err}")))??
    };
    tracing::debug!(status = ?status, "roots ready");

    run_periodic(config.interval(), move || run_pass(&roots, false), shutdown_rx).await
}

/// Invoke `pass` immediately and then once per `interval` until shutdown.
///
/// Each pass runs on the blocking pool and is awaited before the next tick,
/// so passes never overlap. Ticks missed while a pass overruns are skipped.
/// Shutdown is observed between passes; an in-flight pass runs to completion.
pub async fn run_periodic<F>(
    interval: Duration,
    pass: F,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<DriverStats, DaemonError>
where
    F: Fn() -> Result<PassReport, SyncError> + Send + Sync + 'static,
{
    if interval.is_zero() {
        return Err(ConfigError::InvalidInterval { secs: 0 }.into());
    }

    let pass = Arc::new(pass);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stats = DriverStats::default();

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {
                let pass = pass.clone();
                let started = Instant::now();
                let outcome = tokio::task::spawn_blocking(move || pass()).await;
                stats.passes += 1;

                match outcome {
                    Ok(Ok(report)) => log_report(&report, started.elapsed()),
                    Ok(Err(err)) => {
                        stats.failed_passes += 1;
                        tracing::error!(error = %err, "pass failed; retrying on next tick");
                    }
                    Err(err) => {
                        stats.failed_passes += 1;
                        tracing::error!(error = %err, "pass panicked; retrying on next tick");
                    }
                }
            }
        }
    }

    tracing::info!(
        passes = stats.passes,
        failed_passes = stats.failed_passes,
        "mirror stopped",
    );
    Ok(stats)
}

fn log_report(report: &PassReport, elapsed: Duration) {
    let stats = report.stats();
    if report.is_clean() {
        tracing::info!(
            created = stats.created,
            updated = stats.updated,
            up_to_date = stats.up_to_date,
            deleted = stats.deleted,
            duration_ms = elapsed.as_millis(),
            "pass completed",
        );
    } else {
        tracing::warn!(
            created = stats.created,
            updated = stats.updated,
            deleted = stats.deleted,
            failed = stats.failed,
            skipped = stats.skipped,
            duration_ms = elapsed.as_millis(),
            "pass completed with failures",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use mirror_core::RootPair;
    use tempfile::TempDir;

    fn roots_in(tmp: &TempDir) -> RootPair {
        RootPair::new(tmp.path().join("source"), tmp.path().join("replica"))
    }

    #[tokio::test]
    async fn runs_passes_until_shutdown() {
        let tmp = TempDir::new().expect("tmp");
        let roots = roots_in(&tmp);
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let calls = Arc::new(AtomicUsize::new(0));

        let pass = {
            let calls = calls.clone();
            move || {
                if calls.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                    let _ = shutdown_tx.send(());
                }
                run_pass(&roots, false)
            }
        };

        let stats = run_periodic(Duration::from_millis(5), pass, shutdown_rx)
            .await
            .expect("driver");
        assert_eq!(stats.passes, 3);
        assert_eq!(stats.failed_passes, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failed_pass_does_not_stop_the_loop() {
        let tmp = TempDir::new().expect("tmp");
        let roots = roots_in(&tmp);
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let calls = Arc::new(AtomicUsize::new(0));

        let pass = {
            let calls = calls.clone();
            move || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n == 3 {
                    let _ = shutdown_tx.send(());
                }
                if n == 1 {
                    return Err(SyncError::RootNotDirectory {
                        path: roots.source.clone(),
                    });
                }
                run_pass(&roots, false)
            }
        };

        let stats = run_periodic(Duration::from_millis(5), pass, shutdown_rx)
            .await
            .expect("driver");
        assert_eq!(stats.passes, 3);
        assert_eq!(stats.failed_passes, 1);
    }

    #[tokio::test]
    async fn passes_never_overlap() {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let tmp = TempDir::new().expect("tmp");
        let roots = roots_in(&tmp);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));

        let pass = {
            let (active, peak, calls) = (active.clone(), peak.clone(), calls.clone());
            move || {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(20));
                active.fetch_sub(1, Ordering::SeqCst);
                if calls.fetch_add(1, Ordering::SeqCst) + 1 == 4 {
                    let _ = shutdown_tx.send(());
                }
                run_pass(&roots, true)
            }
        };

        run_periodic(Duration::from_millis(2), pass, shutdown_rx)
            .await
            .expect("driver");
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let (_tx, rx) = broadcast::channel::<()>(1);
        let err = run_periodic(
            Duration::ZERO,
            || Err(SyncError::RootNotDirectory { path: "/".into() }),
            rx,
        )
        .await
        .expect_err("zero interval");
        assert!(matches!(err, DaemonError::Config(_)));
    }

    #[tokio::test]
    async fn run_surfaces_root_initialisation_failure() {
        let tmp = TempDir::new().expect("tmp");
        let source = tmp.path().join("source");
        fs::write(&source, "not a folder").expect("write");
        let config = MirrorConfig::new(source, tmp.path().join("replica"));
        let (_tx, rx) = broadcast::channel::<()>(1);

        let err = run(config, rx).await.expect_err("must fail");
        assert!(err.is_root_init(), "got: {err}");
    }

    #[tokio::test]
    async fn run_mirrors_source_then_stops_on_shutdown() {
        let tmp = TempDir::new().expect("tmp");
        let source = tmp.path().join("source");
        fs::create_dir_all(&source).expect("mkdir");
        fs::write(source.join("a.txt"), "alpha").expect("write");
        let config = MirrorConfig::new(&source, tmp.path().join("replica"));
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

        let handle = tokio::spawn(run(config, shutdown_rx));
        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown_tx.send(()).expect("send shutdown");

        let stats = handle.await.expect("join").expect("driver");
        assert!(stats.passes >= 1);
        assert_eq!(
            fs::read_to_string(tmp.path().join("replica").join("a.txt")).expect("read"),
            "alpha"
        );
    }
}
