//! Periodic auto-reset.
//!
//! `watch` drives `DocumentStore::try_sweep` from a tokio interval. The sweep
//! itself is blocking file work under the document lock, so it runs on the
//! blocking pool. A tick that finds the lock held by another `cl` process is
//! skipped rather than queued behind it.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::{DocumentStore, Persisted};

/// Sweep every `interval` until ctrl-c, or until `max_ticks` ticks ran.
pub async fn watch<F>(
    store: DocumentStore,
    interval: Duration,
    max_ticks: Option<u64>,
    on_tick: F,
) -> Result<u64>
where
    F: FnMut(&Persisted<Vec<Uuid>>),
{
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };
    watch_until(store, interval, max_ticks, ctrl_c, on_tick).await
}

/// Sweep every `interval` until `shutdown` resolves, or until `max_ticks`
/// ticks ran.
///
/// The first tick runs immediately. `on_tick` sees each completed sweep; a
/// failed sweep is logged and the loop keeps going. Returns the number of
/// ticks, including ones skipped because the document was busy.
pub async fn watch_until<S, F>(
    store: DocumentStore,
    interval: Duration,
    max_ticks: Option<u64>,
    shutdown: S,
    mut on_tick: F,
) -> Result<u64>
where
    S: Future<Output = ()>,
    F: FnMut(&Persisted<Vec<Uuid>>),
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = 0u64;
    // One future for the whole loop, so a signal during a sweep is not lost.
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!(ticks, "watch interrupted");
                break;
            }
            _ = ticker.tick() => {}
        }

        let sweeper = store.clone();
        let outcome = tokio::task::spawn_blocking(move || sweeper.try_sweep(Utc::now()))
            .await
            .map_err(|err| Error::OperationFailed(format!("sweep task failed: {err}")))?;
        ticks += 1;

        match outcome {
            Ok(Some(outcome)) => on_tick(&outcome),
            Ok(None) => tracing::debug!(ticks, "document busy, skipping tick"),
            Err(err) => tracing::warn!(error = %err, "sweep failed, retrying next tick"),
        }

        if max_ticks.is_some_and(|max| ticks >= max) {
            break;
        }
    }

    Ok(ticks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::storage::{Storage, DATA_FILE_NAME};
    use chrono::Duration as ChronoDuration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn watch_resets_due_checklists_and_stops() {
        let dir = TempDir::new().expect("tempdir");
        let storage = Storage::new(dir.path().join(DATA_FILE_NAME));
        let mut document = Document::sample();
        document.checklists[0].mark_completed_at(Utc::now() - ChronoDuration::days(30));
        storage.save(&document).expect("seed");
        let store = DocumentStore::new(storage, 1000);

        let mut seen = Vec::new();
        let ticks = watch(store.clone(), Duration::from_millis(10), Some(2), |outcome| {
            seen.push(outcome.value.len());
        })
        .await
        .expect("watch");

        assert_eq!(ticks, 2);
        assert_eq!(seen, vec![1, 0]);
        assert!(store.snapshot().checklists[0].last_completed_date.is_none());
    }

    #[tokio::test]
    async fn shutdown_during_a_sweep_stops_the_loop() {
        let dir = TempDir::new().expect("tempdir");
        let store = DocumentStore::new(Storage::new(dir.path().join(DATA_FILE_NAME)), 1000);
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let mut tx = Some(tx);

        let shutdown = async {
            let _ = rx.await;
        };
        let ticks = watch_until(store, Duration::from_millis(10), None, shutdown, |_| {
            if let Some(tx) = tx.take() {
                let _ = tx.send(());
            }
        })
        .await
        .expect("watch");

        assert_eq!(ticks, 1);
    }

    #[tokio::test]
    async fn busy_document_skips_the_tick() {
        let dir = TempDir::new().expect("tempdir");
        let storage = Storage::new(dir.path().join(DATA_FILE_NAME));
        let mut document = Document::sample();
        document.checklists[0].mark_completed_at(Utc::now() - ChronoDuration::days(30));
        storage.save(&document).expect("seed");
        let store = DocumentStore::new(storage, 1000);
        let held = crate::lock::FileLock::acquire(store.storage().lock_file(), 1000).expect("lock");

        let mut swept = 0;
        let ticks = watch(store.clone(), Duration::from_millis(10), Some(2), |_| swept += 1)
            .await
            .expect("watch");

        assert_eq!(ticks, 2);
        assert_eq!(swept, 0);
        assert!(store.snapshot().checklists[0].last_completed_date.is_some());
        drop(held);
    }
}
