//! The save session guard.
//!
//! [`TasksService`] is the application's single entry point for saving. It
//! owns the session-wide [`SaveMode`] and `needs_save` flag, refuses
//! overlapping sessions, and drives the classifier, scheduler and commit
//! state machine for one session at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use tasks_core::{CoreError, RecordKind, SchemaGraph};
use tasks_store::{compute_dirty_queues, has_dirty_records, RecordStore, SyntheticProjects};

use crate::commit::{Committer, SaveReport};
use crate::config::SyncConfig;
use crate::error::SaveError;
use crate::mode::SaveMode;
use crate::relink::Relinker;
use crate::remote::Remote;
use crate::scheduler::TierScheduler;

/// Shared save pipeline for one store and one remote.
///
/// The store sits behind `Arc<tokio::sync::Mutex<_>>` so the rest of the
/// client can keep using it; the pipeline only holds the lock for the
/// bookkeeping around each commit, never across a remote call.
pub struct TasksService<S, R> {
    store: Arc<Mutex<S>>,
    remote: R,
    synthetic: SyntheticProjects,
    relinker: Relinker,
    tiers: Vec<RecordKind>,
    commit_timeout: Option<Duration>,
    /// Held for the whole of a save session.
    session: Mutex<()>,
    mode: watch::Sender<SaveMode>,
    needs_save: watch::Sender<bool>,
}

impl<S, R> TasksService<S, R>
where
    S: RecordStore + Send,
    R: Remote + Sync,
{
    pub fn new(
        store: Arc<Mutex<S>>,
        remote: R,
        synthetic: SyntheticProjects,
        config: &SyncConfig,
    ) -> Result<Self, CoreError> {
        let schema = SchemaGraph::new();
        let tiers = schema.tier_order()?;
        let (mode, _) = watch::channel(SaveMode::NotSaving);
        let dirty = store
            .try_lock()
            .map(|store| has_dirty_records(&*store, &synthetic))
            .unwrap_or(false);
        let (needs_save, _) = watch::channel(dirty);
        Ok(TasksService {
            store,
            remote,
            synthetic,
            relinker: Relinker::new(schema),
            tiers,
            commit_timeout: config.commit_timeout,
            session: Mutex::new(()),
            mode,
            needs_save,
        })
    }

    pub fn store(&self) -> &Arc<Mutex<S>> {
        &self.store
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn synthetic(&self) -> &SyntheticProjects {
        &self.synthetic
    }

    /// Current save mode.
    pub fn save_mode(&self) -> SaveMode {
        *self.mode.borrow()
    }

    pub fn is_saving(&self) -> bool {
        self.save_mode().is_saving()
    }

    /// Receiver that observes every save mode change.
    pub fn subscribe(&self) -> watch::Receiver<SaveMode> {
        self.mode.subscribe()
    }

    /// True when some record other than the synthetic projects awaits
    /// persisting.
    ///
    /// Reads the store and publishes the result to
    /// [`TasksService::subscribe_needs_save`] receivers.
    pub async fn needs_save(&self) -> bool {
        let store = self.store.lock().await;
        self.refresh_needs_save(&*store)
    }

    /// Receiver that observes the `needs_save` flag.
    ///
    /// The store is edited outside the service, so the flag is republished
    /// when a save session starts and ends and on every
    /// [`TasksService::needs_save`] call, not on each edit.
    pub fn subscribe_needs_save(&self) -> watch::Receiver<bool> {
        self.needs_save.subscribe()
    }

    fn refresh_needs_save(&self, store: &S) -> bool {
        let dirty = has_dirty_records(store, &self.synthetic);
        self.publish_needs_save(dirty);
        dirty
    }

    fn publish_needs_save(&self, dirty: bool) {
        self.needs_save.send_if_modified(|current| {
            let changed = *current != dirty;
            *current = dirty;
            changed
        });
    }

    /// Runs one save session.
    ///
    /// Fails fast with [`SaveError::SaveInProgress`] if a session is already
    /// running. With nothing dirty the call returns an empty report and the
    /// save mode never leaves `NotSaving`. Otherwise tiers are committed in
    /// dependency order and the first failed commit aborts the session.
    /// Either way the session ends with the change log pruned and the mode
    /// back at `NotSaving`.
    pub async fn request_save(&self) -> Result<SaveReport, SaveError> {
        let Ok(_session) = self.session.try_lock() else {
            debug!("save requested while a session is running");
            return Err(SaveError::SaveInProgress);
        };

        let queues = {
            let store = self.store.lock().await;
            compute_dirty_queues(&*store, &self.synthetic)
        };
        self.publish_needs_save(!queues.is_empty());
        if queues.is_empty() {
            debug!("nothing to save");
            return Ok(SaveReport::default());
        }

        info!(records = queues.total(), "save session started");
        let mode = ModeGuard::enter(&self.mode);
        let mut scheduler = TierScheduler::new(self.tiers.clone(), queues);

        let result = self.drain(&mut scheduler).await;

        scheduler.clear();
        {
            let mut store = self.store.lock().await;
            store.prune_change_log();
            self.refresh_needs_save(&*store);
        }
        drop(mode);

        match &result {
            Ok(report) => info!(
                committed = report.committed.len(),
                relinked = report.relinked,
                "save session finished"
            ),
            Err(err) => warn!(error = %err, "save session aborted"),
        }
        result
    }

    async fn drain(&self, scheduler: &mut TierScheduler) -> Result<SaveReport, SaveError> {
        let committer = Committer::new(
            &self.store,
            &self.remote,
            &self.relinker,
            self.commit_timeout,
        );
        let mut report = SaveReport::default();
        while let Some(kind) = scheduler.advance() {
            self.mode.send_replace(SaveMode::for_tier(kind));
            info!(tier = %kind, records = scheduler.queue(kind).len(), "committing tier");
            committer.commit_tier(scheduler, kind, &mut report).await?;
        }
        Ok(report)
    }
}

/// Sets the mode to `Saving` and back to `NotSaving` when dropped, so a
/// cancelled session does not leave the application stuck in a save mode.
struct ModeGuard<'a> {
    mode: &'a watch::Sender<SaveMode>,
}

impl<'a> ModeGuard<'a> {
    fn enter(mode: &'a watch::Sender<SaveMode>) -> Self {
        mode.send_replace(SaveMode::Saving);
        ModeGuard { mode }
    }
}

impl Drop for ModeGuard<'_> {
    fn drop(&mut self) {
        self.mode.send_replace(SaveMode::NotSaving);
    }
}
