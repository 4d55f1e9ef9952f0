//! The sync coordinator: enablement state machine and trigger routing.

use crate::config::SyncConfig;
use crate::debounce::UploadScheduler;
use crate::engine::{SyncEngine, SyncReport};
use crate::error::SyncResult;
use parking_lot::Mutex;
use snipvault_model::{Snippet, SnippetId};
use snipvault_remote::RemoteStore;
use snipvault_store::{SnippetStore, StoreSignal};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the coordinator is in the enablement lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncActivation {
    /// Sync is off. Local edits stay local.
    Disabled,
    /// The initial full sync of an enable is running.
    Enabling,
    /// Sync is on and idle.
    Enabled,
    /// An externally-triggered full sync is running.
    Syncing,
    /// Teardown is running.
    Disabling,
}

/// Serializes sync triggers from every call site and gates them on the
/// enablement state.
///
/// All user-facing mutations flow through the coordinator: it persists
/// locally first, then routes the remote side through the engine or the
/// debounced scheduler. Disabling cancels pending pushes and releases the
/// remote session but never deletes data on either side.
pub struct SyncCoordinator<S: SnippetStore, R: RemoteStore> {
    engine: Arc<SyncEngine<S, R>>,
    scheduler: UploadScheduler,
    activation: Arc<Mutex<SyncActivation>>,
}

impl<S: SnippetStore + 'static, R: RemoteStore + 'static> SyncCoordinator<S, R> {
    /// Creates a coordinator in the `Disabled` state.
    pub fn new(engine: Arc<SyncEngine<S, R>>, config: &SyncConfig) -> Self {
        let activation = Arc::new(Mutex::new(SyncActivation::Disabled));

        // Debounced pushes re-check enablement at fire time: a push
        // scheduled before a disable must not reach the remote after it.
        let gate = Arc::clone(&activation);
        let push_engine = Arc::clone(&engine);
        let scheduler = UploadScheduler::new(config.debounce_delay, move |id| {
            let enabled = matches!(
                *gate.lock(),
                SyncActivation::Enabled | SyncActivation::Syncing
            );
            if !enabled {
                debug!(snippet = %id, "debounced push dropped, sync disabled");
                return;
            }
            if let Err(error) = push_engine.push_update(&id) {
                warn!(snippet = %id, %error, "debounced push failed, snippet stays dirty");
            }
        });

        Self {
            engine,
            scheduler,
            activation,
        }
    }

    /// The current activation state.
    pub fn activation(&self) -> SyncActivation {
        *self.activation.lock()
    }

    /// Returns true if sync is on (idle or mid-sync).
    pub fn is_enabled(&self) -> bool {
        matches!(
            self.activation(),
            SyncActivation::Enabled | SyncActivation::Syncing
        )
    }

    /// Number of snippets with a pending debounced push.
    pub fn pending_uploads(&self) -> usize {
        self.scheduler.pending()
    }

    /// Turns sync on: runs the initial full sync and, on success, moves
    /// to `Enabled`.
    ///
    /// A failure reverts to `Disabled` and surfaces the error. Calling
    /// while not disabled is a zero-effect no-op.
    pub fn enable(&self) -> SyncResult<SyncReport> {
        {
            let mut state = self.activation.lock();
            if *state != SyncActivation::Disabled {
                debug!(state = ?*state, "enable ignored");
                return Ok(SyncReport::default());
            }
            *state = SyncActivation::Enabling;
        }

        match self.engine.perform_full_sync() {
            Ok(report) => {
                *self.activation.lock() = SyncActivation::Enabled;
                info!("sync enabled");
                Ok(report)
            }
            Err(error) => {
                *self.activation.lock() = SyncActivation::Disabled;
                warn!(%error, "enable failed");
                Err(error)
            }
        }
    }

    /// Runs a full sync if sync is enabled and idle.
    ///
    /// A trigger arriving mid-sync or while disabled is dropped with a
    /// zero-effect report. A failed sync leaves sync enabled; the next
    /// external trigger retries.
    pub fn request_sync(&self) -> SyncResult<SyncReport> {
        {
            let mut state = self.activation.lock();
            match *state {
                SyncActivation::Enabled => *state = SyncActivation::Syncing,
                other => {
                    debug!(state = ?other, "sync trigger dropped");
                    return Ok(SyncReport::default());
                }
            }
        }

        let result = self.engine.perform_full_sync();
        *self.activation.lock() = SyncActivation::Enabled;
        result
    }

    /// Turns sync off: cancels pending pushes and releases the remote
    /// session. No data is deleted on either side; unlinked or dirty
    /// snippets upload on the next enable.
    pub fn disable(&self) {
        {
            let mut state = self.activation.lock();
            if *state == SyncActivation::Disabled {
                return;
            }
            *state = SyncActivation::Disabling;
        }

        self.scheduler.cancel_all();
        if let Err(error) = self.engine.remote().close() {
            warn!(%error, "remote session close failed");
        }
        *self.activation.lock() = SyncActivation::Disabled;
        info!("sync disabled");
    }

    /// Creates a snippet. With sync on, the engine pushes it remotely in
    /// the same call; with sync off it is stored locally, unlinked and
    /// dirty.
    pub fn create(&self, snippet: Snippet) -> SyncResult<()> {
        if self.is_enabled() {
            return self.engine.create_and_upload(snippet);
        }

        let has_shortcut = snippet.shortcut_key().is_some();
        self.engine.store().insert(snippet)?;
        self.engine.store().save()?;
        self.engine.signals().emit(StoreSignal::MenuChanged);
        if has_shortcut {
            self.engine.signals().emit(StoreSignal::HotkeysChanged);
        }
        Ok(())
    }

    /// Records a user edit: persists it locally, then debounces the
    /// remote push. Editing a missing snippet is a no-op.
    pub fn snippet_edited(&self, id: &SnippetId) -> SyncResult<()> {
        let Some(mut snippet) = self.engine.store().get(id)? else {
            debug!(snippet = %id, "edit ignored, snippet missing");
            return Ok(());
        };
        snippet.touch();
        self.engine.store().upsert(snippet)?;
        self.engine.store().save()?;

        if self.is_enabled() {
            self.scheduler.schedule(*id);
        }
        Ok(())
    }

    /// Deletes a snippet locally and, with sync on, remotely. Cancels any
    /// pending debounced push for it first.
    pub fn delete(&self, id: &SnippetId) -> SyncResult<SyncReport> {
        self.scheduler.cancel(id);
        self.engine.delete_snippet(id, self.is_enabled())
    }
}
