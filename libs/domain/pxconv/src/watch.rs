use pxdom::{
    mutation::{MutationKind, MutationRecord},
    tree::{Document, NodeId},
};
use pxfx::pattern;

use crate::{
    rewrite::rewrite_all,
    settings::AppSettings,
};

/// Element id of the application menu container whose appearance triggers
/// the change-currency control injection.
pub const MENU_CONTAINER_ID: &str = "global_action_menu";

// -----------------------------------------------------------------------------
// WatcherState
// WatcherEvent
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display)]
pub enum WatcherState {
    #[default]
    Idle,
    Inspecting,
    Rewriting,
}

/// Side signals raised while processing a batch, for the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatcherEvent {
    /// The designated menu container entered the tree. Raised at most once
    /// per watcher.
    MenuContainerFound { target: NodeId },
    /// Price-bearing subtrees arrived before settings were available and
    /// were queued for a later [`MutationWatcher::flush_pending`].
    PriceNodesQueued { count: usize },
}

// -----------------------------------------------------------------------------
// MutationWatcher
// -----------------------------------------------------------------------------
/// Drives the rewriter from drained mutation batches.
///
/// Each batch moves the watcher through idle → inspecting → rewriting →
/// idle. Only child-list records are acted on: the record target's full
/// text content is tested against every pattern and, on a match, the target
/// subtree is rewritten with the supplied settings. Rewrite failures are
/// logged and the watcher keeps running.
#[derive(Debug, Default)]
pub struct MutationWatcher {
    state: WatcherState,
    menu_seen: bool,
    pending: Vec<NodeId>,
}

impl MutationWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> WatcherState {
        self.state
    }

    /// Subtrees queued while settings were absent.
    #[inline]
    pub fn pending(&self) -> &[NodeId] {
        &self.pending
    }

    /// Process one drained batch of mutation records.
    ///
    /// `settings` is the cached application state, or [None] before first-run
    /// setup has completed; matching targets are then queued instead of
    /// rewritten.
    pub fn process_batch(
        &mut self,
        doc: &mut Document,
        batch: &[MutationRecord],
        settings: Option<&AppSettings>,
    ) -> Vec<WatcherEvent> {
        self.state = WatcherState::Inspecting;
        let mut events = Vec::new();
        let mut queued = 0;

        for record in batch {
            if record.kind != MutationKind::ChildList {
                continue;
            }
            if !self.menu_seen
                && doc
                    .element(record.target)
                    .is_some_and(|el| el.id.as_deref() == Some(MENU_CONTAINER_ID))
            {
                self.menu_seen = true;
                events.push(WatcherEvent::MenuContainerFound {
                    target: record.target,
                });
            }

            if !pattern::any_match(&doc.text_content(record.target)) {
                continue;
            }
            match settings {
                Some(settings) => {
                    self.state = WatcherState::Rewriting;
                    match rewrite_all(doc, record.target, &settings.into()) {
                        Ok(count) => log::debug!("rewrote {count} text nodes under {}", record.target),
                        Err(err) => log::warn!("skipping rewrite under {}: {err}", record.target),
                    }
                    self.state = WatcherState::Inspecting;
                }
                None => {
                    log::warn!(
                        "no settings available, queuing price nodes under {}",
                        record.target
                    );
                    self.pending.push(record.target);
                    queued += 1;
                }
            }
        }

        if queued > 0 {
            events.push(WatcherEvent::PriceNodesQueued { count: queued });
        }
        self.state = WatcherState::Idle;
        events
    }

    /// Rewrite the subtrees queued before settings were available.
    ///
    /// Returns the number of text nodes rewritten.
    pub fn flush_pending(&mut self, doc: &mut Document, settings: &AppSettings) -> usize {
        let mut rewritten = 0;
        for target in std::mem::take(&mut self.pending) {
            match rewrite_all(doc, target, &settings.into()) {
                Ok(count) => rewritten += count,
                Err(err) => log::warn!("skipping queued rewrite under {target}: {err}"),
            }
        }
        rewritten
    }
}
