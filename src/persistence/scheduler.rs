//! Debounced save scheduling
//!
//! At most one save is pending at a time. Scheduling again replaces it and
//! restarts the quiet period, so only the latest content of a burst of edits
//! reaches the store. Every pending save carries the identity of the document
//! it belongs to and is never re-tagged.

/// A save waiting for its quiet period to end
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingSave {
    pub document_id: String,
    pub content: String,
    /// Time (ms) at which the save becomes due
    pub due_at: u64,
    /// Increments on every schedule; lets timers detect they were superseded
    pub generation: u64,
}

#[derive(Clone, Debug)]
pub struct SaveScheduler {
    debounce_ms: u64,
    pending: Option<PendingSave>,
    generation: u64,
}

impl Default for SaveScheduler {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl SaveScheduler {
    pub fn new(debounce_ms: u64) -> Self {
        Self { debounce_ms, pending: None, generation: 0 }
    }

    pub fn debounce_ms(&self) -> u64 {
        self.debounce_ms
    }

    /// Schedule `content` for `document_id`, superseding any pending save
    ///
    /// Returns the generation of the new pending save.
    pub fn schedule(&mut self, document_id: &str, content: String, now: u64) -> u64 {
        self.generation += 1;
        if let Some(previous) = &self.pending {
            if previous.document_id != document_id {
                log::warn!(
                    "save for {} superseded by save for {} without retarget",
                    previous.document_id,
                    document_id
                );
            }
        }
        self.pending = Some(PendingSave {
            document_id: document_id.to_string(),
            content,
            due_at: now + self.debounce_ms,
            generation: self.generation,
        });
        self.generation
    }

    /// Take the pending save if its quiet period has ended
    pub fn take_due(&mut self, now: u64) -> Option<PendingSave> {
        match &self.pending {
            Some(pending) if pending.due_at <= now => self.pending.take(),
            _ => None,
        }
    }

    /// Take the pending save regardless of its due time
    pub fn flush(&mut self) -> Option<PendingSave> {
        self.pending.take()
    }

    /// Drop the pending save
    pub fn cancel(&mut self) -> Option<PendingSave> {
        let dropped = self.pending.take();
        if let Some(save) = &dropped {
            log::debug!("cancelled pending save for {}", save.document_id);
        }
        dropped
    }

    /// Detach the scheduler from everything but `document_id`
    ///
    /// A pending save for another document is removed and returned so the
    /// caller can decide to flush or drop it.
    pub fn retarget(&mut self, document_id: Option<&str>) -> Option<PendingSave> {
        match (&self.pending, document_id) {
            (Some(pending), Some(id)) if pending.document_id == id => None,
            (Some(_), _) => self.pending.take(),
            (None, _) => None,
        }
    }

    /// When the pending save becomes due, for arming a timer
    pub fn next_due(&self) -> Option<u64> {
        self.pending.as_ref().map(|pending| pending.due_at)
    }

    pub fn pending(&self) -> Option<&PendingSave> {
        self.pending.as_ref()
    }

    /// Whether `generation` is still the pending save
    pub fn is_current(&self, generation: u64) -> bool {
        self.pending.as_ref().is_some_and(|pending| pending.generation == generation)
    }
}
