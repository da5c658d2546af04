//! Debounced persistence pipeline.
//!
//! Keystrokes reschedule a single pending save; the save only starts once
//! the quiet period has elapsed with no further edits. The pipeline is a
//! pure state machine: the session actor owns the timer and the I/O and
//! feeds the outcomes back in.
//!
//! ```text
//! on_edit ──▶ scheduled ──deadline──▶ in flight ──complete──▶ saved / failed
//!                 ▲                       │
//!                 └── edit during flight: rescheduled, waits for completion
//! ```

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::domain::foundation::SectionId;

/// Quiet period before a burst of edits is persisted.
pub const DEFAULT_SAVE_DEBOUNCE: Duration = Duration::from_millis(2000);

/// One commit to hand to the persistence service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveJob {
    pub section_id: SectionId,
    pub content: String,
}

/// The "saving… / saved" indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SaveStatus {
    /// Everything typed has been persisted.
    Saved,
    /// Edits are waiting for the quiet period (or for a save in flight).
    Pending,
    /// A save is in flight.
    Saving,
    /// At least one section's latest save failed; its content lives only
    /// in memory. `message` is from the most recent failure.
    Failed { message: String },
}

#[derive(Debug, Clone)]
struct Scheduled {
    job: SaveJob,
    deadline: Instant,
}

/// Coalesces edits into at most one in-flight save per section.
#[derive(Debug)]
pub struct SavePipeline {
    quiet_period: Duration,
    scheduled: Option<Scheduled>,
    in_flight: HashSet<SectionId>,
    waiting: HashMap<SectionId, String>,
    /// Sections whose latest save failed, oldest failure first.
    failed: Vec<(SectionId, String)>,
}

impl SavePipeline {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            scheduled: None,
            in_flight: HashSet::new(),
            waiting: HashMap::new(),
            failed: Vec::new(),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Records an edit and restarts the quiet period.
    ///
    /// If the previously scheduled save belonged to another section it is
    /// not dropped: it is returned so the caller can start it right away.
    pub fn on_edit(&mut self, section_id: SectionId, content: String, now: Instant) -> Option<SaveJob> {
        let displaced = match self.scheduled.take() {
            Some(previous) if previous.job.section_id != section_id => self.start(previous.job),
            _ => None,
        };

        self.scheduled = Some(Scheduled {
            job: SaveJob { section_id, content },
            deadline: now + self.quiet_period,
        });
        displaced
    }

    /// When the scheduled save should fire, if one is scheduled.
    pub fn deadline(&self) -> Option<Instant> {
        self.scheduled.as_ref().map(|s| s.deadline)
    }

    /// Section of the scheduled save, if any.
    pub fn scheduled_section(&self) -> Option<&SectionId> {
        self.scheduled.as_ref().map(|s| &s.job.section_id)
    }

    /// Fires the scheduled save if its quiet period is over.
    pub fn fire_due(&mut self, now: Instant) -> Option<SaveJob> {
        if self.deadline().is_some_and(|deadline| deadline <= now) {
            self.flush_now()
        } else {
            None
        }
    }

    /// Fires the scheduled save immediately, ignoring the quiet period.
    pub fn flush_now(&mut self) -> Option<SaveJob> {
        let scheduled = self.scheduled.take()?;
        self.start(scheduled.job)
    }

    /// Records the outcome of a save started by this pipeline.
    ///
    /// A failure sticks to its section until a save of that same section
    /// succeeds. Returns the next save for the section if one was waiting.
    pub fn complete(&mut self, section_id: &SectionId, outcome: Result<(), String>) -> Option<SaveJob> {
        self.in_flight.remove(section_id);
        self.failed.retain(|(id, _)| id != section_id);
        if let Err(message) = outcome {
            self.failed.push((section_id.clone(), message));
        }

        let content = self.waiting.remove(section_id)?;
        self.start(SaveJob {
            section_id: section_id.clone(),
            content,
        })
    }

    pub fn status(&self) -> SaveStatus {
        if !self.in_flight.is_empty() {
            SaveStatus::Saving
        } else if self.scheduled.is_some() || !self.waiting.is_empty() {
            SaveStatus::Pending
        } else if let Some((_, message)) = self.failed.last() {
            SaveStatus::Failed {
                message: message.clone(),
            }
        } else {
            SaveStatus::Saved
        }
    }

    /// Sections whose latest save failed.
    pub fn failed_sections(&self) -> Vec<SectionId> {
        self.failed.iter().map(|(id, _)| id.clone()).collect()
    }

    /// Starts a save outside the debounce, unless one for the same section
    /// is already scheduled, waiting or in flight.
    pub fn resubmit(&mut self, job: SaveJob) -> Option<SaveJob> {
        let covered = self.scheduled_section() == Some(&job.section_id)
            || self.waiting.contains_key(&job.section_id)
            || self.in_flight.contains(&job.section_id);
        if covered {
            return None;
        }
        self.start(job)
    }

    /// Nothing scheduled, waiting or in flight.
    pub fn is_idle(&self) -> bool {
        self.scheduled.is_none() && self.in_flight.is_empty() && self.waiting.is_empty()
    }

    fn start(&mut self, job: SaveJob) -> Option<SaveJob> {
        if self.in_flight.contains(&job.section_id) {
            // Latest content wins; it is sent once the current save returns.
            self.waiting.insert(job.section_id, job.content);
            return None;
        }
        self.in_flight.insert(job.section_id.clone());
        Some(job)
    }
}

impl Default for SavePipeline {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_DEBOUNCE)
    }
}
