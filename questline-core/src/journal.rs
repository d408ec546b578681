//! The quest journal: single source of truth for every quest ever accepted.
//!
//! The journal enforces the ledger invariants:
//! - quest ids are unique;
//! - at most one quest is tracked;
//! - `current_progress <= max_progress`, and progress never decreases except
//!   through an explicit reset;
//! - a giver has at most one quest in progress.
//!
//! Active quests are indexed by normalised giver name so coordinators can ask
//! "is there a quest for me" without scanning the ledger.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::JournalConfig;
use crate::directive::QuestToken;
use crate::error::{QuestError, Result};
use crate::goal::{QuestGoal, QuestType};
use crate::types::{name_key, GameTimestamp, QuestId};

/// Ledger status of a quest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestStatus {
    /// Accepted, not yet handed in.
    #[default]
    InProgress,
    /// Handed in.
    Completed,
}

/// A ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalQuest {
    /// Quest identity.
    pub id: QuestId,
    /// Short display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Structured goal.
    pub goal: QuestGoal,
    /// Character that issued the quest.
    pub giver: String,
    /// Progress so far.
    pub current_progress: u32,
    /// Progress needed.
    pub max_progress: u32,
    /// Ledger status.
    pub status: QuestStatus,
    /// Whether this is the quest highlighted to the player.
    pub tracked: bool,
    /// When the quest was accepted.
    pub created_at: GameTimestamp,
    /// When the quest was handed in.
    pub completed_at: Option<GameTimestamp>,
}

impl JournalQuest {
    /// Build a fresh in-progress entry for `goal`.
    #[must_use]
    pub fn new(id: QuestId, goal: QuestGoal, giver: &str, now: GameTimestamp) -> Self {
        Self {
            id,
            title: goal.title(),
            description: goal.describe(),
            max_progress: goal.max_progress(),
            goal,
            giver: giver.trim().to_string(),
            current_progress: 0,
            status: QuestStatus::InProgress,
            tracked: false,
            created_at: now,
            completed_at: None,
        }
    }

    /// Quest type.
    #[must_use]
    pub fn quest_type(&self) -> QuestType {
        self.goal.quest_type()
    }

    /// Whether the quest is still in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == QuestStatus::InProgress
    }

    /// Whether progress has reached its maximum.
    #[must_use]
    pub fn progress_complete(&self) -> bool {
        self.current_progress >= self.max_progress
    }

    /// Character this quest is turned in to.
    #[must_use]
    pub fn turn_in_character(&self) -> &str {
        self.goal.turn_in_character(&self.giver)
    }

    /// `"2/3"`.
    #[must_use]
    pub fn progress_text(&self) -> String {
        format!("{}/{}", self.current_progress, self.max_progress)
    }
}

/// Result of a progress update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressChange {
    /// Nothing changed.
    Unchanged,
    /// Progress moved forward.
    Advanced {
        /// Previous value.
        from: u32,
        /// New value.
        to: u32,
    },
}

/// The ledger.
#[derive(Debug, Clone, Default)]
pub struct QuestJournal {
    quests: Vec<JournalQuest>,
    index: HashMap<QuestId, usize>,
    active_by_giver: HashMap<String, QuestId>,
    tracked: Option<QuestId>,
    auto_track_new: bool,
}

impl QuestJournal {
    /// Create an empty journal.
    #[must_use]
    pub fn new(config: &JournalConfig) -> Self {
        Self {
            auto_track_new: config.auto_track_new,
            ..Self::default()
        }
    }

    /// Record a newly accepted quest.
    ///
    /// # Errors
    /// [`QuestError::GiverBusy`] if `giver` already has a quest in progress.
    pub fn add(&mut self, token: &QuestToken, giver: &str, now: GameTimestamp) -> Result<&JournalQuest> {
        if let Some(active) = self.find_by_giver(giver) {
            return Err(QuestError::GiverBusy {
                giver: giver.to_string(),
                active: active.id,
            });
        }
        let quest = JournalQuest::new(QuestId::new(), token.goal.clone(), giver, now);
        let id = quest.id;
        self.push(quest)?;
        if self.auto_track_new && self.tracked.is_none() {
            self.set_tracked(id)?;
        }
        info!(quest = %id, giver = %giver, quest_type = %token.quest_type(), "Quest added to journal");
        self.get(id).ok_or(QuestError::QuestNotFound(id))
    }

    /// Insert an entry rebuilt from a snapshot, bypassing the one-quest-per-giver
    /// check. The tracked flag is not honoured here; use [`Self::set_tracked`].
    ///
    /// # Errors
    /// [`QuestError::DuplicateQuest`] if the id is already present.
    pub fn insert_restored(&mut self, mut quest: JournalQuest) -> Result<()> {
        quest.tracked = false;
        quest.current_progress = quest.current_progress.min(quest.max_progress);
        self.push(quest)
    }

    fn push(&mut self, quest: JournalQuest) -> Result<()> {
        if self.index.contains_key(&quest.id) {
            return Err(QuestError::DuplicateQuest(quest.id));
        }
        if quest.is_active() {
            self.active_by_giver.insert(name_key(&quest.giver), quest.id);
        }
        self.index.insert(quest.id, self.quests.len());
        self.quests.push(quest);
        Ok(())
    }

    /// Look a quest up by id.
    #[must_use]
    pub fn get(&self, id: QuestId) -> Option<&JournalQuest> {
        self.index.get(&id).map(|&i| &self.quests[i])
    }

    fn get_mut(&mut self, id: QuestId) -> Result<&mut JournalQuest> {
        let i = *self.index.get(&id).ok_or(QuestError::QuestNotFound(id))?;
        Ok(&mut self.quests[i])
    }

    /// Every quest, in acceptance order.
    #[must_use]
    pub fn all(&self) -> &[JournalQuest] {
        &self.quests
    }

    /// Quests in progress.
    #[must_use]
    pub fn active(&self) -> Vec<&JournalQuest> {
        self.quests.iter().filter(|q| q.is_active()).collect()
    }

    /// Quests handed in.
    #[must_use]
    pub fn completed(&self) -> Vec<&JournalQuest> {
        self.quests.iter().filter(|q| !q.is_active()).collect()
    }

    /// The quest in progress for `giver`, if any.
    #[must_use]
    pub fn find_by_giver(&self, giver: &str) -> Option<&JournalQuest> {
        self.active_by_giver
            .get(&name_key(giver))
            .and_then(|id| self.get(*id))
    }

    /// Every quest in progress that is turned in to `character`: its own
    /// quest first (unless that is a delivery bound elsewhere), then the
    /// deliveries addressed to it in acceptance order.
    #[must_use]
    pub fn candidates_for_character(&self, character: &str) -> Vec<&JournalQuest> {
        let key = name_key(character);
        let own = self
            .find_by_giver(character)
            .filter(|q| name_key(q.turn_in_character()) == key);
        let own_id = own.map(|q| q.id);
        own.into_iter()
            .chain(self.quests.iter().filter(|q| {
                q.is_active()
                    && Some(q.id) != own_id
                    && q.quest_type() == QuestType::Delivery
                    && name_key(q.turn_in_character()) == key
            }))
            .collect()
    }

    /// The first of [`Self::candidates_for_character`].
    #[must_use]
    pub fn find_for_character(&self, character: &str) -> Option<&JournalQuest> {
        self.candidates_for_character(character).into_iter().next()
    }

    /// Highlight `id`, clearing any previously tracked quest.
    ///
    /// # Errors
    /// - [`QuestError::QuestNotFound`] if `id` is unknown.
    /// - [`QuestError::AlreadyCompleted`] if the quest is no longer in
    ///   progress. Only active quests can be tracked.
    pub fn set_tracked(&mut self, id: QuestId) -> Result<()> {
        if !self.get_mut(id)?.is_active() {
            return Err(QuestError::AlreadyCompleted(id));
        }
        self.untrack();
        self.get_mut(id)?.tracked = true;
        self.tracked = Some(id);
        debug!(quest = %id, "Tracked quest changed");
        Ok(())
    }

    /// Clear the tracked flag.
    pub fn untrack(&mut self) {
        if let Some(prev) = self.tracked.take() {
            if let Ok(quest) = self.get_mut(prev) {
                quest.tracked = false;
            }
        }
    }

    /// The tracked quest, if any.
    #[must_use]
    pub fn tracked(&self) -> Option<&JournalQuest> {
        self.tracked.and_then(|id| self.get(id))
    }

    /// Raise progress to `value` (clamped to the maximum). Lower values and
    /// completed quests are ignored.
    ///
    /// # Errors
    /// [`QuestError::QuestNotFound`] if `id` is unknown.
    pub fn record_progress(&mut self, id: QuestId, value: u32) -> Result<ProgressChange> {
        let quest = self.get_mut(id)?;
        let to = value.min(quest.max_progress);
        if !quest.is_active() || to <= quest.current_progress {
            return Ok(ProgressChange::Unchanged);
        }
        let from = quest.current_progress;
        quest.current_progress = to;
        debug!(quest = %id, from, to, max = quest.max_progress, "Quest progress advanced");
        Ok(ProgressChange::Advanced { from, to })
    }

    /// Zero the progress of an in-progress quest.
    ///
    /// # Errors
    /// [`QuestError::QuestNotFound`] if `id` is unknown.
    pub fn reset_progress(&mut self, id: QuestId) -> Result<()> {
        let quest = self.get_mut(id)?;
        if quest.is_active() {
            quest.current_progress = 0;
            debug!(quest = %id, "Quest progress reset");
        }
        Ok(())
    }

    /// Mark a quest completed. Returns `false` if it already was.
    ///
    /// # Errors
    /// [`QuestError::QuestNotFound`] if `id` is unknown.
    pub fn complete(&mut self, id: QuestId, now: GameTimestamp) -> Result<bool> {
        let quest = self.get_mut(id)?;
        if !quest.is_active() {
            return Ok(false);
        }
        quest.status = QuestStatus::Completed;
        quest.completed_at = Some(now);
        let giver_key = name_key(&quest.giver);
        let was_tracked = quest.tracked;

        if self.active_by_giver.get(&giver_key) == Some(&id) {
            self.active_by_giver.remove(&giver_key);
        }
        if was_tracked {
            self.untrack();
        }
        info!(quest = %id, "Quest completed");
        Ok(true)
    }

    /// Forget everything. Only used right before a snapshot is restored.
    pub fn clear_all(&mut self) {
        self.quests.clear();
        self.index.clear();
        self.active_by_giver.clear();
        self.tracked = None;
    }

    /// Number of quests in the ledger.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quests.len()
    }

    /// Whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}
