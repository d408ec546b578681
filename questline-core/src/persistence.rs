//! Journal snapshots for save games.
//!
//! The host owns the save file; this module only decides what goes in it.
//! A [`QuestSnapshot`] is a versioned list of [`JournalQuestRecord`]s encoded
//! as JSON with `serde_json`.
//!
//! Records carry the structured [`QuestGoal`]. Older records without one are
//! rebuilt from name hints scanned out of the description, which follows a
//! fixed sentence per quest type (see [`QuestGoal::describe`]):
//!
//! | Type | Description |
//! |---|---|
//! | FETCH | `Find <quantity> <item> in <zone>` |
//! | DELIVERY | `Deliver <item> to <recipient> in <zone>` |
//! | EXPLORE | `Explore <zone>` |
//! | TALK | `Talk to <character> in <zone>` |
//! | INTERACT | `Interact with <object> in <zone>` |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::PersistenceConfig;
use crate::error::{QuestError, Result};
use crate::goal::{QuestGoal, QuestType};
use crate::journal::{JournalQuest, QuestJournal, QuestStatus};
use crate::spawner::QuestSpawner;
use crate::types::{GameTimestamp, QuestId};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One persisted journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalQuestRecord {
    /// Quest id.
    pub id: QuestId,
    /// Journal title.
    #[serde(default)]
    pub title: String,
    /// Display description.
    pub description: String,
    /// Quest type.
    #[serde(rename = "type")]
    pub quest_type: QuestType,
    /// Progress so far.
    pub current_progress: u32,
    /// Progress needed.
    pub max_progress: u32,
    /// Character that gave the quest.
    pub giver_name: String,
    /// Whether the quest was tracked.
    pub tracked: bool,
    /// Item or object named by the description.
    #[serde(default)]
    pub object_name_hint: String,
    /// Zone named by the description.
    #[serde(default)]
    pub zone_name_hint: String,
    /// Character named by the description.
    #[serde(default)]
    pub target_name_hint: String,
    /// Ledger status.
    #[serde(default)]
    pub status: QuestStatus,
    /// Structured goal. Absent in older snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<QuestGoal>,
    /// Tick the quest was accepted at.
    #[serde(default)]
    pub created_tick: u64,
    /// Tick the quest was handed in at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_tick: Option<u64>,
}

impl JournalQuestRecord {
    /// Build a record from a journal entry.
    #[must_use]
    pub fn from_quest(quest: &JournalQuest) -> Self {
        let hints = derive_hints(quest.quest_type(), &quest.description).unwrap_or_default();
        Self {
            id: quest.id,
            title: quest.title.clone(),
            description: quest.description.clone(),
            quest_type: quest.quest_type(),
            current_progress: quest.current_progress,
            max_progress: quest.max_progress,
            giver_name: quest.giver.clone(),
            tracked: quest.tracked,
            object_name_hint: hints.object,
            zone_name_hint: hints.zone,
            target_name_hint: hints.target,
            status: quest.status,
            goal: Some(quest.goal.clone()),
            created_tick: quest.created_at.tick,
            completed_tick: quest.completed_at.map(|t| t.tick),
        }
    }

    /// The goal this record describes: the stored one, or one rebuilt from
    /// the description hints.
    ///
    /// # Errors
    /// [`QuestError::Reconstruction`] if neither is usable.
    pub fn goal(&self) -> Result<QuestGoal> {
        if let Some(goal) = &self.goal {
            if goal.quest_type() != self.quest_type {
                return Err(self.reconstruction(format!(
                    "goal is {} but record type is {}",
                    goal.quest_type(),
                    self.quest_type
                )));
            }
            return Ok(goal.clone());
        }

        let hints = derive_hints(self.quest_type, &self.description).ok_or_else(|| {
            self.reconstruction(format!("description '{}' does not match the {} convention", self.description, self.quest_type))
        })?;
        hints_to_goal(self.quest_type, &hints)
            .ok_or_else(|| self.reconstruction(format!("{} has no description convention", self.quest_type)))
    }

    fn reconstruction(&self, reason: String) -> QuestError {
        QuestError::Reconstruction { id: self.id, reason }
    }
}

/// A versioned set of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestSnapshot {
    /// Format version.
    pub version: u32,
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    /// One record per journal entry.
    pub records: Vec<JournalQuestRecord>,
}

impl QuestSnapshot {
    /// Encode as JSON.
    ///
    /// # Errors
    /// [`QuestError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| QuestError::Serialization(e.to_string()))
    }

    /// Decode from JSON.
    ///
    /// # Errors
    /// [`QuestError::Serialization`] if the JSON does not describe a snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| QuestError::Serialization(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Description hints
// ---------------------------------------------------------------------------

/// Names scanned out of a description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameHints {
    /// Item or object.
    pub object: String,
    /// Zone.
    pub zone: String,
    /// Recipient or conversation partner.
    pub target: String,
    /// FETCH quantity.
    pub quantity: Option<u32>,
}

/// Scan `description` for the names its quest type's sentence puts at fixed
/// positions. `None` if the sentence does not match.
#[must_use]
pub fn derive_hints(quest_type: QuestType, description: &str) -> Option<NameHints> {
    let text = description.trim();
    let hints = match quest_type {
        QuestType::Fetch => {
            let rest = text.strip_prefix("Find ")?;
            let (quantity, rest) = rest.split_once(' ')?;
            let (object, zone) = rest.rsplit_once(" in ")?;
            NameHints {
                object: object.to_string(),
                zone: zone.to_string(),
                quantity: Some(quantity.parse().ok()?),
                ..NameHints::default()
            }
        }
        QuestType::Delivery => {
            let rest = text.strip_prefix("Deliver ")?;
            let (rest, zone) = rest.rsplit_once(" in ")?;
            let (object, target) = rest.split_once(" to ")?;
            NameHints {
                object: object.to_string(),
                zone: zone.to_string(),
                target: target.to_string(),
                quantity: None,
            }
        }
        QuestType::Explore => NameHints {
            zone: text.strip_prefix("Explore ")?.to_string(),
            ..NameHints::default()
        },
        QuestType::Talk => {
            let (target, zone) = text.strip_prefix("Talk to ")?.rsplit_once(" in ")?;
            NameHints {
                target: target.to_string(),
                zone: zone.to_string(),
                ..NameHints::default()
            }
        }
        QuestType::Interact => {
            let (object, zone) = text.strip_prefix("Interact with ")?.rsplit_once(" in ")?;
            NameHints {
                object: object.to_string(),
                zone: zone.to_string(),
                ..NameHints::default()
            }
        }
        QuestType::Escort => return None,
    };

    let required_present = !hints.zone.trim().is_empty()
        && match quest_type {
            QuestType::Fetch | QuestType::Interact => !hints.object.trim().is_empty(),
            QuestType::Delivery => !hints.object.trim().is_empty() && !hints.target.trim().is_empty(),
            QuestType::Talk => !hints.target.trim().is_empty(),
            QuestType::Explore | QuestType::Escort => true,
        };
    required_present.then_some(hints)
}

/// Rebuild a goal from hints.
#[must_use]
pub fn hints_to_goal(quest_type: QuestType, hints: &NameHints) -> Option<QuestGoal> {
    let zone = hints.zone.clone();
    Some(match quest_type {
        QuestType::Fetch => QuestGoal::Fetch {
            item: hints.object.clone(),
            zone,
            quantity: hints.quantity.filter(|q| *q > 0)?,
        },
        QuestType::Delivery => QuestGoal::Delivery {
            item: hints.object.clone(),
            recipient: hints.target.clone(),
            zone,
        },
        QuestType::Explore => QuestGoal::Explore { zone },
        QuestType::Talk => QuestGoal::Talk {
            character: hints.target.clone(),
            zone,
        },
        QuestType::Interact => QuestGoal::Interact {
            object: hints.object.clone(),
            zone,
        },
        QuestType::Escort => return None,
    })
}

// ---------------------------------------------------------------------------
// Snapshot / restore
// ---------------------------------------------------------------------------

/// Capture the whole journal.
#[must_use]
pub fn snapshot(journal: &QuestJournal, config: &PersistenceConfig) -> QuestSnapshot {
    QuestSnapshot {
        version: config.snapshot_version,
        saved_at: Utc::now(),
        records: journal.all().iter().map(JournalQuestRecord::from_quest).collect(),
    }
}

/// A record that could not be restored.
#[derive(Debug)]
pub struct SkippedRecord {
    /// Id stored in the record.
    pub id: QuestId,
    /// Why it was skipped.
    pub error: QuestError,
}

/// Outcome of [`restore`].
#[derive(Debug, Default)]
pub struct RestoreReport {
    /// Quests rebuilt, in record order.
    pub restored: Vec<QuestId>,
    /// Records dropped.
    pub skipped: Vec<SkippedRecord>,
}

/// Replace the journal and the spawner's targets with the contents of
/// `records`.
///
/// Original ids, progress, status and tracking are kept. Targets are placed
/// again for in-progress quests only. Records that cannot be rebuilt are
/// skipped with a warning; the rest still load.
pub fn restore(
    records: &[JournalQuestRecord],
    journal: &mut QuestJournal,
    spawner: &mut QuestSpawner,
    now: GameTimestamp,
) -> RestoreReport {
    journal.clear_all();
    spawner.reset();

    let mut report = RestoreReport::default();
    let mut tracked = None;

    for record in records {
        match restore_one(record, journal, spawner, now) {
            Ok(id) => {
                if record.tracked && record.status == QuestStatus::InProgress {
                    tracked = Some(id);
                }
                report.restored.push(id);
            }
            Err(error) => {
                warn!(quest = %record.id, error = %error, "Skipping unrestorable quest record");
                report.skipped.push(SkippedRecord { id: record.id, error });
            }
        }
    }

    if let Some(id) = tracked {
        if let Err(e) = journal.set_tracked(id) {
            warn!(quest = %id, error = %e, "Could not restore tracked quest");
        }
    }

    info!(
        restored = report.restored.len(),
        skipped = report.skipped.len(),
        "Journal restored"
    );
    report
}

fn restore_one(
    record: &JournalQuestRecord,
    journal: &mut QuestJournal,
    spawner: &mut QuestSpawner,
    now: GameTimestamp,
) -> Result<QuestId> {
    let goal = spawner.resolve_goal(record.goal()?)?;
    let max_progress = goal.max_progress();
    let completed_at = match record.status {
        QuestStatus::InProgress => None,
        QuestStatus::Completed => Some(GameTimestamp {
            tick: record.completed_tick.unwrap_or(now.tick),
            real_time: now.real_time,
        }),
    };

    let quest = JournalQuest {
        id: record.id,
        title: if record.title.is_empty() {
            goal.title()
        } else {
            record.title.clone()
        },
        description: record.description.clone(),
        current_progress: record.current_progress.min(max_progress),
        max_progress,
        giver: record.giver_name.clone(),
        status: record.status,
        tracked: false,
        created_at: GameTimestamp {
            tick: record.created_tick,
            real_time: now.real_time,
        },
        completed_at,
        goal,
    };

    journal.insert_restored(quest.clone())?;
    spawner.restore_quest(&quest);
    Ok(quest.id)
}
