//! Completion evaluator.
//!
//! Decides, per quest type, how far a quest has progressed and whether it can
//! be handed in. FETCH and DELIVERY are judged from the inventory (and, for
//! DELIVERY, who the player is standing next to); EXPLORE, TALK and INTERACT
//! are one-shot flags raised by world events.
//!
//! The evaluator never changes a quest's status unless
//! `turn_in.auto_complete_on_event` is set, and then only for the one-shot
//! types.

use tracing::{debug, warn};

use crate::config::TurnInConfig;
use crate::goal::QuestGoal;
use crate::inventory::QuestInventory;
use crate::journal::{JournalQuest, ProgressChange, QuestJournal};
use crate::types::{name_key, GameTimestamp, Location, QuestId};
use crate::world::WorldMap;

/// What the evaluator can see of the player this tick.
pub struct EvalContext<'a> {
    /// The player's inventory.
    pub inventory: &'a dyn QuestInventory,
    /// Character the player is standing next to, if any.
    pub nearby_character: Option<&'a str>,
}

/// Verdict for one quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// Progress the quest has reached.
    pub progress: u32,
    /// Progress needed.
    pub max_progress: u32,
    /// Whether a hand-in would succeed right now.
    pub completable: bool,
}

/// A progress change caused by an event or a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Quest that moved.
    pub quest: QuestId,
    /// Previous progress.
    pub from: u32,
    /// New progress.
    pub to: u32,
    /// Progress needed.
    pub max: u32,
    /// Whether the quest was completed by the event itself.
    pub completed: bool,
}

/// Per-type completion rules.
#[derive(Debug, Clone)]
pub struct CompletionEvaluator {
    auto_complete_on_event: bool,
}

impl CompletionEvaluator {
    /// Create an evaluator.
    #[must_use]
    pub fn new(config: &TurnInConfig) -> Self {
        Self {
            auto_complete_on_event: config.auto_complete_on_event,
        }
    }

    /// Judge `quest` against the current player state. Pure: nothing is
    /// recorded.
    #[must_use]
    pub fn evaluate(&self, quest: &JournalQuest, ctx: &EvalContext<'_>) -> Evaluation {
        let max = quest.max_progress;
        let (progress, completable) = match &quest.goal {
            QuestGoal::Fetch { item, quantity, .. } => {
                let held = ctx.inventory.count(item, Some(quest.id));
                (
                    quest.current_progress.max(held.min(*quantity)),
                    held >= *quantity,
                )
            }
            QuestGoal::Delivery { item, recipient, .. } => {
                let holding = ctx.inventory.has_quantity(item, 1, Some(quest.id));
                let adjacent = ctx
                    .nearby_character
                    .is_some_and(|c| name_key(c) == name_key(recipient));
                let ready = holding && adjacent;
                (quest.current_progress.max(u32::from(ready)), ready)
            }
            QuestGoal::Explore { .. } | QuestGoal::Talk { .. } | QuestGoal::Interact { .. } => {
                (quest.current_progress, quest.progress_complete())
            }
        };
        Evaluation {
            progress: progress.min(max),
            max_progress: max,
            completable: completable && quest.is_active(),
        }
    }

    /// Recompute FETCH progress from quest-tagged holdings. Called once per
    /// tick.
    pub fn refresh(
        &self,
        journal: &mut QuestJournal,
        inventory: &dyn QuestInventory,
    ) -> Vec<ProgressUpdate> {
        let counts: Vec<(QuestId, u32)> = journal
            .active()
            .into_iter()
            .filter_map(|q| match &q.goal {
                QuestGoal::Fetch { item, .. } => Some((q.id, inventory.count(item, Some(q.id)))),
                _ => None,
            })
            .collect();

        counts
            .into_iter()
            .filter_map(|(id, held)| Self::advance(journal, id, held))
            .collect()
    }

    /// The player moved. Raises EXPLORE quests for whatever zone contains
    /// `player`.
    pub fn on_player_moved(
        &self,
        journal: &mut QuestJournal,
        world: &WorldMap,
        player: Location,
        now: GameTimestamp,
    ) -> Vec<ProgressUpdate> {
        match world.zone_at(&player) {
            Some(zone) => self.on_zone_entered(journal, &zone.name, now),
            None => Vec::new(),
        }
    }

    /// The player entered `zone`.
    pub fn on_zone_entered(
        &self,
        journal: &mut QuestJournal,
        zone: &str,
        now: GameTimestamp,
    ) -> Vec<ProgressUpdate> {
        let key = name_key(zone);
        let ids = Self::matching(journal, |goal| {
            matches!(goal, QuestGoal::Explore { zone } if name_key(zone) == key)
        });
        self.raise(journal, ids, now)
    }

    /// Dialogue with `character` started.
    pub fn on_dialogue_started(
        &self,
        journal: &mut QuestJournal,
        character: &str,
        now: GameTimestamp,
    ) -> Vec<ProgressUpdate> {
        let key = name_key(character);
        let ids = Self::matching(journal, |goal| {
            matches!(goal, QuestGoal::Talk { character, .. } if name_key(character) == key)
        });
        self.raise(journal, ids, now)
    }

    /// The player used `object`, spawned for `quest`.
    pub fn on_interaction(
        &self,
        journal: &mut QuestJournal,
        quest: QuestId,
        object: &str,
        now: GameTimestamp,
    ) -> Option<ProgressUpdate> {
        let entry = journal.get(quest)?;
        let is_match = entry.is_active()
            && matches!(&entry.goal, QuestGoal::Interact { object: o, .. } if name_key(o) == name_key(object));
        if !is_match {
            warn!(quest = %quest, object = %object, "Interaction does not match an active quest");
            return None;
        }
        self.raise(journal, vec![quest], now).into_iter().next()
    }

    /// Zero the progress of `quest`.
    ///
    /// # Errors
    /// [`crate::QuestError::QuestNotFound`] if the quest is unknown.
    pub fn reset(&self, journal: &mut QuestJournal, quest: QuestId) -> crate::Result<()> {
        journal.reset_progress(quest)
    }

    fn matching(journal: &QuestJournal, pred: impl Fn(&QuestGoal) -> bool) -> Vec<QuestId> {
        journal
            .active()
            .into_iter()
            .filter(|q| pred(&q.goal))
            .map(|q| q.id)
            .collect()
    }

    fn raise(&self, journal: &mut QuestJournal, ids: Vec<QuestId>, now: GameTimestamp) -> Vec<ProgressUpdate> {
        ids.into_iter()
            .filter_map(|id| {
                let mut update = Self::advance(journal, id, 1)?;
                if self.auto_complete_on_event && journal.complete(id, now).unwrap_or(false) {
                    update.completed = true;
                }
                Some(update)
            })
            .collect()
    }

    fn advance(journal: &mut QuestJournal, id: QuestId, value: u32) -> Option<ProgressUpdate> {
        match journal.record_progress(id, value) {
            Ok(ProgressChange::Advanced { from, to }) => {
                let max = journal.get(id).map_or(to, |q| q.max_progress);
                debug!(quest = %id, from, to, max, "Progress update");
                Some(ProgressUpdate {
                    quest: id,
                    from,
                    to,
                    max,
                    completed: false,
                })
            }
            Ok(ProgressChange::Unchanged) | Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JournalConfig, WorldConfig};
    use crate::directive::QuestToken;
    use crate::inventory::Inventory;

    fn journal_with(goal: QuestGoal) -> (QuestJournal, QuestId) {
        let mut journal = QuestJournal::new(&JournalConfig::default());
        let id = journal
            .add(&QuestToken::from_goal(goal), "Elena", GameTimestamp::now(1))
            .unwrap()
            .id;
        (journal, id)
    }

    fn ctx<'a>(inventory: &'a Inventory, nearby: Option<&'a str>) -> EvalContext<'a> {
        EvalContext {
            inventory,
            nearby_character: nearby,
        }
    }

    #[test]
    fn fetch_counts_only_quest_tagged_items() {
        let (mut journal, id) = journal_with(QuestGoal::Fetch {
            item: "crystal".into(),
            zone: "laboratory".into(),
            quantity: 3,
        });
        let evaluator = CompletionEvaluator::new(&TurnInConfig::default());
        let mut inventory = Inventory::new();
        inventory.add("crystal", 2, Some(id));
        inventory.add("crystal", 5, None);

        let updates = evaluator.refresh(&mut journal, &inventory);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].to, 2);

        let eval = evaluator.evaluate(journal.get(id).unwrap(), &ctx(&inventory, None));
        assert_eq!(eval.progress, 2);
        assert!(!eval.completable);

        inventory.add("crystal", 1, Some(id));
        evaluator.refresh(&mut journal, &inventory);
        let eval = evaluator.evaluate(journal.get(id).unwrap(), &ctx(&inventory, None));
        assert_eq!((eval.progress, eval.completable), (3, true));
    }

    #[test]
    fn fetch_progress_does_not_drop_when_items_leave() {
        let (mut journal, id) = journal_with(QuestGoal::Fetch {
            item: "crystal".into(),
            zone: "laboratory".into(),
            quantity: 3,
        });
        let evaluator = CompletionEvaluator::new(&TurnInConfig::default());
        let mut inventory = Inventory::new();
        inventory.add("crystal", 2, Some(id));
        evaluator.refresh(&mut journal, &inventory);
        inventory.remove("crystal", 2, Some(id)).unwrap();
        assert!(evaluator.refresh(&mut journal, &inventory).is_empty());

        let eval = evaluator.evaluate(journal.get(id).unwrap(), &ctx(&inventory, None));
        assert_eq!(eval.progress, 2);
        assert!(!eval.completable);
    }

    #[test]
    fn delivery_needs_parcel_and_recipient() {
        let (journal, id) = journal_with(QuestGoal::Delivery {
            item: "parcel".into(),
            recipient: "Marco".into(),
            zone: "market".into(),
        });
        let evaluator = CompletionEvaluator::new(&TurnInConfig::default());
        let mut inventory = Inventory::new();
        let quest = journal.get(id).unwrap();

        assert!(!evaluator.evaluate(quest, &ctx(&inventory, Some("Marco"))).completable);
        inventory.add("parcel", 1, Some(id));
        assert!(!evaluator.evaluate(quest, &ctx(&inventory, Some("Elena"))).completable);
        let eval = evaluator.evaluate(quest, &ctx(&inventory, Some("marco")));
        assert_eq!((eval.progress, eval.completable), (1, true));
    }

    #[test]
    fn explore_is_one_shot() {
        let (mut journal, id) = journal_with(QuestGoal::Explore { zone: "ruins".into() });
        let evaluator = CompletionEvaluator::new(&TurnInConfig::default());
        let world = WorldMap::from_config(&WorldConfig::default());
        let ruins = world.resolve_zone("ruins").unwrap().bounds.center();
        let market = world.resolve_zone("market").unwrap().bounds.center();

        assert!(evaluator
            .on_player_moved(&mut journal, &world, market, GameTimestamp::now(2))
            .is_empty());
        let updates = evaluator.on_player_moved(&mut journal, &world, ruins, GameTimestamp::now(3));
        assert_eq!(updates.len(), 1);
        assert!(!updates[0].completed);
        assert!(evaluator
            .on_player_moved(&mut journal, &world, ruins, GameTimestamp::now(4))
            .is_empty());

        let quest = journal.get(id).unwrap();
        let inventory = Inventory::new();
        let eval = evaluator.evaluate(quest, &ctx(&inventory, None));
        assert_eq!((eval.progress, eval.max_progress, eval.completable), (1, 1, true));
        assert!(quest.is_active());
    }

    #[test]
    fn auto_complete_flips_status_on_event() {
        let (mut journal, id) = journal_with(QuestGoal::Talk {
            character: "Marco".into(),
            zone: "market".into(),
        });
        let evaluator = CompletionEvaluator::new(&TurnInConfig {
            auto_complete_on_event: true,
            ..TurnInConfig::default()
        });
        let updates = evaluator.on_dialogue_started(&mut journal, "MARCO", GameTimestamp::now(2));
        assert!(updates[0].completed);
        assert!(!journal.get(id).unwrap().is_active());
    }

    #[test]
    fn interaction_must_match_object() {
        let (mut journal, id) = journal_with(QuestGoal::Interact {
            object: "terminal".into(),
            zone: "security".into(),
        });
        let evaluator = CompletionEvaluator::new(&TurnInConfig::default());
        assert!(evaluator
            .on_interaction(&mut journal, id, "lever", GameTimestamp::now(2))
            .is_none());
        assert!(evaluator
            .on_interaction(&mut journal, id, "Terminal", GameTimestamp::now(2))
            .is_some());

        evaluator.reset(&mut journal, id).unwrap();
        assert_eq!(journal.get(id).unwrap().current_progress, 0);
    }
}
