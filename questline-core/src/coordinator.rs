//! Per-character turn-in coordinator.
//!
//! Each quest-relevant character owns one [`TurnInCoordinator`]:
//!
//! ```text
//! Idle ──enter range──▶ PlayerInRange ──evaluator says yes──▶ Completable
//!   ▲                        │  ▲                                  │
//!   └──────leave range───────┘  └──────────not any more────────────┤
//!                                                           confirm│
//!                                                                  ▼
//!                                                              Resolved
//! ```
//!
//! Confirming a hand-in is the only path that moves a quest to `Completed`
//! (besides auto-completion of one-shot quests). The transaction runs in a
//! fixed order: re-evaluate, debit the inventory, flip the ledger, release
//! world targets. A failed debit aborts before anything is mutated.

use tracing::{debug, info, warn};

use crate::error::{QuestError, Result};
use crate::evaluator::{CompletionEvaluator, EvalContext, Evaluation};
use crate::goal::QuestGoal;
use crate::inventory::QuestInventory;
use crate::journal::{JournalQuest, QuestJournal};
use crate::spawner::QuestSpawner;
use crate::types::{GameTimestamp, Location, QuestId};

/// What the player gives up at turn-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandIn {
    /// Items leave the inventory.
    Items {
        /// Item name.
        item: String,
        /// How many.
        quantity: u32,
    },
    /// Nothing changes hands; the character only acknowledges the quest.
    Informational,
}

impl HandIn {
    fn for_goal(goal: &QuestGoal) -> Self {
        match goal.hand_in_items() {
            Some((item, quantity)) => Self::Items {
                item: item.to_string(),
                quantity,
            },
            None => Self::Informational,
        }
    }
}

/// Coordinator state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TurnInState {
    /// Player out of range.
    #[default]
    Idle,
    /// Player in range, nothing to hand in.
    PlayerInRange,
    /// Player in range and `quest` can be handed in.
    Completable {
        /// Quest ready for hand-in.
        quest: QuestId,
        /// What the hand-in takes.
        hand_in: HandIn,
    },
    /// `quest` was handed in while the player stayed in range.
    Resolved {
        /// The completed quest.
        quest: QuestId,
    },
}

/// Signals emitted by a successful turn-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestSignal {
    /// A quest moved to `Completed`.
    Completed {
        /// The quest.
        quest: QuestId,
        /// Character that gave it.
        giver: String,
    },
}

/// Result of a confirmed hand-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnInOutcome {
    /// Completed quest.
    pub quest: QuestId,
    /// Character that gave it.
    pub giver: String,
    /// Journal title.
    pub title: String,
    /// Line spoken by the coordinator's character.
    pub closing_line: String,
    /// Items debited, if any.
    pub items_removed: Option<(String, u32)>,
    /// World targets despawned.
    pub targets_released: usize,
}

impl TurnInOutcome {
    /// The signal to broadcast for this outcome.
    #[must_use]
    pub fn signal(&self) -> QuestSignal {
        QuestSignal::Completed {
            quest: self.quest,
            giver: self.giver.clone(),
        }
    }
}

/// Hand-in state machine for one character.
#[derive(Debug, Clone)]
pub struct TurnInCoordinator {
    character: String,
    location: Location,
    range: f32,
    state: TurnInState,
}

impl TurnInCoordinator {
    /// Create a coordinator for `character` standing at `location`.
    #[must_use]
    pub fn new(character: &str, location: Location, range: f32) -> Self {
        Self {
            character: character.trim().to_string(),
            location,
            range,
            state: TurnInState::Idle,
        }
    }

    /// Character this coordinator speaks for.
    #[must_use]
    pub fn character(&self) -> &str {
        &self.character
    }

    /// Where the character stands.
    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }

    /// Move the character.
    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &TurnInState {
        &self.state
    }

    /// Whether `player` is close enough to talk.
    #[must_use]
    pub fn in_range(&self, player: &Location) -> bool {
        self.location.distance_to(player) <= self.range
    }

    /// Advance the state machine for this tick.
    ///
    /// Every quest tied to the character is considered; the first one the
    /// evaluator accepts becomes the hand-in, and its evaluated progress is
    /// written to the journal.
    pub fn update(
        &mut self,
        player: Location,
        journal: &mut QuestJournal,
        evaluator: &CompletionEvaluator,
        inventory: &dyn QuestInventory,
    ) -> &TurnInState {
        if !self.in_range(&player) {
            if self.state != TurnInState::Idle {
                debug!(character = %self.character, "Player left range");
            }
            self.state = TurnInState::Idle;
            return &self.state;
        }

        let candidates = journal.candidates_for_character(&self.character);
        if matches!(self.state, TurnInState::Resolved { .. }) && candidates.is_empty() {
            return &self.state;
        }

        let ready = candidates.into_iter().find_map(|q| {
            let evaluation = self.evaluate(q, evaluator, inventory);
            evaluation
                .completable
                .then(|| (q.id, HandIn::for_goal(&q.goal), evaluation.progress))
        });

        let next = match ready {
            Some((quest, hand_in, progress)) => {
                if let Err(e) = journal.record_progress(quest, progress) {
                    warn!(quest = %quest, error = %e, "Could not record hand-in progress");
                }
                TurnInState::Completable { quest, hand_in }
            }
            None => TurnInState::PlayerInRange,
        };
        if next != self.state {
            debug!(character = %self.character, state = ?next, "Turn-in state changed");
        }
        self.state = next;
        &self.state
    }

    fn evaluate(
        &self,
        quest: &JournalQuest,
        evaluator: &CompletionEvaluator,
        inventory: &dyn QuestInventory,
    ) -> Evaluation {
        let ctx = EvalContext {
            inventory,
            nearby_character: Some(&self.character),
        };
        evaluator.evaluate(quest, &ctx)
    }

    /// Perform the exposed hand-in.
    ///
    /// # Errors
    /// - [`QuestError::NoHandIn`] if the coordinator is not `Completable`.
    /// - [`QuestError::NotCompletable`] if re-evaluation fails.
    /// - [`QuestError::HandInFailed`] if the inventory refuses the debit.
    ///
    /// On error the journal, the inventory and the world are unchanged.
    pub fn confirm(
        &mut self,
        journal: &mut QuestJournal,
        spawner: &mut QuestSpawner,
        evaluator: &CompletionEvaluator,
        inventory: &mut dyn QuestInventory,
        now: GameTimestamp,
    ) -> Result<TurnInOutcome> {
        let TurnInState::Completable { quest: id, .. } = self.state else {
            return Err(QuestError::NoHandIn(self.character.clone()));
        };
        let quest = journal.get(id).ok_or(QuestError::QuestNotFound(id))?.clone();

        if !quest.is_active() || !self.evaluate(&quest, evaluator, &*inventory).completable {
            self.state = TurnInState::PlayerInRange;
            return Err(QuestError::NotCompletable(id));
        }

        let items_removed = match quest.goal.hand_in_items() {
            Some((item, quantity)) => {
                inventory
                    .remove(item, quantity, Some(id))
                    .map_err(|source| {
                        warn!(quest = %id, error = %source, "Hand-in debit failed");
                        QuestError::HandInFailed { quest: id, source }
                    })?;
                Some((item.to_string(), quantity))
            }
            None => None,
        };

        journal.record_progress(id, quest.max_progress)?;
        journal.complete(id, now)?;
        let targets_released = spawner.release(id);
        self.state = TurnInState::Resolved { quest: id };

        info!(
            quest = %id,
            character = %self.character,
            giver = %quest.giver,
            "Quest handed in"
        );
        Ok(TurnInOutcome {
            quest: id,
            giver: quest.giver.clone(),
            title: quest.title.clone(),
            closing_line: quest.goal.completion_line(&self.character),
            items_removed,
            targets_released,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JournalConfig, TurnInConfig, WorldConfig};
    use crate::directive::QuestToken;
    use crate::inventory::{Inventory, InventoryError};
    use crate::world::WorldMap;

    struct Fixture {
        journal: QuestJournal,
        spawner: QuestSpawner,
        evaluator: CompletionEvaluator,
        inventory: Inventory,
    }

    fn fixture() -> Fixture {
        let mut world = WorldMap::from_config(&WorldConfig::default());
        world.register_character("Marco", "market");
        Fixture {
            journal: QuestJournal::new(&JournalConfig::default()),
            spawner: QuestSpawner::new(world, 20, Some(1)),
            evaluator: CompletionEvaluator::new(&TurnInConfig::default()),
            inventory: Inventory::new(),
        }
    }

    fn accept(f: &mut Fixture, goal: QuestGoal) -> QuestId {
        f.spawner
            .accept_token(
                &mut f.journal,
                &QuestToken::from_goal(goal),
                "Elena",
                GameTimestamp::now(1),
            )
            .unwrap()
            .id
    }

    fn crystals(quantity: u32) -> QuestGoal {
        QuestGoal::Fetch {
            item: "crystal".into(),
            zone: "laboratory".into(),
            quantity,
        }
    }

    const NEAR: Location = Location::new(1.0, 0.0, 0.0);
    const FAR: Location = Location::new(100.0, 0.0, 0.0);

    #[test]
    fn fetch_hand_in_debits_and_completes() {
        let mut f = fixture();
        let id = accept(&mut f, crystals(3));
        let mut elena = TurnInCoordinator::new("Elena", Location::default(), 3.0);

        f.inventory.add("crystal", 2, Some(id));
        assert_eq!(
            elena.update(NEAR, &mut f.journal, &f.evaluator, &f.inventory),
            &TurnInState::PlayerInRange
        );

        f.inventory.add("crystal", 1, Some(id));
        assert!(matches!(
            elena.update(NEAR, &mut f.journal, &f.evaluator, &f.inventory),
            TurnInState::Completable { hand_in: HandIn::Items { quantity: 3, .. }, .. }
        ));

        let outcome = elena
            .confirm(&mut f.journal, &mut f.spawner, &f.evaluator, &mut f.inventory, GameTimestamp::now(5))
            .unwrap();
        assert_eq!(outcome.items_removed, Some(("crystal".to_string(), 3)));
        assert_eq!(outcome.targets_released, 3);
        assert_eq!(f.inventory.count("crystal", Some(id)), 0);
        let quest = f.journal.get(id).unwrap();
        assert!(!quest.is_active());
        assert_eq!(quest.current_progress, 3);
        assert_eq!(elena.state(), &TurnInState::Resolved { quest: id });
        assert!(matches!(outcome.signal(), QuestSignal::Completed { quest, .. } if quest == id));
    }

    #[test]
    fn leaving_range_discards_completable() {
        let mut f = fixture();
        let id = accept(&mut f, crystals(1));
        f.inventory.add("crystal", 1, Some(id));
        let mut elena = TurnInCoordinator::new("Elena", Location::default(), 3.0);

        elena.update(NEAR, &mut f.journal, &f.evaluator, &f.inventory);
        elena.update(FAR, &mut f.journal, &f.evaluator, &f.inventory);
        assert_eq!(elena.state(), &TurnInState::Idle);
        let err = elena
            .confirm(&mut f.journal, &mut f.spawner, &f.evaluator, &mut f.inventory, GameTimestamp::now(2))
            .unwrap_err();
        assert!(matches!(err, QuestError::NoHandIn(_)));
        assert!(f.journal.get(id).unwrap().is_active());
    }

    #[test]
    fn confirm_re_evaluates_before_debit() {
        let mut f = fixture();
        let id = accept(&mut f, crystals(2));
        f.inventory.add("crystal", 2, Some(id));
        let mut elena = TurnInCoordinator::new("Elena", Location::default(), 3.0);
        elena.update(NEAR, &mut f.journal, &f.evaluator, &f.inventory);

        f.inventory.remove("crystal", 1, Some(id)).unwrap();
        let err = elena
            .confirm(&mut f.journal, &mut f.spawner, &f.evaluator, &mut f.inventory, GameTimestamp::now(2))
            .unwrap_err();
        assert!(matches!(err, QuestError::NotCompletable(q) if q == id));
        assert_eq!(f.inventory.count("crystal", Some(id)), 1);
        assert!(f.journal.get(id).unwrap().is_active());
        assert_eq!(elena.state(), &TurnInState::PlayerInRange);
    }

    /// Inventory that reports items but refuses to part with them.
    struct StickyInventory(Inventory);

    impl QuestInventory for StickyInventory {
        fn count(&self, item: &str, quest: Option<QuestId>) -> u32 {
            self.0.count(item, quest)
        }
        fn add(&mut self, item: &str, quantity: u32, quest: Option<QuestId>) {
            self.0.add(item, quantity, quest);
        }
        fn remove(&mut self, item: &str, quantity: u32, _quest: Option<QuestId>) -> std::result::Result<(), InventoryError> {
            Err(InventoryError::Insufficient {
                item: item.to_string(),
                requested: quantity,
                available: 0,
            })
        }
    }

    #[test]
    fn failed_debit_leaves_quest_in_progress() {
        let mut f = fixture();
        let id = accept(&mut f, crystals(1));
        let mut sticky = StickyInventory(Inventory::new());
        sticky.add("crystal", 1, Some(id));
        let mut elena = TurnInCoordinator::new("Elena", Location::default(), 3.0);
        elena.update(NEAR, &mut f.journal, &f.evaluator, &sticky);

        let err = elena
            .confirm(&mut f.journal, &mut f.spawner, &f.evaluator, &mut sticky, GameTimestamp::now(2))
            .unwrap_err();
        assert!(matches!(err, QuestError::HandInFailed { quest, .. } if quest == id));
        let quest = f.journal.get(id).unwrap();
        assert!(quest.is_active());
        assert!(quest.completed_at.is_none());
        assert_eq!(f.spawner.targets().for_quest(id).len(), 1);
        assert_eq!(sticky.count("crystal", Some(id)), 1);
    }

    #[test]
    fn explore_hand_in_is_informational() {
        let mut f = fixture();
        let id = accept(&mut f, QuestGoal::Explore { zone: "ruins".into() });
        f.evaluator.on_zone_entered(&mut f.journal, "ruins", GameTimestamp::now(2));
        let mut elena = TurnInCoordinator::new("Elena", Location::default(), 3.0);

        assert!(matches!(
            elena.update(NEAR, &mut f.journal, &f.evaluator, &f.inventory),
            TurnInState::Completable { hand_in: HandIn::Informational, .. }
        ));
        let outcome = elena
            .confirm(&mut f.journal, &mut f.spawner, &f.evaluator, &mut f.inventory, GameTimestamp::now(3))
            .unwrap();
        assert!(outcome.items_removed.is_none());
        assert!(outcome.closing_line.starts_with("Elena:"));
        assert!(!f.journal.get(id).unwrap().is_active());
    }

    #[test]
    fn delivery_is_handed_in_at_recipient() {
        let mut f = fixture();
        let id = accept(
            &mut f,
            QuestGoal::Delivery {
                item: "parcel".into(),
                recipient: "Marco".into(),
                zone: "market".into(),
            },
        );
        f.inventory.add("parcel", 1, Some(id));
        let mut elena = TurnInCoordinator::new("Elena", Location::default(), 3.0);
        let mut marco = TurnInCoordinator::new("Marco", Location::default(), 3.0);

        assert_eq!(
            elena.update(NEAR, &mut f.journal, &f.evaluator, &f.inventory),
            &TurnInState::PlayerInRange
        );
        assert!(matches!(
            marco.update(NEAR, &mut f.journal, &f.evaluator, &f.inventory),
            TurnInState::Completable { .. }
        ));
        let outcome = marco
            .confirm(&mut f.journal, &mut f.spawner, &f.evaluator, &mut f.inventory, GameTimestamp::now(3))
            .unwrap();
        assert_eq!(outcome.giver, "Elena");
        assert_eq!(f.inventory.count("parcel", Some(id)), 0);
    }

    fn parcel_for_marco() -> QuestGoal {
        QuestGoal::Delivery {
            item: "parcel".into(),
            recipient: "Marco".into(),
            zone: "market".into(),
        }
    }

    #[test]
    fn delivery_reaches_recipient_busy_with_own_quest() {
        let mut f = fixture();
        let own = f
            .spawner
            .accept_token(
                &mut f.journal,
                &QuestToken::from_goal(QuestGoal::Explore { zone: "ruins".into() }),
                "Marco",
                GameTimestamp::now(1),
            )
            .unwrap()
            .id;
        let delivery = accept(&mut f, parcel_for_marco());
        f.inventory.add("parcel", 1, Some(delivery));
        let mut marco = TurnInCoordinator::new("Marco", Location::default(), 3.0);

        assert_eq!(
            marco.update(NEAR, &mut f.journal, &f.evaluator, &f.inventory),
            &TurnInState::Completable {
                quest: delivery,
                hand_in: HandIn::Items {
                    item: "parcel".into(),
                    quantity: 1
                }
            }
        );
        marco
            .confirm(&mut f.journal, &mut f.spawner, &f.evaluator, &mut f.inventory, GameTimestamp::now(2))
            .unwrap();
        assert!(!f.journal.get(delivery).unwrap().is_active());
        assert!(f.journal.get(own).unwrap().is_active());
    }

    #[test]
    fn completable_delivery_shows_full_progress_before_hand_in() {
        let mut f = fixture();
        let id = accept(&mut f, parcel_for_marco());
        f.inventory.add("parcel", 1, Some(id));
        assert_eq!(f.journal.get(id).unwrap().progress_text(), "0/1");

        let mut marco = TurnInCoordinator::new("Marco", Location::default(), 3.0);
        marco.update(NEAR, &mut f.journal, &f.evaluator, &f.inventory);
        let quest = f.journal.get(id).unwrap();
        assert_eq!(quest.progress_text(), "1/1");
        assert!(quest.is_active());
    }
}
