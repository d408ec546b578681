//! The tick-driven quest session.
//!
//! [`QuestSession`] owns one instance of every core service and wires them
//! together. The host calls, once per frame:
//!
//! 1. [`QuestSession::handle_event`] for each game event it observed;
//! 2. [`QuestSession::tick`], which drains generated text, refreshes FETCH
//!    progress, advances every coordinator and returns the world commands
//!    to apply (see [`crate::hooks::apply_commands`]).
//!
//! Hand-ins are player actions and go through
//! [`QuestSession::confirm_hand_in`].

use std::collections::HashMap;

use questline_core::config::QuestConfig;
use questline_core::coordinator::{QuestSignal, TurnInCoordinator, TurnInOutcome, TurnInState};
use questline_core::directive::parse_directives;
use questline_core::error::{QuestError, Result};
use questline_core::evaluator::{CompletionEvaluator, ProgressUpdate};
use questline_core::inventory::QuestInventory;
use questline_core::journal::QuestJournal;
use questline_core::metrics::QuestCounters;
use questline_core::persistence::{self, QuestSnapshot, RestoreReport};
use questline_core::spawner::{ActiveQuest, QuestSpawner};
use questline_core::types::{name_key, GameTimestamp, Location};
use questline_core::world::WorldCommand;
use questline_llm::GenerationInbox;
use tracing::{debug, info, warn};

use crate::events::GameEvent;

/// What came of one block of generated text.
#[derive(Debug, Default)]
pub struct DialogueResult {
    /// Character that spoke.
    pub giver: String,
    /// Text to show the player, directives removed.
    pub display_text: String,
    /// Quests created from the text.
    pub accepted: Vec<ActiveQuest>,
    /// Tokens the spawner refused.
    pub rejected: Vec<QuestError>,
}

/// Everything a tick produced.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Generated text that arrived this tick.
    pub dialogue: Vec<DialogueResult>,
    /// Progress changes.
    pub progress: Vec<ProgressUpdate>,
    /// Commands for the world-object layer and inventory.
    pub commands: Vec<WorldCommand>,
}

/// One player's quest state and the services acting on it.
pub struct QuestSession {
    config: QuestConfig,
    journal: QuestJournal,
    spawner: QuestSpawner,
    evaluator: CompletionEvaluator,
    coordinators: HashMap<String, TurnInCoordinator>,
    inbox: GenerationInbox,
    counters: QuestCounters,
    signals: Vec<QuestSignal>,
    tick: u64,
    player: Location,
}

impl QuestSession {
    /// Build every service from `config`.
    #[must_use]
    pub fn new(config: QuestConfig) -> Self {
        Self {
            journal: QuestJournal::new(&config.journal),
            spawner: QuestSpawner::from_config(&config),
            evaluator: CompletionEvaluator::new(&config.turn_in),
            coordinators: HashMap::new(),
            inbox: GenerationInbox::new(),
            counters: QuestCounters::new(),
            signals: Vec::new(),
            tick: 0,
            player: Location::default(),
            config,
        }
    }

    fn now(&self) -> GameTimestamp {
        GameTimestamp::now(self.tick)
    }

    // -- accessors ----------------------------------------------------------

    /// The ledger.
    #[must_use]
    pub fn journal(&self) -> &QuestJournal {
        &self.journal
    }

    /// Mutable ledger access, e.g. to change the tracked quest.
    pub fn journal_mut(&mut self) -> &mut QuestJournal {
        &mut self.journal
    }

    /// The spawner and its world map.
    #[must_use]
    pub fn spawner(&self) -> &QuestSpawner {
        &self.spawner
    }

    /// Inbox for text-service responses.
    #[must_use]
    pub fn inbox(&self) -> &GenerationInbox {
        &self.inbox
    }

    /// Lifecycle counters.
    #[must_use]
    pub fn counters(&self) -> &QuestCounters {
        &self.counters
    }

    /// Current game tick.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Last known player position.
    #[must_use]
    pub fn player(&self) -> Location {
        self.player
    }

    /// Coordinator state for `character`.
    #[must_use]
    pub fn turn_in_state(&self, character: &str) -> Option<&TurnInState> {
        self.coordinators.get(&name_key(character)).map(TurnInCoordinator::state)
    }

    /// Take the signals emitted since the last call.
    pub fn take_signals(&mut self) -> Vec<QuestSignal> {
        std::mem::take(&mut self.signals)
    }

    // -- setup --------------------------------------------------------------

    /// Register a character standing at `location`: it becomes a world
    /// anchor (in whatever zone contains it) and gets a turn-in coordinator.
    ///
    /// # Errors
    /// [`QuestError::UnknownZone`] if no zone contains `location`.
    pub fn register_character(&mut self, name: &str, location: Location) -> Result<()> {
        let zone = self
            .spawner
            .world()
            .zone_at(&location)
            .map(|z| z.name.clone())
            .ok_or_else(|| QuestError::UnknownZone(location.to_string()))?;
        self.spawner.world_mut().register_character(name, &zone);

        let range = self.config.turn_in.interaction_range;
        self.coordinators
            .entry(name_key(name))
            .and_modify(|c| c.set_location(location))
            .or_insert_with(|| TurnInCoordinator::new(name, location, range));
        info!(character = %name, zone = %zone, "Character registered");
        Ok(())
    }

    // -- text ---------------------------------------------------------------

    /// Parse text spoken by `giver` and accept every directive in it.
    pub fn ingest_text(&mut self, giver: &str, text: &str) -> DialogueResult {
        let parsed = parse_directives(text);
        QuestCounters::add(&self.counters.directives_parsed, parsed.tokens.len() as u64);
        QuestCounters::add(&self.counters.directives_dropped, parsed.rejected.len() as u64);

        let mut result = DialogueResult {
            giver: giver.to_string(),
            display_text: parsed.display_text,
            ..DialogueResult::default()
        };
        if !self.config.general.enabled {
            debug!(giver = %giver, "Quest directives disabled, text stripped only");
            return result;
        }

        let now = self.now();
        for token in &parsed.tokens {
            match self.spawner.accept_token(&mut self.journal, token, giver, now) {
                Ok(quest) => {
                    QuestCounters::add(&self.counters.quests_accepted, 1);
                    result.accepted.push(quest);
                }
                Err(e) => {
                    QuestCounters::add(&self.counters.quests_rejected, 1);
                    warn!(giver = %giver, directive = %token.directive, error = %e, "Quest token rejected");
                    result.rejected.push(e);
                }
            }
        }
        result
    }

    // -- events -------------------------------------------------------------

    /// React to a host event.
    pub fn handle_event(
        &mut self,
        event: &GameEvent,
        inventory: &mut dyn QuestInventory,
    ) -> Vec<ProgressUpdate> {
        let now = self.now();
        debug!(event = event.kind(), tick = self.tick, "Handling game event");
        let updates = match event {
            GameEvent::PlayerMoved { location } => {
                self.player = *location;
                self.evaluator
                    .on_player_moved(&mut self.journal, self.spawner.world(), *location, now)
            }
            GameEvent::TargetCollected { target } => match self.spawner.collect(*target) {
                Some(collected) => {
                    inventory.add(&collected.item, 1, Some(collected.quest));
                    self.evaluator.refresh(&mut self.journal, &*inventory)
                }
                None => Vec::new(),
            },
            GameEvent::TargetUsed { target } => self
                .spawner
                .interact(*target)
                .and_then(|(quest, object)| {
                    self.evaluator
                        .on_interaction(&mut self.journal, quest, &object, now)
                })
                .into_iter()
                .collect(),
            GameEvent::DialogueOpened { character } => {
                self.evaluator
                    .on_dialogue_started(&mut self.journal, character, now)
            }
        };
        self.settle(&updates);
        updates
    }

    /// Release targets and emit signals for quests completed by an event.
    fn settle(&mut self, updates: &[ProgressUpdate]) {
        for update in updates.iter().filter(|u| u.completed) {
            self.spawner.release(update.quest);
            QuestCounters::add(&self.counters.quests_completed, 1);
            if let Some(quest) = self.journal.get(update.quest) {
                self.signals.push(QuestSignal::Completed {
                    quest: quest.id,
                    giver: quest.giver.clone(),
                });
            }
        }
    }

    // -- tick ---------------------------------------------------------------

    /// Advance one frame.
    pub fn tick(&mut self, inventory: &dyn QuestInventory) -> TickReport {
        self.tick += 1;
        let mut report = TickReport::default();

        for generated in self.inbox.drain() {
            let result = self.ingest_text(&generated.giver, &generated.text);
            report.dialogue.push(result);
        }

        report.progress = self.evaluator.refresh(&mut self.journal, inventory);

        for coordinator in self.coordinators.values_mut() {
            coordinator.update(self.player, &mut self.journal, &self.evaluator, inventory);
        }

        report.commands = self.spawner.drain_commands();
        report
    }

    // -- hand-in ------------------------------------------------------------

    /// Confirm the hand-in offered by `character`.
    ///
    /// # Errors
    /// [`QuestError::NoHandIn`] if the character has no coordinator or
    /// nothing to hand in, plus everything
    /// [`TurnInCoordinator::confirm`] returns.
    pub fn confirm_hand_in(
        &mut self,
        character: &str,
        inventory: &mut dyn QuestInventory,
    ) -> Result<TurnInOutcome> {
        let now = self.now();
        let coordinator = self
            .coordinators
            .get_mut(&name_key(character))
            .ok_or_else(|| QuestError::NoHandIn(character.to_string()))?;

        match coordinator.confirm(
            &mut self.journal,
            &mut self.spawner,
            &self.evaluator,
            inventory,
            now,
        ) {
            Ok(outcome) => {
                QuestCounters::add(&self.counters.quests_completed, 1);
                self.signals.push(outcome.signal());
                Ok(outcome)
            }
            Err(e) => {
                if matches!(e, QuestError::HandInFailed { .. }) {
                    QuestCounters::add(&self.counters.hand_in_failures, 1);
                }
                Err(e)
            }
        }
    }

    // -- persistence ----------------------------------------------------------

    /// Snapshot the journal as JSON for the host's save file.
    ///
    /// # Errors
    /// [`QuestError::Serialization`] if encoding fails.
    pub fn save(&self) -> Result<String> {
        persistence::snapshot(&self.journal, &self.config.persistence).to_json()
    }

    /// Replace the journal with a saved snapshot.
    ///
    /// # Errors
    /// [`QuestError::Serialization`] if `json` is not a snapshot. Individual
    /// bad records are skipped and listed in the report instead.
    pub fn load(&mut self, json: &str) -> Result<RestoreReport> {
        let snapshot = QuestSnapshot::from_json(json)?;
        if snapshot.version > self.config.persistence.snapshot_version {
            warn!(
                version = snapshot.version,
                supported = self.config.persistence.snapshot_version,
                "Snapshot is newer than this build"
            );
        }
        let now = self.now();
        let report = persistence::restore(&snapshot.records, &mut self.journal, &mut self.spawner, now);
        QuestCounters::add(&self.counters.restore_skipped, report.skipped.len() as u64);
        Ok(report)
    }
}
