//! Session Tests: a host driving `QuestSession` frame by frame.

use std::collections::HashMap;
use std::time::Duration;

use questline_core::config::QuestConfig;
use questline_core::coordinator::{QuestSignal, TurnInState};
use questline_core::inventory::{Inventory, QuestInventory};
use questline_core::journal::QuestStatus;
use questline_core::types::{Location, QuestId, TargetId};
use questline_core::world::WorldTarget;
use questline_core::QuestError;
use questline_world::hooks::{self, WorldHost};
use questline_world::{dialogue, GameEvent, QuestSession};

/// World-object layer that just remembers what is placed.
#[derive(Default)]
struct Props {
    placed: HashMap<TargetId, WorldTarget>,
}

impl WorldHost for Props {
    fn spawn(&mut self, target: &WorldTarget) {
        self.placed.insert(target.id, target.clone());
    }

    fn despawn(&mut self, target: TargetId, _quest: QuestId) {
        self.placed.remove(&target);
    }
}

struct Host {
    session: QuestSession,
    props: Props,
    inventory: Inventory,
}

impl Host {
    fn new(config: QuestConfig) -> Self {
        let mut session = QuestSession::new(config);
        let lab = zone_center(&session, "laboratory");
        let market = zone_center(&session, "market");
        session.register_character("Elena", lab).unwrap();
        session.register_character("Marco", market).unwrap();
        Self {
            session,
            props: Props::default(),
            inventory: Inventory::new(),
        }
    }

    fn frame(&mut self) {
        let report = self.session.tick(&self.inventory);
        hooks::apply_commands(report.commands, &mut self.props, &mut self.inventory);
    }

    fn event(&mut self, event: GameEvent) {
        self.session.handle_event(&event, &mut self.inventory);
    }

    fn walk_to(&mut self, location: Location) {
        self.event(hooks::on_player_moved(location));
        self.frame();
    }
}

fn zone_center(session: &QuestSession, zone: &str) -> Location {
    session
        .spawner()
        .world()
        .resolve_zone(zone)
        .unwrap()
        .bounds
        .center()
}

fn seeded() -> QuestConfig {
    let mut config = QuestConfig::default();
    config.world.spawn_seed = Some(3);
    config
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

#[test]
fn fetch_quest_from_text_to_hand_in() {
    let mut host = Host::new(seeded());
    let said = host
        .session
        .ingest_text("Elena", "Bring me [QUEST:FETCH:crystal:lab:3] please");
    assert_eq!(said.display_text, "Bring me  please");
    assert_eq!(said.accepted.len(), 1);
    let quest = said.accepted[0].id;

    host.frame();
    assert_eq!(host.props.placed.len(), 3);

    let targets: Vec<TargetId> = host.props.placed.keys().copied().collect();
    for target in targets {
        host.event(hooks::on_pickup(target));
    }
    host.frame();
    assert!(host.props.placed.is_empty());
    assert_eq!(host.inventory.count("crystal", Some(quest)), 3);
    assert_eq!(host.session.journal().get(quest).unwrap().current_progress, 3);

    let elena = zone_center(&host.session, "laboratory");
    host.walk_to(Location::new(elena.x + 1.0, elena.y, elena.z));
    let state = host.session.turn_in_state("Elena").unwrap().clone();
    assert!(matches!(state, TurnInState::Completable { .. }));
    assert!(dialogue::in_range_line("Elena", &state, host.session.journal())
        .unwrap()
        .contains("all 3 crystal"));

    let outcome = host.session.confirm_hand_in("elena", &mut host.inventory).unwrap();
    assert_eq!(outcome.quest, quest);
    assert_eq!(host.inventory.count("crystal", Some(quest)), 0);
    assert_eq!(host.session.journal().get(quest).unwrap().status, QuestStatus::Completed);
    assert_eq!(
        host.session.take_signals(),
        vec![QuestSignal::Completed {
            quest,
            giver: "Elena".into()
        }]
    );
    let counters = host.session.counters().snapshot();
    assert_eq!((counters.quests_accepted, counters.quests_completed), (1, 1));
}

#[test]
fn delivery_is_granted_then_handed_to_recipient() {
    let mut host = Host::new(seeded());
    let said = host
        .session
        .ingest_text("Elena", "[QUEST:DELIVERY:sealed letter:Marco:market]");
    let quest = said.accepted[0].id;
    host.frame();
    assert_eq!(host.inventory.count("sealed letter", Some(quest)), 1);

    let elena = zone_center(&host.session, "laboratory");
    host.walk_to(elena);
    assert_eq!(host.session.turn_in_state("Elena"), Some(&TurnInState::PlayerInRange));
    assert!(matches!(
        host.session.confirm_hand_in("Elena", &mut host.inventory),
        Err(QuestError::NoHandIn(_))
    ));

    let marco = zone_center(&host.session, "market");
    host.walk_to(marco);
    assert_eq!(host.session.turn_in_state("Elena"), Some(&TurnInState::Idle));
    let outcome = host.session.confirm_hand_in("Marco", &mut host.inventory).unwrap();
    assert_eq!(outcome.giver, "Elena");
    assert!(outcome.closing_line.starts_with("Marco:"));
    assert_eq!(host.inventory.count("sealed letter", Some(quest)), 0);
}

#[test]
fn second_offer_from_busy_giver_is_counted_as_rejected() {
    let mut host = Host::new(seeded());
    host.session.ingest_text("Elena", "[QUEST:EXPLORE:ruins]");
    let second = host.session.ingest_text("Elena", "And [QUEST:FETCH:crystal:lab:1]!");
    assert_eq!(second.display_text, "And !");
    assert!(matches!(second.rejected[0], QuestError::GiverBusy { .. }));

    let bad = host.session.ingest_text("Marco", "[QUEST:FETCH:crystal:lab:zero] [QUEST:TALK:Marco]");
    assert_eq!(bad.display_text, " ");
    let counters = host.session.counters().snapshot();
    assert_eq!(counters.quests_accepted, 1);
    assert_eq!(counters.quests_rejected, 1);
    assert_eq!(counters.directives_dropped, 2);
}

#[test]
fn interact_target_raises_progress_and_is_reported_back() {
    let mut host = Host::new(seeded());
    let quest = host
        .session
        .ingest_text("Marco", "[QUEST:INTERACT:terminal:security]")
        .accepted[0]
        .id;
    host.frame();
    let target = *host.props.placed.keys().next().unwrap();

    host.event(hooks::on_use(target));
    host.frame();
    assert!(host.props.placed.is_empty());
    assert_eq!(host.session.journal().get(quest).unwrap().progress_text(), "1/1");

    host.walk_to(zone_center(&host.session, "market"));
    let outcome = host.session.confirm_hand_in("Marco", &mut host.inventory).unwrap();
    assert!(outcome.items_removed.is_none());
}

#[test]
fn auto_completion_emits_signal_on_event() {
    let mut config = seeded();
    config.turn_in.auto_complete_on_event = true;
    let mut host = Host::new(config);
    let quest = host
        .session
        .ingest_text("Elena", "[QUEST:TALK:Marco:market]")
        .accepted[0]
        .id;

    host.event(hooks::on_dialogue("Marco"));
    assert_eq!(host.session.journal().get(quest).unwrap().status, QuestStatus::Completed);
    assert!(matches!(
        host.session.take_signals().as_slice(),
        [QuestSignal::Completed { quest: q, .. }] if *q == quest
    ));
}

#[test]
fn disabled_session_only_strips_text() {
    let mut config = seeded();
    config.general.enabled = false;
    let mut host = Host::new(config);
    let said = host.session.ingest_text("Elena", "Hi [QUEST:EXPLORE:ruins]");
    assert_eq!(said.display_text, "Hi ");
    assert!(said.accepted.is_empty());
    assert!(host.session.journal().is_empty());
}

#[test]
fn save_and_load_through_session() {
    let mut host = Host::new(seeded());
    let quest = host
        .session
        .ingest_text("Elena", "[QUEST:FETCH:crystal:lab:2]")
        .accepted[0]
        .id;
    host.frame();
    let first = *host.props.placed.keys().next().unwrap();
    host.event(hooks::on_pickup(first));
    host.frame();
    let json = host.session.save().unwrap();

    let mut fresh = Host::new(seeded());
    let report = fresh.session.load(&json).unwrap();
    assert_eq!(report.restored, vec![quest]);
    fresh.frame();
    assert_eq!(fresh.props.placed.len(), 1);
    let restored = fresh.session.journal().get(quest).unwrap();
    assert_eq!(restored.current_progress, 1);
    assert!(restored.tracked);

    assert!(matches!(fresh.session.load("not json"), Err(QuestError::Serialization(_))));
}

#[test]
fn events_serialize_for_replay_logs() {
    let event = hooks::on_dialogue("Marco");
    let json = serde_json::to_string(&event).unwrap();
    assert_eq!(json, r#"{"event":"dialogue_opened","character":"Marco"}"#);
    assert_eq!(serde_json::from_str::<GameEvent>(&json).unwrap(), event);
}

// ---------------------------------------------------------------------------
// Text service boundary
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generated_text_reenters_on_tick() {
    let mut host = Host::new(seeded());
    let request = host.session.inbox().register("Elena", Duration::from_secs(5));
    let sender = host.session.inbox().sender();

    tokio::spawn(async move {
        sender
            .deliver(request, "Could you look around? [QUEST:EXPLORE:ruins]")
            .unwrap();
    })
    .await
    .unwrap();

    let report = host.session.tick(&host.inventory);
    assert_eq!(report.dialogue.len(), 1);
    assert_eq!(report.dialogue[0].giver, "Elena");
    assert_eq!(report.dialogue[0].display_text, "Could you look around? ");
    assert_eq!(host.session.journal().active().len(), 1);
}
