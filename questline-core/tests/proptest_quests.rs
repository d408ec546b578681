//! Property-Based Tests for Questline Core
//!
//! Uses `proptest` to check the ledger and parser invariants under random
//! inputs: stripping is idempotent, a giver never has two quests in progress,
//! FETCH progress never goes backwards, and snapshots restore exactly.

use std::collections::HashMap;

use proptest::prelude::*;

use questline_core::config::{JournalConfig, PersistenceConfig, WorldConfig};
use questline_core::directive::{parse_directives, strip_directives, QuestToken};
use questline_core::evaluator::CompletionEvaluator;
use questline_core::goal::QuestGoal;
use questline_core::inventory::{Inventory, QuestInventory};
use questline_core::journal::QuestJournal;
use questline_core::persistence::{self, QuestSnapshot};
use questline_core::spawner::QuestSpawner;
use questline_core::types::{name_key, GameTimestamp};
use questline_core::world::WorldMap;

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Text assembled from directive fragments, so openings, separators and
/// closings land in every possible arrangement.
fn arb_directive_text() -> impl Strategy<Value = String> {
    let fragment = prop_oneof![
        Just("[QUEST".to_string()),
        Just(":".to_string()),
        Just("]".to_string()),
        Just("[".to_string()),
        Just("FETCH".to_string()),
        Just("EXPLORE".to_string()),
        Just("[QUESTION]".to_string()),
        Just(" ".to_string()),
        "[a-z0-9]{1,6}",
    ];
    prop::collection::vec(fragment, 0..24).prop_map(|parts| parts.concat())
}

fn arb_goal() -> impl Strategy<Value = QuestGoal> {
    let zone = prop::sample::select(vec!["laboratory", "lab", "ruins", "market", "medbay"]);
    prop_oneof![
        (zone.clone(), 1..6u32).prop_map(|(z, q)| QuestGoal::Fetch {
            item: "crystal".into(),
            zone: z.into(),
            quantity: q,
        }),
        zone.clone().prop_map(|z| QuestGoal::Explore { zone: z.into() }),
        zone.clone().prop_map(|z| QuestGoal::Talk {
            character: "Marco".into(),
            zone: z.into(),
        }),
        zone.prop_map(|z| QuestGoal::Interact {
            object: "terminal".into(),
            zone: z.into(),
        }),
    ]
}

fn services() -> (QuestJournal, QuestSpawner) {
    let mut world = WorldMap::from_config(&WorldConfig::default());
    world.register_character("Marco", "market");
    (
        QuestJournal::new(&JournalConfig::default()),
        QuestSpawner::new(world, 20, Some(9)),
    )
}

const GIVERS: [&str; 4] = ["Elena", "elena", "Marco", "Ida"];

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn strip_is_idempotent(text in arb_directive_text()) {
        let once = strip_directives(&text);
        prop_assert_eq!(strip_directives(&once), once.clone());
        prop_assert_eq!(parse_directives(&text).display_text, once);
    }

    #[test]
    fn display_text_never_contains_a_directive(text in arb_directive_text()) {
        let parsed = parse_directives(&text);
        prop_assert!(parse_directives(&parsed.display_text).tokens.is_empty());
        prop_assert!(parse_directives(&parsed.display_text).rejected.is_empty());
    }

    #[test]
    fn rendered_goals_parse_back(goal in arb_goal()) {
        let token = QuestToken::from_goal(goal.clone());
        let parsed = parse_directives(&format!("Say {} now", token.directive));
        prop_assert_eq!(parsed.tokens.len(), 1);
        prop_assert_eq!(&parsed.tokens[0].goal, &goal);
        prop_assert_eq!(parsed.display_text, "Say  now");
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn at_most_one_active_quest_per_giver(
        ops in prop::collection::vec((0..GIVERS.len(), arb_goal(), any::<bool>()), 1..40)
    ) {
        let (mut journal, mut spawner) = services();
        for (tick, (giver, goal, complete_first)) in ops.into_iter().enumerate() {
            let now = GameTimestamp::now(tick as u64);
            let giver = GIVERS[giver];
            if complete_first {
                if let Some(id) = journal.find_by_giver(giver).map(|q| q.id) {
                    journal.complete(id, now).unwrap();
                }
            }
            let _ = spawner.accept_token(&mut journal, &QuestToken::from_goal(goal), giver, now);

            let mut per_giver: HashMap<String, usize> = HashMap::new();
            for quest in journal.active() {
                *per_giver.entry(name_key(&quest.giver)).or_default() += 1;
            }
            prop_assert!(per_giver.values().all(|n| *n <= 1));
            prop_assert!(journal.all().iter().filter(|q| q.tracked).count() <= 1);
        }
    }

    #[test]
    fn fetch_progress_is_monotonic(
        quantity in 1..10u32,
        pickups in prop::collection::vec(0..3u32, 1..20)
    ) {
        let (mut journal, mut spawner) = services();
        let goal = QuestGoal::Fetch { item: "crystal".into(), zone: "lab".into(), quantity };
        let id = spawner
            .accept_token(&mut journal, &QuestToken::from_goal(goal), "Elena", GameTimestamp::now(0))
            .unwrap()
            .id;
        let evaluator = CompletionEvaluator::new(&Default::default());
        let mut inventory = Inventory::new();

        let mut last = 0;
        for n in pickups {
            inventory.add("crystal", n, Some(id));
            evaluator.refresh(&mut journal, &inventory);
            let progress = journal.get(id).unwrap().current_progress;
            prop_assert!(progress >= last);
            prop_assert_eq!(progress, inventory.count("crystal", Some(id)).min(quantity));
            last = progress;
        }
    }

    #[test]
    fn snapshot_restore_reproduces_the_ledger(
        entries in prop::collection::vec((arb_goal(), 0..8u32, any::<bool>()), 1..8),
        tracked_pick in any::<prop::sample::Index>()
    ) {
        let (mut journal, mut spawner) = services();
        for (i, (goal, progress, completed)) in entries.into_iter().enumerate() {
            let giver = format!("Giver{i}");
            let now = GameTimestamp::now(i as u64);
            let id = spawner
                .accept_token(&mut journal, &QuestToken::from_goal(goal), &giver, now)
                .unwrap()
                .id;
            journal.record_progress(id, progress).unwrap();
            if completed {
                journal.complete(id, now).unwrap();
            }
        }
        let ids: Vec<_> = journal.all().iter().map(|q| q.id).collect();
        let pick = ids[tracked_pick.index(ids.len())];
        let picked_active = journal.get(pick).unwrap().is_active();
        prop_assert_eq!(journal.set_tracked(pick).is_ok(), picked_active);

        let json = persistence::snapshot(&journal, &PersistenceConfig::default()).to_json().unwrap();
        let snapshot = QuestSnapshot::from_json(&json).unwrap();
        let (mut restored, mut restored_spawner) = services();
        let report = persistence::restore(&snapshot.records, &mut restored, &mut restored_spawner, GameTimestamp::now(99));

        prop_assert!(report.skipped.is_empty());
        prop_assert_eq!(restored.len(), journal.len());
        for (a, b) in journal.all().iter().zip(restored.all()) {
            prop_assert_eq!(a.id, b.id);
            prop_assert_eq!(a.quest_type(), b.quest_type());
            prop_assert_eq!(a.current_progress, b.current_progress);
            prop_assert_eq!(a.max_progress, b.max_progress);
            prop_assert_eq!(a.status, b.status);
            prop_assert_eq!(a.tracked, b.tracked);
        }
        prop_assert_eq!(journal.tracked().map(|q| q.id), restored.tracked().map(|q| q.id));
    }
}
