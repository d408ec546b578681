//! Quest lines for the dialogue layer.
//!
//! Rule-based templates for the moments the text service is not involved in:
//! acknowledging a freshly accepted quest, greeting the player when they
//! come within range of a coordinator, and labelling the hand-in action.

use questline_core::coordinator::{HandIn, TurnInState};
use questline_core::goal::QuestGoal;
use questline_core::journal::{JournalQuest, QuestJournal};

// ---------------------------------------------------------------------------
// Offer
// ---------------------------------------------------------------------------

/// Line appended to the journal notification when a quest is accepted.
#[must_use]
pub fn offer_line(quest: &JournalQuest) -> String {
    format!("New quest from {}: {}", quest.giver, quest.description)
}

// ---------------------------------------------------------------------------
// Turn-in
// ---------------------------------------------------------------------------

/// What `character` says when the player walks up, given the coordinator
/// state. `None` when the character has nothing quest-related to say.
#[must_use]
pub fn in_range_line(character: &str, state: &TurnInState, journal: &QuestJournal) -> Option<String> {
    match state {
        TurnInState::Idle | TurnInState::Resolved { .. } => None,
        TurnInState::Completable { hand_in, .. } => Some(match hand_in {
            HandIn::Items { item, quantity: 1 } => format!("{character}: Is that the {item}?"),
            HandIn::Items { item, quantity } => {
                format!("{character}: Did you bring all {quantity} {item}?")
            }
            HandIn::Informational => format!("{character}: Back already? Tell me how it went."),
        }),
        TurnInState::PlayerInRange => {
            let quest = journal.find_for_character(character)?;
            Some(reminder(character, quest))
        }
    }
}

fn reminder(character: &str, quest: &JournalQuest) -> String {
    match &quest.goal {
        QuestGoal::Fetch { item, zone, .. } => format!(
            "{character}: Still looking for {item}? Try {zone}. ({})",
            quest.progress_text()
        ),
        QuestGoal::Delivery { item, .. } => {
            format!("{character}: I'm expecting a {item}. Do you have it?")
        }
        QuestGoal::Explore { zone } => format!("{character}: Have you been to {zone} yet?"),
        QuestGoal::Talk { character: other, .. } => {
            format!("{character}: Did you speak with {other}?")
        }
        QuestGoal::Interact { object, zone } => {
            format!("{character}: The {object} in {zone} still needs seeing to.")
        }
    }
}

/// Label for the hand-in action.
#[must_use]
pub fn hand_in_label(hand_in: &HandIn) -> String {
    match hand_in {
        HandIn::Items { item, quantity } => format!("Hand over {quantity} {item}"),
        HandIn::Informational => "Report back".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use questline_core::config::JournalConfig;
    use questline_core::directive::QuestToken;
    use questline_core::types::{GameTimestamp, QuestId};

    fn journal() -> QuestJournal {
        let mut journal = QuestJournal::new(&JournalConfig::default());
        journal
            .add(
                &QuestToken::from_goal(QuestGoal::Fetch {
                    item: "crystal".into(),
                    zone: "laboratory".into(),
                    quantity: 3,
                }),
                "Elena",
                GameTimestamp::now(1),
            )
            .unwrap();
        journal
    }

    #[test]
    fn reminder_mentions_progress() {
        let journal = journal();
        let line = in_range_line("Elena", &TurnInState::PlayerInRange, &journal).unwrap();
        assert_eq!(line, "Elena: Still looking for crystal? Try laboratory. (0/3)");
        assert!(in_range_line("Marco", &TurnInState::PlayerInRange, &journal).is_none());
        assert!(in_range_line("Elena", &TurnInState::Idle, &journal).is_none());
    }

    #[test]
    fn completable_lines_and_labels() {
        let journal = journal();
        let hand_in = HandIn::Items {
            item: "crystal".into(),
            quantity: 3,
        };
        let state = TurnInState::Completable {
            quest: QuestId::new(),
            hand_in: hand_in.clone(),
        };
        assert_eq!(
            in_range_line("Elena", &state, &journal).as_deref(),
            Some("Elena: Did you bring all 3 crystal?")
        );
        assert_eq!(hand_in_label(&hand_in), "Hand over 3 crystal");
        assert_eq!(hand_in_label(&HandIn::Informational), "Report back");
    }

    #[test]
    fn offer_line_names_giver() {
        let journal = journal();
        assert_eq!(
            offer_line(journal.all().first().unwrap()),
            "New quest from Elena: Find 3 crystal in laboratory"
        );
    }
}
