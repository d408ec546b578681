//! Quest lines for prompt injection.
//!
//! The dialogue layer builds prompts for the external text service; these
//! helpers give it short, stable lines describing the quest state so a giver
//! can refer to its own quest (and does not offer a second one while the
//! first is open).

use std::fmt::Write as _;

use crate::journal::{JournalQuest, QuestJournal};

/// One-line summary: `"Collect crystal (2/3): Find 3 crystal in laboratory"`.
#[must_use]
pub fn quest_line(quest: &JournalQuest) -> String {
    format!(
        "{} ({}): {}",
        quest.title,
        quest.progress_text(),
        quest.description
    )
}

/// What `giver` should know about its quests, or `None` when it has never
/// given one.
#[must_use]
pub fn giver_context(journal: &QuestJournal, giver: &str) -> Option<String> {
    if let Some(active) = journal.find_by_giver(giver) {
        let status = if active.progress_complete() {
            "The player appears ready to report back."
        } else {
            "The player is still working on it. Do not offer another quest."
        };
        return Some(format!(
            "You asked the player to do this: {} {status}",
            quest_line(active)
        ));
    }

    let key = crate::types::name_key(giver);
    let done = journal
        .completed()
        .into_iter()
        .filter(|q| crate::types::name_key(&q.giver) == key)
        .count();
    (done > 0).then(|| format!("The player has completed {done} of your quests."))
}

/// Multi-line journal overview. The tracked quest is marked with `*`.
#[must_use]
pub fn journal_summary(journal: &QuestJournal) -> String {
    let active = journal.active();
    if active.is_empty() {
        return "No active quests.".to_string();
    }
    let mut out = String::from("Active quests:\n");
    for quest in active {
        let marker = if quest.tracked { '*' } else { '-' };
        let _ = writeln!(out, "{marker} {} (from {})", quest_line(quest), quest.giver);
    }
    out
}
