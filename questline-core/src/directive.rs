//! Quest directive parser.
//!
//! Generated dialogue carries quests as bracketed directives:
//!
//! ```text
//! [QUEST:FETCH:<item>:<zone>:<quantity>]
//! [QUEST:DELIVERY:<item>:<recipient>:<zone>]
//! [QUEST:EXPLORE:<zone>]
//! [QUEST:TALK:<character>:<zone>]
//! [QUEST:INTERACT:<object>:<zone>]
//! ```
//!
//! The parser turns each well-formed directive into a [`QuestToken`] and
//! removes every directive, well-formed or not, from the text shown to the
//! player. A directive begins at `[QUEST` followed by `:` or `]` and ends at
//! the next `]`; an unterminated directive swallows the rest of the text.
//! Zone names are not validated here.

use thiserror::Error;
use tracing::{debug, warn};

use crate::goal::{QuestGoal, QuestType};

/// Opening sequence of every directive.
pub const DIRECTIVE_OPEN: &str = "[QUEST";

/// Field separator inside a directive.
pub const FIELD_SEPARATOR: char = ':';

/// Closing delimiter of a directive.
pub const DIRECTIVE_CLOSE: char = ']';

/// Why a single directive was dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    /// No closing `]` before the end of the text.
    #[error("directive is missing its closing ']'")]
    Unterminated,
    /// `[QUEST]` or `[QUEST:]` with nothing after the tag.
    #[error("directive has no quest type")]
    MissingType,
    /// The type name is not one of the known quest types.
    #[error("unknown quest type '{0}'")]
    UnknownType(String),
    /// The type is known but has no directive layout.
    #[error("quest type {0} cannot be issued by directive")]
    UnsupportedType(QuestType),
    /// Wrong number of fields for the type.
    #[error("{quest_type} expects {expected} fields, found {found}")]
    FieldCount {
        /// Type named by the directive.
        quest_type: QuestType,
        /// Fields the layout requires.
        expected: usize,
        /// Fields present.
        found: usize,
    },
    /// A field was blank.
    #[error("field '{0}' is empty")]
    EmptyField(&'static str),
    /// The quantity was not a positive integer.
    #[error("quantity '{0}' is not a positive integer")]
    InvalidQuantity(String),
}

/// One parsed directive, ready to be offered to the spawner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestToken {
    /// Structured goal carried by the directive.
    pub goal: QuestGoal,
    /// The directive exactly as it appeared in the text.
    pub directive: String,
}

impl QuestToken {
    /// Wrap a goal that did not come from text (restores, tests).
    #[must_use]
    pub fn from_goal(goal: QuestGoal) -> Self {
        let directive = render_directive(&goal);
        Self { goal, directive }
    }

    /// Quest type of the token.
    #[must_use]
    pub fn quest_type(&self) -> QuestType {
        self.goal.quest_type()
    }

    /// Primary parameter: the item, zone, character or object the quest is about.
    #[must_use]
    pub fn primary(&self) -> &str {
        match &self.goal {
            QuestGoal::Fetch { item, .. } | QuestGoal::Delivery { item, .. } => item,
            QuestGoal::Explore { zone } => zone,
            QuestGoal::Talk { character, .. } => character,
            QuestGoal::Interact { object, .. } => object,
        }
    }

    /// Secondary parameter: the recipient for DELIVERY, the zone otherwise.
    #[must_use]
    pub fn secondary(&self) -> Option<&str> {
        match &self.goal {
            QuestGoal::Delivery { recipient, .. } => Some(recipient),
            QuestGoal::Explore { .. } => None,
            QuestGoal::Fetch { zone, .. }
            | QuestGoal::Talk { zone, .. }
            | QuestGoal::Interact { zone, .. } => Some(zone),
        }
    }

    /// Required quantity (1 for every type but FETCH).
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.goal.max_progress()
    }
}

/// A directive that was stripped but not turned into a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveRejection {
    /// Raw directive text.
    pub directive: String,
    /// Why it was dropped.
    pub error: DirectiveError,
}

/// Result of scanning one block of generated text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedText {
    /// Text with every directive removed, safe to show to the player.
    pub display_text: String,
    /// Well-formed directives in order of appearance.
    pub tokens: Vec<QuestToken>,
    /// Directives that were dropped.
    pub rejected: Vec<DirectiveRejection>,
}

/// Parse every directive in `text`.
#[must_use]
pub fn parse_directives(text: &str) -> ParsedText {
    let mut parsed = ParsedText {
        display_text: String::with_capacity(text.len()),
        ..ParsedText::default()
    };

    let mut rest = text;
    while let Some(start) = find_directive_start(rest) {
        parsed.display_text.push_str(&rest[..start]);
        let (raw, body, remainder) = split_directive(&rest[start..]);

        let result = body.ok_or(DirectiveError::Unterminated).and_then(parse_body);
        match result {
            Ok(goal) => {
                debug!(directive = raw, quest_type = %goal.quest_type(), "Parsed quest directive");
                parsed.tokens.push(QuestToken {
                    goal,
                    directive: raw.to_string(),
                });
            }
            Err(error) => {
                warn!(directive = raw, error = %error, "Dropped malformed quest directive");
                parsed.rejected.push(DirectiveRejection {
                    directive: raw.to_string(),
                    error,
                });
            }
        }
        rest = remainder;
    }
    parsed.display_text.push_str(rest);

    // Removing a directive can splice its neighbours into a new one.
    while find_directive_start(&parsed.display_text).is_some() {
        parsed.display_text = strip_once(&parsed.display_text);
    }

    parsed
}

/// Remove every directive from `text` without producing tokens.
///
/// Idempotent: stripping already-stripped text returns it unchanged.
#[must_use]
pub fn strip_directives(text: &str) -> String {
    let mut stripped = strip_once(text);
    while find_directive_start(&stripped).is_some() {
        stripped = strip_once(&stripped);
    }
    stripped
}

/// Render a goal back into directive syntax.
#[must_use]
pub fn render_directive(goal: &QuestGoal) -> String {
    let fields = match goal {
        QuestGoal::Fetch {
            item,
            zone,
            quantity,
        } => vec![item.clone(), zone.clone(), quantity.to_string()],
        QuestGoal::Delivery {
            item,
            recipient,
            zone,
        } => vec![item.clone(), recipient.clone(), zone.clone()],
        QuestGoal::Explore { zone } => vec![zone.clone()],
        QuestGoal::Talk { character, zone } => vec![character.clone(), zone.clone()],
        QuestGoal::Interact { object, zone } => vec![object.clone(), zone.clone()],
    };
    format!(
        "{DIRECTIVE_OPEN}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}{DIRECTIVE_CLOSE}",
        goal.quest_type(),
        fields.join(":")
    )
}

fn strip_once(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = find_directive_start(rest) {
        out.push_str(&rest[..start]);
        let (_, _, remainder) = split_directive(&rest[start..]);
        rest = remainder;
    }
    out.push_str(rest);
    out
}

/// Byte offset of the next directive opening, skipping look-alikes such as
/// `[QUESTION]`.
fn find_directive_start(text: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(pos) = text[offset..].find(DIRECTIVE_OPEN) {
        let idx = offset + pos;
        let after = idx + DIRECTIVE_OPEN.len();
        match text[after..].chars().next() {
            None | Some(FIELD_SEPARATOR | DIRECTIVE_CLOSE) => return Some(idx),
            Some(_) => offset = after,
        }
    }
    None
}

/// Split text starting at a directive into (raw directive, body between the
/// tag and `]`, remaining text). The body is `None` when unterminated.
fn split_directive(text: &str) -> (&str, Option<&str>, &str) {
    let after_tag = &text[DIRECTIVE_OPEN.len()..];
    match after_tag.find(DIRECTIVE_CLOSE) {
        Some(end) => {
            let raw_len = DIRECTIVE_OPEN.len() + end + DIRECTIVE_CLOSE.len_utf8();
            (&text[..raw_len], Some(&after_tag[..end]), &text[raw_len..])
        }
        None => (text, None, ""),
    }
}

fn parse_body(body: &str) -> Result<QuestGoal, DirectiveError> {
    let Some(body) = body.strip_prefix(FIELD_SEPARATOR) else {
        return Err(DirectiveError::MissingType);
    };

    let mut parts = body.split(FIELD_SEPARATOR).map(str::trim);
    let type_name = parts.next().unwrap_or_default();
    if type_name.is_empty() {
        return Err(DirectiveError::MissingType);
    }
    let quest_type: QuestType = type_name
        .to_ascii_uppercase()
        .parse()
        .map_err(|_| DirectiveError::UnknownType(type_name.to_string()))?;
    let layout = quest_type
        .field_layout()
        .ok_or(DirectiveError::UnsupportedType(quest_type))?;

    let fields: Vec<&str> = parts.collect();
    if fields.len() != layout.len() {
        return Err(DirectiveError::FieldCount {
            quest_type,
            expected: layout.len(),
            found: fields.len(),
        });
    }
    if let Some(i) = fields.iter().position(|f| f.is_empty()) {
        return Err(DirectiveError::EmptyField(layout[i]));
    }

    let owned = |i: usize| fields[i].to_string();
    let goal = match quest_type {
        QuestType::Fetch => {
            let quantity = fields[2]
                .parse::<u32>()
                .ok()
                .filter(|q| *q > 0)
                .ok_or_else(|| DirectiveError::InvalidQuantity(owned(2)))?;
            QuestGoal::Fetch {
                item: owned(0),
                zone: owned(1),
                quantity,
            }
        }
        QuestType::Delivery => QuestGoal::Delivery {
            item: owned(0),
            recipient: owned(1),
            zone: owned(2),
        },
        QuestType::Explore => QuestGoal::Explore { zone: owned(0) },
        QuestType::Talk => QuestGoal::Talk {
            character: owned(0),
            zone: owned(1),
        },
        QuestType::Interact => QuestGoal::Interact {
            object: owned(0),
            zone: owned(1),
        },
        QuestType::Escort => return Err(DirectiveError::UnsupportedType(quest_type)),
    };
    Ok(goal)
}
