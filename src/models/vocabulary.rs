//! Play vocabulary: which actions can be recorded, which results each
//! action accepts, and which of those results count as a success.
//!
//! This table is configuration. Bump `VOCABULARY_VERSION` whenever a
//! result is added, renamed or moves in or out of the success set, so
//! clients caching the table can tell it changed.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const VOCABULARY_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "Serve")]
    Serve,
    #[serde(rename = "Serve Receive", alias = "Serve Recieve", alias = "Reception")]
    ServeReceive,
    #[serde(rename = "Set")]
    Set,
    #[serde(rename = "Spike", alias = "Attack")]
    Spike,
    #[serde(rename = "Block")]
    Block,
    #[serde(rename = "Dig", alias = "Defense")]
    Dig,
}

struct Entry {
    action: Action,
    label: &'static str,
    aliases: &'static [&'static str],
    results: &'static [&'static str],
    successes: &'static [&'static str],
}

static TABLE: [Entry; 6] = [
    Entry {
        action: Action::Serve,
        label: "Serve",
        aliases: &[],
        results: &["Ace", "In Play", "Out of System", "Error"],
        successes: &["Ace", "In Play"],
    },
    Entry {
        action: Action::ServeReceive,
        label: "Serve Receive",
        aliases: &["Serve Recieve", "Reception"],
        results: &["Perfect", "Decent", "Out of System", "Error"],
        successes: &["Perfect", "Decent"],
    },
    Entry {
        action: Action::Set,
        label: "Set",
        aliases: &[],
        results: &["Perfect", "Decent", "Setter Dump", "Error"],
        successes: &["Perfect", "Decent", "Setter Dump"],
    },
    Entry {
        action: Action::Spike,
        label: "Spike",
        aliases: &["Attack"],
        results: &["Kill", "Block Out", "In Play", "Hard Blocked", "Soft Blocked", "Error"],
        successes: &["Kill", "Block Out"],
    },
    Entry {
        action: Action::Block,
        label: "Block",
        aliases: &[],
        results: &["Kill Block", "Soft Block", "Error"],
        successes: &["Kill Block", "Soft Block"],
    },
    Entry {
        action: Action::Dig,
        label: "Dig",
        aliases: &["Defense"],
        results: &["Perfect", "Decent", "Out of System", "Error"],
        successes: &["Perfect", "Decent"],
    },
];

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Serve,
        Action::ServeReceive,
        Action::Set,
        Action::Spike,
        Action::Block,
        Action::Dig,
    ];

    fn entry(&self) -> &'static Entry {
        // TABLE is laid out in enum order.
        &TABLE[*self as usize]
    }

    pub fn label(&self) -> &'static str {
        self.entry().label
    }

    pub fn results(&self) -> &'static [&'static str] {
        self.entry().results
    }

    pub fn successes(&self) -> &'static [&'static str] {
        self.entry().successes
    }

    /// Case-insensitive lookup by label or alias.
    pub fn parse(raw: &str) -> Option<Action> {
        let raw = raw.trim();
        TABLE
            .iter()
            .find(|e| {
                e.label.eq_ignore_ascii_case(raw)
                    || e.aliases.iter().any(|a| a.eq_ignore_ascii_case(raw))
            })
            .map(|e| e.action)
    }

    /// Canonical spelling of `raw` if it is a valid result for this action.
    pub fn canonical_result(&self, raw: &str) -> Option<&'static str> {
        let raw = raw.trim();
        self.results()
            .iter()
            .copied()
            .find(|r| r.eq_ignore_ascii_case(raw))
    }

    pub fn is_success(&self, result: &str) -> bool {
        self.successes()
            .iter()
            .any(|s| s.eq_ignore_ascii_case(result.trim()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Serializable view of the table for clients building entry forms.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyView {
    pub version: u32,
    pub actions: Vec<ActionView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionView {
    pub action: Action,
    pub results: &'static [&'static str],
    pub successes: &'static [&'static str],
}

pub fn vocabulary() -> VocabularyView {
    VocabularyView {
        version: VOCABULARY_VERSION,
        actions: Action::ALL
            .into_iter()
            .map(|action| ActionView {
                action,
                results: action.results(),
                successes: action.successes(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_enum() {
        for action in Action::ALL {
            assert_eq!(action.entry().action, action);
        }
    }

    #[test]
    fn successes_are_valid_results() {
        for action in Action::ALL {
            for success in action.successes() {
                assert!(
                    action.results().contains(success),
                    "{} lists {} as a success but not as a result",
                    action,
                    success
                );
            }
        }
    }

    #[test]
    fn parse_accepts_aliases_and_any_case() {
        assert_eq!(Action::parse("serve"), Some(Action::Serve));
        assert_eq!(Action::parse("Attack"), Some(Action::Spike));
        assert_eq!(Action::parse("serve recieve"), Some(Action::ServeReceive));
        assert_eq!(Action::parse("Reception"), Some(Action::ServeReceive));
        assert_eq!(Action::parse("Defense"), Some(Action::Dig));
        assert_eq!(Action::parse("Tip"), None);
    }

    #[test]
    fn results_are_checked_per_action() {
        assert_eq!(Action::Serve.canonical_result("ace"), Some("Ace"));
        assert_eq!(Action::Serve.canonical_result("Kill"), None);
        assert_eq!(Action::Spike.canonical_result("kill"), Some("Kill"));
    }

    #[test]
    fn success_lookup() {
        assert!(Action::Serve.is_success("Ace"));
        assert!(Action::Serve.is_success("in play"));
        assert!(!Action::Serve.is_success("Error"));
        assert!(Action::Set.is_success("Setter Dump"));
    }

    #[test]
    fn serde_aliases_match_parse() {
        let parsed: Action = serde_json::from_str("\"Attack\"").unwrap();
        assert_eq!(parsed, Action::Spike);
        assert_eq!(serde_json::to_string(&Action::ServeReceive).unwrap(), "\"Serve Receive\"");
    }
}
