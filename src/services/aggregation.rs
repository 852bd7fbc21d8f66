//! Folding recorded plays into per-action summaries.
//!
//! Every read path (per user, per team, filtered by matches, match vs
//! match) goes through `summarize`, so they all count the same way.
//! Counting is a sum into ordered maps: the input order never changes
//! the output.

use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::models::stat::Stat;
use crate::models::vocabulary::Action;

/// Which records take part in a fold.
#[derive(Debug, Clone, Default)]
pub enum MatchFilter {
    #[default]
    All,
    Only(HashSet<ObjectId>),
}

impl MatchFilter {
    pub fn from_ids(ids: Option<Vec<ObjectId>>) -> Self {
        match ids {
            Some(ids) => MatchFilter::Only(ids.into_iter().collect()),
            None => MatchFilter::All,
        }
    }

    pub fn single(match_id: ObjectId) -> Self {
        MatchFilter::Only(HashSet::from([match_id]))
    }

    pub fn admits(&self, stat: &Stat) -> bool {
        match self {
            MatchFilter::All => true,
            MatchFilter::Only(ids) => ids.contains(&stat.match_id),
        }
    }

    pub fn apply(&self, stats: Vec<Stat>) -> Vec<Stat> {
        stats.into_iter().filter(|s| self.admits(s)).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatSummary {
    pub total: u64,
    pub actions: BTreeMap<Action, ActionSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSummary {
    pub total: u64,
    pub successes: u64,
    /// Percentage of `total` that were successes, one decimal place.
    pub success_rate: f64,
    pub results: BTreeMap<String, u64>,
    pub players: BTreeMap<String, PlayerBreakdown>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBreakdown {
    pub total: u64,
    pub results: BTreeMap<String, u64>,
}

pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = part as f64 * 100.0 / total as f64;
    (raw * 10.0).round() / 10.0
}

pub fn summarize<'a, I>(stats: I, filter: &MatchFilter) -> StatSummary
where
    I: IntoIterator<Item = &'a Stat>,
{
    let mut summary = StatSummary::default();

    for stat in stats.into_iter().filter(|s| filter.admits(s)) {
        summary.total += 1;

        let action = summary.actions.entry(stat.action).or_default();
        action.total += 1;
        if stat.action.is_success(&stat.result) {
            action.successes += 1;
        }
        *action.results.entry(stat.result.clone()).or_insert(0) += 1;

        let player = action.players.entry(stat.player_name.clone()).or_default();
        player.total += 1;
        *player.results.entry(stat.result.clone()).or_insert(0) += 1;
    }

    for action in summary.actions.values_mut() {
        action.success_rate = percentage(action.successes, action.total);
    }

    summary
}

/// One summary per match, in the order the ids were given.
pub fn compare(stats: &[Stat], match_ids: &[ObjectId]) -> Vec<(ObjectId, StatSummary)> {
    let mut seen = HashSet::new();
    match_ids
        .iter()
        .filter(|id| seen.insert(**id))
        .map(|id| (*id, summarize(stats, &MatchFilter::single(*id))))
        .collect()
}
