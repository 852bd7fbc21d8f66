use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,

    #[serde(default)]
    pub players: Vec<ObjectId>,

    #[serde(default)]
    pub matches: Vec<Match>,

    // Cached tallies, rewritten from `matches` after every match mutation.
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Team {
    pub fn new(name: String, players: Vec<ObjectId>) -> Self {
        let now = Utc::now();
        Team {
            id: ObjectId::new(),
            name,
            players,
            matches: Vec::new(),
            wins: 0,
            losses: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_player(&self, user_id: &ObjectId) -> bool {
        self.players.contains(user_id)
    }

    pub fn find_match(&self, match_id: &ObjectId) -> Option<&Match> {
        self.matches.iter().find(|m| &m.id == match_id)
    }

    /// Wins and losses derived from the match list.
    pub fn record(&self) -> Record {
        Record::tally(&self.matches)
    }
}

/// A match played by the owning team, stored inside the team document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,

    pub location: String,
    pub opponent: String,
    pub score: Score,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub us: u32,
    pub them: u32,
}

impl Score {
    pub fn outcome(&self) -> Outcome {
        match self.us.cmp(&self.them) {
            std::cmp::Ordering::Greater => Outcome::Win,
            std::cmp::Ordering::Less => Outcome::Loss,
            std::cmp::Ordering::Equal => Outcome::Tie,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    pub wins: u32,
    pub losses: u32,
}

impl Record {
    pub fn tally(matches: &[Match]) -> Record {
        matches
            .iter()
            .fold(Record::default(), |mut record, m| {
                match m.score.outcome() {
                    Outcome::Win => record.wins += 1,
                    Outcome::Loss => record.losses += 1,
                    Outcome::Tie => {}
                }
                record
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn played(us: u32, them: u32) -> Match {
        Match {
            id: ObjectId::new(),
            date: Utc::now(),
            location: "Home gym".into(),
            opponent: "Blockers".into(),
            score: Score { us, them },
            video_url: None,
        }
    }

    #[test]
    fn record_counts_decisive_matches() {
        let matches = vec![played(25, 20), played(18, 25), played(25, 23)];
        assert_eq!(Record::tally(&matches), Record { wins: 2, losses: 1 });
    }

    #[test]
    fn ties_are_not_counted() {
        assert_eq!(Score { us: 10, them: 10 }.outcome(), Outcome::Tie);
        assert_eq!(Record::tally(&[played(10, 10)]), Record::default());
    }

    #[test]
    fn team_record_follows_matches() {
        let mut team = Team::new("Aces".into(), Vec::new());
        team.matches.push(played(25, 20));
        assert_eq!(team.record(), Record { wins: 1, losses: 0 });

        team.matches[0].score = Score { us: 20, them: 25 };
        assert_eq!(team.record(), Record { wins: 0, losses: 1 });
    }
}
