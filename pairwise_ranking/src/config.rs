// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A competing entry of the jam.
///
/// The name is only used for display and for the `CandidateName` tiebreak
/// mode. The ranking itself only looks at the identifier.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Candidate {
    pub id: String,
    pub name: String,
}

impl Candidate {
    pub fn new(id: &str, name: &str) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// One position on a ballot.
///
/// `rank` is zero-based: position 0 is the most preferred entry. Gaps and
/// repeated positions are tolerated.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Choice {
    pub candidate: String,
    pub rank: u32,
}

/// The full ranking submitted by one voter.
///
/// The pair (voter, timestamp) identifies a ballot. The engine does not
/// check this: duplicates must be filtered out before the computation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub voter: String,
    pub timestamp: String,
    pub choices: Vec<Choice>,
}

impl Ballot {
    /// Creates a ballot from an ordered list of candidate ids. The rank positions
    /// follow the order of submission.
    pub fn from_ordered(voter: &str, timestamp: &str, candidates: &[String]) -> Ballot {
        Ballot {
            voter: voter.to_string(),
            timestamp: timestamp.to_string(),
            choices: candidates
                .iter()
                .enumerate()
                .map(|(idx, cid)| Choice {
                    candidate: cid.clone(),
                    rank: idx as u32,
                })
                .collect(),
        }
    }
}

// ******** Output data structures *********

/// A position in the final ranking. All the candidates in a group are tied.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankGroup {
    /// 1-based
    pub rank: u32,
    pub candidates: Vec<String>,
}

/// The outcome of one head-to-head comparison.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PairwiseStats {
    pub first: String,
    pub second: String,
    pub first_votes: u64,
    pub second_votes: u64,
    /// None when both sides received the same number of votes (including 0-0).
    pub winner: Option<String>,
}

impl PairwiseStats {
    /// The share of the expressed preferences that went to the winner, in percent.
    pub fn majority(&self) -> Option<f64> {
        let total = self.first_votes + self.second_votes;
        match self.winner {
            Some(_) if total > 0 => {
                let best = self.first_votes.max(self.second_votes);
                Some(100.0 * (best as f64) / (total as f64))
            }
            _ => None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankingResult {
    pub ranking: Vec<RankGroup>,
    /// The number of pairwise wins of each candidate, in ranking order.
    pub wins: Vec<(String, u32)>,
    /// One entry per unordered pair of candidates, in candidate order.
    pub pairwise: Vec<PairwiseStats>,
}

impl RankingResult {
    /// The candidates tied at the first rank. Empty if there were no candidates.
    pub fn winners(&self) -> Vec<String> {
        self.ranking
            .first()
            .map(|g| g.candidates.clone())
            .unwrap_or_default()
    }

    /// All the candidates, flattened in ranking order.
    pub fn ranked_ids(&self) -> Vec<String> {
        self.ranking
            .iter()
            .flat_map(|g| g.candidates.iter().cloned())
            .collect()
    }

    pub fn wins_of(&self, candidate: &str) -> Option<u32> {
        self.wins
            .iter()
            .find(|(cid, _)| cid == candidate)
            .map(|(_, w)| *w)
    }
}

/// Errors returned when assembling the input of a ranking.
///
/// The ranking algorithm itself never fails.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RankingErrors {
    DuplicateCandidate(String),
    DuplicateBallot { voter: String, timestamp: String },
    MissingCandidates,
}

impl Error for RankingErrors {}

impl Display for RankingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankingErrors::DuplicateCandidate(cid) => {
                write!(f, "candidate {} is declared more than once", cid)
            }
            RankingErrors::DuplicateBallot { voter, timestamp } => {
                write!(f, "duplicate ballot from {} at {}", voter, timestamp)
            }
            RankingErrors::MissingCandidates => write!(f, "no candidates were declared"),
        }
    }
}

// ********* Configuration **********

/// Order of the candidates inside a group of tied candidates.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakMode {
    /// Keep the order in which the candidates were provided.
    UseCandidateOrder,
    /// Sort by display name, then by identifier.
    CandidateName,
}

/// How a ballot that ranks only one candidate of a pair is counted for that pair.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum PartialBallotMode {
    /// The ballot only counts for the pair if both candidates are ranked on it.
    RequireBoth,
    /// The first of the two candidates found on the ballot gets the vote, so that
    /// a ranked candidate is preferred over an omitted one.
    RankedOverUnranked,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankingRules {
    pub tiebreak_mode: TieBreakMode,
    pub partial_ballot_mode: PartialBallotMode,
}

impl RankingRules {
    pub const DEFAULT_RULES: RankingRules = RankingRules {
        tiebreak_mode: TieBreakMode::UseCandidateOrder,
        partial_ballot_mode: PartialBallotMode::RequireBoth,
    };
}

impl Default for RankingRules {
    fn default() -> Self {
        RankingRules::DEFAULT_RULES
    }
}
