use std::collections::HashSet;

pub use crate::config::*;

/// A builder for assembling the candidates and the ballots of a ranking.
///
/// Unlike the ranking functions, the builder validates its input: candidates
/// must be unique and each (voter, timestamp) pair may only submit one ballot.
///
/// ```
/// pub use pairwise_ranking::builder::Builder;
/// pub use pairwise_ranking::RankingRules;
/// # use pairwise_ranking::RankingErrors;
///
/// let mut builder = Builder::new(&RankingRules::DEFAULT_RULES)?
///     .candidates(&[("t1", "Space Goats"), ("t2", "Dungeon Bakery")])?;
///
/// builder.add_ballot("client-1", "2024-03-02T18:00:00Z", &["t2".to_string(), "t1".to_string()])?;
/// let result = builder.run()?;
/// assert_eq!(result.winners(), vec!["t2".to_string()]);
///
/// # Ok::<(), RankingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: RankingRules,
    pub(crate) _candidates: Option<Vec<Candidate>>,
    pub(crate) _ballots: Vec<Ballot>,
    _seen: HashSet<(String, String)>,
}

impl Builder {
    pub fn new(rules: &RankingRules) -> Result<Builder, RankingErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _candidates: None,
            _ballots: Vec::new(),
            _seen: HashSet::new(),
        })
    }

    /// Declares the candidates as (id, name) pairs. Any ballot added before is dropped.
    pub fn candidates(self, cands: &[(&str, &str)]) -> Result<Builder, RankingErrors> {
        let mut ids: HashSet<&str> = HashSet::new();
        for (id, _) in cands.iter() {
            if !ids.insert(*id) {
                return Err(RankingErrors::DuplicateCandidate(id.to_string()));
            }
        }
        Ok(Builder {
            _rules: self._rules,
            _candidates: Some(
                cands
                    .iter()
                    .map(|(id, name)| Candidate::new(id, name))
                    .collect(),
            ),
            _ballots: Vec::new(),
            _seen: HashSet::new(),
        })
    }

    /// Adds a ballot given as an ordered list of candidate ids, the most preferred first.
    ///
    /// Ids that do not match a declared candidate are kept: the ranking ignores them.
    pub fn add_ballot(
        &mut self,
        voter: &str,
        timestamp: &str,
        candidates: &[String],
    ) -> Result<(), RankingErrors> {
        self.add_ballot_choices(&Ballot::from_ordered(voter, timestamp, candidates))
    }

    /// Adds a ballot with explicit rank positions.
    pub fn add_ballot_choices(&mut self, ballot: &Ballot) -> Result<(), RankingErrors> {
        let key = (ballot.voter.clone(), ballot.timestamp.clone());
        if self._seen.contains(&key) {
            return Err(RankingErrors::DuplicateBallot {
                voter: key.0,
                timestamp: key.1,
            });
        }
        self._seen.insert(key);
        self._ballots.push(ballot.clone());
        Ok(())
    }

    pub fn num_ballots(&self) -> usize {
        self._ballots.len()
    }

    pub fn run(&self) -> Result<RankingResult, RankingErrors> {
        let candidates = self
            ._candidates
            .as_deref()
            .ok_or(RankingErrors::MissingCandidates)?;
        Ok(crate::run_ranking_stats(
            candidates,
            &self._ballots,
            &self._rules,
        ))
    }
}
