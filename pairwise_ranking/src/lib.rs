mod config;
use log::{debug, info, warn};

use std::{collections::HashMap, ops::AddAssign};

pub use crate::config::*;

pub mod builder;
pub mod manual;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(u32);

impl CandidateId {
    fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
    const ONE: VoteCount = VoteCount(1);
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

// The preferences expressed by one ballot, precomputed once.
// Invariant: `order` has one slot per registered candidate, and the filled
// slots hold distinct values. A lower value is a stronger preference.
#[derive(Eq, PartialEq, Debug, Clone)]
struct BallotInternal {
    order: Vec<Option<usize>>,
}

impl BallotInternal {
    fn position(&self, cid: CandidateId) -> Option<usize> {
        self.order.get(cid.idx()).cloned().flatten()
    }
}

struct CheckResult {
    // Unique by id, in input order. The CandidateId is the index in this list.
    candidates: Vec<(Candidate, CandidateId)>,
    ballots: Vec<BallotInternal>,
    ignored_choices: usize,
}

/// Computes the ranking of the candidates with the default rules.
///
/// This is the pairwise-majority (Condorcet-style) method: every pair of
/// candidates is compared head to head, the candidate preferred by more
/// ballots wins the pairing, and a tied pairing is won by nobody. The
/// candidates are then grouped by their number of wins, in decreasing order.
///
/// ```
/// use pairwise_ranking::*;
///
/// let candidates = vec![Candidate::new("a", "Alpha"), Candidate::new("b", "Beta")];
/// let ballots = vec![Ballot::from_ordered("v1", "t1", &["b".to_string(), "a".to_string()])];
/// let ranking = compute_ranking(&candidates, &ballots);
/// assert_eq!(ranking[0].candidates, vec!["b".to_string()]);
/// assert_eq!(ranking[1].rank, 2);
/// ```
pub fn compute_ranking(candidates: &[Candidate], ballots: &[Ballot]) -> Vec<RankGroup> {
    run_ranking_stats(candidates, ballots, &RankingRules::DEFAULT_RULES).ranking
}

/// Runs the pairwise comparison and returns the ranking along with the
/// statistics of every head-to-head comparison.
///
/// Arguments:
/// * `candidates` the current candidates. They are expected to be unique by id.
/// * `ballots` the ballots to count. Choices that refer to a candidate that is
/// not in `candidates` are ignored.
/// * `rules` the policies for partial ballots and for the order inside ties.
pub fn run_ranking_stats(
    candidates: &[Candidate],
    ballots: &[Ballot],
    rules: &RankingRules,
) -> RankingResult {
    info!(
        "Processing {:?} ballots, {:?} candidates, rules: {:?}",
        ballots.len(),
        candidates.len(),
        rules
    );

    let cr = checks(candidates, ballots);
    if cr.ignored_choices > 0 {
        info!(
            "run_ranking_stats: ignored {} choices referring to unknown candidates",
            cr.ignored_choices
        );
    }

    let num_candidates = cr.candidates.len();
    let mut wins: Vec<u32> = vec![0; num_candidates];
    let mut pairwise: Vec<PairwiseStats> = Vec::new();

    for i in 0..num_candidates {
        for j in (i + 1)..num_candidates {
            let (first, first_id) = &cr.candidates[i];
            let (second, second_id) = &cr.candidates[j];
            let (first_votes, second_votes) =
                tally_pair(&cr.ballots, *first_id, *second_id, rules.partial_ballot_mode);
            let winner = if first_votes > second_votes {
                wins[first_id.idx()] += 1;
                Some(first.id.clone())
            } else if second_votes > first_votes {
                wins[second_id.idx()] += 1;
                Some(second.id.clone())
            } else {
                // Equal support, including no data at all: nobody wins this pairing.
                None
            };
            debug!(
                "run_ranking_stats: {} vs {}: {:?} - {:?}, winner: {:?}",
                first.id, second.id, first_votes, second_votes, winner
            );
            pairwise.push(PairwiseStats {
                first: first.id.clone(),
                second: second.id.clone(),
                first_votes: first_votes.0,
                second_votes: second_votes.0,
                winner,
            });
        }
    }

    let ordered = order_by_wins(&cr.candidates, &wins, rules.tiebreak_mode);
    let ranking = group_by_wins(&ordered);
    for g in ranking.iter() {
        info!("Rank {}: {:?}", g.rank, g.candidates);
    }

    RankingResult {
        ranking,
        wins: ordered
            .iter()
            .map(|(c, w)| (c.id.clone(), *w))
            .collect(),
        pairwise,
    }
}

/// A digest of a ranking, stable across runs and platforms.
///
/// Only the rank numbers and the candidate ids (in order) are covered.
pub fn ranking_fingerprint(ranking: &[RankGroup]) -> String {
    let payload: Vec<String> = ranking
        .iter()
        .map(|g| format!("{}:{}", g.rank, g.candidates.join(",")))
        .collect();
    sha256::digest(payload.join(";"))
}

// Counts, over all the ballots, how many prefer `a` to `b` and how many prefer `b` to `a`.
fn tally_pair(
    ballots: &[BallotInternal],
    a: CandidateId,
    b: CandidateId,
    mode: PartialBallotMode,
) -> (VoteCount, VoteCount) {
    let mut for_a = VoteCount::EMPTY;
    let mut for_b = VoteCount::EMPTY;
    for ballot in ballots.iter() {
        match (ballot.position(a), ballot.position(b), mode) {
            (Some(pa), Some(pb), _) if pa < pb => for_a += VoteCount::ONE,
            (Some(_), Some(_), _) => for_b += VoteCount::ONE,
            (Some(_), None, PartialBallotMode::RankedOverUnranked) => for_a += VoteCount::ONE,
            (None, Some(_), PartialBallotMode::RankedOverUnranked) => for_b += VoteCount::ONE,
            _ => {
                // No preference expressed between a and b.
            }
        }
    }
    (for_a, for_b)
}

// Sorts the candidates by decreasing number of wins. The sort is stable, so that
// tied candidates keep the order given by the tiebreak mode.
fn order_by_wins<'a>(
    candidates: &'a [(Candidate, CandidateId)],
    wins: &[u32],
    tiebreak: TieBreakMode,
) -> Vec<(&'a Candidate, u32)> {
    let mut res: Vec<(&Candidate, u32)> = candidates
        .iter()
        .map(|(c, cid)| (c, wins[cid.idx()]))
        .collect();
    if tiebreak == TieBreakMode::CandidateName {
        res.sort_by(|(c1, _), (c2, _)| c1.name.cmp(&c2.name).then_with(|| c1.id.cmp(&c2.id)));
    }
    res.sort_by(|(_, w1), (_, w2)| w2.cmp(w1));
    res
}

fn group_by_wins(ordered: &[(&Candidate, u32)]) -> Vec<RankGroup> {
    let mut groups: Vec<RankGroup> = Vec::new();
    let mut last_wins: Option<u32> = None;
    for (c, w) in ordered.iter() {
        if last_wins == Some(*w) {
            if let Some(g) = groups.last_mut() {
                g.candidates.push(c.id.clone());
            }
        } else {
            groups.push(RankGroup {
                rank: (groups.len() + 1) as u32,
                candidates: vec![c.id.clone()],
            });
            last_wins = Some(*w);
        }
    }
    groups
}

// Registers the candidates and precomputes the preference order of each ballot.
fn checks(reg_candidates: &[Candidate], coll: &[Ballot]) -> CheckResult {
    debug!("checks: coll size: {:?}", coll.len());
    let mut candidates: Vec<(Candidate, CandidateId)> = Vec::new();
    let mut ids: HashMap<String, CandidateId> = HashMap::new();
    for c in reg_candidates.iter() {
        if ids.contains_key(&c.id) {
            warn!("checks: candidate {} declared more than once, ignoring", c.id);
            continue;
        }
        let cid = CandidateId(candidates.len() as u32);
        ids.insert(c.id.clone(), cid);
        candidates.push((c.clone(), cid));
    }

    let mut ignored_choices: usize = 0;
    let mut ballots: Vec<BallotInternal> = Vec::new();
    for b in coll.iter() {
        // (rank position, candidate), in listing order
        let mut known: Vec<(u32, CandidateId)> = Vec::new();
        for choice in b.choices.iter() {
            if let Some(cid) = ids.get(&choice.candidate) {
                known.push((choice.rank, *cid));
            } else {
                debug!(
                    "checks: ballot {}@{}: ignoring unknown candidate {:?}",
                    b.voter, b.timestamp, choice.candidate
                );
                ignored_choices += 1;
            }
        }
        // Stable: equal rank positions keep their listing order.
        known.sort_by_key(|(rank, _)| *rank);

        let mut order: Vec<Option<usize>> = vec![None; candidates.len()];
        for (pos, (_, cid)) in known.iter().enumerate() {
            // A candidate listed more than once keeps its best position.
            if order[cid.idx()].is_none() {
                order[cid.idx()] = Some(pos);
            }
        }
        ballots.push(BallotInternal { order });
    }

    CheckResult {
        candidates,
        ballots,
        ignored_choices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn cands(ids: &[&str]) -> Vec<Candidate> {
        ids.iter()
            .map(|id| Candidate::new(id, &format!("Team {}", id)))
            .collect()
    }

    fn ballot(voter: &str, ids: &[&str]) -> Ballot {
        let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        Ballot::from_ordered(voter, "2024-01-01T00:00:00Z", &ids)
    }

    fn group(rank: u32, ids: &[&str]) -> RankGroup {
        RankGroup {
            rank,
            candidates: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn as_sets(ranking: &[RankGroup]) -> Vec<(u32, HashSet<String>)> {
        ranking
            .iter()
            .map(|g| (g.rank, g.candidates.iter().cloned().collect()))
            .collect()
    }

    #[test]
    fn empty_inputs() {
        init();
        assert_eq!(compute_ranking(&[], &[]), vec![]);
        assert_eq!(
            compute_ranking(&cands(&["A", "B", "C"]), &[]),
            vec![group(1, &["A", "B", "C"])]
        );
    }

    #[test]
    fn ballots_without_candidates() {
        init();
        let ballots = vec![ballot("v1", &["A", "B"])];
        assert_eq!(compute_ranking(&[], &ballots), vec![]);
    }

    #[test]
    fn strict_majority() {
        init();
        let ballots = vec![
            ballot("v1", &["A", "B"]),
            ballot("v2", &["A", "B"]),
            ballot("v3", &["A", "B"]),
        ];
        let res = run_ranking_stats(&cands(&["A", "B"]), &ballots, &RankingRules::DEFAULT_RULES);
        assert_eq!(res.ranking, vec![group(1, &["A"]), group(2, &["B"])]);
        assert_eq!(res.wins_of("A"), Some(1));
        assert_eq!(res.wins_of("B"), Some(0));
        assert_eq!(res.pairwise[0].first_votes, 3);
        assert_eq!(res.pairwise[0].second_votes, 0);
        assert_eq!(res.pairwise[0].majority(), Some(100.0));
    }

    #[test]
    fn split_pairing_has_no_winner() {
        init();
        let ballots = vec![ballot("v1", &["A", "B"]), ballot("v2", &["B", "A"])];
        let res = run_ranking_stats(&cands(&["A", "B"]), &ballots, &RankingRules::DEFAULT_RULES);
        assert_eq!(res.ranking, vec![group(1, &["A", "B"])]);
        assert_eq!(res.pairwise[0].first_votes, 1);
        assert_eq!(res.pairwise[0].second_votes, 1);
        assert_eq!(res.pairwise[0].winner, None);
        assert_eq!(res.pairwise[0].majority(), None);
    }

    #[test]
    fn transitive_preferences() {
        init();
        let ballots = vec![
            ballot("v1", &["A", "B", "C"]),
            ballot("v2", &["A", "C"]),
            ballot("v3", &["B", "C"]),
            ballot("v4", &["A", "B"]),
        ];
        assert_eq!(
            compute_ranking(&cands(&["C", "B", "A"]), &ballots),
            vec![group(1, &["A"]), group(2, &["B"]), group(3, &["C"])]
        );
    }

    #[test]
    fn partial_ballot_only_counts_ranked_pairs() {
        init();
        let ballots = vec![ballot("v1", &["A", "C"])];
        let res = run_ranking_stats(
            &cands(&["A", "B", "C"]),
            &ballots,
            &RankingRules::DEFAULT_RULES,
        );
        let ab = &res.pairwise[0];
        let ac = &res.pairwise[1];
        let bc = &res.pairwise[2];
        assert_eq!((ab.first.as_str(), ab.second.as_str()), ("A", "B"));
        assert_eq!((ab.first_votes, ab.second_votes), (0, 0));
        assert_eq!((ac.first_votes, ac.second_votes), (1, 0));
        assert_eq!((bc.first_votes, bc.second_votes), (0, 0));
        assert_eq!(res.ranking, vec![group(1, &["A"]), group(2, &["B", "C"])]);
    }

    #[test]
    fn ranked_over_unranked_mode() {
        init();
        let rules = RankingRules {
            partial_ballot_mode: PartialBallotMode::RankedOverUnranked,
            ..RankingRules::DEFAULT_RULES
        };
        let ballots = vec![ballot("v1", &["A", "C"])];
        let res = run_ranking_stats(&cands(&["A", "B", "C"]), &ballots, &rules);
        assert_eq!(
            res.ranking,
            vec![group(1, &["A"]), group(2, &["C"]), group(3, &["B"])]
        );
        assert_eq!(
            res.wins,
            vec![
                ("A".to_string(), 2),
                ("C".to_string(), 1),
                ("B".to_string(), 0)
            ]
        );
    }

    #[test]
    fn repeated_runs_agree() {
        init();
        let candidates = cands(&["A", "B", "C", "D"]);
        let ballots = vec![
            ballot("v1", &["D", "A", "B"]),
            ballot("v2", &["B", "D"]),
            ballot("v3", &["C", "A", "D", "B"]),
        ];
        let first = compute_ranking(&candidates, &ballots);
        let second = compute_ranking(&candidates, &ballots);
        assert_eq!(as_sets(&first), as_sets(&second));
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_candidate_is_ignored() {
        init();
        let candidates = cands(&["A", "B"]);
        let clean = vec![
            ballot("v1", &["B", "A"]),
            ballot("v2", &["A", "B"]),
            ballot("v3", &["B", "A"]),
        ];
        let noisy = vec![
            ballot("v1", &["withdrawn", "B", "A"]),
            ballot("v2", &["A", "withdrawn", "B"]),
            ballot("v3", &["B", "A", "withdrawn"]),
        ];
        let r1 = run_ranking_stats(&candidates, &clean, &RankingRules::DEFAULT_RULES);
        let r2 = run_ranking_stats(&candidates, &noisy, &RankingRules::DEFAULT_RULES);
        assert_eq!(r1, r2);
        assert_eq!(r2.ranking, vec![group(1, &["B"]), group(2, &["A"])]);
    }

    #[test]
    fn groups_cover_candidates_exactly_once() {
        init();
        let ids = ["A", "B", "C", "D", "E", "F"];
        let candidates = cands(&ids);
        // Deterministic pseudo-random ballots.
        let mut state: u64 = 7;
        let mut ballots: Vec<Ballot> = Vec::new();
        for v in 0..40 {
            let mut order: Vec<&str> = ids.to_vec();
            for i in (1..order.len()).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = ((state >> 33) as usize) % (i + 1);
                order.swap(i, j);
            }
            let len = 1 + (v % ids.len());
            ballots.push(ballot(&format!("v{}", v), &order[..len]));
        }
        let ranking = compute_ranking(&candidates, &ballots);
        assert!(!ranking.is_empty());
        assert!(ranking.len() <= candidates.len());
        let all: Vec<String> = ranking.iter().flat_map(|g| g.candidates.clone()).collect();
        let unique: HashSet<String> = all.iter().cloned().collect();
        assert_eq!(all.len(), candidates.len());
        assert_eq!(unique, ids.iter().map(|s| s.to_string()).collect());
        for (idx, g) in ranking.iter().enumerate() {
            assert_eq!(g.rank, (idx + 1) as u32);
        }
    }

    #[test]
    fn cycle_ties_everyone() {
        init();
        let ballots = vec![
            ballot("v1", &["A", "B", "C"]),
            ballot("v2", &["B", "C", "A"]),
            ballot("v3", &["C", "A", "B"]),
        ];
        let res = run_ranking_stats(
            &cands(&["A", "B", "C"]),
            &ballots,
            &RankingRules::DEFAULT_RULES,
        );
        assert_eq!(res.ranking, vec![group(1, &["A", "B", "C"])]);
        assert!(res.wins.iter().all(|(_, w)| *w == 1));
    }

    #[test]
    fn tied_pairing_gives_no_win_despite_vote_share() {
        init();
        // A-B is split: both beat C once and share the first rank.
        let ballots = vec![
            ballot("v1", &["A", "B", "C"]),
            ballot("v2", &["B", "A", "C"]),
        ];
        let res = run_ranking_stats(
            &cands(&["A", "B", "C"]),
            &ballots,
            &RankingRules::DEFAULT_RULES,
        );
        assert_eq!(res.ranking, vec![group(1, &["A", "B"]), group(2, &["C"])]);
    }

    #[test]
    fn rank_positions_drive_preferences() {
        init();
        // Listed out of order, with a gap and a repeated position.
        let b = Ballot {
            voter: "v1".to_string(),
            timestamp: "t".to_string(),
            choices: vec![
                Choice { candidate: "C".to_string(), rank: 7 },
                Choice { candidate: "B".to_string(), rank: 2 },
                Choice { candidate: "A".to_string(), rank: 2 },
                Choice { candidate: "C".to_string(), rank: 0 },
            ],
        };
        let res = run_ranking_stats(&cands(&["A", "B", "C"]), &[b], &RankingRules::DEFAULT_RULES);
        // C (best position 0), then B (listed first at position 2), then A.
        assert_eq!(
            res.ranking,
            vec![group(1, &["C"]), group(2, &["B"]), group(3, &["A"])]
        );
    }

    #[test]
    fn duplicate_candidates_are_collapsed() {
        init();
        let mut candidates = cands(&["A", "B"]);
        candidates.push(Candidate::new("A", "Other A"));
        let ranking = compute_ranking(&candidates, &[ballot("v1", &["B", "A"])]);
        assert_eq!(ranking, vec![group(1, &["B"]), group(2, &["A"])]);
    }

    #[test]
    fn tiebreak_by_name() {
        init();
        let candidates = vec![
            Candidate::new("x1", "Zebra"),
            Candidate::new("x2", "Aardvark"),
            Candidate::new("x3", "Moose"),
        ];
        let rules = RankingRules {
            tiebreak_mode: TieBreakMode::CandidateName,
            ..RankingRules::DEFAULT_RULES
        };
        let res = run_ranking_stats(&candidates, &[], &rules);
        assert_eq!(res.ranking, vec![group(1, &["x2", "x3", "x1"])]);
        let res = run_ranking_stats(&candidates, &[], &RankingRules::DEFAULT_RULES);
        assert_eq!(res.ranking, vec![group(1, &["x1", "x2", "x3"])]);
    }

    #[test]
    fn tiebreak_by_name_inside_groups() {
        init();
        let candidates = vec![
            Candidate::new("a", "Zeta"),
            Candidate::new("b", "Alpha"),
            Candidate::new("c", "Mu"),
            Candidate::new("d", "Beta"),
        ];
        // a, b and c form a cycle and all beat d.
        let ballots = vec![
            ballot("v1", &["a", "b", "c", "d"]),
            ballot("v2", &["b", "c", "a", "d"]),
            ballot("v3", &["c", "a", "b", "d"]),
        ];
        let rules = RankingRules {
            tiebreak_mode: TieBreakMode::CandidateName,
            ..RankingRules::DEFAULT_RULES
        };
        let res = run_ranking_stats(&candidates, &ballots, &rules);
        assert_eq!(
            res.ranking,
            vec![group(1, &["b", "c", "a"]), group(2, &["d"])]
        );
        assert_eq!(res.wins[0], ("b".to_string(), 2));

        let res = run_ranking_stats(&candidates, &ballots, &RankingRules::DEFAULT_RULES);
        assert_eq!(
            res.ranking,
            vec![group(1, &["a", "b", "c"]), group(2, &["d"])]
        );
    }

    #[test]
    fn fingerprint_tracks_ranking() {
        let r1 = vec![group(1, &["A"]), group(2, &["B", "C"])];
        let r2 = vec![group(1, &["A", "B"]), group(2, &["C"])];
        assert_eq!(ranking_fingerprint(&r1), ranking_fingerprint(&r1.clone()));
        assert_ne!(ranking_fingerprint(&r1), ranking_fingerprint(&r2));
        assert_eq!(ranking_fingerprint(&r1).len(), 64);
    }
}
