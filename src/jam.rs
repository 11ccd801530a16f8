use log::{debug, info, warn};

use pairwise_ranking::*;
use snafu::{prelude::*, Snafu};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::jam::archive::*;
use crate::jam::config_reader::*;
use crate::jam::store::*;

pub mod archive;
pub mod config_reader;
pub mod store;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum JamError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading directory {path}"))]
    ReadingDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("No parent directory for {path}"))]
    MissingParentDir { path: String },

    #[snafu(display("Invalid team ID given: {uuid}"))]
    UnknownTeam { uuid: String },
    #[snafu(display("A team with ID {uuid} already exists"))]
    DuplicateTeam { uuid: String },
    #[snafu(display("Team {uuid} has withdrawn from the jam"))]
    WithdrawnTeam { uuid: String },
    #[snafu(display("Duplicate vote from {client} at {timestamp}"))]
    DuplicateVote { client: String, timestamp: String },
    #[snafu(display("Vote from {client} does not rank any team"))]
    EmptyVote { client: String },
    #[snafu(display("Invalid timestamp {timestamp}"))]
    InvalidTimestamp {
        source: chrono::ParseError,
        timestamp: String,
    },

    #[snafu(display("No archived jam with ID {uuid}"))]
    MissingArchive { uuid: String },
    #[snafu(display("Archived jam {uuid} does not match its fingerprint"))]
    CorruptedArchive { uuid: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type JamResult<T> = Result<T, JamError>;

pub fn validate_rules(jam_rules: &JamRules) -> JamResult<RankingRules> {
    let res = RankingRules {
        tiebreak_mode: match jam_rules.tiebreak_mode.as_deref() {
            None | Some("useCandidateOrder") => TieBreakMode::UseCandidateOrder,
            Some("candidateName") => TieBreakMode::CandidateName,
            Some(x) => {
                whatever!("Cannot use tiebreak mode {:?}", x)
            }
        },
        partial_ballot_mode: match jam_rules.partial_ballots.as_deref() {
            None | Some("requireBoth") => PartialBallotMode::RequireBoth,
            Some("rankedOverUnranked") => PartialBallotMode::RankedOverUnranked,
            Some(x) => {
                whatever!("Cannot use partial ballot policy {:?}", x)
            }
        },
    };
    Ok(res)
}

fn team_js(store: &JamStore, uuid: &str) -> JSValue {
    json!({
        "uuid": uuid,
        "name": store.team_name(uuid).unwrap_or_default(),
    })
}

fn result_stats_to_json(store: &JamStore, rs: &RankingResult) -> (Vec<JSValue>, Vec<JSValue>) {
    let mut results: Vec<JSValue> = Vec::new();
    for group in rs.ranking.iter() {
        let wins = group
            .candidates
            .first()
            .and_then(|cid| rs.wins_of(cid))
            .unwrap_or_default();
        let teams: Vec<JSValue> = group.candidates.iter().map(|cid| team_js(store, cid)).collect();
        results.push(json!({
            "rank": group.rank,
            "wins": wins.to_string(),
            "teams": teams,
        }));
    }

    let mut matchups: Vec<JSValue> = Vec::new();
    for p in rs.pairwise.iter() {
        matchups.push(json!({
            "teams": [p.first, p.second],
            "votes": [p.first_votes.to_string(), p.second_votes.to_string()],
            "winner": p.winner,
            "majority": p.majority().map(|m| format!("{:.1}", m)),
        }));
    }
    (results, matchups)
}

pub fn build_summary_js(store: &JamStore, num_ballots: usize, rs: &RankingResult) -> JSValue {
    let (results, matchups) = result_stats_to_json(store, rs);
    json!({
        "config": {
            "jam": store.name(),
            "uuid": store.uuid(),
            "ballots": num_ballots.to_string(),
            "teams": rs.wins.len().to_string(),
        },
        "results": results,
        "matchups": matchups,
    })
}

fn print_standings(store: &JamStore, rs: &RankingResult) {
    if rs.ranking.is_empty() {
        println!("No teams in the jam.");
        return;
    }
    for group in rs.ranking.iter() {
        for cid in group.candidates.iter() {
            let name = store.team_name(cid).unwrap_or_default();
            let wins = rs.wins_of(cid).unwrap_or_default();
            println!("{:>3}. {:<32} {:>3} wins", group.rank, name, wins);
        }
    }
}

/// Computes the standings of the jam, and checks them against a reference summary if provided.
pub fn run_standings(
    config_path: &str,
    out: Option<String>,
    check_summary_path: Option<String>,
) -> JamResult<()> {
    let store = JamStore::load(Path::new(config_path))?;
    let rules = store.rules()?;
    let (candidates, ballots) = store.snapshot();
    let result = run_ranking_stats(&candidates, &ballots, &rules);
    debug!("run_standings: {:?}", result);

    print_standings(&store, &result);

    let result_js = normalize_summary(build_summary_js(&store, ballots.len(), &result));
    let pretty_js_stats =
        serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    let out_path: Option<String> = match out {
        Some(p) => Some(p),
        None if store.data().output_settings.output_directory.is_some() => {
            let dir = store.output_dir()?;
            Some(
                dir.join(format!("standings_{}.json", store.uuid()))
                    .display()
                    .to_string(),
            )
        }
        None => None,
    };
    match out_path.as_deref() {
        Some("stdout") => {
            println!("{}", pretty_js_stats);
        }
        Some(p) => {
            info!("Writing summary to {}", p);
            if let Some(parent) = Path::new(p).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).context(WritingJsonSnafu { path: p })?;
                }
            }
            write_json(Path::new(p), &result_js)?;
        }
        None => {}
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(&summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

/// One line of the vote listing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteLine {
    pub timestamp: String,
    pub client_id: String,
    pub choices: Vec<String>,
    pub voter_status: String,
    pub discovery: String,
}

#[derive(Debug, Clone)]
pub struct VoteReport {
    pub votes: Vec<VoteLine>,
    pub voter_statuses: BTreeMap<String, u32>,
    pub standings: RankingResult,
}

pub fn vote_report(store: &JamStore) -> JamResult<VoteReport> {
    let today = chrono::Local::now().naive_local().date();
    let mut votes: Vec<VoteLine> = Vec::new();
    let mut voter_statuses: BTreeMap<String, u32> = BTreeMap::new();
    for v in store.votes() {
        // Teams that are unknown or withdrawn are not displayed.
        let choices: Vec<String> = v
            .choices
            .iter()
            .filter_map(|c| store.active_team(&c.team).map(|t| t.name.clone()))
            .collect();
        let status = v.voter_status.trim();
        if !status.is_empty() {
            *voter_statuses.entry(status.to_string()).or_insert(0) += 1;
        }
        votes.push(VoteLine {
            timestamp: display_timestamp(&v.timestamp, today),
            client_id: v.client_id.clone(),
            choices,
            voter_status: v.voter_status.clone(),
            discovery: v.discovery.clone(),
        });
    }
    Ok(VoteReport {
        votes,
        voter_statuses,
        standings: store.standings()?,
    })
}

/// Votes from previous days show the date, votes from today only the time.
pub fn display_timestamp(ts: &str, today: chrono::NaiveDate) -> String {
    match chrono::DateTime::parse_from_rfc3339(ts) {
        Ok(dt) if dt.naive_local().date() < today => dt.format("%b %e %H:%M").to_string(),
        Ok(dt) => dt.format("%-I:%M%p").to_string(),
        Err(_) => ts.to_string(),
    }
}

pub fn run_votes_report(config_path: &str) -> JamResult<()> {
    let store = JamStore::load(Path::new(config_path))?;
    let report = vote_report(&store)?;
    println!("{} votes", report.votes.len());
    for v in report.votes.iter() {
        println!(
            "{:>13}  {:<12} {:<12} {:<12} {}",
            v.timestamp,
            v.client_id,
            v.voter_status,
            v.discovery,
            v.choices.join(" > ")
        );
    }
    if !report.voter_statuses.is_empty() {
        println!();
        for (status, count) in report.voter_statuses.iter() {
            println!("{:<12} {}", status, count);
        }
    }
    println!();
    print_standings(&store, &report.standings);
    Ok(())
}

pub fn run_add_team(config_path: &str, uuid: Option<String>, name: &str) -> JamResult<()> {
    let mut store = JamStore::load(Path::new(config_path))?;
    let uuid = uuid.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    store.add_team(&uuid, name)?;
    store.save()?;
    println!("Added team {} ({})", name, uuid);
    Ok(())
}

pub fn run_withdraw(config_path: &str, team: &str) -> JamResult<()> {
    let mut store = JamStore::load(Path::new(config_path))?;
    store.withdraw_team(team)?;
    store.save()?;
    println!("Team {} withdrawn", team);
    Ok(())
}

pub fn run_vote(
    config_path: &str,
    client: &str,
    timestamp: Option<String>,
    choices: &[String],
    voter_status: Option<String>,
    discovery: Option<String>,
) -> JamResult<()> {
    let mut store = JamStore::load(Path::new(config_path))?;
    let ts = timestamp.unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
    store.add_vote(
        client,
        &ts,
        choices,
        voter_status.as_deref().unwrap_or_default(),
        discovery.as_deref().unwrap_or_default(),
    )?;
    store.save()?;
    println!("Vote saved!");
    Ok(())
}

pub fn run_archive(config_path: &str, keep: bool) -> JamResult<()> {
    let mut store = JamStore::load(Path::new(config_path))?;
    let path = archive_current_jam(&mut store, keep)?;
    store.save()?;
    println!("Archived jam to {}", path.display());
    Ok(())
}

pub fn run_archives(config_path: &str, id: Option<String>) -> JamResult<()> {
    let store = JamStore::load(Path::new(config_path))?;
    let dir = store.archive_dir()?;
    match id {
        None => {
            for arc in list_archives(&dir)? {
                println!("{}  {:<32} {}", arc.uuid, arc.name, arc.date);
            }
        }
        Some(uuid) => {
            let arc = find_archive(&dir, &uuid)?;
            arc.verify()?;
            println!("{} ({})", arc.name, arc.date);
            for (idx, name) in arc.rankings_by_name().iter().enumerate() {
                println!("{:>3}. {}", idx + 1, name);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
fn run_standings_test(test_name: &str, config_lpath: &str, summary_lpath: &str) -> JamResult<()> {
    let test_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/test_data");
    info!("Running test {}", test_name);
    run_standings(
        &format!("{}/{}/{}", test_dir, test_name, config_lpath),
        None,
        Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
    )
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    let res = run_standings_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    );
    if let Err(e) = res {
        panic!("test {} failed: {}", test_name, e);
    }
}
