use crate::jam::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct JamRules {
    #[serde(rename = "tiebreakMode", skip_serializing_if = "Option::is_none")]
    pub tiebreak_mode: Option<String>,
    #[serde(rename = "partialBallots", skip_serializing_if = "Option::is_none")]
    pub partial_ballots: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "outputDirectory", skip_serializing_if = "Option::is_none")]
    pub output_directory: Option<String>,
    #[serde(rename = "archiveDirectory", skip_serializing_if = "Option::is_none")]
    pub archive_directory: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct JamTeam {
    pub uuid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub withdrawn: bool,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct JamChoice {
    pub team: String,
    pub rank: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct JamVote {
    #[serde(rename = "clientId")]
    pub client_id: String,
    pub timestamp: String,
    pub choices: Vec<JamChoice>,
    // Either 'participant', 'volunteer' or 'visitor'. Not used for the standings.
    #[serde(rename = "voterStatus", default)]
    pub voter_status: String,
    // How the voter heard about the jam.
    #[serde(default)]
    pub discovery: String,
}

/// The content of a jam file.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct JamFile {
    #[serde(default)]
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub rules: JamRules,
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub teams: Vec<JamTeam>,
    #[serde(default)]
    pub votes: Vec<JamVote>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

pub fn read_jam_file(path: &Path) -> JamResult<JamFile> {
    let path_s = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: path_s })?;
    let jam: JamFile = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!(
        "read_jam_file: {} teams, {} votes",
        jam.teams.len(),
        jam.votes.len()
    );
    Ok(jam)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> JamResult<()> {
    let contents = serde_json::to_string_pretty(value).context(ParsingJsonSnafu {})?;
    fs::write(path, contents).context(WritingJsonSnafu {
        path: path.display().to_string(),
    })
}

/// Resolves a directory of the output settings against the location of the jam file.
pub fn resolve_dir(jam_path: &Path, dir: &Option<String>, default: &str) -> JamResult<PathBuf> {
    let d = dir.clone().unwrap_or_else(|| default.to_string());
    let p = PathBuf::from(&d);
    if p.is_absolute() {
        return Ok(p);
    }
    let parent = jam_path.parent().context(MissingParentDirSnafu {
        path: jam_path.display().to_string(),
    })?;
    Ok(parent.join(p))
}

pub fn read_summary(path: &str) -> JamResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(normalize_summary(js))
}

/// The order of the teams inside a rank is not significant. Sort them to ensure stability
/// when comparing summaries.
pub fn normalize_summary(mut js: JSValue) -> JSValue {
    if let Some(results) = js.get_mut("results").and_then(|r| r.as_array_mut()) {
        for res in results.iter_mut() {
            if let Some(teams) = res.get_mut("teams").and_then(|t| t.as_array_mut()) {
                teams.sort_by_key(|t| t["uuid"].as_str().unwrap_or_default().to_string());
            }
        }
    }
    js
}
