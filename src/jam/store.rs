// The in-memory state of the current jam, backed by the jam file.

use crate::jam::*;

use std::collections::HashSet;

pub struct JamStore {
    path: PathBuf,
    data: JamFile,
}

impl JamStore {
    pub fn load(path: &Path) -> JamResult<JamStore> {
        info!("Loading jam file {:?}", path);
        let data = read_jam_file(path)?;
        Ok(JamStore::from_data(path.to_path_buf(), data))
    }

    pub fn from_data(path: PathBuf, data: JamFile) -> JamStore {
        JamStore { path, data }
    }

    pub fn save(&self) -> JamResult<()> {
        debug!("Saving jam file {:?}", self.path);
        write_json(&self.path, &self.data)
    }

    pub fn data(&self) -> &JamFile {
        &self.data
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn uuid(&self) -> &str {
        &self.data.uuid
    }

    /// Assigns an identifier to the jam if it does not have one yet.
    pub fn ensure_uuid(&mut self) -> String {
        if self.data.uuid.is_empty() {
            self.data.uuid = uuid::Uuid::new_v4().to_string();
        }
        self.data.uuid.clone()
    }

    pub fn teams(&self) -> &[JamTeam] {
        &self.data.teams
    }

    pub fn votes(&self) -> &[JamVote] {
        &self.data.votes
    }

    pub fn rules(&self) -> JamResult<RankingRules> {
        validate_rules(&self.data.rules)
    }

    pub fn output_dir(&self) -> JamResult<PathBuf> {
        resolve_dir(&self.path, &self.data.output_settings.output_directory, "out")
    }

    pub fn archive_dir(&self) -> JamResult<PathBuf> {
        resolve_dir(&self.path, &self.data.output_settings.archive_directory, "archive")
    }

    pub fn team(&self, uuid: &str) -> Option<&JamTeam> {
        self.data.teams.iter().find(|t| t.uuid == uuid)
    }

    /// The team, if it is still competing.
    pub fn active_team(&self, uuid: &str) -> Option<&JamTeam> {
        self.team(uuid).filter(|t| !t.withdrawn)
    }

    pub fn team_name(&self, uuid: &str) -> Option<&str> {
        self.team(uuid).map(|t| t.name.as_str())
    }

    pub fn add_team(&mut self, uuid: &str, name: &str) -> JamResult<()> {
        ensure!(
            self.team(uuid).is_none(),
            DuplicateTeamSnafu { uuid }
        );
        self.data.teams.push(JamTeam {
            uuid: uuid.to_string(),
            name: name.to_string(),
            withdrawn: false,
        });
        Ok(())
    }

    /// Withdraws a team. The votes that mention it are kept, but it will not
    /// appear in the standings anymore.
    pub fn withdraw_team(&mut self, uuid: &str) -> JamResult<()> {
        let team = self
            .data
            .teams
            .iter_mut()
            .find(|t| t.uuid == uuid)
            .context(UnknownTeamSnafu { uuid })?;
        if team.withdrawn {
            warn!("withdraw_team: team {} was already withdrawn", uuid);
        }
        team.withdrawn = true;
        Ok(())
    }

    /// Records a vote. `teams` is the ordered list of preferences, the favourite first.
    pub fn add_vote(
        &mut self,
        client: &str,
        timestamp: &str,
        teams: &[String],
        voter_status: &str,
        discovery: &str,
    ) -> JamResult<()> {
        chrono::DateTime::parse_from_rfc3339(timestamp)
            .context(InvalidTimestampSnafu { timestamp })?;
        let duplicate = self
            .data
            .votes
            .iter()
            .any(|v| v.client_id == client && v.timestamp == timestamp);
        ensure!(!duplicate, DuplicateVoteSnafu { client, timestamp });
        ensure!(!teams.is_empty(), EmptyVoteSnafu { client });

        let mut seen: HashSet<&str> = HashSet::new();
        for t in teams.iter() {
            let team = self.team(t).context(UnknownTeamSnafu { uuid: t })?;
            ensure!(!team.withdrawn, WithdrawnTeamSnafu { uuid: t });
            if !seen.insert(t.as_str()) {
                whatever!("Team {} is ranked more than once", t);
            }
        }

        self.data.votes.push(JamVote {
            client_id: client.to_string(),
            timestamp: timestamp.to_string(),
            choices: teams
                .iter()
                .enumerate()
                .map(|(idx, t)| JamChoice {
                    team: t.clone(),
                    rank: idx as u32,
                })
                .collect(),
            voter_status: voter_status.to_string(),
            discovery: discovery.to_string(),
        });
        Ok(())
    }

    /// Copies the current teams and votes for a ranking computation.
    /// Withdrawn teams are left out.
    pub fn snapshot(&self) -> (Vec<Candidate>, Vec<Ballot>) {
        let candidates: Vec<Candidate> = self
            .data
            .teams
            .iter()
            .filter(|t| !t.withdrawn)
            .map(|t| Candidate::new(&t.uuid, &t.name))
            .collect();
        let ballots: Vec<Ballot> = self
            .data
            .votes
            .iter()
            .map(|v| Ballot {
                voter: v.client_id.clone(),
                timestamp: v.timestamp.clone(),
                choices: v
                    .choices
                    .iter()
                    .map(|c| Choice {
                        candidate: c.team.clone(),
                        rank: c.rank,
                    })
                    .collect(),
            })
            .collect();
        (candidates, ballots)
    }

    pub fn standings(&self) -> JamResult<RankingResult> {
        let rules = self.rules()?;
        let (candidates, ballots) = self.snapshot();
        Ok(run_ranking_stats(&candidates, &ballots, &rules))
    }

    /// Starts a new jam: the teams and the votes are dropped and a new identifier is assigned.
    pub fn clear(&mut self) {
        info!("Clearing jam {} ({})", self.data.name, self.data.uuid);
        self.data.teams.clear();
        self.data.votes.clear();
        self.data.uuid = uuid::Uuid::new_v4().to_string();
    }
}
