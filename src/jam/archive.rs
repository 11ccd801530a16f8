// Archived jams are stored in their own files in the archive directory,
// named `gamejam_<uuid>.json`.

use crate::jam::*;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedRank {
    pub rank: u32,
    pub teams: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedJam {
    pub uuid: String,
    pub name: String,
    pub date: String,
    pub teams: Vec<JamTeam>,
    pub votes: Vec<JamVote>,
    /// Team ids, in ranked order.
    pub rankings: Vec<String>,
    #[serde(rename = "rankGroups")]
    pub rank_groups: Vec<ArchivedRank>,
    pub fingerprint: String,
}

impl ArchivedJam {
    /// Captures the current state of the jam, along with its standings at this moment.
    pub fn from_store(store: &JamStore) -> JamResult<ArchivedJam> {
        let standings = store.standings()?;
        Ok(ArchivedJam {
            uuid: store.uuid().to_string(),
            name: store.name().to_string(),
            date: chrono::Utc::now().to_rfc3339(),
            teams: store.teams().to_vec(),
            votes: store.votes().to_vec(),
            rankings: standings.ranked_ids(),
            rank_groups: standings
                .ranking
                .iter()
                .map(|g| ArchivedRank {
                    rank: g.rank,
                    teams: g.candidates.clone(),
                })
                .collect(),
            fingerprint: ranking_fingerprint(&standings.ranking),
        })
    }

    pub fn file_name(uuid: &str) -> String {
        format!("gamejam_{}.json", uuid)
    }

    pub fn save(&self, dir: &Path) -> JamResult<PathBuf> {
        fs::create_dir_all(dir).context(WritingJsonSnafu {
            path: dir.display().to_string(),
        })?;
        let p = dir.join(ArchivedJam::file_name(&self.uuid));
        info!("Saving archive {:?}", p);
        write_json(&p, self)?;
        Ok(p)
    }

    pub fn load(path: &Path) -> JamResult<ArchivedJam> {
        let path_s = path.display().to_string();
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: path_s })?;
        let arc: ArchivedJam =
            serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
        Ok(arc)
    }

    fn ranking(&self) -> Vec<RankGroup> {
        self.rank_groups
            .iter()
            .map(|g| RankGroup {
                rank: g.rank,
                candidates: g.teams.clone(),
            })
            .collect()
    }

    /// Checks that the standings have not been altered since the jam was archived.
    pub fn verify(&self) -> JamResult<()> {
        let groups = self.ranking();
        let flat: Vec<String> = groups
            .iter()
            .flat_map(|g| g.candidates.iter().cloned())
            .collect();
        ensure!(
            flat == self.rankings && ranking_fingerprint(&groups) == self.fingerprint,
            CorruptedArchiveSnafu {
                uuid: self.uuid.as_str()
            }
        );
        Ok(())
    }

    /// The ranked teams, by name. Unknown ids are displayed as is.
    pub fn rankings_by_name(&self) -> Vec<String> {
        self.rankings
            .iter()
            .map(|uuid| {
                self.teams
                    .iter()
                    .find(|t| t.uuid == *uuid)
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| uuid.clone())
            })
            .collect()
    }
}

/// Archives the current jam. Unless `keep` is set, the teams and votes of the current
/// jam are cleared afterwards.
pub fn archive_current_jam(store: &mut JamStore, keep: bool) -> JamResult<PathBuf> {
    store.ensure_uuid();
    let arc = ArchivedJam::from_store(store)?;
    let dir = store.archive_dir()?;
    let p = arc.save(&dir)?;
    if !keep {
        store.clear();
    }
    Ok(p)
}

pub fn list_archives(dir: &Path) -> JamResult<Vec<ArchivedJam>> {
    if !dir.exists() {
        debug!("list_archives: no archive directory {:?}", dir);
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).context(ReadingDirSnafu {
        path: dir.display().to_string(),
    })?;
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.context(ReadingDirSnafu {
            path: dir.display().to_string(),
        })?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with("gamejam_") && name.ends_with(".json") {
            paths.push(entry.path());
        }
    }
    paths.sort();
    let mut res: Vec<ArchivedJam> = Vec::new();
    for p in paths.iter() {
        match ArchivedJam::load(p) {
            Ok(arc) => res.push(arc),
            Err(e) => warn!("list_archives: skipping {:?}: {}", p, e),
        }
    }
    Ok(res)
}

pub fn find_archive(dir: &Path, uuid: &str) -> JamResult<ArchivedJam> {
    let p = dir.join(ArchivedJam::file_name(uuid));
    ensure!(p.exists(), MissingArchiveSnafu { uuid });
    ArchivedJam::load(&p)
}

#[cfg(test)]
mod tests {
    use super::*;

    // A fresh directory under the system temp dir, with a jam file in it.
    fn setup(test_name: &str) -> JamStore {
        let dir = std::env::temp_dir().join(format!(
            "jamvote_{}_{}",
            test_name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let data = JamFile {
            uuid: format!("{}-uuid", test_name),
            name: "Archive Jam".to_string(),
            rules: JamRules::default(),
            output_settings: OutputSettings::default(),
            teams: Vec::new(),
            votes: Vec::new(),
        };
        let mut s = JamStore::from_data(dir.join("jam.json"), data);
        s.add_team("t1", "Space Goats").unwrap();
        s.add_team("t2", "Dungeon Bakery").unwrap();
        s.add_team("t3", "Pixel Pond").unwrap();
        let ts = "2024-03-02T18:00:00Z";
        s.add_vote("c1", ts, &["t2".to_string(), "t1".to_string()], "", "")
            .unwrap();
        s.add_vote("c2", ts, &["t2".to_string(), "t3".to_string()], "", "")
            .unwrap();
        s.save().unwrap();
        s
    }

    #[test]
    fn archive_and_clear() {
        let mut s = setup("archive_and_clear");
        let p = archive_current_jam(&mut s, false).unwrap();
        assert!(p.ends_with("gamejam_archive_and_clear-uuid.json"));
        assert!(s.teams().is_empty());
        assert!(s.votes().is_empty());

        let dir = s.archive_dir().unwrap();
        let arc = find_archive(&dir, "archive_and_clear-uuid").unwrap();
        arc.verify().unwrap();
        assert_eq!(arc.votes.len(), 2);
        assert_eq!(arc.rankings[0], "t2");
        assert_eq!(arc.rankings_by_name()[0], "Dungeon Bakery");
        assert_eq!(list_archives(&dir).unwrap().len(), 1);
    }

    #[test]
    fn archived_standings_survive_withdrawal() {
        let mut s = setup("survive_withdrawal");
        archive_current_jam(&mut s, true).unwrap();
        s.withdraw_team("t2").unwrap();
        assert!(!s.standings().unwrap().ranked_ids().contains(&"t2".to_string()));

        let arc = find_archive(&s.archive_dir().unwrap(), "survive_withdrawal-uuid").unwrap();
        assert_eq!(arc.rankings[0], "t2");
        assert_eq!(arc.rank_groups[0].teams, vec!["t2".to_string()]);
    }

    #[test]
    fn tampered_archive_is_detected() {
        let mut s = setup("tampered");
        archive_current_jam(&mut s, true).unwrap();
        let dir = s.archive_dir().unwrap();
        let mut arc = find_archive(&dir, "tampered-uuid").unwrap();
        arc.rank_groups.reverse();
        assert!(matches!(
            arc.verify(),
            Err(JamError::CorruptedArchive { .. })
        ));
        assert!(matches!(
            find_archive(&dir, "nope"),
            Err(JamError::MissingArchive { .. })
        ));
    }
}
