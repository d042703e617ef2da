use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use rand::Rng;
use tempfile::NamedTempFile;

use crate::error::WorkshopResult;
use crate::store::familiar::{Familiar, FamiliarPatch, NewFamiliar, Tally, Vote, LANE_COUNT};
use crate::store::seed::seed_familiars;

/// Familiar records keyed by id, in document order, backed by one JSON file.
///
/// The whole collection lives in memory. Every mutation rewrites the file by
/// writing a temp file in the same directory and renaming it over the target,
/// so readers never observe a half-written document. Lookups of unknown ids
/// are not errors: updates and deletes simply report `false`.
pub struct FamiliarStore {
    path: PathBuf,
    records: IndexMap<String, Familiar>,
}

impl FamiliarStore {
    /// Loads the document at `path`.
    ///
    /// A missing document is seeded with the placeholder familiars and
    /// written immediately. Records that do not fit the schema are skipped
    /// one by one. A document that is not a JSON array at all is left on
    /// disk untouched and the seeds are served from memory until the next
    /// mutation overwrites it.
    pub fn open(path: impl Into<PathBuf>) -> WorkshopResult<Self> {
        let path = path.into();
        let loaded = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Vec<serde_json::Value>>(&bytes) {
                Ok(entries) => Some(parse_records(&path, entries)),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "familiar document is corrupt, serving seeds");
                    None
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let store = Self::from_records(path, seed_familiars());
                write_document(&store.path, &store.records)?;
                tracing::info!(path = %store.path.display(), "seeded new familiar document");
                return Ok(store);
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "familiar document unreadable, serving seeds");
                None
            }
        };

        let store = Self::from_records(path, loaded.unwrap_or_else(seed_familiars));
        tracing::info!(path = %store.path.display(), count = store.len(), "loaded familiars");
        Ok(store)
    }

    fn from_records(path: PathBuf, list: Vec<Familiar>) -> Self {
        let mut records = IndexMap::with_capacity(list.len());
        for familiar in list {
            if records.contains_key(&familiar.id) {
                tracing::warn!(id = %familiar.id, "dropping duplicate familiar id");
                continue;
            }
            records.insert(familiar.id.clone(), familiar);
        }
        FamiliarStore { path, records }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Familiar> {
        self.records.get(id)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Every record, newest submissions first.
    pub fn all(&self) -> Vec<Familiar> {
        self.records.values().cloned().collect()
    }

    pub fn by_owner(&self, owner_id: &str) -> Vec<Familiar> {
        self.records
            .values()
            .filter(|f| f.user_id == owner_id)
            .cloned()
            .collect()
    }

    /// Records by `magic_power`, highest first. Ties keep document order.
    pub fn leaderboard(&self) -> Vec<Familiar> {
        let mut ranked = self.all();
        ranked.sort_by(|a, b| b.magic_power.cmp(&a.magic_power));
        ranked
    }

    /// Records with a lane and speed for the flying animation.
    ///
    /// Missing lanes become `index % 5` and missing speeds `10 + U[0,1)*15`.
    /// The filled values are not persisted.
    pub fn forest<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Familiar> {
        self.records
            .values()
            .enumerate()
            .map(|(i, f)| {
                let mut f = f.clone();
                if f.lane.is_none() {
                    f.lane = Some((i % LANE_COUNT as usize) as u8);
                }
                if f.speed.is_none() {
                    f.speed = Some(10.0 + rng.gen::<f64>() * 15.0);
                }
                f
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Inserts at the front of the collection.
    pub fn insert(&mut self, familiar: Familiar) -> WorkshopResult<()> {
        self.commit(|records| {
            records.shift_insert(0, familiar.id.clone(), familiar);
        })
    }

    /// Creates a new record for `owner_id` and inserts it at the front.
    pub fn summon<R: Rng + ?Sized>(
        &mut self,
        new: NewFamiliar,
        owner_id: &str,
        rng: &mut R,
    ) -> WorkshopResult<Familiar> {
        let now = now_millis();
        let id = self.unused_id(now);
        let familiar = Familiar::summon(new, id, owner_id, now, rng);
        self.insert(familiar.clone())?;
        tracing::info!(id = %familiar.id, owner = owner_id, "summoned familiar");
        Ok(familiar)
    }

    /// Shallow-merges `patch` into the record. Unknown ids are a no-op.
    pub fn update(&mut self, id: &str, patch: FamiliarPatch) -> WorkshopResult<bool> {
        if !self.records.contains_key(id) {
            tracing::debug!(id, "update of unknown familiar ignored");
            return Ok(false);
        }
        self.commit(|records| {
            if let Some(familiar) = records.get_mut(id) {
                patch.apply(familiar);
            }
        })?;
        Ok(true)
    }

    /// Removes the record. Returns `false` when it was already absent.
    pub fn delete(&mut self, id: &str) -> WorkshopResult<bool> {
        if !self.records.contains_key(id) {
            return Ok(false);
        }
        self.commit(|records| {
            records.shift_remove(id);
        })?;
        Ok(true)
    }

    /// Counts a vote and recomputes magic power. `None` for unknown ids.
    pub fn vote(&mut self, id: &str, vote: Vote) -> WorkshopResult<Option<Tally>> {
        if !self.records.contains_key(id) {
            return Ok(None);
        }
        self.commit(|records| records.get_mut(id).map(|familiar| familiar.apply_vote(vote)))
    }

    /// Makes `id` the owner's only main familiar.
    ///
    /// The owner's other records lose the flag even when `id` is unknown.
    /// Returns whether `id` exists.
    pub fn set_main(&mut self, owner_id: &str, id: &str) -> WorkshopResult<bool> {
        self.commit(|records| {
            for familiar in records.values_mut() {
                if familiar.user_id == owner_id {
                    familiar.is_main = false;
                }
            }
            match records.get_mut(id) {
                Some(familiar) => {
                    familiar.is_main = true;
                    true
                }
                None => false,
            }
        })
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Applies `mutate` to a copy of the records and swaps the copy in only
    /// once it is on disk. A failed write leaves memory untouched.
    fn commit<T>(
        &mut self,
        mutate: impl FnOnce(&mut IndexMap<String, Familiar>) -> T,
    ) -> WorkshopResult<T> {
        let mut staged = self.records.clone();
        let out = mutate(&mut staged);
        write_document(&self.path, &staged)?;
        self.records = staged;
        Ok(out)
    }

    fn unused_id(&self, now: i64) -> String {
        let base = now.to_string();
        if !self.records.contains_key(&base) {
            return base;
        }
        (1..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !self.records.contains_key(candidate))
            .unwrap_or(base)
    }
}

/// Decodes each entry on its own so that one bad record does not cost the rest.
fn parse_records(path: &Path, entries: Vec<serde_json::Value>) -> Vec<Familiar> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Familiar>(entry) {
            Ok(familiar) => Some(familiar),
            Err(err) => {
                tracing::warn!(path = %path.display(), index, error = %err, "skipping unreadable familiar record");
                None
            }
        })
        .collect()
}

/// Writes the records as a pretty JSON array through a temp file in the same
/// directory, renamed over `path` once synced.
fn write_document(path: &Path, records: &IndexMap<String, Familiar>) -> WorkshopResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let list: Vec<&Familiar> = records.values().collect();
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, &list)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    tracing::debug!(path = %path.display(), count = list.len(), "flushed familiars");
    Ok(())
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn new_familiar(name: &str) -> NewFamiliar {
        serde_json::from_value(serde_json::json!({ "animal_name": name })).unwrap()
    }

    fn open_temp() -> (tempfile::TempDir, FamiliarStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FamiliarStore::open(dir.path().join("data").join("familiars.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_document_is_seeded_and_written() {
        let (_dir, store) = open_temp();
        assert_eq!(store.len(), 5);
        let on_disk: Vec<Familiar> =
            serde_json::from_slice(&fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk, store.all());
    }

    #[test]
    fn corrupt_document_serves_seeds_without_rewriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("familiars.json");
        fs::write(&path, b"{ not json").unwrap();

        let store = FamiliarStore::open(&path).unwrap();
        assert_eq!(store.len(), 5);
        assert_eq!(fs::read(&path).unwrap(), b"{ not json");
    }

    #[test]
    fn records_that_do_not_fit_are_skipped_individually() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("familiars.json");
        fs::write(
            &path,
            r#"[
                {"id": "keep-1", "animal_name": "Moss", "likes": 3},
                {"id": "bad-likes", "likes": -1},
                {"id": "bad-lane", "lane": 300},
                {"id": "bad-time", "created_time": 1.5},
                {"animal_name": "no id"},
                {"id": "keep-2", "animal_name": "Fern"}
            ]"#,
        )
        .unwrap();

        let store = FamiliarStore::open(&path).unwrap();
        let ids: Vec<String> = store.all().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["keep-1", "keep-2"]);
        assert_eq!(store.get("keep-1").unwrap().likes, 3);
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let (dir, mut store) = open_temp();
        let mut rng = StdRng::seed_from_u64(5);
        let before = store.all();

        // a plain file where the data directory should be makes every write fail
        let data_dir = dir.path().join("data");
        fs::remove_dir_all(&data_dir).unwrap();
        fs::write(&data_dir, b"not a directory").unwrap();

        assert!(store.summon(new_familiar("Ghost"), "local_user", &mut rng).is_err());
        assert!(store.vote("m1", Vote::Like).is_err());
        let patch = FamiliarPatch { animal_name: Some("Renamed".into()), ..Default::default() };
        assert!(store.update("m2", patch).is_err());
        assert!(store.delete("m3").is_err());
        assert!(store.set_main("ai_1", "m4").is_err());

        assert_eq!(store.len(), 5);
        assert_eq!(store.all(), before);
        assert_eq!(store.get("m1").unwrap().likes, before[0].likes);
    }

    #[test]
    fn summon_inserts_at_front_and_persists() {
        let (_dir, mut store) = open_temp();
        let mut rng = StdRng::seed_from_u64(9);
        let created = store.summon(new_familiar("Pip"), "local_user", &mut rng).unwrap();

        assert_eq!(store.all()[0].id, created.id);
        let reopened = FamiliarStore::open(store.path()).unwrap();
        assert_eq!(reopened.all()[0], created);
        assert_eq!(reopened.len(), 6);
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let (_dir, mut store) = open_temp();
        let mut rng = StdRng::seed_from_u64(2);
        let a = Familiar::summon(new_familiar("A"), store.unused_id(5), "u", 5, &mut rng);
        store.insert(a).unwrap();
        assert_eq!(store.unused_id(5), "5-1");
    }

    #[test]
    fn update_merges_and_unknown_id_is_a_no_op() {
        let (_dir, mut store) = open_temp();
        let patch = FamiliarPatch { animal_name: Some("Nova".into()), ..Default::default() };
        assert!(store.update("m1", patch).unwrap());
        let m1 = store.get("m1").unwrap();
        assert_eq!(m1.animal_name, "Nova");
        assert_eq!(m1.animal_species, "Owl");

        let before = fs::read(store.path()).unwrap();
        let patch = FamiliarPatch { likes: Some(3), ..Default::default() };
        assert!(!store.update("nope", patch).unwrap());
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn delete_reports_absence() {
        let (_dir, mut store) = open_temp();
        assert!(store.delete("m3").unwrap());
        assert!(!store.delete("m3").unwrap());
        assert_eq!(store.len(), 4);
        assert!(store.all().iter().all(|f| f.id != "m3"));
    }

    #[test]
    fn votes_recompute_magic_power() {
        let (_dir, mut store) = open_temp();
        let tally = store.vote("m5", Vote::Dislike).unwrap().unwrap();
        assert_eq!(tally, Tally { likes: 60, dislikes: 16, magic_power: 44 });
        assert!(store.vote("ghost", Vote::Like).unwrap().is_none());
        for f in store.all() {
            if f.id == "m5" {
                assert_eq!(f.magic_power, f.likes as i64 - f.dislikes as i64);
            }
        }
    }

    #[test]
    fn leaderboard_is_descending_and_stable() {
        let (_dir, mut store) = open_temp();
        // m2 and m4 tie at 150; m2 sits earlier in the document.
        store
            .update("m2", FamiliarPatch { magic_power: Some(150), ..Default::default() })
            .unwrap();
        let ids: Vec<String> = store.leaderboard().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["m3", "m2", "m4", "m1", "m5"]);
    }

    #[test]
    fn by_owner_filters_on_explicit_owner() {
        let (_dir, mut store) = open_temp();
        let mut rng = StdRng::seed_from_u64(4);
        store.summon(new_familiar("Mine"), "witch", &mut rng).unwrap();
        let mine = store.by_owner("witch");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].animal_name, "Mine");
        assert!(store.by_owner("local_user").is_empty());
    }

    #[test]
    fn set_main_keeps_a_single_main_per_owner() {
        let (_dir, mut store) = open_temp();
        let mut rng = StdRng::seed_from_u64(5);
        let a = store.summon(new_familiar("A"), "witch", &mut rng).unwrap();
        let b = Familiar { id: "b".into(), ..a.clone() };
        store.insert(b).unwrap();

        assert!(store.set_main("witch", &a.id).unwrap());
        assert!(store.set_main("witch", "b").unwrap());
        let mains: Vec<String> = store
            .by_owner("witch")
            .into_iter()
            .filter(|f| f.is_main)
            .map(|f| f.id)
            .collect();
        assert_eq!(mains, vec!["b".to_string()]);

        assert!(!store.set_main("witch", "ghost").unwrap());
        assert!(store.by_owner("witch").iter().all(|f| !f.is_main));
    }

    #[test]
    fn forest_fills_missing_lane_and_speed_without_persisting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("familiars.json");
        let doc = serde_json::json!([
            { "id": "a" },
            { "id": "b", "lane": 3, "speed": 11.5 },
            { "id": "c" },
        ]);
        fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

        let store = FamiliarStore::open(&path).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let forest = store.forest(&mut rng);
        assert_eq!(forest[0].lane, Some(0));
        assert_eq!(forest[1].lane, Some(3));
        assert_eq!(forest[1].speed, Some(11.5));
        assert_eq!(forest[2].lane, Some(2));
        for f in &forest {
            let s = f.speed.unwrap();
            assert!((10.0..30.0).contains(&s));
        }
        assert_eq!(store.get("a").unwrap().lane, None);
    }
}
