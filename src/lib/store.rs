
pub mod store {

	use std::collections::HashSet;
	use std::fs::{File, OpenOptions};
	use std::io::{BufRead, BufReader, Write};
	use std::path::Path;

	// Scene ids already fetched, one per line in an append-only log. The
	// log is read once at startup; membership check and append happen in a
	// single call so the set can never pick up duplicates.
	pub struct SceneStore {
		seen: HashSet<String>,
		log: Option<File>,
	}

	impl SceneStore {
		pub fn open(path: &Path) -> std::io::Result<SceneStore> {
			let mut seen = HashSet::new();
			if path.exists() {
				let reader = BufReader::new(File::open(path)?);
				for line in reader.lines() {
					let line = line?;
					if !line.is_empty() {
						seen.insert(line);
					}
				}
			}
			let log = OpenOptions::new().create(true).append(true).open(path)?;
			return Ok(SceneStore { seen, log: Some(log) });
		}

		// No backing file; dedup lasts for this run only.
		pub fn in_memory() -> SceneStore {
			return SceneStore { seen: HashSet::new(), log: None };
		}

		// True if the id was not seen before; a new id is recorded in memory
		// and appended to the log before this returns.
		pub fn insert(&mut self, sid: &str) -> std::io::Result<bool> {
			if self.seen.contains(sid) {
				return Ok(false);
			}
			if let Some(log) = self.log.as_mut() {
				writeln!(log, "{}", sid)?;
			}
			self.seen.insert(sid.to_string());
			return Ok(true);
		}

		pub fn len(&self) -> usize {
			return self.seen.len();
		}

		pub fn is_empty(&self) -> bool {
			return self.seen.is_empty();
		}
	}

	#[cfg(test)]
	mod tests {
		use super::*;
		use std::fs;
		use std::path::PathBuf;

		fn scratch_file(name: &str) -> PathBuf {
			let path = std::env::temp_dir()
				.join(format!("bdpano_store_{}_{}.txt", std::process::id(), name));
			let _ = fs::remove_file(&path);
			return path;
		}

		#[test]
		fn insert_is_idempotent() {
			let mut store = SceneStore::in_memory();
			assert!(store.insert("09002200122014093015514Z").unwrap());
			assert!(!store.insert("09002200122014093015514Z").unwrap());
			assert!(store.insert("other").unwrap());
			assert_eq!(store.len(), 2);
		}

		#[test]
		fn seen_ids_survive_a_reopen() {
			let path = scratch_file("reopen");

			let mut store = SceneStore::open(&path).unwrap();
			assert!(store.insert("abc").unwrap());
			assert!(store.insert("def").unwrap());
			drop(store);

			let mut store = SceneStore::open(&path).unwrap();
			assert_eq!(store.len(), 2);
			assert!(!store.insert("abc").unwrap());
			assert!(store.insert("ghi").unwrap());
			drop(store);

			let contents = fs::read_to_string(&path).unwrap();
			let lines: Vec<&str> = contents.lines().collect();
			assert_eq!(lines, vec!["abc", "def", "ghi"]);

			let _ = fs::remove_file(&path);
		}

		#[test]
		fn duplicate_runs_do_not_duplicate_log_lines() {
			let path = scratch_file("dupes");

			for _ in 0..2 {
				let mut store = SceneStore::open(&path).unwrap();
				store.insert("abc").unwrap();
				store.insert("def").unwrap();
			}

			let contents = fs::read_to_string(&path).unwrap();
			assert_eq!(contents.lines().filter(|l| *l == "abc").count(), 1);
			assert_eq!(contents.lines().filter(|l| *l == "def").count(), 1);

			let _ = fs::remove_file(&path);
		}
	}
}
