use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use corrector_common::BotProfile;
use tracing::debug;

use super::backend::{LoadOutcome, StateBackend, StateError, StateFile};

/// JSON file backend. Saves write a temp file in the same directory and
/// rename it over the real path; corrupt files are renamed aside with a
/// timestamp suffix instead of being overwritten.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `{data_dir}/state/{profile}.json`
    pub fn for_profile(data_dir: &Path, profile: BotProfile) -> Self {
        Self::new(data_dir.join("state").join(format!("{}.json", profile.slug())))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(path: &Path, source: std::io::Error) -> StateError {
        StateError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Move the unreadable file to `{name}.corrupt-{stamp}`, falling back to a copy.
    fn preserve_corrupt(&self) -> Result<PathBuf, StateError> {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "state.json".to_string());
        let stamp = Utc::now().format("%Y%m%dT%H%M%SZ");

        let mut backup = self.path.with_file_name(format!("{name}.corrupt-{stamp}"));
        let mut n = 1;
        while backup.exists() {
            backup = self.path.with_file_name(format!("{name}.corrupt-{stamp}-{n}"));
            n += 1;
        }

        if fs::rename(&self.path, &backup).is_err() {
            fs::copy(&self.path, &backup).map_err(|source| StateError::Backup {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(backup)
    }
}

impl StateBackend for FileBackend {
    fn load(&self) -> Result<LoadOutcome, StateError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LoadOutcome::Missing),
            Err(e) => return Err(Self::io_err(&self.path, e)),
        };

        match serde_json::from_slice::<StateFile>(&bytes) {
            Ok(state) => Ok(LoadOutcome::Loaded(state)),
            Err(parse_err) => {
                let backup = self.preserve_corrupt()?;
                Ok(LoadOutcome::Corrupt {
                    backup: backup.display().to_string(),
                    reason: parse_err.to_string(),
                })
            }
        }
    }

    fn save(&self, state: &StateFile) -> Result<(), StateError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| Self::io_err(dir, e))?;

        let bytes = serde_json::to_vec_pretty(state)?;

        // Temp name carries the pid so two processes never share a temp file.
        let tmp = self
            .path
            .with_extension(format!("json.tmp.{}", std::process::id()));
        let write_tmp = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()
        };
        if let Err(e) = write_tmp() {
            let _ = fs::remove_file(&tmp);
            return Err(Self::io_err(&tmp, e));
        }

        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(Self::io_err(&self.path, e));
        }

        debug!(path = %self.path.display(), "State saved");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> StateFile {
        StateFile {
            last_reset_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            daily_count: 2,
            processed_ids: vec!["3".into(), "1".into(), "2".into()],
        }
    }

    #[test]
    fn missing_file_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("nope.json"));
        assert_eq!(backend.load().unwrap(), LoadOutcome::Missing);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("nested/state.json"));
        backend.save(&sample()).unwrap();
        assert_eq!(backend.load().unwrap(), LoadOutcome::Loaded(sample()));
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("state.json"));
        backend.save(&sample()).unwrap();
        backend.save(&sample()).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["state.json".to_string()]);
    }

    #[test]
    fn file_uses_documented_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        FileBackend::new(&path).save(&sample()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["lastResetDate"], "2024-05-01");
        assert_eq!(raw["dailyCount"], 2);
        assert_eq!(raw["processedIds"][0], "3");
    }

    #[test]
    fn corrupt_file_is_moved_aside_with_original_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{ not json").unwrap();

        let backup = match FileBackend::new(&path).load().unwrap() {
            LoadOutcome::Corrupt { backup, .. } => backup,
            other => panic!("expected corrupt outcome, got {other:?}"),
        };
        assert!(backup.contains("state.json.corrupt-"));
        assert_eq!(fs::read(&backup).unwrap(), b"{ not json");
        assert!(!path.exists());
    }
}
