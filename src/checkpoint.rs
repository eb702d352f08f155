//! Crash-safe progress tracking
//!
//! A single JSON file is the source of truth for resume: the set of completed
//! work ids plus one in-progress `<work>-<imagegroup>` pointer. It is written
//! after each volume completes or fails and read once at batch start. Saves
//! are atomic (write to a temp file, then rename) so a concurrent reader
//! never observes a partial file. Single-flight by design: one batch worker,
//! one checkpoint file.

use crate::error::CheckpointError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted progress record
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// Works fully archived and published
    pub completed_works: Vec<String>,
    /// `<work_local_id>-<imagegroup>` of the last attempted volume, if any
    pub in_progress_volume: Option<String>,
}

/// Loads, updates and atomically persists the checkpoint file
#[derive(Debug)]
pub struct CheckpointManager {
    path: PathBuf,
    state: Checkpoint,
}

impl CheckpointManager {
    /// Read the persisted checkpoint; a missing file means a fresh start.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| CheckpointError::Corrupt {
                    path: path.display().to_string(),
                    source: Box::new(e),
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Checkpoint::default(),
            Err(e) => {
                return Err(CheckpointError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };
        Ok(Self { path, state })
    }

    pub fn is_completed(&self, work_local_id: &str) -> bool {
        self.state
            .completed_works
            .iter()
            .any(|w| w == work_local_id)
    }

    /// Imagegroup to resume from, when `work_local_id` is the checkpointed
    /// in-progress work.
    pub fn resume_point(&self, work_local_id: &str) -> Option<&str> {
        let pointer = self.state.in_progress_volume.as_deref()?;
        let (work, imagegroup) = pointer.split_once('-')?;
        if work == work_local_id {
            Some(imagegroup)
        } else {
            None
        }
    }

    /// Record the volume currently being attempted, then persist.
    pub fn record_volume(
        &mut self,
        work_local_id: &str,
        imagegroup: &str,
    ) -> Result<(), CheckpointError> {
        self.state.in_progress_volume = Some(format!("{}-{}", work_local_id, imagegroup));
        self.save()
    }

    /// Record a fully completed work, clearing its in-progress pointer,
    /// then persist.
    pub fn record_work_done(&mut self, work_local_id: &str) -> Result<(), CheckpointError> {
        if !self.is_completed(work_local_id) {
            self.state.completed_works.push(work_local_id.to_string());
        }
        if self.resume_point(work_local_id).is_some() {
            self.state.in_progress_volume = None;
        }
        self.save()
    }

    pub fn state(&self) -> &Checkpoint {
        &self.state
    }

    /// Write-then-rename so a crash mid-save leaves the previous checkpoint
    /// intact.
    fn save(&self) -> Result<(), CheckpointError> {
        let io_err = |source| CheckpointError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let content = serde_json::to_string_pretty(&self.state).map_err(|e| {
            CheckpointError::Corrupt {
                path: self.path.display().to_string(),
                source: Box::new(e),
            }
        })?;

        let tmp_path = temp_path(&self.path);
        fs::write(&tmp_path, content).map_err(io_err)?;
        fs::rename(&tmp_path, &self.path).map_err(io_err)?;

        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_fresh_start() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::load(dir.path().join("checkpoint.json")).unwrap();
        assert!(manager.state().completed_works.is_empty());
        assert!(manager.state().in_progress_volume.is_none());
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        let mut manager = CheckpointManager::load(&path).unwrap();
        manager.record_volume("W22084", "I0886").unwrap();
        manager.record_work_done("W22084").unwrap();

        let reloaded = CheckpointManager::load(&path).unwrap();
        assert!(reloaded.is_completed("W22084"));
        assert!(reloaded.state().in_progress_volume.is_none());
    }

    #[test]
    fn test_resume_point_matches_work_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = CheckpointManager::load(dir.path().join("cp.json")).unwrap();
        manager.record_volume("W22084", "I0886").unwrap();

        assert_eq!(manager.resume_point("W22084"), Some("I0886"));
        assert_eq!(manager.resume_point("W99999"), None);
    }

    #[test]
    fn test_record_work_done_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = CheckpointManager::load(dir.path().join("cp.json")).unwrap();
        manager.record_work_done("W22084").unwrap();
        manager.record_work_done("W22084").unwrap();
        assert_eq!(manager.state().completed_works.len(), 1);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        let mut manager = CheckpointManager::load(&path).unwrap();
        manager.record_volume("W1", "I0001").unwrap();

        assert!(path.is_file());
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_checkpoint_json_shape() {
        let checkpoint = Checkpoint {
            completed_works: vec!["W1".to_string()],
            in_progress_volume: Some("W2-I0001".to_string()),
        };
        let json = serde_json::to_value(&checkpoint).unwrap();
        assert!(json.get("completedWorks").is_some());
        assert!(json.get("inProgressVolume").is_some());
    }
}
