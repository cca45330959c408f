//! JSON file store for tasks
//!
//! Each task lives in `<dir>/<id>.json`. Writes go through a temporary file
//! and a rename so a task file is always either the old or the new version.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use super::Task;
use crate::{Error, Result};

/// Directory-backed task storage
#[derive(Debug, Clone)]
pub struct TaskStore {
    dir: PathBuf,
}

impl TaskStore {
    /// Open a store rooted at `dir`, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Default store location: `~/.local/share/quire/tasks` on Linux
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("quire").join("tasks"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Load one task
    pub fn load(&self, id: &Uuid) -> Result<Task> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(Error::TaskNotFound(*id));
        }
        let contents = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Persist a task, replacing any previous version
    pub fn save(&self, task: &Task) -> Result<()> {
        let path = self.path_for(&task.id);
        let tmp = self.dir.join(format!(".{}.json.tmp", task.id));
        let contents = serde_json::to_string_pretty(task)?;
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;
        debug!(task = %task.id, path = %path.display(), "Saved task");
        Ok(())
    }

    /// Remove a task; missing tasks are an error
    pub fn delete(&self, id: &Uuid) -> Result<()> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(Error::TaskNotFound(*id));
        }
        fs::remove_file(&path)?;
        debug!(task = %id, "Deleted task");
        Ok(())
    }

    /// All stored tasks, most recently updated first
    ///
    /// Unreadable files are skipped with a warning.
    pub fn list(&self) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(Error::from)
                .and_then(|s| serde_json::from_str::<Task>(&s).map_err(Error::from));
            match parsed {
                Ok(task) => tasks.push(task),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable task file"),
            }
        }
        tasks.sort_by(|a, b| b.updated.cmp(&a.updated));
        Ok(tasks)
    }

    /// Find a task by a unique prefix of its id
    pub fn find(&self, prefix: &str) -> Result<Task> {
        if let Ok(id) = Uuid::parse_str(prefix) {
            return self.load(&id);
        }
        let mut matches: Vec<Task> = self
            .list()?
            .into_iter()
            .filter(|t| t.id.to_string().starts_with(prefix))
            .collect();
        match matches.len() {
            0 => Err(Error::Other(format!("No task matches '{}'", prefix))),
            1 => Ok(matches.remove(0)),
            n => Err(Error::Other(format!(
                "'{}' is ambiguous: {} tasks match",
                prefix, n
            ))),
        }
    }
}
