use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lifecycle of one counting run: `pending -> processing -> done | error`.
/// Both `done` and `error` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Done,
    Error,
}

/// Persisted record of one counting run. Created by the caller before the
/// run; mutated only through the transition methods below, which enforce the
/// three legal transitions. `finished_at` is stamped on both terminal paths
/// and never before.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub owner: String,
    pub filename: String,
    pub status: TaskStatus,
    pub car_count: Option<u64>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        owner: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            filename: filename.into(),
            status: TaskStatus::Pending,
            car_count: None,
            error_message: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// `pending -> processing`. At most once: a task that already left
    /// `pending` (including terminal states) cannot be dispatched again.
    pub fn start(&mut self) -> Result<()> {
        if self.status != TaskStatus::Pending {
            return Err(Error::InvalidTransition {
                from: self.status,
                to: TaskStatus::Processing,
            });
        }
        self.status = TaskStatus::Processing;
        Ok(())
    }

    /// `processing -> done`, recording the final count.
    pub fn complete(&mut self, car_count: u64) -> Result<()> {
        if self.status != TaskStatus::Processing {
            return Err(Error::InvalidTransition {
                from: self.status,
                to: TaskStatus::Done,
            });
        }
        self.status = TaskStatus::Done;
        self.car_count = Some(car_count);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// `processing -> error`, recording a human-readable message.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        if self.status != TaskStatus::Processing {
            return Err(Error::InvalidTransition {
                from: self.status,
                to: TaskStatus::Error,
            });
        }
        self.status = TaskStatus::Error;
        self.error_message = Some(message.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Done | TaskStatus::Error)
    }
}

/// Persistence seam for task records. Single writer per task; each `save`
/// must be atomic so observers never read a half-written transition.
pub trait TaskStore {
    fn save(&mut self, task: &Task) -> Result<()>;

    fn load(&self, id: &str) -> Result<Option<Task>>;
}

/// One JSON file per task, written to a temp file and renamed into place so
/// every status transition lands atomically.
pub struct JsonTaskStore {
    dir: PathBuf,
}

impl JsonTaskStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| Error::Storage(format!("cannot create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn task_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl TaskStore for JsonTaskStore {
    fn save(&mut self, task: &Task) -> Result<()> {
        let body = serde_json::to_vec_pretty(task)
            .map_err(|e| Error::Storage(format!("cannot serialize task {}: {e}", task.id)))?;

        let tmp = self.dir.join(format!("{}.json.tmp", task.id));
        let path = self.task_path(&task.id);
        fs::write(&tmp, body)
            .map_err(|e| Error::Storage(format!("cannot write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .map_err(|e| Error::Storage(format!("cannot rename into {}: {e}", path.display())))?;
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<Task>> {
        let path = self.task_path(id);
        let body = match fs::read_to_string(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };
        let task = serde_json::from_str(&body)
            .map_err(|e| Error::Storage(format!("corrupt task record {}: {e}", path.display())))?;
        Ok(Some(task))
    }
}

/// Map-backed store for tests and the demo binary.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: HashMap<String, Task>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for MemoryTaskStore {
    fn save(&mut self, task: &Task) -> Result<()> {
        self.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.tasks.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut task = Task::new("t1", "user-1", "traffic.mp4");
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.finished_at.is_none());

        task.start().unwrap();
        assert_eq!(task.status, TaskStatus::Processing);
        assert!(task.finished_at.is_none());

        task.complete(12).unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.car_count, Some(12));
        assert!(task.finished_at.is_some());
    }

    #[test]
    fn test_failure_path_records_message_and_finished_at() {
        let mut task = Task::new("t1", "user-1", "traffic.mp4");
        task.start().unwrap();
        task.fail("cannot open input").unwrap();

        assert_eq!(task.status, TaskStatus::Error);
        assert_eq!(task.error_message.as_deref(), Some("cannot open input"));
        assert!(task.car_count.is_none());
        assert!(task.finished_at.is_some());
    }

    #[test]
    fn test_start_is_at_most_once() {
        let mut task = Task::new("t1", "user-1", "traffic.mp4");
        task.start().unwrap();

        assert!(matches!(
            task.start(),
            Err(Error::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_terminal_tasks_cannot_restart() {
        let mut task = Task::new("t1", "user-1", "traffic.mp4");
        task.start().unwrap();
        task.complete(3).unwrap();

        assert!(task.is_terminal());
        assert!(task.start().is_err());
        assert!(task.fail("nope").is_err());
        assert!(task.complete(4).is_err());
    }

    #[test]
    fn test_complete_from_pending_is_rejected() {
        let mut task = Task::new("t1", "user-1", "traffic.mp4");

        assert!(task.complete(1).is_err());
        assert!(task.fail("nope").is_err());
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let task = Task::new("t1", "user-1", "traffic.mp4");
        let json = serde_json::to_string(&task).unwrap();

        assert!(json.contains(r#""status":"pending""#));
    }

    #[test]
    fn test_json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonTaskStore::open(dir.path()).unwrap();

        let mut task = Task::new("abc", "user-1", "traffic.mp4");
        store.save(&task).unwrap();
        task.start().unwrap();
        store.save(&task).unwrap();

        let loaded = store.load("abc").unwrap().unwrap();
        assert_eq!(loaded.status, TaskStatus::Processing);
        assert!(store.load("missing").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryTaskStore::new();
        let task = Task::new("abc", "user-1", "traffic.mp4");
        store.save(&task).unwrap();

        assert!(store.load("abc").unwrap().is_some());
        assert!(store.load("other").unwrap().is_none());
    }
}
