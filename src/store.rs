//! Persistence collaborator for saved reports ("projects") and the
//! per-user agent workforce. The generation client never touches it;
//! UI callers save and load through [`DocumentStore`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use log::{debug, warn};

use crate::error::Error;
use crate::reports::{Agent, Brief, Report};

/// A saved report snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord
{   pub id: String
  , pub user_id: String
  , pub name: String
  , pub brief: Brief
  , pub report: Report
  , /// Milliseconds since the epoch, newest sorts first
    pub timestamp: u64
}

impl ProjectRecord
{   pub fn from_report(
      id: impl Into<String>
    , user_id: impl Into<String>
    , name: impl Into<String>
    , brief: Brief
    , report: Report
    ) -> Self
    {   let timestamp = report.generated_at_ms;
        ProjectRecord
        {   id: id.into()
          , user_id: user_id.into()
          , name: name.into()
          , brief
          , report
          , timestamp
        }
    }
}

/// The single agents blob kept per user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkforceRecord
{   pub user_id: String
  , pub agents: Vec<Agent>
  , pub updated_at: u64
}

/// Key-value document store for projects and workforce records
pub trait DocumentStore: Send + Sync
{   fn save_project(&self, record: &ProjectRecord)
      -> impl Future<Output = Result<(), Error>> + Send;

    /// All projects of a user, newest first
    fn load_projects(&self, user_id: &str)
      -> impl Future<Output = Result<Vec<ProjectRecord>, Error>> + Send;

    /// Deleting an unknown id is not an error
    fn delete_project(&self, user_id: &str, id: &str)
      -> impl Future<Output = Result<(), Error>> + Send;

    fn save_workforce(&self, record: &WorkforceRecord)
      -> impl Future<Output = Result<(), Error>> + Send;

    fn load_workforce(&self, user_id: &str)
      -> impl Future<Output = Result<Option<WorkforceRecord>, Error>> + Send;
}

/// Merge two project lists: dedupe by id (`primary` wins),
/// newest timestamp first, ties broken by id
pub fn merge_projects(
  primary: Vec<ProjectRecord>
, secondary: Vec<ProjectRecord>
) -> Vec<ProjectRecord>
{   let mut by_id: HashMap<String, ProjectRecord> = HashMap::new();
    for record in secondary
    {   by_id.insert(record.id.clone(), record);
    }
    for record in primary
    {   by_id.insert(record.id.clone(), record);
    }
    let mut merged: Vec<ProjectRecord> = by_id.into_values().collect();
    sort_newest_first(&mut merged);
    merged
}

fn sort_newest_first(records: &mut [ProjectRecord])
{   records.sort_by(|a, b| {
      b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id))
    });
}

// ===== Local JSON store =====

/// One JSON file per document under a root directory:
/// `<root>/<user>/projects/<id>.json`, `<root>/<user>/workforce.json`
#[derive(Debug, Clone)]
pub struct LocalStore
{   root: PathBuf
}

/// Keys become path segments, so keep them plain
fn check_key(what: &str, key: &str) -> Result<(), Error>
{   let plain = !key.is_empty()
      && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if plain
    {   Ok(())
    } else
    {   Err(Error::Storage(format!("invalid {}: {:?}", what, key)))
    }
}

fn io_error(path: &Path, e: std::io::Error) -> Error
{   Error::Storage(format!("{}: {}", path.display(), e))
}

impl LocalStore
{   pub fn new(root: impl Into<PathBuf>) -> Self
    {   LocalStore { root: root.into() }
    }

    fn projects_dir(&self, user_id: &str) -> PathBuf
    {   self.root.join(user_id).join("projects")
    }

    fn workforce_path(&self, user_id: &str) -> PathBuf
    {   self.root.join(user_id).join("workforce.json")
    }

    async fn write_json<T: Serialize>(path: &Path, value: &T)
      -> Result<(), Error>
    {   if let Some(parent) = path.parent()
        {   tokio::fs::create_dir_all(parent).await
              .map_err(|e| io_error(parent, e))?;
        }
        let json = serde_json::to_vec_pretty(value)
          .map_err(|e| Error::Storage(e.to_string()))?;
        tokio::fs::write(path, json).await
          .map_err(|e| io_error(path, e))
    }
}

impl DocumentStore for LocalStore
{   async fn save_project(&self, record: &ProjectRecord)
      -> Result<(), Error>
    {   check_key("user id", &record.user_id)?;
        check_key("project id", &record.id)?;
        let path = self.projects_dir(&record.user_id)
          .join(format!("{}.json", record.id));
        debug!("Saving project {} to {}", record.id, path.display());
        Self::write_json(&path, record).await
    }

    async fn load_projects(&self, user_id: &str)
      -> Result<Vec<ProjectRecord>, Error>
    {   check_key("user id", user_id)?;
        let dir = self.projects_dir(user_id);
        let mut entries = match tokio::fs::read_dir(&dir).await
        {   Ok(entries) => entries
          , Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
              return Ok(vec![]);
            }
          , Err(e) => return Err(io_error(&dir, e))
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await
          .map_err(|e| io_error(&dir, e))?
        {   let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json")
            {   continue;
            }
            let raw = tokio::fs::read_to_string(&path).await
              .map_err(|e| io_error(&path, e))?;
            match serde_json::from_str::<ProjectRecord>(&raw)
            {   Ok(record) => records.push(record)
              , Err(e) => warn!("Skipping unreadable {}: {}", path.display(), e)
            }
        }
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn delete_project(&self, user_id: &str, id: &str)
      -> Result<(), Error>
    {   check_key("user id", user_id)?;
        check_key("project id", id)?;
        let path = self.projects_dir(user_id).join(format!("{}.json", id));
        match tokio::fs::remove_file(&path).await
        {   Ok(()) => Ok(())
          , Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(())
          , Err(e) => Err(io_error(&path, e))
        }
    }

    async fn save_workforce(&self, record: &WorkforceRecord)
      -> Result<(), Error>
    {   check_key("user id", &record.user_id)?;
        Self::write_json(&self.workforce_path(&record.user_id), record).await
    }

    async fn load_workforce(&self, user_id: &str)
      -> Result<Option<WorkforceRecord>, Error>
    {   check_key("user id", user_id)?;
        let path = self.workforce_path(user_id);
        let raw = match tokio::fs::read_to_string(&path).await
        {   Ok(raw) => raw
          , Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
              return Ok(None);
            }
          , Err(e) => return Err(io_error(&path, e))
        };
        serde_json::from_str(&raw)
          .map(Some)
          .map_err(|e| Error::Storage(format!("{}: {}", path.display(), e)))
    }
}

// ===== Remote store with local fallback =====

/// Dual-writes to a remote store and a local one.
/// Reads merge both; the remote copy wins on conflicts.
/// Only when both sides fail does an operation fail.
#[derive(Debug, Clone)]
pub struct FallbackStore<R, L>
{   remote: R
  , local: L
}

impl<R, L> FallbackStore<R, L>
{   pub fn new(remote: R, local: L) -> Self
    {   FallbackStore { remote, local }
    }
}

fn settle<T>(
  operation: &str
, remote: Result<T, Error>
, local: Result<T, Error>
) -> Result<(Option<T>, Option<T>), Error>
{   match (remote, local)
    {   (Err(remote_err), Err(local_err)) => {
          warn!(
            "{} failed on both stores: {} / {}",
            operation, remote_err, local_err
          );
          Err(remote_err)
        }
      , (remote, local) => {
          if let Err(e) = &remote
          {   warn!("{}: remote store unavailable, using local: {}", operation, e);
          }
          if let Err(e) = &local
          {   warn!("{}: local store failed: {}", operation, e);
          }
          Ok((remote.ok(), local.ok()))
        }
    }
}

impl<R: DocumentStore, L: DocumentStore> DocumentStore for FallbackStore<R, L>
{   async fn save_project(&self, record: &ProjectRecord)
      -> Result<(), Error>
    {   let local = self.local.save_project(record).await;
        let remote = self.remote.save_project(record).await;
        settle("save_project", remote, local).map(|_| ())
    }

    async fn load_projects(&self, user_id: &str)
      -> Result<Vec<ProjectRecord>, Error>
    {   let remote = self.remote.load_projects(user_id).await;
        let local = self.local.load_projects(user_id).await;
        let (remote, local) = settle("load_projects", remote, local)?;
        Ok(merge_projects(
          remote.unwrap_or_default(),
          local.unwrap_or_default()
        ))
    }

    async fn delete_project(&self, user_id: &str, id: &str)
      -> Result<(), Error>
    {   let local = self.local.delete_project(user_id, id).await;
        let remote = self.remote.delete_project(user_id, id).await;
        settle("delete_project", remote, local).map(|_| ())
    }

    async fn save_workforce(&self, record: &WorkforceRecord)
      -> Result<(), Error>
    {   let local = self.local.save_workforce(record).await;
        let remote = self.remote.save_workforce(record).await;
        settle("save_workforce", remote, local).map(|_| ())
    }

    /// Newer of the two copies
    async fn load_workforce(&self, user_id: &str)
      -> Result<Option<WorkforceRecord>, Error>
    {   let remote = self.remote.load_workforce(user_id).await;
        let local = self.local.load_workforce(user_id).await;
        let (remote, local) = settle("load_workforce", remote, local)?;
        Ok(match (remote.flatten(), local.flatten())
        {   (Some(r), Some(l)) if l.updated_at > r.updated_at => Some(l)
          , (Some(r), _) => Some(r)
          , (None, l) => l
        })
    }
}
