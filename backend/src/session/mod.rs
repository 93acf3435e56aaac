//! Per-session file state and command handlers.
//!
//! A [`Session`] owns the tables of the files one user uploaded. Every user
//! interaction is a [`Command`] applied to one file; nothing is shared between
//! files or between sessions. The [`SessionStore`] keeps sessions for the HTTP
//! server and drops the ones idle longer than the configured TTL.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinError;
use uuid::Uuid;

use crate::api::logs::{log_info, log_success};
use crate::chart::{bar_chart, BarChart};
use crate::error::{PipelineError, PipelineResult};
use crate::export::export;
use crate::models::{Cell, ColumnType, ConversionRequest, ExportArtifact, FileFormat, OutputFormat, Table, UploadedFile};
use crate::parser::{Ingested, ParseInfo};
use crate::transform::{
    clean_table, load_file, project_selection, validate_selection, CleanOptions, CleanReport,
};

/// Rows shown in a preview.
pub const PREVIEW_ROWS: usize = 5;

// =============================================================================
// Commands
// =============================================================================

/// A user action on one file.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Deduplicate,
    Impute,
    /// `None` selects every column
    Project { columns: Option<Vec<String>> },
    Export { format: OutputFormat },
    Chart { column: Option<String> },
}

/// What a command produced.
#[derive(Debug, Clone)]
pub enum CommandOutput {
    Cleaned(CleanReport),
    Projected(Vec<String>),
    Artifact(ExportArtifact),
    Chart(BarChart),
}

// =============================================================================
// Files
// =============================================================================

/// One uploaded file and its current table.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub id: String,
    pub name: String,
    pub size: usize,
    pub format: FileFormat,
    pub info: ParseInfo,
    pub table: Table,
    /// Selected columns; `None` means all
    pub selection: Option<Vec<String>>,
    pub uploaded_at: DateTime<Utc>,
}

impl FileEntry {
    /// Current table restricted to the selection.
    pub fn projected(&self) -> PipelineResult<Table> {
        project_selection(&self.table, self.selection.as_deref())
    }

    pub fn summary(&self) -> FileSummary {
        let projected = self.projected().unwrap_or_else(|_| self.table.clone());
        let preview = projected.head(PREVIEW_ROWS);

        FileSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            size: self.size,
            size_label: format!("{:.2} KB", self.size as f64 / 1024.0),
            format: self.format,
            encoding: self.info.encoding.clone(),
            delimiter: self.info.delimiter.map(|d| d.to_string()),
            sheet: self.info.sheet.clone(),
            row_count: self.table.row_count(),
            columns: self
                .table
                .columns()
                .iter()
                .map(|c| ColumnInfo {
                    name: c.name().to_string(),
                    kind: c.kind(),
                    missing: c.missing_count(),
                })
                .collect(),
            selection: projected.column_names(),
            uploaded_at: self.uploaded_at,
            preview: TablePreview {
                columns: preview.column_names(),
                rows: preview.rows(),
            },
        }
    }
}

/// File metadata and head preview, as sent to the UI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub id: String,
    pub name: String,
    pub size: usize,
    pub size_label: String,
    pub format: FileFormat,
    pub encoding: Option<String>,
    pub delimiter: Option<String>,
    pub sheet: Option<String>,
    pub row_count: usize,
    pub columns: Vec<ColumnInfo>,
    pub selection: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
    pub preview: TablePreview,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnType,
    pub missing: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Result of one file of an upload batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub file: String,
    /// "ok" or "error"
    pub status: String,
    pub summary: Option<FileSummary>,
    pub error: Option<String>,
}

// =============================================================================
// Session
// =============================================================================

/// Files uploaded by one user, in upload order.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub last_used: DateTime<Utc>,
    files: Vec<FileEntry>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            last_used: Utc::now(),
            files: Vec::new(),
        }
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn summaries(&self) -> Vec<FileSummary> {
        self.files.iter().map(FileEntry::summary).collect()
    }

    /// Ingest one upload. On error the session is unchanged.
    pub fn add_upload(&mut self, file: UploadedFile) -> PipelineResult<String> {
        let Ingested { table, info } = load_file(&file)?;

        let id = Uuid::new_v4().to_string();
        self.files.push(FileEntry {
            id: id.clone(),
            name: file.name.clone(),
            size: file.size(),
            format: file.format,
            info,
            table,
            selection: None,
            uploaded_at: Utc::now(),
        });
        Ok(id)
    }

    /// Ingest uploads one after another; failures are reported per file.
    pub fn add_batch(&mut self, files: Vec<UploadedFile>) -> Vec<UploadOutcome> {
        files
            .into_iter()
            .map(|file| {
                let name = file.name.clone();
                match self.add_upload(file) {
                    Ok(id) => UploadOutcome {
                        file: name,
                        status: "ok".to_string(),
                        summary: self.get(&id).ok().map(FileEntry::summary),
                        error: None,
                    },
                    Err(e) => UploadOutcome {
                        file: name,
                        status: "error".to_string(),
                        summary: None,
                        error: Some(e.to_string()),
                    },
                }
            })
            .collect()
    }

    pub fn get(&self, file_id: &str) -> PipelineResult<&FileEntry> {
        self.files
            .iter()
            .find(|f| f.id == file_id)
            .ok_or_else(|| PipelineError::UnknownFile(file_id.to_string()))
    }

    fn get_mut(&mut self, file_id: &str) -> PipelineResult<&mut FileEntry> {
        self.files
            .iter_mut()
            .find(|f| f.id == file_id)
            .ok_or_else(|| PipelineError::UnknownFile(file_id.to_string()))
    }

    pub fn summary(&self, file_id: &str) -> PipelineResult<FileSummary> {
        self.get(file_id).map(FileEntry::summary)
    }

    pub fn remove(&mut self, file_id: &str) -> PipelineResult<()> {
        let index = self
            .files
            .iter()
            .position(|f| f.id == file_id)
            .ok_or_else(|| PipelineError::UnknownFile(file_id.to_string()))?;
        let entry = self.files.remove(index);
        log_info(format!("🗑️  Removed {}", entry.name));
        Ok(())
    }

    /// Apply a command to one file.
    pub fn execute(&mut self, file_id: &str, command: Command) -> PipelineResult<CommandOutput> {
        let entry = self.get_mut(file_id)?;

        match command {
            Command::Deduplicate => {
                log_info(format!("🧹 Removing duplicates from {}", entry.name));
                let options = CleanOptions {
                    deduplicate: true,
                    impute: false,
                };
                Ok(CommandOutput::Cleaned(clean_table(&mut entry.table, &options)))
            }
            Command::Impute => {
                log_info(format!("🧹 Filling missing values in {}", entry.name));
                let options = CleanOptions {
                    deduplicate: false,
                    impute: true,
                };
                Ok(CommandOutput::Cleaned(clean_table(&mut entry.table, &options)))
            }
            Command::Project { columns } => {
                if let Some(ref columns) = columns {
                    validate_selection(&entry.table, columns)?;
                }
                entry.selection = columns;
                let selected = entry.projected()?.column_names();
                log_info(format!("{}: {} column(s) selected", entry.name, selected.len()));
                Ok(CommandOutput::Projected(selected))
            }
            Command::Export { format } => {
                let table = entry.projected()?;
                let request = ConversionRequest::new(&entry.name, format);
                let artifact = export(&table, &request)?;
                log_success(format!(
                    "🔄 {} converted to {} ({} bytes)",
                    entry.name,
                    artifact.file_name,
                    artifact.bytes.len()
                ));
                Ok(CommandOutput::Artifact(artifact))
            }
            Command::Chart { column } => {
                let table = entry.projected()?;
                Ok(CommandOutput::Chart(bar_chart(&table, column.as_deref())?))
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Store
// =============================================================================

/// A session behind its own lock.
pub type SharedSession = Arc<Mutex<Session>>;

/// Sessions shared by the HTTP handlers.
///
/// The map lock is only held to look up, insert or drop entries. Work on a
/// session locks that session alone.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SharedSession>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Create a session, pruning idle ones first. Returns its id.
    ///
    /// Sessions busy with a request are never pruned.
    pub async fn create(&self) -> String {
        let mut sessions = self.sessions.write().await;

        let cutoff = Utc::now() - self.ttl;
        let before = sessions.len();
        sessions.retain(|_, s| match s.try_lock() {
            Ok(session) => session.last_used > cutoff,
            Err(_) => true,
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            log_info(format!("Pruned {} idle session(s)", pruned));
        }

        let session = Session::new();
        let id = session.id.clone();
        sessions.insert(id.clone(), Arc::new(Mutex::new(session)));
        id
    }

    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Run `f` against a session on the blocking pool, marking it as used.
    ///
    /// Requests on the same session queue on its lock; other sessions are not
    /// affected. `Ok(None)` if the session is unknown.
    pub async fn with_session<T, F>(&self, id: &str, f: F) -> Result<Option<T>, JoinError>
    where
        F: FnOnce(&mut Session) -> T + Send + 'static,
        T: Send + 'static,
    {
        let Some(session) = self.get(id).await else {
            return Ok(None);
        };

        let mut guard = session.lock_owned().await;
        guard.last_used = Utc::now();
        tokio::task::spawn_blocking(move || f(&mut *guard)).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(name: &str, content: &str) -> UploadedFile {
        UploadedFile::new(name, content.as_bytes().to_vec())
    }

    #[test]
    fn test_batch_upload_isolates_failures() {
        let mut session = Session::new();
        let outcomes = session.add_batch(vec![
            csv("a.csv", "x,y\n1,2\n"),
            csv("notes.txt", "hello"),
            csv("b.csv", "z\n3\n"),
        ]);

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].status, "ok");
        assert_eq!(outcomes[1].status, "error");
        assert!(outcomes[1].error.as_ref().unwrap().contains("Unsupported"));
        assert_eq!(outcomes[2].status, "ok");
        assert_eq!(session.files().len(), 2);
    }

    #[test]
    fn test_summary_preview_and_size() {
        let mut session = Session::new();
        let content = "n\n1\n2\n3\n4\n5\n6\n7\n";
        let id = session.add_upload(csv("n.csv", content)).unwrap();

        let summary = session.summary(&id).unwrap();
        assert_eq!(summary.row_count, 7);
        assert_eq!(summary.preview.rows.len(), PREVIEW_ROWS);
        assert_eq!(summary.size, content.len());
        assert_eq!(summary.size_label, "0.02 KB");
        assert_eq!(summary.selection, vec!["n".to_string()]);
        assert_eq!(summary.columns[0].kind, ColumnType::Numeric);
    }

    #[test]
    fn test_clean_commands_mutate_table() {
        let mut session = Session::new();
        let id = session
            .add_upload(csv("d.csv", "name,val\na,1\na,1\nb,\nc,3\n"))
            .unwrap();

        match session.execute(&id, Command::Deduplicate).unwrap() {
            CommandOutput::Cleaned(report) => assert_eq!(report.duplicates_removed, Some(1)),
            other => panic!("unexpected output: {:?}", other),
        }
        session.execute(&id, Command::Impute).unwrap();

        let table = &session.get(&id).unwrap().table;
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column("val").unwrap().cells()[1], Cell::Number(2.0));
    }

    #[test]
    fn test_project_then_export() {
        let mut session = Session::new();
        let id = session.add_upload(csv("data.csv", "a,b,c\n1,2,3\n")).unwrap();

        session
            .execute(&id, Command::Project { columns: Some(vec!["c".into(), "a".into()]) })
            .unwrap();

        match session.execute(&id, Command::Export { format: OutputFormat::Csv }).unwrap() {
            CommandOutput::Artifact(artifact) => {
                assert_eq!(artifact.file_name, "data.csv");
                assert_eq!(artifact.bytes, b"c,a\n3,1\n".to_vec());
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_bad_projection_keeps_previous_selection() {
        let mut session = Session::new();
        let id = session.add_upload(csv("data.csv", "a,b\n1,2\n")).unwrap();
        session
            .execute(&id, Command::Project { columns: Some(vec!["b".into()]) })
            .unwrap();

        let err = session
            .execute(&id, Command::Project { columns: Some(vec!["b".into(), "zz".into()]) })
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownColumn(_)));
        assert_eq!(session.get(&id).unwrap().selection, Some(vec!["b".to_string()]));
    }

    #[test]
    fn test_empty_selection_then_select_all() {
        let mut session = Session::new();
        let id = session.add_upload(csv("data.csv", "a,b\n1,2\n")).unwrap();

        match session.execute(&id, Command::Project { columns: Some(Vec::new()) }).unwrap() {
            CommandOutput::Projected(selected) => assert!(selected.is_empty()),
            other => panic!("unexpected output: {:?}", other),
        }
        let summary = session.summary(&id).unwrap();
        assert!(summary.selection.is_empty());
        assert!(summary.preview.columns.is_empty());
        assert_eq!(summary.columns.len(), 2);

        session.execute(&id, Command::Project { columns: None }).unwrap();
        assert_eq!(session.summary(&id).unwrap().selection, vec!["a", "b"]);
    }

    #[test]
    fn test_chart_uses_projection() {
        let mut session = Session::new();
        let id = session
            .add_upload(csv("data.csv", "a,b,c,d\n1,2,3,4\n5,6,7,8\n"))
            .unwrap();

        match session.execute(&id, Command::Chart { column: None }).unwrap() {
            CommandOutput::Chart(chart) => assert_eq!(chart.column, "c"),
            other => panic!("unexpected output: {:?}", other),
        }

        session
            .execute(&id, Command::Project { columns: Some(vec!["a".into(), "b".into(), "d".into()]) })
            .unwrap();
        match session.execute(&id, Command::Chart { column: None }).unwrap() {
            CommandOutput::Chart(chart) => assert_eq!(chart.column, "d"),
            other => panic!("unexpected output: {:?}", other),
        }

        session
            .execute(&id, Command::Project { columns: Some(vec!["a".into()]) })
            .unwrap();
        assert!(matches!(
            session.execute(&id, Command::Chart { column: None }),
            Err(PipelineError::Chart(_))
        ));
    }

    #[test]
    fn test_unknown_and_removed_files() {
        let mut session = Session::new();
        assert!(matches!(
            session.execute("nope", Command::Impute),
            Err(PipelineError::UnknownFile(_))
        ));

        let id = session.add_upload(csv("a.csv", "x\n1\n")).unwrap();
        session.remove(&id).unwrap();
        assert!(session.files().is_empty());
        assert!(session.remove(&id).is_err());
    }

    #[tokio::test]
    async fn test_store_isolates_sessions() {
        let store = SessionStore::new(Duration::minutes(60));
        let first = store.create().await;
        let second = store.create().await;
        assert_ne!(first, second);
        assert_eq!(store.len().await, 2);

        store
            .with_session(&first, |s| s.add_upload(csv("a.csv", "x\n1\n")))
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        let other_files = store.with_session(&second, |s| s.files().len()).await.unwrap();
        assert_eq!(other_files, Some(0));
        assert!(store.with_session("missing", |_| ()).await.unwrap().is_none());

        assert!(store.remove(&first).await);
        assert!(!store.remove(&first).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_busy_session_does_not_block_others() {
        let store = SessionStore::new(Duration::minutes(60));
        let busy_id = store.create().await;
        let other_id = store.create().await;

        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let busy = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .with_session(&busy_id, move |s| {
                        let _ = started_tx.send(());
                        release_rx.recv().ok();
                        s.files().len()
                    })
                    .await
            })
        };
        started_rx.await.unwrap();

        // The busy session is mid-request; every other operation still goes through
        let added = store
            .with_session(&other_id, |s| {
                s.add_upload(csv("a.csv", "x\n1\n")).map(|_| s.files().len())
            })
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(added, 1);
        store.create().await;
        assert_eq!(store.len().await, 3);

        release_tx.send(()).unwrap();
        assert_eq!(busy.await.unwrap().unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_store_prunes_idle_sessions() {
        let store = SessionStore::new(Duration::zero());
        store.create().await;
        store.create().await;
        // Each create prunes everything older than "now"
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_prune_skips_locked_sessions() {
        let store = SessionStore::new(Duration::zero());
        let id = store.create().await;
        let guard = store.get(&id).await.unwrap().lock_owned().await;

        store.create().await;
        assert!(store.get(&id).await.is_some());
        assert_eq!(store.len().await, 2);

        drop(guard);
        store.create().await;
        assert!(store.get(&id).await.is_none());
        assert_eq!(store.len().await, 1);
    }
}
