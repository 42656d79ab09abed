use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};

use super::models::{Issue, IssueId, NewIssue};
use super::store::IssueStore;

/// Async-safe handle to the issue database.
///
/// Wraps `IssueDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, so synchronous SQLite I/O never
/// ties up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<IssueDb>>,
}

impl DbHandle {
    pub fn new(db: IssueDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&IssueDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

#[async_trait]
impl IssueStore for DbHandle {
    async fn list(&self) -> Result<Vec<Issue>> {
        self.call(|db| db.list_issues()).await
    }

    async fn insert(&self, issue: NewIssue) -> Result<IssueId> {
        self.call(move |db| db.insert_issue(&issue)).await
    }

    async fn find(&self, id: &IssueId) -> Result<Option<Issue>> {
        let id = id.clone();
        self.call(move |db| db.get_issue(&id)).await
    }
}

/// SQLite-backed document store. Each issue is one JSON document keyed by
/// its generated id; `seq` preserves insertion order.
pub struct IssueDb {
    conn: Connection,
}

impl IssueDb {
    /// Open (or create) a SQLite database at the given path.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database at {}", path.display()))?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS issues (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    id TEXT NOT NULL UNIQUE,
                    document TEXT NOT NULL
                );
                ",
            )
            .context("Failed to create issues collection")?;
        Ok(())
    }

    pub fn insert_issue(&self, issue: &NewIssue) -> Result<IssueId> {
        let id = IssueId::generate();
        let document = serde_json::to_string(issue).context("Failed to encode issue document")?;
        self.conn
            .execute(
                "INSERT INTO issues (id, document) VALUES (?1, ?2)",
                params![id.as_str(), document],
            )
            .context("Failed to insert issue")?;
        Ok(id)
    }

    pub fn list_issues(&self) -> Result<Vec<Issue>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, document FROM issues ORDER BY seq")
            .context("Failed to prepare list_issues")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .context("Failed to query issues")?;
        let mut issues = Vec::new();
        for row in rows {
            let (id, document) = row.context("Failed to read issue row")?;
            issues.push(decode_issue(id, &document)?);
        }
        Ok(issues)
    }

    pub fn get_issue(&self, id: &IssueId) -> Result<Option<Issue>> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM issues WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query issue")?;
        document
            .map(|doc| decode_issue(id.to_string(), &doc))
            .transpose()
    }

    pub fn count_issues(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))
            .context("Failed to count issues")?;
        Ok(count as usize)
    }
}

fn decode_issue(id: String, document: &str) -> Result<Issue> {
    let new: NewIssue = serde_json::from_str(document)
        .with_context(|| format!("Corrupt issue document {}", id))?;
    Ok(Issue::from_new(IssueId::from(id), new))
}
