//! Database initialization command — `issue-tracker init`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use issue_tracker::tracker::db::IssueDb;

pub fn cmd_init(config_path: &Path, db_path: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let db_path = db_path.unwrap_or(config.store.path);

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    let db = IssueDb::new(&db_path)?;
    println!(
        "Issue database initialized at {} ({} issues)",
        db_path.display(),
        db.count_issues()?
    );
    Ok(())
}
