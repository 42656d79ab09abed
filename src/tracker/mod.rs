//! Issue tracker back-end.
//!
//! ## Overview
//!
//! A browser UI lists and creates issues through a small JSON API. Every
//! create request is sanitized, defaulted and validated before it reaches the
//! record store; the stored document is then re-read and returned.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────────┐
//! │  Client  │ ───────> │  server.rs  (axum Router, static UI, startup)    │
//! │  (React) │ <─────── │    └─ api.rs  (handlers, AppState, ApiError)     │
//! └──────────┘          │         │                                        │
//!                       │         │ validate::into_new_issue()             │
//!                       │         v                                        │
//!                       │  validate.rs  (field descriptors, sanitize)      │
//!                       │         │                                        │
//!                       │         │ IssueStore::insert_and_fetch()         │
//!                       │         v                                        │
//!                       │  store.rs  (IssueStore trait, MemoryStore)       │
//!                       │    └─ db.rs  (SQLite document store, DbHandle)   │
//!                       └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Supporting Modules
//!
//! | Module     | Responsibility                                        |
//! |------------|-------------------------------------------------------|
//! | `models`   | `Issue`, `NewIssue`, `IssueStatus`, `IssueList`       |
//! | `embedded` | Statically embeds the browser UI (`rust-embed`)       |

pub mod api;
pub mod db;
pub mod embedded;
pub mod models;
pub mod server;
pub mod store;
pub mod validate;
