//! CLI command implementations.
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `serve`  | `Serve`          |
//! | `init`   | `Init`           |
//! | `config` | `Config`         |

pub mod config;
pub mod init;
pub mod serve;

pub use config::cmd_config;
pub use init::cmd_init;
pub use serve::{ServeOverrides, cmd_serve};

use std::path::Path;

use anyhow::Result;
use issue_tracker::config::TrackerConfig;

/// Load the file layer and apply environment overrides.
pub fn load_config(path: &Path) -> Result<TrackerConfig> {
    let mut config = TrackerConfig::load_or_default(path)?;
    config.apply_process_env()?;
    Ok(config)
}
