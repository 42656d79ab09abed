//! Server command — `issue-tracker serve`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use issue_tracker::config::{StoreBackend, TrackerConfig};

/// CLI flags layered over the file and environment configuration.
#[derive(Debug, Default)]
pub struct ServeOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub db_path: Option<PathBuf>,
    pub memory: bool,
    pub dev: bool,
}

impl ServeOverrides {
    fn apply(self, config: &mut TrackerConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(path) = self.db_path {
            config.store.path = path;
        }
        if self.memory {
            config.store.backend = StoreBackend::Memory;
        }
        if self.dev {
            config.server.dev_mode = true;
        }
    }
}

pub async fn cmd_serve(config_path: &Path, overrides: ServeOverrides, open: bool) -> Result<()> {
    let mut config = super::load_config(config_path)?;
    overrides.apply(&mut config);

    if open {
        let url = format!("http://localhost:{}", config.server.port);
        tokio::spawn(async move {
            // Small delay to let the server start binding
            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
            if let Err(e) = open::that(&url) {
                tracing::warn!(error = %e, "failed to open browser");
            }
        });
    }

    issue_tracker::tracker::server::start_server(config).await
}
