//! Configuration management for the patchsync CLI.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use sync_client::{SyncConfig, DEFAULT_IGNORE_FILE};
use sync_core::METADATA_DIR;
use sync_types::PeerId;

const CONFIG_FILE: &str = "config.toml";

fn default_ignore_file() -> String {
    DEFAULT_IGNORE_FILE.to_string()
}

/// Project configuration stored in `<root>/.patchsync/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name shared by all peers.
    pub project: String,
    /// This peer's identity.
    pub author: String,
    /// Recipient of conflict and success notifications.
    pub admin: String,
    /// Ignore file, relative to the root.
    #[serde(default = "default_ignore_file")]
    pub ignore_file: String,
    /// Upper bound for one inbound apply, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_timeout_secs: Option<u64>,
}

impl ProjectConfig {
    /// Create a new project configuration.
    pub fn new(project: &str, author: &str, admin: &str) -> Self {
        Self {
            project: project.to_string(),
            author: author.to_string(),
            admin: admin.to_string(),
            ignore_file: default_ignore_file(),
            apply_timeout_secs: None,
        }
    }

    /// Metadata directory under `root`.
    pub fn metadata_dir(root: &Path) -> PathBuf {
        root.join(METADATA_DIR)
    }

    /// Location of the config file under `root`.
    pub fn path(root: &Path) -> PathBuf {
        Self::metadata_dir(root).join(CONFIG_FILE)
    }

    /// Load the configuration of the working copy at `root`.
    pub async fn load(root: &Path) -> Result<Self> {
        let path = Self::path(root);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .context("Project not initialized. Run 'patchsync init' first.")?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Save the configuration; the metadata directory must exist.
    pub async fn save(&self, root: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to encode configuration")?;
        tokio::fs::write(Self::path(root), contents)
            .await
            .context("Failed to save configuration")?;
        Ok(())
    }

    /// Check that both identities are usable.
    pub fn validate(&self) -> Result<()> {
        if self.project.trim().is_empty() {
            anyhow::bail!("project name must not be empty");
        }
        PeerId::new(self.author.as_str()).context("invalid author")?;
        PeerId::new(self.admin.as_str()).context("invalid admin")?;
        Ok(())
    }

    /// Build the runtime configuration for the working copy at `root`.
    pub fn to_sync_config(&self, root: &Path) -> Result<SyncConfig> {
        let author = PeerId::new(self.author.as_str()).context("invalid author")?;
        let admin = PeerId::new(self.admin.as_str()).context("invalid admin")?;

        let mut config = SyncConfig::new(self.project.as_str(), author, admin, root)
            .with_ignore_file(&self.ignore_file);
        if let Some(secs) = self.apply_timeout_secs {
            config = config.with_apply_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn config_roundtrip() {
        let dir = tempdir().unwrap();
        tokio::fs::create_dir(ProjectConfig::metadata_dir(dir.path()))
            .await
            .unwrap();

        let mut config = ProjectConfig::new("baboon", "alice@example.org", "admin@example.org");
        config.apply_timeout_secs = Some(30);
        config.save(dir.path()).await.unwrap();

        let loaded = ProjectConfig::load(dir.path()).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn load_without_init_fails() {
        let dir = tempdir().unwrap();
        let err = ProjectConfig::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("patchsync init"));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let toml_str = r#"
project = "baboon"
author = "alice"
admin = "root"
"#;
        let config: ProjectConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ignore_file, ".gitignore");
        assert_eq!(config.apply_timeout_secs, None);
    }

    #[test]
    fn sync_config_from_project_config() {
        let mut config = ProjectConfig::new("baboon", "alice", "root");
        config.ignore_file = ".syncignore".to_string();
        config.apply_timeout_secs = Some(5);

        let sync = config.to_sync_config(Path::new("/work")).unwrap();
        assert_eq!(sync.project, "baboon");
        assert_eq!(sync.local_author.as_str(), "alice");
        assert_eq!(sync.ignore_path(), PathBuf::from("/work/.syncignore"));
        assert_eq!(sync.apply_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn blank_identity_is_rejected() {
        let config = ProjectConfig::new("baboon", "  ", "root");
        assert!(config.validate().is_err());
        assert!(config.to_sync_config(Path::new("/work")).is_err());
    }
}
