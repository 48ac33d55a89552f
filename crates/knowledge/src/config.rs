//! Knowledge base configuration management.

use crate::types::KnowledgeBaseConfig;
use docent_core::{config::STATE_DIR, AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Load knowledge base configuration.
///
/// Loads from `.docent/knowledge/<base>/config.yaml` if it exists,
/// otherwise returns a default config with the provided base name.
pub fn load_config(workspace: &Path, base_name: &str) -> AppResult<KnowledgeBaseConfig> {
    let config_path = get_config_path(workspace, base_name);

    if config_path.exists() {
        let content = fs::read_to_string(&config_path).map_err(|e| {
            AppError::Knowledge(format!("Failed to read config at {:?}: {}", config_path, e))
        })?;

        let mut config: KnowledgeBaseConfig = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Knowledge(format!("Failed to parse config at {:?}: {}", config_path, e))
        })?;

        config.name = base_name.to_string();
        validate_config(&config)?;

        tracing::debug!("Loaded knowledge base config for '{}'", base_name);
        Ok(config)
    } else {
        tracing::debug!(
            "Using default knowledge base config for '{}' (no config file found)",
            base_name
        );
        Ok(KnowledgeBaseConfig {
            name: base_name.to_string(),
            ..Default::default()
        })
    }
}

/// Save knowledge base configuration.
pub fn save_config(workspace: &Path, config: &KnowledgeBaseConfig) -> AppResult<()> {
    validate_config(config)?;
    let config_path = get_config_path(workspace, &config.name);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Knowledge(format!("Failed to create config directory: {}", e))
        })?;
    }

    let yaml = serde_yaml::to_string(config)
        .map_err(|e| AppError::Knowledge(format!("Failed to serialize config: {}", e)))?;

    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Knowledge(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved knowledge base config for '{}'", config.name);
    Ok(())
}

fn validate_config(config: &KnowledgeBaseConfig) -> AppResult<()> {
    if config.chunk_size == 0 || config.chunk_overlap >= config.chunk_size {
        return Err(AppError::Config(format!(
            "Invalid chunking for base '{}': chunk_overlap ({}) must be smaller than chunk_size ({})",
            config.name, config.chunk_overlap, config.chunk_size
        )));
    }
    if config.embedding_dim == 0 {
        return Err(AppError::Config(format!(
            "Invalid embedding_dim for base '{}': must be positive",
            config.name
        )));
    }
    Ok(())
}

/// Get the path to a base's config file.
pub fn get_config_path(workspace: &Path, base_name: &str) -> PathBuf {
    get_base_dir(workspace, base_name).join("config.yaml")
}

/// Get the base directory for a knowledge base.
pub fn get_base_dir(workspace: &Path, base_name: &str) -> PathBuf {
    workspace.join(STATE_DIR).join("knowledge").join(base_name)
}

/// Get the directory holding the index snapshot for a base.
pub fn get_index_dir(workspace: &Path, base_name: &str) -> PathBuf {
    get_base_dir(workspace, base_name).join("index")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path(), "test-base").unwrap();

        assert_eq!(config.name, "test-base");
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.chunk_size, 800);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let config = KnowledgeBaseConfig {
            name: "my-base".to_string(),
            chunk_size: 1024,
            ..Default::default()
        };

        save_config(temp.path(), &config).unwrap();

        let loaded = load_config(temp.path(), "my-base").unwrap();
        assert_eq!(loaded.name, "my-base");
        assert_eq!(loaded.chunk_size, 1024);
        assert!(get_config_path(temp.path(), "my-base").ends_with(".docent/knowledge/my-base/config.yaml"));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let temp = TempDir::new().unwrap();
        let config = KnowledgeBaseConfig {
            name: "bad".to_string(),
            chunk_size: 100,
            chunk_overlap: 100,
            ..Default::default()
        };

        assert!(matches!(
            save_config(temp.path(), &config),
            Err(AppError::Config(_))
        ));
    }
}
