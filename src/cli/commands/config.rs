//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, config_path: Option<&str>, settings: Settings) -> Result<()> {
    let path = config_path
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", path.display());
        }

        ConfigAction::Init { force } => {
            if write_default_config(&path, *force)? {
                Output::success(&format!("Wrote default config to {}", path.display()));
            } else {
                Output::warning(&format!(
                    "Config already exists at {}. Use --force to overwrite it.",
                    path.display()
                ));
            }
        }
    }

    Ok(())
}

/// Write default settings to `path`. Returns false when a file exists and `force` is off.
fn write_default_config(path: &PathBuf, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    Settings::default().save_to(path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_does_not_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert!(write_default_config(&path, false).unwrap());
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.vector_store.collection, "pdf_summarizer_memory");

        std::fs::write(&path, "[rag]\ntop_k = 7\n").unwrap();
        assert!(!write_default_config(&path, false).unwrap());
        assert_eq!(Settings::load_from(Some(&path)).unwrap().rag.top_k, 7);

        assert!(write_default_config(&path, true).unwrap());
        assert_eq!(Settings::load_from(Some(&path)).unwrap().rag.top_k, 3);
    }
}
