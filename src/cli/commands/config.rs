//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command against the file at `config_path`.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: &PathBuf) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                Output::warning(&format!(
                    "Config already exists at {}",
                    config_path.display()
                ));
                Output::info("Use --force to overwrite it.");
                return Ok(());
            }
            settings.save_to(config_path)?;
            Output::success(&format!("Wrote config to {}", config_path.display()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_to_chosen_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("birding.toml");

        let mut settings = Settings::default();
        settings.service.user_id = "birder".to_string();
        run_config(&ConfigAction::Init { force: false }, settings, &path).unwrap();
        assert_eq!(Settings::load_from(Some(&path)).unwrap().service.user_id, "birder");

        // Without --force an existing file is left alone.
        run_config(&ConfigAction::Init { force: false }, Settings::default(), &path).unwrap();
        assert_eq!(Settings::load_from(Some(&path)).unwrap().service.user_id, "birder");

        run_config(&ConfigAction::Init { force: true }, Settings::default(), &path).unwrap();
        assert_eq!(Settings::load_from(Some(&path)).unwrap().service.user_id, "test");
    }
}
