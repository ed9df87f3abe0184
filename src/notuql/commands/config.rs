use crate::commands::{CmdMessage, CmdResult, NotuqlPaths};
use crate::config::NotuqlConfig;
use crate::error::Result;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

pub fn run(paths: &NotuqlPaths, action: ConfigAction) -> Result<CmdResult> {
    let dir = &paths.config_dir;
    match action {
        ConfigAction::ShowAll => {
            let config = NotuqlConfig::load(dir)?;
            Ok(CmdResult::default().with_config(config))
        }
        ConfigAction::ShowKey(key) => {
            let config = NotuqlConfig::load(dir)?;
            let mut result = CmdResult::default();
            match config.get(&key) {
                Some(val) => result.add_message(CmdMessage::info(val)),
                None => {
                    result.add_message(CmdMessage::error(format!("Unknown config key: {}", key)))
                }
            }
            Ok(result)
        }
        ConfigAction::Set(key, value) => {
            let mut config = NotuqlConfig::load(dir)?;
            if let Err(e) = config.set(&key, &value) {
                let mut res = CmdResult::default();
                res.add_message(CmdMessage::error(e.to_string()));
                return Ok(res);
            }
            config.save(dir)?;
            let display_val = config.get(&key).unwrap_or_else(|| value.clone());
            let mut result = CmdResult::default().with_config(config);
            result.add_message(CmdMessage::success(format!(
                "{} set to {}",
                key, display_val
            )));
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::config::OutputFormat;

    fn paths(dir: &tempfile::TempDir) -> NotuqlPaths {
        NotuqlPaths {
            config_dir: dir.path().join("notuql"),
        }
    }

    #[test]
    fn show_all_returns_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(&paths(&dir), ConfigAction::ShowAll).unwrap();
        assert_eq!(result.config, Some(NotuqlConfig::default()));
    }

    #[test]
    fn set_persists_value() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(&dir);

        let result = run(
            &paths,
            ConfigAction::Set("format".into(), "text".into()),
        )
        .unwrap();
        assert_eq!(result.messages[0].level, MessageLevel::Success);
        assert_eq!(result.messages[0].content, "format set to text");

        let loaded = NotuqlConfig::load(&paths.config_dir).unwrap();
        assert_eq!(loaded.format, OutputFormat::Text);

        let shown = run(&paths, ConfigAction::ShowKey("format".into())).unwrap();
        assert_eq!(shown.messages[0].content, "text");
    }

    #[test]
    fn invalid_value_is_reported_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(&dir);

        let result = run(
            &paths,
            ConfigAction::Set("pretty".into(), "sometimes".into()),
        )
        .unwrap();
        assert!(result.has_errors());
        assert!(!paths.config_dir.exists());
    }

    #[test]
    fn unknown_key_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(&paths(&dir), ConfigAction::ShowKey("nope".into())).unwrap();
        assert!(result.has_errors());
        assert_eq!(result.messages[0].content, "Unknown config key: nope");
    }
}
