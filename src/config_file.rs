use crate::cli::Args;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// JSON config file format.
///
/// Every field is optional; anything given on the command line wins.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub dpi: Option<u32>,
    /// Relative paths are resolved against the config file's directory.
    pub model_path: Option<String>,
    pub extensions: Option<String>,
    pub jobs: Option<usize>,
    pub dry_run: Option<bool>,
    pub verbose: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

impl Args {
    /// Load the `--config` file, if any, and fill every option the command
    /// line left unset. Returns the path of the file that was merged.
    ///
    /// Runs before logging is set up, so it reports instead of logging.
    pub fn load_and_merge_config(&mut self) -> Result<Option<PathBuf>> {
        let Some(config_path) = self.config_file.clone() else {
            return Ok(None);
        };

        let config = ConfigFile::load(&config_path)?;
        let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        self.merge_from_config(config, base_dir);

        Ok(Some(config_path))
    }

    fn merge_from_config(&mut self, config: ConfigFile, base_dir: &Path) {
        self.width = self.width.or(config.width);
        self.height = self.height.or(config.height);
        self.dpi = self.dpi.or(config.dpi);
        self.jobs = self.jobs.or(config.jobs);

        if self.extensions.is_none() {
            self.extensions = config.extensions;
        }

        if self.model.is_none() {
            self.model = config.model_path.map(|model| {
                let model = PathBuf::from(model);
                if model.is_relative() {
                    base_dir.join(model)
                } else {
                    model
                }
            });
        }

        // Flags can only be switched on from the file
        self.dry_run |= config.dry_run.unwrap_or(false);
        self.verbose |= config.verbose.unwrap_or(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn write_config(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("photoid.json");
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_config_fills_unset_options() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(
            dir.path(),
            r#"{"width": 300, "height": 360, "dpi": 200, "modelPath": "models/face.bin", "jobs": 2, "dryRun": true}"#,
        );

        let mut args = Args::try_parse_from([
            "photoid-processor",
            "in",
            "out",
            "--config",
            config.to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(args.load_and_merge_config().unwrap(), Some(config.clone()));

        assert_eq!(args.target_width(), 300);
        assert_eq!(args.target_height(), 360);
        assert_eq!(args.target_dpi(), 200);
        assert_eq!(args.parallel_jobs(), 2);
        assert_eq!(args.model_path(), dir.path().join("models/face.bin"));
        assert!(args.dry_run);
    }

    #[test]
    fn test_command_line_wins() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), r#"{"width": 300, "extensions": "png"}"#);

        let mut args = Args::try_parse_from([
            "photoid-processor",
            "in",
            "out",
            "500",
            "--extensions",
            "bmp",
            "--config",
            config.to_str().unwrap(),
        ])
        .unwrap();
        args.load_and_merge_config().unwrap();

        assert_eq!(args.target_width(), 500);
        assert_eq!(args.target_height(), 400);
        assert_eq!(args.extensions(), vec!["bmp"]);
    }

    #[test]
    fn test_no_config_flag_merges_nothing() {
        let mut args = Args::try_parse_from(["photoid-processor", "in", "out"]).unwrap();

        assert_eq!(args.load_and_merge_config().unwrap(), None);
        assert_eq!(args.target_width(), 400);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), r#"{"colour": "red"}"#);

        assert!(ConfigFile::load(&config).is_err());
    }

    #[test]
    fn test_missing_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigFile::load(&dir.path().join("nope.json")).is_err());
    }
}
