// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::env::current_dir;
use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::db::Database;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::params::ParameterConfig;
use crate::params::Parameters;
use crate::scheduler::Scheduler;

pub const DATABASE_FILE: &str = "deckwise.db";
pub const CONFIG_FILE: &str = "deckwise.toml";

/// The contents of `deckwise.toml`.
#[derive(Deserialize, Default, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub scheduler: ParameterConfig,
}

impl Config {
    pub fn parse(text: &str) -> Fallible<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read the configuration file in `directory`, if there is one.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        log::debug!("Reading configuration from {}.", path.display());
        Self::parse(&read_to_string(path)?)
    }
}

/// A directory holding a card database and its configuration.
pub struct Collection {
    pub directory: PathBuf,
    pub db: Database,
    pub params: Parameters,
}

impl Collection {
    pub fn new(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        let directory = if directory.exists() {
            directory.canonicalize()?
        } else {
            return fail("directory does not exist.");
        };

        let config = Config::load(&directory)?;
        let params = Parameters::try_from(config.scheduler)?;

        let db_path: PathBuf = directory.join(DATABASE_FILE);
        let db_path: &str = db_path
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))?;
        let db: Database = Database::new(db_path)?;

        Ok(Self {
            directory,
            db,
            params,
        })
    }

    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(self.params.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_non_existent_directory() {
        assert!(Collection::new(Some("./derpherp".to_string())).is_err());
    }

    #[test]
    fn test_defaults_without_config() -> Fallible<()> {
        let dir = tempdir()?;
        let coll = Collection::new(Some(dir.path().display().to_string()))?;
        assert_eq!(coll.params, Parameters::default());
        assert!(coll.directory.join(DATABASE_FILE).exists());
        Ok(())
    }

    #[test]
    fn test_config_file() -> Fallible<()> {
        let dir = tempdir()?;
        let text = "[scheduler]\nrequest_retention = 0.85\nenable_fuzz = true\nlearning_steps = [5.0]\n";
        write(dir.path().join(CONFIG_FILE), text)?;
        let coll = Collection::new(Some(dir.path().display().to_string()))?;
        assert_eq!(coll.params.request_retention(), 0.85);
        assert!(coll.params.enable_fuzz());
        assert_eq!(coll.params.learning_steps(), &[5.0]);
        Ok(())
    }

    #[test]
    fn test_invalid_config() -> Fallible<()> {
        let dir = tempdir()?;
        write(
            dir.path().join(CONFIG_FILE),
            "[scheduler]\nrequest_retention = 1.5\n",
        )?;
        assert!(Collection::new(Some(dir.path().display().to_string())).is_err());
        Ok(())
    }

    #[test]
    fn test_unknown_table() {
        assert!(Config::parse("[schedular]\n").is_err());
        assert_eq!(Config::parse("").ok(), Some(Config::default()));
    }
}
