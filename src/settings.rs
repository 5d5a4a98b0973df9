use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::domain::RunOptions;
use crate::infra::{cache::default_cache_path, spreadsheet::ReferenceColumns, wiki::DEFAULT_BASE_URL};

const DEFAULT_REFERENCE: &str = "物品价值表.xlsx";
const DEFAULT_OUTPUT: &str = "output.xlsx";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything a run needs besides the data itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Item value table (xlsx/xls/ods/csv).
    pub reference: PathBuf,
    /// Roster JSON; the embedded roster is used when unset.
    pub roster: Option<PathBuf>,
    /// Report destination; format follows the extension.
    pub output: PathBuf,
    pub base_url: String,
    pub concurrency: usize,
    /// Per-operator fetch timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
    pub use_cache: bool,
    pub cache_path: Option<PathBuf>,
    pub columns: ReferenceColumns,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reference: PathBuf::from(DEFAULT_REFERENCE),
            roster: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: 1,
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            use_cache: true,
            cache_path: None,
            columns: ReferenceColumns::default(),
        }
    }
}

impl Settings {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            concurrency: self.concurrency.max(1),
            fetch_timeout: self
                .timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }

    /// Disk cache location, if caching is on.
    pub fn cache_file(&self) -> Option<PathBuf> {
        self.use_cache
            .then(|| self.cache_path.clone().unwrap_or_else(default_cache_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_options_follow_settings() {
        let settings = Settings {
            concurrency: 0,
            timeout_secs: Some(5),
            ..Settings::default()
        };
        let options = settings.run_options();
        assert_eq!(options.concurrency, 1);
        assert_eq!(options.fetch_timeout, Some(Duration::from_secs(5)));

        let unbounded = Settings {
            timeout_secs: Some(0),
            ..Settings::default()
        };
        assert_eq!(unbounded.run_options().fetch_timeout, None);
    }

    #[test]
    fn cache_file_respects_toggle() {
        let settings = Settings {
            cache_path: Some(PathBuf::from("items.json")),
            ..Settings::default()
        };
        assert_eq!(settings.cache_file(), Some(PathBuf::from("items.json")));

        let disabled = Settings {
            use_cache: false,
            ..settings
        };
        assert_eq!(disabled.cache_file(), None);
    }
}
