//! INI file configuration adapter.
//!
//! Keys are case-sensitive so instrument and indicator names keep their
//! spelling (`S&P500`, `Fed Funds Rate`).

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new_cs();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new_cs();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn section_entries(&self, section: &str) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .config
            .get_map_ref()
            .get(section)
            .map(|keys| {
                keys.iter()
                    .map(|(k, v)| (k.clone(), v.clone().unwrap_or_default()))
                    .collect()
            })
            .unwrap_or_default();
        entries.sort();
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
source = csv

[csv]
prices_dir = /tmp/prices

[scoring]
threshold_pct = 12.5
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(adapter.get_string("data", "source"), Some("csv".to_string()));
        assert_eq!(
            adapter.get_string("csv", "prices_dir"),
            Some("/tmp/prices".to_string())
        );
        assert_eq!(
            adapter.get_string("scoring", "threshold_pct"),
            Some("12.5".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[scoring]\nthreshold_pct = 10\n").unwrap();
        assert_eq!(adapter.get_string("scoring", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value_or_default() {
        let adapter =
            FileConfigAdapter::from_string("[sqlite]\npool_size = 8\nbad = abc\n").unwrap();
        assert_eq!(adapter.get_int("sqlite", "pool_size", 4), 8);
        assert_eq!(adapter.get_int("sqlite", "missing", 4), 4);
        assert_eq!(adapter.get_int("sqlite", "bad", 4), 4);
    }

    #[test]
    fn section_entries_keep_case_and_sort() {
        let content = r#"
[instruments]
WORLD = VT
S&P500 = SPY
NIKKEI 225 = ^N225
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        let entries = adapter.section_entries("instruments");
        assert_eq!(
            entries,
            vec![
                ("NIKKEI 225".to_string(), "^N225".to_string()),
                ("S&P500".to_string(), "SPY".to_string()),
                ("WORLD".to_string(), "VT".to_string()),
            ]
        );
        assert!(adapter.section_entries("missing").is_empty());
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[report]\noutput = /tmp/alloc.csv\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("report", "output"),
            Some("/tmp/alloc.csv".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(result.is_err());
    }
}
