//! Dated JSON files under the data directory.
//!
//! File names follow the layout of earlier runs so that existing data
//! directories keep working:
//!
//! - `{date}-datasets_{project}_{repository}.json`: harvested records
//! - `{date}_usage_stats_{repository}.json`: cached usage statistics

use std::fs::File;
use std::io::{BufReader, BufWriter, Write as _};
use std::path::{Path, PathBuf};

use pubmetrics_record_models::{HarvestDate, HarvestedRecord};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::HarvestError;

/// Path of the harvest file for one repository.
#[must_use]
pub fn harvest_path(
    data_dir: &Path,
    date: HarvestDate,
    project: &str,
    repository_id: &str,
) -> PathBuf {
    data_dir.join(format!("{date}-datasets_{project}_{repository_id}.json"))
}

/// Path of the usage statistics cache file for one repository.
#[must_use]
pub fn usage_stats_path(data_dir: &Path, date: HarvestDate, repository_id: &str) -> PathBuf {
    data_dir.join(format!("{date}_usage_stats_{repository_id}.json"))
}

/// Serializes `value` as JSON to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`HarvestError`] if the directory or file cannot be written.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), HarvestError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Reads a JSON file written by [`write_json`] or an earlier run.
///
/// # Errors
///
/// Returns [`HarvestError::MissingInput`] if the file does not exist, or a
/// JSON/I/O error if it cannot be read.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, HarvestError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HarvestError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Loads the records of one harvest file.
///
/// # Errors
///
/// See [`read_json`].
pub fn load_harvest(path: &Path) -> Result<Vec<HarvestedRecord>, HarvestError> {
    let records: Vec<HarvestedRecord> = read_json(path)?;
    log::debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> HarvestDate {
        "20260210".parse().unwrap()
    }

    #[test]
    fn names_dated_files() {
        let dir = Path::new("./data");
        assert_eq!(
            harvest_path(dir, date(), "ac3", "pangaea"),
            Path::new("./data/20260210-datasets_ac3_pangaea.json")
        );
        assert_eq!(
            usage_stats_path(dir, date(), "zenodo"),
            Path::new("./data/20260210_usage_stats_zenodo.json")
        );
    }

    #[test]
    fn writes_and_loads_harvest_file() {
        let tmp = std::env::temp_dir().join("pubmetrics_storage_round_trip");
        let _ = std::fs::remove_dir_all(&tmp);
        let path = harvest_path(&tmp.join("nested"), date(), "ac3", "zenodo");

        let records = vec![HarvestedRecord {
            doi: vec!["https://doi.org/10.5281/zenodo.101".to_owned()],
            title: vec!["Radar".to_owned()],
            ..HarvestedRecord::default()
        }];
        write_json(&path, &records).unwrap();

        assert_eq!(load_harvest(&path).unwrap(), records);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let path = std::env::temp_dir().join("pubmetrics_storage_does_not_exist.json");
        let _ = std::fs::remove_file(&path);

        let err = load_harvest(&path).unwrap_err();

        assert!(matches!(err, HarvestError::MissingInput { path: p } if p == path));
    }
}
