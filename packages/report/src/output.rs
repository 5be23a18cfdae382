//! Report file names and writers.

use std::path::{Path, PathBuf};

use pubmetrics_record_models::HarvestDate;
use serde::Serialize;

use crate::ReportError;

#[must_use]
pub fn yearly_publications_path(data_dir: &Path, date: HarvestDate) -> PathBuf {
    data_dir.join(format!("{date}_yearly_publications.csv"))
}

#[must_use]
pub fn yearly_totals_path(data_dir: &Path, date: HarvestDate) -> PathBuf {
    data_dir.join(format!("{date}_yearly_totals.csv"))
}

#[must_use]
pub fn usage_totals_path(data_dir: &Path, date: HarvestDate) -> PathBuf {
    data_dir.join(format!("{date}_usage_totals.csv"))
}

#[must_use]
pub fn title_terms_path(data_dir: &Path, date: HarvestDate) -> PathBuf {
    data_dir.join(format!("{date}_title_terms.csv"))
}

/// The normalized, deduplicated record table.
#[must_use]
pub fn consolidated_path(data_dir: &Path, date: HarvestDate, project: &str) -> PathBuf {
    data_dir.join(format!("{date}-datasets_{project}_consolidated.json"))
}

/// Writes `rows` as a headed CSV file, creating parent directories.
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be created or a row cannot
/// be serialized.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ReportError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::TermCount;

    #[test]
    fn names_report_files() {
        let date: HarvestDate = "20260210".parse().unwrap();
        let dir = Path::new("data");
        assert_eq!(
            consolidated_path(dir, date, "ac3"),
            Path::new("data/20260210-datasets_ac3_consolidated.json")
        );
        assert_eq!(
            title_terms_path(dir, date),
            Path::new("data/20260210_title_terms.csv")
        );
    }

    #[test]
    fn writes_headed_csv() {
        let dir = std::env::temp_dir().join("pubmetrics_report_write_csv");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("terms.csv");

        write_csv(
            &path,
            &[
                TermCount {
                    term: "radar".to_owned(),
                    count: 4,
                },
                TermCount {
                    term: "NyÅlesund".to_owned(),
                    count: 2,
                },
            ],
        )
        .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "term,count\nradar,4\nNyÅlesund,2\n");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
