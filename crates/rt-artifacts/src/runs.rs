//! Timestamped run-directory handles.
//!
//! The pipeline executor writes each run into
//! `<base_path>/<pipeline_name>/<pipeline_name>...-<YYYYMMDDHHMMSS>/`, with
//! one subdirectory per component holding that component's output files.
//! The timestamp suffix after the last `-` is the versioning mechanism.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use rt_types::{ArtifactError, TuneResult};

/// Directory-name timestamp suffix format.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// One discovered run of a named pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHandle {
    pub pipeline_name: String,
    pub dir_name: String,
    pub created_at: NaiveDateTime,
    /// The requested component's directory inside the run.
    pub component_dir: PathBuf,
    /// Output files under `component_dir`, in enumeration order.
    pub output_files: Vec<PathBuf>,
}

impl RunHandle {
    /// Parse the fixed-width timestamp suffix after the last `-` separator.
    pub fn parse_timestamp(dir_name: &str) -> TuneResult<NaiveDateTime> {
        let suffix = dir_name.rsplit('-').next().unwrap_or_default();
        NaiveDateTime::parse_from_str(suffix, TIMESTAMP_FORMAT).map_err(|_| {
            ArtifactError::InvalidTimestamp {
                entry: dir_name.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_timestamp_suffix() {
        let ts = RunHandle::parse_timestamp("evaluation-pipeline-20240102090000").unwrap();
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.month(), 1);
        assert_eq!(ts.day(), 2);
        assert_eq!(ts.hour(), 9);
    }

    #[test]
    fn orders_by_timestamp() {
        let earlier = RunHandle::parse_timestamp("eval-pipeline-20240101120000").unwrap();
        let later = RunHandle::parse_timestamp("eval-pipeline-20240102090000").unwrap();
        assert!(later > earlier);
    }

    #[test]
    fn rejects_missing_suffix() {
        assert!(RunHandle::parse_timestamp("evaluation-pipeline").is_err());
        assert!(RunHandle::parse_timestamp("evaluation-pipeline-2024").is_err());
        assert!(RunHandle::parse_timestamp("").is_err());
    }
}
