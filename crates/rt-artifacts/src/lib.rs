pub mod metrics;
pub mod runs;

pub use metrics::*;
pub use runs::*;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use rt_types::{ArtifactError, TuneResult};

/// Locates completed pipeline runs under a shared base path and loads their
/// output rows into metric mappings.
///
/// A run qualifies for a `(pipeline, component)` pair when its directory name
/// starts with the pipeline name, its suffix parses as a timestamp, and at
/// least one parquet file exists under the component subdirectory.
#[derive(Debug, Clone)]
pub struct ArtifactRepository {
    base_path: PathBuf,
}

impl ArtifactRepository {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// All qualifying runs of `pipeline_name` carrying output for
    /// `component_name`, in no particular order.
    pub fn list_runs(
        &self,
        pipeline_name: &str,
        component_name: &str,
    ) -> TuneResult<Vec<RunHandle>> {
        let data_dir = self.base_path.join(pipeline_name);
        if !data_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in std::fs::read_dir(&data_dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let Some(dir_name) = path.file_name().and_then(|n| n.to_str()).map(String::from)
            else {
                continue;
            };
            // Differently named pipelines may share the base path.
            if !dir_name.starts_with(pipeline_name) {
                continue;
            }

            let component_dir = path.join(component_name);
            let output_files = parquet_files(&component_dir)?;
            if output_files.is_empty() {
                continue;
            }

            let created_at = match RunHandle::parse_timestamp(&dir_name) {
                Ok(created_at) => created_at,
                Err(error) => {
                    warn!(dir = %dir_name, %error, "skipping run directory without timestamp");
                    continue;
                }
            };

            runs.push(RunHandle {
                pipeline_name: pipeline_name.to_string(),
                dir_name,
                created_at,
                component_dir,
                output_files,
            });
        }
        Ok(runs)
    }

    /// The most recent qualifying run.
    pub fn latest_run(&self, pipeline_name: &str, component_name: &str) -> TuneResult<RunHandle> {
        self.list_runs(pipeline_name, component_name)?
            .into_iter()
            .max_by_key(|run| run.created_at)
            .ok_or_else(|| {
                ArtifactError::RunNotFound {
                    pipeline: pipeline_name.to_string(),
                    component: component_name.to_string(),
                }
                .into()
            })
    }

    /// Metric mapping read from the most recent qualifying run's output.
    pub fn latest_metrics(
        &self,
        pipeline_name: &str,
        component_name: &str,
    ) -> TuneResult<HashMap<String, f64>> {
        let run = self.latest_run(pipeline_name, component_name)?;
        debug!(
            run = %run.dir_name,
            files = run.output_files.len(),
            "reading metrics from latest run"
        );
        read_metric_rows(&run.output_files)
    }
}

fn parquet_files(dir: &Path) -> TuneResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("parquet")
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::write_metrics_file;
    use rt_types::TuneError;
    use tempfile::tempdir;

    const PIPELINE: &str = "evaluation-pipeline";
    const COMPONENT: &str = "aggregate_eval_results";

    fn seed_run(base: &Path, dir_name: &str, rows: &[(&str, f64)]) {
        let component_dir = base.join(PIPELINE).join(dir_name).join(COMPONENT);
        std::fs::create_dir_all(&component_dir).unwrap();
        write_metrics_file(&component_dir.join("part-0.parquet"), rows);
    }

    #[test]
    fn latest_run_picks_newest_timestamp() {
        let dir = tempdir().unwrap();
        seed_run(
            dir.path(),
            "evaluation-pipeline-20240101120000",
            &[("context_precision", 0.40)],
        );
        seed_run(
            dir.path(),
            "evaluation-pipeline-20240102090000",
            &[("context_precision", 0.55)],
        );

        let repo = ArtifactRepository::new(dir.path());
        let latest = repo.latest_run(PIPELINE, COMPONENT).unwrap();
        assert_eq!(latest.dir_name, "evaluation-pipeline-20240102090000");

        let metrics = repo.latest_metrics(PIPELINE, COMPONENT).unwrap();
        assert_eq!(metrics["context_precision"], 0.55);
    }

    #[test]
    fn ignores_runs_of_other_pipelines_and_empty_components() {
        let dir = tempdir().unwrap();
        seed_run(
            dir.path(),
            "evaluation-pipeline-20240101120000",
            &[("context_precision", 0.40)],
        );
        // Foreign pipeline run sharing the same base path.
        seed_run(
            dir.path(),
            "other-pipeline-20240103120000",
            &[("context_precision", 0.99)],
        );
        // A run directory with no component output.
        std::fs::create_dir_all(
            dir.path()
                .join(PIPELINE)
                .join("evaluation-pipeline-20240104120000"),
        )
        .unwrap();

        let repo = ArtifactRepository::new(dir.path());
        let runs = repo.list_runs(PIPELINE, COMPONENT).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].dir_name, "evaluation-pipeline-20240101120000");
    }

    #[test]
    fn missing_run_is_fatal() {
        let dir = tempdir().unwrap();
        let repo = ArtifactRepository::new(dir.path());
        match repo.latest_metrics(PIPELINE, COMPONENT) {
            Err(TuneError::Artifact(ArtifactError::RunNotFound { pipeline, .. })) => {
                assert_eq!(pipeline, PIPELINE);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
