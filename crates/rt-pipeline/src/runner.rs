//! Pipeline execution collaborators.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

use rt_types::{TrialError, TuneResult};

use crate::compose;
use crate::spec::PipelineSpec;

/// Executes a pipeline to completion. The call blocks until every component
/// has finished; a failure surfaces as `TrialError::ExecutionFailed`. No
/// timeout is enforced.
#[async_trait]
pub trait PipelineRunner: Send + Sync + std::fmt::Debug {
    async fn run(&self, spec: &PipelineSpec) -> TuneResult<()>;

    /// Get runner name
    fn name(&self) -> &str;
}

/// Compiles a spec to a compose file and runs it with `docker compose`.
#[derive(Debug, Clone)]
pub struct DockerComposeRunner {
    work_dir: PathBuf,
}

impl DockerComposeRunner {
    pub fn new<P: AsRef<Path>>(work_dir: P) -> Self {
        Self {
            work_dir: work_dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl PipelineRunner for DockerComposeRunner {
    async fn run(&self, spec: &PipelineSpec) -> TuneResult<()> {
        let compose_file = compose::compile(spec)?;
        let compose_path = self.work_dir.join(format!("{}-compose.yaml", spec.name));
        tokio::fs::write(&compose_path, compose_file.to_yaml()?).await?;

        info!(
            pipeline = %spec.name,
            file = %compose_path.display(),
            "running pipeline via docker compose"
        );

        let status = Command::new("docker")
            .arg("compose")
            .arg("-f")
            .arg(&compose_path)
            .args(["up", "--build", "--pull", "always", "--remove-orphans"])
            .status()
            .await
            .map_err(|e| TrialError::ExecutionFailed {
                pipeline: spec.name.clone(),
                message: e.to_string(),
            })?;

        if !status.success() {
            return Err(TrialError::ExecutionFailed {
                pipeline: spec.name.clone(),
                message: format!("docker compose exited with {status}"),
            }
            .into());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "docker-compose"
    }
}
