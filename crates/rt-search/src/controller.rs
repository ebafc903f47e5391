//! The trial loop: propose, execute both pipelines, read metrics, record.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use rt_artifacts::ArtifactRepository;
use rt_pipeline::{
    build_eval_pipeline, build_index_pipeline, EvalSettings, IndexSettings, PipelineRunner,
    VectorStoreAdmin, AGGREGATE_COMPONENT, EVALUATION_PIPELINE,
};
use rt_types::{best_record, RunRecord, SearchSpace, TrialConfig, TuneResult};

use crate::search::SearchStrategy;

/// Fixed arguments of one search session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Metric the search maximizes.
    pub objective_metric: String,
    pub index: IndexSettings,
    pub eval: EvalSettings,
}

/// Lifecycle state for a search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Result table returned when a search completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub search_id: Uuid,
    pub state: SearchState,
    pub records: Vec<RunRecord>,
    pub best: Option<RunRecord>,
}

/// Drives trials strictly sequentially: trial `t+1` never starts before
/// trial `t`'s index pipeline, eval pipeline, and metric read have all
/// completed, because the progressive strategy's proposal depends on every
/// prior result.
///
/// Errors are surfaced, not retried: a failed pipeline or a missing
/// evaluation run aborts the search with the error propagated to the caller.
/// Records accumulated before the failure stay readable via
/// [`records`](Self::records). Vector-store collections created per trial
/// (`Run<t>`) are never deleted here; cleanup is an operator concern.
pub struct SearchController {
    search_id: Uuid,
    space: SearchSpace,
    settings: SearchSettings,
    strategy: Box<dyn SearchStrategy>,
    runner: Box<dyn PipelineRunner>,
    admin: Box<dyn VectorStoreAdmin>,
    artifacts: ArtifactRepository,
    state: SearchState,
    records: Vec<RunRecord>,
}

impl SearchController {
    pub fn new(
        space: SearchSpace,
        settings: SearchSettings,
        strategy: Box<dyn SearchStrategy>,
        runner: Box<dyn PipelineRunner>,
        admin: Box<dyn VectorStoreAdmin>,
        artifacts: ArtifactRepository,
    ) -> Self {
        Self {
            search_id: Uuid::new_v4(),
            space,
            settings,
            strategy,
            runner,
            admin,
            artifacts,
            state: SearchState::Pending,
            records: Vec::new(),
        }
    }

    pub fn search_id(&self) -> Uuid {
        self.search_id
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Records accumulated so far, also available after a failed run.
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Run trials until the strategy is exhausted.
    pub async fn run(&mut self) -> TuneResult<SearchReport> {
        self.state = SearchState::Running;
        info!(
            search_id = %self.search_id,
            strategy = self.strategy.name(),
            objective = %self.settings.objective_metric,
            "starting parameter search"
        );

        let mut trial = 0;
        loop {
            let config = match self.strategy.propose(trial, &self.records) {
                Ok(Some(config)) => config,
                Ok(None) => break,
                Err(error) => {
                    self.state = SearchState::Failed;
                    return Err(error);
                }
            };
            if let Err(error) = self.run_trial(config).await {
                self.state = SearchState::Failed;
                return Err(error);
            }
            trial += 1;
        }

        let best = match best_record(&self.records, &self.settings.objective_metric) {
            Ok(best) => best.cloned(),
            Err(error) => {
                self.state = SearchState::Failed;
                return Err(error);
            }
        };

        self.state = SearchState::Completed;
        info!(
            search_id = %self.search_id,
            trials = self.records.len(),
            "parameter search completed"
        );
        Ok(SearchReport {
            search_id: self.search_id,
            state: self.state,
            records: self.records.clone(),
            best,
        })
    }

    async fn run_trial(&mut self, config: TrialConfig) -> TuneResult<()> {
        let run_tag = config.run_tag();
        let (index_config, eval_config) = config.split(&self.space)?;
        info!(trial = config.trial, class = %run_tag, "running trial");

        let index_spec = build_index_pipeline(&self.settings.index, &index_config)?;
        self.runner.run(&index_spec).await?;

        let eval_spec = build_eval_pipeline(&self.settings.eval, &eval_config)?;
        self.runner.run(&eval_spec).await?;

        // Sanity logging only; the class check never gates the trial.
        match self.admin.class_exists(&run_tag).await {
            Ok(true) => debug!(class = %run_tag, "vector store class present"),
            Ok(false) => warn!(class = %run_tag, "vector store class missing after indexing"),
            Err(error) => warn!(class = %run_tag, %error, "vector store schema check failed"),
        }

        let metrics = self
            .artifacts
            .latest_metrics(EVALUATION_PIPELINE, AGGREGATE_COMPONENT)?;
        info!(trial = config.trial, ?metrics, "trial metrics recorded");

        self.records
            .push(RunRecord::new(config.trial, config.flatten(), metrics));
        Ok(())
    }
}
