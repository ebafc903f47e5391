//! Search strategies: exhaustive grid and progressive coordinate sweep.

use std::collections::HashMap;

use rt_types::{best_record, ParamValue, RunRecord, SearchSpace, TrialConfig, TuneResult};

/// Common trait for all search strategies.
///
/// The trial history is an explicit parameter so strategies stay pure over
/// their inputs; nothing is read from ambient state.
pub trait SearchStrategy: Send + Sync {
    /// Propose the configuration for trial `trial`, or `None` when the
    /// strategy is exhausted.
    fn propose(&self, trial: usize, history: &[RunRecord]) -> TuneResult<Option<TrialConfig>>;

    /// Human-readable strategy name.
    fn name(&self) -> &str;
}

// ---- Grid search ----

/// Exhaustive search over the full Cartesian product of candidate values.
///
/// Configurations are materialised once, in a fixed deterministic order
/// (first-declared parameter outermost); trial `i` is retrieved by direct
/// index. History is never consulted.
#[derive(Debug, Clone)]
pub struct GridSearch {
    #[allow(dead_code)]
    space: SearchSpace,
    combos: Vec<HashMap<String, ParamValue>>,
}

impl GridSearch {
    pub fn new(space: SearchSpace) -> Self {
        let combos = Self::build_grid(&space);
        Self { space, combos }
    }

    /// Total number of trials this strategy will propose.
    pub fn trial_count(&self) -> usize {
        self.combos.len()
    }

    fn build_grid(space: &SearchSpace) -> Vec<HashMap<String, ParamValue>> {
        // Cartesian product, declaration order outer-to-inner.
        let mut result: Vec<HashMap<String, ParamValue>> = vec![HashMap::new()];
        for def in space.params() {
            let mut next = Vec::with_capacity(result.len() * def.values.len());
            for existing in &result {
                for value in &def.values {
                    let mut combo = existing.clone();
                    combo.insert(def.name.clone(), value.clone());
                    next.push(combo);
                }
            }
            result = next;
        }
        result
    }
}

impl SearchStrategy for GridSearch {
    fn propose(&self, trial: usize, _history: &[RunRecord]) -> TuneResult<Option<TrialConfig>> {
        Ok(self
            .combos
            .get(trial)
            .map(|values| TrialConfig::new(trial, values.clone())))
    }

    fn name(&self) -> &str {
        "grid"
    }
}

// ---- Progressive search ----

/// One-pass coordinate sweep with greedy adoption of the best observed
/// configuration.
///
/// Approximates the optimum in O(sum of candidate counts) trials instead of
/// the grid's O(product): each trial varies a single parameter against the
/// best configuration seen so far. Assumes parameter effects are roughly
/// separable; interaction effects between parameters may be missed.
#[derive(Debug, Clone)]
pub struct ProgressiveSearch {
    space: SearchSpace,
    objective_metric: String,
}

impl ProgressiveSearch {
    pub fn new(space: SearchSpace, objective_metric: impl Into<String>) -> Self {
        Self {
            space,
            objective_metric: objective_metric.into(),
        }
    }

    /// The scheduled single-parameter overrides, one per trial.
    ///
    /// The parameter at step 0 contributes every candidate (its baseline
    /// value included, duplicating one trial with the default); every later
    /// parameter contributes only its non-baseline candidates. Single-value
    /// parameters are never scheduled.
    fn variation_plan(&self) -> Vec<(String, ParamValue)> {
        let mut plan = Vec::new();
        for (step, def) in self.space.params().iter().enumerate() {
            if def.values.len() < 2 {
                continue;
            }
            let baseline = def.baseline();
            for value in &def.values {
                if step == 0 || value != baseline {
                    plan.push((def.name.clone(), value.clone()));
                }
            }
        }
        // All parameters are singletons: run exactly one trial at the default.
        if plan.is_empty() {
            if let Some(first) = self.space.params().first() {
                plan.push((first.name.clone(), first.values[0].clone()));
            }
        }
        plan
    }
}

impl SearchStrategy for ProgressiveSearch {
    fn propose(&self, trial: usize, history: &[RunRecord]) -> TuneResult<Option<TrialConfig>> {
        let plan = self.variation_plan();
        if trial >= plan.len() {
            return Ok(None);
        }

        let base = match best_record(history, &self.objective_metric)? {
            Some(best) => TrialConfig::from_flattened(trial, best.config.clone()).values,
            None => self.space.baseline(),
        };

        let (name, value) = plan[trial].clone();
        let mut values = base;
        values.insert(name, value);
        Ok(Some(TrialConfig::new(trial, values)))
    }

    fn name(&self) -> &str {
        "progressive"
    }
}
