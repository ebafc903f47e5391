//! Trial history records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{TrialError, TuneResult};
use crate::params::ParamValue;

/// One completed trial: its resolved configuration (flattened) and the
/// metric scores read back from the evaluation artifacts.
///
/// Records are append-only; the accumulated sequence is the sole state a
/// search strategy consults when proposing the next configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub trial: usize,
    pub recorded_at: DateTime<Utc>,
    pub config: HashMap<String, ParamValue>,
    pub metrics: HashMap<String, f64>,
}

impl RunRecord {
    pub fn new(
        trial: usize,
        config: HashMap<String, ParamValue>,
        metrics: HashMap<String, f64>,
    ) -> Self {
        Self {
            trial,
            recorded_at: Utc::now(),
            config,
            metrics,
        }
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// The record with the maximum objective value, ties broken by the earliest
/// record. A record missing the objective metric is a fatal configuration
/// error: the evaluation stage did not produce the expected metric name.
pub fn best_record<'a>(
    history: &'a [RunRecord],
    objective_metric: &str,
) -> TuneResult<Option<&'a RunRecord>> {
    let mut best: Option<(&RunRecord, f64)> = None;
    for record in history {
        let score = record.metric(objective_metric).ok_or_else(|| {
            TrialError::MissingMetric {
                metric: objective_metric.to_string(),
                trial: record.trial,
            }
        })?;
        best = match best {
            Some((_, best_score)) if score <= best_score => best,
            _ => Some((record, score)),
        };
    }
    Ok(best.map(|(record, _)| record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TuneError;

    fn record(trial: usize, score: f64) -> RunRecord {
        let mut metrics = HashMap::new();
        metrics.insert("context_precision".to_string(), score);
        RunRecord::new(trial, HashMap::new(), metrics)
    }

    #[test]
    fn best_record_picks_maximum() {
        let history = vec![record(0, 0.40), record(1, 0.55), record(2, 0.30)];
        let best = best_record(&history, "context_precision").unwrap().unwrap();
        assert_eq!(best.trial, 1);
    }

    #[test]
    fn best_record_ties_break_to_earliest() {
        let history = vec![record(0, 0.55), record(1, 0.55)];
        let best = best_record(&history, "context_precision").unwrap().unwrap();
        assert_eq!(best.trial, 0);
    }

    #[test]
    fn best_record_empty_history_is_none() {
        assert!(best_record(&[], "context_precision").unwrap().is_none());
    }

    #[test]
    fn missing_metric_is_fatal() {
        let history = vec![record(0, 0.40), RunRecord::new(1, HashMap::new(), HashMap::new())];
        match best_record(&history, "context_precision") {
            Err(TuneError::Trial(TrialError::MissingMetric { metric, trial })) => {
                assert_eq!(metric, "context_precision");
                assert_eq!(trial, 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
