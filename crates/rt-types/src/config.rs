//! Resolved per-trial configurations and their stage split.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config_error;
use crate::errors::TuneResult;
use crate::params::{
    EmbedModel, ParamScope, ParamValue, SearchSpace, EMBED_MODEL_PARAM, EMBED_PROVIDER_FIELD,
};

/// A fully resolved parameter mapping for one trial.
///
/// Created fresh each iteration by a search strategy and discarded once the
/// trial's [`crate::RunRecord`](crate::record::RunRecord) is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialConfig {
    pub trial: usize,
    pub values: HashMap<String, ParamValue>,
}

impl TrialConfig {
    pub fn new(trial: usize, values: HashMap<String, ParamValue>) -> Self {
        Self { trial, values }
    }

    /// The vector-store class name for this trial. Monotonically increasing
    /// trial numbers keep collections disjoint across trials.
    pub fn run_tag(&self) -> String {
        format!("Run{}", self.trial)
    }

    /// Split into the index-stage and eval-stage halves according to each
    /// parameter's declared scope. Shared parameters land in both halves and
    /// the `embed_model` pair becomes two scalar fields in each.
    pub fn split(&self, space: &SearchSpace) -> TuneResult<(IndexConfig, EvalConfig)> {
        let mut index = HashMap::new();
        let mut eval = HashMap::new();

        for def in space.params() {
            let value = self.values.get(&def.name).ok_or_else(|| {
                config_error!("parameter '{}' missing from trial {}", def.name, self.trial)
            })?;
            match def.scope {
                ParamScope::Index => {
                    index.insert(def.name.clone(), value.clone());
                }
                ParamScope::Eval => {
                    eval.insert(def.name.clone(), value.clone());
                }
                ParamScope::Shared => {
                    index.insert(def.name.clone(), value.clone());
                    eval.insert(def.name.clone(), value.clone());
                }
            }
        }

        split_embed_fields(&mut index);
        split_embed_fields(&mut eval);

        Ok((
            IndexConfig {
                class_name: self.run_tag(),
                params: index,
            },
            EvalConfig {
                class_name: self.run_tag(),
                params: eval,
            },
        ))
    }

    /// The flat form recorded in a `RunRecord`: the `embed_model` pair is
    /// stored as its two scalar fields.
    pub fn flatten(&self) -> HashMap<String, ParamValue> {
        let mut values = self.values.clone();
        split_embed_fields(&mut values);
        values
    }

    /// Inverse of [`flatten`](Self::flatten): rebuild a trial config from a
    /// recorded mapping, re-joining the `embed_model` pair.
    pub fn from_flattened(trial: usize, mut values: HashMap<String, ParamValue>) -> Self {
        join_embed_fields(&mut values);
        Self { trial, values }
    }

    /// Reconstruct the original mapping from the two stage halves.
    pub fn merge(index: &IndexConfig, eval: &EvalConfig) -> TuneResult<TrialConfig> {
        if index.class_name != eval.class_name {
            return Err(config_error!(
                "index and eval configs carry different run tags: '{}' vs '{}'",
                index.class_name,
                eval.class_name
            ));
        }
        let trial = index
            .class_name
            .strip_prefix("Run")
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| config_error!("malformed run tag '{}'", index.class_name))?;

        let mut values = index.params.clone();
        for (name, value) in &eval.params {
            if let Some(existing) = values.get(name) {
                if existing != value {
                    return Err(config_error!(
                        "conflicting values for shared parameter '{name}'"
                    ));
                }
            }
            values.insert(name.clone(), value.clone());
        }
        join_embed_fields(&mut values);
        Ok(TrialConfig { trial, values })
    }
}

/// Parameters handed to the indexing pipeline for one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Vector-store class name, `Run<N>`.
    pub class_name: String,
    pub params: HashMap<String, ParamValue>,
}

impl IndexConfig {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    pub fn require(&self, name: &str) -> TuneResult<&ParamValue> {
        self.params.get(name).ok_or_else(|| {
            config_error!("parameter '{name}' missing from index config {}", self.class_name)
        })
    }
}

/// Parameters handed to the evaluation pipeline for one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Vector-store class name, `Run<N>`.
    pub class_name: String,
    pub params: HashMap<String, ParamValue>,
}

impl EvalConfig {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    pub fn require(&self, name: &str) -> TuneResult<&ParamValue> {
        self.params.get(name).ok_or_else(|| {
            config_error!("parameter '{name}' missing from eval config {}", self.class_name)
        })
    }
}

fn split_embed_fields(params: &mut HashMap<String, ParamValue>) {
    if let Some(ParamValue::Model(model)) = params.get(EMBED_MODEL_PARAM).cloned() {
        params.insert(
            EMBED_PROVIDER_FIELD.to_string(),
            ParamValue::Text(model.provider),
        );
        params.insert(EMBED_MODEL_PARAM.to_string(), ParamValue::Text(model.name));
    }
}

fn join_embed_fields(params: &mut HashMap<String, ParamValue>) {
    let provider = match params.remove(EMBED_PROVIDER_FIELD) {
        Some(ParamValue::Text(provider)) => provider,
        Some(other) => {
            params.insert(EMBED_PROVIDER_FIELD.to_string(), other);
            return;
        }
        None => return,
    };
    let name = match params.get(EMBED_MODEL_PARAM) {
        Some(ParamValue::Text(name)) => name.clone(),
        _ => {
            params.insert(EMBED_PROVIDER_FIELD.to_string(), ParamValue::Text(provider));
            return;
        }
    };
    params.insert(
        EMBED_MODEL_PARAM.to_string(),
        ParamValue::Model(EmbedModel { provider, name }),
    );
}
