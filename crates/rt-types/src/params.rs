//! Parameter values and the declarative search space.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{SearchSpaceError, TuneResult};

/// Name of the paired embedding-model parameter. Its candidates carry a
/// provider and a model name that travel together through the search but are
/// handed to the pipelines as two scalar fields.
pub const EMBED_MODEL_PARAM: &str = "embed_model";

/// Field name the provider half of [`EMBED_MODEL_PARAM`] is flattened into.
pub const EMBED_PROVIDER_FIELD: &str = "embed_model_provider";

/// An embedding model candidate: provider plus model name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedModel {
    pub provider: String,
    pub name: String,
}

impl EmbedModel {
    pub fn new(provider: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            name: name.into(),
        }
    }
}

/// A concrete candidate value for a tunable parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
    Model(EmbedModel),
}

impl ParamValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&EmbedModel> {
        match self {
            Self::Model(v) => Some(v),
            _ => None,
        }
    }

    /// Render the value as a JSON argument for a pipeline component.
    pub fn to_json(&self) -> TuneResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
            Self::Model(v) => write!(f, "{}/{}", v.provider, v.name),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<EmbedModel> for ParamValue {
    fn from(v: EmbedModel) -> Self {
        Self::Model(v)
    }
}

/// Which pipeline stage a parameter is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamScope {
    /// Indexing pipeline only.
    Index,
    /// Evaluation pipeline only.
    Eval,
    /// Both pipelines.
    Shared,
}

/// A single parameter dimension: name, stage scope, and ordered candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub scope: ParamScope,
    pub values: Vec<ParamValue>,
}

impl ParamDef {
    /// The middle candidate, used as this parameter's default.
    pub fn baseline(&self) -> &ParamValue {
        &self.values[(self.values.len() - 1) / 2]
    }
}

/// The full search space: an ordered list of parameter definitions,
/// partitioned by stage scope. Declaration order is significant: it fixes
/// the iteration order of every search strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SearchSpace {
    parameters: Vec<ParamDef>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
        }
    }

    pub fn add_index(
        self,
        name: impl Into<String>,
        values: Vec<ParamValue>,
    ) -> TuneResult<Self> {
        self.add(name, ParamScope::Index, values)
    }

    pub fn add_eval(self, name: impl Into<String>, values: Vec<ParamValue>) -> TuneResult<Self> {
        self.add(name, ParamScope::Eval, values)
    }

    pub fn add_shared(
        self,
        name: impl Into<String>,
        values: Vec<ParamValue>,
    ) -> TuneResult<Self> {
        self.add(name, ParamScope::Shared, values)
    }

    fn add(
        mut self,
        name: impl Into<String>,
        scope: ParamScope,
        values: Vec<ParamValue>,
    ) -> TuneResult<Self> {
        let name = name.into();
        if values.is_empty() {
            return Err(SearchSpaceError::EmptyValues { param: name }.into());
        }
        if self.parameters.iter().any(|p| p.name == name) {
            return Err(SearchSpaceError::DuplicateParam { param: name }.into());
        }
        self.parameters.push(ParamDef {
            name,
            scope,
            values,
        });
        Ok(self)
    }

    pub fn params(&self) -> &[ParamDef] {
        &self.parameters
    }

    pub fn get(&self, name: &str) -> Option<&ParamDef> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// The default configuration: every parameter at its middle candidate.
    pub fn baseline(&self) -> HashMap<String, ParamValue> {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.baseline().clone()))
            .collect()
    }

    /// Total number of grid points across all parameters.
    pub fn grid_size(&self) -> usize {
        self.parameters.iter().map(|p| p.values.len()).product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TuneError;

    fn sample_space() -> SearchSpace {
        SearchSpace::new()
            .add_index(
                "chunk_size",
                vec![ParamValue::Int(256), ParamValue::Int(512), ParamValue::Int(1024)],
            )
            .unwrap()
            .add_eval("top_k", vec![ParamValue::Int(2), ParamValue::Int(4)])
            .unwrap()
            .add_shared(
                EMBED_MODEL_PARAM,
                vec![ParamValue::Model(EmbedModel::new(
                    "huggingface",
                    "all-MiniLM-L6-v2",
                ))],
            )
            .unwrap()
    }

    #[test]
    fn baseline_picks_middle_candidate() {
        let space = SearchSpace::new()
            .add_index(
                "a",
                vec![ParamValue::Int(1), ParamValue::Int(2), ParamValue::Int(3)],
            )
            .unwrap()
            .add_eval("b", vec![ParamValue::Int(10), ParamValue::Int(20)])
            .unwrap();

        let baseline = space.baseline();
        assert_eq!(baseline["a"], ParamValue::Int(2));
        // Even-length list defaults to the lower middle.
        assert_eq!(baseline["b"], ParamValue::Int(10));
    }

    #[test]
    fn empty_candidate_list_rejected() {
        let result = SearchSpace::new().add_index("chunk_size", vec![]);
        match result {
            Err(TuneError::SearchSpace(SearchSpaceError::EmptyValues { param })) => {
                assert_eq!(param, "chunk_size");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn duplicate_name_rejected_across_scopes() {
        let result = SearchSpace::new()
            .add_index("top_k", vec![ParamValue::Int(2)])
            .unwrap()
            .add_eval("top_k", vec![ParamValue::Int(4)]);
        match result {
            Err(TuneError::SearchSpace(SearchSpaceError::DuplicateParam { param })) => {
                assert_eq!(param, "top_k");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn grid_size_is_product_of_candidates() {
        assert_eq!(sample_space().grid_size(), 6);
    }

    #[test]
    fn declaration_order_preserved() {
        let space = sample_space();
        let names: Vec<&str> = space.params().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["chunk_size", "top_k", EMBED_MODEL_PARAM]);
        assert_eq!(space.get("top_k").unwrap().scope, ParamScope::Eval);
    }

    #[test]
    fn param_value_serialization_round_trip() {
        let model = ParamValue::Model(EmbedModel::new("openai", "text-embedding-3-small"));
        let json = serde_json::to_string(&model).unwrap();
        let back: ParamValue = serde_json::from_str(&json).unwrap();
        assert_eq!(model, back);

        let int: ParamValue = serde_json::from_str("512").unwrap();
        assert_eq!(int, ParamValue::Int(512));
    }
}
