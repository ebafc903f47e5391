//! Index and eval pipeline builders.
//!
//! Pure functions: fixed settings plus one trial's stage config in, a
//! `PipelineSpec` out. Called once per trial per stage by the controller.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

use rt_types::{EvalConfig, IndexConfig, TuneResult, EMBED_MODEL_PARAM, EMBED_PROVIDER_FIELD};

use crate::spec::{ComponentOp, PipelineSpec};

/// Name of the indexing pipeline; fixed so its artifact runs are discoverable.
pub const INGESTION_PIPELINE: &str = "ingestion-pipeline";
/// Name of the evaluation pipeline.
pub const EVALUATION_PIPELINE: &str = "evaluation-pipeline";
/// Component whose output rows carry the aggregated metric scores.
pub const AGGREGATE_COMPONENT: &str = "aggregate_eval_results";

/// Fixed arguments of the indexing pipeline, constant across trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Artifact base path shared by all pipelines.
    pub base_path: PathBuf,
    pub weaviate_url: String,
    /// Hugging Face dataset to ingest.
    pub dataset_name: String,
    /// Source column mapped onto the pipeline's `text` field.
    pub column_name: String,
    pub n_rows_to_load: i64,
}

/// Fixed arguments of the evaluation pipeline, constant across trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalSettings {
    pub base_path: PathBuf,
    pub weaviate_url: String,
    /// CSV dataset of evaluation questions.
    pub dataset_uri: String,
    pub column_separator: String,
    /// Question column mapped onto the pipeline's `text` field.
    pub question_column: String,
    /// Judge model for the retrieval metrics.
    pub llm_name: String,
    pub llm_kwargs: Value,
    /// Metric names the evaluation component computes.
    pub metrics: Vec<String>,
}

fn registry_image(name: &str) -> String {
    format!("fndnt/{name}:latest")
}

fn column_mapping(source: &str) -> Value {
    let mut mapping = Map::new();
    mapping.insert(source.to_string(), Value::from("text"));
    Value::Object(mapping)
}

/// Build the indexing pipeline for one trial: load, chunk, embed, index.
pub fn build_index_pipeline(
    settings: &IndexSettings,
    config: &IndexConfig,
) -> TuneResult<PipelineSpec> {
    let mut spec = PipelineSpec::new(
        INGESTION_PIPELINE,
        "Pipeline to prepare and process data for building a RAG solution",
        settings.base_path.clone(),
    );

    spec.add_op(
        ComponentOp::new("load_from_hf_hub", registry_image("load_from_hf_hub"))
            .with_arg("dataset_name", settings.dataset_name.as_str())
            .with_arg("column_name_mapping", column_mapping(&settings.column_name))
            .with_arg("n_rows_to_load", settings.n_rows_to_load),
    )?;

    spec.add_op(
        ComponentOp::new("chunk_text", registry_image("chunk_text"))
            .with_arg("chunk_size", config.require("chunk_size")?.to_json()?)
            .with_arg("chunk_overlap", config.require("chunk_overlap")?.to_json()?)
            .depends_on("load_from_hf_hub"),
    )?;

    spec.add_op(
        ComponentOp::new("embed_text", registry_image("embed_text"))
            .with_arg(
                "model_provider",
                config.require(EMBED_PROVIDER_FIELD)?.to_json()?,
            )
            .with_arg("model", config.require(EMBED_MODEL_PARAM)?.to_json()?)
            .depends_on("chunk_text"),
    )?;

    spec.add_op(
        ComponentOp::new("index_weaviate", registry_image("index_weaviate"))
            .with_arg("weaviate_url", settings.weaviate_url.as_str())
            .with_arg("class_name", config.class_name.as_str())
            .depends_on("embed_text"),
    )?;

    Ok(spec)
}

/// Build the evaluation pipeline for one trial: load questions, embed,
/// retrieve, judge, aggregate.
pub fn build_eval_pipeline(
    settings: &EvalSettings,
    config: &EvalConfig,
) -> TuneResult<PipelineSpec> {
    let mut spec = PipelineSpec::new(
        EVALUATION_PIPELINE,
        "Pipeline to evaluate a RAG solution",
        settings.base_path.clone(),
    );

    spec.add_op(
        ComponentOp::new("load_from_csv", registry_image("load_from_csv"))
            .with_arg("dataset_uri", settings.dataset_uri.as_str())
            .with_arg("column_separator", settings.column_separator.as_str())
            .with_arg(
                "column_name_mapping",
                column_mapping(&settings.question_column),
            ),
    )?;

    spec.add_op(
        ComponentOp::new("embed_text", registry_image("embed_text"))
            .with_arg(
                "model_provider",
                config.require(EMBED_PROVIDER_FIELD)?.to_json()?,
            )
            .with_arg("model", config.require(EMBED_MODEL_PARAM)?.to_json()?)
            .depends_on("load_from_csv"),
    )?;

    spec.add_op(
        ComponentOp::new(
            "retrieve_from_weaviate",
            registry_image("retrieve_from_weaviate"),
        )
        .with_arg("weaviate_url", settings.weaviate_url.as_str())
        .with_arg("class_name", config.class_name.as_str())
        .with_arg("top_k", config.require("top_k")?.to_json()?)
        .depends_on("embed_text"),
    )?;

    spec.add_op(
        ComponentOp::new("retriever_eval", registry_image("retriever_eval"))
            .with_arg("llm_name", settings.llm_name.as_str())
            .with_arg("llm_kwargs", settings.llm_kwargs.clone())
            .with_arg("metrics", settings.metrics.clone())
            .depends_on("retrieve_from_weaviate"),
    )?;

    spec.add_op(
        ComponentOp::new(AGGREGATE_COMPONENT, registry_image(AGGREGATE_COMPONENT))
            .depends_on("retriever_eval"),
    )?;

    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rt_types::ParamValue;
    use serde_json::json;
    use std::collections::HashMap;

    fn index_settings() -> IndexSettings {
        IndexSettings {
            base_path: PathBuf::from("/tmp/data-dir"),
            weaviate_url: "http://localhost:8080".to_string(),
            dataset_name: "wikitext".to_string(),
            column_name: "text_data".to_string(),
            n_rows_to_load: 1000,
        }
    }

    fn eval_settings() -> EvalSettings {
        EvalSettings {
            base_path: PathBuf::from("/tmp/data-dir"),
            weaviate_url: "http://localhost:8080".to_string(),
            dataset_uri: "/data/eval_questions.csv".to_string(),
            column_separator: ";".to_string(),
            question_column: "question".to_string(),
            llm_name: "gpt-3.5-turbo".to_string(),
            llm_kwargs: json!({"temperature": 0.0}),
            metrics: vec![
                "context_precision".to_string(),
                "context_relevancy".to_string(),
            ],
        }
    }

    fn index_config() -> IndexConfig {
        let mut params = HashMap::new();
        params.insert("chunk_size".to_string(), ParamValue::Int(512));
        params.insert("chunk_overlap".to_string(), ParamValue::Int(32));
        params.insert(
            EMBED_PROVIDER_FIELD.to_string(),
            ParamValue::Text("huggingface".to_string()),
        );
        params.insert(
            EMBED_MODEL_PARAM.to_string(),
            ParamValue::Text("all-MiniLM-L6-v2".to_string()),
        );
        IndexConfig {
            class_name: "Run0".to_string(),
            params,
        }
    }

    fn eval_config() -> EvalConfig {
        let mut params = HashMap::new();
        params.insert("top_k".to_string(), ParamValue::Int(4));
        params.insert(
            EMBED_PROVIDER_FIELD.to_string(),
            ParamValue::Text("huggingface".to_string()),
        );
        params.insert(
            EMBED_MODEL_PARAM.to_string(),
            ParamValue::Text("all-MiniLM-L6-v2".to_string()),
        );
        EvalConfig {
            class_name: "Run0".to_string(),
            params,
        }
    }

    #[test]
    fn index_pipeline_chains_four_ops() {
        let spec = build_index_pipeline(&index_settings(), &index_config()).unwrap();
        assert_eq!(spec.name, INGESTION_PIPELINE);

        let names: Vec<&str> = spec.ops.iter().map(|op| op.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["load_from_hf_hub", "chunk_text", "embed_text", "index_weaviate"]
        );

        let chunk = &spec.ops[1];
        assert_eq!(chunk.arguments["chunk_size"], json!(512));
        assert_eq!(chunk.arguments["chunk_overlap"], json!(32));

        let index = &spec.ops[3];
        assert_eq!(index.arguments["class_name"], json!("Run0"));
        assert_eq!(index.dependencies, vec!["embed_text"]);
    }

    #[test]
    fn eval_pipeline_chains_five_ops() {
        let spec = build_eval_pipeline(&eval_settings(), &eval_config()).unwrap();
        assert_eq!(spec.name, EVALUATION_PIPELINE);

        let names: Vec<&str> = spec.ops.iter().map(|op| op.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "load_from_csv",
                "embed_text",
                "retrieve_from_weaviate",
                "retriever_eval",
                AGGREGATE_COMPONENT
            ]
        );

        let retrieve = &spec.ops[2];
        assert_eq!(retrieve.arguments["top_k"], json!(4));
        assert_eq!(retrieve.arguments["class_name"], json!("Run0"));

        let judge = &spec.ops[3];
        assert_eq!(
            judge.arguments["metrics"],
            json!(["context_precision", "context_relevancy"])
        );
    }

    #[test]
    fn embed_model_fields_reach_both_pipelines() {
        let index = build_index_pipeline(&index_settings(), &index_config()).unwrap();
        let eval = build_eval_pipeline(&eval_settings(), &eval_config()).unwrap();

        for spec in [&index, &eval] {
            let embed = spec.ops.iter().find(|op| op.name == "embed_text").unwrap();
            assert_eq!(embed.arguments["model_provider"], json!("huggingface"));
            assert_eq!(embed.arguments["model"], json!("all-MiniLM-L6-v2"));
        }
    }

    #[test]
    fn missing_dynamic_parameter_is_fatal() {
        let mut config = index_config();
        config.params.remove("chunk_size");
        assert!(build_index_pipeline(&index_settings(), &config).is_err());
    }
}
