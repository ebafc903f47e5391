//! Declarative pipeline descriptions.
//!
//! A pipeline is an ordered list of component operations, each a container
//! image plus JSON arguments, chained by name-based dependencies. The
//! executor turns a spec into running containers; this crate only describes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

use rt_types::{config_error, TuneResult};

/// A single transform component inside a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentOp {
    pub name: String,
    pub image: String,
    pub arguments: Map<String, Value>,
    pub dependencies: Vec<String>,
}

impl ComponentOp {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            arguments: Map::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn depends_on(mut self, op_name: impl Into<String>) -> Self {
        self.dependencies.push(op_name.into());
        self
    }
}

/// A declarative pipeline: name, artifact base path, and ordered ops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub name: String,
    pub description: String,
    pub base_path: PathBuf,
    pub ops: Vec<ComponentOp>,
}

impl PipelineSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        base_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            base_path: base_path.into(),
            ops: Vec::new(),
        }
    }

    /// Append an op. Names must be unique and dependencies must reference
    /// previously added ops.
    pub fn add_op(&mut self, op: ComponentOp) -> TuneResult<()> {
        if self.ops.iter().any(|existing| existing.name == op.name) {
            return Err(config_error!(
                "duplicate component op '{}' in pipeline '{}'",
                op.name,
                self.name
            ));
        }
        for dependency in &op.dependencies {
            if !self.ops.iter().any(|existing| &existing.name == dependency) {
                return Err(config_error!(
                    "op '{}' depends on unknown op '{}'",
                    op.name,
                    dependency
                ));
            }
        }
        self.ops.push(op);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ops_keep_insertion_order() {
        let mut spec = PipelineSpec::new("test-pipeline", "", "/tmp/data");
        spec.add_op(ComponentOp::new("load", "fndnt/load:latest"))
            .unwrap();
        spec.add_op(
            ComponentOp::new("chunk", "fndnt/chunk:latest")
                .with_arg("chunk_size", 512)
                .depends_on("load"),
        )
        .unwrap();

        let names: Vec<&str> = spec.ops.iter().map(|op| op.name.as_str()).collect();
        assert_eq!(names, vec!["load", "chunk"]);
        assert_eq!(spec.ops[1].arguments["chunk_size"], 512);
    }

    #[test]
    fn duplicate_op_rejected() {
        let mut spec = PipelineSpec::new("test-pipeline", "", "/tmp/data");
        spec.add_op(ComponentOp::new("load", "fndnt/load:latest"))
            .unwrap();
        assert!(spec
            .add_op(ComponentOp::new("load", "fndnt/load:latest"))
            .is_err());
    }

    #[test]
    fn unknown_dependency_rejected() {
        let mut spec = PipelineSpec::new("test-pipeline", "", "/tmp/data");
        assert!(spec
            .add_op(ComponentOp::new("chunk", "fndnt/chunk:latest").depends_on("load"))
            .is_err());
    }
}
