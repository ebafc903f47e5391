//! Compilation of a pipeline spec into a docker-compose document.

use serde::Serialize;
use std::collections::BTreeMap;

use rt_types::TuneResult;

use crate::spec::PipelineSpec;

/// Where the artifact base path is mounted inside each component container.
const DATA_MOUNT: &str = "/data";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposeFile {
    pub version: String,
    pub services: BTreeMap<String, ComposeService>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposeService {
    pub image: String,
    pub command: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub depends_on: BTreeMap<String, DependsOn>,
    pub volumes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependsOn {
    pub condition: String,
}

impl ComposeFile {
    pub fn to_yaml(&self) -> TuneResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Translate a spec into one compose service per op. Dependencies become
/// `service_completed_successfully` conditions so the ops run as a chain.
pub fn compile(spec: &PipelineSpec) -> TuneResult<ComposeFile> {
    let mount = format!("{}:{}", spec.base_path.display(), DATA_MOUNT);

    let mut services = BTreeMap::new();
    for op in &spec.ops {
        let arguments = serde_json::to_string(&op.arguments)?;
        let service = ComposeService {
            image: op.image.clone(),
            command: vec![
                "--pipeline-name".to_string(),
                spec.name.clone(),
                "--component".to_string(),
                op.name.clone(),
                "--arguments".to_string(),
                arguments,
                "--base-path".to_string(),
                DATA_MOUNT.to_string(),
            ],
            depends_on: op
                .dependencies
                .iter()
                .map(|dependency| {
                    (
                        dependency.clone(),
                        DependsOn {
                            condition: "service_completed_successfully".to_string(),
                        },
                    )
                })
                .collect(),
            volumes: vec![mount.clone()],
        };
        services.insert(op.name.clone(), service);
    }

    Ok(ComposeFile {
        version: "3.8".to_string(),
        services,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ComponentOp;

    fn two_op_spec() -> PipelineSpec {
        let mut spec = PipelineSpec::new("test-pipeline", "", "/tmp/data-dir");
        spec.add_op(ComponentOp::new("load", "fndnt/load:latest").with_arg("n_rows_to_load", 10))
            .unwrap();
        spec.add_op(
            ComponentOp::new("chunk", "fndnt/chunk:latest")
                .with_arg("chunk_size", 512)
                .depends_on("load"),
        )
        .unwrap();
        spec
    }

    #[test]
    fn one_service_per_op() {
        let compose = compile(&two_op_spec()).unwrap();
        assert_eq!(compose.services.len(), 2);

        let chunk = &compose.services["chunk"];
        assert_eq!(chunk.image, "fndnt/chunk:latest");
        assert_eq!(
            chunk.depends_on["load"].condition,
            "service_completed_successfully"
        );
        assert_eq!(chunk.volumes, vec!["/tmp/data-dir:/data"]);
    }

    #[test]
    fn arguments_encoded_as_json() {
        let compose = compile(&two_op_spec()).unwrap();
        let load = &compose.services["load"];
        let arguments_position = load
            .command
            .iter()
            .position(|arg| arg == "--arguments")
            .unwrap();
        let encoded = &load.command[arguments_position + 1];
        let decoded: serde_json::Value = serde_json::from_str(encoded).unwrap();
        assert_eq!(decoded["n_rows_to_load"], 10);
    }

    #[test]
    fn yaml_output_names_services() {
        let yaml = compile(&two_op_spec()).unwrap().to_yaml().unwrap();
        assert!(yaml.contains("services:"));
        assert!(yaml.contains("chunk:"));
        assert!(yaml.contains("service_completed_successfully"));
    }
}
