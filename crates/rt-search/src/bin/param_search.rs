use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use rt_artifacts::ArtifactRepository;
use rt_pipeline::{DockerComposeRunner, EvalSettings, IndexSettings, WeaviateAdmin};
use rt_search::{GridSearch, ProgressiveSearch, SearchController, SearchSettings, SearchStrategy};
use rt_types::{ParamScope, ParamValue, SearchSpace};

/// One search-space entry in the settings file. Entries are a list so their
/// declaration order survives deserialization.
#[derive(Debug, Deserialize)]
struct SpaceEntry {
    name: String,
    scope: ParamScope,
    values: Vec<ParamValue>,
}

#[derive(Debug, Deserialize)]
struct Settings {
    strategy: String,
    objective_metric: String,
    index: IndexSettings,
    eval: EvalSettings,
    search_space: Vec<SpaceEntry>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings_path =
        std::env::var("RAGTUNE_SETTINGS").unwrap_or_else(|_| "ragtune.json".to_string());
    let raw = std::fs::read_to_string(&settings_path)?;
    let settings: Settings = serde_json::from_str(&raw)?;

    let mut space = SearchSpace::new();
    for entry in &settings.search_space {
        space = match entry.scope {
            ParamScope::Index => space.add_index(entry.name.clone(), entry.values.clone())?,
            ParamScope::Eval => space.add_eval(entry.name.clone(), entry.values.clone())?,
            ParamScope::Shared => space.add_shared(entry.name.clone(), entry.values.clone())?,
        };
    }

    let strategy: Box<dyn SearchStrategy> = match settings.strategy.as_str() {
        "grid" => Box::new(GridSearch::new(space.clone())),
        "progressive" => Box::new(ProgressiveSearch::new(
            space.clone(),
            settings.objective_metric.clone(),
        )),
        other => anyhow::bail!("unknown search strategy '{other}'"),
    };

    let base_path = settings.index.base_path.clone();
    let weaviate_url = settings.index.weaviate_url.clone();
    let mut controller = SearchController::new(
        space,
        SearchSettings {
            objective_metric: settings.objective_metric,
            index: settings.index,
            eval: settings.eval,
        },
        strategy,
        Box::new(DockerComposeRunner::new(&base_path)),
        Box::new(WeaviateAdmin::new(weaviate_url)),
        ArtifactRepository::new(&base_path),
    );

    let report = controller.run().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
