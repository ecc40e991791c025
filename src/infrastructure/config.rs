use crate::domain::catalog::{AttributeElement, Catalog, CatalogDateDataset, Insight};
use crate::domain::dashboard::DashboardSettings;
use crate::domain::refs::ObjRef;
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: EngineSettings,
    pub backend: BackendSettings,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EngineSettings {
    /// Used for dashboards that do not carry their own settings.
    #[serde(default)]
    pub default_settings: DashboardSettings,
    /// Session script executed by the binary when no path is given.
    #[serde(default = "default_session_script")]
    pub session_script: String,
}

fn default_session_script() -> String {
    "config/session.toml".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    pub fixture: String,
    /// Simulated latency of every collaborator call.
    #[serde(default)]
    pub latency_ms: u64,
}

impl BackendSettings {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// Date datasets the backend relates to an insight or measure.
#[derive(Debug, Deserialize, Clone)]
pub struct RelatedDateDatasets {
    pub target: ObjRef,
    #[serde(default)]
    pub data_sets: Vec<CatalogDateDataset>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayFormElements {
    pub display_form: ObjRef,
    #[serde(default)]
    pub items: Vec<AttributeElement>,
}

/// One row of fact data: element uris that occur together and the measures with values for them.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FactRow {
    #[serde(default)]
    pub elements: Vec<String>,
    #[serde(default)]
    pub measures: Vec<ObjRef>,
}

/// Backend contents served by the in-memory backend.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BackendFixture {
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub insights: Vec<Insight>,
    #[serde(default)]
    pub related_date_datasets: Vec<RelatedDateDatasets>,
    #[serde(default)]
    pub elements: Vec<DisplayFormElements>,
    /// Used to answer element queries limited by other filters or by measures.
    #[serde(default)]
    pub rows: Vec<FactRow>,
}

pub fn load_engine_config() -> anyhow::Result<EngineConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/engine"))
        .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_backend_fixture(path: &str) -> anyhow::Result<BackendFixture> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path))
        .build()
        .with_context(|| format!("Failed to read backend fixture {}", path))?;

    settings
        .try_deserialize()
        .with_context(|| format!("Failed to parse backend fixture {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_parses_catalog_and_insights() {
        let fixture: BackendFixture = toml::from_str(
            r#"
            [[catalog.date_datasets]]
            relevance = 2
            data_set = { identifier = "created", uri = "/obj/10", title = "Date (Created)" }

            [[insights]]
            identifier = "pipeline"
            uri = "/obj/20"
            title = "Pipeline"

            [[related_date_datasets]]
            target = { identifier = "pipeline" }
            data_sets = [{ relevance = 1, data_set = { identifier = "created", uri = "/obj/10" } }]
            "#,
        )
        .unwrap();

        assert_eq!(fixture.catalog.date_datasets.len(), 1);
        assert_eq!(fixture.insights[0].meta.title, "Pipeline");
        assert_eq!(fixture.related_date_datasets[0].data_sets[0].relevance, 1);
        assert!(fixture.elements.is_empty());
    }

    #[test]
    fn test_backend_latency_defaults_to_zero() {
        let settings: BackendSettings = toml::from_str(r#"fixture = "config/backend""#).unwrap();
        assert_eq!(settings.latency(), Duration::ZERO);
    }

    #[test]
    fn test_shipped_backend_fixture_loads() {
        let fixture = load_backend_fixture("config/backend").unwrap();
        assert_eq!(fixture.catalog.attributes.len(), 2);
        assert_eq!(fixture.insights[0].filters.len(), 1);
        assert_eq!(fixture.elements[1].items.len(), 7);
        assert_eq!(fixture.rows.len(), 5);
        assert!(fixture.rows[4].measures.is_empty());
    }
}
