// Session scripts - the commands and element loads a session runs, read from TOML
use crate::application::command::{Command, CorrelationId};
use crate::domain::dashboard::DashboardDocument;
use crate::domain::refs::ObjRef;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionScript {
    /// Dashboard document file, initialized before any scripted command.
    #[serde(default)]
    pub dashboard: Option<String>,
    #[serde(default)]
    pub commands: Vec<ScriptedCommand>,
    #[serde(default)]
    pub element_loads: Vec<ElementLoad>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedCommand {
    #[serde(default)]
    pub correlation_id: Option<CorrelationId>,
    /// Dispatch together with the following concurrent commands instead of
    /// waiting for the previous outcome.
    #[serde(default)]
    pub concurrent: bool,
    #[serde(default)]
    pub cancel_after_ms: Option<u64>,
    #[serde(flatten)]
    pub command: Command,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementLoad {
    pub display_form: ObjRef,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

impl SessionScript {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("Failed to parse session script")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("In session script {}", path.display()))
    }

    /// The dashboard named by the script, resolved relative to `base`.
    pub fn load_dashboard(&self, base: &Path) -> anyhow::Result<Option<DashboardDocument>> {
        let Some(file) = &self.dashboard else {
            return Ok(None);
        };
        let path = base.join(file);
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read dashboard {}", path.display()))?;
        let dashboard = toml::from_str(&text)
            .with_context(|| format!("Failed to parse dashboard {}", path.display()))?;
        Ok(Some(dashboard))
    }

    /// Commands grouped into rounds; a round is dispatched at once and awaited together.
    pub fn rounds(&self) -> Vec<&[ScriptedCommand]> {
        let mut rounds = Vec::new();
        let mut start = 0;
        for (index, command) in self.commands.iter().enumerate() {
            let joins_next = command.concurrent
                && self
                    .commands
                    .get(index + 1)
                    .is_some_and(|next| next.concurrent);
            if !joins_next {
                rounds.push(&self.commands[start..=index]);
                start = index + 1;
            }
        }
        rounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::command::CommandKind;
    use crate::domain::layout::ItemDefinition;

    const SCRIPT: &str = r#"
        dashboard = "dashboard.toml"

        [[commands]]
        command = "addLayoutSection"
        correlation_id = "add-1"
        concurrent = true
        index = 0
        header = { title = "Pipeline" }

        [[commands.items]]
        size = { xl = { grid_width = 6 } }
        widget = { type = "insight", title = "Pipeline", insight = { identifier = "pipeline" } }

        [[commands]]
        command = "addLayoutSection"
        concurrent = true
        index = -1

        [[commands]]
        command = "undoLastChange"

        [[commands]]
        command = "changeDateFilterSelection"
        selection = { type = "relative", granularity = "quarter", from = -1, to = 0 }

        [[element_loads]]
        display_form = { identifier = "region.name" }
        search = "a"
        "#;

    #[test]
    fn test_script_parses_flattened_commands() {
        let script = SessionScript::parse(SCRIPT).unwrap();

        assert_eq!(script.dashboard.as_deref(), Some("dashboard.toml"));
        assert_eq!(script.commands.len(), 4);
        let first = &script.commands[0];
        assert_eq!(first.correlation_id, Some(CorrelationId::new("add-1")));
        assert_eq!(first.command.kind(), CommandKind::AddLayoutSection);
        match &first.command {
            Command::AddLayoutSection { index, items, .. } => {
                assert_eq!(*index, 0);
                assert!(matches!(items[0], ItemDefinition::Item(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(script.commands[2].command, Command::UndoLastChange);

        assert_eq!(script.element_loads[0].limit, 50);
        assert_eq!(script.element_loads[0].search.as_deref(), Some("a"));
    }

    #[test]
    fn test_concurrent_commands_share_a_round() {
        let script = SessionScript::parse(SCRIPT).unwrap();
        let sizes: Vec<usize> = script.rounds().iter().map(|round| round.len()).collect();
        assert_eq!(sizes, vec![2, 1, 1]);
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let error = SessionScript::parse(
            r#"
            [[commands]]
            command = "publishDashboard"
            "#,
        )
        .unwrap_err();
        assert!(format!("{:#}", error).contains("session script"));
    }

    #[test]
    fn test_shipped_session_and_dashboard_parse() {
        let script = SessionScript::load("config/session.toml").unwrap();
        let dashboard = script.load_dashboard(Path::new("config")).unwrap().unwrap();

        assert_eq!(dashboard.title, "Sales overview");
        assert_eq!(dashboard.layout.sections.len(), 2);
        assert_eq!(dashboard.filter_context.filters.len(), 3);
        assert_eq!(script.rounds()[0].len(), 2);
    }
}
