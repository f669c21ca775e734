use crate::output::OutputWriter;
use serde::Serialize;

/// Represents a planned action in dry-run mode
#[derive(Debug, Clone, Serialize)]
pub struct PlannedAction {
    pub action_type: ActionType,
    pub description: String,
    pub details: Vec<String>,
}

/// Types of actions that can be planned
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    LaunchProcess,
    CreateDirectory,
    CreateFile,
}

impl PlannedAction {
    /// Create a new planned action
    pub fn new(action_type: ActionType, description: impl Into<String>) -> Self {
        Self {
            action_type,
            description: description.into(),
            details: Vec::new(),
        }
    }

    /// Add a detail to the planned action
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }
}

/// Display planned actions in dry-run mode
pub fn display_planned_actions(output: &OutputWriter, actions: &[PlannedAction]) -> anyhow::Result<()> {
    if output.is_json() {
        output.result(serde_json::json!({
            "dry_run": true,
            "planned_actions": actions,
        }))?;
    } else {
        output.section("Planned Actions (Dry Run)");
        for (i, action) in actions.iter().enumerate() {
            output.info(format!("{}. {:?}: {}", i + 1, action.action_type, action.description));
            for detail in &action.details {
                output.info(format!("   - {}", detail));
            }
        }
        output.info("\nNothing was launched. Run without --dry-run to execute these actions.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planned_action_creation() {
        let action = PlannedAction::new(ActionType::LaunchProcess, "Run timesift for mt_baker")
            .with_detail("Output: output/mt_baker")
            .with_detail("Command: timesift --output-path output/mt_baker");

        assert_eq!(action.description, "Run timesift for mt_baker");
        assert_eq!(action.details.len(), 2);
    }

    #[test]
    fn test_action_type_serialization() {
        let action = PlannedAction::new(ActionType::LaunchProcess, "Launch");
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("launch_process"));
    }
}
