use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::command::{ActionKind, CommandDefinition};
use crate::error::{CoreError, CoreResult};

/// On-disk shape of one custom command, keyed by name in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCommand {
    pub triggers: Vec<String>,
    pub action: ActionKind,
    #[serde(default)]
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl StoredCommand {
    fn from_definition(definition: &CommandDefinition) -> Self {
        Self {
            triggers: definition.trigger_phrases.clone(),
            action: definition.action,
            response: definition.response_template.clone(),
            payload: definition.custom_payload.clone(),
        }
    }

    fn into_definition(self, name: &str) -> CommandDefinition {
        CommandDefinition {
            name: name.to_string(),
            trigger_phrases: self.triggers,
            action: self.action,
            response_template: self.response,
            custom_payload: self.payload,
        }
    }
}

/// An entry skipped while loading.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadWarning {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Valid definitions in file order.
    pub commands: Vec<CommandDefinition>,
    pub warnings: Vec<LoadWarning>,
}

/// JSON file holding every custom command.
#[derive(Debug, Clone)]
pub struct CustomCommandStore {
    path: PathBuf,
}

impl CustomCommandStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file, skipping entries that fail to parse or validate.
    ///
    /// A missing file loads as empty. A file that is not a JSON object is
    /// an error and nothing is loaded from it.
    pub fn load(&self) -> CoreResult<LoadReport> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LoadReport::default())
            }
            Err(error) => {
                return Err(CoreError::Persistence(format!(
                    "failed to read {}: {error}",
                    self.path.display()
                )))
            }
        };
        let entries: Map<String, Value> = serde_json::from_slice(&bytes).map_err(|error| {
            CoreError::Persistence(format!(
                "{} is not a command object: {error}",
                self.path.display()
            ))
        })?;

        let mut report = LoadReport::default();
        for (name, value) in entries {
            match parse_entry(&name, value) {
                Ok(definition) => report.commands.push(definition),
                Err(reason) => {
                    tracing::warn!("skipping custom command {name}: {reason}");
                    report.warnings.push(LoadWarning { name, reason });
                }
            }
        }
        Ok(report)
    }

    /// Replace the file with the given definitions, in order.
    ///
    /// The new content is written to a sibling temp file and renamed over
    /// the target, so readers see either the old or the new file.
    pub fn save(&self, definitions: &[CommandDefinition]) -> CoreResult<()> {
        let mut entries = Map::new();
        for definition in definitions {
            let stored = serde_json::to_value(StoredCommand::from_definition(definition))
                .map_err(|error| {
                    CoreError::Internal(format!(
                        "failed to serialize command {}: {error}",
                        definition.name
                    ))
                })?;
            entries.insert(definition.name.clone(), stored);
        }
        let serialized = serde_json::to_vec_pretty(&Value::Object(entries))
            .map_err(|error| CoreError::Internal(format!("failed to serialize commands: {error}")))?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|error| {
            CoreError::Persistence(format!(
                "failed to create directory {}: {error}",
                parent.display()
            ))
        })?;

        let mut temp = NamedTempFile::new_in(&parent).map_err(|error| {
            CoreError::Persistence(format!(
                "failed to create temp file in {}: {error}",
                parent.display()
            ))
        })?;
        temp.write_all(&serialized)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|error| CoreError::Persistence(format!("failed to write commands: {error}")))?;
        temp.persist(&self.path).map_err(|error| {
            CoreError::Persistence(format!(
                "failed to replace {}: {}",
                self.path.display(),
                error.error
            ))
        })?;
        tracing::debug!(
            "saved {} custom commands to {}",
            definitions.len(),
            self.path.display()
        );
        Ok(())
    }
}

fn parse_entry(name: &str, value: Value) -> Result<CommandDefinition, String> {
    let stored: StoredCommand = serde_json::from_value(value).map_err(|error| error.to_string())?;
    let definition = stored.into_definition(name);
    definition.validate().map_err(|error| error.to_string())?;
    Ok(definition)
}
