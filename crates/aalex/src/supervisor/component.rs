use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

/// A launchable satellite component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Extra words that name this component in spoken commands.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl ComponentSpec {
    pub fn new(id: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            program: program.into(),
            args,
            working_dir: None,
            aliases: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|alias| alias.to_string()).collect();
        self
    }

    /// Whether lowercased text names this component by id or alias.
    pub fn is_named_in(&self, lowered: &str) -> bool {
        lowered
            .split(|c: char| !c.is_alphanumeric() && c != '_' && c != '-')
            .any(|word| {
                word == self.id.to_lowercase()
                    || self.aliases.iter().any(|alias| word == alias.to_lowercase())
            })
    }

    pub(crate) fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).stdin(Stdio::null());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command
    }
}

/// The catalog the launcher ships with.
pub fn default_components() -> Vec<ComponentSpec> {
    vec![
        ComponentSpec::new("voice", "python3", vec!["aalex.py".to_string()])
            .with_description("Core voice recognition and system control"),
        ComponentSpec::new("overlay", "python3", vec!["aalex_gui.py".to_string()])
            .with_description("Overlay with notes and code snippets")
            .with_aliases(&["gui", "panel"]),
        ComponentSpec::new("browser", "python3", vec!["aalex_browser.py".to_string()])
            .with_description("Integrated browser for social media and AI tools"),
    ]
}
