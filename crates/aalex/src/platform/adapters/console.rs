use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use super::{Speaker, Transcriber};
use crate::error::CoreResult;
use crate::platform::types::Transcription;

/// Prints each response line to stdout, prefixed with the assistant name.
#[derive(Debug, Clone)]
pub struct ConsoleSpeaker {
    name: String,
}

impl ConsoleSpeaker {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn format_lines(&self, text: &str) -> Vec<String> {
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| format!("{}: {}", self.name, line))
            .collect()
    }
}

#[async_trait]
impl Speaker for ConsoleSpeaker {
    async fn speak(&self, text: &str) -> CoreResult<()> {
        for line in self.format_lines(text) {
            println!("{line}");
        }
        Ok(())
    }
}

/// Reads typed commands from stdin, one per line.
pub struct StdinTranscriber {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl StdinTranscriber {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for StdinTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transcriber for StdinTranscriber {
    async fn transcribe(&self) -> Transcription {
        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => Transcription::Silence,
            Ok(Some(line)) => Transcription::Heard(line),
            Ok(None) => Transcription::Closed,
            Err(error) => Transcription::Failed(format!("failed to read stdin: {error}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_every_non_empty_line() {
        let speaker = ConsoleSpeaker::new("Aalex");
        let lines = speaker.format_lines("Running suit diagnostics.\n\nHUD: Operational");
        assert_eq!(
            lines,
            vec![
                "Aalex: Running suit diagnostics.".to_string(),
                "Aalex: HUD: Operational".to_string()
            ]
        );
    }
}
