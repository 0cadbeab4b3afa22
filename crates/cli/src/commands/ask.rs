//! Ask command handler.
//!
//! Binds a pipeline to the corpus, answers one question and prints it.

use clap::Args;
use ragcrew_core::{config::AppConfig, AppError, AppResult};
use ragcrew_pipeline::{ConfigPipelineFactory, ConversationEntry, HallucinationVerdict, Session};
use std::path::PathBuf;
use std::sync::Arc;

/// Ask one question and print the answer
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Document corpus (file or directory); defaults to the configured corpus
    #[arg(long, env = "RAGCREW_CORPUS")]
    pub corpus: Option<PathBuf>,

    /// Output the conversation entry as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self
            .get_question()?
            .ok_or_else(|| AppError::Config("No question provided".to_string()))?;

        config.validate()?;

        let corpus = self
            .corpus
            .clone()
            .unwrap_or_else(|| config.corpus_path.clone());

        let mut session = Session::new(Arc::new(ConfigPipelineFactory::new(config.clone())));
        session.initialize(&corpus).await?;

        let entry = session.submit(&question).await?;
        print_entry(&entry, self.json)?;

        if entry.error_flag {
            tracing::warn!("Question was answered with an error: {:?}", entry.error_kind);
        }

        Ok(())
    }

    /// Get the question from the argument or the file.
    fn get_question(&self) -> AppResult<Option<String>> {
        if let Some(ref q) = self.question {
            return Ok(Some(q.trim().to_string()).filter(|q| !q.is_empty()));
        }

        match self.file {
            Some(ref path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    AppError::Config(format!("Failed to read question file {:?}: {}", path, e))
                })?;
                Ok(Some(text.trim().to_string()).filter(|q| !q.is_empty()))
            }
            None => Ok(None),
        }
    }
}

fn print_entry(entry: &ConversationEntry, json: bool) -> AppResult<()> {
    if json {
        let output = serde_json::to_string_pretty(entry)?;
        println!("{}", output);
        return Ok(());
    }

    print!("{}", render_entry(entry));

    tracing::debug!(
        "Answered in {:.2}s (route: {:?})",
        entry.processing_time,
        entry.route
    );

    Ok(())
}

/// Plain-text form: the answer, then any caveats and sources.
fn render_entry(entry: &ConversationEntry) -> String {
    let mut out = format!("{}\n", entry.answer);

    let mut notes = Vec::new();
    if entry.verdict == Some(HallucinationVerdict::Ungrounded) {
        notes.push("the answer could not be fully grounded in the retrieved context".to_string());
    }
    notes.extend(
        entry
            .degradations
            .iter()
            .map(|d| format!("{}: {}", d.kind, d.message)),
    );

    if !notes.is_empty() {
        out.push_str("\nNotes:\n");
        for note in notes {
            out.push_str(&format!("  ! {}\n", note));
        }
    }

    if !entry.sources.is_empty() {
        out.push_str("\nSources:\n");
        for source in &entry.sources {
            out.push_str(&format!("  - {}\n", source));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn command(question: Option<&str>, file: Option<PathBuf>) -> AskCommand {
        AskCommand {
            question: question.map(str::to_string),
            file,
            corpus: None,
            json: false,
        }
    }

    #[test]
    fn test_question_from_argument() {
        let cmd = command(Some("  What is attention?  "), None);
        assert_eq!(cmd.get_question().unwrap().as_deref(), Some("What is attention?"));
    }

    #[test]
    fn test_question_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "What is positional encoding?").unwrap();

        let cmd = command(None, Some(file.path().to_path_buf()));
        assert_eq!(
            cmd.get_question().unwrap().as_deref(),
            Some("What is positional encoding?")
        );
    }

    #[test]
    fn test_blank_question_is_none() {
        assert!(command(Some("   "), None).get_question().unwrap().is_none());
        assert!(command(None, None).get_question().unwrap().is_none());
    }

    #[test]
    fn test_missing_question_file() {
        let cmd = command(None, Some(PathBuf::from("/nonexistent/question.txt")));
        assert!(cmd.get_question().is_err());
    }

    fn entry(extra: serde_json::Value) -> ConversationEntry {
        let mut base = serde_json::json!({
            "query": "Who won yesterday?",
            "answer": "Nobody knows.",
            "processing_time": 0.5,
            "timestamp": "2026-01-01T00:00:00Z",
            "error_flag": false,
            "route": "web_search"
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn test_render_plain_answer() {
        let text = render_entry(&entry(serde_json::json!({ "verdict": "grounded" })));
        assert_eq!(text, "Nobody knows.\n");
    }

    #[test]
    fn test_render_shows_degradations_and_verdict() {
        let text = render_entry(&entry(serde_json::json!({
            "verdict": "ungrounded",
            "degradations": [
                { "kind": "RoutingError", "message": "Unrecognised route decision: \"no idea\"" }
            ]
        })));

        assert!(text.starts_with("Nobody knows.\n"));
        assert!(text.contains("Notes:"));
        assert!(text.contains("could not be fully grounded"));
        assert!(text.contains("Unrecognised route decision"));
    }
}
