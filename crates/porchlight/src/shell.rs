// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `porchlight shell` command implementation.
//!
//! An interactive loop over the execution pipeline: one session for the
//! whole run, in-process conversation history, citations printed after
//! each answer. The pipeline records turns to the interaction log
//! fire-and-forget.

use porchlight_config::PorchlightConfig;
use porchlight_core::{PorchlightError, SourceCitation, Turn};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::wiring;

/// Runs the `porchlight shell` command.
pub async fn run_shell(config: PorchlightConfig) -> Result<(), PorchlightError> {
    let components = wiring::build(&config, true).await?;
    let session_id = format!("shell-{}", uuid::Uuid::new_v4());
    let mut history: Vec<Turn> = Vec::new();

    let mut editor = DefaultEditor::new()
        .map_err(|e| PorchlightError::Internal(format!("readline init failed: {e}")))?;

    println!("Porchlight community Q&A (type 'exit' to quit)\n");

    loop {
        let line = match editor.readline("porchlight> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                return Err(PorchlightError::Internal(format!("readline error: {e}")));
            }
        };

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "exit" | "quit" | ":q" | "q") {
            break;
        }
        let _ = editor.add_history_entry(question);

        match components
            .pipeline
            .handle_turn(&session_id, question, &history)
            .await
        {
            Ok(envelope) => {
                println!("\n{}\n", envelope.answer);
                if !envelope.sources.is_empty() {
                    println!("sources ({}):", envelope.mode);
                    for source in &envelope.sources {
                        println!("  - {}", render_citation(source));
                    }
                    println!();
                }
                history.push(Turn::user(question));
                history.push(Turn::assistant(envelope.answer.as_str()));
            }
            Err(e) => {
                eprintln!("error: {e}");
            }
        }
    }

    println!();
    Ok(())
}

fn render_citation(citation: &SourceCitation) -> String {
    match citation {
        SourceCitation::Sql { table } => format!("table {table}"),
        SourceCitation::Rag {
            source,
            doc_type: Some(doc_type),
        } => format!("{source} ({doc_type})"),
        SourceCitation::Rag {
            source,
            doc_type: None,
        } => source.clone(),
    }
}
