//! Interactive text session: reads questions, prints SQL, rows and summaries.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use sqlchat_chat::{ChatError, ChatOrchestrator, Conversation, TurnOutcome};

pub const GREETING: &str = "Hi, I'm your SQL assistant! Ask me anything about the shopping dataset.";
pub const PROMPT: &str = "Ask a question: ";
pub const FAREWELL: &str = "Session closed. Have a great day!";
const BLOCKED: &str = "Blocked: This query could modify data. Only SELECT queries are allowed.";
const NO_QUERY: &str = "I couldn't generate a valid SQL query for that question.";

/// `true` if the line ends the session.
pub fn is_exit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("exit")
}

/// Text shown to the user for a completed turn.
pub fn render_outcome(outcome: &TurnOutcome) -> String {
    match outcome {
        TurnOutcome::Answered {
            sql,
            result,
            summary,
        } => {
            let summary = match summary {
                Ok(text) | Err(text) => text,
            };
            format!(
                "Generated SQL:\n{}\n\nQuery Output:\n{}\n\nAnswer Summary:\n{}",
                sql,
                result.to_pretty_json(),
                summary
            )
        }
        TurnOutcome::Refused { sql, .. } => format!("Generated SQL:\n{}\n\n{}", sql, BLOCKED),
        TurnOutcome::NoQuery => NO_QUERY.to_string(),
    }
}

/// Text shown to the user for a failed turn.
pub fn render_error(error: &ChatError) -> String {
    match error {
        ChatError::EmptyMessage => "Please type a question.".to_string(),
        ChatError::MessageTooLong(max) => {
            format!("Questions are limited to {} characters.", max)
        }
        ChatError::Generation { status, body } => {
            format!("{}\nGeneration Error ({}): {}", NO_QUERY, status, body)
        }
        ChatError::Transport(e) => format!("{}\nGeneration Error: {}", NO_QUERY, e),
        ChatError::MalformedResponse(reason) => {
            format!("{}\nGeneration Error: {}", NO_QUERY, reason)
        }
        ChatError::Execution(e) => format!("Query failed: {}", e),
        ChatError::Prompt(_) => NO_QUERY.to_string(),
    }
}

/// Run one question and return what should be printed.
pub async fn answer(
    orchestrator: &ChatOrchestrator,
    conversation: &mut Conversation,
    question: &str,
) -> String {
    match orchestrator.handle_turn(conversation, question).await {
        Ok(outcome) => render_outcome(&outcome),
        Err(e) => {
            tracing::warn!(error = %e, "Turn failed");
            render_error(&e)
        }
    }
}

/// Read questions from `input` until `exit` or end of input.
pub async fn run<R, W>(
    orchestrator: &ChatOrchestrator,
    input: R,
    out: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut conversation = orchestrator.new_conversation();
    tracing::info!(conversation = %conversation.id, "Session started");

    writeln!(out, "{}", GREETING)?;
    let mut lines = input.lines();
    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        if is_exit_command(&line) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let text = answer(orchestrator, &mut conversation, &line).await;
        writeln!(out, "\n{}\n", text)?;
    }

    writeln!(out, "{}", FAREWELL)?;
    tracing::info!(turns = conversation.turn_count(), "Session closed");
    Ok(())
}
