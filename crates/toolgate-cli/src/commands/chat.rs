use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use toolgate_agent::{AgentError, AgentResponse, Session};
use toolgate_core::Config;
use tracing::warn;

use super::{create_agent, process_turn};
use crate::output::save_images;

pub async fn run(config: Config, system_prompt: Option<String>) -> anyhow::Result<()> {
    let agent = create_agent(&config, system_prompt).await?;
    let session = agent.create_session();
    let output_dir = config.output_dir();

    println!("{}", "Welcome to the chatbot! Type 'exit' to quit.".green());

    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline("> ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if is_exit(line) {
                    break;
                }

                rl.add_history_entry(line)?;

                match process_turn(&agent, &session, line).await {
                    Ok(response) => show_response(&response, &output_dir),
                    Err(AgentError::ToolDenied { tool_name }) => {
                        let reply = agent.recover_from_denial(&session, &tool_name);
                        println!("🤖: {}\n", reply);
                    }
                    Err(AgentError::Cancelled) => {
                        discard_turn(&session);
                        println!("{}\n", "Cancelled.".yellow());
                    }
                    Err(e) => {
                        discard_turn(&session);
                        println!("{} {}\n", "Error:".red().bold(), e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("{} {:?}", "Error:".red().bold(), err);
                break;
            }
        }
    }

    println!("{}", "👋 Bye...".red());
    Ok(())
}

fn is_exit(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit")
}

/// Drops whatever a failed turn left behind so the next request starts clean.
fn discard_turn(session: &Session) {
    if let Some(idx) = session.last_user_index() {
        session.truncate(idx);
    }
}

pub(crate) fn show_response(response: &AgentResponse, output_dir: &std::path::Path) {
    println!("🤖: {}\n", response.text);

    match save_images(output_dir, &response.images) {
        Ok(paths) => {
            for path in paths {
                println!("{} {}", "Saved chart:".cyan(), path.display());
            }
        }
        Err(e) => warn!(error = %e, "Failed to save chart images"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolgate_core::Message;

    #[test]
    fn test_exit_is_case_insensitive() {
        assert!(is_exit("exit"));
        assert!(is_exit("EXIT"));
        assert!(is_exit("Exit"));
        assert!(!is_exit("exit now"));
        assert!(!is_exit("quit"));
    }

    #[test]
    fn test_discard_turn_rewinds_to_before_user() {
        let session = Session::new();
        session.add_message(Message::user("first"));
        session.add_message(Message::assistant("reply"));
        session.add_message(Message::user("second"));
        session.add_message(Message::assistant("partial"));

        discard_turn(&session);

        assert_eq!(session.message_count(), 2);
        assert_eq!(session.last_message().unwrap().text_content(), "reply");
    }
}
