//! Line-based chat loop over stdin/stdout.

use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::core::session::{ChatServices, ChatSession, SessionEvent};
use crate::ui::input::{process_input, InputCommand, HELP_LINES};

pub async fn run_chat(services: Arc<ChatServices>) -> Result<(), Box<dyn Error>> {
    let mut out = io::stdout();
    writeln!(
        out,
        "💬 todochat using {} with tools from {} (type /help for commands)",
        services.model(),
        services.tool().server_label()
    )?;

    let (mut session, mut updates) = ChatSession::new(services);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if !handle_line(&mut session, &mut out, &line)? {
                    break;
                }
            }
            Some(update) = updates.recv() => {
                if let Some(event) = session.apply(update) {
                    render_event(&mut out, &session, &event)?;
                }
            }
        }
    }

    debug!("chat loop finished");
    session.dispose();
    Ok(())
}

/// Returns `false` when the user asked to leave.
fn handle_line(session: &mut ChatSession, out: &mut impl Write, line: &str) -> io::Result<bool> {
    match process_input(line) {
        InputCommand::Ignore => {}
        InputCommand::ProcessAsMessage(text) => {
            if session.is_responding() {
                writeln!(out)?;
            }
            if session.submit_user_message(text) {
                write!(out, "🤖 ")?;
                out.flush()?;
            }
        }
        InputCommand::UseSuggestion(index) => match session.suggestions().get(index).cloned() {
            Some(suggestion) => {
                writeln!(out, "> {suggestion}")?;
                session.select_suggestion(&suggestion);
                write!(out, "🤖 ")?;
                out.flush()?;
            }
            None => writeln!(out, "No suggestion {}", index + 1)?,
        },
        InputCommand::Stop => {
            if session.cancel_response() {
                writeln!(out, " [stopped]")?;
            }
        }
        InputCommand::Reset => {
            session.reset();
            writeln!(out, "Started a new conversation.")?;
        }
        InputCommand::Help => {
            for help in HELP_LINES {
                writeln!(out, "  {help}")?;
            }
        }
        InputCommand::Quit => return Ok(false),
    }
    Ok(true)
}

fn render_event(out: &mut impl Write, session: &ChatSession, event: &SessionEvent) -> io::Result<()> {
    match event {
        SessionEvent::ResponseUpdated { delta } => {
            write!(out, "{delta}")?;
            out.flush()
        }
        SessionEvent::ResponseCompleted => writeln!(out),
        SessionEvent::SuggestionsUpdated => render_suggestions(out, session.suggestions()),
        SessionEvent::Error(err) => writeln!(out, "\n⚠️  {err}"),
    }
}

fn render_suggestions(out: &mut impl Write, suggestions: &[String]) -> io::Result<()> {
    if suggestions.is_empty() {
        return Ok(());
    }
    writeln!(out, "Suggestions:")?;
    for (index, suggestion) in suggestions.iter().enumerate() {
        writeln!(out, "  /{} {suggestion}", index + 1)?;
    }
    Ok(())
}
