#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

use std::io::Write;

use anyhow::Result;
use owo_colors::OwoColorize;
use owo_colors::Stream;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use crate::application::cli::help_text;
use crate::domain::models::Action;
use crate::domain::models::Envelope;
use crate::domain::models::PageContext;
use crate::domain::models::Role;
use crate::domain::models::SlashCommand;
use crate::domain::services::ChatSession;
use crate::domain::services::RenderSink;
use crate::domain::services::SessionSettings;

/// Prints the transcript to a terminal as it changes.
#[derive(Default)]
pub struct TerminalRenderer {
    streaming: bool,
}

impl TerminalRenderer {
    fn end_stream_line(&mut self) {
        if self.streaming {
            println!();
            println!();
            self.streaming = false;
        }
    }
}

impl RenderSink for TerminalRenderer {
    fn page_context(&mut self, page: &PageContext) {
        self.end_stream_line();
        println!(
            "{} {}",
            "▍".if_supports_color(Stream::Stdout, |text| return text.cyan()),
            page.title
                .if_supports_color(Stream::Stdout, |text| return text.bold())
        );
        if !page.url.is_empty() {
            println!(
                "  {}",
                page.url
                    .if_supports_color(Stream::Stdout, |text| return text.dimmed())
            );
        }
        println!();
    }

    fn quote(&mut self, quote: Option<&str>) {
        if let Some(quote) = quote {
            self.end_stream_line();
            let banner = format!("Quote attached: \"{quote}\" (/dismiss to remove)");
            println!(
                "{}",
                banner.if_supports_color(Stream::Stdout, |text| return text.italic())
            );
        }
    }

    fn message(&mut self, role: Role, text: &str) {
        self.end_stream_line();
        match role {
            Role::User => println!(
                "{} {}",
                ">".if_supports_color(Stream::Stdout, |text| return text.green()),
                text.if_supports_color(Stream::Stdout, |text| return text.bold())
            ),
            Role::Assistant => println!("{text}"),
            Role::System => println!(
                "{}",
                text.if_supports_color(Stream::Stdout, |text| return text.dimmed())
            ),
            Role::Error => println!(
                "{}",
                text.if_supports_color(Stream::Stdout, |text| return text.red())
            ),
        }
        println!();
    }

    fn notice(&mut self, text: &str) {
        self.end_stream_line();
        println!(
            "{}\n",
            text.if_supports_color(Stream::Stdout, |text| return text.dimmed())
        );
    }

    fn token(&mut self, token: &str) {
        self.streaming = true;
        print!("{token}");
        if let Err(err) = std::io::stdout().flush() {
            tracing::warn!(error = ?err, "Unable to flush stdout");
        }
    }

    fn finish_stream(&mut self) {
        self.end_stream_line();
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum InputOutcome {
    Continue,
    Quit,
}

/// Applies one line typed into the chat window.
pub fn handle_input<R: RenderSink>(
    line: &str,
    session: &mut ChatSession<R>,
    tx: &mpsc::UnboundedSender<Action>,
) -> Result<InputOutcome> {
    if let Some(command) = SlashCommand::parse(line) {
        if command.is_quit() {
            return Ok(InputOutcome::Quit);
        }
        if command.is_quote() {
            // Goes the same way a selection from the page does.
            tx.send(Action::AddQuote(command.rest().to_string()))?;
        }
        if command.is_dismiss_quote() {
            session.dismiss_quote();
        }
        if command.is_model_set() {
            session.select_model(command.rest());
            println!("Using model {}\n", session.model());
        }
        if command.is_model_list() {
            let models = session.known_models();
            if models.is_empty() {
                println!("No models configured, set `models` in the config file.\n");
            } else {
                println!("{}\n", models.join("\n"));
            }
        }
        if command.is_help() {
            println!("{}\n", help_text());
        }

        return Ok(InputOutcome::Continue);
    }

    match session.submit(line) {
        Ok(Some(prompt)) => tx.send(Action::SubmitTurn(prompt))?,
        Ok(None) => {}
        Err(err) => session.reject(&err),
    }

    return Ok(InputOutcome::Continue);
}

/// The chat window: reads input lines and applies relayed events until the
/// user quits or either side goes away.
pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    mut rx: mpsc::UnboundedReceiver<Envelope>,
) -> Result<()> {
    let mut session = ChatSession::new(TerminalRenderer::default(), SessionSettings::from_config());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break,
                };
                if handle_input(&line, &mut session, &tx)? == InputOutcome::Quit {
                    break;
                }
            }
            envelope = rx.recv() => {
                match envelope {
                    Some(envelope) => session.handle_envelope(envelope),
                    None => break,
                }
            }
        }
    }

    if tx.send(Action::CloseChat()).is_err() {
        tracing::debug!("Coordinator already stopped");
    }

    return Ok(());
}
