//! A simple program demonstrates how to use `medimg-chat` as a library.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::pin::pin;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use medimg_chat::EnvConfig;
use medimg_chat::core::{SessionEvent, TurnEnd};
use medimg_chat::model::{ChatMessage, Role, Transcript};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::signal::ctrl_c;
use tokio::sync::mpsc;
use tokio::time::sleep;

const BAR_CHAR: &str = "▎";
const PREVIEW_CHARS: usize = 160;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    debug!("starting with {config:?}");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut session = config
        .session_builder()
        .on_event(move |event| {
            event_tx.send(event.clone()).ok();
        })
        .build();
    let stop = session.stop_handle();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let line = select! {
            line = read_line() => line,
            _ = ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/clear" {
            session.clear();
            while event_rx.try_recv().is_ok() {}
            println!("{}", "Transcript cleared.".dimmed());
            continue;
        }

        // Replies start right after the user message.
        let first_reply = session.transcript().len() + 1;

        let result = {
            let mut turn = pin!(session.send_message(line));
            let mut progress_bar = None;
            loop {
                // Create a new progress bar if it has been finished.
                progress_bar
                    .get_or_insert_with(|| {
                        let progress_bar = ProgressBar::new_spinner();
                        progress_bar.set_style(progress_style.clone());
                        progress_bar.set_message("🤔 Thinking...");
                        progress_bar
                    })
                    .inc(1);

                let sleep = sleep(Duration::from_millis(100));
                select! {
                    result = &mut turn => {
                        if let Some(progress_bar) = progress_bar.take() {
                            progress_bar.finish_and_clear();
                        }
                        break result;
                    }
                    Some(event) = event_rx.recv() => match event {
                        SessionEvent::Transcript(transcript) => {
                            if let Some(progress_bar) = &progress_bar {
                                progress_bar.set_message(progress(&transcript));
                            }
                        }
                        SessionEvent::ServerError(message) => {
                            if let Some(progress_bar) = progress_bar.take() {
                                progress_bar.finish_and_clear();
                            }
                            print_server_error(&message);
                        }
                        _ => {}
                    },
                    _ = ctrl_c() => {
                        stop.stop();
                    }
                    _ = sleep => {}
                }
            }
        };

        // Events emitted by the last poll of the turn.
        while let Ok(event) = event_rx.try_recv() {
            if let SessionEvent::ServerError(message) = event {
                print_server_error(&message);
            }
        }

        let report = match result {
            Ok(report) => report,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };
        for message in report.transcript.iter().skip(first_reply) {
            print_message(message);
        }
        match report.end {
            TurnEnd::Completed | TurnEnd::TimedOut => {}
            TurnEnd::Failed(err) => {
                println!("{}{}", BAR_CHAR.bright_red(), err.dimmed());
            }
            TurnEnd::Cancelled => {
                println!("{}{}", BAR_CHAR.bright_black(), "Stopped.".dimmed());
            }
        }
        println!();
    }
}

fn progress(transcript: &Transcript) -> String {
    let Some(message) = transcript.last() else {
        return "🤔 Thinking...".to_owned();
    };
    if message.role != Role::Assistant {
        return "🤔 Thinking...".to_owned();
    }
    if !message.content.is_empty() {
        return "✍️  Writing...".to_owned();
    }
    match message.tool_calls.last() {
        Some(call) => format!("🔧 Running {}...", call.name),
        None => "🤔 Thinking...".to_owned(),
    }
}

fn print_message(message: &ChatMessage) {
    if message.role != Role::Assistant {
        return;
    }
    for call in &message.tool_calls {
        let args = serde_json::to_string(&call.args).unwrap_or_default();
        println!(
            "{}🔧 {}{}",
            BAR_CHAR.bright_yellow(),
            call.name.bright_white().bold(),
            preview(&args).dimmed()
        );
    }
    for output in &message.tool_outputs {
        let value = serde_json::to_string(&output.output).unwrap_or_default();
        println!(
            "{}↳ {}: {}",
            BAR_CHAR.bright_yellow(),
            output.name,
            preview(&value).dimmed()
        );
    }
    if !message.content.is_empty() {
        println!(
            "{}🤖 {}",
            BAR_CHAR.bright_cyan(),
            message.content.bright_white()
        );
    }
}

fn print_server_error(message: &str) {
    println!("{}⚠️  {}", BAR_CHAR.bright_red(), message.bright_red());
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let mut preview: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        preview.push('…');
    }
    preview
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
