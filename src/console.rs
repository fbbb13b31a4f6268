//! Interactive terminal front end for the [`Controller`].

use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use crate::config::expand_path;
use crate::controller::{Controller, Event, Response};
use crate::error::Result;
use crate::session::Dialog;
use crate::voice::VoiceEvent;

pub const HELP: &str = "\
Commands:
  upload <path>        load a PDF (replaces the current one)
  open                 write an HTML viewer for the PDF
  ask <question>       ask a question (plain text also works)
  voice                start listening for a spoken question
  cancel               stop listening
  paragraph [which]    show a paragraph, e.g. `paragraph 2nd`
  headings             list all headings
  mindmap              show the heading mind-map
  close                dismiss the answer panel
  status               show the loaded document
  help                 show this help
  quit                 exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Event(Event),
    Status,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    let event = match head.to_lowercase().as_str() {
        "upload" if !rest.is_empty() => Event::Upload(expand_path(rest)),
        "open" => Event::OpenPdf,
        "ask" if !rest.is_empty() => Event::SubmitText(rest.to_string()),
        "voice" | "listen" => Event::StartVoice,
        "cancel" => Event::CancelVoice,
        "paragraph" => Event::ExtractParagraph((!rest.is_empty()).then(|| rest.to_string())),
        "headings" => Event::ListHeadings,
        "mindmap" => Event::MakeMindMap,
        "close" | "x" => Event::CloseDialog,
        "status" => return Some(Command::Status),
        "help" | "?" => return Some(Command::Help),
        "quit" | "exit" | "q" => return Some(Command::Quit),
        _ => Event::SubmitText(line.to_string()),
    };
    Some(Command::Event(event))
}

/// Run the session until `quit` or end of input.
pub async fn run(
    mut controller: Controller,
    mut voice_events: mpsc::UnboundedReceiver<VoiceEvent>,
    initial_pdf: Option<PathBuf>,
) -> Result<()> {
    println!("📄 Voice-Based PDF Assistant (Offline). Type `help` for commands.");
    if let Some(path) = initial_pdf {
        let responses = controller.dispatch(Event::Upload(path)).await;
        present(&controller, &responses, None);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let shown = controller.state().dialog.clone();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    None => continue,
                    Some(Command::Quit) => break,
                    Some(Command::Help) => println!("{}", HELP),
                    Some(Command::Status) => println!("{}", controller.state().status_line()),
                    Some(Command::Event(event)) => {
                        let responses = controller.dispatch(event).await;
                        present(&controller, &responses, Some(&shown));
                    }
                }
            }
            Some(event) = voice_events.recv() => {
                let responses = controller.dispatch(Event::Voice(event)).await;
                present(&controller, &responses, Some(&shown));
            }
        }
    }

    info!("Session ended");
    controller.shutdown().await
}

fn present(
    controller: &Controller,
    responses: &[Response],
    previous: Option<&Dialog>,
) {
    for response in responses {
        match response {
            Response::Notice(text) => println!("{}", text),
            Response::Viewer(path) => println!("📂 PDF viewer written to {}", path.display()),
            Response::MindMap { tree, dot } => {
                println!("{}", tree);
                println!("\n{}", dot);
            }
        }
    }
    let dialog = &controller.state().dialog;
    if dialog.visible && previous != Some(dialog) {
        println!("{}", dialog.render());
    }
}
