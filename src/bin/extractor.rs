//! Standalone extraction: `extractor <path_to_pdf>` prints paragraphs,
//! headings and the mind-map as JSON.

use anyhow::{Context, Result};
use std::env;
use std::path::Path;
use std::process::ExitCode;

use voice_pdf_assistant::config::Config;
use voice_pdf_assistant::extract;
use voice_pdf_assistant::json::to_ascii_pretty;

fn run(pdf: &Path) -> Result<()> {
    let settings = Config::load()?.settings()?;
    let extraction = extract::extract(pdf, &settings.extract)
        .with_context(|| format!("Failed to extract {}", pdf.display()))?;
    println!("{}", to_ascii_pretty(&extraction)?);
    Ok(())
}

fn main() -> ExitCode {
    // paths need not be valid UTF-8
    let args: Vec<_> = env::args_os().collect();
    if args.len() != 2 {
        let prog = args
            .first()
            .map(|arg| arg.to_string_lossy().into_owned())
            .unwrap_or_else(|| "extractor".to_string());
        eprintln!("❌ Usage: {} <path_to_pdf>", prog);
        return ExitCode::from(2);
    }
    match run(Path::new(&args[1])) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
