// UI layer: the interactive shell around the analysis pipeline, built
// with `dialoguer`. The flow has two shapes: no image selected yet
// (upload or exit) and an image selected (analyze, re-upload or exit).
// Everything is synchronous; the menu blocks while an analysis runs.

use crate::api::AnalysisClient;
use crate::error::AnalysisError;
use crate::imaging::{self, SUPPORTED_FORMATS};
use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use rfd::FileDialog;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Main interactive loop. Receives an `AnalysisClient` instance and runs
/// until the user chooses "Exit".
///
/// Note: `Select::interact()` is keyboard-driven: arrow keys and Enter
/// choose an option.
pub fn main_menu(client: AnalysisClient) -> Result<()> {
    let mut selected: Option<PathBuf> = None;
    loop {
        match &selected {
            None => {
                let items = vec!["Upload image", "Exit"];
                match Select::new().items(&items).default(0).interact()? {
                    0 => {
                        if let Some(path) = prompt_for_image()? {
                            match declared_subtype(&path) {
                                Ok(_) => {
                                    println!("Selected {}", path.display());
                                    selected = Some(path);
                                }
                                Err(e) => println!("⚠️ {}", e),
                            }
                        }
                    }
                    _ => break,
                }
            }
            Some(path) => {
                // The same file stays selected after a run, so a new
                // trigger re-analyzes it without re-uploading.
                let items = vec!["Analyze image", "Upload a different image", "Exit"];
                match Select::new().items(&items).default(0).interact()? {
                    0 => handle_analyze(&client, path),
                    1 => selected = None,
                    _ => break,
                }
            }
        }
    }
    Ok(())
}

/// Ask the user for an image. Tries the native file picker first and
/// falls back to a typed path when no picker is available or the dialog
/// was dismissed.
fn prompt_for_image() -> Result<Option<PathBuf>> {
    if let Some(path) = FileDialog::new()
        .add_filter("Images", &SUPPORTED_FORMATS)
        .pick_file()
    {
        return Ok(Some(path));
    }
    let typed: String = Input::new()
        .with_prompt("Image file path (leave empty to cancel)")
        .allow_empty(true)
        .interact_text()?;
    let typed = typed.trim();
    if typed.is_empty() {
        return Ok(None);
    }
    Ok(Some(PathBuf::from(typed)))
}

/// Run the full pipeline for one trigger and render the outcome. Both
/// transient files are gone by the time anything is printed.
fn handle_analyze(client: &AnalysisClient, path: &Path) {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("🔍 Analyzing the image... Please wait.");

    let outcome = run_analysis(client, path);

    spinner.finish_and_clear();
    match outcome {
        Ok(report) => {
            println!();
            println!("{}", "📋 Analysis Report".bold().cyan());
            println!();
            println!("{}", report);
        }
        Err(e) => println!("{}", render_failure(&e)),
    }
}

/// The pipeline proper: stage the upload, resize it, call the service.
/// The temp-file guards created here drop before the function returns,
/// so both files are removed on every path, including early `?` exits.
fn run_analysis(client: &AnalysisClient, path: &Path) -> Result<String, AnalysisError> {
    let upload = stage_upload(path)?;
    let prepared = imaging::prepare_for_analysis(upload.path())?;
    client.analyze(&prepared)
}

/// Copy the user's file into a transient location named after its
/// declared subtype. The copy is deleted when the returned guard drops.
fn stage_upload(path: &Path) -> Result<NamedTempFile, AnalysisError> {
    let subtype = declared_subtype(path)?;
    let bytes = std::fs::read(path)?;
    let mut file = tempfile::Builder::new()
        .prefix("medscan-upload-")
        .suffix(&format!(".{}", subtype))
        .tempfile()?;
    file.write_all(&bytes)?;
    file.flush()?;
    Ok(file)
}

/// The lowercased file extension, if it names an accepted image format.
fn declared_subtype(path: &Path) -> Result<String, AnalysisError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or_else(|| AnalysisError::UnsupportedFormat("(none)".into()))?;
    if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
        return Err(AnalysisError::UnsupportedFormat(ext));
    }
    Ok(ext)
}

/// How a failed analysis is shown. Per-request errors never crash the
/// session; they degrade to this single warning line and the user may
/// simply trigger the analysis again.
pub fn render_failure(err: &AnalysisError) -> String {
    format!("⚠️ Analysis error: {}", err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_render_with_the_warning_prefix() {
        let err = AnalysisError::MalformedResponse("response has no choices".into());
        let shown = render_failure(&err);
        assert!(shown.starts_with("⚠️ Analysis error: "));
        assert!(shown.contains("response has no choices"));
    }

    #[test]
    fn subtype_comes_from_the_extension() {
        assert_eq!(declared_subtype(Path::new("scan.PNG")).unwrap(), "png");
        assert_eq!(declared_subtype(Path::new("/tmp/xray.jpeg")).unwrap(), "jpeg");
    }

    #[test]
    fn unsupported_extensions_are_rejected() {
        let err = declared_subtype(Path::new("notes.txt")).unwrap_err();
        assert_eq!(err.kind(), "unsupported-format");
        let err = declared_subtype(Path::new("no_extension")).unwrap_err();
        assert_eq!(err.kind(), "unsupported-format");
    }

    #[test]
    fn staged_upload_is_a_transient_copy() {
        let mut source = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        source.write_all(b"fake jpeg bytes").unwrap();
        source.flush().unwrap();

        let staged = stage_upload(source.path()).unwrap();
        let staged_path = staged.path().to_path_buf();
        assert!(staged_path.extension().is_some_and(|e| e == "jpg"));
        assert_eq!(std::fs::read(&staged_path).unwrap(), b"fake jpeg bytes");

        drop(staged);
        assert!(!staged_path.exists());
    }
}
