// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to implement the interactive tool.
//
// Module responsibilities:
// - `api`: Encapsulates the single HTTP interaction with the remote
//   analysis service and the fixed instructional prompt.
// - `error`: The structured per-request error type. Failures carry a
//   kind and a message instead of being flattened into report text.
// - `imaging`: Decodes an uploaded image, scales it to the analysis
//   width and stages it as a short-lived PNG.
// - `ui`: Implements the terminal-based flow (upload, analyze, render)
//   and delegates the pipeline steps to the modules above.
//
// Keeping this separation makes it easier to test the pipeline logic or
// replace the UI in the future (for example, adding a TUI or GUI).
pub mod api;
pub mod error;
pub mod imaging;
pub mod ui;
