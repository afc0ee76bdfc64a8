// Entrypoint for the CLI application.
// - Loads the API key before anything else: a missing key halts startup
//   with remediation steps, before the upload menu ever appears.
// - Keeps `main` small: create the analysis client and hand it to the
//   UI loop.

use crossterm::style::Stylize;
use medscan_cli::{api::AnalysisClient, ui::main_menu};

fn main() -> anyhow::Result<()> {
    // The client is configured from `GROQ_API_KEY` (and optionally
    // `GROQ_API_URL`). See `api::AnalysisClient::from_env`.
    let client = match AnalysisClient::from_env() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("⚠️ {}", e);
            eprintln!();
            eprintln!("To set your API key:");
            eprintln!("  1. Create an API key in the Groq console");
            eprintln!("  2. Run: export GROQ_API_KEY=<your key>");
            eprintln!("  3. Start this tool again");
            std::process::exit(1);
        }
    };

    println!("{}", "🩺 Medical Image Analysis Tool 🔬".bold());
    println!();
    println!("Upload a medical image (X-ray, MRI, CT, Ultrasound, etc.) and the");
    println!("AI-powered analysis will report key findings, a diagnostic");
    println!("assessment and a patient-friendly explanation.");
    println!();
    println!("🔒 Nothing is stored: uploads and reports live only for the request.");
    println!();

    // Start the interactive menu. This call blocks until the user exits.
    main_menu(client)?;
    Ok(())
}
