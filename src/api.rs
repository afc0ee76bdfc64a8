// Analysis client module: a small blocking HTTP client that sends one
// image-analysis request per trigger to the Groq chat-completions API.
// It is intentionally synchronous: the UI blocks on the call and only
// one request is ever in flight.

use crate::error::AnalysisError;
use crate::imaging::PreparedImage;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fs;

/// Groq speaks the OpenAI chat-completions dialect.
const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";

/// Vision-capable model served by Groq.
const MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

/// Instructions sent with every image. The model answers in markdown.
const ANALYSIS_PROMPT: &str = "\
You are a medical imaging expert. Analyze the medical image and provide:

1. Image type and anatomical region
2. Key findings and observations
3. Diagnostic assessment
4. Patient-friendly explanation

Use clear markdown formatting and be concise.";

/// Blocking client for the remote analysis service. Holds the API key
/// loaded at startup; the key lives in memory only and is never written
/// anywhere.
pub struct AnalysisClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Chat-completions request body. The user message carries two content
/// parts: the fixed prompt and the resized image as a base64 data URL,
/// so the model actually receives the pixels, not just a textual mention
/// of an attachment.
#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize, Debug)]
struct Message<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize, Debug)]
struct ImageUrl {
    url: String,
}

/// The slice of the chat-completions response we care about.
#[derive(Deserialize, Debug)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize, Debug)]
struct AssistantMessage {
    content: String,
}

impl AnalysisClient {
    /// Create a client from `GROQ_API_KEY` (required) and `GROQ_API_URL`
    /// (optional endpoint override). A missing key is a startup error:
    /// the caller prints remediation steps and halts before any upload
    /// interface appears or any network capability exists.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .context("Groq API key not found. Please set the GROQ_API_KEY environment variable")?;
        let base_url =
            std::env::var("GROQ_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        Self::with_endpoint(&base_url, &api_key)
    }

    /// Client pointed at an arbitrary endpoint.
    pub fn with_endpoint(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(AnalysisClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Send one analysis request for the prepared image and return the
    /// model's markdown report. A single attempt is made, with no retry
    /// or backoff; every failure maps to a structured [`AnalysisError`]
    /// for the UI to render as it sees fit.
    pub fn analyze(&self, prepared: &PreparedImage) -> Result<String, AnalysisError> {
        let bytes = fs::read(prepared.path())?;
        let data_url = format!("data:image/png;base64,{}", BASE64.encode(bytes));
        let request = build_request(&data_url);

        let url = format!("{}/chat/completions", self.base_url);
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AnalysisError::Unauthorized(status));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AnalysisError::RateLimited);
        }
        if !status.is_success() {
            let body = res.text().unwrap_or_default();
            return Err(AnalysisError::Api { status, body });
        }

        let body = res.text()?;
        parse_completion(&body)
    }
}

fn build_request(data_url: &str) -> ChatRequest<'_> {
    ChatRequest {
        model: MODEL,
        messages: vec![Message {
            role: "user",
            content: vec![
                ContentPart::Text {
                    text: ANALYSIS_PROMPT,
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: data_url.to_string(),
                    },
                },
            ],
        }],
    }
}

/// Pull the report text out of a chat-completions response body.
fn parse_completion(body: &str) -> Result<String, AnalysisError> {
    let completion: ChatCompletion = serde_json::from_str(body)
        .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AnalysisError::MalformedResponse("response has no choices".into()))?;
    Ok(choice.message.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging;
    use image::RgbImage;
    use tempfile::NamedTempFile;

    fn sample_image() -> NamedTempFile {
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        RgbImage::new(64, 64).save(file.path()).unwrap();
        file
    }

    #[test]
    fn request_carries_prompt_and_image_data() {
        let request = build_request("data:image/png;base64,QUJD");
        let json = serde_json::to_value(&request).unwrap();

        let parts = &json["messages"][0]["content"];
        assert_eq!(parts[0]["type"], "text");
        assert!(parts[0]["text"]
            .as_str()
            .unwrap()
            .contains("medical imaging expert"));
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,QUJD");
    }

    #[test]
    fn parses_a_completion_body() {
        let body = r###"{
            "choices": [
                {"message": {"role": "assistant", "content": "## Findings\nAll clear."}}
            ]
        }"###;
        assert_eq!(parse_completion(body).unwrap(), "## Findings\nAll clear.");
    }

    #[test]
    fn empty_choices_are_malformed() {
        let err = parse_completion(r#"{"choices": []}"#).unwrap_err();
        assert_eq!(err.kind(), "malformed-response");
    }

    #[test]
    fn garbage_body_is_malformed() {
        let err = parse_completion("<html>gateway timeout</html>").unwrap_err();
        assert_eq!(err.kind(), "malformed-response");
    }

    #[test]
    fn network_failure_becomes_a_structured_error() {
        // Port 9 is the discard service; nothing listens there locally,
        // so the connection is refused without touching the network.
        let client = AnalysisClient::with_endpoint("http://127.0.0.1:9", "test-key").unwrap();
        let input = sample_image();
        let prepared = imaging::prepare_for_analysis(input.path()).unwrap();

        let err = client.analyze(&prepared).unwrap_err();
        assert_eq!(err.kind(), "network");
    }
}
