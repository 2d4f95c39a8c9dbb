use crate::error::{ExtractError, ScanError};
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const TESSERACT_BACKEND: &str = "tesseract";
pub const NEURAL_BACKEND: &str = "neural";

/// Turns image bytes into recognized text lines.
///
/// Implementations return trimmed, non-empty lines in reading order. An image
/// with no readable text is `Ok(vec![])`; the caller decides how to report it.
pub trait TextExtractor {
    fn backend_name(&self) -> &'static str;

    fn extract_lines(&self, image: &[u8]) -> Result<Vec<String>, ExtractError>;
}

/// Which OCR backend to build, with everything it needs to run.
#[derive(Debug, Clone)]
pub enum OcrConfig {
    LocalExecutable {
        executable: PathBuf,
        languages: Vec<String>,
    },
    NeuralModel {
        endpoint: String,
        api_key: Option<String>,
        languages: Vec<String>,
    },
}

impl OcrConfig {
    pub fn build(self) -> Result<Box<dyn TextExtractor>, ScanError> {
        match self {
            OcrConfig::LocalExecutable {
                executable,
                languages,
            } => Ok(Box::new(TesseractExtractor::new(executable, languages))),
            OcrConfig::NeuralModel {
                endpoint,
                api_key,
                languages,
            } => Ok(Box::new(NeuralOcrExtractor::new(
                &endpoint, api_key, languages,
            )?)),
        }
    }
}

/// Runs a Tesseract-compatible executable: image on stdin, text on stdout.
#[derive(Debug, Clone)]
pub struct TesseractExtractor {
    executable: PathBuf,
    languages: Vec<String>,
}

impl TesseractExtractor {
    pub fn new(executable: impl Into<PathBuf>, languages: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            languages,
        }
    }

    fn language_arg(&self) -> String {
        if self.languages.is_empty() {
            return "eng".to_string();
        }

        self.languages
            .iter()
            .map(|code| tesseract_language_code(code))
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl TextExtractor for TesseractExtractor {
    fn backend_name(&self) -> &'static str {
        TESSERACT_BACKEND
    }

    fn extract_lines(&self, image: &[u8]) -> Result<Vec<String>, ExtractError> {
        let language = self.language_arg();
        debug!(
            executable = %self.executable.display(),
            language = %language,
            bytes = image.len(),
            "running local ocr"
        );

        let mut child = Command::new(&self.executable)
            .args(["stdin", "stdout", "-l"])
            .arg(&language)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| ExtractError::Spawn {
                executable: self.executable.display().to_string(),
                reason: error.to_string(),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // The exit status explains a process that quit before reading its input.
            if let Err(error) = stdin.write_all(image) {
                if error.kind() != ErrorKind::BrokenPipe {
                    return Err(ExtractError::Io(error));
                }
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(ExtractError::ProcessFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8(output.stdout)
            .map_err(|error| ExtractError::InvalidOutput(error.to_string()))?;
        Ok(split_recognized_text(&text))
    }
}

fn tesseract_language_code(code: &str) -> String {
    let code = code.trim();
    match code.to_ascii_lowercase().as_str() {
        "en" => "eng".to_string(),
        "de" => "deu".to_string(),
        "fr" => "fra".to_string(),
        "es" => "spa".to_string(),
        "it" => "ita".to_string(),
        "pt" => "por".to_string(),
        "nl" => "nld".to_string(),
        _ => code.to_string(),
    }
}

/// Tesseract separates pages with form feeds; both they and newlines end a line.
fn split_recognized_text(text: &str) -> Vec<String> {
    text.split(|c: char| c == '\n' || c == '\u{000c}')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Serialize)]
struct NeuralOcrRequest<'a> {
    image_base64: String,
    languages: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
struct NeuralOcrResponse {
    #[serde(default)]
    lines: Option<Vec<String>>,
    #[serde(default)]
    text: Option<String>,
}

/// Posts the image to an HTTP service hosting a neural text-recognition model.
pub struct NeuralOcrExtractor {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    languages: Vec<String>,
}

impl NeuralOcrExtractor {
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        languages: Vec<String>,
    ) -> Result<Self, ScanError> {
        let endpoint = Url::parse(endpoint.trim())?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ScanError::InvalidConfig(format!(
                "ocr endpoint must be http or https: {endpoint}"
            )));
        }

        let api_key = api_key.and_then(|value| {
            let key = value.trim().to_string();
            if key.is_empty() {
                None
            } else {
                Some(key)
            }
        });

        // OCR runs until the model answers; no request timeout.
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|error| ScanError::InvalidConfig(error.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            languages,
        })
    }
}

impl TextExtractor for NeuralOcrExtractor {
    fn backend_name(&self) -> &'static str {
        NEURAL_BACKEND
    }

    fn extract_lines(&self, image: &[u8]) -> Result<Vec<String>, ExtractError> {
        debug!(endpoint = %self.endpoint, bytes = image.len(), "requesting neural ocr");

        let payload = NeuralOcrRequest {
            image_base64: STANDARD.encode(image),
            languages: &self.languages,
        };

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("content-type", "application/json")
            .json(&payload);

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send()?;

        if !response.status().is_success() {
            return Err(ExtractError::BackendResponse {
                backend: NEURAL_BACKEND.to_string(),
                details: format!("{} returned {}", self.endpoint, response.status()),
            });
        }

        let payload: NeuralOcrResponse = response.json()?;
        payload_to_lines(payload)
    }
}

fn payload_to_lines(payload: NeuralOcrResponse) -> Result<Vec<String>, ExtractError> {
    match (payload.lines, payload.text) {
        (Some(listed), _) if listed.iter().any(|line| !line.trim().is_empty()) => Ok(listed
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        (_, Some(raw_text)) => Ok(split_recognized_text(&raw_text)),
        (Some(_), None) => Ok(Vec::new()),
        (None, None) => Err(ExtractError::BackendResponse {
            backend: NEURAL_BACKEND.to_string(),
            details: "response has neither `lines` nor `text`".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neural_payload_prefers_listed_lines() -> Result<(), ExtractError> {
        let response = NeuralOcrResponse {
            lines: Some(vec![
                "  ".to_string(),
                " Alice Smith ".to_string(),
                "Bob Jones".to_string(),
            ]),
            text: Some("ignored".to_string()),
        };

        let lines = payload_to_lines(response)?;
        assert_eq!(lines, vec!["Alice Smith", "Bob Jones"]);
        Ok(())
    }

    #[test]
    fn neural_payload_falls_back_to_text_blob() -> Result<(), ExtractError> {
        let response = NeuralOcrResponse {
            lines: Some(vec![" ".to_string()]),
            text: Some("First\n\nSecond\u{000C}Third\n".to_string()),
        };

        let lines = payload_to_lines(response)?;
        assert_eq!(lines, vec!["First", "Second", "Third"]);
        Ok(())
    }

    #[test]
    fn neural_payload_without_fields_is_an_error() {
        let response = NeuralOcrResponse {
            lines: None,
            text: None,
        };
        assert!(matches!(
            payload_to_lines(response),
            Err(ExtractError::BackendResponse { .. })
        ));
    }

    #[test]
    fn neural_response_parses_from_json() -> Result<(), serde_json::Error> {
        let response: NeuralOcrResponse = serde_json::from_str(r#"{"lines":["a","b"]}"#)?;
        assert_eq!(response.lines, Some(vec!["a".to_string(), "b".to_string()]));
        assert!(response.text.is_none());
        Ok(())
    }

    #[test]
    fn neural_endpoint_must_be_http() {
        let result = NeuralOcrExtractor::new("ftp://ocr.local/read", None, Vec::new());
        assert!(matches!(result, Err(ScanError::InvalidConfig(_))));

        let result = NeuralOcrExtractor::new("not a url", None, Vec::new());
        assert!(matches!(result, Err(ScanError::Url(_))));
    }

    #[test]
    fn tesseract_languages_are_mapped_and_joined() {
        let extractor = TesseractExtractor::new(
            "tesseract",
            vec!["en".to_string(), "DE".to_string(), "chi_sim".to_string()],
        );
        assert_eq!(extractor.language_arg(), "eng+deu+chi_sim");
        assert_eq!(TesseractExtractor::new("tesseract", Vec::new()).language_arg(), "eng");
    }

    #[test]
    fn recognized_text_drops_blank_lines_and_form_feeds() {
        let lines = split_recognized_text("Alice Smith\n\n  Bob Jones \n\u{000c}");
        assert_eq!(lines, vec!["Alice Smith", "Bob Jones"]);
    }

    #[test]
    fn missing_executable_is_a_spawn_error() {
        let extractor = TesseractExtractor::new("/nonexistent/ocr-binary", Vec::new());
        let result = extractor.extract_lines(b"\x89PNG");
        assert!(matches!(result, Err(ExtractError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn failing_executable_reports_exit_status() {
        let extractor = TesseractExtractor::new("false", Vec::new());
        let result = extractor.extract_lines(b"\x89PNG");
        assert!(matches!(result, Err(ExtractError::ProcessFailed { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn silent_executable_yields_no_lines() -> Result<(), ExtractError> {
        let extractor = TesseractExtractor::new("true", Vec::new());
        assert!(extractor.extract_lines(b"\x89PNG")?.is_empty());
        Ok(())
    }

    #[test]
    fn config_selects_backend() -> Result<(), ScanError> {
        let local = OcrConfig::LocalExecutable {
            executable: PathBuf::from("/usr/bin/tesseract"),
            languages: vec!["en".to_string()],
        }
        .build()?;
        assert_eq!(local.backend_name(), TESSERACT_BACKEND);

        let neural = OcrConfig::NeuralModel {
            endpoint: "http://localhost:8866/ocr".to_string(),
            api_key: Some("  ".to_string()),
            languages: vec!["en".to_string()],
        }
        .build()?;
        assert_eq!(neural.backend_name(), NEURAL_BACKEND);
        Ok(())
    }
}
