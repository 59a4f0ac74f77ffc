use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::config::AiConfig;

const DEFAULT_MAX_TOKENS: u32 = 200;
const QUERY_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum SuggestError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Failed to query model: {0}")]
	Query(#[source] reqwest::Error),

	#[error("Failed to parse model response: {0}")]
	Response(#[source] reqwest::Error),
}

/// Build the instruction prompt sent to the model endpoint.
pub fn build_prompt(task: &str, file_content: &str) -> String {
	let mut instruction = String::new();
	let mut chars = task.chars();
	if let Some(first) = chars.next() {
		instruction.extend(first.to_uppercase());
		instruction.push_str(chars.as_str());
	}
	format!("{} the following Python code.\n\n{}", instruction, file_content)
}

/// Read a source file and ask the configured endpoint for improvements.
pub async fn suggest_code_improvement(
	ai: &AiConfig,
	file_path: &Path,
	task: &str,
) -> Result<String, SuggestError> {
	let content = std::fs::read_to_string(file_path)
		.map_err(|_| SuggestError::FileNotFound(file_path.display().to_string()))?;
	let prompt = build_prompt(task, &content);
	query_model(ai, &prompt, DEFAULT_MAX_TOKENS).await
}

/// POST a completion request to the configured remote endpoint and return
/// the `content` field of the JSON response.
pub async fn query_model(
	ai: &AiConfig,
	prompt: &str,
	max_tokens: u32,
) -> Result<String, SuggestError> {
	let payload = serde_json::json!({
		"prompt": prompt,
		"n_predict": max_tokens,
		"temperature": ai.temperature,
	});

	let client = reqwest::Client::new();
	let response = client
		.post(&ai.remote_url)
		.timeout(QUERY_TIMEOUT)
		.json(&payload)
		.send()
		.await
		.and_then(|r| r.error_for_status())
		.map_err(SuggestError::Query)?;

	let body: serde_json::Value = response.json().await.map_err(SuggestError::Response)?;

	Ok(body
		.get("content")
		.and_then(|v| v.as_str())
		.unwrap_or("")
		.trim()
		.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn prompt_capitalizes_task() {
		let prompt = build_prompt("refactor", "x = 1");
		assert!(prompt.starts_with("Refactor the following Python code."));
		assert!(prompt.ends_with("x = 1"));
	}

	#[test]
	fn prompt_keeps_already_capitalized_task() {
		let prompt = build_prompt("Explain", "x = 1");
		assert!(prompt.starts_with("Explain the following Python code."));
	}

	#[tokio::test]
	async fn missing_file_is_an_error() {
		let ai = AiConfig::default();
		let err = suggest_code_improvement(&ai, Path::new("/definitely/not/here.py"), "refactor")
			.await
			.unwrap_err();
		assert!(matches!(err, SuggestError::FileNotFound(_)));
		assert!(err.to_string().contains("File not found"));
	}
}
