use super::{
    calculate_tokens, classify_failure, log_performance, outcome_from_response, CompletionOutcome,
    CompletionRequest, LLM,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Instant;

#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    model: String,
    client: Client,
    url: String,
}

impl Gemini {
    pub fn new(api_key: &str, model: &str, url: &str) -> Self {
        Gemini {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
        }
    }

    pub fn model_name(&self) -> String {
        format!("Gemini ({})", self.model)
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        json!({
            "systemInstruction": {
                "parts": [{"text": request.system_prompt}]
            },
            "contents": [
                {"role": "user", "parts": [{"text": request.user_prompt}]}
            ],
            "generationConfig": {
                "temperature": request.temperature,
                "topP": request.top_p,
                "maxOutputTokens": request.max_tokens
            }
        })
    }
}

fn candidate_text(response: &Value) -> Option<&str> {
    response["candidates"][0]["content"]["parts"][0]["text"].as_str()
}

#[async_trait]
impl LLM for Gemini {
    async fn complete(&self, request: &CompletionRequest) -> CompletionOutcome {
        let start_time = Instant::now();
        let input_tokens = calculate_tokens(&request.user_prompt);

        let response = match self
            .client
            .post(format!("{}/models/{}:generateContent", self.url, self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(request))
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return classify_failure(None, err.to_string()),
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => return classify_failure(Some(status), err.to_string()),
        };

        let outcome = outcome_from_response(status, &body, candidate_text);
        if let CompletionOutcome::Success(Some(output)) = &outcome {
            log_performance(
                &self.model_name(),
                start_time,
                input_tokens,
                calculate_tokens(output),
            );
        }
        outcome
    }

    fn model_name(&self) -> String {
        self.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_goes_into_generation_config() {
        let client = Gemini::new("key", "gemini-1.5-flash", "https://example.test/v1beta");
        let request = CompletionRequest {
            system_prompt: "sys".to_string(),
            user_prompt: "usr".to_string(),
            temperature: 0.5,
            top_p: 1.0,
            max_tokens: 2048,
        };
        let body = client.request_body(&request);

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "usr");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(body["generationConfig"]["topP"], 1.0);
    }

    #[test]
    fn candidate_text_is_extracted() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"docs"}]}}]}"#;
        assert_eq!(
            outcome_from_response(200, body, candidate_text),
            CompletionOutcome::Success(Some("docs".to_string()))
        );
    }

    #[test]
    fn blocked_prompt_has_no_text() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert_eq!(
            outcome_from_response(200, body, candidate_text),
            CompletionOutcome::Success(None)
        );
    }
}
