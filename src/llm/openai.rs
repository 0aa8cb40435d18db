use super::{
    calculate_tokens, classify_failure, log_performance, outcome_from_response, CompletionOutcome,
    CompletionRequest, LLM,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Instant;

/// Client for any OpenAI-compatible chat-completions endpoint (OpenAI, Groq).
#[derive(Clone)]
pub struct OpenAI {
    vendor: String,
    api_key: String,
    model: String,
    client: Client,
    url: String,
}

impl OpenAI {
    pub fn new(vendor: &str, api_key: &str, model: &str, url: &str) -> Self {
        OpenAI {
            vendor: vendor.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
        }
    }

    pub fn model_name(&self) -> String {
        format!("{} ({})", self.vendor, self.model)
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system_prompt},
                {"role": "user", "content": request.user_prompt}
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "top_p": request.top_p,
            "stream": false
        })
    }
}

fn message_content(response: &Value) -> Option<&str> {
    response["choices"][0]["message"]["content"].as_str()
}

#[async_trait]
impl LLM for OpenAI {
    async fn complete(&self, request: &CompletionRequest) -> CompletionOutcome {
        let start_time = Instant::now();
        let input_tokens = calculate_tokens(&request.user_prompt);

        let response = match self
            .client
            .post(format!("{}/chat/completions", self.url))
            .bearer_auth(&self.api_key)
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

        let outcome = outcome_from_response(status, &body, message_content);
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
    fn body_carries_prompts_and_sampling() {
        let client = OpenAI::new("Groq", "key", "llama-3.1-70b-versatile", "https://x/v1/");
        let request = CompletionRequest {
            system_prompt: "sys".to_string(),
            user_prompt: "usr".to_string(),
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: 2048,
        };
        let body = client.request_body(&request);

        assert_eq!(body["model"], "llama-3.1-70b-versatile");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "sys");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "usr");
        assert_eq!(body["max_tokens"], 2048);
        assert_eq!(body["top_p"], 1.0);
        assert_eq!(body["stream"], false);
        assert_eq!(client.url, "https://x/v1");
        assert_eq!(client.model_name(), "Groq (llama-3.1-70b-versatile)");
    }
}
