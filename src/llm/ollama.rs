use super::{
    calculate_tokens, classify_failure, log_performance, outcome_from_response, CompletionOutcome,
    CompletionRequest, LLM,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Instant;

#[derive(Clone)]
pub struct Ollama {
    model: String,
    client: Client,
    url: String,
}

impl Ollama {
    pub fn new(model: &str, url: &str) -> Self {
        Ollama {
            model: model.to_string(),
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
        }
    }

    pub fn model_name(&self) -> String {
        format!("Ollama ({})", self.model)
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system_prompt},
                {"role": "user", "content": request.user_prompt}
            ],
            "options": {
                "temperature": request.temperature,
                "top_p": request.top_p,
                "num_predict": request.max_tokens
            },
            "stream": false
        })
    }
}

fn message_content(response: &Value) -> Option<&str> {
    response["message"]["content"].as_str()
}

#[async_trait]
impl LLM for Ollama {
    async fn complete(&self, request: &CompletionRequest) -> CompletionOutcome {
        let start_time = Instant::now();
        let input_tokens = calculate_tokens(&request.user_prompt);

        let response = match self
            .client
            .post(format!("{}/api/chat", self.url))
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
