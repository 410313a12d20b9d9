//! テスティモニアル文面の生成

use async_trait::async_trait;
use tracing::{error, info};

use crate::error::Result;

/// 文面生成のプロンプト
pub fn prompt_for(topic: &str) -> String {
    format!("Generate a positive testimonial (2-3 sentences) about {}.", topic)
}

/// 生成に失敗したときの文面
pub fn fallback_testimonial(topic: &str) -> String {
    format!(
        "This {} exceeded all my expectations! The quality is outstanding, and the customer service team went above and beyond to ensure my satisfaction.",
        topic
    )
}

/// テスティモニアル文面の生成元
#[async_trait]
pub trait TestimonialWriter: Send + Sync {
    async fn write(&self, topic: &str) -> Result<String>;

    /// ログ用の名前
    fn name(&self) -> &str;
}

/// 固定テンプレートで文面を返す（APIキー未設定時とテスト用）
#[derive(Debug, Clone, Default)]
pub struct StaticWriter;

#[async_trait]
impl TestimonialWriter for StaticWriter {
    async fn write(&self, topic: &str) -> Result<String> {
        Ok(fallback_testimonial(topic))
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// 文面を生成する。失敗しても固定文面を返すのでエラーにはならない
pub async fn generate_testimonial(writer: &dyn TestimonialWriter, topic: &str) -> String {
    match writer.write(topic).await {
        Ok(text) if !text.trim().is_empty() => {
            info!("Generated testimonial for '{}' via {}", topic, writer.name());
            text
        }
        Ok(_) => {
            error!("Writer {} returned empty text for '{}'", writer.name(), topic);
            fallback_testimonial(topic)
        }
        Err(e) => {
            error!("Error generating testimonial: {}", e);
            fallback_testimonial(topic)
        }
    }
}

#[cfg(feature = "http-endpoints")]
pub use chat::ChatCompletionWriter;

#[cfg(feature = "http-endpoints")]
mod chat {
    use super::{prompt_for, TestimonialWriter};
    use crate::config::WriterConfig;
    use crate::error::{Result, TestimonialError};
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;
    use tracing::debug;

    #[derive(Debug, Serialize)]
    struct ChatMessage<'a> {
        role: &'a str,
        content: &'a str,
    }

    #[derive(Debug, Serialize)]
    struct ChatRequest<'a> {
        model: &'a str,
        messages: Vec<ChatMessage<'a>>,
        temperature: f32,
        max_tokens: u32,
    }

    #[derive(Debug, Deserialize)]
    struct ChatResponse {
        choices: Vec<ChatChoice>,
    }

    #[derive(Debug, Deserialize)]
    struct ChatChoice {
        message: ChatReply,
    }

    #[derive(Debug, Deserialize)]
    struct ChatReply {
        content: String,
    }

    /// OpenAI互換のチャット補完APIクライアント
    #[derive(Debug, Clone)]
    pub struct ChatCompletionWriter {
        client: reqwest::Client,
        config: WriterConfig,
        api_key: String,
    }

    impl ChatCompletionWriter {
        pub fn new(config: &WriterConfig) -> Result<Self> {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| TestimonialError::Config("Writer API key is not set".to_string()))?;

            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .map_err(|e| TestimonialError::TextGeneration(format!("HTTP client error: {}", e)))?;

            Ok(ChatCompletionWriter {
                client,
                config: config.clone(),
                api_key,
            })
        }
    }

    #[async_trait]
    impl TestimonialWriter for ChatCompletionWriter {
        async fn write(&self, topic: &str) -> Result<String> {
            let prompt = prompt_for(topic);
            let request = ChatRequest {
                model: &self.config.model,
                messages: vec![ChatMessage {
                    role: "system",
                    content: &prompt,
                }],
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
            };

            debug!("Requesting testimonial from {} ({})", self.config.api_url, self.config.model);

            let response = self
                .client
                .post(&self.config.api_url)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| TestimonialError::TextGeneration(format!("Request failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(TestimonialError::TextGeneration(format!(
                    "HTTP error: {}",
                    response.status()
                )));
            }

            let body: ChatResponse = response
                .json()
                .await
                .map_err(|e| TestimonialError::TextGeneration(format!("Invalid response: {}", e)))?;

            body.choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content.trim().to_string())
                .ok_or_else(|| TestimonialError::TextGeneration("Response has no choices".to_string()))
        }

        fn name(&self) -> &str {
            "chat-completion"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_requires_api_key() {
            let err = ChatCompletionWriter::new(&WriterConfig::default()).unwrap_err();
            assert_eq!(err.error_code(), "CONFIG_ERROR");
        }

        #[test]
        fn test_request_body_shape() {
            let prompt = prompt_for("coffee");
            let request = ChatRequest {
                model: "mixtral-8x7b-32768",
                messages: vec![ChatMessage { role: "system", content: &prompt }],
                temperature: 0.7,
                max_tokens: 150,
            };
            let json = serde_json::to_value(&request).unwrap();
            assert_eq!(json["messages"][0]["role"], "system");
            assert_eq!(json["max_tokens"], 150);
        }

        #[tokio::test]
        async fn test_unreachable_endpoint_is_an_error() {
            let config = WriterConfig {
                api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
                api_key: Some("test-key".to_string()),
                timeout_secs: 2,
                ..WriterConfig::default()
            };
            let writer = ChatCompletionWriter::new(&config).unwrap();
            let err = writer.write("coffee").await.unwrap_err();
            assert_eq!(err.error_code(), "TEXT_GENERATION_ERROR");
        }
    }
}

/// 設定に応じて文面生成元を選ぶ
pub fn writer_from_settings(config: &crate::config::WriterConfig) -> Box<dyn TestimonialWriter> {
    #[cfg(feature = "http-endpoints")]
    {
        if config.api_key.is_some() {
            match ChatCompletionWriter::new(config) {
                Ok(writer) => return Box::new(writer),
                Err(e) => error!("Failed to create chat completion writer: {}", e),
            }
        }
    }

    info!(
        "Using static testimonial writer (api key configured: {})",
        config.api_key.is_some()
    );
    Box::new(StaticWriter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TestimonialError;

    struct FailingWriter;

    #[async_trait]
    impl TestimonialWriter for FailingWriter {
        async fn write(&self, _topic: &str) -> Result<String> {
            Err(TestimonialError::TextGeneration("upstream down".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct EmptyWriter;

    #[async_trait]
    impl TestimonialWriter for EmptyWriter {
        async fn write(&self, _topic: &str) -> Result<String> {
            Ok("   ".to_string())
        }

        fn name(&self) -> &str {
            "empty"
        }
    }

    #[test]
    fn test_prompt() {
        assert_eq!(
            prompt_for("our bakery"),
            "Generate a positive testimonial (2-3 sentences) about our bakery."
        );
    }

    #[tokio::test]
    async fn test_failure_uses_fallback() {
        let text = generate_testimonial(&FailingWriter, "coffee").await;
        assert!(text.starts_with("This coffee exceeded all my expectations!"));
        assert_eq!(generate_testimonial(&EmptyWriter, "coffee").await, fallback_testimonial("coffee"));
    }

    #[tokio::test]
    async fn test_static_writer() {
        let text = generate_testimonial(&StaticWriter, "tea").await;
        assert_eq!(text, fallback_testimonial("tea"));
    }

    #[test]
    fn test_writer_without_key_is_static() {
        let writer = writer_from_settings(&crate::config::WriterConfig::default());
        assert_eq!(writer.name(), "static");
    }
}
