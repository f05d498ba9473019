use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::ChatConfig;
use crate::errors::{GeminiError, GeminiResult};
use crate::types::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Anything that can answer a `generateContent` request
#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse>;
}

/// Client for interacting with the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new Gemini API client
    pub fn new(config: &ChatConfig) -> GeminiResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                GeminiError::ConfigError(
                    "API key is required to initialize the Gemini client".to_string(),
                )
            })?;

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name: config.model_name().to_string(),
            base_url: config.api_base_url().to_string(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// The key travels in a header so it never appears in URLs or their errors
    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model_name)
    }
}

#[async_trait]
impl InferenceService for GeminiClient {
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse> {
        debug!(
            model = %self.model_name,
            turns = request.contents.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                GeminiError::RequestError(format!("Failed to send request: {}", e.without_url()))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            GeminiError::RequestError(format!("Failed to read response: {}", e.without_url()))
        })?;

        if !status.is_success() {
            let message = api_error_message(&body);
            warn!(status = status.as_u16(), %message, "Gemini API returned an error");
            return Err(GeminiError::HttpError {
                status_code: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| GeminiError::ParsingError(format!("Failed to parse response: {}", e)))
    }
}

/// `error.message` from an error body, or "Unknown error"
pub fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|detail| detail.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| "Unknown error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ConversationController, TurnStatus};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const KEY: &str = "SECRETKEY123";

    fn client_for(base_url: &str) -> GeminiClient {
        GeminiClient::new(&ChatConfig {
            api_key: Some(KEY.to_string()),
            api_base_url: Some(base_url.to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    /// Answers a single request with a canned response and hands back the raw request
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1beta", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let headers = String::from_utf8_lossy(&request[..end]).to_lowercase();
                    let body_len = headers
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|value| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + body_len {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });

        (base_url, handle)
    }

    fn hello() -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![crate::types::Content::user("Hello", None)],
        }
    }

    #[tokio::test]
    async fn test_success_response_is_parsed() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "Hi!"}]}}]}"#,
        )
        .await;

        let response = client_for(&base_url)
            .generate_content(&hello())
            .await
            .unwrap();
        assert_eq!(response.first_text(), Some("Hi!"));

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(request_line.starts_with("POST /v1beta/models/gemini-2.0-flash:generateContent "));
        assert!(!request_line.contains(KEY));
        let expected_header = format!("x-goog-api-key: {}", KEY.to_lowercase());
        assert!(request.to_lowercase().contains(&expected_header));
        assert!(request.contains(r#""parts":[{"text":"Hello"}]"#));
    }

    #[tokio::test]
    async fn test_error_status_carries_api_message() {
        let (base_url, server) = serve_once(
            "400 Bad Request",
            r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#,
        )
        .await;

        let err = client_for(&base_url)
            .generate_content(&hello())
            .await
            .unwrap_err();
        server.await.unwrap();

        match err {
            GeminiError::HttpError {
                status_code,
                message,
            } => {
                assert_eq!(status_code, 400);
                assert_eq!(message, "API key not valid.");
            }
            other => panic!("expected HttpError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_status_without_envelope() {
        let (base_url, server) =
            serve_once("500 Internal Server Error", "<html>oops</html>").await;

        let err = client_for(&base_url)
            .generate_content(&hello())
            .await
            .unwrap_err();
        server.await.unwrap();

        assert!(matches!(
            err,
            GeminiError::HttpError { status_code: 500, ref message } if message == "Unknown error"
        ));
    }

    #[tokio::test]
    async fn test_unparseable_success_body() {
        let (base_url, server) = serve_once("200 OK", "not json").await;

        let err = client_for(&base_url)
            .generate_content(&hello())
            .await
            .unwrap_err();
        server.await.unwrap();

        assert!(matches!(err, GeminiError::ParsingError(_)));
    }

    #[tokio::test]
    async fn test_connection_failure_does_not_reveal_key() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1beta", listener.local_addr().unwrap());
        drop(listener);

        let client = client_for(&base_url);
        let err = client.generate_content(&hello()).await.unwrap_err();
        assert!(matches!(err, GeminiError::RequestError(_)));
        assert!(!err.to_string().contains(KEY));

        let mut chat = ConversationController::new(&ChatConfig::default());
        let turn = chat.submit_turn("Hello", &client).await.unwrap();
        match turn.status {
            TurnStatus::Failed(message) => assert!(!message.contains(KEY)),
            other => panic!("expected a failed turn, got {:?}", other),
        }
        assert_eq!(chat.transcript().len(), 1);
    }

    #[test]
    fn test_new_requires_api_key() {
        let err = GeminiClient::new(&ChatConfig::default()).unwrap_err();
        assert!(matches!(err, GeminiError::ConfigError(_)));

        let blank = ChatConfig {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(GeminiClient::new(&blank).is_err());
    }

    #[test]
    fn test_endpoint() {
        let config = ChatConfig {
            api_key: Some("secret".to_string()),
            model_name: Some("gemini-1.5-flash".to_string()),
            api_base_url: Some("http://127.0.0.1:9000/v1beta/".to_string()),
            ..Default::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://127.0.0.1:9000/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_api_error_message() {
        assert_eq!(
            api_error_message(r#"{"error": {"code": 403, "message": "Permission denied"}}"#),
            "Permission denied"
        );
        assert_eq!(api_error_message("<html>502</html>"), "Unknown error");
        assert_eq!(api_error_message(r#"{"error": {"code": 500}}"#), "Unknown error");
    }
}
