//! Typed HTTP client for the cafeteria service.
//!
//! Five operations: fetch the current menu, request a recommendation,
//! request a revised recommendation carrying meal ratings, upload a menu
//! photo for OCR detection, and reset the menu. Menu fetches retry
//! transient failures with exponential backoff; the POST operations do not
//! (the service treats them as non-idempotent).

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;

use crate::api::types::{
    CategoryPayload, DetectPayload, MealRating, RecommendationPayload, RecommendationQuery,
    RevisionRequest,
};
use crate::util::validate_server_url;

const MAX_RETRIES: u32 = 3;
const MAX_BODY_SIZE: usize = 4 * 1024 * 1024; // 4MB
const MAX_PHOTO_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Errors from talking to the cafeteria service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body was not the expected JSON shape
    #[error("Unexpected response: {0}")]
    Decode(String),
    /// Response body exceeded the 4MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// The configured server URL failed validation
    #[error("Invalid server URL: {0}")]
    InvalidBaseUrl(String),
    /// The menu photo could not be read from disk
    #[error("Cannot read photo: {0}")]
    PhotoRead(#[from] std::io::Error),
    /// The menu photo exceeded the 10MB upload limit
    #[error("Photo too large ({0} bytes, limit {MAX_PHOTO_SIZE})")]
    PhotoTooLarge(u64),
}

impl ApiError {
    /// True if the failure is transient and a retry may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout => true,
            ApiError::HttpStatus(status) => *status >= 500 || *status == 429,
            ApiError::IncompleteResponse { .. } => true,
            ApiError::Decode(_)
            | ApiError::ResponseTooLarge
            | ApiError::InvalidBaseUrl(_)
            | ApiError::PhotoRead(_)
            | ApiError::PhotoTooLarge(_) => false,
        }
    }
}

/// Client for the cafeteria service, holding the base URL and timeout from
/// config. Cheap to clone; the inner `reqwest::Client` is already shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    /// Build a client for the given server.
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidBaseUrl`] if the URL is unparseable or uses a
    /// scheme other than http/https.
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        validate_server_url(server_url)
            .map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: server_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// The validated base URL, without a trailing slash. Image paths from
    /// the menu payload join against this.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the current menu, retrying transient failures.
    ///
    /// Retries up to 3 times with exponential backoff (2s, 4s, 8s) on
    /// network errors, timeouts, 429, 5xx, and incomplete bodies. 4xx
    /// failures and undecodable payloads fail immediately.
    pub async fn fetch_menu(&self) -> Result<Vec<CategoryPayload>, ApiError> {
        let url = format!("{}/api/request_current_menu", self.base_url);
        let mut retry_count = 0;

        loop {
            match self.fetch_menu_once(&url).await {
                Ok(categories) => return Ok(categories),
                Err(e) if e.is_retryable() && retry_count < MAX_RETRIES => {
                    let delay_secs = 2u64.pow(retry_count); // 2s, 4s, 8s
                    tracing::warn!(
                        error = %e,
                        retry = retry_count + 1,
                        delay_secs = delay_secs,
                        "Menu fetch failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_menu_once(&self, url: &str) -> Result<Vec<CategoryPayload>, ApiError> {
        let response = tokio::time::timeout(self.timeout, self.http.get(url).send())
            .await
            .map_err(|_| ApiError::Timeout)?
            .map_err(ApiError::Network)?;

        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_BODY_SIZE).await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Ask the service for a meal recommendation.
    pub async fn request_recommendation(
        &self,
        query: &RecommendationQuery,
    ) -> Result<RecommendationPayload, ApiError> {
        let url = format!("{}/api/request_recommendation/", self.base_url);
        self.post_json(&url, query).await
    }

    /// Ask for a revised recommendation, carrying the user's ratings of the
    /// previous answer alongside the original query.
    pub async fn request_revision(
        &self,
        query: &RecommendationQuery,
        ratings: &[MealRating],
    ) -> Result<RecommendationPayload, ApiError> {
        let url = format!("{}/api/request_new_recommendation/", self.base_url);
        let body = RevisionRequest {
            query: query.clone(),
            ratings: ratings.to_vec(),
        };
        self.post_json(&url, &body).await
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize,
        T: serde::de::DeserializeOwned,
    {
        let response = tokio::time::timeout(self.timeout, self.http.post(url).json(body).send())
            .await
            .map_err(|_| ApiError::Timeout)?
            .map_err(ApiError::Network)?;

        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_BODY_SIZE).await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Upload a photo of the printed menu for OCR detection.
    ///
    /// Sends multipart form data: the file under `image_upload`, the OCR
    /// method name under `method` ("GoogleOCR" unless the caller says
    /// otherwise). On success the service replaces the current menu; callers
    /// follow up with [`ApiClient::fetch_menu`].
    pub async fn upload_menu_photo(
        &self,
        photo_path: &Path,
        method: &str,
    ) -> Result<DetectPayload, ApiError> {
        let metadata = tokio::fs::metadata(photo_path).await?;
        if metadata.len() > MAX_PHOTO_SIZE {
            return Err(ApiError::PhotoTooLarge(metadata.len()));
        }

        let bytes = tokio::fs::read(photo_path).await?;
        let file_name = photo_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.jpg".to_string());

        tracing::info!(
            path = %photo_path.display(),
            size = bytes.len(),
            method = method,
            "Uploading menu photo"
        );

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/*")
            .map_err(ApiError::Network)?;
        let form = reqwest::multipart::Form::new()
            .part("image_upload", part)
            .text("method", method.to_string());

        let url = format!("{}/api/detect_and_set_current_menu/", self.base_url);
        let response = tokio::time::timeout(
            self.timeout,
            self.http.post(&url).multipart(form).send(),
        )
        .await
        .map_err(|_| ApiError::Timeout)?
        .map_err(ApiError::Network)?;

        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_BODY_SIZE).await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Clear the current menu on the server.
    pub async fn reset_menu(&self) -> Result<(), ApiError> {
        let url = format!("{}/api/reset_current_menu/", self.base_url);
        let response = tokio::time::timeout(self.timeout, self.http.post(&url).send())
            .await
            .map_err(|_| ApiError::Timeout)?
            .map_err(ApiError::Network)?;

        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, ApiError> {
    // Capture Content-Length for completeness check
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(ApiError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{sample_menu_json, sample_recommendation_json};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query() -> RecommendationQuery {
        RecommendationQuery {
            gender: "male".to_string(),
            age: 20,
            height: 170,
            weight: 60,
            cart_items: vec![101],
            bmr_calculation_method: "default".to_string(),
            bmr: 2000,
            activity_level: "moderate".to_string(),
            food_preferences: String::new(),
            food_allergies: String::new(),
            additional_notes: String::new(),
        }
    }

    async fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn new_rejects_bad_base_url() {
        let result = ApiClient::new("ftp://cafeteria", Duration::from_secs(5));
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl(_))));
    }

    #[test]
    fn new_trims_trailing_slash() {
        let client = ApiClient::new("http://127.0.0.1:9/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9");
    }

    #[tokio::test]
    async fn fetch_menu_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/request_current_menu"))
            .respond_with(ResponseTemplate::new(200).set_body_string(sample_menu_json()))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let categories = client.fetch_menu().await.unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].category, "Burgers");
        assert_eq!(categories[0].items[0].variants[0].variant_id, 101);
    }

    #[tokio::test]
    async fn fetch_menu_404_fails_fast() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1) // No retry on 4xx
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        match client.fetch_menu().await.unwrap_err() {
            ApiError::HttpStatus(404) => {}
            e => panic!("Expected HttpStatus(404), got {:?}", e),
        }
    }

    #[tokio::test]
    async fn fetch_menu_retries_503_then_succeeds() {
        use wiremock::matchers::any;

        let mock_server = MockServer::start().await;

        // First two requests return 503, third succeeds
        Mock::given(any())
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&mock_server)
            .await;

        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_body_string(sample_menu_json()))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let categories = client.fetch_menu().await.unwrap();
        assert_eq!(categories.len(), 2);
    }

    #[tokio::test]
    async fn fetch_menu_decode_error_fails_fast() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        assert!(matches!(
            client.fetch_menu().await.unwrap_err(),
            ApiError::Decode(_)
        ));
    }

    #[tokio::test]
    async fn recommendation_posts_query() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/request_recommendation/"))
            .and(body_partial_json(
                serde_json::json!({"cart_items": [101], "gender": "male"}),
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(sample_recommendation_json()),
            )
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let payload = client.request_recommendation(&query()).await.unwrap();
        assert_eq!(payload.recommended_meals, vec![101]);
    }

    #[tokio::test]
    async fn recommendation_500_does_not_retry() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1) // Non-idempotent, never retried
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        assert!(matches!(
            client.request_recommendation(&query()).await.unwrap_err(),
            ApiError::HttpStatus(500)
        ));
    }

    #[tokio::test]
    async fn revision_posts_query_and_ratings() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/request_new_recommendation/"))
            .and(body_partial_json(serde_json::json!({
                "query": {"cart_items": [101]},
                "ratings": [{"variant_id": 101, "rating": "dislike"}]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(sample_recommendation_json()),
            )
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let ratings = vec![MealRating {
            variant_id: 101,
            rating: "dislike".to_string(),
        }];
        let payload = client.request_revision(&query(), &ratings).await.unwrap();
        assert_eq!(payload.id, "f64299e3-2985-44f6-a6ce-eedaec54c502");
    }

    #[tokio::test]
    async fn upload_sends_multipart_photo() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/detect_and_set_current_menu/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"response": {"rice": 0.9, "curry": 0.7}}"#),
            )
            .mount(&mock_server)
            .await;

        let dir = std::env::temp_dir().join("mensa_upload_test");
        std::fs::create_dir_all(&dir).unwrap();
        let photo = dir.join("menu.jpg");
        std::fs::write(&photo, b"not really a jpeg").unwrap();

        let client = client_for(&mock_server).await;
        let payload = client.upload_menu_photo(&photo, "GoogleOCR").await.unwrap();
        assert_eq!(payload.response.len(), 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn upload_missing_file_errors() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await;
        let result = client
            .upload_menu_photo(Path::new("/nonexistent/menu.jpg"), "GoogleOCR")
            .await;
        assert!(matches!(result, Err(ApiError::PhotoRead(_))));
    }

    #[tokio::test]
    async fn reset_menu_posts() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/reset_current_menu/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        client.reset_menu().await.unwrap();
    }

    #[test]
    fn retryable_classification() {
        assert!(ApiError::Timeout.is_retryable());
        assert!(ApiError::HttpStatus(500).is_retryable());
        assert!(ApiError::HttpStatus(429).is_retryable());
        assert!(!ApiError::HttpStatus(404).is_retryable());
        assert!(!ApiError::Decode("bad".to_string()).is_retryable());
        assert!(!ApiError::ResponseTooLarge.is_retryable());
    }
}
