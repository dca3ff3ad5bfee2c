//! HTTP implementation of [`SegmentationBackend`] using [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use web_time::Instant;

use super::api::{
    AddPointRequest, AddPointResponse, AutoAnnotateRequest, AutoAnnotateResponse, HealthResponse,
    SessionRequest, StartSessionRequest, StartSessionResponse, UploadResponse,
};
use super::{BackendError, SegmentationBackend};
use crate::config::BackendConfig;
use crate::model::ImageFile;

/// Client for one segmentation service, plus an optional separate detector.
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
    detector_url: String,
}

impl HttpBackend {
    /// * `api_url` - Base HTTP URL, e.g. `http://localhost:5000`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = normalize_base(api_url.into());
        Self {
            client,
            detector_url: api_url.clone(),
            api_url,
        }
    }

    /// Build a client with the configured URLs and request timeout.
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let backend = Self::with_client(client, config.base_url.clone());
        Ok(match &config.detector_url {
            Some(url) => backend.with_detector_url(url.clone()),
            None => backend,
        })
    }

    /// Send `auto_annotate` to a different service than segmentation.
    pub fn with_detector_url(mut self, url: impl Into<String>) -> Self {
        self.detector_url = normalize_base(url.into());
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn detector_url(&self) -> &str {
        &self.detector_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.api_url, path)
    }

    fn image_part(image: &ImageFile) -> Result<Part, BackendError> {
        Ok(Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)?)
    }

    async fn post_json<Req, Resp>(&self, url: String, body: &Req) -> Result<Resp, BackendError>
    where
        Req: serde::Serialize + ?Sized,
        Resp: serde::de::DeserializeOwned,
    {
        let start = Instant::now();
        let response = self.client.post(&url).json(body).send().await?;
        log::debug!("POST {} -> {} in {:?}", url, response.status(), start.elapsed());
        Self::parse_response(response).await
    }

    async fn post_json_no_content<Req>(&self, url: String, body: &Req) -> Result<(), BackendError>
    where
        Req: serde::Serialize + ?Sized,
    {
        let start = Instant::now();
        let response = self.client.post(&url).json(body).send().await?;
        log::debug!("POST {} -> {} in {:?}", url, response.status(), start.elapsed());
        Self::check_status(response).await
    }

    // ---- private helpers ----

    /// Turn a non-2xx response into [`BackendError::Api`] with the body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), BackendError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

fn normalize_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[async_trait]
impl SegmentationBackend for HttpBackend {
    async fn upload(&self, image: &ImageFile) -> Result<UploadResponse, BackendError> {
        let url = self.endpoint("upload");
        let form = Form::new().part("file", Self::image_part(image)?);

        let start = Instant::now();
        let response = self.client.post(&url).multipart(form).send().await?;
        log::debug!(
            "POST {} ({} bytes) -> {} in {:?}",
            url,
            image.bytes.len(),
            response.status(),
            start.elapsed()
        );
        Self::parse_response(response).await
    }

    async fn start_session(&self, image_path: &str) -> Result<StartSessionResponse, BackendError> {
        let body = StartSessionRequest {
            image_path: image_path.to_string(),
        };
        self.post_json(self.endpoint("start_session"), &body).await
    }

    async fn add_point(&self, request: &AddPointRequest) -> Result<AddPointResponse, BackendError> {
        self.post_json(self.endpoint("add_point"), request).await
    }

    async fn clear_points(&self, session_id: &str) -> Result<(), BackendError> {
        let body = SessionRequest {
            session_id: session_id.to_string(),
        };
        self.post_json_no_content(self.endpoint("clear_points"), &body)
            .await
    }

    async fn close_session(&self, session_id: &str) -> Result<(), BackendError> {
        let body = SessionRequest {
            session_id: session_id.to_string(),
        };
        self.post_json_no_content(self.endpoint("close_session"), &body)
            .await
    }

    async fn health(&self) -> Result<HealthResponse, BackendError> {
        let url = self.endpoint("health");
        let response = self.client.get(&url).send().await?;
        Self::parse_response(response).await
    }

    async fn auto_annotate(
        &self,
        image: &ImageFile,
        request: &AutoAnnotateRequest,
    ) -> Result<AutoAnnotateResponse, BackendError> {
        let url = format!("{}/api/auto_annotate", self.detector_url);
        let form = Form::new()
            .part("image", Self::image_part(image)?)
            .text("text_prompt", request.text_prompt.clone())
            .text("box_threshold", request.box_threshold.to_string())
            .text("text_threshold", request.text_threshold.to_string());

        let start = Instant::now();
        let response = self.client.post(&url).multipart(form).send().await?;
        log::debug!("POST {} -> {} in {:?}", url, response.status(), start.elapsed());

        let parsed: AutoAnnotateResponse = Self::parse_response(response).await?;
        if !parsed.success {
            return Err(BackendError::Rejected(
                parsed
                    .error
                    .unwrap_or_else(|| "detection reported failure".to_string()),
            ));
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let backend = HttpBackend::new("http://localhost:5000/");
        assert_eq!(backend.endpoint("add_point"), "http://localhost:5000/api/add_point");
    }

    #[test]
    fn test_detector_defaults_to_api_url() {
        let backend = HttpBackend::new("http://seg:5000");
        assert_eq!(backend.detector_url(), "http://seg:5000");

        let backend = backend.with_detector_url("http://det:5001/");
        assert_eq!(backend.detector_url(), "http://det:5001");
        assert_eq!(backend.api_url(), "http://seg:5000");
    }

    #[test]
    fn test_from_config_uses_detector_override() {
        let config = BackendConfig {
            detector_url: Some("http://gpu-box:7000".to_string()),
            ..BackendConfig::default()
        };
        let backend = HttpBackend::from_config(&config).unwrap();
        assert_eq!(backend.api_url(), "http://localhost:5000");
        assert_eq!(backend.detector_url(), "http://gpu-box:7000");
    }
}
