use std::time::Duration;

use bytes::{Bytes, BytesMut};
use engine_logging::{engine_debug, engine_info};
use futures_util::StreamExt;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use url::Url;
use vidgen_core::{
    AssetBundle, AssetCategory, CreateJobRequest, Job, JobId, JobStatusSnapshot, Script,
};

use crate::envelope::{self, AssetsPayload, Body};
use crate::{
    ApiError, Download, DownloadProgress, FailureKind, HealthReport, ToolVersion, UploadReceipt,
};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Applies to binary downloads instead of `request_timeout`.
    pub download_timeout: Duration,
    pub max_download_bytes: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
            download_timeout: Duration::from_secs(300),
            max_download_bytes: 512 * 1024 * 1024,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, progress: DownloadProgress);
}

/// Typed access to the job backend's HTTP contract.
#[async_trait::async_trait]
pub trait BackendClient: Send + Sync {
    async fn health(&self) -> Result<HealthReport, ApiError>;
    async fn tool_version(&self) -> Result<ToolVersion, ApiError>;
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadReceipt, ApiError>;
    async fn list_jobs(&self) -> Result<Vec<Job>, ApiError>;
    async fn job_status(&self, job_id: &str) -> Result<JobStatusSnapshot, ApiError>;
    async fn create_job(&self, request: &CreateJobRequest) -> Result<JobId, ApiError>;
    /// Returns the backend's confirmation message.
    async fn cancel_job(&self, job_id: &str) -> Result<String, ApiError>;
    async fn script(&self, job_id: &str) -> Result<Script, ApiError>;
    async fn assets(&self, job_id: &str) -> Result<AssetBundle, ApiError>;
    async fn download_video(
        &self,
        job_id: &str,
        sink: &dyn ProgressSink,
    ) -> Result<Download, ApiError>;
    async fn download_asset(
        &self,
        job_id: &str,
        category: AssetCategory,
        filename: &str,
        sink: &dyn ProgressSink,
    ) -> Result<Download, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    base_url: Url,
    client: reqwest::Client,
    settings: BackendSettings,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(settings.base_url.trim())
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{base_url} cannot be used as a base url"),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            base_url,
            client,
            settings,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins percent-encoded path segments onto the base url.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::new(FailureKind::InvalidUrl, "base url cannot have a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        engine_debug!("{} {}", method, url);
        Ok(self.client.request(method, url))
    }

    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, Bytes), ApiError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let raw = response.bytes().await.map_err(map_reqwest_error)?;
        Ok((status, raw))
    }

    async fn send_json(&self, request: RequestBuilder) -> Result<Body, ApiError> {
        let (status, raw) = self.send(request).await?;
        envelope::open(status, &raw)
    }

    async fn get_json(&self, segments: &[&str]) -> Result<Body, ApiError> {
        let request = self.request(Method::GET, segments)?;
        self.send_json(request).await
    }

    async fn download(
        &self,
        segments: &[&str],
        sink: &dyn ProgressSink,
    ) -> Result<Download, ApiError> {
        let request = self
            .request(Method::GET, segments)?
            .timeout(self.settings.download_timeout);
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            let raw = response.bytes().await.map_err(map_reqwest_error)?;
            return match envelope::open(status, &raw) {
                Err(err) => Err(err),
                Ok(_) => Err(ApiError::new(
                    FailureKind::HttpStatus(status.as_u16()),
                    status.to_string(),
                )),
            };
        }
        read_limited(response, self.settings.max_download_bytes, sink).await
    }
}

#[async_trait::async_trait]
impl BackendClient for ReqwestBackend {
    async fn health(&self) -> Result<HealthReport, ApiError> {
        let body = self.get_json(&["api", "test"]).await?;
        envelope::whole(body)
    }

    async fn tool_version(&self) -> Result<ToolVersion, ApiError> {
        let body = self.get_json(&["api", "blender-version"]).await?;
        envelope::whole(body)
    }

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadReceipt, ApiError> {
        engine_info!("uploading {} ({} bytes)", filename, bytes.len());
        let part = Part::bytes(bytes).file_name(filename.to_string());
        let form = Form::new().part("file", part);
        let request = self.request(Method::POST, &["api", "upload"])?.multipart(form);
        let body = self.send_json(request).await?;
        envelope::whole(body)
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, ApiError> {
        let mut body = self.get_json(&["api", "jobs"]).await?;
        envelope::field(&mut body, "jobs")
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusSnapshot, ApiError> {
        let request = self.request(Method::GET, &["api", "job", job_id])?;
        let (status, raw) = self.send(request).await?;
        let mut body = envelope::open_job(status, &raw)?;
        let mut snapshot: JobStatusSnapshot = if body.contains_key("job") {
            envelope::field(&mut body, "job")?
        } else {
            envelope::whole(body)?
        };
        if snapshot.job_id.is_empty() {
            snapshot.job_id = job_id.to_string();
        }
        Ok(snapshot)
    }

    async fn create_job(&self, request: &CreateJobRequest) -> Result<JobId, ApiError> {
        let builder = self.request(Method::POST, &["api", "job"])?.json(request);
        let mut body = self.send_json(builder).await?;
        let job_id: JobId = envelope::field(&mut body, "job_id")?;
        engine_info!("backend accepted job {}", job_id);
        Ok(job_id)
    }

    async fn cancel_job(&self, job_id: &str) -> Result<String, ApiError> {
        let request = self.request(Method::POST, &["api", "job", job_id, "cancel"])?;
        let body = self.send_json(request).await?;
        Ok(envelope::message(&body))
    }

    async fn script(&self, job_id: &str) -> Result<Script, ApiError> {
        let mut body = self.get_json(&["api", "script", job_id]).await?;
        envelope::field(&mut body, "script")
    }

    async fn assets(&self, job_id: &str) -> Result<AssetBundle, ApiError> {
        let mut body = self.get_json(&["api", "assets", job_id]).await?;
        let payload: AssetsPayload = envelope::field(&mut body, "assets")?;
        Ok(payload.into_bundle())
    }

    async fn download_video(
        &self,
        job_id: &str,
        sink: &dyn ProgressSink,
    ) -> Result<Download, ApiError> {
        self.download(&["api", "video", job_id], sink).await
    }

    async fn download_asset(
        &self,
        job_id: &str,
        category: AssetCategory,
        filename: &str,
        sink: &dyn ProgressSink,
    ) -> Result<Download, ApiError> {
        self.download(&["api", "asset", job_id, category.as_str(), filename], sink)
            .await
    }
}

async fn read_limited(
    response: Response,
    max_bytes: u64,
    sink: &dyn ProgressSink,
) -> Result<Download, ApiError> {
    let total = response.content_length();
    if let Some(len) = total {
        if len > max_bytes {
            return Err(ApiError::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(len),
                },
                "response too large",
            ));
        }
    }

    let content_type = header_text(&response, CONTENT_TYPE);
    let suggested_name =
        header_text(&response, CONTENT_DISPOSITION).and_then(|value| disposition_filename(&value));

    sink.emit(DownloadProgress { received: 0, total });
    let capacity = total.unwrap_or(0).min(max_bytes);
    let mut bytes = BytesMut::with_capacity(usize::try_from(capacity).unwrap_or(0));
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        let next_len = bytes.len() as u64 + chunk.len() as u64;
        if next_len > max_bytes {
            return Err(ApiError::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(next_len),
                },
                "response too large",
            ));
        }
        bytes.extend_from_slice(&chunk);
        sink.emit(DownloadProgress {
            received: next_len,
            total,
        });
    }

    Ok(Download {
        bytes: bytes.freeze(),
        content_type,
        suggested_name,
    })
}

fn header_text(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Pulls `filename` out of a `Content-Disposition` header value.
fn disposition_filename(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return ApiError::new(FailureKind::InvalidUrl, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base_url: &str) -> ReqwestBackend {
        ReqwestBackend::new(BackendSettings {
            base_url: base_url.to_string(),
            ..BackendSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoint_percent_encodes_segments() {
        let url = backend("http://localhost:5000")
            .endpoint(&["api", "job", "a b/c"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/job/a%20b%2Fc");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let url = backend("http://example.test/backend/")
            .endpoint(&["api", "jobs"])
            .unwrap();
        assert_eq!(url.as_str(), "http://example.test/backend/api/jobs");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ReqwestBackend::new(BackendSettings {
            base_url: "not a url".to_string(),
            ..BackendSettings::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }

    #[test]
    fn disposition_filename_is_unquoted() {
        assert_eq!(
            disposition_filename("attachment; filename=\"abc123.mp4\""),
            Some("abc123.mp4".to_string())
        );
        assert_eq!(disposition_filename("inline"), None);
    }
}
