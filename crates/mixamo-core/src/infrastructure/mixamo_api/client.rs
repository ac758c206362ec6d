use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tokio::io::AsyncWriteExt;
use tokio::time::{sleep, Instant};

use super::types::{ExportRequest, MonitorStatus, Product};
use crate::domain::error::{DownloadError, DownloadResult};
use crate::infrastructure::config::ApiConfig;

/// HTTP client for the export endpoints, authenticated with the page's bearer token.
pub struct MixamoApi {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MixamoApi {
    pub fn new(config: &ApiConfig, timeout: Duration) -> DownloadResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("X-Api-Key", &self.api_key)
            .bearer_auth(token)
    }

    pub async fn product(
        &self,
        token: &str,
        product_id: &str,
        character_id: &str,
    ) -> DownloadResult<Product> {
        let response = self
            .request(Method::GET, &format!("/products/{}", product_id), token)
            .query(&[("similar", "0"), ("character_id", character_id)])
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Queue an export job; its progress is reported by [`Self::monitor`].
    pub async fn export(&self, token: &str, request: &ExportRequest) -> DownloadResult<()> {
        let response = self
            .request(Method::POST, "/animations/export", token)
            .json(request)
            .send()
            .await?;
        check(response).await?;
        tracing::debug!(
            "Export requested for {} ({})",
            request.product_name,
            request.character_id
        );
        Ok(())
    }

    pub async fn monitor(&self, token: &str, character_id: &str) -> DownloadResult<MonitorStatus> {
        let response = self
            .request(
                Method::GET,
                &format!("/characters/{}/monitor", character_id),
                token,
            )
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Poll the monitor until the export is ready and return the file URL.
    pub async fn wait_for_export(
        &self,
        token: &str,
        character_id: &str,
        interval: Duration,
        timeout: Duration,
    ) -> DownloadResult<String> {
        let deadline = Instant::now() + timeout;

        loop {
            let status = self.monitor(token, character_id).await?;

            if status.is_completed() {
                return status.job_result.ok_or_else(|| {
                    DownloadError::Network("Export completed without a result URL".to_string())
                });
            }
            if status.is_failed() {
                return Err(DownloadError::Network(format!(
                    "Export failed: {}",
                    status.message.unwrap_or_else(|| "no reason given".to_string())
                )));
            }

            if Instant::now() >= deadline {
                return Err(DownloadError::DownloadTimeout(timeout));
            }
            tracing::trace!("Export status: {}", status.status);
            sleep(interval).await;
        }
    }

    /// Stream a finished export into `dest`.
    pub async fn download_to(&self, url: &str, dest: &Path) -> DownloadResult<()> {
        let mut response = check(self.client.get(url).send().await?).await?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if let Err(e) = write_body(&mut response, dest).await {
            // A truncated file must not be mistaken for a finished export
            if let Err(remove_err) = tokio::fs::remove_file(dest).await {
                tracing::debug!("No partial file to remove at {:?}: {}", dest, remove_err);
            }
            return Err(e);
        }

        tracing::debug!("Fetched {} into {:?}", url, dest);
        Ok(())
    }
}

async fn write_body(response: &mut Response, dest: &Path) -> DownloadResult<()> {
    let mut file = tokio::fs::File::create(dest).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}

/// Turn non-success statuses into task errors.
async fn check(response: Response) -> DownloadResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &url, &body))
}

fn status_error(status: StatusCode, url: &str, body: &str) -> DownloadError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DownloadError::AuthenticationFailed(
            format!("{} rejected the access token ({})", url, status),
        ),
        _ => DownloadError::Network(format!("{} returned {}: {}", url, status, body.trim())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_mapping() {
        let err = status_error(StatusCode::UNAUTHORIZED, "https://x/api", "");
        assert!(matches!(err, DownloadError::AuthenticationFailed(_)));
        assert!(!err.is_transient());

        let err = status_error(StatusCode::BAD_GATEWAY, "https://x/api", " upstream ");
        assert!(matches!(err, DownloadError::Network(ref m) if m.ends_with("upstream")));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_truncated_download_removes_file() {
        use tokio::io::AsyncReadExt;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            // Promise more than is sent, then hang up
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\nhalf an export")
                .await
                .unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("staging").join("task.fbx");
        let api = MixamoApi::new(&ApiConfig::default(), Duration::from_secs(5)).unwrap();

        let err = api
            .download_to(&format!("http://{}/export.fbx", addr), &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Network(_)));
        assert!(!dest.exists());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = ApiConfig {
            base_url: "https://www.mixamo.com/api/v1/".to_string(),
            ..Default::default()
        };
        let api = MixamoApi::new(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url, "https://www.mixamo.com/api/v1");
    }
}
