// bizdesk-client/src/http.rs
// HTTP 客户端 - 网络通信

use async_trait::async_trait;
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// 服务端返回的错误响应格式
#[derive(serde::Deserialize)]
struct ApiErrorResponse {
    message: String,
}

/// HTTP 客户端 trait
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T>;
    async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T>;
    async fn post_empty(&self, path: &str) -> ClientResult<()>;
    async fn put<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T>;
    async fn delete(&self, path: &str) -> ClientResult<()>;
}

/// 网络 HTTP 客户端
#[derive(Debug, Clone)]
pub struct NetworkHttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl NetworkHttpClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// 获取基础 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the authentication token
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(t) => req.header(reqwest::header::AUTHORIZATION, format!("Bearer {}", t)),
            None => req,
        }
    }

    async fn check_status(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await?;
        // 优先使用服务端的错误消息
        let message = serde_json::from_str::<ApiErrorResponse>(&text)
            .map(|e| e.message)
            .unwrap_or(text);
        Err(status_error(status, message))
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

/// Request path from raw segments, each one percent-encoded
///
/// Ids may hold `/`, `?` or `#` and must still address a single resource.
pub fn api_path(segments: &[&str]) -> ClientResult<String> {
    let mut url = Url::parse("http://localhost/").map_err(|e| ClientError::Config(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ClientError::Config("base URL cannot carry a path".to_string()))?
        .clear()
        .extend(segments);
    Ok(url.path().trim_start_matches('/').to_string())
}

/// Map a non-success status to a client error
pub fn status_error(status: StatusCode, message: String) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::CONFLICT => ClientError::Conflict(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ClientError::Validation(message)
        }
        _ => ClientError::Internal(format!("{}: {}", status, message)),
    }
}

#[async_trait]
impl HttpClient for NetworkHttpClient {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let req = self.authorize(self.client.get(self.url(path)));
        Self::handle_response(req.send().await?).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let req = self.authorize(self.client.post(self.url(path)).json(body));
        Self::handle_response(req.send().await?).await
    }

    async fn post_empty(&self, path: &str) -> ClientResult<()> {
        let req = self.authorize(self.client.post(self.url(path)));
        Self::check_status(req.send().await?).await?;
        Ok(())
    }

    async fn put<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let req = self.authorize(self.client.put(self.url(path)).json(body));
        Self::handle_response(req.send().await?).await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        let req = self.authorize(self.client.delete(self.url(path)));
        Self::check_status(req.send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "x".into()),
            ClientError::NotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::CONFLICT, "x".into()),
            ClientError::Conflict(_)
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "x".into()),
            ClientError::Unauthorized
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "x".into()),
            ClientError::Internal(_)
        ));
    }

    #[test]
    fn test_api_path_encodes_segments() {
        assert_eq!(
            api_path(&["api", "permission-groups", "a"]).unwrap(),
            "api/permission-groups/a"
        );
        assert_eq!(
            api_path(&["api", "permission-groups", "x/y?z#w", "clone"]).unwrap(),
            "api/permission-groups/x%2Fy%3Fz%23w/clone"
        );
        assert_eq!(api_path(&["api", "packages", "pro plan"]).unwrap(), "api/packages/pro%20plan");
    }

    #[test]
    fn test_url_joining() {
        let client =
            NetworkHttpClient::new(&ClientConfig::new("https://api.example.com/")).unwrap();
        assert_eq!(client.base_url(), "https://api.example.com");
        assert_eq!(
            client.url("/api/permission-groups"),
            "https://api.example.com/api/permission-groups"
        );
    }
}
