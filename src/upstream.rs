use actix_web::web::Bytes;
use reqwest::{header, Method, Response, StatusCode};
use tracing::{debug, warn};

use crate::config::ProxyConfig;
use crate::session::{Session, TokenPair};

/// Body forwarded to the backend. Buffered up front so the single 401 retry
/// can replay it (a multipart stream is not replayable).
#[derive(Debug, Clone)]
pub enum UpstreamBody {
    Empty,
    Json(Bytes),
    File {
        filename: String,
        mime: String,
        bytes: Bytes,
    },
}

#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub path: String,
    pub body: UpstreamBody,
}

impl UpstreamRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: UpstreamBody::Empty,
        }
    }

    pub fn json(method: Method, path: impl Into<String>, body: Bytes) -> Self {
        Self {
            method,
            path: path.into(),
            body: UpstreamBody::Json(body),
        }
    }

    pub fn file(path: impl Into<String>, filename: String, mime: String, bytes: Bytes) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: UpstreamBody::File {
                filename,
                mime,
                bytes,
            },
        }
    }
}

/// Result of an authenticated call. `rotated` carries the new token pair
/// when the call went through a refresh; the route handler re-issues the
/// session cookies from it on the outgoing response.
pub struct CallOutcome {
    pub response: Response,
    pub rotated: Option<TokenPair>,
}

/// Authenticated caller for the content backend. Owns the shared reqwest
/// client and the single-refresh-and-retry protocol.
#[derive(Clone)]
pub struct BackendClient {
    cfg: ProxyConfig,
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(cfg: ProxyConfig) -> Self {
        Self {
            cfg,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.cfg
    }

    /// Send with the session's access token. On 401, refresh once and retry
    /// once; a second 401 is surfaced as-is. A missing refresh token or a
    /// rejected refresh call returns the original 401 unchanged. Transport
    /// errors propagate to the route layer.
    pub async fn call(
        &self,
        session: &Session,
        req: &UpstreamRequest,
    ) -> Result<CallOutcome, reqwest::Error> {
        let first = self.send(req, session.access.as_deref()).await?;
        if first.status() != StatusCode::UNAUTHORIZED {
            return Ok(CallOutcome {
                response: first,
                rotated: None,
            });
        }
        let Some(refresh) = session.refresh.as_deref() else {
            return Ok(CallOutcome {
                response: first,
                rotated: None,
            });
        };
        let Some(pair) = self.refresh_tokens(refresh).await? else {
            return Ok(CallOutcome {
                response: first,
                rotated: None,
            });
        };
        debug!(path = %req.path, "access token refreshed, retrying once");
        let second = self.send(req, Some(&pair.access_token)).await?;
        Ok(CallOutcome {
            response: second,
            rotated: Some(pair),
        })
    }

    /// Unauthenticated login passthrough. No bearer header, no refresh.
    pub async fn login(&self, credentials: Bytes) -> Result<Response, reqwest::Error> {
        self.http
            .post(self.cfg.backend_url("/auth/login"))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CACHE_CONTROL, "no-store")
            .body(credentials)
            .send()
            .await
    }

    async fn send(
        &self,
        req: &UpstreamRequest,
        access: Option<&str>,
    ) -> Result<Response, reqwest::Error> {
        let url = self.cfg.backend_url(&req.path);
        let mut builder = self
            .http
            .request(req.method.clone(), &url)
            .header(header::CACHE_CONTROL, "no-store");
        if let Some(token) = access {
            builder = builder.bearer_auth(token);
        }
        builder = match &req.body {
            UpstreamBody::Empty => builder,
            UpstreamBody::Json(bytes) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(bytes.clone()),
            // No explicit Content-Type here: reqwest sets the multipart
            // boundary itself.
            UpstreamBody::File {
                filename,
                mime,
                bytes,
            } => {
                let part = reqwest::multipart::Part::bytes(bytes.to_vec())
                    .file_name(filename.clone())
                    .mime_str(mime)?;
                builder.multipart(reqwest::multipart::Form::new().part("file", part))
            }
        };
        builder.send().await
    }

    /// POST /auth/refresh with the refresh token. A rejected or unparsable
    /// refresh degrades to `None`; the caller then surfaces the original
    /// 401 instead of looping.
    async fn refresh_tokens(&self, refresh: &str) -> Result<Option<TokenPair>, reqwest::Error> {
        let res = self
            .http
            .post(self.cfg.backend_url("/auth/refresh"))
            .header(header::CACHE_CONTROL, "no-store")
            .json(&serde_json::json!({ "refreshToken": refresh }))
            .send()
            .await?;
        if !res.status().is_success() {
            warn!(status = %res.status(), "token refresh rejected by backend");
            return Ok(None);
        }
        match res.json::<TokenPair>().await {
            Ok(pair) => Ok(Some(pair)),
            Err(e) => {
                warn!("unparsable refresh response: {e}");
                Ok(None)
            }
        }
    }
}
