//! HTTP client for the pipeline backend.
//!
//! Every JSON reply is checked for an `error` field before it is decoded, so a
//! backend-reported failure surfaces as [`ApiError::Backend`] even on HTTP 200.

use crate::model::{
    BackendReply, ControllerConfig, FileContent, FileInfo, LogsReply, PipelineSnapshot,
    SaveFileRequest, Step, StepRequest, SubtitleLang,
};
use bytes::Bytes;
use futures::StreamExt;
use reqwest::{StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        endpoint: String,
        status: StatusCode,
    },
    #[error("{0}")]
    Backend(String),
    #[error("could not decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
    #[error("writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Message fit for a user-facing notice.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Backend(msg) => msg.clone(),
            ApiError::Transport { .. } => "Connection error".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base: Url,
    request_timeout: Duration,
}

impl BackendClient {
    pub fn new(cfg: &ControllerConfig) -> Result<Self, ApiError> {
        let mut base = Url::parse(&cfg.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", cfg.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(cfg.base_url.clone()));
        }
        // `Url::join` replaces the last segment unless the path ends in a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .connect_timeout(cfg.request_timeout)
            .build()
            .map_err(|e| ApiError::Transport {
                endpoint: base.to_string(),
                source: e,
            })?;

        Ok(Self {
            http,
            base,
            request_timeout: cfg.request_timeout,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    /// URL of a file served from the backend's working directory.
    pub fn asset_url(&self, filename: &str) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .push(filename);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let resp = self
            .http
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| transport(path, e))?;
        decode(path, resp).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let mut req = self.http.post(url).timeout(self.request_timeout);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await.map_err(|e| transport(path, e))?;
        decode(path, resp).await
    }

    pub async fn status(&self) -> Result<PipelineSnapshot, ApiError> {
        self.get_json("api/status").await
    }

    pub async fn refresh(&self) -> Result<PipelineSnapshot, ApiError> {
        self.get_json("api/refresh").await
    }

    /// Ask the backend to start `step`; returns its acknowledgement message.
    pub async fn start_step(&self, step: Step, request: &StepRequest) -> Result<String, ApiError> {
        let reply: BackendReply = self
            .post_json(&format!("api/step/{}", step.index()), Some(request))
            .await?;
        Ok(reply.message.unwrap_or_default())
    }

    pub async fn file(&self, lang: SubtitleLang) -> Result<String, ApiError> {
        let reply: FileContent = self
            .get_json(&format!("api/file/{}", lang.as_path()))
            .await?;
        Ok(reply.content)
    }

    pub async fn save_file(
        &self,
        lang: SubtitleLang,
        content: &str,
    ) -> Result<Option<String>, ApiError> {
        let reply: BackendReply = self
            .post_json(
                &format!("api/file/{}", lang.as_path()),
                Some(&SaveFileRequest { content }),
            )
            .await?;
        Ok(reply.message)
    }

    pub async fn reload_file(&self, lang: SubtitleLang) -> Result<String, ApiError> {
        let reply: FileContent = self
            .get_json(&format!("api/file/reload/{}", lang.as_path()))
            .await?;
        Ok(reply.content)
    }

    pub async fn files_info(&self) -> Result<Vec<FileInfo>, ApiError> {
        let files: Option<Vec<FileInfo>> = self.get_json("api/file/files_info").await?;
        Ok(files.unwrap_or_default())
    }

    pub async fn clear(&self) -> Result<String, ApiError> {
        let reply: BackendReply = self.post_json::<(), _>("api/clear", None).await?;
        Ok(reply.message.unwrap_or_default())
    }

    pub async fn logs(&self) -> Result<Vec<String>, ApiError> {
        let reply: LogsReply = self.get_json("api/logs").await?;
        Ok(reply.logs)
    }

    /// Stream `filename` from the backend into `dest`, reporting `(written, total)`.
    pub async fn download(
        &self,
        filename: &str,
        dest: &Path,
        mut progress: impl FnMut(u64, Option<u64>),
    ) -> Result<u64, ApiError> {
        let url = self.asset_url(filename)?;
        debug!(%url, dest = %dest.display(), "download");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| transport(filename, e))?;
        if !resp.status().is_success() {
            return Err(ApiError::Status {
                endpoint: filename.to_string(),
                status: resp.status(),
            });
        }
        // Stream into a sibling file so a failed transfer never clobbers an
        // earlier download at `dest`.
        let part = part_path(dest);
        let written = match stream_into(&part, resp, filename, &mut progress).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                return Err(e);
            }
        };
        if let Err(source) = tokio::fs::rename(&part, dest).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(ApiError::Io {
                path: dest.display().to_string(),
                source,
            });
        }
        Ok(written)
    }
}

/// `video.mp4` -> `video.mp4.part` in the same directory.
fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(OsString::from).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

async fn stream_into(
    path: &Path,
    resp: reqwest::Response,
    endpoint: &str,
    progress: &mut impl FnMut(u64, Option<u64>),
) -> Result<u64, ApiError> {
    let total = resp.content_length();
    let io_err = |source: std::io::Error| ApiError::Io {
        path: path.display().to_string(),
        source,
    };
    let mut file = tokio::fs::File::create(path).await.map_err(io_err)?;
    let mut written = 0u64;
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk: Bytes = chunk.map_err(|e| transport(endpoint, e))?;
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
        progress(written, total);
    }
    if total.is_some_and(|t| written < t) {
        return Err(io_err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("response ended after {written} bytes"),
        )));
    }
    file.flush().await.map_err(io_err)?;
    Ok(written)
}

/// Message for a truthy `error` field; `null`, `false`, `""` and `0` mean none.
fn backend_error(err: &serde_json::Value) -> Option<String> {
    use serde_json::Value;
    match err {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn transport(endpoint: &str, source: reqwest::Error) -> ApiError {
    ApiError::Transport {
        endpoint: endpoint.to_string(),
        source,
    }
}

async fn decode<T: DeserializeOwned>(endpoint: &str, resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.bytes().await.map_err(|e| transport(endpoint, e))?;

    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) if !status.is_success() => {
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status,
            })
        }
        Err(source) => {
            return Err(ApiError::Decode {
                endpoint: endpoint.to_string(),
                source,
            })
        }
    };

    if let Some(msg) = value.get("error").and_then(backend_error) {
        return Err(ApiError::Backend(msg));
    }
    if !status.is_success() {
        return Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
        });
    }

    serde_json::from_value(value).map_err(|source| ApiError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}
