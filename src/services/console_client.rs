//! src/services/console_client.rs
//!
//! ConsoleClient: HTTP implementation of every collaborator the console core
//! needs: the access-manager REST API (listing, credentials, completion
//! notices, deletes, grants, session) and the pre-signed POST endpoints its
//! credentials point at.

use crate::{
    config::AppConfig,
    errors::{ConsoleError, ConsoleResult},
    interfaces::{
        CompletionNotifier, CredentialIssuer, ListingService, ObjectDeleter, ObjectTransport,
        ProgressFn, SessionApi, TransferReceipt,
    },
    models::{
        audit::CompletionNotice,
        credential::{DownloadCredential, UploadCredential},
        object::ObjectSummary,
        session::{AccessToken, BucketGrant, CurrentUser},
        upload::LocalFile,
    },
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use quick_xml::{Reader, events::Event};
use reqwest::{
    Body, Client, RequestBuilder, Response, StatusCode, Url,
    header::ETAG,
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize};
use std::{
    io::{self, ErrorKind},
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::{fs, io::AsyncWriteExt};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ConsoleClient {
    http: Client,
    /// Server root, e.g. `http://localhost:8000`.
    server_url: String,
    /// Versioned API root, e.g. `http://localhost:8000/api/v1`.
    api_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    objects: Vec<ObjectSummary>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_continuation_token: Option<String>,
}

#[derive(Serialize)]
struct PresignedUrlRequest<'a> {
    bucket_name: &'a str,
    object_key: &'a str,
    operation: &'a str,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ChangePasswordRequest<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

/// Body of the server's `/health` probe.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
}

impl ConsoleClient {
    pub fn new(cfg: &AppConfig) -> ConsoleResult<Self> {
        let http = Client::builder()
            .connect_timeout(cfg.connect_timeout)
            .build()?;
        let server_url = cfg.server_url.trim_end_matches('/').to_string();
        let api_url = format!("{}/{}", server_url, cfg.api_prefix.trim_matches('/'));
        Ok(Self {
            http,
            server_url,
            api_url,
            token: cfg.token.clone(),
        })
    }

    /// Same client, authenticating with `token` from now on.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Map a console API response to `Ok` or a typed error.
    async fn check(resp: Response) -> ConsoleResult<Response> {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ConsoleError::Unauthorized);
        }
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ConsoleError::Api {
            status: status.as_u16(),
            message: service_message(&body).unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
        })
    }

    async fn request_credential<T: serde::de::DeserializeOwned>(
        &self,
        bucket: &str,
        key: &str,
        operation: &str,
    ) -> ConsoleResult<T> {
        let body = PresignedUrlRequest {
            bucket_name: bucket,
            object_key: key,
            operation,
        };
        let resp = self
            .authorized(self.http.post(self.endpoint("s3/presigned-url")))
            .json(&body)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// Grants (bucket + root prefix + capabilities) of the current user.
    pub async fn my_grants(&self) -> ConsoleResult<Vec<BucketGrant>> {
        let resp = self
            .authorized(self.http.get(self.endpoint("permissions/my-permissions")))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// Unauthenticated liveness probe of the console server.
    pub async fn health(&self) -> ConsoleResult<HealthStatus> {
        let resp = self
            .http
            .get(format!("{}/health", self.server_url))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// Stream a pre-signed GET to `dest`.
    ///
    /// Writes to a temporary sibling first and renames into place once the
    /// body is complete, so a failed download never leaves a partial file.
    pub async fn download_to_file(
        &self,
        credential: &DownloadCredential,
        dest: &Path,
        on_progress: ProgressFn,
    ) -> ConsoleResult<u64> {
        let resp = self.http.get(&credential.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ConsoleError::Api {
                status: status.as_u16(),
                message: service_message(&body)
                    .unwrap_or_else(|| format!("Unexpected response (HTTP {})", status.as_u16())),
            });
        }

        let total = resp.content_length().unwrap_or(0);
        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::env::current_dir()?,
        };
        let tmp_path = parent.join(format!(".download-{}", Uuid::new_v4()));
        let mut file = fs::File::create(&tmp_path).await?;

        let mut written: u64 = 0;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(ConsoleError::Http(err));
                }
            };
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(ConsoleError::Io(err));
            }
            written += chunk.len() as u64;
            on_progress(written, total.max(written));
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(ConsoleError::Io(err));
        }
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, dest).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(dest).await?;
                fs::rename(&tmp_path, dest).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(ConsoleError::Io(err));
            }
        }
        Ok(written)
    }

    /// `{api}/s3/object/{bucket}/{key...}` with every segment percent-encoded
    /// and the key's `/` separators preserved.
    fn object_url(&self, bucket: &str, key: &str) -> ConsoleResult<Url> {
        let mut url = Url::parse(&self.api_url).map_err(|e| ConsoleError::Api {
            status: 0,
            message: format!("invalid API url: {}", e),
        })?;
        url.path_segments_mut()
            .map_err(|_| ConsoleError::Api {
                status: 0,
                message: "API url cannot carry a path".into(),
            })?
            .pop_if_empty()
            .extend(["s3", "object", bucket])
            .extend(key.split('/'));
        Ok(url)
    }
}

#[async_trait]
impl ListingService for ConsoleClient {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> ConsoleResult<Vec<ObjectSummary>> {
        let url = self.endpoint(&format!("s3/list/{}", bucket));
        let mut objects = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut query = vec![("prefix", prefix.to_string())];
            if let Some(t) = token.take() {
                query.push(("continuation_token", t));
            }
            let resp = self
                .authorized(self.http.get(&url).query(&query))
                .send()
                .await
                .map_err(|e| ConsoleError::Listing {
                    prefix: prefix.to_string(),
                    reason: e.to_string(),
                })?;
            let page: ListResponse = Self::check(resp).await?.json().await?;
            debug!(
                "listed {} object(s) under {}/{}",
                page.objects.len(),
                bucket,
                prefix
            );
            objects.extend(page.objects);

            match page.next_continuation_token {
                Some(next) if page.has_more => token = Some(next),
                _ => {
                    if page.has_more {
                        warn!(
                            "listing of {}/{} truncated by server at {} object(s)",
                            bucket,
                            prefix,
                            objects.len()
                        );
                    }
                    return Ok(objects);
                }
            }
        }
    }
}

#[async_trait]
impl CredentialIssuer for ConsoleClient {
    async fn issue_upload_credential(
        &self,
        bucket: &str,
        key: &str,
    ) -> ConsoleResult<UploadCredential> {
        self.request_credential(bucket, key, "upload")
            .await
            .map_err(|err| credential_error(key, err))
    }

    async fn issue_download_credential(
        &self,
        bucket: &str,
        key: &str,
    ) -> ConsoleResult<DownloadCredential> {
        self.request_credential(bucket, key, "download")
            .await
            .map_err(|err| credential_error(key, err))
    }
}

fn credential_error(key: &str, err: ConsoleError) -> ConsoleError {
    match err {
        ConsoleError::Unauthorized => err,
        other => ConsoleError::Credential {
            key: key.to_string(),
            reason: other.detail(),
        },
    }
}

#[async_trait]
impl ObjectTransport for ConsoleClient {
    async fn post_object(
        &self,
        credential: &UploadCredential,
        file: &LocalFile,
        on_progress: ProgressFn,
    ) -> ConsoleResult<TransferReceipt> {
        let key = credential
            .fields
            .iter()
            .find(|(name, _)| name == "key")
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| file.name.clone());
        let transfer_error = |reason: String| ConsoleError::Transfer {
            key: key.clone(),
            reason,
        };

        let handle = fs::File::open(&file.path)
            .await
            .map_err(|e| transfer_error(format!("could not read {}: {}", file.name, e)))?;
        let total = handle
            .metadata()
            .await
            .map(|m| m.len())
            .unwrap_or(file.size);

        let digest = Arc::new(Mutex::new(md5::Context::new()));
        let sent = Arc::new(AtomicU64::new(0));
        let stream = {
            let digest = digest.clone();
            ReaderStream::new(handle).map(move |chunk: io::Result<Bytes>| {
                if let Ok(bytes) = &chunk {
                    if let Ok(mut ctx) = digest.lock() {
                        ctx.consume(bytes);
                    }
                    let so_far = sent.fetch_add(bytes.len() as u64, Ordering::Relaxed)
                        + bytes.len() as u64;
                    on_progress(so_far, total);
                }
                chunk
            })
        };

        // Credential fields first, in issue order; the file must be last.
        let mut form = Form::new();
        for (name, value) in &credential.fields {
            form = form.text(name.clone(), value.clone());
        }
        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(file.name.clone());
        form = form.part("file", part);

        let resp = self
            .http
            .post(&credential.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transfer_error(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let reason = service_message(&body)
                .unwrap_or_else(|| format!("Unexpected response (HTTP {})", status.as_u16()));
            return Err(transfer_error(reason));
        }

        let etag = resp
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string());
        let local_md5 = digest.lock().ok().map(|mut ctx| {
            let finished = std::mem::replace(&mut *ctx, md5::Context::new());
            format!("{:x}", finished.compute())
        });

        Ok(TransferReceipt {
            status: status.as_u16(),
            etag,
            local_md5,
        })
    }
}

#[async_trait]
impl CompletionNotifier for ConsoleClient {
    async fn notify(&self, notice: &CompletionNotice) -> ConsoleResult<()> {
        let resp = self
            .authorized(self.http.post(self.endpoint("s3/upload-complete")))
            .json(notice)
            .send()
            .await
            .map_err(|e| ConsoleError::Notification {
                key: notice.object_key.clone(),
                reason: e.to_string(),
            })?;
        Self::check(resp).await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectDeleter for ConsoleClient {
    async fn delete_object(&self, bucket: &str, key: &str) -> ConsoleResult<()> {
        let url = self.object_url(bucket, key)?;
        let result = async {
            let resp = self.authorized(self.http.delete(url)).send().await?;
            Self::check(resp).await
        }
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(ConsoleError::Unauthorized) => Err(ConsoleError::Unauthorized),
            Err(err) => Err(ConsoleError::Delete {
                key: key.to_string(),
                reason: err.detail(),
            }),
        }
    }
}

#[async_trait]
impl SessionApi for ConsoleClient {
    async fn login(&self, email: &str, password: &str) -> ConsoleResult<AccessToken> {
        let resp = self
            .http
            .post(self.endpoint("auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        // a 401 here means bad credentials, not an expired session
        if resp.status() == StatusCode::UNAUTHORIZED {
            let body = resp.text().await.unwrap_or_default();
            return Err(ConsoleError::Api {
                status: 401,
                message: service_message(&body)
                    .unwrap_or_else(|| "Incorrect email or password".into()),
            });
        }
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn current_user(&self) -> ConsoleResult<CurrentUser> {
        let resp = self
            .authorized(self.http.get(self.endpoint("auth/me")))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> ConsoleResult<()> {
        let resp = self
            .authorized(self.http.post(self.endpoint("auth/change-password")))
            .json(&ChangePasswordRequest {
                current_password,
                new_password,
            })
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}

/// Most specific human-readable message in an error body.
///
/// JSON `message`, then JSON `detail` (string, or the first validation
/// error's `msg`), then an S3-style XML `<Message>`.
pub fn service_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = value.get("message").and_then(|m| m.as_str()) {
            return Some(msg.to_string());
        }
        match value.get("detail") {
            Some(serde_json::Value::String(detail)) => return Some(detail.clone()),
            Some(serde_json::Value::Array(items)) => {
                if let Some(msg) = items
                    .first()
                    .and_then(|i| i.get("msg"))
                    .and_then(|m| m.as_str())
                {
                    return Some(msg.to_string());
                }
            }
            _ => {}
        }
        return None;
    }

    xml_message(body)
}

/// Text of the first `<Message>` element of an S3-style XML error body.
fn xml_message(body: &str) -> Option<String> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut in_message = false;
    let mut text = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"Message" => in_message = true,
            Ok(Event::End(e)) if e.name().as_ref() == b"Message" => break,
            Ok(Event::Text(e)) if in_message => text.push_str(&e.unescape().ok()?),
            Ok(Event::CData(e)) if in_message => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()))
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
