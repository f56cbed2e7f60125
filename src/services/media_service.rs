//! src/services/media_service.rs
//!
//! Client for the remote media-hosting service (Cloudinary upload API).
//! Accepts a binary image payload and returns the hosted `Picture`
//! reference. Uploads are signed per request; nothing is persisted locally.

use crate::{config::MediaConfig, models::picture::Picture};
use bytes::Bytes;
use chrono::Utc;
use reqwest::multipart;
use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::debug;

/// Folder on the media store under which all car images land.
const UPLOAD_FOLDER: &str = "cars";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media store rejected upload with status {status}: {body}")]
    UploadRejected { status: u16, body: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type MediaResult<T> = Result<T, MediaError>;

/// One image file extracted from an inbound multipart request.
#[derive(Clone, Debug)]
pub struct ImagePayload {
    /// Client-supplied filename, used only for the upload form part.
    pub filename: String,
    /// Raw file bytes.
    pub bytes: Bytes,
}

/// Seam between the listing service and the remote media store.
///
/// A direct asynchronous call: one binary payload in, one hosted picture
/// reference out, or an error that fails the surrounding request.
pub trait MediaStore {
    fn upload_image(
        &self,
        payload: ImagePayload,
    ) -> impl Future<Output = MediaResult<Picture>> + Send;
}

/// Upload all payloads concurrently and collect the hosted references.
///
/// The returned pictures match the input order, not completion order.
/// Any single failure fails the whole batch; already-uploaded images are
/// not cleaned up.
pub async fn upload_all<M: MediaStore>(
    media: &M,
    payloads: Vec<ImagePayload>,
) -> MediaResult<Vec<Picture>> {
    let uploads = payloads.into_iter().map(|payload| media.upload_image(payload));
    futures::future::try_join_all(uploads).await
}

/// Cloudinary-style signed upload client.
#[derive(Clone)]
pub struct CloudinaryClient {
    http: reqwest::Client,
    config: MediaConfig,
}

/// Fields of the media store's upload response we care about.
#[derive(serde::Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

impl CloudinaryClient {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/auto/upload",
            self.config.cloud_name
        )
    }
}

impl MediaStore for CloudinaryClient {
    async fn upload_image(&self, payload: ImagePayload) -> MediaResult<Picture> {
        let timestamp = Utc::now().timestamp();
        let signature = sign_upload(UPLOAD_FOLDER, timestamp, &self.config.api_secret);

        let file = multipart::Part::bytes(payload.bytes.to_vec()).file_name(payload.filename);
        let form = multipart::Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", UPLOAD_FOLDER)
            .text("signature", signature);

        let response = self
            .http
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::UploadRejected {
                status: status.as_u16(),
                body,
            });
        }

        let uploaded: UploadResponse = response.json().await?;
        debug!("uploaded image as {}", uploaded.public_id);

        Ok(Picture {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }
}

/// Compute the request signature the media store expects: the lowercase
/// hex SHA-1 of the sorted upload parameters with the API secret appended.
fn sign_upload(folder: &str, timestamp: i64, api_secret: &str) -> String {
    let to_sign = format!("folder={folder}&timestamp={timestamp}{api_secret}");
    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn signature_is_deterministic() {
        let a = sign_upload("cars", 1_700_000_000, "secret");
        let b = sign_upload("cars", 1_700_000_000, "secret");
        assert_eq!(a, b);
    }

    #[test]
    fn signature_is_lowercase_sha1_hex() {
        let sig = sign_upload("cars", 1_700_000_000, "secret");
        assert_eq!(sig.len(), 40, "SHA-1 hex digest is 40 characters");
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(sig, sig.to_lowercase());
    }

    #[test]
    fn signature_depends_on_secret_and_timestamp() {
        let base = sign_upload("cars", 1_700_000_000, "secret");
        assert_ne!(base, sign_upload("cars", 1_700_000_000, "other"));
        assert_ne!(base, sign_upload("cars", 1_700_000_001, "secret"));
    }

    /// Resolves each upload after a delay inversely proportional to its
    /// position, so later inputs complete first.
    struct SlowStore;

    impl MediaStore for SlowStore {
        async fn upload_image(&self, payload: ImagePayload) -> MediaResult<Picture> {
            let index: u64 = payload.filename.parse().unwrap();
            tokio::time::sleep(Duration::from_millis(50 - index * 10)).await;
            Ok(Picture {
                url: format!("https://cdn.test/{index}"),
                public_id: payload.filename,
            })
        }
    }

    struct FailingStore;

    impl MediaStore for FailingStore {
        async fn upload_image(&self, payload: ImagePayload) -> MediaResult<Picture> {
            if payload.filename == "bad" {
                return Err(MediaError::UploadRejected {
                    status: 400,
                    body: "invalid image".into(),
                });
            }
            Ok(Picture {
                url: "https://cdn.test/ok".into(),
                public_id: payload.filename,
            })
        }
    }

    fn payloads(names: &[&str]) -> Vec<ImagePayload> {
        names
            .iter()
            .map(|name| ImagePayload {
                filename: (*name).to_string(),
                bytes: Bytes::from_static(b"jpeg"),
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn upload_all_preserves_input_order() {
        let pictures = upload_all(&SlowStore, payloads(&["0", "1", "2", "3"]))
            .await
            .unwrap();

        let ids: Vec<&str> = pictures.iter().map(|p| p.public_id.as_str()).collect();
        assert_eq!(ids, ["0", "1", "2", "3"]);
    }

    #[tokio::test]
    async fn upload_all_fails_whole_batch_on_single_error() {
        let result = upload_all(&FailingStore, payloads(&["a", "bad", "c"])).await;
        assert!(matches!(
            result,
            Err(MediaError::UploadRejected { status: 400, .. })
        ));
    }
}
