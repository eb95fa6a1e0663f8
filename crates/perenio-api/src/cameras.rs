// Camera media endpoints
//
// Snapshots (command redirect, then direct URLs), the WebRTC stream
// offer, and recorded-file listings.

use bytes::Bytes;
use serde_json::{Value, json};
use tracing::{debug, error, warn};
use url::Url;

use crate::client::{PerenioClient, expect_ok, read_json};
use crate::error::Error;
use crate::models::{RecordedFile, StreamOffer, list_payload};

/// Default page size for [`PerenioClient::get_camera_files`].
pub const DEFAULT_FILE_LIMIT: u32 = 20;

/// Where a snapshot can come from, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// `POST {api}/commands?commandType=GET_SNAPSHOT`, then fetch the returned `url`.
    Command,
    /// `GET {api}/file/{id}/snapshot`
    FileSnapshot,
    /// `GET {api}/endpoints/{id}/snapshot`
    EndpointSnapshot,
}

impl SnapshotSource {
    pub const ALL: [Self; 3] = [Self::Command, Self::FileSnapshot, Self::EndpointSnapshot];
}

impl PerenioClient {
    // ── Snapshots ────────────────────────────────────────────────────

    /// Fetch a still image from a camera.
    ///
    /// Tries each [`SnapshotSource`] in order and returns the first
    /// non-empty image; later sources are not contacted after a success.
    pub async fn try_get_camera_snapshot(&self, camera_id: &str) -> Result<Bytes, Error> {
        let token = self.ensure_token().await?;
        let http = self.session()?;

        for source in SnapshotSource::ALL {
            let attempt = match source {
                SnapshotSource::Command => self.snapshot_via_command(&http, &token, camera_id).await,
                SnapshotSource::FileSnapshot => {
                    let url = self.api_url(&["file", camera_id, "snapshot"]);
                    self.snapshot_direct(&http, &token, url).await
                }
                SnapshotSource::EndpointSnapshot => {
                    let url = self.api_url(&["endpoints", camera_id, "snapshot"]);
                    self.snapshot_direct(&http, &token, url).await
                }
            };

            match attempt {
                Ok(image) => {
                    debug!(camera_id, ?source, bytes = image.len(), "got snapshot");
                    return Ok(image);
                }
                Err(e) => debug!(camera_id, ?source, error = %e, "snapshot attempt failed"),
            }
        }

        Err(Error::SnapshotUnavailable {
            camera_id: camera_id.to_owned(),
        })
    }

    /// [`try_get_camera_snapshot`](Self::try_get_camera_snapshot),
    /// returning `None` on any failure.
    pub async fn get_camera_snapshot(&self, camera_id: &str) -> Option<Bytes> {
        match self.try_get_camera_snapshot(camera_id).await {
            Ok(image) => Some(image),
            Err(e @ Error::SnapshotUnavailable { .. }) => {
                debug!(error = %e, "no snapshot source succeeded");
                None
            }
            Err(e) => {
                error!(camera_id, error = %e, "error getting snapshot");
                None
            }
        }
    }

    async fn snapshot_via_command(
        &self,
        http: &reqwest::Client,
        token: &secrecy::SecretString,
        camera_id: &str,
    ) -> Result<Bytes, Error> {
        let url = self.api_url(&["commands"]);
        let resp = self
            .authorized(http.post(url), token)
            .query(&[("endpointId", camera_id), ("commandType", "GET_SNAPSHOT")])
            .json(&json!({}))
            .send()
            .await?;
        let result: Value = read_json(expect_ok(resp).await?).await?;

        let image_url = result
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Deserialization {
                message: "snapshot command response has no url".into(),
                body: result.to_string(),
            })?;
        let image_url = Url::parse(image_url)?;

        // The command hands back a pre-signed location; it takes no bearer token.
        let resp = http.get(image_url).send().await?;
        non_empty(expect_ok(resp).await?.bytes().await?)
    }

    async fn snapshot_direct(
        &self,
        http: &reqwest::Client,
        token: &secrecy::SecretString,
        url: Url,
    ) -> Result<Bytes, Error> {
        let resp = self.authorized(http.get(url), token).send().await?;
        non_empty(expect_ok(resp).await?.bytes().await?)
    }

    // ── Streaming ────────────────────────────────────────────────────

    /// Request a media-stream offer for a camera.
    ///
    /// `POST {api}/mediastream/{id}/offer` with `{}`. Returns the raw offer
    /// payload; this is not a playable URL and no WebRTC session is
    /// negotiated from it.
    pub async fn try_get_camera_stream_offer(&self, camera_id: &str) -> Result<StreamOffer, Error> {
        let token = self.ensure_token().await?;
        let http = self.session()?;
        let url = self.api_url(&["mediastream", camera_id, "offer"]);

        let resp = self
            .authorized(http.post(url), &token)
            .json(&json!({}))
            .send()
            .await?;
        let offer: StreamOffer = read_json(expect_ok(resp).await?).await?;
        debug!(camera_id, offer = %offer.raw(), "stream offer response");
        Ok(offer)
    }

    /// [`try_get_camera_stream_offer`](Self::try_get_camera_stream_offer),
    /// returning `None` on any failure.
    pub async fn get_camera_stream_url(&self, camera_id: &str) -> Option<StreamOffer> {
        match self.try_get_camera_stream_offer(camera_id).await {
            Ok(offer) => Some(offer),
            Err(e @ Error::Http { .. }) => {
                warn!(camera_id, error = %e, "stream offer failed");
                None
            }
            Err(e) => {
                error!(camera_id, error = %e, "error getting stream offer");
                None
            }
        }
    }

    // ── Recordings ───────────────────────────────────────────────────

    /// List recorded video files for a camera, newest first.
    ///
    /// `GET {api}/file/{id}/files?endpointId={id}&limit={limit}&mimeTypeMask=video/*&offset=0&parameters[sort]=DESC`
    pub async fn try_get_camera_files(
        &self,
        camera_id: &str,
        limit: u32,
    ) -> Result<Vec<RecordedFile>, Error> {
        let token = self.ensure_token().await?;
        let http = self.session()?;
        let url = self.api_url(&["file", camera_id, "files"]);
        let limit = limit.to_string();

        let resp = self
            .authorized(http.get(url), &token)
            .query(&[
                ("endpointId", camera_id),
                ("limit", limit.as_str()),
                ("mimeTypeMask", "video/*"),
                ("offset", "0"),
                ("parameters[sort]", "DESC"),
            ])
            .send()
            .await?;
        let body: Value = read_json(expect_ok(resp).await?).await?;
        Ok(list_payload(body, RecordedFile::new))
    }

    /// [`try_get_camera_files`](Self::try_get_camera_files), returning an
    /// empty list on any failure.
    pub async fn get_camera_files(&self, camera_id: &str, limit: u32) -> Vec<RecordedFile> {
        match self.try_get_camera_files(camera_id, limit).await {
            Ok(files) => files,
            Err(e @ Error::Http { .. }) => {
                warn!(camera_id, error = %e, "get files failed");
                Vec::new()
            }
            Err(e) => {
                error!(camera_id, error = %e, "error getting camera files");
                Vec::new()
            }
        }
    }
}

fn non_empty(image: Bytes) -> Result<Bytes, Error> {
    if image.is_empty() {
        return Err(Error::Deserialization {
            message: "snapshot body is empty".into(),
            body: String::new(),
        });
    }
    Ok(image)
}
