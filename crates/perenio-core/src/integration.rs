// ── Integration lifecycle ──
//
// Set up one configured account, turn its devices into camera entities,
// poll them in the background, and tear everything down on unload.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use perenio_api::PerenioClient;

use crate::config::IntegrationConfig;
use crate::entity::CameraEntity;
use crate::error::CoreError;

/// A running Perenio entry: one authenticated client shared by every
/// camera it discovered.
pub struct Integration {
    config: IntegrationConfig,
    client: Arc<PerenioClient>,
    cameras: RwLock<Vec<Arc<CameraEntity>>>,
    cancel: CancellationToken,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl Integration {
    /// Build the client, open its session, and log in.
    ///
    /// Fails with [`CoreError::NotReady`] when the session cannot be built
    /// or no access token was granted, carrying the login error when there
    /// is one. The client is closed in both cases.
    pub async fn setup_entry(config: IntegrationConfig) -> Result<Self, CoreError> {
        let client = Arc::new(config.build_client());

        if let Err(e) = client.try_setup().await {
            client.close();
            let reason = if e.is_auth_expired() {
                "authentication failed"
            } else {
                "failed to set up Perenio client"
            };
            return Err(CoreError::NotReady {
                reason: reason.into(),
                source: Some(e),
            });
        }

        if !client.has_access_token().await {
            client.close();
            return Err(CoreError::NotReady {
                reason: "authentication failed".into(),
                source: None,
            });
        }

        info!(email = %config.email, "Perenio entry set up");
        Ok(Self {
            config,
            client,
            cameras: RwLock::new(Vec::new()),
            cancel: CancellationToken::new(),
            poller: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    /// The shared API client.
    pub fn client(&self) -> &Arc<PerenioClient> {
        &self.client
    }

    /// List the account's devices and register one camera per device that
    /// carries an identifier. Replaces any previously discovered set.
    pub async fn discover_cameras(&self) -> Vec<Arc<CameraEntity>> {
        let devices = self.client.get_devices().await;
        let total = devices.len();

        let cameras: Vec<Arc<CameraEntity>> = devices
            .into_iter()
            .filter_map(|device| {
                let camera = CameraEntity::from_device(Arc::clone(&self.client), device);
                if camera.is_none() {
                    debug!("skipping device without an identifier");
                }
                camera.map(Arc::new)
            })
            .inspect(|camera| {
                info!(camera_id = camera.camera_id(), name = camera.name(), "adding camera");
            })
            .collect();

        if cameras.is_empty() {
            warn!(devices = total, "no Perenio cameras found");
        }

        *self.cameras.write().await = cameras.clone();
        cameras
    }

    /// Cameras from the last discovery.
    pub async fn cameras(&self) -> Vec<Arc<CameraEntity>> {
        self.cameras.read().await.clone()
    }

    /// Look up a discovered camera by id.
    pub async fn camera(&self, camera_id: &str) -> Result<Arc<CameraEntity>, CoreError> {
        self.cameras
            .read()
            .await
            .iter()
            .find(|camera| camera.camera_id() == camera_id)
            .cloned()
            .ok_or_else(|| CoreError::CameraNotFound {
                camera_id: camera_id.to_owned(),
            })
    }

    /// Start updating every discovered camera at the scan interval.
    ///
    /// Does nothing when the interval is zero or polling is already running.
    pub async fn spawn_polling(&self) {
        let period = self.config.scan_interval;
        if period.is_zero() {
            debug!("scan interval is zero, polling disabled");
            return;
        }

        let mut poller = self.poller.lock().await;
        if poller.is_some() {
            return;
        }

        let cameras = self.cameras().await;
        let cancel = self.cancel.child_token();
        debug!(cameras = cameras.len(), ?period, "starting camera polling");
        *poller = Some(tokio::spawn(poll_task(cameras, period, cancel)));
    }

    /// Stop polling and release the client's session.
    ///
    /// Returns `true` if this call closed an open session.
    pub async fn unload(&self) -> bool {
        self.cancel.cancel();
        if let Some(handle) = self.poller.lock().await.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "polling task ended abnormally");
            }
        }
        self.cameras.write().await.clear();

        let closed = self.client.close();
        info!(email = %self.config.email, "Perenio entry unloaded");
        closed
    }
}

async fn poll_task(
    cameras: Vec<Arc<CameraEntity>>,
    period: std::time::Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // first tick fires immediately

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                join_all(cameras.iter().map(|camera| camera.update())).await;
            }
        }
    }
    debug!("camera polling stopped");
}
