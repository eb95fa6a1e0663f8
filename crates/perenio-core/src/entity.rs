// ── Camera entity ──
//
// One discovered camera as a host sees it: stable identity, device
// registry info, state attributes, and the media calls the host makes.
// Device data is captured at discovery; polling only keeps the token fresh.

use std::sync::Arc;

use bytes::Bytes;
use perenio_api::{Device, PerenioClient};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Integration domain, used as the identifier namespace.
pub const DOMAIN: &str = "perenio";
pub const MANUFACTURER: &str = "Perenio";
/// Model reported when the device object carries none.
pub const DEFAULT_MODEL: &str = "PEIFC01";

/// Device registry entry for a camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// `(domain, camera id)` pairs.
    pub identifiers: Vec<(String, String)>,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub sw_version: Option<String>,
}

/// A camera discovered on the account.
pub struct CameraEntity {
    client: Arc<PerenioClient>,
    device: Device,
    camera_id: String,
    name: String,
}

impl CameraEntity {
    /// Wrap a discovered device. Returns `None` when the device has no
    /// identifier, since nothing else can be addressed without one.
    pub fn from_device(client: Arc<PerenioClient>, device: Device) -> Option<Self> {
        let camera_id = device.id()?;
        let name = device
            .name()
            .map_or_else(|| format!("Camera {camera_id}"), str::to_owned);
        Some(Self {
            client,
            device,
            camera_id,
            name,
        })
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device object as returned by discovery.
    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn unique_id(&self) -> String {
        format!("{DOMAIN}_{}", self.camera_id)
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            identifiers: vec![(DOMAIN.to_owned(), self.camera_id.clone())],
            name: self.name.clone(),
            manufacturer: MANUFACTURER.to_owned(),
            model: self.device.model().unwrap_or(DEFAULT_MODEL).to_owned(),
            sw_version: self.device.firmware_version().map(str::to_owned),
        }
    }

    /// `camera_id` always; `status` and `online` when the device reports them.
    pub fn extra_state_attributes(&self) -> Map<String, Value> {
        let mut attrs = Map::new();
        attrs.insert("camera_id".into(), Value::String(self.camera_id.clone()));
        if let Some(status) = self.device.status() {
            attrs.insert("status".into(), status.clone());
        }
        if let Some(online) = self.device.online() {
            attrs.insert("online".into(), online.clone());
        }
        attrs
    }

    /// Available while the shared client holds an access token.
    pub async fn available(&self) -> bool {
        self.client.has_access_token().await
    }

    /// Current still image, if any source produced one.
    pub async fn camera_image(&self) -> Option<Bytes> {
        let image = self.client.get_camera_snapshot(&self.camera_id).await;
        match &image {
            Some(bytes) => debug!(camera = %self.name, bytes = bytes.len(), "got camera image"),
            None => warn!(camera = %self.name, "no snapshot available"),
        }
        image
    }

    /// Playable stream URL. The vendor only offers WebRTC negotiation,
    /// which is not implemented, so this never yields a URL. The offer is
    /// still requested and logged.
    pub async fn stream_source(&self) -> Option<String> {
        match self.client.get_camera_stream_url(&self.camera_id).await {
            Some(offer) => debug!(
                camera_id = %self.camera_id,
                offer = %offer.raw(),
                "stream offer received, WebRTC playback is not supported"
            ),
            None => warn!(camera = %self.name, "no stream available"),
        }
        None
    }

    /// Periodic update: keep the shared token fresh.
    pub async fn update(&self) {
        if let Err(e) = self.client.refresh_token_if_needed().await {
            warn!(camera_id = %self.camera_id, error = %e, "token refresh during update failed");
        }
    }
}

impl std::fmt::Debug for CameraEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraEntity")
            .field("camera_id", &self.camera_id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use perenio_api::Credentials;

    fn entity(raw: Value) -> Option<CameraEntity> {
        let client = Arc::new(PerenioClient::new(Credentials::new("a@b.com", "x")));
        CameraEntity::from_device(client, Device::new(raw))
    }

    #[test]
    fn identity_from_full_device() {
        let cam = entity(json!({
            "id": "cam1",
            "name": "Porch",
            "model": "PEIFC02",
            "firmwareVersion": "2.1.0",
            "status": "ACTIVE",
            "online": true
        }))
        .expect("has id");

        assert_eq!(cam.camera_id(), "cam1");
        assert_eq!(cam.name(), "Porch");
        assert_eq!(cam.unique_id(), "perenio_cam1");
        assert_eq!(
            cam.device_info(),
            DeviceInfo {
                identifiers: vec![("perenio".into(), "cam1".into())],
                name: "Porch".into(),
                manufacturer: "Perenio".into(),
                model: "PEIFC02".into(),
                sw_version: Some("2.1.0".into()),
            }
        );
        assert_eq!(
            Value::Object(cam.extra_state_attributes()),
            json!({"camera_id": "cam1", "status": "ACTIVE", "online": true})
        );
    }

    #[test]
    fn fallbacks_for_sparse_device() {
        let cam = entity(json!({"endpointId": 42})).expect("endpointId counts");

        assert_eq!(cam.camera_id(), "42");
        assert_eq!(cam.name(), "Camera 42");
        let info = cam.device_info();
        assert_eq!(info.model, DEFAULT_MODEL);
        assert_eq!(info.sw_version, None);
        assert_eq!(
            Value::Object(cam.extra_state_attributes()),
            json!({"camera_id": "42"})
        );
    }

    #[test]
    fn device_name_field_is_used() {
        let cam = entity(json!({"id": "c", "deviceName": "Garage"})).expect("has id");
        assert_eq!(cam.name(), "Garage");
    }

    #[test]
    fn device_without_id_is_skipped() {
        assert!(entity(json!({"name": "Nameless"})).is_none());
    }

    #[tokio::test]
    async fn unauthenticated_client_is_unavailable() {
        let cam = entity(json!({"id": "c"})).expect("has id");
        assert!(!cam.available().await);
    }
}
