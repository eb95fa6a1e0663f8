//! `perenio cameras`

use perenio_core::{CameraEntity, DeviceInfo, Integration};
use serde::Serialize;
use serde_json::{Map, Value};
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct CameraRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Online")]
    online: String,
}

/// Serialized form for JSON output.
#[derive(Serialize)]
struct CameraSummary {
    camera_id: String,
    name: String,
    unique_id: String,
    device_info: DeviceInfo,
    attributes: Map<String, Value>,
}

impl From<&CameraEntity> for CameraSummary {
    fn from(camera: &CameraEntity) -> Self {
        Self {
            camera_id: camera.camera_id().to_owned(),
            name: camera.name().to_owned(),
            unique_id: camera.unique_id(),
            device_info: camera.device_info(),
            attributes: camera.extra_state_attributes(),
        }
    }
}

impl From<&CameraSummary> for CameraRow {
    fn from(c: &CameraSummary) -> Self {
        Self {
            id: c.camera_id.clone(),
            name: c.name.clone(),
            model: c.device_info.model.clone(),
            firmware: c.device_info.sw_version.clone().unwrap_or_default(),
            status: c.attributes.get("status").map(display_value).unwrap_or_default(),
            online: c.attributes.get("online").map(display_value).unwrap_or_default(),
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(integration: &Integration, global: &GlobalOpts) -> Result<(), CliError> {
    let cameras = integration.discover_cameras().await;
    let summaries: Vec<CameraSummary> = cameras.iter().map(|c| CameraSummary::from(&**c)).collect();

    let out = output::render_list(
        &global.output,
        &summaries,
        |c| CameraRow::from(c),
        |c| c.camera_id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
