//! Host-facing layer on top of `perenio-api`.
//!
//! - **[`Integration`]**: lifecycle of one configured account.
//!   [`setup_entry()`](Integration::setup_entry) logs in,
//!   [`discover_cameras()`](Integration::discover_cameras) builds entities,
//!   [`spawn_polling()`](Integration::spawn_polling) keeps them fresh, and
//!   [`unload()`](Integration::unload) tears it all down.
//!
//! - **[`CameraEntity`]**: one camera with its identity, registry info,
//!   state attributes, and media calls.
//!
//! - **[`validate_credentials`]**: login probe for configuration forms.

pub mod config;
pub mod entity;
pub mod error;
pub mod flow;
pub mod integration;

pub use config::{DEFAULT_SCAN_INTERVAL, IntegrationConfig};
pub use entity::{CameraEntity, DEFAULT_MODEL, DOMAIN, DeviceInfo, MANUFACTURER};
pub use error::{CoreError, FlowError};
pub use flow::validate_credentials;
pub use integration::Integration;
