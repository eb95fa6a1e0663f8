// perenio-api: Async Rust client for the Perenio cloud camera API
//
// OAuth2 password-grant login with single-flight token refresh, device
// discovery, and camera snapshot / stream-offer / recording endpoints.

pub mod auth;
mod cameras;
pub mod client;
mod devices;
pub mod error;
pub mod models;
mod oauth;
mod token;
pub mod transport;

pub use auth::{Credentials, Endpoints, OAuthSettings};
pub use cameras::{DEFAULT_FILE_LIMIT, SnapshotSource};
pub use client::PerenioClient;
pub use devices::DiscoveryPath;
pub use error::Error;
pub use models::{Device, RecordedFile, StreamOffer, UserInfo};
pub use token::{DEFAULT_TOKEN_LIFETIME_SECS, REFRESH_MARGIN_SECS};
pub use transport::TransportConfig;
