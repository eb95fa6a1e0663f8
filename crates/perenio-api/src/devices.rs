// Device discovery
//
// Which listing path an account can reach is not stable across accounts
// and deployments, so discovery probes an ordered list of candidates.
// The first path that answers 200 is remembered for the session and
// tried first next time; if it stops answering, the full list is probed
// again.

use std::sync::PoisonError;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::client::{PerenioClient, expect_ok, read_json};
use crate::error::Error;
use crate::models::{Device, list_payload};

/// Candidate discovery paths under the API base, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryPath {
    Endpoints,
    Devices,
    Cameras,
}

impl DiscoveryPath {
    pub const ALL: [Self; 3] = [Self::Endpoints, Self::Devices, Self::Cameras];

    pub fn segment(self) -> &'static str {
        match self {
            Self::Endpoints => "endpoints",
            Self::Devices => "devices",
            Self::Cameras => "cameras",
        }
    }

    /// Probe order with a previously successful path moved to the front.
    fn probe_order(preferred: Option<Self>) -> Vec<Self> {
        let mut order = Vec::with_capacity(Self::ALL.len());
        order.extend(preferred);
        order.extend(Self::ALL.into_iter().filter(|p| Some(*p) != preferred));
        order
    }
}

impl PerenioClient {
    /// List the account's devices.
    ///
    /// Runs the refresh guard, then `GET {api}/endpoints`, `/devices`,
    /// `/cameras` in order until one returns 200. A 200 whose body is not
    /// a JSON array yields an empty list. Fails with
    /// [`Error::NoDiscoveryEndpoint`] when every candidate fails.
    pub async fn try_get_devices(&self) -> Result<Vec<Device>, Error> {
        let token = self.ensure_token().await?;
        let http = self.session()?;
        let cached = self.cached_discovery_path();

        for candidate in DiscoveryPath::probe_order(cached) {
            let url = self.api_url(&[candidate.segment()]);
            let attempt = async {
                let resp = self.authorized(http.get(url.clone()), &token).send().await?;
                read_json::<Value>(expect_ok(resp).await?).await
            };

            match attempt.await {
                Ok(body) => {
                    let devices = list_payload(body, Device::new);
                    info!(%url, count = devices.len(), "got devices");
                    self.remember_discovery_path(Some(candidate));
                    return Ok(devices);
                }
                Err(e) if e.is_not_found() => debug!(%url, "discovery path not found"),
                Err(e @ Error::Http { .. }) => warn!(%url, error = %e, "discovery path rejected"),
                Err(e) => error!(%url, error = %e, "error getting devices"),
            }

            if cached == Some(candidate) {
                self.remember_discovery_path(None);
            }
        }

        warn!("could not find a devices endpoint");
        Err(Error::NoDiscoveryEndpoint)
    }

    /// [`try_get_devices`](Self::try_get_devices), returning an empty list
    /// on any failure.
    pub async fn get_devices(&self) -> Vec<Device> {
        match self.try_get_devices().await {
            Ok(devices) => devices,
            Err(Error::NoDiscoveryEndpoint) => Vec::new(),
            Err(e) => {
                error!(error = %e, "device discovery failed");
                Vec::new()
            }
        }
    }

    /// Discovery path that answered last, if any.
    pub fn cached_discovery_path(&self) -> Option<DiscoveryPath> {
        *self
            .discovery_path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn remember_discovery_path(&self, path: Option<DiscoveryPath>) {
        *self
            .discovery_path
            .write()
            .unwrap_or_else(PoisonError::into_inner) = path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_probe_order() {
        assert_eq!(
            DiscoveryPath::probe_order(None),
            vec![
                DiscoveryPath::Endpoints,
                DiscoveryPath::Devices,
                DiscoveryPath::Cameras
            ]
        );
    }

    #[test]
    fn cached_path_is_probed_first_without_duplicates() {
        assert_eq!(
            DiscoveryPath::probe_order(Some(DiscoveryPath::Cameras)),
            vec![
                DiscoveryPath::Cameras,
                DiscoveryPath::Endpoints,
                DiscoveryPath::Devices
            ]
        );
    }
}
