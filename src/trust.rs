//! Cross-signing and device trust, as seen by the local user.
//!
//! The decoration engine never talks to the crypto store directly.
//! Callers implement [`TrustLookup`] over whatever they have already loaded,
//! or fill a [`TrustSnapshot`] ahead of time.

use std::collections::HashMap;

use ruma::{DeviceId, OwnedDeviceId, OwnedUserId, UserId};
use serde::{Deserialize, Serialize};

/// How much the local user trusts a single device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceTrustLevel {
    /// The device is signed by its owner's self-signing key, which we trust.
    #[serde(default)]
    pub cross_signing_verified: bool,
    /// The local user manually verified (`Some(true)`) or blacklisted (`Some(false)`) this device.
    #[serde(default)]
    pub locally_verified: Option<bool>,
}

impl DeviceTrustLevel {
    pub fn is_verified(&self) -> bool {
        self.cross_signing_verified || self.locally_verified == Some(true)
    }
}

/// A device of another user, as known to the local crypto store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: OwnedDeviceId,
    #[serde(default)]
    pub display_name: Option<String>,
    /// `None` if no trust has been computed for this device yet.
    #[serde(default)]
    pub trust_level: Option<DeviceTrustLevel>,
}

/// Synchronous, already-resolved trust information.
///
/// Implementations must not block or perform I/O: anything that isn't
/// known yet should be reported as `None`.
pub trait TrustLookup {
    /// Whether the given user's cross-signing identity is trusted by the local user.
    ///
    /// Returns `None` if the user's cross-signing keys are not known.
    fn user_cross_signing_trusted(&self, user_id: &UserId) -> Option<bool>;

    /// Looks up one of the given user's devices.
    fn device(&self, user_id: &UserId, device_id: &DeviceId) -> Option<DeviceInfo>;
}

/// A point-in-time copy of the trust state of a set of users.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustSnapshot {
    /// Cross-signing trust per user. Users missing here have unknown keys.
    #[serde(default)]
    pub users: HashMap<OwnedUserId, bool>,
    /// Known devices per user.
    #[serde(default)]
    pub devices: HashMap<OwnedUserId, Vec<DeviceInfo>>,
}

impl TrustSnapshot {
    pub fn set_user_trusted(&mut self, user_id: OwnedUserId, trusted: bool) -> &mut Self {
        self.users.insert(user_id, trusted);
        self
    }

    /// Adds or replaces a device of the given user.
    pub fn insert_device(&mut self, user_id: OwnedUserId, device: DeviceInfo) -> &mut Self {
        let devices = self.devices.entry(user_id).or_default();
        devices.retain(|d| d.device_id != device.device_id);
        devices.push(device);
        self
    }
}

impl TrustLookup for TrustSnapshot {
    fn user_cross_signing_trusted(&self, user_id: &UserId) -> Option<bool> {
        self.users.get(user_id).copied()
    }

    fn device(&self, user_id: &UserId, device_id: &DeviceId) -> Option<DeviceInfo> {
        self.devices
            .get(user_id)?
            .iter()
            .find(|d| d.device_id.as_str() == device_id.as_str())
            .cloned()
    }
}

impl<T: TrustLookup + ?Sized> TrustLookup for &T {
    fn user_cross_signing_trusted(&self, user_id: &UserId) -> Option<bool> {
        (**self).user_cross_signing_trusted(user_id)
    }

    fn device(&self, user_id: &UserId, device_id: &DeviceId) -> Option<DeviceInfo> {
        (**self).device(user_id, device_id)
    }
}

#[cfg(test)]
mod tests {
    use ruma::{device_id, owned_device_id, owned_user_id, user_id};

    use super::*;

    #[test]
    fn trust_level_verification() {
        assert!(!DeviceTrustLevel::default().is_verified());
        assert!(DeviceTrustLevel { cross_signing_verified: true, locally_verified: None }.is_verified());
        assert!(DeviceTrustLevel { cross_signing_verified: false, locally_verified: Some(true) }.is_verified());
        assert!(!DeviceTrustLevel { cross_signing_verified: false, locally_verified: Some(false) }.is_verified());
    }

    #[test]
    fn snapshot_lookups() {
        let mut snapshot = TrustSnapshot::default();
        snapshot
            .set_user_trusted(owned_user_id!("@alice:example.org"), true)
            .insert_device(
                owned_user_id!("@alice:example.org"),
                DeviceInfo {
                    device_id: owned_device_id!("D1"),
                    display_name: Some("phone".into()),
                    trust_level: None,
                },
            );

        let alice = user_id!("@alice:example.org");
        assert_eq!(snapshot.user_cross_signing_trusted(alice), Some(true));
        assert_eq!(snapshot.user_cross_signing_trusted(user_id!("@bob:example.org")), None);
        assert!(snapshot.device(alice, device_id!("D1")).is_some());
        assert!(snapshot.device(alice, device_id!("D2")).is_none());
    }

    #[test]
    fn inserting_a_device_twice_replaces_it() {
        let alice = owned_user_id!("@alice:example.org");
        let mut snapshot = TrustSnapshot::default();
        for verified in [false, true] {
            snapshot.insert_device(alice.clone(), DeviceInfo {
                device_id: owned_device_id!("D1"),
                display_name: None,
                trust_level: Some(DeviceTrustLevel { cross_signing_verified: verified, locally_verified: None }),
            });
        }
        assert_eq!(snapshot.devices[&alice].len(), 1);
        let device = snapshot.device(&alice, device_id!("D1")).unwrap();
        assert!(device.trust_level.unwrap().is_verified());
    }
}
