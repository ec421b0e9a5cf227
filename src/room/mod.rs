//! Room-level state that influences how each message is decorated.

use std::collections::{BTreeMap, BTreeSet};

use ruma::{MilliSecondsSinceUnixEpoch, OwnedRoomId, OwnedUserId, UserId};
use serde::{Deserialize, Serialize};

/// The subset of a room summary relevant for decorating messages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    /// Whether the room is flagged as a direct message room in the user's account data.
    #[serde(default)]
    pub is_direct: bool,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_encrypted: bool,
    /// The origin timestamp of the `m.room.encryption` event that enabled encryption.
    #[serde(default)]
    pub encryption_event_ts: Option<MilliSecondsSinceUnixEpoch>,
}

/// The users section of a room's power levels.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerLevels {
    #[serde(default)]
    pub users: BTreeMap<OwnedUserId, i64>,
    #[serde(default)]
    pub users_default: i64,
}

impl PowerLevels {
    pub fn user_power_level(&self, user_id: &UserId) -> i64 {
        self.users
            .get(user_id)
            .copied()
            .unwrap_or(self.users_default)
    }
}

/// Everything known about a room when one of its timelines is rendered.
///
/// Each part is optional because room state may still be loading;
/// missing parts degrade to the least-alarming decoration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomContext {
    pub room_id: OwnedRoomId,
    #[serde(default)]
    pub summary: Option<RoomSummary>,
    /// The IDs of all members whose membership is `join`.
    #[serde(default)]
    pub joined_members: Option<Vec<OwnedUserId>>,
    #[serde(default)]
    pub power_levels: Option<PowerLevels>,
}

impl RoomContext {
    pub fn new(room_id: OwnedRoomId) -> Self {
        Self {
            room_id,
            summary: None,
            joined_members: None,
            power_levels: None,
        }
    }

    pub fn is_direct(&self) -> bool {
        self.summary.as_ref().is_some_and(|s| s.is_direct)
    }

    pub fn is_public(&self) -> bool {
        self.summary.as_ref().is_some_and(|s| s.is_public)
    }

    pub fn is_encrypted(&self) -> bool {
        self.summary.as_ref().is_some_and(|s| s.is_encrypted)
    }

    pub fn user_power_level(&self, user_id: &UserId) -> Option<i64> {
        self.power_levels
            .as_ref()
            .map(|pl| pl.user_power_level(user_id))
    }

    /// Returns the other member of a direct message room.
    ///
    /// A partner is only reported for rooms flagged as direct that have exactly
    /// two joined members, one of which is `my_user_id`.
    /// Any other member count yields `None`, but the room is still reported as direct.
    pub fn dm_partner(&self, my_user_id: &UserId) -> Option<OwnedUserId> {
        if !self.is_direct() {
            return None;
        }
        let members: BTreeSet<&OwnedUserId> = self.joined_members.as_ref()?.iter().collect();
        if members.len() != 2 {
            tracing::debug!(
                "Direct room {} has {} joined members, not resolving a DM partner",
                self.room_id,
                members.len(),
            );
            return None;
        }
        if !members.iter().any(|member| member.as_str() == my_user_id.as_str()) {
            tracing::debug!("{my_user_id} is not a joined member of direct room {}", self.room_id);
            return None;
        }
        members
            .into_iter()
            .find(|member| member.as_str() != my_user_id.as_str())
            .cloned()
    }
}
