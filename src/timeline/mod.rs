//! The read-only view of a timeline event that the decoration engine consumes.
//!
//! These types don't depend on any SDK timeline item.
//! Whoever owns the event store must resolve decryption results, sender profiles,
//! aggregations and read receipts before handing a [`TimelineEvent`] to the engine.

use std::collections::BTreeMap;

use ruma::{MilliSecondsSinceUnixEpoch, OwnedEventId, OwnedMxcUri, OwnedUserId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod content;
pub mod pass;

/// The wire type of an encrypted room event.
pub const ENCRYPTED_EVENT_TYPE: &str = "m.room.encrypted";
/// The type of a regular room message.
pub const MESSAGE_EVENT_TYPE: &str = "m.room.message";

/// The lifecycle status of an event, mostly relevant for outgoing messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendState {
    #[default]
    Unknown,
    /// Not yet handed to the sending queue.
    Unsent,
    /// Waiting for the payload to be encrypted.
    Encrypting,
    /// The request to the homeserver is in flight.
    Sending,
    /// The homeserver acknowledged the event, but it hasn't come back down sync yet.
    Sent,
    /// The event came back down sync. Remote events are always in this state.
    Synced,
    /// Sending failed.
    Undelivered,
    /// Sending failed because the room contains unknown devices.
    FailedUnknownDevices,
}

impl SendState {
    fn synced() -> Self {
        Self::Synced
    }

    pub fn is_sending(self) -> bool {
        matches!(self, Self::Unsent | Self::Encrypting | Self::Sending)
    }

    pub fn has_failed(self) -> bool {
        matches!(self, Self::Undelivered | Self::FailedUnknownDevices)
    }

    pub fn is_synced(self) -> bool {
        self == Self::Synced
    }

    /// Whether the homeserver has accepted the event.
    pub fn is_sent(self) -> bool {
        matches!(self, Self::Sent | Self::Synced)
    }
}

/// The decrypted form of an encrypted event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClearEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub content: Value,
}

/// Profile info about an event's sender, as known when the event was loaded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderProfile {
    /// The display name, disambiguated against other room members with the same name.
    pub disambiguated_display_name: Option<String>,
    pub avatar_url: Option<OwnedMxcUri>,
}

/// One aggregated reaction key on an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionAggregation {
    /// The raw reaction key, usually an emoji, possibly with variant selectors.
    pub key: String,
    pub count: u32,
    #[serde(default)]
    pub added_by_me: bool,
    /// Timestamp of the first reaction with this key, used for ordering.
    pub first_timestamp: Option<MilliSecondsSinceUnixEpoch>,
    /// Reactions with this key that we sent but that haven't been synced yet.
    #[serde(default)]
    pub local_echoes: Vec<String>,
}

/// Vote tally for a single poll option.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VoteSummary {
    pub total: u32,
    pub percentage: f64,
}

/// The aggregated responses to a poll start event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PollResponseAggregation {
    pub my_vote: Option<String>,
    #[serde(default)]
    pub votes_summary: Option<BTreeMap<String, VoteSummary>>,
    pub winner_vote_count: Option<u32>,
    pub total_votes: Option<u32>,
    pub closed_time: Option<MilliSecondsSinceUnixEpoch>,
}

/// The aggregated edits (replacements) of an event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditAggregation {
    /// IDs of the synced replacement events.
    #[serde(default)]
    pub edits: Vec<OwnedEventId>,
    /// Transaction IDs of replacements we sent that haven't been synced yet.
    #[serde(default)]
    pub local_echoes: Vec<String>,
}

/// Everything that other events contribute to this one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventAnnotations {
    #[serde(default)]
    pub reactions: Vec<ReactionAggregation>,
    pub poll_response: Option<PollResponseAggregation>,
    pub edits: Option<EditAggregation>,
    /// The raw content of the references aggregation (e.g. the state of a verification request).
    pub references: Option<Value>,
}

/// A single event of a room timeline, fully resolved by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub event_id: OwnedEventId,
    pub sender: OwnedUserId,
    pub origin_server_ts: Option<MilliSecondsSinceUnixEpoch>,
    /// The local time at which this event was received.
    #[serde(default)]
    pub age_local_ts: Option<MilliSecondsSinceUnixEpoch>,
    /// Remote events are always synced, so that is the default when deserializing.
    #[serde(default = "SendState::synced")]
    pub send_state: SendState,
    /// The type of the event as it was sent over the wire.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Present if and only if this is a state event.
    #[serde(default)]
    pub state_key: Option<String>,
    /// The raw content as it was sent over the wire.
    #[serde(default)]
    pub content: Value,
    /// The decrypted event, if this event was encrypted and decryption succeeded.
    #[serde(default)]
    pub decrypted: Option<ClearEvent>,
    #[serde(default)]
    pub is_redacted: bool,
    /// The position of this event in the local timeline store.
    #[serde(default)]
    pub display_index: i64,
    #[serde(default)]
    pub sender_profile: Option<SenderProfile>,
    #[serde(default)]
    pub annotations: Option<EventAnnotations>,
    /// Users whose read receipt currently points at this event.
    #[serde(default)]
    pub read_receipts: Vec<OwnedUserId>,
}

impl TimelineEvent {
    /// Whether this event was sent encrypted, regardless of whether it could be decrypted.
    pub fn is_encrypted(&self) -> bool {
        self.event_type == ENCRYPTED_EVENT_TYPE
    }

    /// The type of the event after decryption.
    ///
    /// An encrypted event that couldn't be decrypted keeps the `m.room.encrypted` type.
    pub fn clear_type(&self) -> &str {
        self.decrypted
            .as_ref()
            .map_or(self.event_type.as_str(), |clear| clear.event_type.as_str())
    }

    /// The content of the event after decryption.
    pub fn clear_content(&self) -> &Value {
        self.decrypted
            .as_ref()
            .map_or(&self.content, |clear| &clear.content)
    }

    pub fn is_state_event(&self) -> bool {
        self.state_key.is_some()
    }

    /// The `msgtype` of a room message, if this is one.
    pub fn msg_type(&self) -> Option<&str> {
        if self.clear_type() != MESSAGE_EVENT_TYPE {
            return None;
        }
        self.clear_content().get("msgtype")?.as_str()
    }

    /// Whether this message carries a file, image, audio or video attachment.
    pub fn is_attachment_message(&self) -> bool {
        matches!(
            self.msg_type(),
            Some("m.image" | "m.audio" | "m.video" | "m.file")
        )
    }

    pub fn has_been_edited(&self) -> bool {
        self.annotations
            .as_ref()
            .and_then(|a| a.edits.as_ref())
            .is_some_and(|edits| !edits.edits.is_empty())
    }

    pub fn has_pending_edits(&self) -> bool {
        self.annotations
            .as_ref()
            .and_then(|a| a.edits.as_ref())
            .is_some_and(|edits| !edits.local_echoes.is_empty())
    }

    /// Whether a user other than `me` has a read receipt on this event.
    pub fn is_read_by_other(&self, me: &UserId) -> bool {
        self.read_receipts.iter().any(|user| user.as_str() != me.as_str())
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    //! Builders for timeline event fixtures.

    use ruma::{MilliSecondsSinceUnixEpoch, OwnedEventId, OwnedUserId, UInt};
    use serde_json::json;

    use super::*;

    /// Midnight UTC on 2024-03-01, in milliseconds.
    pub const DAY_START: u64 = 1_709_251_200_000;
    pub const HOUR: u64 = 3_600_000;
    pub const DAY: u64 = 24 * HOUR;

    pub fn ts(millis: u64) -> MilliSecondsSinceUnixEpoch {
        MilliSecondsSinceUnixEpoch(UInt::new(millis).expect("timestamp out of range"))
    }

    pub fn text_event(id: &str, sender: &str, millis: u64) -> TimelineEvent {
        TimelineEvent {
            event_id: OwnedEventId::try_from(id).unwrap(),
            sender: OwnedUserId::try_from(sender).unwrap(),
            origin_server_ts: Some(ts(millis)),
            age_local_ts: None,
            send_state: SendState::Synced,
            event_type: MESSAGE_EVENT_TYPE.to_owned(),
            state_key: None,
            content: json!({ "msgtype": "m.text", "body": "hello" }),
            decrypted: None,
            is_redacted: false,
            display_index: 0,
            sender_profile: None,
            annotations: None,
            read_receipts: Vec::new(),
        }
    }

    /// An encrypted text message that was successfully decrypted,
    /// sent from the given device.
    pub fn encrypted_event(id: &str, sender: &str, millis: u64, device_id: &str) -> TimelineEvent {
        let clear = text_event(id, sender, millis);
        TimelineEvent {
            event_type: ENCRYPTED_EVENT_TYPE.to_owned(),
            content: json!({
                "algorithm": "m.megolm.v1.aes-sha2",
                "ciphertext": "AwgAEnAC...",
                "device_id": device_id,
                "sender_key": "IlRMeOPX2e0MurIyfWEucYBRVOEEUMrOHqn/8mLqMjA",
                "session_id": "X3lUlvLELLYxeTx4yOVu6UDpasGEVO0Jbu+QFnm0cKQ",
            }),
            decrypted: Some(ClearEvent {
                event_type: MESSAGE_EVENT_TYPE.to_owned(),
                content: clear.content.clone(),
            }),
            ..clear
        }
    }
}
