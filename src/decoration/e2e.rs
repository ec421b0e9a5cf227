//! Warnings about the end-to-end encryption status of a message.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    room::RoomContext,
    timeline::{ENCRYPTED_EVENT_TYPE, TimelineEvent, content::{ContentError, sending_device_id}},
    trust::TrustLookup,
};

/// The shield shown next to a message in an encrypted room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum E2EDecoration {
    #[default]
    None,
    /// Sent from a device we have no trust information about.
    WarnSentByUnknownDevice,
    /// Sent from a device that its (trusted) owner hasn't verified.
    WarnSentByUnverifiedDevice,
    /// Sent unencrypted after encryption was enabled in the room.
    WarnSentInClear,
}

/// Computes the E2E decoration of an event.
///
/// Warnings are only shown for synced events in encrypted rooms
/// whose sender's cross-signing identity we trust.
/// Any missing trust or device information yields [`E2EDecoration::None`].
pub fn e2e_decoration<T: TrustLookup + ?Sized>(
    event: &TimelineEvent,
    room: &RoomContext,
    trust: &T,
) -> E2EDecoration {
    if !event.send_state.is_synced()
        || !room.is_encrypted()
        || trust.user_cross_signing_trusted(&event.sender) != Some(true)
    {
        return E2EDecoration::None;
    }
    // Redacted events have lost the content we'd need to judge them.
    if event.is_redacted {
        return E2EDecoration::None;
    }

    if event.is_encrypted() {
        encrypted_event_decoration(event, trust)
    } else {
        cleartext_event_decoration(event, room)
    }
}

fn encrypted_event_decoration<T: TrustLookup + ?Sized>(event: &TimelineEvent, trust: &T) -> E2EDecoration {
    // Undecryptable events have no sender device info.
    if event.clear_type() == ENCRYPTED_EVENT_TYPE {
        return E2EDecoration::None;
    }

    let device_id = match sending_device_id(event) {
        Ok(device_id) => device_id,
        Err(e @ ContentError::Malformed { .. }) => {
            warn!("Cannot determine sending device: {e}");
            return E2EDecoration::None;
        }
        Err(e) => {
            debug!("Cannot determine sending device: {e}");
            return E2EDecoration::None;
        }
    };

    let Some(device) = trust.device(&event.sender, &device_id) else {
        // Possibly a deleted session; don't warn about it.
        debug!("Device {device_id} of {} is unknown, not decorating event {}", event.sender, event.event_id);
        return E2EDecoration::None;
    };

    match device.trust_level {
        None => E2EDecoration::WarnSentByUnknownDevice,
        Some(level) if level.is_verified() => E2EDecoration::None,
        Some(_) => E2EDecoration::WarnSentByUnverifiedDevice,
    }
}

fn cleartext_event_decoration(event: &TimelineEvent, room: &RoomContext) -> E2EDecoration {
    // State events are always sent in clear.
    if event.is_state_event() {
        return E2EDecoration::None;
    }
    let encryption_ts = room.summary.as_ref().and_then(|s| s.encryption_event_ts);
    let (Some(event_ts), Some(encryption_ts)) = (event.origin_server_ts, encryption_ts) else {
        debug!(
            "Missing timestamps to compare event {} against encryption of room {}",
            event.event_id, room.room_id,
        );
        return E2EDecoration::None;
    };
    if event_ts > encryption_ts {
        E2EDecoration::WarnSentInClear
    } else {
        E2EDecoration::None
    }
}
