//! Typed views into the raw JSON content of timeline events.
//!
//! Content comes straight from the homeserver (or from other clients),
//! so every accessor here returns a `Result` and leaves it to the caller
//! to decide how to degrade.

use ruma::{OwnedDeviceId, OwnedEventId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TimelineEvent;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("event {0} was not sent encrypted")]
    NotEncrypted(OwnedEventId),
    #[error("encrypted content of event {0} has no device ID")]
    MissingDeviceId(OwnedEventId),
    #[error("malformed {kind} content in event {event_id}: {source}")]
    Malformed {
        kind: &'static str,
        event_id: OwnedEventId,
        #[source]
        source: serde_json::Error,
    },
}

/// The content of an `m.room.encrypted` event.
///
/// Only the fields needed to identify the sending session are kept.
#[derive(Clone, Debug, Deserialize)]
pub struct EncryptedEventContent {
    pub algorithm: String,
    #[serde(default)]
    pub sender_key: Option<String>,
    #[serde(default)]
    pub device_id: Option<OwnedDeviceId>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl EncryptedEventContent {
    pub fn from_event(event: &TimelineEvent) -> Result<Self, ContentError> {
        if !event.is_encrypted() {
            return Err(ContentError::NotEncrypted(event.event_id.clone()));
        }
        Self::deserialize(&event.content).map_err(|source| ContentError::Malformed {
            kind: "encrypted",
            event_id: event.event_id.clone(),
            source,
        })
    }
}

/// Returns the ID of the device that sent the given encrypted event.
pub fn sending_device_id(event: &TimelineEvent) -> Result<OwnedDeviceId, ContentError> {
    EncryptedEventContent::from_event(event)?
        .device_id
        .ok_or_else(|| ContentError::MissingDeviceId(event.event_id.clone()))
}

/// The state of an in-room key verification request, as aggregated from its references.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationState {
    #[default]
    Request,
    Waiting,
    CanceledByMe,
    CanceledByOther,
    DoneByMe,
    DoneByOther,
}

impl VerificationState {
    pub fn is_canceled(self) -> bool {
        matches!(self, Self::CanceledByMe | Self::CanceledByOther)
    }

    pub fn is_done(self) -> bool {
        matches!(self, Self::DoneByMe | Self::DoneByOther)
    }
}

#[derive(Deserialize)]
struct ReferencesAggregatedContent {
    #[serde(rename = "verif_sum", alias = "verification_state")]
    verification_state: VerificationState,
}

/// Parses the verification state out of an event's references aggregation, if it has one.
pub fn references_verification_state(
    event: &TimelineEvent,
) -> Option<Result<VerificationState, ContentError>> {
    let references = event.annotations.as_ref()?.references.as_ref()?;
    Some(
        ReferencesAggregatedContent::deserialize(references)
            .map(|content| content.verification_state)
            .map_err(|source| ContentError::Malformed {
                kind: "references",
                event_id: event.event_id.clone(),
                source,
            }),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::timeline::{EventAnnotations, test_utils::*};

    #[test]
    fn device_id_from_encrypted_content() {
        let event = encrypted_event("$a:example.org", "@alice:example.org", DAY_START, "D1");
        assert_eq!(sending_device_id(&event).unwrap().as_str(), "D1");
    }

    #[test]
    fn device_id_missing_is_reported() {
        let mut event = encrypted_event("$a:example.org", "@alice:example.org", DAY_START, "D1");
        event.content.as_object_mut().unwrap().remove("device_id");
        assert!(matches!(
            sending_device_id(&event),
            Err(ContentError::MissingDeviceId(_))
        ));
    }

    #[test]
    fn device_id_of_cleartext_event_is_an_error() {
        let event = text_event("$a:example.org", "@alice:example.org", DAY_START);
        assert!(matches!(
            sending_device_id(&event),
            Err(ContentError::NotEncrypted(_))
        ));
    }

    #[test]
    fn malformed_encrypted_content() {
        let mut event = encrypted_event("$a:example.org", "@alice:example.org", DAY_START, "D1");
        event.content = json!({ "ciphertext": 42 });
        assert!(matches!(
            sending_device_id(&event),
            Err(ContentError::Malformed { kind: "encrypted", .. })
        ));
    }

    #[test]
    fn references_verification_state_parsing() {
        let mut event = text_event("$a:example.org", "@alice:example.org", DAY_START);
        assert!(references_verification_state(&event).is_none());

        event.annotations = Some(EventAnnotations {
            references: Some(json!({ "verif_sum": "DONE_BY_OTHER" })),
            ..Default::default()
        });
        let state = references_verification_state(&event).unwrap().unwrap();
        assert_eq!(state, VerificationState::DoneByOther);
        assert!(state.is_done());

        event.annotations.as_mut().unwrap().references = Some(json!({ "verif_sum": "NOPE" }));
        assert!(references_verification_state(&event).unwrap().is_err());
    }
}
