use ruma::EventId;
use serde::{Deserialize, Serialize};

use crate::timeline::TimelineEvent;

/// The delivery indicator shown next to one of our own messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendStateDecoration {
    #[default]
    None,
    SendingMedia,
    SendingNonMedia,
    Sent,
    Failed,
}

/// Computes the send state decoration of an event sent by the local user.
///
/// The checks are a priority list: a sending or failed event is decorated
/// as such even if it is also the latest sent event without read receipts.
pub fn send_state_decoration(
    event: &TimelineEvent,
    last_sent_event_id_without_read_receipts: Option<&EventId>,
) -> SendStateDecoration {
    let send_state = event.send_state;
    if send_state.is_sending() {
        if event.is_attachment_message() {
            SendStateDecoration::SendingMedia
        } else {
            SendStateDecoration::SendingNonMedia
        }
    } else if send_state.has_failed() {
        SendStateDecoration::Failed
    } else if last_sent_event_id_without_read_receipts
        .is_some_and(|id| id.as_str() == event.event_id.as_str())
    {
        SendStateDecoration::Sent
    } else {
        SendStateDecoration::None
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::timeline::{SendState, test_utils::*};

    #[test]
    fn sending_distinguishes_media() {
        let mut event = text_event("$a:example.org", "@me:example.org", DAY_START);
        event.send_state = SendState::Sending;
        assert_eq!(send_state_decoration(&event, None), SendStateDecoration::SendingNonMedia);

        event.content = json!({ "msgtype": "m.video", "body": "clip.mp4" });
        event.send_state = SendState::Encrypting;
        assert_eq!(send_state_decoration(&event, None), SendStateDecoration::SendingMedia);
    }

    #[test]
    fn failed_wins_over_the_read_receipt_marker() {
        let mut event = text_event("$a:example.org", "@me:example.org", DAY_START);
        event.send_state = SendState::Undelivered;
        let marker = event.event_id.clone();
        assert_eq!(send_state_decoration(&event, Some(&*marker)), SendStateDecoration::Failed);
    }

    #[test]
    fn sending_wins_over_the_read_receipt_marker() {
        let mut event = text_event("$a:example.org", "@me:example.org", DAY_START);
        event.send_state = SendState::Unsent;
        let marker = event.event_id.clone();
        assert_eq!(send_state_decoration(&event, Some(&*marker)), SendStateDecoration::SendingNonMedia);
    }

    #[test]
    fn sent_only_for_the_marked_event() {
        let event = text_event("$a:example.org", "@me:example.org", DAY_START);
        let other = text_event("$b:example.org", "@me:example.org", DAY_START);
        assert_eq!(send_state_decoration(&event, Some(&*event.event_id)), SendStateDecoration::Sent);
        assert_eq!(send_state_decoration(&event, Some(&*other.event_id)), SendStateDecoration::None);
        assert_eq!(send_state_decoration(&event, None), SendStateDecoration::None);
    }
}
