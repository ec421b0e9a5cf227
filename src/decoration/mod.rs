//! Computing the per-message display metadata of a timeline.
//!
//! The [`MessageDecorationEngine`] is a pure function over its inputs:
//! it never blocks, performs no I/O, and keeps no cache,
//! so it can be re-run for any event whenever the event or its neighbors change.

use ruma::{EventId, MilliSecondsSinceUnixEpoch, OwnedEventId, OwnedMxcUri, OwnedUserId, UserId};
use serde::Serialize;

use crate::{
    preferences::DecorationPreferences,
    room::RoomContext,
    timeline::{SendState, TimelineEvent},
    trust::TrustLookup,
    utils,
};

pub mod aggregations;
pub mod e2e;
pub mod grouping;
pub mod send_state;

use aggregations::{
    AnonymousReadReceipt, PollResponseData, ReactionsSummary, ReferencesInfo,
    anonymous_read_receipt, poll_response_data, reactions_summary, references_info,
};
use e2e::{E2EDecoration, e2e_decoration};
use grouping::sender_grouping;
use send_state::{SendStateDecoration, send_state_decoration};

/// The inputs needed to decorate a single event.
#[derive(Clone, Copy, Debug)]
pub struct TimelineItemParams<'a> {
    pub event: &'a TimelineEvent,
    /// The closest displayable event sent *after* `event`.
    pub prev_displayable: Option<&'a TimelineEvent>,
    /// The closest displayable event sent *before* `event`.
    pub next_displayable: Option<&'a TimelineEvent>,
    pub room: &'a RoomContext,
    /// The latest event we sent that nobody else has read yet.
    pub last_sent_event_id_without_read_receipts: Option<&'a EventId>,
}

/// Everything the UI needs to know to display one message, beyond its content.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessageDisplayMetadata {
    pub event_id: OwnedEventId,
    pub sender_id: OwnedUserId,
    pub send_state: SendState,
    /// The formatted time of the message, absent if its timestamp is unknown.
    pub time: Option<String>,
    pub origin_server_ts: Option<MilliSecondsSinceUnixEpoch>,
    pub age_local_ts: Option<MilliSecondsSinceUnixEpoch>,
    pub avatar_url: Option<OwnedMxcUri>,
    pub member_name: String,
    pub sender_power_level: Option<i64>,
    pub message_type: Option<String>,

    pub add_day_separator: bool,
    pub is_first_from_this_sender: bool,
    pub is_last_from_this_sender: bool,

    pub send_state_decoration: SendStateDecoration,
    pub e2e_decoration: E2EDecoration,

    pub is_direct: bool,
    pub is_public: bool,
    pub dm_chat_partner_id: Option<OwnedUserId>,

    pub reactions_summary: ReactionsSummary,
    pub poll_response: Option<PollResponseData>,
    pub has_been_edited: bool,
    pub has_pending_edits: bool,
    pub references_info: Option<ReferencesInfo>,

    pub sent_by_me: bool,
    pub read_receipt_anonymous: AnonymousReadReceipt,
}

/// Derives [`MessageDisplayMetadata`] for events as seen by one user.
pub struct MessageDecorationEngine<'a, T: ?Sized> {
    my_user_id: &'a UserId,
    trust: &'a T,
    prefs: &'a DecorationPreferences,
}

impl<'a, T: TrustLookup + ?Sized> MessageDecorationEngine<'a, T> {
    pub fn new(my_user_id: &'a UserId, trust: &'a T, prefs: &'a DecorationPreferences) -> Self {
        Self { my_user_id, trust, prefs }
    }

    pub fn my_user_id(&self) -> &UserId {
        self.my_user_id
    }

    pub fn compute(&self, params: &TimelineItemParams<'_>) -> MessageDisplayMetadata {
        let event = params.event;
        let room = params.room;
        let offset = self.prefs.fixed_offset();

        if room.summary.is_none() {
            tracing::error!("Room {} has no summary, decorating event {} without it", room.room_id, event.event_id);
        }

        let grouping = sender_grouping(event, params.prev_displayable, params.next_displayable, offset);
        let sent_by_me = event.sender.as_str() == self.my_user_id.as_str();

        let send_state_decoration = if sent_by_me {
            send_state_decoration(event, params.last_sent_event_id_without_read_receipts)
        } else {
            SendStateDecoration::None
        };

        let profile = event.sender_profile.as_ref();
        let member_name = profile
            .and_then(|p| p.disambiguated_display_name.clone())
            .unwrap_or_else(|| event.sender.to_string());

        MessageDisplayMetadata {
            event_id: event.event_id.clone(),
            sender_id: event.sender.clone(),
            send_state: event.send_state,
            time: self.format_time(event),
            origin_server_ts: event.origin_server_ts,
            age_local_ts: event.age_local_ts,
            avatar_url: profile.and_then(|p| p.avatar_url.clone()),
            member_name,
            sender_power_level: room.user_power_level(&event.sender),
            message_type: event.msg_type().map(ToOwned::to_owned),

            add_day_separator: grouping.add_day_separator,
            is_first_from_this_sender: grouping.is_first_from_this_sender,
            is_last_from_this_sender: grouping.is_last_from_this_sender,

            send_state_decoration,
            e2e_decoration: e2e_decoration(event, room, self.trust),

            is_direct: room.is_direct(),
            is_public: room.is_public(),
            dm_chat_partner_id: room.dm_partner(self.my_user_id),

            reactions_summary: reactions_summary(event),
            poll_response: poll_response_data(event),
            has_been_edited: event.has_been_edited(),
            has_pending_edits: event.has_pending_edits(),
            references_info: references_info(event),

            sent_by_me,
            read_receipt_anonymous: anonymous_read_receipt(event, self.my_user_id),
        }
    }

    fn format_time(&self, event: &TimelineEvent) -> Option<String> {
        let ts = event.origin_server_ts.as_ref()?;
        let time = utils::format_timestamp(ts, &self.prefs.time_format, self.prefs.fixed_offset());
        if time.is_none() {
            tracing::warn!("Couldn't format the timestamp {ts:?} of event {}", event.event_id);
        }
        let time = time?;
        if self.prefs.show_display_index {
            Some(format!("{time} | {}", event.display_index))
        } else {
            Some(time)
        }
    }
}
