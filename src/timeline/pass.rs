//! Decorating a whole timeline at once.
//!
//! Events are passed in chronological order (oldest first), as a timeline store holds them.

use indexmap::IndexMap;
use ruma::{OwnedEventId, UserId};

use crate::{
    decoration::{MessageDecorationEngine, MessageDisplayMetadata, TimelineItemParams},
    room::RoomContext,
    timeline::TimelineEvent,
    trust::TrustLookup,
};

/// Finds our most recent sent event that hasn't been read by anyone else yet.
///
/// Walks back from the newest displayable event. If another user's read receipt
/// is found first, all of our older events have been read and there is no such event.
pub fn last_sent_event_id_without_read_receipts<F>(
    events: &[TimelineEvent],
    my_user_id: &UserId,
    is_displayable: F,
) -> Option<OwnedEventId>
where
    F: Fn(&TimelineEvent) -> bool,
{
    for event in events.iter().rev().filter(|&e| is_displayable(e)) {
        if event.is_read_by_other(my_user_id) {
            return None;
        }
        if event.sender.as_str() == my_user_id.as_str() && event.send_state.is_sent() {
            return Some(event.event_id.clone());
        }
    }
    None
}

/// Decorates every displayable event of a timeline.
///
/// The returned map is ordered like `events`, skipping non-displayable events.
/// If an event ID appears more than once (e.g., a local echo next to its remote echo),
/// only the last occurrence is kept, at its own position.
pub fn decorate_timeline<T, F>(
    engine: &MessageDecorationEngine<'_, T>,
    events: &[TimelineEvent],
    room: &RoomContext,
    is_displayable: F,
) -> IndexMap<OwnedEventId, MessageDisplayMetadata>
where
    T: TrustLookup + ?Sized,
    F: Fn(&TimelineEvent) -> bool,
{
    let displayable: Vec<&TimelineEvent> = events.iter().filter(|&e| is_displayable(e)).collect();
    let marker = last_sent_event_id_without_read_receipts(events, engine.my_user_id(), &is_displayable);
    tracing::trace!(
        "Decorating {} of {} events in room {}, last unread sent event: {marker:?}",
        displayable.len(),
        events.len(),
        room.room_id,
    );

    let mut decorated = IndexMap::with_capacity(displayable.len());
    for (i, &event) in displayable.iter().enumerate() {
        let next_displayable = i.checked_sub(1).map(|j| displayable[j]);
        let prev_displayable = displayable.get(i + 1).copied();
        let metadata = engine.compute(&TimelineItemParams {
            event,
            prev_displayable,
            next_displayable,
            room,
            last_sent_event_id_without_read_receipts: marker.as_deref(),
        });
        if decorated.shift_remove(&event.event_id).is_some() {
            tracing::warn!("Event {} appears more than once in room {}, keeping the latest", event.event_id, room.room_id);
        }
        decorated.insert(event.event_id.clone(), metadata);
    }
    decorated
}
