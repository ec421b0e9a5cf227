//! Grouping consecutive messages from the same sender.
//!
//! Timelines are walked from the newest event to the oldest one, so the
//! "next" displayable event is the one sent just *before* the current event,
//! and the "previous" displayable event is the one sent just *after* it.

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;

use crate::{timeline::TimelineEvent, utils::local_date};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SenderGrouping {
    /// A day divider must be shown before this event.
    pub add_day_separator: bool,
    /// This event starts a new run of messages from its sender.
    pub is_first_from_this_sender: bool,
    /// This event ends a run of messages from its sender.
    pub is_last_from_this_sender: bool,
}

fn event_date(event: &TimelineEvent, offset: Option<FixedOffset>) -> Option<NaiveDate> {
    event
        .origin_server_ts
        .as_ref()
        .and_then(|ts| local_date(ts, offset))
}

/// Computes how `event` groups with its displayable neighbors.
///
/// This only looks at the adjacent displayable events, so it must be recomputed
/// whenever those neighbors change, not just when `event` itself changes.
pub fn sender_grouping(
    event: &TimelineEvent,
    prev_displayable: Option<&TimelineEvent>,
    next_displayable: Option<&TimelineEvent>,
    offset: Option<FixedOffset>,
) -> SenderGrouping {
    let date = event_date(event, offset);

    let add_day_separator = match next_displayable {
        Some(next) => event_date(next, offset) != date,
        None => true,
    };

    let is_first_from_this_sender = next_displayable
        .is_none_or(|next| next.sender != event.sender)
        || add_day_separator;

    let is_last_from_this_sender = match prev_displayable {
        Some(prev) => prev.sender != event.sender || event_date(prev, offset) != date,
        None => true,
    };

    SenderGrouping {
        add_day_separator,
        is_first_from_this_sender,
        is_last_from_this_sender,
    }
}
