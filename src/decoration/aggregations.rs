//! Summaries of what other events contributed to a message:
//! reactions, poll votes, verification request state, and read receipts.

use std::{cmp::Ordering, collections::BTreeMap};

use ruma::UserId;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::timeline::{
    MESSAGE_EVENT_TYPE, ReactionAggregation, TimelineEvent,
    content::{VerificationState, references_verification_state},
};

/// A single reaction key shown below a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReactionInfo {
    pub key: String,
    /// The emoji shortcode of the key, e.g. `thumbsup`, if it is a known emoji.
    pub shortcode: Option<&'static str>,
    pub count: u32,
    pub added_by_me: bool,
    /// False while one of our own reactions with this key is still being sent.
    pub synced: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReactionsSummary {
    pub reactions: Vec<ReactionInfo>,
}

/// Looks up the shortcode of a reaction key.
///
/// Keys often carry variant selectors, so if the full key isn't a known emoji
/// we retry with just its first character.
fn reaction_shortcode(key: &str) -> Option<&'static str> {
    emojis::get(key)
        .or_else(|| {
            let first = key.chars().next()?;
            emojis::get(first.encode_utf8(&mut [0; 4]))
        })
        .and_then(|emoji| emoji.shortcode())
}

/// Orders reactions by when they were first added; reactions with an unknown time go last.
fn reaction_order(a: &ReactionAggregation, b: &ReactionAggregation) -> Ordering {
    match (a.first_timestamp, b.first_timestamp) {
        (Some(a_ts), Some(b_ts)) => a_ts.cmp(&b_ts),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.key.cmp(&b.key))
}

pub fn reactions_summary(event: &TimelineEvent) -> ReactionsSummary {
    let Some(annotations) = event.annotations.as_ref() else {
        return ReactionsSummary::default();
    };
    let mut aggregations: Vec<&ReactionAggregation> = annotations
        .reactions
        .iter()
        .filter(|r| r.count > 0)
        .collect();
    aggregations.sort_by(|a, b| reaction_order(a, b));

    ReactionsSummary {
        reactions: aggregations
            .into_iter()
            .map(|r| ReactionInfo {
                key: r.key.clone(),
                shortcode: reaction_shortcode(&r.key),
                count: r.count,
                added_by_me: r.added_by_me,
                synced: r.local_echoes.is_empty(),
            })
            .collect(),
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PollVoteSummaryData {
    pub total: u32,
    pub percentage: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PollResponseData {
    pub my_vote: Option<String>,
    pub votes: Option<BTreeMap<String, PollVoteSummaryData>>,
    pub winner_vote_count: u32,
    pub total_votes: u32,
    pub is_closed: bool,
}

pub fn poll_response_data(event: &TimelineEvent) -> Option<PollResponseData> {
    let poll = event.annotations.as_ref()?.poll_response.as_ref()?;
    Some(PollResponseData {
        my_vote: poll.my_vote.clone(),
        votes: poll.votes_summary.as_ref().map(|votes| {
            votes
                .iter()
                .map(|(option, summary)| {
                    (option.clone(), PollVoteSummaryData {
                        total: summary.total,
                        percentage: summary.percentage,
                    })
                })
                .collect()
        }),
        winner_vote_count: poll.winner_vote_count.unwrap_or(0),
        total_votes: poll.total_votes.unwrap_or(0),
        is_closed: poll.closed_time.is_some(),
    })
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReferencesInfo {
    pub verification_state: VerificationState,
}

/// Summarizes the references aggregation of an event, e.g. a verification request.
///
/// Malformed aggregated content is treated as a pending request.
pub fn references_info(event: &TimelineEvent) -> Option<ReferencesInfo> {
    let verification_state = match references_verification_state(event)? {
        Ok(state) => state,
        Err(e) => {
            warn!("{e}");
            VerificationState::Request
        }
    };
    Some(ReferencesInfo { verification_state })
}

/// A read receipt indicator that doesn't reveal who read the message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnonymousReadReceipt {
    #[default]
    None,
    /// Our message hasn't reached the server yet.
    Processing,
    /// Someone else has read our message.
    Read,
}

pub fn anonymous_read_receipt(event: &TimelineEvent, my_user_id: &UserId) -> AnonymousReadReceipt {
    if event.sender.as_str() != my_user_id.as_str() || event.clear_type() != MESSAGE_EVENT_TYPE {
        return AnonymousReadReceipt::None;
    }
    if event.send_state.is_sending() {
        AnonymousReadReceipt::Processing
    } else if event.is_read_by_other(my_user_id) {
        AnonymousReadReceipt::Read
    } else {
        AnonymousReadReceipt::None
    }
}

#[cfg(test)]
mod tests {
    use ruma::user_id;
    use serde_json::json;

    use super::*;
    use crate::timeline::{
        EventAnnotations, PollResponseAggregation, SendState, VoteSummary, test_utils::*,
    };

    fn reaction(key: &str, count: u32, first: Option<u64>) -> ReactionAggregation {
        ReactionAggregation {
            key: key.to_owned(),
            count,
            added_by_me: false,
            first_timestamp: first.map(ts),
            local_echoes: Vec::new(),
        }
    }

    #[test]
    fn reactions_are_ordered_and_annotated() {
        let mut event = text_event("$a:example.org", "@alice:example.org", DAY_START);
        let mut mine = reaction("👍", 2, Some(DAY_START + 2 * HOUR));
        mine.added_by_me = true;
        mine.local_echoes.push("txn1".into());
        event.annotations = Some(EventAnnotations {
            reactions: vec![
                mine,
                reaction("custom", 1, None),
                reaction("❤️", 3, Some(DAY_START + HOUR)),
                reaction("🎉", 0, Some(DAY_START)),
            ],
            ..Default::default()
        });

        let summary = reactions_summary(&event);
        let keys: Vec<&str> = summary.reactions.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["❤️", "👍", "custom"]);

        let thumbs_up = &summary.reactions[1];
        assert_eq!(thumbs_up.count, 2);
        assert!(thumbs_up.added_by_me);
        assert!(!thumbs_up.synced);
        assert!(thumbs_up.shortcode.is_some());
        assert!(summary.reactions[2].shortcode.is_none());
        assert!(summary.reactions[2].synced);
    }

    #[test]
    fn no_annotations_means_no_reactions_or_poll() {
        let event = text_event("$a:example.org", "@alice:example.org", DAY_START);
        assert!(reactions_summary(&event).reactions.is_empty());
        assert_eq!(poll_response_data(&event), None);
        assert_eq!(references_info(&event), None);
    }

    #[test]
    fn poll_summary_defaults_missing_counts() {
        let mut event = text_event("$a:example.org", "@alice:example.org", DAY_START);
        event.annotations = Some(EventAnnotations {
            poll_response: Some(PollResponseAggregation {
                my_vote: Some("opt-a".into()),
                votes_summary: Some(BTreeMap::from([
                    ("opt-a".to_owned(), VoteSummary { total: 3, percentage: 0.75 }),
                    ("opt-b".to_owned(), VoteSummary { total: 1, percentage: 0.25 }),
                ])),
                winner_vote_count: None,
                total_votes: Some(4),
                closed_time: Some(ts(DAY_START + DAY)),
            }),
            ..Default::default()
        });

        let poll = poll_response_data(&event).unwrap();
        assert_eq!(poll.my_vote.as_deref(), Some("opt-a"));
        assert_eq!(poll.winner_vote_count, 0);
        assert_eq!(poll.total_votes, 4);
        assert!(poll.is_closed);
        assert_eq!(poll.votes.unwrap()["opt-a"].total, 3);
    }

    #[test]
    fn malformed_references_fall_back_to_request() {
        let mut event = text_event("$a:example.org", "@alice:example.org", DAY_START);
        event.annotations = Some(EventAnnotations {
            references: Some(json!({ "something": "else" })),
            ..Default::default()
        });
        assert_eq!(
            references_info(&event),
            Some(ReferencesInfo { verification_state: VerificationState::Request }),
        );
    }

    #[test]
    fn anonymous_read_receipt_for_own_messages_only() {
        let me = user_id!("@me:example.org");
        let mut event = text_event("$a:example.org", me.as_str(), DAY_START);
        assert_eq!(anonymous_read_receipt(&event, me), AnonymousReadReceipt::None);

        event.read_receipts.push(me.to_owned());
        assert_eq!(anonymous_read_receipt(&event, me), AnonymousReadReceipt::None);

        event.read_receipts.push(user_id!("@bob:example.org").to_owned());
        assert_eq!(anonymous_read_receipt(&event, me), AnonymousReadReceipt::Read);

        event.send_state = SendState::Sending;
        assert_eq!(anonymous_read_receipt(&event, me), AnonymousReadReceipt::Processing);

        let theirs = text_event("$b:example.org", "@bob:example.org", DAY_START);
        assert_eq!(anonymous_read_receipt(&theirs, me), AnonymousReadReceipt::None);
    }
}
