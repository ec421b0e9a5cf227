//! The unread counter badge shown next to a room in the rooms list.

use serde::{Deserialize, Serialize};

use crate::{preferences::DecorationPreferences, utils::format_unread_counter};

/// The unread counts of a room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnreadBadgeState {
    /// The number of unread notifications.
    pub count: u32,
    /// Whether any of the unread notifications is a highlight (e.g., a mention).
    pub highlighted: bool,
    /// The number of unread messages that don't trigger a notification.
    pub unread: u32,
    /// Whether the user manually marked the room as unread.
    pub marked_unread: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeStyle {
    Highlight,
    Notification,
    Unimportant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BadgeAppearance {
    pub style: BadgeStyle,
    pub text: String,
}

impl UnreadBadgeState {
    /// Returns how the badge should look, or `None` if it should be hidden.
    pub fn render(&self, prefs: &DecorationPreferences) -> Option<BadgeAppearance> {
        if self.count == 0
            && !self.marked_unread
            && (self.unread == 0 || !prefs.show_unimportant_counter_badge)
        {
            return None;
        }

        let style = if self.count > 0 || self.marked_unread {
            if self.highlighted { BadgeStyle::Highlight } else { BadgeStyle::Notification }
        } else {
            BadgeStyle::Unimportant
        };

        // A room that is only marked as unread has nothing to count.
        let text = if self.count == 0 && self.marked_unread {
            "!".to_owned()
        } else {
            format_unread_counter(if self.count > 0 { self.count } else { self.unread })
        };

        Some(BadgeAppearance { style, text })
    }
}
