/// The event data model the decorations are derived from.
pub mod timeline;
/// Room state: summary flags, members, power levels.
pub mod room;
/// Cross-signing and device trust lookups.
pub mod trust;
/// Computing per-message display metadata.
pub mod decoration;
/// The rooms list's unread counter badge.
pub mod badge;

pub mod preferences;
pub mod utils;

pub use decoration::{MessageDecorationEngine, MessageDisplayMetadata, TimelineItemParams};
pub use preferences::DecorationPreferences;
pub use room::RoomContext;
pub use timeline::{SendState, TimelineEvent};
pub use trust::{TrustLookup, TrustSnapshot};
