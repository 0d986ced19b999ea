use serde::{Deserialize, Serialize};

use crate::entry::EntryView;
use crate::id::ContentId;

/// A notification pushed to connected observers.
///
/// Serialized as an internally tagged object; [`name`](Self::name) gives the
/// wire name used as the SSE `event:` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HubEvent {
    /// Every live entry at the moment the observer connected, newest first.
    InitialSnapshot { entries: Vec<EntryView> },
    /// A new entry was stored.
    ContentAdded { entry: EntryView },
    /// An entry was removed from the store.
    ContentRemoved { id: ContentId },
    /// The number of observers currently connected.
    ClientCount { count: usize },
}

impl HubEvent {
    /// Wire name of the event kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitialSnapshot { .. } => "initial-snapshot",
            Self::ContentAdded { .. } => "content-added",
            Self::ContentRemoved { .. } => "content-removed",
            Self::ClientCount { .. } => "client-count",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_serde_tags() {
        let events = [
            HubEvent::InitialSnapshot { entries: vec![] },
            HubEvent::ContentRemoved {
                id: ContentId::new("x"),
            },
            HubEvent::ClientCount { count: 2 },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.name());
        }
    }

    #[test]
    fn removed_event_carries_only_the_id() {
        let json = serde_json::to_value(HubEvent::ContentRemoved {
            id: ContentId::new("abc"),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "content-removed", "id": "abc"}));
    }
}
