//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that stays inside the limits the store and the wire format enforce.

use bytes::Bytes;
use proptest::prelude::*;
use uuid::Uuid;
use watchdb_core::timeline::AttributeId;
use watchdb_core::{DatabaseId, Selector, SelectorChain, TimelineItem};
use watchdb_protocol::BlobCommand;

/// Strategy for generating valid record keys (1 to 32 bytes).
pub fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=32)
}

/// Strategy for generating record values.
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

/// Strategy for picking one of the known databases.
pub fn database_id_strategy() -> impl Strategy<Value = DatabaseId> {
    prop::sample::select(DatabaseId::ALL.to_vec())
}

/// Strategy for generating a single selector with small offsets, so that
/// both in-range and out-of-range spans show up.
pub fn selector_strategy() -> impl Strategy<Value = Selector> {
    prop_oneof![
        (0usize..16, prop::collection::vec(any::<u8>(), 0..4))
            .prop_map(|(offset, operand)| Selector::Filter { offset, operand }),
        (0usize..16, 0usize..8).prop_map(|(offset, size)| Selector::Project { offset, size }),
        Just(Selector::ProjectFull),
    ]
}

/// Strategy for generating selector chains of up to six entries.
pub fn selector_chain_strategy() -> impl Strategy<Value = SelectorChain> {
    prop::collection::vec(selector_strategy(), 0..6).prop_map(|selectors| {
        let mut chain = SelectorChain::new();
        for selector in selectors {
            chain.push(selector);
        }
        chain
    })
}

/// Strategy for generating encodable insert and delete commands.
pub fn blob_command_strategy() -> impl Strategy<Value = BlobCommand> {
    prop_oneof![
        (any::<u16>(), any::<u8>(), key_strategy(), value_strategy()).prop_map(
            |(token, database, key, value)| BlobCommand::Insert {
                token,
                database,
                key: Bytes::from(key),
                value: Bytes::from(value),
            }
        ),
        (any::<u16>(), any::<u8>(), key_strategy()).prop_map(|(token, database, key)| {
            BlobCommand::Delete {
                token,
                database,
                key: Bytes::from(key),
            }
        }),
    ]
}

/// Strategy for generating encoded Blob frames.
pub fn blob_frame_strategy() -> impl Strategy<Value = Bytes> {
    blob_command_strategy().prop_filter_map("command must encode", |cmd| cmd.encode().ok())
}

/// Strategy for generating text attribute ids, including unknown ones.
pub fn attribute_id_strategy() -> impl Strategy<Value = AttributeId> {
    prop_oneof![
        Just(AttributeId::Sender),
        Just(AttributeId::Subject),
        Just(AttributeId::Message),
        (4u8..=255).prop_map(AttributeId::from),
    ]
}

/// Strategy for generating notification items with up to eight text
/// attributes.
pub fn timeline_item_strategy() -> impl Strategy<Value = TimelineItem> {
    (
        any::<[u8; 16]>(),
        any::<u32>(),
        prop::collection::vec((attribute_id_strategy(), "[a-zA-Z0-9 ]{0,24}"), 0..8),
    )
        .prop_map(|(uuid, timestamp, attributes)| {
            attributes.into_iter().fold(
                TimelineItem::notification(Uuid::from_bytes(uuid), timestamp),
                |item, (id, text)| item.with_attribute(id, text),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchdb_core::Notification;

    proptest! {
        #[test]
        fn keys_fit_the_wire(key in key_strategy()) {
            prop_assert!(!key.is_empty());
            prop_assert!(key.len() <= watchdb_protocol::MAX_KEY_SIZE);
        }

        #[test]
        fn frames_decode(frame in blob_frame_strategy()) {
            let decoded = BlobCommand::decode(&frame).unwrap();
            prop_assert_eq!(decoded.encoded_size(), frame.len());
        }

        #[test]
        fn items_parse_as_notifications(item in timeline_item_strategy()) {
            let value = item.encode().unwrap();
            let notification = Notification::from_value(&value).unwrap();
            prop_assert_eq!(notification.uuid(), item.uuid);
            prop_assert_eq!(notification.attributes().len(), item.attributes.len());
        }
    }
}
