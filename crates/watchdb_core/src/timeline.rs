//! Timeline item values and notification accessors.
//!
//! Notification, pin and reminder records share one little-endian value
//! layout:
//!
//! ```text
//! | uuid (16) | parent (16) | timestamp (4) | duration (2) | type (1) |
//! | flags (2) | layout (1) | data_length (2) | attr_count (1) | action_count (1) |
//! | attributes ... | actions ... |
//! ```
//!
//! Each attribute is `| id (1) | length (2) | data |`; each action is
//! `| id (1) | type (1) | attr_count (1) | attributes ... |`.
//!
//! The store never looks inside values. This module is for consumers, such
//! as the notification list, that do.

use crate::effects::{ChangeKind, EffectRouter, RecordChanged};
use crate::error::{CoreError, CoreResult};
use crate::select::{find_one, Lookup};
use crate::selector::SelectorChain;
use crate::store::RecordStore;
use crate::types::DatabaseId;
use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use tracing::{debug, trace};
use uuid::Uuid;

/// Offset of the item uuid within a timeline value.
pub const UUID_OFFSET: usize = 0;
/// Size of the item uuid.
pub const UUID_SIZE: usize = 16;

/// Title shown for a notification without sender, subject or message.
pub const NO_TITLE: &str = "No title";

/// Attribute identifiers with display meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeId {
    /// Who sent the item.
    Sender,
    /// Subject line.
    Subject,
    /// Body text.
    Message,
    /// Any other attribute, kept opaque.
    Other(u8),
}

impl AttributeId {
    /// Returns the wire id.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Sender => 0x01,
            Self::Subject => 0x02,
            Self::Message => 0x03,
            Self::Other(id) => id,
        }
    }
}

impl From<u8> for AttributeId {
    fn from(id: u8) -> Self {
        match id {
            0x01 => Self::Sender,
            0x02 => Self::Subject,
            0x03 => Self::Message,
            other => Self::Other(other),
        }
    }
}

/// One `{id, data}` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute identifier.
    pub id: AttributeId,
    /// Raw attribute bytes.
    pub data: Vec<u8>,
}

impl Attribute {
    /// Creates an attribute.
    #[must_use]
    pub fn new(id: AttributeId, data: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            data: data.into(),
        }
    }

    /// The attribute as text, up to the first NUL.
    #[must_use]
    pub fn text(&self) -> String {
        let end = self.data.iter().position(|&b| b == 0).unwrap_or(self.data.len());
        String::from_utf8_lossy(&self.data[..end]).into_owned()
    }
}

/// An action attached to a timeline item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Action identifier.
    pub id: u8,
    /// Action type.
    pub action_type: u8,
    /// Attributes of the action.
    pub attributes: Vec<Attribute>,
}

/// A decoded timeline item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineItem {
    /// Item id.
    pub uuid: Uuid,
    /// Parent item (the owning app for notifications).
    pub parent: Uuid,
    /// Seconds since the epoch.
    pub timestamp: u32,
    /// Duration in minutes.
    pub duration: u16,
    /// Item type, see the `TYPE_*` constants.
    pub item_type: u8,
    /// Item flags.
    pub flags: u16,
    /// Display layout id.
    pub layout: u8,
    /// Attributes in stored order.
    pub attributes: Vec<Attribute>,
    /// Actions in stored order.
    pub actions: Vec<Action>,
}

impl TimelineItem {
    /// Fixed header size.
    pub const HEADER_SIZE: usize = 46;
    /// Item type of notifications.
    pub const TYPE_NOTIFICATION: u8 = 1;
    /// Item type of pins.
    pub const TYPE_PIN: u8 = 2;
    /// Item type of reminders.
    pub const TYPE_REMINDER: u8 = 3;

    /// Creates a notification item with no attributes.
    #[must_use]
    pub fn notification(uuid: Uuid, timestamp: u32) -> Self {
        Self {
            uuid,
            parent: Uuid::nil(),
            timestamp,
            duration: 0,
            item_type: Self::TYPE_NOTIFICATION,
            flags: 0,
            layout: 0,
            attributes: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Appends an attribute.
    #[must_use]
    pub fn with_attribute(mut self, id: AttributeId, data: impl Into<Vec<u8>>) -> Self {
        self.attributes.push(Attribute::new(id, data));
        self
    }

    /// Appends an action.
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Decodes a stored value. Bytes past `data_length` are ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` if any declared length runs past the value.
    pub fn parse(value: &[u8]) -> CoreResult<Self> {
        let mut header = Reader::new(value);
        let uuid = Uuid::from_slice(header.take(UUID_SIZE, "uuid")?)
            .map_err(|e| CoreError::invalid_record(e.to_string()))?;
        let parent = Uuid::from_slice(header.take(UUID_SIZE, "parent uuid")?)
            .map_err(|e| CoreError::invalid_record(e.to_string()))?;
        let timestamp = header.u32("timestamp")?;
        let duration = header.u16("duration")?;
        let item_type = header.u8("item type")?;
        let flags = header.u16("flags")?;
        let layout = header.u8("layout")?;
        let data_length = usize::from(header.u16("data length")?);
        let attribute_count = header.u8("attribute count")?;
        let action_count = header.u8("action count")?;

        let mut body = Reader::new(header.take(data_length, "item data")?);
        let attributes = (0..attribute_count)
            .map(|_| body.attribute())
            .collect::<CoreResult<Vec<_>>>()?;
        let actions = (0..action_count)
            .map(|_| {
                let id = body.u8("action id")?;
                let action_type = body.u8("action type")?;
                let count = body.u8("action attribute count")?;
                let attributes = (0..count)
                    .map(|_| body.attribute())
                    .collect::<CoreResult<Vec<_>>>()?;
                Ok(Action {
                    id,
                    action_type,
                    attributes,
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Self {
            uuid,
            parent,
            timestamp,
            duration,
            item_type,
            flags,
            layout,
            attributes,
            actions,
        })
    }

    /// Encodes the item into a store value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` if a count or length does not fit its field.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let mut data = Vec::new();
        for attribute in &self.attributes {
            write_attribute(&mut data, attribute)?;
        }
        for action in &self.actions {
            data.push(action.id);
            data.push(action.action_type);
            data.push(count_u8(action.attributes.len(), "action attributes")?);
            for attribute in &action.attributes {
                write_attribute(&mut data, attribute)?;
            }
        }

        let data_length = u16::try_from(data.len())
            .map_err(|_| CoreError::invalid_record("item data exceeds 65535 bytes"))?;

        let mut buf = Vec::with_capacity(Self::HEADER_SIZE + data.len());
        buf.extend_from_slice(self.uuid.as_bytes());
        buf.extend_from_slice(self.parent.as_bytes());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        buf.extend_from_slice(&self.duration.to_le_bytes());
        buf.push(self.item_type);
        buf.extend_from_slice(&self.flags.to_le_bytes());
        buf.push(self.layout);
        buf.extend_from_slice(&data_length.to_le_bytes());
        buf.push(count_u8(self.attributes.len(), "attributes")?);
        buf.push(count_u8(self.actions.len(), "actions")?);
        buf.extend_from_slice(&data);
        Ok(buf)
    }
}

fn count_u8(count: usize, what: &str) -> CoreResult<u8> {
    u8::try_from(count).map_err(|_| CoreError::invalid_record(format!("too many {what}: {count}")))
}

fn write_attribute(buf: &mut Vec<u8>, attribute: &Attribute) -> CoreResult<()> {
    let len = u16::try_from(attribute.data.len())
        .map_err(|_| CoreError::invalid_record("attribute exceeds 65535 bytes"))?;
    buf.push(attribute.id.as_u8());
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(&attribute.data);
    Ok(())
}

/// Bounds-checked little-endian reader.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize, field: &str) -> CoreResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                CoreError::invalid_record(format!(
                    "{field} needs {len} bytes at offset {}, value has {}",
                    self.pos,
                    self.data.len()
                ))
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self, field: &str) -> CoreResult<u8> {
        Ok(self.take(1, field)?[0])
    }

    fn u16(&mut self, field: &str) -> CoreResult<u16> {
        let b = self.take(2, field)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, field: &str) -> CoreResult<u32> {
        let b = self.take(4, field)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn attribute(&mut self) -> CoreResult<Attribute> {
        let id = AttributeId::from(self.u8("attribute id")?);
        let len = usize::from(self.u16("attribute length")?);
        let data = self.take(len, "attribute data")?.to_vec();
        Ok(Attribute { id, data })
    }
}

/// Title and optional subtitle for one list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayText {
    /// First line.
    pub title: String,
    /// Second line, if there is one.
    pub subtitle: Option<String>,
}

impl DisplayText {
    /// The row shown when there are no notifications at all.
    #[must_use]
    pub fn empty_feed() -> Self {
        Self {
            title: "No notifications".to_string(),
            subtitle: Some("Asleep at the switch?".to_string()),
        }
    }
}

/// A notification record, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    item: TimelineItem,
}

impl Notification {
    /// Decodes a notification value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` if the value is not a timeline item.
    pub fn from_value(value: &[u8]) -> CoreResult<Self> {
        TimelineItem::parse(value).map(|item| Self { item })
    }

    /// The notification id.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.item.uuid
    }

    /// Seconds since the epoch.
    #[must_use]
    pub fn timestamp(&self) -> u32 {
        self.item.timestamp
    }

    /// Attributes in stored order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.item.attributes
    }

    /// The underlying timeline item.
    #[must_use]
    pub fn item(&self) -> &TimelineItem {
        &self.item
    }

    /// Picks what the list row shows.
    ///
    /// Sender beats subject beats message for the title; the next present
    /// one becomes the subtitle. Empty text counts as absent. When an
    /// attribute repeats, the last one wins.
    #[must_use]
    pub fn display_text(&self) -> DisplayText {
        let mut sender = None;
        let mut subject = None;
        let mut message = None;
        for attribute in &self.item.attributes {
            let slot = match attribute.id {
                AttributeId::Sender => &mut sender,
                AttributeId::Subject => &mut subject,
                AttributeId::Message => &mut message,
                AttributeId::Other(_) => continue,
            };
            *slot = Some(attribute.text());
        }

        let mut present = [sender, subject, message]
            .into_iter()
            .flatten()
            .filter(|text| !text.is_empty());

        match present.next() {
            Some(title) => DisplayText {
                title,
                subtitle: present.next(),
            },
            None => DisplayText {
                title: NO_TITLE.to_string(),
                subtitle: None,
            },
        }
    }
}

/// The notification list as seen by a list UI.
///
/// Holds only uuids. Each row is loaded in full on demand, so memory stays
/// flat however many notifications are stored.
#[derive(Debug)]
pub struct NotificationFeed {
    store: Arc<RecordStore>,
    keys: Vec<Uuid>,
}

impl NotificationFeed {
    /// Creates an empty feed; call [`refresh`](Self::refresh) to fill it.
    #[must_use]
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self {
            store,
            keys: Vec::new(),
        }
    }

    /// Re-reads the uuid of every stored notification, in store order.
    /// Values too short to hold a uuid are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification database cannot be opened.
    pub fn refresh(&mut self) -> CoreResult<usize> {
        let handle = self.store.open(DatabaseId::Notification)?;
        let (count, results) =
            handle.select(&SelectorChain::new().project(UUID_OFFSET, UUID_SIZE))?;
        let keys: Vec<Uuid> = results
            .iter()
            .filter_map(|r| r.field(0))
            .filter_map(|bytes| Uuid::from_slice(bytes).ok())
            .collect();
        drop(results);
        handle.close();

        debug!(count, "notification feed refreshed");
        self.keys = keys;
        Ok(count)
    }

    /// The uuids from the last refresh.
    #[must_use]
    pub fn keys(&self) -> &[Uuid] {
        &self.keys
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the feed has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Fully loads one notification by uuid.
    ///
    /// A stored value that is not a valid timeline item is reported as
    /// `IoError`.
    pub fn load(&self, uuid: Uuid) -> Lookup<Notification> {
        let handle = match self.store.open(DatabaseId::Notification) {
            Ok(handle) => handle,
            Err(err) => return Lookup::IoError(err),
        };
        let chain = SelectorChain::new().filter(UUID_OFFSET, uuid.as_bytes().to_vec());

        match find_one(&handle, &chain) {
            Lookup::Found(record) => match Notification::from_value(record.value()) {
                Ok(notification) => Lookup::Found(notification),
                Err(err) => Lookup::IoError(err),
            },
            Lookup::NotFound => {
                debug!(%uuid, "notification vanished before load");
                Lookup::NotFound
            }
            Lookup::IoError(err) => Lookup::IoError(err),
        }
    }

    /// Fully loads the notification at list position `row`.
    pub fn load_at(&self, row: usize) -> Lookup<Notification> {
        match self.keys.get(row) {
            Some(&uuid) => self.load(uuid),
            None => Lookup::NotFound,
        }
    }

    /// Registers an arrival handler on `router` and returns the uuids of
    /// notifications written from then on.
    #[must_use]
    pub fn subscribe(router: &EffectRouter) -> Receiver<Uuid> {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        router.register(
            DatabaseId::Notification,
            Arc::new(move |event: &RecordChanged| {
                if event.kind != ChangeKind::Written {
                    return;
                }
                let Ok(uuid) = Uuid::from_slice(&event.key) else {
                    return;
                };
                if tx.lock().send(uuid).is_err() {
                    trace!(%uuid, "arrival receiver gone, notification dropped");
                }
            }),
        );
        rx
    }
}
