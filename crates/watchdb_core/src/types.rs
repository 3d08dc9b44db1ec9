//! Core type definitions.

use crate::error::CoreError;
use std::fmt;
use std::str::FromStr;

/// Identifier of one logical database inside the store.
///
/// The discriminants are the ids used on the wire and in the record log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DatabaseId {
    /// Scratch database used by host test suites.
    Test = 0x00,
    /// Calendar and timeline pins.
    Pin = 0x01,
    /// Installed applications.
    App = 0x02,
    /// Reminders.
    Reminder = 0x03,
    /// Notifications.
    Notification = 0x04,
    /// App glance slices.
    AppGlance = 0x0B,
}

impl DatabaseId {
    /// Every known database, in wire id order.
    pub const ALL: [Self; 6] = [
        Self::Test,
        Self::Pin,
        Self::App,
        Self::Reminder,
        Self::Notification,
        Self::AppGlance,
    ];

    /// Returns the wire id.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Looks up a database by wire id.
    #[must_use]
    pub const fn from_u8(id: u8) -> Option<Self> {
        match id {
            0x00 => Some(Self::Test),
            0x01 => Some(Self::Pin),
            0x02 => Some(Self::App),
            0x03 => Some(Self::Reminder),
            0x04 => Some(Self::Notification),
            0x0B => Some(Self::AppGlance),
            _ => None,
        }
    }

    /// Returns the lowercase name used by tools.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Pin => "pin",
            Self::App => "app",
            Self::Reminder => "reminder",
            Self::Notification => "notification",
            Self::AppGlance => "app-glance",
        }
    }
}

impl TryFrom<u8> for DatabaseId {
    type Error = CoreError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::from_u8(id).ok_or(CoreError::DatabaseNotFound { id })
    }
}

impl FromStr for DatabaseId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|db| db.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown database '{s}'"))
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_ids_round_trip() {
        for db in DatabaseId::ALL {
            assert_eq!(DatabaseId::from_u8(db.as_u8()), Some(db));
        }
        assert_eq!(DatabaseId::Notification.as_u8(), 0x04);
        assert_eq!(DatabaseId::AppGlance.as_u8(), 0x0B);
    }

    #[test]
    fn unknown_wire_id_is_not_found() {
        assert!(matches!(
            DatabaseId::try_from(0x42),
            Err(CoreError::DatabaseNotFound { id: 0x42 })
        ));
    }

    #[test]
    fn names_parse_back() {
        assert_eq!("Notification".parse::<DatabaseId>(), Ok(DatabaseId::Notification));
        assert_eq!("app-glance".parse::<DatabaseId>(), Ok(DatabaseId::AppGlance));
        assert!("weather".parse::<DatabaseId>().is_err());
    }
}
