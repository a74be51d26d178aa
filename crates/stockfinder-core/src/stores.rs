//! Store records and store identifiers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Coordinates, CoreError};

/// Marker carried by store references that point at a not-yet-finalized store.
pub const PROVISIONAL_PREFIX: &str = "virtual_";

/// Canonical store identifier, used for every join and lookup.
///
/// Deserializing strips the provisional marker, so a `StoreId` never carries it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StoreId(String);

impl StoreId {
    #[must_use]
    pub fn new(raw: &str) -> Self {
        StoreRef::parse(raw).into_id()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for StoreId {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<StoreId> for String {
    fn from(id: StoreId) -> Self {
        id.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A store reference as carried on an item.
///
/// Parsed once at ingestion; `Display` restores the original encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StoreRef {
    Canonical(StoreId),
    Provisional(StoreId),
}

impl StoreRef {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(PROVISIONAL_PREFIX) {
            Some(rest) => StoreRef::Provisional(StoreId(rest.to_string())),
            None => StoreRef::Canonical(StoreId(raw.to_string())),
        }
    }

    #[must_use]
    pub fn id(&self) -> &StoreId {
        match self {
            StoreRef::Canonical(id) | StoreRef::Provisional(id) => id,
        }
    }

    #[must_use]
    pub fn into_id(self) -> StoreId {
        match self {
            StoreRef::Canonical(id) | StoreRef::Provisional(id) => id,
        }
    }

    #[must_use]
    pub fn is_provisional(&self) -> bool {
        matches!(self, StoreRef::Provisional(_))
    }
}

impl From<String> for StoreRef {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<StoreRef> for String {
    fn from(store: StoreRef) -> Self {
        store.to_string()
    }
}

impl fmt::Display for StoreRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreRef::Canonical(id) => write!(f, "{id}"),
            StoreRef::Provisional(id) => write!(f, "{PROVISIONAL_PREFIX}{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Pending,
    Approved,
    Rejected,
}

impl StoreStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StoreStatus::Pending => "pending",
            StoreStatus::Approved => "approved",
            StoreStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(StoreStatus::Pending),
            "approved" => Ok(StoreStatus::Approved),
            "rejected" => Ok(StoreStatus::Rejected),
            other => Err(CoreError::UnknownStoreStatus(other.to_string())),
        }
    }
}

/// A store request record as held by the store directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: StoreId,
    pub name: String,
    pub address: String,
    /// Raw latitude. Non-numeric values in the source document deserialize to `None`.
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub longitude: Option<f64>,
    pub owner_id: String,
    pub status: StoreStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoreRecord {
    /// The store's location, if it has a usable one.
    ///
    /// Missing, non-finite, out-of-range, and `(0, 0)` pairs all count as
    /// "no coordinate".
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        let (latitude, longitude) = (self.latitude?, self.longitude?);
        if latitude == 0.0 && longitude == 0.0 {
            return None;
        }
        Coordinates::new(latitude, longitude).ok()
    }

    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.status == StoreStatus::Approved
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoordinate {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawCoordinate>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawCoordinate::Number(value)) => Some(value),
        Some(RawCoordinate::Text(text)) => text.trim().parse::<f64>().ok(),
        Some(RawCoordinate::Other(_)) | None => None,
    })
}
