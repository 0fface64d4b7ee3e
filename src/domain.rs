use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A single catalog event, as served by the upstream catalog or injected
/// through the local API. `uuid` is the identity key for every merge,
/// lookup and dedup operation; `id` is a source-assigned row number and is
/// never used for identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub id: i64,
    pub uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    pub date_preview: DateTime<Utc>,
    /// All scheduled occurrences. May be empty, in which case
    /// `date_preview` is the sole occurrence.
    #[serde(default)]
    pub date_list: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub place: String,
    /// Kept as the raw upstream string: unknown categories pass through
    /// untouched, they just never match a typed category query.
    pub event_type: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Every occurrence to consider for date filtering, falling back to the
    /// preview date when no explicit list was provided.
    pub fn occurrence_dates(&self) -> Vec<DateTime<Utc>> {
        if self.date_list.is_empty() {
            vec![self.date_preview]
        } else {
            self.date_list.clone()
        }
    }

    pub fn matches_type(&self, event_type: EventType) -> bool {
        self.event_type == event_type.as_str()
    }
}

/// Partial update payload for the local override store. Only supplied
/// fields are written; `uuid` is deliberately absent — identity is
/// immutable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    pub id: Option<i64>,
    pub source_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub date_preview: Option<DateTime<Utc>>,
    pub date_list: Option<Vec<DateTime<Utc>>>,
    pub place: Option<String>,
    pub event_type: Option<String>,
    pub genre: Option<String>,
    pub age: Option<String>,
    pub image_url: Option<String>,
    pub url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl EventPatch {
    /// Shallow-merge the supplied fields over `event`, leaving its uuid
    /// untouched.
    pub fn apply(self, event: &mut Event) {
        if let Some(id) = self.id {
            event.id = id;
        }
        if let Some(source_id) = self.source_id {
            event.source_id = Some(source_id);
        }
        if let Some(title) = self.title {
            event.title = title;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(price) = self.price {
            event.price = price;
        }
        if let Some(date_preview) = self.date_preview {
            event.date_preview = date_preview;
        }
        if let Some(date_list) = self.date_list {
            event.date_list = date_list;
        }
        if let Some(place) = self.place {
            event.place = place;
        }
        if let Some(event_type) = self.event_type {
            event.event_type = event_type;
        }
        if let Some(genre) = self.genre {
            event.genre = genre;
        }
        if let Some(age) = self.age {
            event.age = Some(age);
        }
        if let Some(image_url) = self.image_url {
            event.image_url = image_url;
        }
        if let Some(url) = self.url {
            event.url = url;
        }
        if let Some(created_at) = self.created_at {
            event.created_at = Some(created_at);
        }
    }
}

/// The fixed category set the catalog understands. Queries scoped to a
/// category go through this enum, so upstream records carrying an unknown
/// `event_type` string can never match a scoped query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Concert,
    StandUp,
    Exhibition,
    Theater,
    Cinema,
    Sport,
    Excursion,
    Show,
    Quest,
    MasterClass,
}

impl EventType {
    pub const ALL: [EventType; 10] = [
        EventType::Concert,
        EventType::StandUp,
        EventType::Exhibition,
        EventType::Theater,
        EventType::Cinema,
        EventType::Sport,
        EventType::Excursion,
        EventType::Show,
        EventType::Quest,
        EventType::MasterClass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Concert => "concert",
            EventType::StandUp => "stand_up",
            EventType::Exhibition => "exhibition",
            EventType::Theater => "theater",
            EventType::Cinema => "cinema",
            EventType::Sport => "sport",
            EventType::Excursion => "excursion",
            EventType::Show => "show",
            EventType::Quest => "quest",
            EventType::MasterClass => "master_class",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventType(pub String);

impl fmt::Display for UnknownEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type: {}", self.0)
    }
}

impl std::error::Error for UnknownEventType {}
