use crate::domain::Event;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use uuid::Uuid;

/// Bundled dataset served in mock mode and by the mock-fallback path.
/// Dates are laid out relative to process start so the set always contains
/// upcoming entries; uuids are v5-derived from the slug so they are stable
/// across runs.
static MOCK_EVENTS: Lazy<Vec<Event>> = Lazy::new(build_mock_events);

pub fn mock_events() -> Vec<Event> {
    MOCK_EVENTS.clone()
}

fn build_mock_events() -> Vec<Event> {
    let base = Utc::now();
    vec![
        mock_event(
            1,
            "city-park-open-air",
            "Open Air in the City Park",
            "Free open-air concert by local bands.",
            0.0,
            base + Duration::days(1),
            vec![base + Duration::days(1), base + Duration::days(8)],
            "City Park",
            "concert",
            "rock",
        ),
        mock_event(
            2,
            "laugh-factory-night",
            "Laugh Factory Night",
            "An evening of stand-up with up-and-coming comedians.",
            400.0,
            base + Duration::days(2),
            vec![base + Duration::days(2)],
            "Laugh Factory Club",
            "stand_up",
            "comedy",
        ),
        mock_event(
            3,
            "modern-art-retrospective",
            "Modern Art Retrospective",
            "A century of modern art in one hall.",
            350.0,
            base + Duration::days(3),
            vec![],
            "Central Gallery",
            "exhibition",
            "modern art",
        ),
        mock_event(
            4,
            "three-sisters",
            "Three Sisters",
            "Chekhov classic on the main stage.",
            1200.0,
            base + Duration::days(5),
            vec![base + Duration::days(5), base + Duration::days(12)],
            "Drama Theater",
            "theater",
            "drama",
        ),
        mock_event(
            5,
            "midnight-premiere",
            "Midnight Premiere",
            "Late-night premiere screening.",
            600.0,
            base + Duration::days(4),
            vec![base + Duration::days(4)],
            "Cinema Hall 1",
            "cinema",
            "thriller",
        ),
        mock_event(
            6,
            "derby-final",
            "City Derby Final",
            "Season final between the city rivals.",
            2500.0,
            base + Duration::days(6),
            vec![base + Duration::days(6)],
            "Central Stadium",
            "sport",
            "football",
        ),
        mock_event(
            7,
            "old-town-walk",
            "Old Town Walking Tour",
            "Two-hour guided walk through the old town.",
            800.0,
            base + Duration::days(2),
            vec![base + Duration::days(2), base + Duration::days(9)],
            "Old Town Square",
            "excursion",
            "history",
        ),
        mock_event(
            8,
            "gala-illusion-show",
            "Gala Illusion Show",
            "Grand illusion show with international performers.",
            3500.0,
            base + Duration::days(10),
            vec![base + Duration::days(10)],
            "Grand Concert Hall",
            "show",
            "illusion",
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn mock_event(
    id: i64,
    slug: &str,
    title: &str,
    description: &str,
    price: f64,
    date_preview: DateTime<Utc>,
    date_list: Vec<DateTime<Utc>>,
    place: &str,
    event_type: &str,
    genre: &str,
) -> Event {
    Event {
        id,
        uuid: Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("mock:{}", slug).as_bytes()),
        source_id: Some(format!("mock-{}", slug)),
        title: title.to_string(),
        description: description.to_string(),
        price,
        date_preview,
        date_list,
        place: place.to_string(),
        event_type: event_type.to_string(),
        genre: genre.to_string(),
        age: None,
        image_url: format!("https://example.com/images/{}.jpg", slug),
        url: format!("https://example.com/events/{}", slug),
        created_at: Some(Utc::now()),
    }
}
