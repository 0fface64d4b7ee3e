use crate::domain::Event;
use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

/// Date buckets, computed against the start of the current calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    Today,
    Tomorrow,
    Week,
    Month,
}

/// Price buckets. Contiguous and non-overlapping; boundary values belong
/// to the lower bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceFilter {
    Free,
    Cheap,
    Medium,
    Expensive,
    Luxury,
}

/// Events whose preview date is at or after now, sorted ascending by
/// preview date.
pub fn upcoming_events(events: Vec<Event>) -> Vec<Event> {
    upcoming_events_at(events, Utc::now())
}

pub fn upcoming_events_at(events: Vec<Event>, now: DateTime<Utc>) -> Vec<Event> {
    let mut upcoming: Vec<Event> = events
        .into_iter()
        .filter(|e| e.date_preview >= now)
        .collect();
    upcoming.sort_by_key(|e| e.date_preview);
    upcoming
}

/// Keeps an event when any of its occurrences falls in the bucket — an OR
/// over `date_list` (or the preview date when the list is empty).
pub fn filter_by_date(events: Vec<Event>, filter: DateFilter) -> Vec<Event> {
    filter_by_date_at(events, filter, Utc::now())
}

pub fn filter_by_date_at(events: Vec<Event>, filter: DateFilter, now: DateTime<Utc>) -> Vec<Event> {
    let today = now.date_naive();
    events
        .into_iter()
        .filter(|event| {
            event
                .occurrence_dates()
                .iter()
                .any(|occurrence| date_matches(occurrence.date_naive(), today, filter))
        })
        .collect()
}

fn date_matches(day: NaiveDate, today: NaiveDate, filter: DateFilter) -> bool {
    match filter {
        DateFilter::Today => day == today,
        DateFilter::Tomorrow => Some(day) == today.checked_add_days(Days::new(1)),
        DateFilter::Week => match today.checked_add_days(Days::new(7)) {
            Some(week_later) => day >= today && day <= week_later,
            None => false,
        },
        DateFilter::Month => match today.checked_add_months(Months::new(1)) {
            Some(month_later) => day >= today && day <= month_later,
            None => false,
        },
    }
}

pub fn filter_by_price(events: Vec<Event>, filter: PriceFilter) -> Vec<Event> {
    events
        .into_iter()
        .filter(|event| price_matches(event.price, filter))
        .collect()
}

fn price_matches(price: f64, filter: PriceFilter) -> bool {
    match filter {
        PriceFilter::Free => price == 0.0,
        PriceFilter::Cheap => price > 0.0 && price <= 500.0,
        PriceFilter::Medium => price > 500.0 && price <= 1500.0,
        PriceFilter::Expensive => price > 1500.0 && price <= 3000.0,
        PriceFilter::Luxury => price > 3000.0,
    }
}

impl DateFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateFilter::Today => "today",
            DateFilter::Tomorrow => "tomorrow",
            DateFilter::Week => "week",
            DateFilter::Month => "month",
        }
    }
}

impl FromStr for DateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(DateFilter::Today),
            "tomorrow" => Ok(DateFilter::Tomorrow),
            "week" => Ok(DateFilter::Week),
            "month" => Ok(DateFilter::Month),
            other => Err(format!("unknown date filter: {}", other)),
        }
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PriceFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceFilter::Free => "free",
            PriceFilter::Cheap => "cheap",
            PriceFilter::Medium => "medium",
            PriceFilter::Expensive => "expensive",
            PriceFilter::Luxury => "luxury",
        }
    }
}

impl FromStr for PriceFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(PriceFilter::Free),
            "cheap" => Ok(PriceFilter::Cheap),
            "medium" => Ok(PriceFilter::Medium),
            "expensive" => Ok(PriceFilter::Expensive),
            "luxury" => Ok(PriceFilter::Luxury),
            other => Err(format!("unknown price filter: {}", other)),
        }
    }
}

impl fmt::Display for PriceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
