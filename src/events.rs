//! Known severe winter events
//!
//! Requests between the endpoints of a catalogued event are assessed against the
//! archived weather of that event instead of current conditions.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{BoundingBox, Coordinate, HistoricalWindow};

/// Free-text place matcher
#[derive(Debug, Clone)]
struct Place {
    name: &'static str,
    keyword: &'static str,
    qualifier: Option<&'static str>,
}

impl Place {
    const fn new(name: &'static str, keyword: &'static str) -> Self {
        Self {
            name,
            keyword,
            qualifier: None,
        }
    }

    const fn qualified(name: &'static str, keyword: &'static str, qualifier: &'static str) -> Self {
        Self {
            name,
            keyword,
            qualifier: Some(qualifier),
        }
    }

    fn matches(&self, text: &str) -> bool {
        let text = text.trim().to_lowercase();
        text.contains(self.keyword) && self.qualifier.is_none_or(|q| text.contains(q))
    }
}

#[derive(Debug, Clone)]
pub struct WinterEvent {
    region: &'static str,
    name: &'static str,
    date: NaiveDate,
    from: Place,
    to: Place,
    bounds: BoundingBox,
}

/// Event reference attached to a route response
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventNote {
    pub date: String,
    pub description: String,
}

/// Catalog entry as listed by the demo endpoint
#[derive(Debug, Clone, Serialize)]
pub struct EventListing {
    pub origin: String,
    pub destination: String,
    pub date: String,
    pub event: String,
    pub description: String,
}

impl WinterEvent {
    #[must_use]
    pub fn region(&self) -> &str {
        self.region
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.name
    }

    /// Event day formatted like "January 15, 2024"
    #[must_use]
    pub fn display_date(&self) -> String {
        self.date.format("%B %-d, %Y").to_string()
    }

    /// Archive window: the event day and one day either side
    #[must_use]
    pub fn window(&self) -> HistoricalWindow {
        HistoricalWindow {
            region: self.region.to_string(),
            start: self.date.pred_opt().unwrap_or(self.date),
            end: self.date.succ_opt().unwrap_or(self.date),
            bounds: self.bounds,
        }
    }

    /// Whether a request between `origin` and `destination` covers this event, in either direction
    #[must_use]
    pub fn matches(&self, origin: &str, destination: &str) -> bool {
        (self.from.matches(origin) && self.to.matches(destination))
            || (self.to.matches(origin) && self.from.matches(destination))
    }

    #[must_use]
    pub fn note(&self) -> EventNote {
        EventNote {
            date: self.display_date(),
            description: self.name.to_string(),
        }
    }

    #[must_use]
    pub fn listing(&self) -> EventListing {
        EventListing {
            origin: self.from.name.to_string(),
            destination: self.to.name.to_string(),
            date: self.display_date(),
            event: self.name.to_string(),
            description: format!("Experience {} conditions", self.name),
        }
    }
}

pub struct WinterEventCatalog {
    events: Vec<WinterEvent>,
}

impl Default for WinterEventCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WinterEventCatalog {
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            events: vec![
                WinterEvent {
                    region: "minneapolis-duluth",
                    name: "Severe Midwest Ice Storm",
                    date: day(2024, 1, 15),
                    from: Place::new("Minneapolis, MN", "minneapolis"),
                    to: Place::new("Duluth, MN", "duluth"),
                    bounds: BoundingBox::new(
                        Coordinate::new(44.7, -93.6),
                        Coordinate::new(47.0, -91.8),
                    ),
                },
                WinterEvent {
                    region: "buffalo-rochester",
                    name: "Lake Effect Blizzard",
                    date: day(2024, 2, 8),
                    from: Place::new("Buffalo, NY", "buffalo"),
                    to: Place::qualified("Rochester, NY", "rochester", "ny"),
                    bounds: BoundingBox::new(
                        Coordinate::new(42.6, -79.2),
                        Coordinate::new(43.4, -77.3),
                    ),
                },
                WinterEvent {
                    region: "detroit-grand-rapids",
                    name: "Michigan Winter Storm",
                    date: day(2024, 12, 22),
                    from: Place::new("Detroit, MI", "detroit"),
                    to: Place::new("Grand Rapids, MI", "grand rapids"),
                    bounds: BoundingBox::new(
                        Coordinate::new(42.1, -86.0),
                        Coordinate::new(43.2, -82.8),
                    ),
                },
            ],
        }
    }

    #[must_use]
    pub fn events(&self) -> &[WinterEvent] {
        &self.events
    }

    /// First event whose endpoints match the request
    #[must_use]
    pub fn find(&self, origin: &str, destination: &str) -> Option<&WinterEvent> {
        self.events.iter().find(|event| event.matches(origin, destination))
    }
}

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
