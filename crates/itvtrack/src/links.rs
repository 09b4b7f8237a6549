//! Outbound links: calendar export and placeholder vehicle images.
//!
//! Nothing here performs network I/O; the links are handed to whatever opens
//! URLs on the caller's side.

use chrono::{Days, NaiveDate};
use url::Url;

use crate::config::{CalendarConfig, ImageConfig};
use crate::error::Result;
use crate::record::{InspectionRecord, DATE_FORMAT};

/// Compact date format used in calendar event ranges.
const CALENDAR_DATE_FORMAT: &str = "%Y%m%d";

/// Builds calendar event links for upcoming ITVs.
#[derive(Debug, Clone)]
pub struct CalendarLinks {
    base: Url,
    location: String,
}

impl CalendarLinks {
    /// Create a link builder from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL cannot be parsed.
    pub fn new(config: &CalendarConfig) -> Result<Self> {
        Ok(Self {
            base: Url::parse(&config.base_url)?,
            location: config.event_location.clone(),
        })
    }

    /// Build an all-day event on the record's next ITV due date.
    ///
    /// Returns `None` if the record has no ITV date.
    #[must_use]
    pub fn link_for(&self, record: &InspectionRecord) -> Option<Url> {
        let due = record.next_due_date()?;
        let last = record.itv_date?;
        let end = due.checked_add_days(Days::new(1))?;

        let title = format!(
            "Next ITV: {} ({})",
            record.display_name(),
            record.vehicle_license
        );
        let details = format!(
            "Last ITV: {}. Notes: {}",
            last.format(DATE_FORMAT),
            record.notes.as_deref().unwrap_or("None")
        );

        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("action", "TEMPLATE")
            .append_pair("text", &title)
            .append_pair("details", &details)
            .append_pair("location", &self.location)
            .append_pair("dates", &event_range(due, end));
        Some(url)
    }
}

fn event_range(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{}/{}",
        start.format(CALENDAR_DATE_FORMAT),
        end.format(CALENDAR_DATE_FORMAT)
    )
}

/// Builds placeholder image links labelled with the vehicle model.
#[derive(Debug, Clone)]
pub struct ImageLinks {
    base: Url,
    fallback_text: String,
}

impl ImageLinks {
    /// Create a link builder from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL and size/colour path do not
    /// form a valid URL.
    pub fn new(config: &ImageConfig) -> Result<Self> {
        let mut root = Url::parse(&config.base_url)?;
        // Keep any base path segment when joining the size/colour path
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        let base = root.join(&format!(
            "{}x{}/{}/{}",
            config.width, config.height, config.background, config.foreground
        ))?;
        Ok(Self {
            base,
            fallback_text: config.fallback_text.clone(),
        })
    }

    /// Image URL for a vehicle model; blank models get the fallback text.
    #[must_use]
    pub fn url_for(&self, vehicle_model: &str) -> Url {
        let text = match vehicle_model.trim() {
            "" => self.fallback_text.as_str(),
            model => model,
        };
        let mut url = self.base.clone();
        url.query_pairs_mut().append_pair("text", text);
        url
    }
}
