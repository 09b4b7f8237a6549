//! Inspection record types.
//!
//! This module defines the record schema shared by every persistence flavour,
//! the raw form used to create and edit records, and the date rules that
//! derive the next ITV due date and the vehicle age.

use std::fmt;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Calendar date format used for every stored and entered date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Earliest registration year accepted from a form.
pub const MIN_REGISTRATION_YEAR: i32 = 1900;

/// Opaque identifier of an inspection record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A vehicle and its inspection history.
///
/// Serialized with camelCase keys; absent optional fields are omitted.
/// Deserialization is lenient about the shapes older data used (empty strings
/// for missing dates, years stored as text) but [`InspectionRecord::from_stored_value`]
/// still rejects records that break the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecord {
    /// Unique identifier within the collection.
    pub id: RecordId,

    /// Manufacturer, e.g. "Seat".
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_text"
    )]
    pub vehicle_brand: Option<String>,

    /// Model name, e.g. "Ibiza". Never empty.
    pub vehicle_model: String,

    /// Year of first registration.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_year"
    )]
    pub registration_year: Option<i32>,

    /// License plate. Never empty.
    pub vehicle_license: String,

    /// Date of the most recent workshop inspection.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_date"
    )]
    pub inspection_date: Option<NaiveDate>,

    /// Date of the last passed ITV.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_date"
    )]
    pub itv_date: Option<NaiveDate>,

    /// Free-form notes.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_text"
    )]
    pub notes: Option<String>,
}

impl InspectionRecord {
    /// Decode a record from untrusted stored JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the value does not match the record shape and
    /// [`Error::InvalidRecord`] if a required field is empty.
    pub fn from_stored_value(value: serde_json::Value) -> Result<Self> {
        let record: Self = serde_json::from_value(value)?;
        record.validate()?;
        Ok(record)
    }

    /// Decode a record from a document body keyed by `id`.
    ///
    /// Any `id` field inside the body is ignored; the document key wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not an object or fails validation.
    pub fn from_document(id: &RecordId, data: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(mut fields) = data else {
            return Err(Error::invalid_record(format!(
                "document '{id}' is not an object"
            )));
        };
        fields.insert(
            "id".to_string(),
            serde_json::Value::String(id.as_str().to_string()),
        );
        Self::from_stored_value(serde_json::Value::Object(fields))
    }

    /// Encode this record as a document body (everything except the id).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_document(&self) -> Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        if let serde_json::Value::Object(fields) = &mut value {
            fields.remove("id");
        }
        Ok(value)
    }

    /// Check the schema invariants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecord`] if the id, model or license is empty.
    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(Error::invalid_record("record id is empty"));
        }
        if self.vehicle_model.trim().is_empty() {
            return Err(Error::invalid_record("vehicle model is required"));
        }
        if self.vehicle_license.trim().is_empty() {
            return Err(Error::invalid_record("vehicle license is required"));
        }
        Ok(())
    }

    /// The date the next ITV is due, if the last one is known.
    #[must_use]
    pub fn next_due_date(&self) -> Option<NaiveDate> {
        next_due_date(self.itv_date)
    }

    /// Age of the vehicle in whole calendar years, as of today.
    #[must_use]
    pub fn vehicle_age(&self) -> Option<u32> {
        vehicle_age(self.registration_year)
    }

    /// Brand and model joined for display, e.g. "Seat Ibiza".
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.vehicle_brand {
            Some(brand) => format!("{brand} {}", self.vehicle_model),
            None => self.vehicle_model.clone(),
        }
    }
}

/// Compute the next ITV due date: one calendar year after the last one.
///
/// Month and day are kept. A 29 February that has no counterpart in the
/// following year rolls over to 1 March.
#[must_use]
pub fn next_due_date(itv_date: Option<NaiveDate>) -> Option<NaiveDate> {
    let date = itv_date?;
    let year = date.year() + 1;
    date.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
}

/// Vehicle age in the current local calendar year.
#[must_use]
pub fn vehicle_age(registration_year: Option<i32>) -> Option<u32> {
    vehicle_age_in(registration_year, Local::now().year())
}

/// Vehicle age relative to `current_year`.
///
/// Returns `None` when the year is missing or lies in the future.
#[must_use]
pub fn vehicle_age_in(registration_year: Option<i32>, current_year: i32) -> Option<u32> {
    let year = registration_year?;
    u32::try_from(current_year.checked_sub(year)?).ok()
}

/// Parse a registration year typed as text; non-numeric input is `None`.
#[must_use]
pub fn parse_year(text: &str) -> Option<i32> {
    text.trim().parse().ok()
}

/// Parse an optional `YYYY-MM-DD` date; blank input is `None`.
///
/// # Errors
///
/// Returns [`Error::InvalidDate`] for non-blank input that is not a date.
pub fn parse_date(field: &'static str, text: &str) -> Result<Option<NaiveDate>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map(Some)
        .map_err(|_| Error::InvalidDate {
            field,
            value: text.to_string(),
        })
}

/// Raw form fields, as typed by the user.
///
/// Every field is text; conversion into an [`InspectionRecord`] trims, parses
/// and validates them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectionForm {
    /// Manufacturer.
    pub vehicle_brand: String,
    /// Model (required).
    pub vehicle_model: String,
    /// Registration year.
    pub registration_year: String,
    /// License plate (required).
    pub vehicle_license: String,
    /// Inspection date, `YYYY-MM-DD`.
    pub inspection_date: String,
    /// Last ITV date, `YYYY-MM-DD`.
    pub itv_date: String,
    /// Notes.
    pub notes: String,
}

impl InspectionForm {
    /// Create a form with just the required fields filled in.
    #[must_use]
    pub fn new(vehicle_model: impl Into<String>, vehicle_license: impl Into<String>) -> Self {
        Self {
            vehicle_model: vehicle_model.into(),
            vehicle_license: vehicle_license.into(),
            ..Self::default()
        }
    }

    /// Pre-fill a form from an existing record, for editing.
    #[must_use]
    pub fn from_record(record: &InspectionRecord) -> Self {
        let date_text = |date: Option<NaiveDate>| {
            date.map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default()
        };
        Self {
            vehicle_brand: record.vehicle_brand.clone().unwrap_or_default(),
            vehicle_model: record.vehicle_model.clone(),
            registration_year: record
                .registration_year
                .map(|y| y.to_string())
                .unwrap_or_default(),
            vehicle_license: record.vehicle_license.clone(),
            inspection_date: date_text(record.inspection_date),
            itv_date: date_text(record.itv_date),
            notes: record.notes.clone().unwrap_or_default(),
        }
    }

    /// Whether both required fields are filled in.
    #[must_use]
    pub fn is_submittable(&self) -> bool {
        !self.vehicle_model.trim().is_empty() && !self.vehicle_license.trim().is_empty()
    }

    /// Convert the form into a record with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecord`] if a required field is empty or the
    /// registration year is not plausible, and [`Error::InvalidDate`] if a date
    /// cannot be parsed.
    pub fn to_record(&self, id: RecordId) -> Result<InspectionRecord> {
        self.to_record_in(id, Local::now().year())
    }

    /// Like [`InspectionForm::to_record`], validating the year against `current_year`.
    ///
    /// # Errors
    ///
    /// See [`InspectionForm::to_record`].
    pub fn to_record_in(&self, id: RecordId, current_year: i32) -> Result<InspectionRecord> {
        let vehicle_model = self.vehicle_model.trim();
        let vehicle_license = self.vehicle_license.trim();
        if vehicle_model.is_empty() {
            return Err(Error::invalid_record("vehicle model is required"));
        }
        if vehicle_license.is_empty() {
            return Err(Error::invalid_record("vehicle license is required"));
        }

        let registration_year = match self.registration_year.trim() {
            "" => None,
            text => {
                let year = parse_year(text).ok_or_else(|| {
                    Error::invalid_record(format!("registration year '{text}' is not a number"))
                })?;
                if !(MIN_REGISTRATION_YEAR..=current_year + 1).contains(&year) {
                    return Err(Error::invalid_record(format!(
                        "registration year {year} is outside {MIN_REGISTRATION_YEAR}..={}",
                        current_year + 1
                    )));
                }
                Some(year)
            }
        };

        let non_blank = |text: &str| {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        };

        let record = InspectionRecord {
            id,
            vehicle_brand: non_blank(&self.vehicle_brand),
            vehicle_model: vehicle_model.to_string(),
            registration_year,
            vehicle_license: vehicle_license.to_string(),
            inspection_date: parse_date("inspection_date", &self.inspection_date)?,
            itv_date: parse_date("itv_date", &self.itv_date)?,
            notes: non_blank(&self.notes),
        };
        record.validate()?;
        Ok(record)
    }
}

/// Deserializers that accept the loose shapes found in stored data.
mod lenient {
    use chrono::NaiveDate;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    use super::{parse_year, DATE_FORMAT};

    pub(super) fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        Ok(value.filter(|text| !text.trim().is_empty()))
    }

    pub(super) fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        match value.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => NaiveDate::parse_from_str(text, DATE_FORMAT)
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid date '{text}': {e}"))),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Year {
        Integer(i64),
        Float(f64),
        Text(String),
    }

    /// Whole part of a float year, if it fits an `i32`.
    #[allow(clippy::cast_possible_truncation)]
    fn whole_year(n: f64) -> Option<i32> {
        let whole = n.trunc();
        (whole.is_finite() && (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&whole))
            .then_some(whole as i32)
    }

    pub(super) fn optional_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<Year> = Option::deserialize(deserializer)?;
        Ok(match value {
            None => None,
            Some(Year::Integer(n)) => i32::try_from(n).ok(),
            Some(Year::Float(n)) => whole_year(n),
            Some(Year::Text(text)) => parse_year(&text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, DATE_FORMAT).unwrap()
    }

    fn create_test_record() -> InspectionRecord {
        InspectionForm {
            vehicle_brand: "Seat".to_string(),
            registration_year: "2018".to_string(),
            itv_date: "2024-01-10".to_string(),
            notes: "Cambio de aceite".to_string(),
            ..InspectionForm::new("Ibiza", "1234ABC")
        }
        .to_record_in(RecordId::from("rec-1"), 2024)
        .unwrap()
    }

    #[test]
    fn test_next_due_date_adds_one_year() {
        assert_eq!(
            next_due_date(Some(date("2024-03-01"))),
            Some(date("2025-03-01"))
        );
        assert_eq!(
            next_due_date(Some(date("2023-12-31"))),
            Some(date("2024-12-31"))
        );
    }

    #[test]
    fn test_next_due_date_leap_day_rolls_over() {
        assert_eq!(
            next_due_date(Some(date("2024-02-29"))),
            Some(date("2025-03-01"))
        );
    }

    #[test]
    fn test_next_due_date_none() {
        assert_eq!(next_due_date(None), None);
    }

    #[test]
    fn test_vehicle_age() {
        assert_eq!(vehicle_age_in(Some(2020), 2024), Some(4));
        assert_eq!(vehicle_age_in(Some(2024), 2024), Some(0));
        assert_eq!(vehicle_age_in(None, 2024), None);
        assert_eq!(vehicle_age_in(Some(3000), 2024), None);
        assert_eq!(vehicle_age_in(parse_year("abc"), 2024), None);
    }

    #[test]
    fn test_vehicle_age_current_year() {
        let this_year = Local::now().year();
        assert_eq!(vehicle_age(Some(this_year - 4)), Some(4));
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year(" 2019 "), Some(2019));
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("twenty"), None);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("itv_date", "").unwrap(), None);
        assert_eq!(
            parse_date("itv_date", " 2024-01-10 ").unwrap(),
            Some(date("2024-01-10"))
        );
        let err = parse_date("itv_date", "10/01/2024").unwrap_err();
        assert!(matches!(err, Error::InvalidDate { field: "itv_date", .. }));
    }

    #[test]
    fn test_form_to_record() {
        let record = create_test_record();

        assert_eq!(record.id.as_str(), "rec-1");
        assert_eq!(record.vehicle_brand.as_deref(), Some("Seat"));
        assert_eq!(record.vehicle_model, "Ibiza");
        assert_eq!(record.registration_year, Some(2018));
        assert_eq!(record.itv_date, Some(date("2024-01-10")));
        assert_eq!(record.inspection_date, None);
        assert_eq!(record.next_due_date(), Some(date("2025-01-10")));
        assert_eq!(record.display_name(), "Seat Ibiza");
    }

    #[test]
    fn test_form_requires_model_and_license() {
        let id = RecordId::from("x");

        let err = InspectionForm::new("", "1234ABC")
            .to_record_in(id.clone(), 2024)
            .unwrap_err();
        assert!(err.to_string().contains("model"));

        let err = InspectionForm::new("Ibiza", "   ")
            .to_record_in(id, 2024)
            .unwrap_err();
        assert!(err.to_string().contains("license"));

        assert!(!InspectionForm::default().is_submittable());
        assert!(InspectionForm::new("Ibiza", "1234ABC").is_submittable());
    }

    #[test]
    fn test_form_rejects_implausible_year() {
        let form = InspectionForm {
            registration_year: "3000".to_string(),
            ..InspectionForm::new("Ibiza", "1234ABC")
        };
        assert!(form.to_record_in(RecordId::from("x"), 2024).is_err());

        let form = InspectionForm {
            registration_year: "old".to_string(),
            ..InspectionForm::new("Ibiza", "1234ABC")
        };
        assert!(form.to_record_in(RecordId::from("x"), 2024).is_err());
    }

    #[test]
    fn test_form_from_record_round_trips() {
        let record = create_test_record();
        let form = InspectionForm::from_record(&record);

        assert_eq!(form.itv_date, "2024-01-10");
        assert_eq!(form.registration_year, "2018");
        assert_eq!(form.inspection_date, "");
        assert_eq!(form.to_record_in(record.id.clone(), 2024).unwrap(), record);
    }

    #[test]
    fn test_serialize_uses_camel_case_and_skips_absent() {
        let record = InspectionForm::new("Ibiza", "1234ABC")
            .to_record_in(RecordId::from("rec-2"), 2024)
            .unwrap();
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(
            json,
            json!({"id": "rec-2", "vehicleModel": "Ibiza", "vehicleLicense": "1234ABC"})
        );
    }

    #[test]
    fn test_from_stored_value_is_lenient_about_legacy_shapes() {
        let record = InspectionRecord::from_stored_value(json!({
            "id": "legacy",
            "vehicleBrand": "",
            "vehicleModel": "Corsa",
            "registrationYear": "2015",
            "vehicleLicense": "9876XYZ",
            "inspectionDate": "",
            "itvDate": "2023-06-15",
            "notes": ""
        }))
        .unwrap();

        assert_eq!(record.vehicle_brand, None);
        assert_eq!(record.registration_year, Some(2015));
        assert_eq!(record.inspection_date, None);
        assert_eq!(record.itv_date, Some(date("2023-06-15")));
        assert_eq!(record.notes, None);
    }

    #[test]
    fn test_from_stored_value_numeric_and_garbage_year() {
        let numeric = InspectionRecord::from_stored_value(json!({
            "id": "a", "vehicleModel": "Corsa", "vehicleLicense": "1", "registrationYear": 2011
        }))
        .unwrap();
        assert_eq!(numeric.registration_year, Some(2011));

        let float = InspectionRecord::from_stored_value(json!({
            "id": "f", "vehicleModel": "Corsa", "vehicleLicense": "1", "registrationYear": 2015.0
        }))
        .unwrap();
        assert_eq!(float.registration_year, Some(2015));

        let fractional = InspectionRecord::from_stored_value(json!({
            "id": "g", "vehicleModel": "Corsa", "vehicleLicense": "1", "registrationYear": 2015.7
        }))
        .unwrap();
        assert_eq!(fractional.registration_year, Some(2015));

        let garbage = InspectionRecord::from_stored_value(json!({
            "id": "b", "vehicleModel": "Corsa", "vehicleLicense": "1", "registrationYear": "n/a"
        }))
        .unwrap();
        assert_eq!(garbage.registration_year, None);
    }

    #[test]
    fn test_from_stored_value_rejects_bad_records() {
        let missing_license = json!({"id": "a", "vehicleModel": "Corsa"});
        assert!(InspectionRecord::from_stored_value(missing_license).is_err());

        let empty_model = json!({"id": "a", "vehicleModel": "", "vehicleLicense": "1"});
        assert!(matches!(
            InspectionRecord::from_stored_value(empty_model),
            Err(Error::InvalidRecord { .. })
        ));

        let bad_date = json!({
            "id": "a", "vehicleModel": "Corsa", "vehicleLicense": "1", "itvDate": "yesterday"
        });
        assert!(matches!(
            InspectionRecord::from_stored_value(bad_date),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_document_round_trip_keeps_key_as_id() {
        let record = create_test_record();
        let doc = record.to_document().unwrap();
        assert!(doc.get("id").is_none());

        let decoded = InspectionRecord::from_document(&record.id, doc).unwrap();
        assert_eq!(decoded, record);

        let other = RecordId::from("other");
        let mut doc = record.to_document().unwrap();
        doc["id"] = json!("spoofed");
        assert_eq!(
            InspectionRecord::from_document(&other, doc).unwrap().id,
            other
        );
    }

    #[test]
    fn test_from_document_rejects_non_object() {
        let err = InspectionRecord::from_document(&RecordId::from("a"), json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { .. }));
    }

    #[test]
    fn test_record_id_generate_is_unique() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }
}
