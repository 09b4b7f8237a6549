//! The in-memory inspection collection.
//!
//! [`Inspections`] is an immutable value: every mutation returns a new
//! collection and leaves `self` untouched, so the trackers can decide when to
//! swap it in and when to persist it.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::record::{InspectionForm, InspectionRecord, RecordId};

/// An ordered collection of inspection records with unique identifiers.
///
/// Order is display order: new records are prepended, edits keep their slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inspections {
    records: Vec<InspectionRecord>,
}

impl Inspections {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from loaded records.
    ///
    /// Later records whose identifier was already seen are dropped with a
    /// warning.
    #[must_use]
    pub fn replace_all(records: impl IntoIterator<Item = InspectionRecord>) -> Self {
        let mut seen = HashSet::new();
        let records = records
            .into_iter()
            .filter(|record| {
                let fresh = seen.insert(record.id.clone());
                if !fresh {
                    warn!("Dropping duplicate inspection record {}", record.id);
                }
                fresh
            })
            .collect();
        Self { records }
    }

    /// Add or update a record from a submitted form.
    ///
    /// Without `editing_id` a record with a fresh identifier is prepended.
    /// With `editing_id` the matching record is replaced in place and keeps its
    /// identifier. Returns the new collection and the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecord`] or [`Error::InvalidDate`] if the form
    /// does not validate, and [`Error::RecordNotFound`] if `editing_id` does not
    /// match any record. The collection is never changed on error.
    pub fn upsert(
        &self,
        form: &InspectionForm,
        editing_id: Option<&RecordId>,
    ) -> Result<(Self, InspectionRecord)> {
        if !form.is_submittable() {
            return Err(Error::invalid_record(
                "vehicle model and license are required",
            ));
        }

        let mut records = self.records.clone();
        let record = match editing_id {
            Some(id) => {
                let slot = records
                    .iter_mut()
                    .find(|record| &record.id == id)
                    .ok_or_else(|| Error::record_not_found(id.as_str()))?;
                let record = form.to_record(id.clone())?;
                *slot = record.clone();
                debug!("Updated inspection record {}", id);
                record
            }
            None => {
                let record = form.to_record(self.fresh_id())?;
                records.insert(0, record.clone());
                debug!("Added inspection record {}", record.id);
                record
            }
        };

        Ok((Self { records }, record))
    }

    /// Remove the record with the given identifier.
    ///
    /// Removing an unknown identifier returns an identical collection.
    #[must_use]
    pub fn remove(&self, id: &RecordId) -> Self {
        let records = self
            .records
            .iter()
            .filter(|record| &record.id != id)
            .cloned()
            .collect();
        Self { records }
    }

    /// Records with a known next due date, soonest first.
    ///
    /// Records without an ITV date, or whose due date is not representable,
    /// are left out. Ties keep display order.
    #[must_use]
    pub fn upcoming(&self) -> Vec<&InspectionRecord> {
        let mut upcoming: Vec<_> = self
            .records
            .iter()
            .filter_map(|record| record.next_due_date().map(|due| (due, record)))
            .collect();
        // Stable: equal due dates keep display order
        upcoming.sort_by_key(|(due, _)| *due);
        upcoming.into_iter().map(|(_, record)| record).collect()
    }

    /// Look up a record by identifier.
    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<&InspectionRecord> {
        self.records.iter().find(|record| &record.id == id)
    }

    /// Check whether a record with the identifier exists.
    #[must_use]
    pub fn contains(&self, id: &RecordId) -> bool {
        self.get(id).is_some()
    }

    /// All records in display order.
    #[must_use]
    pub fn records(&self) -> &[InspectionRecord] {
        &self.records
    }

    /// Iterate over records in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, InspectionRecord> {
        self.records.iter()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn fresh_id(&self) -> RecordId {
        loop {
            let id = RecordId::generate();
            if !self.contains(&id) {
                return id;
            }
        }
    }
}

impl<'a> IntoIterator for &'a Inspections {
    type Item = &'a InspectionRecord;
    type IntoIter = std::slice::Iter<'a, InspectionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn create_test_form(model: &str, license: &str, itv_date: &str) -> InspectionForm {
        InspectionForm {
            itv_date: itv_date.to_string(),
            ..InspectionForm::new(model, license)
        }
    }

    fn create_test_inspections() -> Inspections {
        let inspections = Inspections::new();
        let (inspections, _) = inspections
            .upsert(&create_test_form("Ibiza", "1111AAA", "2024-03-01"), None)
            .unwrap();
        let (inspections, _) = inspections
            .upsert(&create_test_form("Corsa", "2222BBB", ""), None)
            .unwrap();
        let (inspections, _) = inspections
            .upsert(&create_test_form("Golf", "3333CCC", "2024-01-10"), None)
            .unwrap();
        inspections
    }

    #[test]
    fn test_upsert_new_prepends_with_fresh_id() {
        let before = create_test_inspections();
        let (after, record) = before
            .upsert(&InspectionForm::new("Clio", "4444DDD"), None)
            .unwrap();

        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after.records()[0], record);
        assert!(!before.contains(&record.id));
        assert_eq!(before.len(), 3);
    }

    #[test]
    fn test_upsert_ids_are_unique() {
        let inspections = create_test_inspections();
        let ids: HashSet<_> = inspections.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), inspections.len());
    }

    #[test]
    fn test_upsert_edit_replaces_in_place() {
        let before = create_test_inspections();
        let target = before.records()[1].clone();

        let form = InspectionForm {
            notes: "Frenos revisados".to_string(),
            ..InspectionForm::from_record(&target)
        };
        let (after, record) = before.upsert(&form, Some(&target.id)).unwrap();

        assert_eq!(after.len(), before.len());
        assert_eq!(record.id, target.id);
        assert_eq!(after.records()[1], record);
        assert_eq!(record.notes.as_deref(), Some("Frenos revisados"));
        assert_eq!(after.records()[0], before.records()[0]);
        assert_eq!(after.records()[2], before.records()[2]);
    }

    #[test]
    fn test_upsert_edit_unknown_id_is_rejected() {
        let before = create_test_inspections();
        let err = before
            .upsert(
                &InspectionForm::new("Clio", "4444DDD"),
                Some(&RecordId::from("missing")),
            )
            .unwrap_err();
        assert!(matches!(err, Error::RecordNotFound { .. }));
    }

    #[test]
    fn test_upsert_rejects_empty_required_fields() {
        let before = create_test_inspections();

        assert!(before
            .upsert(&InspectionForm::new("", "4444DDD"), None)
            .unwrap_err()
            .is_rejection());
        assert!(before
            .upsert(&InspectionForm::new("Clio", ""), None)
            .unwrap_err()
            .is_rejection());

        let target = before.records()[0].id.clone();
        assert!(before
            .upsert(&InspectionForm::new("", ""), Some(&target))
            .is_err());
    }

    #[test]
    fn test_remove() {
        let before = create_test_inspections();
        let target = before.records()[0].id.clone();

        let after = before.remove(&target);
        assert_eq!(after.len(), 2);
        assert!(!after.contains(&target));
    }

    #[test]
    fn test_remove_nonexistent_is_noop() {
        let before = create_test_inspections();
        let after = before.remove(&RecordId::from("missing"));
        assert_eq!(after, before);
    }

    #[test]
    fn test_upcoming_sorted_and_filtered() {
        let inspections = create_test_inspections();
        let upcoming = inspections.upcoming();

        assert_eq!(upcoming.len(), 2);
        assert_eq!(upcoming[0].vehicle_model, "Golf");
        assert_eq!(upcoming[1].vehicle_model, "Ibiza");
        assert_eq!(
            upcoming[0].next_due_date(),
            NaiveDate::from_ymd_opt(2025, 1, 10)
        );
        assert!(upcoming.iter().all(|record| record.itv_date.is_some()));
    }

    #[test]
    fn test_upcoming_ties_keep_display_order() {
        let inspections = Inspections::new();
        let (inspections, ibiza) = inspections
            .upsert(&create_test_form("Ibiza", "1111AAA", "2024-01-10"), None)
            .unwrap();
        let (inspections, leon) = inspections
            .upsert(&create_test_form("Leon", "2222BBB", "2024-01-10"), None)
            .unwrap();
        let (inspections, golf) = inspections
            .upsert(&create_test_form("Golf", "3333CCC", "2023-06-01"), None)
            .unwrap();

        let display: Vec<_> = inspections.iter().map(|r| &r.id).collect();
        assert_eq!(display, [&golf.id, &leon.id, &ibiza.id]);

        let upcoming: Vec<_> = inspections.upcoming().into_iter().map(|r| &r.id).collect();
        assert_eq!(upcoming, [&golf.id, &leon.id, &ibiza.id]);

        let reordered = Inspections::replace_all(vec![ibiza.clone(), golf.clone(), leon.clone()]);
        let upcoming: Vec<_> = reordered.upcoming().into_iter().map(|r| &r.id).collect();
        assert_eq!(upcoming, [&golf.id, &ibiza.id, &leon.id]);
    }

    #[test]
    fn test_upcoming_skips_unrepresentable_due_date() {
        let (inspections, _) = Inspections::new()
            .upsert(&create_test_form("Golf", "3333CCC", "2024-01-10"), None)
            .unwrap();
        let mut records = inspections.records().to_vec();
        records.push(InspectionRecord {
            id: RecordId::from("far-future"),
            vehicle_brand: None,
            vehicle_model: "Delorean".to_string(),
            registration_year: None,
            vehicle_license: "OUTATIME".to_string(),
            inspection_date: None,
            itv_date: Some(NaiveDate::MAX),
            notes: None,
        });

        let inspections = Inspections::replace_all(records);
        let upcoming = inspections.upcoming();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].vehicle_model, "Golf");
    }

    #[test]
    fn test_upcoming_empty() {
        let (inspections, _) = Inspections::new()
            .upsert(&InspectionForm::new("Clio", "4444DDD"), None)
            .unwrap();
        assert!(inspections.upcoming().is_empty());
        assert!(Inspections::new().upcoming().is_empty());
    }

    #[test]
    fn test_replace_all_drops_duplicate_ids() {
        let inspections = create_test_inspections();
        let mut records = inspections.records().to_vec();
        let mut duplicate = records[0].clone();
        duplicate.vehicle_model = "Impostor".to_string();
        records.push(duplicate);

        let replaced = Inspections::replace_all(records);
        assert_eq!(replaced.len(), 3);
        assert_eq!(replaced, inspections);
    }

    #[test]
    fn test_get() {
        let inspections = create_test_inspections();
        let id = inspections.records()[2].id.clone();
        assert_eq!(inspections.get(&id).unwrap().vehicle_model, "Ibiza");
        assert!(inspections.get(&RecordId::from("missing")).is_none());
    }

    #[test]
    fn test_iterates_in_display_order() {
        let inspections = create_test_inspections();
        let models: Vec<_> = (&inspections)
            .into_iter()
            .map(|record| record.vehicle_model.as_str())
            .collect();
        assert_eq!(models, ["Golf", "Corsa", "Ibiza"]);
    }
}
