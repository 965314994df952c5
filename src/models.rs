use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lowest severity a symptom can carry.
pub const MIN_SEVERITY: i64 = 1;
/// Highest severity a symptom can carry.
pub const MAX_SEVERITY: i64 = 5;

// One row per calendar date. (year, month, day) are denormalized from `date`
// at construction time so monthly views can range-query on plain integer
// columns.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DayCard {
    pub id: String, // Primary key, uuid v4 as TEXT
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub notes: Option<String>,
    pub image_record_id: Option<String>, // At most one attached ImageRecord
    // Ordered containment; the rows live in `day_card_symptoms`, loaded on read.
    #[serde(default)]
    pub symptom_ids: Vec<String>,
}

impl DayCard {
    /// Creates an empty card for a calendar date, deriving the denormalized
    /// (year, month, day) components.
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            year: date.year(),
            month: date.month(),
            day: date.day(),
            notes: None,
            image_record_id: None,
            symptom_ids: Vec::new(),
        }
    }
}

/// A single logged health event, owned by exactly one `DayCard` through its
/// containment table. The symptom row stores no back-pointer to its card;
/// ownership is resolved with a reverse-index query when needed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Symptom {
    pub id: String,
    pub name: String,
    pub severity: i64, // Always within [MIN_SEVERITY, MAX_SEVERITY]
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
    // Ordered image attachments, rows live in `symptom_image_links`.
    #[serde(default)]
    pub image_ids: Vec<String>,
}

impl Symptom {
    /// Creates a symptom, clamping `severity` into
    /// [`MIN_SEVERITY`, `MAX_SEVERITY`].
    pub fn new(name: impl Into<String>, severity: i64, notes: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            severity: severity.clamp(MIN_SEVERITY, MAX_SEVERITY),
            notes,
            recorded_at: Utc::now(),
            image_ids: Vec::new(),
        }
    }
}

/// Photo attachment for a `DayCard` (1:1 optional). Paths may be absent if
/// capture failed; when present they point at files the image-file manager
/// deletes best-effort after the row is gone.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageRecord {
    pub id: String,
    pub original_path: Option<String>,
    pub thumbnail_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_favorite: bool,
}

impl ImageRecord {
    pub fn new(original_path: Option<String>, thumbnail_path: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            original_path,
            thumbnail_path,
            created_at: Utc::now(),
            is_favorite: false,
        }
    }
}

/// Photo attachment owned by exactly one `Symptom`'s image list.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SymptomImage {
    pub id: String,
    pub original_path: Option<String>,
    pub thumbnail_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SymptomImage {
    pub fn new(original_path: Option<String>, thumbnail_path: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            original_path,
            thumbnail_path,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_is_clamped_to_lower_bound() {
        let symptom = Symptom::new("vomiting", 0, None);
        assert_eq!(symptom.severity, MIN_SEVERITY);

        let symptom = Symptom::new("vomiting", -3, None);
        assert_eq!(symptom.severity, MIN_SEVERITY);
    }

    #[test]
    fn severity_is_clamped_to_upper_bound() {
        let symptom = Symptom::new("fever", 9, None);
        assert_eq!(symptom.severity, MAX_SEVERITY);
    }

    #[test]
    fn severity_in_range_is_kept() {
        for severity in MIN_SEVERITY..=MAX_SEVERITY {
            let symptom = Symptom::new("limping", severity, None);
            assert_eq!(symptom.severity, severity);
        }
    }

    #[test]
    fn day_card_derives_date_components() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
        let card = DayCard::for_date(date);
        assert_eq!(card.year, 2025);
        assert_eq!(card.month, 3);
        assert_eq!(card.day, 17);
        assert!(card.notes.is_none());
        assert!(card.image_record_id.is_none());
        assert!(card.symptom_ids.is_empty());
    }

    #[test]
    fn new_image_record_is_not_favorite() {
        let record = ImageRecord::new(Some("/img/a.jpg".into()), Some("/img/a_thumb.jpg".into()));
        assert!(!record.is_favorite);
    }
}
