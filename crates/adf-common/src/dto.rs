//! Shared DTO pieces
//!
//! Building blocks common to every ingest-set DTO: the internal/obsolete
//! flags with audit timestamps, name slot annotations, notes, and the
//! fixed MGI data-provider block.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::Result;
use crate::timestamp;

/// Taxon CURIE for mouse; every submitted entity carries it.
pub const MOUSE_TAXON: &str = "NCBITaxon:10090";

/// Fixed attribution CURIE for created/updated stamps.
pub const MGI_CURATION_STAFF: &str = "MGI:curation_staff";

/// Source organization abbreviation in data-provider blocks.
pub const MGI_ABBREVIATION: &str = "MGI";

// ============================================================================
// Common fields
// ============================================================================

/// Audit columns carried by a source row. Either date may be absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditStamp {
    pub creation_date: Option<NaiveDateTime>,
    pub modification_date: Option<NaiveDateTime>,
}

/// The fields every DTO shares. Flatten into entity DTOs with
/// `#[serde(flatten)]`.
#[derive(Debug, Clone, Serialize, Default)]
pub struct CommonFields {
    pub internal: bool,
    pub obsolete: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_curie: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by_curie: Option<String>,
}

impl CommonFields {
    /// Flags only, no timestamps.
    pub fn new(internal: bool, obsolete: bool) -> Self {
        Self {
            internal,
            obsolete,
            ..Self::default()
        }
    }

    /// Flags plus whatever audit dates the source row carries.
    pub fn stamp(audit: &AuditStamp, internal: bool, obsolete: bool) -> Result<Self> {
        let mut fields = Self::new(internal, obsolete);
        fields.apply_audit(audit)?;
        Ok(fields)
    }

    /// Set created/updated fields from the source row's audit columns.
    ///
    /// Only present dates are written; an absent date never clears a field
    /// that was set earlier. Each timestamp written also stamps the fixed
    /// attribution CURIE.
    pub fn apply_audit(&mut self, audit: &AuditStamp) -> Result<()> {
        if let Some(created) = audit.creation_date {
            self.date_created = Some(timestamp::format_datetime(created)?);
            self.created_by_curie = Some(MGI_CURATION_STAFF.to_string());
        }
        if let Some(modified) = audit.modification_date {
            self.date_updated = Some(timestamp::format_datetime(modified)?);
            self.updated_by_curie = Some(MGI_CURATION_STAFF.to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Slot annotations
// ============================================================================

/// A name slot annotation (symbols, full names).
#[derive(Debug, Clone, Serialize)]
pub struct NameSlotDto {
    pub name_type_name: &'static str,
    pub format_text: String,
    pub display_text: String,
    pub internal: bool,
}

impl NameSlotDto {
    /// A slot where format and display text are the same string.
    pub fn plain(name_type_name: &'static str, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            name_type_name,
            format_text: text.clone(),
            display_text: text,
            internal: false,
        }
    }
}

/// A free-text note attached to an entity or relationship.
#[derive(Debug, Clone, Serialize)]
pub struct NoteDto {
    pub free_text: String,
    pub note_type_name: &'static str,
    #[serde(flatten)]
    pub common: CommonFields,
}

// ============================================================================
// Data provider
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CrossReferenceDto {
    pub referenced_curie: String,
    pub page_area: String,
    pub display_name: String,
    pub prefix: &'static str,
    pub internal: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataProviderDto {
    pub source_organization_abbreviation: &'static str,
    pub internal: bool,
    pub cross_reference_dto: CrossReferenceDto,
}

/// The fixed MGI data-provider block pointing at `curie` on `page_area`.
pub fn data_provider(curie: &str, page_area: &str) -> DataProviderDto {
    DataProviderDto {
        source_organization_abbreviation: MGI_ABBREVIATION,
        internal: false,
        cross_reference_dto: CrossReferenceDto {
            referenced_curie: curie.to_string(),
            page_area: page_area.to_string(),
            display_name: curie.to_string(),
            prefix: MGI_ABBREVIATION,
            internal: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_stamp_with_both_dates() {
        let audit = AuditStamp {
            creation_date: Some(date(2007, 1, 15)),
            modification_date: Some(date(2014, 5, 1)),
        };
        let fields = CommonFields::stamp(&audit, false, false).unwrap();
        assert_eq!(fields.date_created.as_deref(), Some("2007-01-15T00:00:00-05:00"));
        assert_eq!(fields.date_updated.as_deref(), Some("2014-05-01T00:00:00-04:00"));
        assert_eq!(fields.created_by_curie.as_deref(), Some(MGI_CURATION_STAFF));
        assert_eq!(fields.updated_by_curie.as_deref(), Some(MGI_CURATION_STAFF));
    }

    #[test]
    fn test_absent_modification_date_leaves_existing_value() {
        let mut fields = CommonFields::new(false, false);
        fields.date_updated = Some("2010-06-01T00:00:00-04:00".to_string());

        let audit = AuditStamp {
            creation_date: Some(date(2007, 1, 15)),
            modification_date: None,
        };
        fields.apply_audit(&audit).unwrap();

        assert_eq!(fields.date_updated.as_deref(), Some("2010-06-01T00:00:00-04:00"));
        assert_eq!(fields.date_created.as_deref(), Some("2007-01-15T00:00:00-05:00"));
    }

    #[test]
    fn test_empty_audit_sets_nothing() {
        let fields = CommonFields::stamp(&AuditStamp::default(), true, false).unwrap();
        assert!(fields.internal);
        assert!(!fields.obsolete);
        assert!(fields.date_created.is_none());
        assert!(fields.date_updated.is_none());
    }

    #[test]
    fn test_optional_fields_omitted_from_json() {
        let fields = CommonFields::new(false, false);
        let json = serde_json::to_value(&fields).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(obj.contains_key("internal"));
        assert!(obj.contains_key("obsolete"));
    }

    #[test]
    fn test_data_provider_shape() {
        let dto = data_provider("MGI:97490", "allele");
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["source_organization_abbreviation"], "MGI");
        assert_eq!(json["cross_reference_dto"]["referenced_curie"], "MGI:97490");
        assert_eq!(json["cross_reference_dto"]["page_area"], "allele");
    }
}
