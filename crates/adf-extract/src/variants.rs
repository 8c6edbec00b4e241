//! Variant ingest set
//!
//! Reviewed curated variants, one per allele/variant pair. Variant types
//! and molecular consequences come from SO annotations; notes are attached
//! as note DTOs, with curator notes flagged internal. Sequence rows are
//! validated against the per-type MGI coding conventions (padding bases
//! for deletions/insertions, length rules for point mutations and MNVs);
//! a record that fails validation is logged and skipped, never fatal.

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::io::Write;
use tracing::{info, warn};

use adf_common::config::Config;
use adf_common::dto::{data_provider, AuditStamp, CommonFields, DataProviderDto, NoteDto, MOUSE_TAXON};
use adf_common::envelope::EnvelopeWriter;
use adf_common::index::{index_multi, index_unique};
use adf_common::sample::sample_rows;
use adf_common::{AdfError, Result};

/// Note type key for curator (non-public) variant notes.
const CURATOR_NOTE_TYPE: i32 = 1050;

// SO CURIEs with per-type sequence conventions.
const SO_DELETION: &str = "SO:0000159";
const SO_INSERTION: &str = "SO:0000667";
const SO_DUPLICATION: &str = "SO:1000035";
const SO_MNV: &str = "SO:0002007";
const SO_DELINS: &str = "SO:1000032";
const SO_POINT_MUTATION: &str = "SO:1000008";

// ============================================================================
// Queries
// ============================================================================

// distinct because of duplicate rows in all_variant_sequence
const Q_VARIANTS: &str = r#"
    SELECT DISTINCT
        v._variant_key AS variant_key,
        aa.accid AS allele_curie,
        vs.referencesequence AS reference_sequence,
        vs.variantsequence AS variant_sequence,
        v.creation_date,
        v.modification_date
    FROM
        mrk_marker m,
        all_allele a,
        acc_accession aa,
        all_variant v,
        all_variant_sequence vs
    WHERE m._marker_key = a._marker_key
        AND a._allele_key = v._allele_key
        AND a._allele_key = aa._object_key
        AND aa._mgitype_key = 11
        AND aa._logicaldb_key = 1
        AND aa.preferred = 1
        AND v._variant_key = vs._variant_key
        AND v.isreviewed = 1
        AND vs._sequence_type_key = 316347
    ORDER BY v._variant_key
"#;

const Q_TYPES: &str = r#"
    SELECT
        v._variant_key AS variant_key,
        aa.accid AS curie
    FROM
        all_variant v,
        voc_annot va,
        voc_term vt,
        acc_accession aa
    WHERE v._variant_key = va._object_key
        AND va._annottype_key = 1026
        AND va._term_key = vt._term_key
        AND vt._term_key = aa._object_key
        AND aa._mgitype_key = 13
        AND aa.preferred = 1
    ORDER BY v._variant_key
"#;

const Q_EFFECTS: &str = r#"
    SELECT
        v._variant_key AS variant_key,
        aa.accid AS curie
    FROM
        all_variant v,
        voc_annot va,
        voc_term vt,
        acc_accession aa
    WHERE v._variant_key = va._object_key
        AND va._annottype_key = 1027
        AND va._term_key = vt._term_key
        AND vt._term_key = aa._object_key
        AND aa._mgitype_key = 13
        AND aa.preferred = 1
    ORDER BY v._variant_key
"#;

// curator notes (1050) and public notes (1051)
const Q_NOTES: &str = r#"
    SELECT
        n._object_key AS variant_key,
        n.note,
        n._notetype_key AS notetype_key,
        n.creation_date,
        n.modification_date
    FROM mgi_note n
    WHERE n._notetype_key IN (1050, 1051)
    ORDER BY n._object_key, n.creation_date
"#;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantRow {
    pub variant_key: i32,
    pub allele_curie: String,
    pub reference_sequence: Option<String>,
    pub variant_sequence: Option<String>,
    pub creation_date: Option<NaiveDateTime>,
    pub modification_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnnotationCurieRow {
    pub variant_key: i32,
    pub curie: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantNoteRow {
    pub variant_key: i32,
    pub note: String,
    pub notetype_key: i32,
    pub creation_date: Option<NaiveDateTime>,
    pub modification_date: Option<NaiveDateTime>,
}

// ============================================================================
// DTO
// ============================================================================

#[derive(Debug, Serialize)]
pub struct VariantDto {
    pub curie: String,
    pub variant_status_name: &'static str,
    pub data_provider_dto: DataProviderDto,
    pub taxon_curie: &'static str,
    pub variant_type_curie: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_general_consequence_curie: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_dtos: Option<Vec<NoteDto>>,
    #[serde(flatten)]
    pub common: CommonFields,
}

// ============================================================================
// Helpers
// ============================================================================

/// Strip everything but letters and hyphens from a stored sequence.
pub fn cleanse_sequence(seq: &str) -> String {
    seq.chars()
        .filter(|c| c.is_ascii_alphabetic() || *c == '-')
        .collect()
}

/// The submission site does not accept duplication yet; substitute its
/// parent term, insertion.
pub fn remap_variant_type(curie: &str) -> &str {
    if curie == SO_DUPLICATION {
        SO_INSERTION
    } else {
        curie
    }
}

/// Check a variant's sequences against the MGI coding convention for its
/// type. Deletions carry the deleted bases plus a leading padding base in
/// the reference sequence and just the padding base as the variant
/// sequence; insertions are the mirror image.
pub fn validate_sequences(
    variant_type: &str,
    reference_sequence: Option<&str>,
    variant_sequence: Option<&str>,
) -> Result<()> {
    let (grs, gvs) = match (reference_sequence, variant_sequence) {
        (Some(r), Some(v)) => (cleanse_sequence(r), cleanse_sequence(v)),
        // No sequence rows to check.
        _ => return Ok(()),
    };

    match variant_type {
        SO_DELETION => {
            if gvs.len() != 1 {
                return Err(AdfError::data("Deletion variant sequence length != 1"));
            }
            if !grs.starts_with(&gvs) {
                return Err(AdfError::data("Deletion padding base mismatch"));
            }
        }
        SO_INSERTION => {
            if grs.len() != 1 {
                return Err(AdfError::data("Insertion reference sequence length != 1"));
            }
            if !gvs.starts_with(&grs) {
                return Err(AdfError::data("Insertion padding base mismatch"));
            }
        }
        SO_MNV => {
            if grs.len() != gvs.len() {
                return Err(AdfError::data("MNV sequence lengths differ"));
            }
        }
        SO_DELINS => {}
        SO_POINT_MUTATION => {
            if grs.len() != 1 || gvs.len() != 1 {
                return Err(AdfError::data("Point mutation sequence length != 1"));
            }
        }
        other => {
            return Err(AdfError::data(format!(
                "Unknown or unhandled variant type: {}",
                other
            )));
        }
    }
    Ok(())
}

fn note_dto(row: &VariantNoteRow) -> Result<NoteDto> {
    let audit = AuditStamp {
        creation_date: row.creation_date,
        modification_date: row.modification_date,
    };
    Ok(NoteDto {
        free_text: row.note.clone(),
        note_type_name: "comment",
        common: CommonFields::stamp(&audit, row.notetype_key == CURATOR_NOTE_TYPE, false)?,
    })
}

/// Assemble one variant DTO.
///
/// `Ok(None)` means the record was skipped for a logged reason (no variant
/// type annotation); `Err` means a data problem the caller logs and skips.
pub fn variant_dto(
    row: &VariantRow,
    types: &HashMap<i32, String>,
    effects: &HashMap<i32, String>,
    notes: &HashMap<i32, Vec<VariantNoteRow>>,
) -> Result<Option<VariantDto>> {
    let variant_type = match types.get(&row.variant_key) {
        Some(curie) => remap_variant_type(curie),
        None => {
            warn!(
                variant_key = row.variant_key,
                "Skipping variant with no variant type annotation"
            );
            return Ok(None);
        }
    };

    validate_sequences(
        variant_type,
        row.reference_sequence.as_deref(),
        row.variant_sequence.as_deref(),
    )?;

    let note_dtos = notes
        .get(&row.variant_key)
        .map(|rows| rows.iter().map(note_dto).collect::<Result<Vec<_>>>())
        .transpose()?;

    let audit = AuditStamp {
        creation_date: row.creation_date,
        modification_date: row.modification_date,
    };

    Ok(Some(VariantDto {
        curie: format!("{}_var{}", row.allele_curie, row.variant_key),
        variant_status_name: "public",
        data_provider_dto: data_provider(&row.allele_curie, "allele"),
        taxon_curie: MOUSE_TAXON,
        variant_type_curie: variant_type.to_string(),
        source_general_consequence_curie: effects.get(&row.variant_key).cloned(),
        note_dtos,
        common: CommonFields::stamp(&audit, false, false)?,
    }))
}

// ============================================================================
// Run
// ============================================================================

pub async fn run<W: Write>(
    pool: &PgPool,
    config: &Config,
    writer: &mut EnvelopeWriter<W>,
) -> Result<()> {
    let type_rows = sqlx::query_as::<_, AnnotationCurieRow>(Q_TYPES)
        .fetch_all(pool)
        .await?;
    let types = index_unique(type_rows, |r| r.variant_key, |r| r.curie);

    let effect_rows = sqlx::query_as::<_, AnnotationCurieRow>(Q_EFFECTS)
        .fetch_all(pool)
        .await?;
    let effects = index_unique(effect_rows, |r| r.variant_key, |r| r.curie);

    let note_rows = sqlx::query_as::<_, VariantNoteRow>(Q_NOTES)
        .fetch_all(pool)
        .await?;
    let notes = index_multi(note_rows, |r| r.variant_key, |r| r);

    let rows = sqlx::query_as::<_, VariantRow>(Q_VARIANTS).fetch_all(pool).await?;
    let rows = sample_rows(rows, config.sample_limit);
    info!(count = rows.len(), "Writing variant ingest set");

    writer.begin_set("variant_ingest_set")?;
    for row in rows {
        match variant_dto(&row, &types, &effects, &notes) {
            Ok(Some(dto)) => writer.write_dto(&dto)?,
            Ok(None) => {}
            Err(e) => {
                warn!(variant_key = row.variant_key, error = %e, "Skipping variant");
            }
        }
    }
    writer.end_set()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(variant_key: i32) -> VariantRow {
        VariantRow {
            variant_key,
            allele_curie: "MGI:1856155".into(),
            reference_sequence: None,
            variant_sequence: None,
            creation_date: None,
            modification_date: None,
        }
    }

    fn types_for(variant_key: i32, curie: &str) -> HashMap<i32, String> {
        let mut types = HashMap::new();
        types.insert(variant_key, curie.to_string());
        types
    }

    // Note rows feed an encounter-order index, so the query itself must
    // return them in a stable order for output to be repeatable.
    #[test]
    fn test_note_query_has_stable_order() {
        assert!(Q_NOTES.contains("ORDER BY n._object_key, n.creation_date"));
    }

    #[test]
    fn test_cleanse_sequence() {
        assert_eq!(cleanse_sequence("AC GT\n123"), "ACGT");
        assert_eq!(cleanse_sequence("A-C"), "A-C");
    }

    #[test]
    fn test_duplication_remapped_to_insertion() {
        assert_eq!(remap_variant_type("SO:1000035"), "SO:0000667");
        assert_eq!(remap_variant_type("SO:1000008"), "SO:1000008");
    }

    #[test]
    fn test_deletion_padding_rules() {
        assert!(validate_sequences(SO_DELETION, Some("ACGT"), Some("A")).is_ok());
        assert!(validate_sequences(SO_DELETION, Some("ACGT"), Some("AC")).is_err());
        assert!(validate_sequences(SO_DELETION, Some("CGT"), Some("A")).is_err());
    }

    #[test]
    fn test_insertion_padding_rules() {
        assert!(validate_sequences(SO_INSERTION, Some("A"), Some("ACGT")).is_ok());
        assert!(validate_sequences(SO_INSERTION, Some("AC"), Some("ACGT")).is_err());
        assert!(validate_sequences(SO_INSERTION, Some("G"), Some("ACGT")).is_err());
    }

    #[test]
    fn test_point_mutation_and_mnv_lengths() {
        assert!(validate_sequences(SO_POINT_MUTATION, Some("A"), Some("G")).is_ok());
        assert!(validate_sequences(SO_POINT_MUTATION, Some("AA"), Some("G")).is_err());
        assert!(validate_sequences(SO_MNV, Some("AC"), Some("GT")).is_ok());
        assert!(validate_sequences(SO_MNV, Some("AC"), Some("G")).is_err());
    }

    #[test]
    fn test_unknown_type_rejected_when_sequences_present() {
        assert!(validate_sequences("SO:9999999", Some("A"), Some("G")).is_err());
        // Without sequence rows there is nothing to check.
        assert!(validate_sequences("SO:9999999", None, None).is_ok());
    }

    #[test]
    fn test_missing_type_skips_record() {
        let dto = variant_dto(&row(1), &HashMap::new(), &HashMap::new(), &HashMap::new()).unwrap();
        assert!(dto.is_none());
    }

    #[test]
    fn test_basic_dto_shape() {
        let dto = variant_dto(
            &row(42),
            &types_for(42, "SO:1000008"),
            &HashMap::new(),
            &HashMap::new(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(dto.curie, "MGI:1856155_var42");
        assert_eq!(dto.variant_type_curie, "SO:1000008");
        assert_eq!(dto.variant_status_name, "public");
        assert!(dto.source_general_consequence_curie.is_none());
    }

    #[test]
    fn test_duplication_emitted_as_insertion() {
        let dto = variant_dto(
            &row(42),
            &types_for(42, "SO:1000035"),
            &HashMap::new(),
            &HashMap::new(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(dto.variant_type_curie, "SO:0000667");
    }

    #[test]
    fn test_curator_note_flagged_internal() {
        let mut notes = HashMap::new();
        notes.insert(
            42,
            vec![
                VariantNoteRow {
                    variant_key: 42,
                    note: "curator only".into(),
                    notetype_key: 1050,
                    creation_date: None,
                    modification_date: None,
                },
                VariantNoteRow {
                    variant_key: 42,
                    note: "public remark".into(),
                    notetype_key: 1051,
                    creation_date: None,
                    modification_date: None,
                },
            ],
        );
        let dto = variant_dto(
            &row(42),
            &types_for(42, "SO:1000008"),
            &HashMap::new(),
            &notes,
        )
        .unwrap()
        .unwrap();
        let note_dtos = dto.note_dtos.unwrap();
        assert!(note_dtos[0].common.internal);
        assert!(!note_dtos[1].common.internal);
    }

    #[test]
    fn test_effect_carried_when_present() {
        let mut effects = HashMap::new();
        effects.insert(42, "SO:0001583".to_string());
        let dto = variant_dto(
            &row(42),
            &types_for(42, "SO:1000008"),
            &effects,
            &HashMap::new(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(dto.source_general_consequence_curie.as_deref(), Some("SO:0001583"));
    }
}
