//! Disease annotation ingest sets
//!
//! One document carries two sets: genotype-level annotations
//! (`disease_agm_ingest_set`, predicate `is_model_of`) and allele-level
//! annotations (`disease_allele_ingest_set`, predicate `is_implicated_in`).
//! Each set is driven by a section config holding the MGI annotation-type
//! and object-type keys.

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::io::Write;
use tracing::{info, warn};

use adf_common::config::Config;
use adf_common::envelope::EnvelopeWriter;
use adf_common::index::index_unique;
use adf_common::sample::sample_rows;
use adf_common::timestamp;
use adf_common::Result;

use crate::refs::publication_id;

// ============================================================================
// Sections
// ============================================================================

/// Per-ingest-set query parameters.
#[derive(Debug, Clone, Copy)]
pub struct Section {
    pub set_name: &'static str,
    pub annot_type_key: i32,
    pub mgi_type_key: i32,
    pub predicate: &'static str,
}

/// Both sections, in emission order.
pub const SECTIONS: &[Section] = &[
    Section {
        set_name: "disease_agm_ingest_set",
        annot_type_key: 1020,
        mgi_type_key: 12,
        predicate: "is_model_of",
    },
    Section {
        set_name: "disease_allele_ingest_set",
        annot_type_key: 1021,
        mgi_type_key: 11,
        predicate: "is_implicated_in",
    },
];

// ============================================================================
// Queries
// ============================================================================

const Q_ANNOTATIONS: &str = r#"
    SELECT
        va._annot_key AS annot_key,
        ve._annotevidence_key AS evidence_key,
        av.accid AS doid,
        qt.term AS qualifier,
        ag.accid AS subject_curie,
        ra.accid AS mgi_pub_id,
        pma.accid AS pmid,
        ve.creation_date,
        ve.modification_date
    FROM
        voc_annot va,
        voc_term vt,
        acc_accession ag,
        acc_accession av,
        voc_term qt,
        acc_accession ra,
        voc_evidence ve
            LEFT JOIN acc_accession pma
                ON pma._object_key = ve._refs_key
                AND pma._mgitype_key = 1
                AND pma._logicaldb_key = 29
    WHERE va._annottype_key = $1
        AND va._qualifier_key = qt._term_key
        AND va._term_key = vt._term_key
        AND ag._object_key = va._object_key
        AND ag._mgitype_key = $2
        AND ag._logicaldb_key = 1
        AND ag.preferred = 1
        AND av._object_key = vt._term_key
        AND av._mgitype_key = 13
        AND av._logicaldb_key = 191
        AND av.preferred = 1
        AND va._annot_key = ve._annot_key
        AND ve._refs_key = ra._object_key
        AND ra._mgitype_key = 1
        AND ra._logicaldb_key = 1
        AND ra.accid LIKE 'MGI:%'
"#;

const Q_CURATOR_NOTES: &str = r#"
    SELECT
        n._object_key AS evidence_key,
        n.note
    FROM
        mgi_note n,
        voc_evidence ve,
        voc_annot va
    WHERE
        n._notetype_key = 1008
    AND n._object_key = ve._annotevidence_key
    AND ve._annot_key = va._annot_key
    AND va._annottype_key = $1
"#;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnnotationRow {
    pub annot_key: i32,
    pub evidence_key: i32,
    pub doid: String,
    pub qualifier: String,
    pub subject_curie: String,
    pub mgi_pub_id: String,
    pub pmid: Option<String>,
    pub creation_date: Option<NaiveDateTime>,
    pub modification_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CuratorNoteRow {
    pub evidence_key: i32,
    pub note: String,
}

// ============================================================================
// DTOs
// ============================================================================

/// Evidence code for all MGI disease annotations: traceable author
/// statement (TAS).
const TAS_EVIDENCE_CODE: &str = "ECO:0000033";

#[derive(Debug, Serialize)]
pub struct RelatedNoteDto {
    pub free_text: String,
    pub internal: bool,
    pub note_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DiseaseAnnotationDto {
    pub mod_entity_id: String,
    pub internal: bool,
    pub evidence_codes: Vec<&'static str>,
    pub annotation_type: &'static str,
    pub single_reference: String,
    pub data_provider: &'static str,
    pub object: String,
    pub created_by: &'static str,
    pub updated_by: &'static str,
    pub subject: String,
    pub predicate: &'static str,
    pub negated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_notes: Option<Vec<RelatedNoteDto>>,
}

pub fn annotation_dto(
    section: &Section,
    row: AnnotationRow,
    curator_notes: &HashMap<i32, String>,
) -> Result<DiseaseAnnotationDto> {
    let related_notes = curator_notes.get(&row.evidence_key).map(|note| {
        vec![RelatedNoteDto {
            free_text: note.clone(),
            internal: true,
            note_type: "disease_note",
        }]
    });

    Ok(DiseaseAnnotationDto {
        mod_entity_id: format!(
            "MGI:diseaseannotation_{}_{}",
            row.annot_key, row.evidence_key
        ),
        internal: false,
        evidence_codes: vec![TAS_EVIDENCE_CODE],
        annotation_type: "manually_curated",
        single_reference: publication_id(&row.mgi_pub_id, row.pmid.as_deref()),
        data_provider: "MGI",
        object: row.doid,
        created_by: "MGI:curation_staff",
        updated_by: "MGI:curation_staff",
        subject: row.subject_curie,
        predicate: section.predicate,
        negated: row.qualifier == "NOT",
        date_created: row
            .creation_date
            .map(timestamp::format_datetime)
            .transpose()?,
        date_updated: row
            .modification_date
            .map(timestamp::format_datetime)
            .transpose()?,
        related_notes,
    })
}

async fn fetch_curator_notes(
    pool: &PgPool,
    section: &Section,
) -> Result<HashMap<i32, String>> {
    let rows = sqlx::query_as::<_, CuratorNoteRow>(Q_CURATOR_NOTES)
        .bind(section.annot_type_key)
        .fetch_all(pool)
        .await?;
    Ok(index_unique(rows, |r| r.evidence_key, |r| r.note))
}

pub async fn run<W: Write>(
    pool: &PgPool,
    config: &Config,
    writer: &mut EnvelopeWriter<W>,
) -> Result<()> {
    for section in SECTIONS {
        let curator_notes = fetch_curator_notes(pool, section).await?;

        let rows = sqlx::query_as::<_, AnnotationRow>(Q_ANNOTATIONS)
            .bind(section.annot_type_key)
            .bind(section.mgi_type_key)
            .fetch_all(pool)
            .await?;
        let rows = sample_rows(rows, config.sample_limit);
        info!(
            set = section.set_name,
            count = rows.len(),
            "Writing disease annotation set"
        );

        writer.begin_set(section.set_name)?;
        for row in rows {
            let annot_key = row.annot_key;
            match annotation_dto(section, row, &curator_notes) {
                Ok(dto) => writer.write_dto(&dto)?,
                Err(e) => {
                    warn!(annot_key, error = %e, "Skipping disease annotation");
                }
            }
        }
        writer.end_set()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adf_common::index::index_unique;

    fn row() -> AnnotationRow {
        AnnotationRow {
            annot_key: 101,
            evidence_key: 55,
            doid: "DOID:9352".into(),
            qualifier: "".into(),
            subject_curie: "MGI:2166359".into(),
            mgi_pub_id: "MGI:87654".into(),
            pmid: Some("12345".into()),
            creation_date: None,
            modification_date: None,
        }
    }

    #[test]
    fn test_basic_shape() {
        let dto = annotation_dto(&SECTIONS[0], row(), &HashMap::new()).unwrap();
        assert_eq!(dto.mod_entity_id, "MGI:diseaseannotation_101_55");
        assert_eq!(dto.predicate, "is_model_of");
        assert_eq!(dto.single_reference, "PMID:12345");
        assert_eq!(dto.evidence_codes, vec!["ECO:0000033"]);
        assert!(!dto.negated);
        assert!(dto.related_notes.is_none());
    }

    #[test]
    fn test_not_qualifier_negates() {
        let mut r = row();
        r.qualifier = "NOT".into();
        let dto = annotation_dto(&SECTIONS[1], r, &HashMap::new()).unwrap();
        assert!(dto.negated);
        assert_eq!(dto.predicate, "is_implicated_in");
    }

    #[test]
    fn test_mgi_pub_id_fallback() {
        let mut r = row();
        r.pmid = None;
        let dto = annotation_dto(&SECTIONS[0], r, &HashMap::new()).unwrap();
        assert_eq!(dto.single_reference, "MGI:87654");
    }

    #[test]
    fn test_curator_note_attached_internal() {
        let mut notes = HashMap::new();
        notes.insert(55, "private observation".to_string());
        let dto = annotation_dto(&SECTIONS[0], row(), &notes).unwrap();
        let related = dto.related_notes.unwrap();
        assert_eq!(related[0].free_text, "private observation");
        assert!(related[0].internal);
        assert_eq!(related[0].note_type, "disease_note");
    }

    // Two note rows share one evidence key; the single-valued index keeps
    // the last one, and that is the note the DTO must carry.
    #[test]
    fn test_duplicate_note_keys_last_write_wins_end_to_end() {
        let note_rows = vec![
            CuratorNoteRow { evidence_key: 55, note: "first note".into() },
            CuratorNoteRow { evidence_key: 55, note: "second note".into() },
        ];
        let notes = index_unique(note_rows, |r| r.evidence_key, |r| r.note);

        let dto = annotation_dto(&SECTIONS[0], row(), &notes).unwrap();
        let related = dto.related_notes.unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].free_text, "second note");
    }
}
