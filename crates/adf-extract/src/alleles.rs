//! Allele ingest set
//!
//! Alleles of official mouse gene markers. Symbols carry MGI's
//! angle-bracket superscript convention and are transcoded for display;
//! mutation types and inheritance modes are mapped through static
//! translation tables.

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::io::Write;
use tracing::{info, warn};

use adf_common::config::Config;
use adf_common::dto::{
    data_provider, AuditStamp, CommonFields, DataProviderDto, NameSlotDto, MOUSE_TAXON,
};
use adf_common::envelope::EnvelopeWriter;
use adf_common::index::index_multi;
use adf_common::markup::symbol_to_html;
use adf_common::sample::sample_rows;
use adf_common::vocab::{MissPolicy, TranslationTable};
use adf_common::Result;

// ============================================================================
// Translation tables
// ============================================================================

/// MGI allele mutation vocabulary → Sequence Ontology CURIEs.
pub static MUTATION_TYPE_TO_SO: TranslationTable = TranslationTable::new(
    "allele mutation type to SO",
    &[
        ("Deletion", "SO:0000159"),
        ("Duplication", "SO:1000035"),
        ("Insertion", "SO:0000667"),
        ("Insertion of gene trap vector", "SO:0001218"),
        ("Intragenic deletion", "SO:0000159"),
        ("Inversion", "SO:1000036"),
        ("Nucleotide repeat expansion", "SO:0002162"),
        ("Nucleotide substitutions", "SO:1000002"),
        ("Single point mutation", "SO:1000008"),
        ("Translocation", "SO:0000199"),
        ("Transposon insertion", "SO:0001837"),
        ("Viral insertion", "SO:0000667"),
    ],
    MissPolicy::Skip,
);

/// MGI inheritance mode terms → Alliance inheritance mode names.
pub static INHERITANCE_MODE: TranslationTable = TranslationTable::new(
    "allele inheritance mode",
    &[
        ("Autosomal Dominant", "dominant"),
        ("Autosomal Recessive", "recessive"),
        ("Codominant", "codominant"),
        ("Semidominant", "semi-dominant"),
        ("X-linked", "x-linked"),
        ("X-linked Dominant", "x-linked dominant"),
        ("X-linked Recessive", "x-linked recessive"),
        ("Not Applicable", "unknown"),
        ("Not Specified", "unknown"),
    ],
    MissPolicy::Skip,
);

// ============================================================================
// Queries
// ============================================================================

const Q_ALLELES: &str = r#"
    SELECT
        a._allele_key AS allele_key,
        aa.accid AS curie,
        a.symbol,
        a.name,
        mt.term AS inheritance_mode,
        a.creation_date,
        a.modification_date
    FROM
        all_allele a
        JOIN acc_accession aa
            ON a._allele_key = aa._object_key
            AND aa._mgitype_key = 11
            AND aa._logicaldb_key = 1
            AND aa.preferred = 1
            AND aa.private = 0
        LEFT JOIN voc_term mt
            ON a._mode_key = mt._term_key
    WHERE
        a._marker_key IN (
            SELECT _marker_key
            FROM mrk_marker
            WHERE _organism_key = 1
            AND _marker_type_key = 1
            AND _marker_status_key = 1
        )
"#;

const Q_MUTATION_TYPES: &str = r#"
    SELECT
        am._allele_key AS allele_key,
        t.term
    FROM
        all_allele_mutation am
        JOIN voc_term t
            ON am._mutation_key = t._term_key
    ORDER BY am._allele_key
"#;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlleleRow {
    pub allele_key: i32,
    pub curie: String,
    pub symbol: String,
    pub name: String,
    pub inheritance_mode: Option<String>,
    pub creation_date: Option<NaiveDateTime>,
    pub modification_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MutationTypeRow {
    pub allele_key: i32,
    pub term: String,
}

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MutationTypeSlotDto {
    pub mutation_type_curies: Vec<String>,
    pub internal: bool,
}

#[derive(Debug, Serialize)]
pub struct InheritanceModeSlotDto {
    pub inheritance_mode_name: String,
    pub internal: bool,
}

#[derive(Debug, Serialize)]
pub struct AlleleDto {
    pub curie: String,
    pub taxon: &'static str,
    pub allele_symbol_dto: NameSlotDto,
    pub allele_full_name_dto: NameSlotDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allele_mutation_type_dtos: Option<Vec<MutationTypeSlotDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allele_inheritance_mode_dtos: Option<Vec<InheritanceModeSlotDto>>,
    pub data_provider_dto: DataProviderDto,
    #[serde(flatten)]
    pub common: CommonFields,
}

/// Map an allele's mutation terms to SO CURIEs, deduplicated in first-seen
/// order (several MGI terms share one SO parent).
fn mutation_type_curies(terms: &[String]) -> Result<Vec<String>> {
    let mut curies = Vec::new();
    for term in terms {
        if let Some(curie) = MUTATION_TYPE_TO_SO.translate(term)? {
            if !curies.iter().any(|c| c == curie) {
                curies.push(curie.to_string());
            }
        }
    }
    Ok(curies)
}

pub fn allele_dto(
    row: AlleleRow,
    mutation_types: &HashMap<i32, Vec<String>>,
) -> Result<AlleleDto> {
    let audit = AuditStamp {
        creation_date: row.creation_date,
        modification_date: row.modification_date,
    };

    let mutation_dtos = match mutation_types.get(&row.allele_key) {
        Some(terms) => {
            let curies = mutation_type_curies(terms)?;
            if curies.is_empty() {
                None
            } else {
                Some(vec![MutationTypeSlotDto {
                    mutation_type_curies: curies,
                    internal: false,
                }])
            }
        }
        None => None,
    };

    let inheritance_dtos = match row.inheritance_mode.as_deref() {
        Some(term) => INHERITANCE_MODE.translate(term)?.map(|name| {
            vec![InheritanceModeSlotDto {
                inheritance_mode_name: name.to_string(),
                internal: false,
            }]
        }),
        None => None,
    };

    Ok(AlleleDto {
        allele_symbol_dto: NameSlotDto {
            name_type_name: "nomenclature_symbol",
            format_text: row.symbol.clone(),
            display_text: symbol_to_html(&row.symbol),
            internal: false,
        },
        allele_full_name_dto: NameSlotDto::plain("full_name", row.name),
        allele_mutation_type_dtos: mutation_dtos,
        allele_inheritance_mode_dtos: inheritance_dtos,
        data_provider_dto: data_provider(&row.curie, "allele"),
        common: CommonFields::stamp(&audit, false, false)?,
        taxon: MOUSE_TAXON,
        curie: row.curie,
    })
}

pub async fn run<W: Write>(
    pool: &PgPool,
    config: &Config,
    writer: &mut EnvelopeWriter<W>,
) -> Result<()> {
    let mutation_rows = sqlx::query_as::<_, MutationTypeRow>(Q_MUTATION_TYPES)
        .fetch_all(pool)
        .await?;
    let mutation_types = index_multi(mutation_rows, |r| r.allele_key, |r| r.term);

    let rows = sqlx::query_as::<_, AlleleRow>(Q_ALLELES).fetch_all(pool).await?;
    let rows = sample_rows(rows, config.sample_limit);
    info!(count = rows.len(), "Writing allele ingest set");

    writer.begin_set("allele_ingest_set")?;
    for row in rows {
        let allele_key = row.allele_key;
        match allele_dto(row, &mutation_types) {
            Ok(dto) => writer.write_dto(&dto)?,
            Err(e) => {
                warn!(allele_key, error = %e, "Skipping allele");
            }
        }
    }
    writer.end_set()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(allele_key: i32) -> AlleleRow {
        AlleleRow {
            allele_key,
            curie: "MGI:1856155".into(),
            symbol: "Pax6<Sey>".into(),
            name: "small eye".into(),
            inheritance_mode: Some("Semidominant".into()),
            creation_date: None,
            modification_date: None,
        }
    }

    #[test]
    fn test_symbol_markup_in_dto() {
        let dto = allele_dto(row(1), &HashMap::new()).unwrap();
        assert_eq!(dto.allele_symbol_dto.format_text, "Pax6<Sey>");
        assert_eq!(dto.allele_symbol_dto.display_text, "Pax6<sup>Sey</sup>");
    }

    #[test]
    fn test_mutation_types_translated_and_deduped() {
        let mut index = HashMap::new();
        index.insert(
            1,
            vec!["Deletion".to_string(), "Intragenic deletion".to_string()],
        );
        let dto = allele_dto(row(1), &index).unwrap();
        let dtos = dto.allele_mutation_type_dtos.unwrap();
        assert_eq!(dtos[0].mutation_type_curies, vec!["SO:0000159"]);
    }

    #[test]
    fn test_unmapped_mutation_term_is_dropped() {
        let mut index = HashMap::new();
        index.insert(1, vec!["Something new".to_string()]);
        let dto = allele_dto(row(1), &index).unwrap();
        assert!(dto.allele_mutation_type_dtos.is_none());
    }

    #[test]
    fn test_inheritance_mode_translated() {
        let dto = allele_dto(row(1), &HashMap::new()).unwrap();
        let dtos = dto.allele_inheritance_mode_dtos.unwrap();
        assert_eq!(dtos[0].inheritance_mode_name, "semi-dominant");
    }

    #[test]
    fn test_no_inheritance_mode_omits_field() {
        let mut r = row(1);
        r.inheritance_mode = None;
        let dto = allele_dto(r, &HashMap::new()).unwrap();
        assert!(dto.allele_inheritance_mode_dtos.is_none());
    }
}
