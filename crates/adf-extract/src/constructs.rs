//! Construct ingest sets
//!
//! A construct connects an allele with its engineered components:
//! expressed genes and driver genes. Components with a usable gene CURIE
//! become `ConstructGenomicEntityAssociationDTO`s; components without one
//! (bacterial genes, reporters) become `ConstructComponentSlotAnnotationDTO`s
//! embedded in the construct itself.
//!
//! MGI has no construct objects of its own, so each construct gets an
//! ersatz ID derived from its owning allele: allele `MGI:123456` owns
//! construct `MGI:123456_con`. An allele has at most one construct.
//!
//! The two ingest sets are emitted by separate invocations (`--type`):
//! `constructs` for the construct DTOs, `associations` for the
//! genomic-entity associations.

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use tracing::{info, warn};

use adf_common::config::Config;
use adf_common::dto::{
    data_provider, AuditStamp, CommonFields, DataProviderDto, NameSlotDto, NoteDto,
};
use adf_common::envelope::EnvelopeWriter;
use adf_common::index::index_unique;
use adf_common::sample::sample_rows;
use adf_common::{AdfError, Result};

use crate::genes;
use crate::refs::{RefIdMap, RefRow};

/// Relationship category: allele expresses a component gene.
pub const EXPRESSES_CATEGORY: i32 = 1004;

/// Relationship category: allele is driven by a component gene.
pub const DRIVER_CATEGORY: i32 = 1006;

/// MGI marker type key for genes.
const GENE_MARKER_TYPE: i32 = 1;

/// Which ingest set a constructs invocation emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ConstructSet {
    Constructs,
    Associations,
}

// ============================================================================
// Queries
// ============================================================================

const Q_RELATIONSHIPS: &str = r#"
    SELECT
        r._relationship_key AS relationship_key,
        r._category_key AS category_key,
        aa.accid AS allele_curie,
        al.symbol AS allele_symbol,
        mm._marker_key AS marker_key,
        mm._marker_type_key AS marker_type_key,
        am.accid AS gene_curie,
        mm.symbol AS gene_symbol,
        moa.accid AS taxon_id,
        mo.commonname AS common_name,
        r._refs_key AS refs_key,
        r.creation_date,
        r.modification_date
    FROM
        mgi_relationship r
        LEFT JOIN acc_accession am
            ON r._object_key_2 = am._object_key
            AND am._mgitype_key = 2
            AND am._logicaldb_key = 1
            AND am.preferred = 1
        JOIN acc_accession aa
            ON r._object_key_1 = aa._object_key
            AND aa._mgitype_key = 11
            AND aa._logicaldb_key = 1
            AND aa.preferred = 1
        JOIN all_allele al
            ON r._object_key_1 = al._allele_key
        JOIN mrk_marker mm
            ON r._object_key_2 = mm._marker_key
        LEFT JOIN mgi_organism mo
            ON mm._organism_key = mo._organism_key
        LEFT JOIN acc_accession moa
            ON mo._organism_key = moa._object_key
            AND moa._mgitype_key = 20
            AND moa._logicaldb_key = 32
    WHERE r._category_key = $1
    ORDER BY r._relationship_key
"#;

// Accession IDs for non-mouse component genes (HGNC, RGD, ZFIN, Xenbase).
const Q_NON_MOUSE_GENES: &str = r#"
    SELECT DISTINCT
        a.accid AS curie,
        m._marker_key AS marker_key
    FROM
        mgi_relationship r,
        mrk_marker m,
        acc_accession a
    WHERE
        r._category_key IN (1004, 1006)
    AND r._object_key_2 = m._marker_key
    AND m._organism_key != 1
    AND a._object_key = m._marker_key
    AND a._mgitype_key = 2
    AND a._logicaldb_key IN (64, 47, 172, 225)
    AND a.preferred = 1
"#;

const Q_REFS: &str = r#"
    SELECT DISTINCT
        r._refs_key AS refs_key,
        a1.accid AS mgi_id,
        a2.accid AS pmid
    FROM
        mgi_relationship r
        JOIN acc_accession a1
            ON r._refs_key = a1._object_key
            AND a1._mgitype_key = 1
            AND a1._logicaldb_key = 1
            AND a1.preferred = 1
            AND a1.prefixpart = 'MGI:'
        LEFT JOIN acc_accession a2
            ON r._refs_key = a2._object_key
            AND a2._mgitype_key = 1
            AND a2._logicaldb_key = 29
            AND a2.preferred = 1
    WHERE r._category_key IN (1004, 1006)
"#;

const Q_NOTES: &str = r#"
    SELECT
        r._relationship_key AS relationship_key,
        n.note,
        n.creation_date,
        n.modification_date
    FROM
        mgi_note n,
        mgi_relationship r
    WHERE n._notetype_key = 1042
    AND n._object_key = r._relationship_key
    AND r._category_key IN (1004, 1006)
"#;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RelationshipRow {
    pub relationship_key: i32,
    pub category_key: i32,
    pub allele_curie: String,
    pub allele_symbol: String,
    pub marker_key: i32,
    pub marker_type_key: i32,
    pub gene_curie: Option<String>,
    pub gene_symbol: String,
    pub taxon_id: Option<String>,
    pub common_name: Option<String>,
    pub refs_key: i32,
    pub creation_date: Option<NaiveDateTime>,
    pub modification_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NonMouseGeneRow {
    pub marker_key: i32,
    pub curie: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RelationshipNoteRow {
    pub relationship_key: i32,
    pub note: String,
    pub creation_date: Option<NaiveDateTime>,
    pub modification_date: Option<NaiveDateTime>,
}

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ConstructGenomicEntityAssociationDto {
    pub construct_identifier: String,
    pub genomic_entity_relation_name: &'static str,
    pub genomic_entity_identifier: String,
    pub evidence_curies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_dtos: Option<Vec<NoteDto>>,
    #[serde(flatten)]
    pub common: CommonFields,
}

#[derive(Debug, Serialize)]
pub struct ConstructComponentSlotAnnotationDto {
    pub relation_name: &'static str,
    pub component_symbol: String,
    pub evidence_curies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxon_curie: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxon_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_dtos: Option<Vec<NoteDto>>,
    #[serde(flatten)]
    pub common: CommonFields,
}

#[derive(Debug, Serialize)]
pub struct ConstructDto {
    pub mod_internal_id: String,
    pub construct_symbol_dto: NameSlotDto,
    pub data_provider_dto: DataProviderDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub construct_component_dtos: Option<Vec<ConstructComponentSlotAnnotationDto>>,
    #[serde(flatten)]
    pub common: CommonFields,
}

/// One classified component of a construct.
#[derive(Debug)]
pub enum ConstructComponent {
    Association(ConstructGenomicEntityAssociationDto),
    Slot(ConstructComponentSlotAnnotationDto),
}

/// A construct plus its gene associations, assembled from one allele's
/// relationship records.
#[derive(Debug)]
pub struct ConstructAssembly {
    pub construct: ConstructDto,
    pub associations: Vec<ConstructGenomicEntityAssociationDto>,
}

// ============================================================================
// Assembly
// ============================================================================

/// Ersatz construct identifier for an allele.
pub fn construct_id(allele_curie: &str) -> String {
    format!("{}_con", allele_curie)
}

/// Prefix non-mouse gene IDs that are stored bare in MGI.
fn qualify_non_mouse_id(accid: &str) -> String {
    if accid.starts_with("ZDB") {
        format!("ZFIN:{}", accid)
    } else if accid.starts_with("XB-") {
        format!("Xenbase:{}", accid)
    } else {
        accid.to_string()
    }
}

fn relation_name(category_key: i32) -> Result<&'static str> {
    match category_key {
        EXPRESSES_CATEGORY => Ok("expresses"),
        DRIVER_CATEGORY => Ok("is_regulated_by"),
        other => Err(AdfError::data(format!(
            "Unknown relationship category: {}",
            other
        ))),
    }
}

/// Some stored notes are mistakenly wrapped in double quotes; strip them.
fn clean_note(note: &str) -> &str {
    note.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(note)
}

fn note_dto(row: &RelationshipNoteRow) -> Result<NoteDto> {
    let audit = AuditStamp {
        creation_date: row.creation_date,
        modification_date: row.modification_date,
    };
    Ok(NoteDto {
        free_text: clean_note(&row.note).to_string(),
        note_type_name: "comment",
        common: CommonFields::stamp(&audit, false, false)?,
    })
}

/// Classify one relationship record as either a genomic-entity association
/// (gene has a usable CURIE) or a component slot annotation.
///
/// An MGI gene CURIE is usable only when the gene feed itself submits it;
/// non-mouse CURIEs are usable as-is after prefixing.
pub fn classify_component(
    row: &RelationshipRow,
    cid: &str,
    non_mouse_ids: &HashMap<i32, String>,
    submitted_genes: &HashSet<String>,
    ref_ids: &RefIdMap,
    notes: &HashMap<i32, RelationshipNoteRow>,
) -> Result<ConstructComponent> {
    let relation = relation_name(row.category_key)?;

    let evidence = ref_ids.get(row.refs_key).ok_or_else(|| {
        AdfError::data(format!(
            "No publication ID for reference key {}",
            row.refs_key
        ))
    })?;

    let note_dtos = notes
        .get(&row.relationship_key)
        .map(note_dto)
        .transpose()?
        .map(|n| vec![n]);

    let audit = AuditStamp {
        creation_date: row.creation_date,
        modification_date: row.modification_date,
    };

    let gene_id = match &row.gene_curie {
        Some(curie) if submitted_genes.contains(curie) => Some(curie.clone()),
        Some(_) => None,
        None => non_mouse_ids
            .get(&row.marker_key)
            .map(|id| qualify_non_mouse_id(id)),
    };

    match gene_id {
        Some(gid) if row.marker_type_key == GENE_MARKER_TYPE => {
            Ok(ConstructComponent::Association(
                ConstructGenomicEntityAssociationDto {
                    construct_identifier: cid.to_string(),
                    genomic_entity_relation_name: relation,
                    genomic_entity_identifier: gid,
                    evidence_curies: vec![evidence.to_string()],
                    note_dtos,
                    common: CommonFields::stamp(&audit, false, false)?,
                },
            ))
        }
        _ => Ok(ConstructComponent::Slot(ConstructComponentSlotAnnotationDto {
            relation_name: relation,
            component_symbol: row.gene_symbol.clone(),
            evidence_curies: vec![evidence.to_string()],
            taxon_curie: row.taxon_id.as_ref().map(|t| format!("NCBITaxon:{}", t)),
            taxon_text: row.common_name.clone(),
            note_dtos,
            common: CommonFields::stamp(&audit, false, false)?,
        })),
    }
}

/// Assemble one allele's construct and its gene associations.
///
/// The construct's audit window spans its components: earliest creation
/// date, latest modification date.
pub fn assemble_construct(
    allele_curie: &str,
    rows: &[RelationshipRow],
    non_mouse_ids: &HashMap<i32, String>,
    submitted_genes: &HashSet<String>,
    ref_ids: &RefIdMap,
    notes: &HashMap<i32, RelationshipNoteRow>,
) -> Result<ConstructAssembly> {
    let first = rows
        .first()
        .ok_or_else(|| AdfError::data(format!("No components for allele {}", allele_curie)))?;
    let cid = construct_id(allele_curie);

    let mut slots = Vec::new();
    let mut associations = Vec::new();
    let mut min_created: Option<NaiveDateTime> = None;
    let mut max_updated: Option<NaiveDateTime> = None;

    for row in rows {
        match classify_component(row, &cid, non_mouse_ids, submitted_genes, ref_ids, notes) {
            Ok(ConstructComponent::Association(dto)) => associations.push(dto),
            Ok(ConstructComponent::Slot(dto)) => slots.push(dto),
            Err(e) => {
                warn!(
                    relationship_key = row.relationship_key,
                    error = %e,
                    "Skipping construct component"
                );
                continue;
            }
        }

        if let Some(created) = row.creation_date {
            if min_created.is_none_or(|m| created < m) {
                min_created = Some(created);
            }
        }
        if let Some(updated) = row.modification_date {
            if max_updated.is_none_or(|m| updated > m) {
                max_updated = Some(updated);
            }
        }
    }

    let audit = AuditStamp {
        creation_date: min_created,
        modification_date: max_updated,
    };
    let symbol = format!("{} construct", first.allele_symbol);

    let construct = ConstructDto {
        mod_internal_id: cid,
        construct_symbol_dto: NameSlotDto::plain("nomenclature_symbol", symbol),
        data_provider_dto: data_provider(allele_curie, "allele"),
        construct_component_dtos: if slots.is_empty() { None } else { Some(slots) },
        common: CommonFields::stamp(&audit, false, false)?,
    };

    Ok(ConstructAssembly { construct, associations })
}

/// Group relationship rows per allele, preserving first-seen allele order
/// so output is deterministic.
pub fn group_by_allele(
    rows: Vec<RelationshipRow>,
) -> (Vec<String>, HashMap<String, Vec<RelationshipRow>>) {
    use std::collections::hash_map::Entry;

    let mut order = Vec::new();
    let mut grouped: HashMap<String, Vec<RelationshipRow>> = HashMap::new();
    for row in rows {
        match grouped.entry(row.allele_curie.clone()) {
            Entry::Vacant(slot) => {
                order.push(row.allele_curie.clone());
                slot.insert(vec![row]);
            }
            Entry::Occupied(mut slot) => slot.get_mut().push(row),
        }
    }
    (order, grouped)
}

// ============================================================================
// Run
// ============================================================================

async fn fetch_relationships(pool: &PgPool, category_key: i32) -> Result<Vec<RelationshipRow>> {
    Ok(sqlx::query_as::<_, RelationshipRow>(Q_RELATIONSHIPS)
        .bind(category_key)
        .fetch_all(pool)
        .await?)
}

pub async fn run<W: Write>(
    pool: &PgPool,
    config: &Config,
    set: ConstructSet,
    writer: &mut EnvelopeWriter<W>,
) -> Result<()> {
    let non_mouse_rows = sqlx::query_as::<_, NonMouseGeneRow>(Q_NON_MOUSE_GENES)
        .fetch_all(pool)
        .await?;
    let non_mouse_ids = index_unique(non_mouse_rows, |r| r.marker_key, |r| r.curie);

    let ref_ids = RefIdMap::from_rows(
        sqlx::query_as::<_, RefRow>(Q_REFS).fetch_all(pool).await?,
    );

    let note_rows = sqlx::query_as::<_, RelationshipNoteRow>(Q_NOTES)
        .fetch_all(pool)
        .await?;
    let notes = index_unique(note_rows, |r| r.relationship_key, |r| r);
    info!(count = notes.len(), "Loaded construct relationship notes");

    let submitted_genes = genes::submitted_gene_ids(pool).await?;

    let mut rows = fetch_relationships(pool, EXPRESSES_CATEGORY).await?;
    rows.extend(fetch_relationships(pool, DRIVER_CATEGORY).await?);
    let rows = sample_rows(rows, config.sample_limit);

    let (order, grouped) = group_by_allele(rows);
    info!(alleles = order.len(), "Writing construct data");

    let set_name = match set {
        ConstructSet::Constructs => "construct_ingest_set",
        ConstructSet::Associations => "construct_genomic_entity_association_ingest_set",
    };
    writer.begin_set(set_name)?;

    for allele_curie in &order {
        let arels = &grouped[allele_curie];
        let assembly = match assemble_construct(
            allele_curie,
            arels,
            &non_mouse_ids,
            &submitted_genes,
            &ref_ids,
            &notes,
        ) {
            Ok(assembly) => assembly,
            Err(e) => {
                warn!(allele = %allele_curie, error = %e, "Skipping construct");
                continue;
            }
        };

        match set {
            ConstructSet::Constructs => writer.write_dto(&assembly.construct)?,
            ConstructSet::Associations => {
                for assoc in &assembly.associations {
                    writer.write_dto(assoc)?;
                }
            }
        }
    }

    writer.end_set()?;
    Ok(())
}
