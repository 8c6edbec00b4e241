//! Gene ingest set
//!
//! Official mouse gene markers with their preferred MGI accession IDs.
//! Other feeds reference genes through [`submitted_gene_ids`] so that a
//! gene-side identifier is only used when the gene itself was submitted.

use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashSet;
use std::io::Write;
use tracing::info;

use adf_common::config::Config;
use adf_common::dto::{CommonFields, MOUSE_TAXON};
use adf_common::envelope::EnvelopeWriter;
use adf_common::sample::sample_rows;
use adf_common::Result;

const Q_GENES: &str = r#"
    SELECT
        aa.accid AS curie, mm.symbol, mm.name
    FROM
        mrk_marker mm,
        acc_accession aa
    WHERE
        mm._organism_key = 1
        AND mm._marker_type_key = 1
        AND mm._marker_status_key = 1
        AND mm._marker_key = aa._object_key
        AND aa._mgitype_key = 2
        AND aa._logicaldb_key = 1
        AND aa.preferred = 1
        AND aa.private = 0
"#;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GeneRow {
    pub curie: String,
    pub symbol: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct GeneDto {
    pub curie: String,
    pub taxon: &'static str,
    pub symbol: String,
    pub name: String,
    #[serde(flatten)]
    pub common: CommonFields,
}

pub fn gene_dto(row: GeneRow) -> GeneDto {
    GeneDto {
        curie: row.curie,
        taxon: MOUSE_TAXON,
        symbol: row.symbol,
        name: row.name,
        common: CommonFields::new(false, false),
    }
}

async fn fetch_genes(pool: &PgPool) -> Result<Vec<GeneRow>> {
    Ok(sqlx::query_as::<_, GeneRow>(Q_GENES).fetch_all(pool).await?)
}

/// The set of gene CURIEs the gene feed submits.
///
/// Feeds that associate other entities with genes check membership here,
/// so an association is only emitted when its gene side was itself
/// emitted.
pub async fn submitted_gene_ids(pool: &PgPool) -> Result<HashSet<String>> {
    let rows = fetch_genes(pool).await?;
    Ok(rows.into_iter().map(|r| r.curie).collect())
}

pub async fn run<W: Write>(
    pool: &PgPool,
    config: &Config,
    writer: &mut EnvelopeWriter<W>,
) -> Result<()> {
    let rows = sample_rows(fetch_genes(pool).await?, config.sample_limit);
    info!(count = rows.len(), "Writing gene ingest set");

    writer.begin_set("gene_ingest_set")?;
    for row in rows {
        writer.write_dto(&gene_dto(row))?;
    }
    writer.end_set()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gene_dto_shape() {
        let dto = gene_dto(GeneRow {
            curie: "MGI:97490".into(),
            symbol: "Pax6".into(),
            name: "paired box 6".into(),
        });
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["curie"], "MGI:97490");
        assert_eq!(json["taxon"], "NCBITaxon:10090");
        assert_eq!(json["symbol"], "Pax6");
        assert_eq!(json["name"], "paired box 6");
        assert_eq!(json["internal"], false);
        assert_eq!(json["obsolete"], false);
    }
}
