//! AGM (affected genomic model) ingest set
//!
//! MGI genotypes become Alliance AGMs with subtype `genotype`.

use serde::Serialize;
use sqlx::PgPool;
use std::io::Write;
use tracing::info;

use adf_common::config::Config;
use adf_common::dto::{CommonFields, MOUSE_TAXON};
use adf_common::envelope::EnvelopeWriter;
use adf_common::sample::sample_rows;
use adf_common::Result;

const Q_GENOTYPES: &str = r#"
    SELECT
        aa.accid AS curie
    FROM
        gxd_genotype g,
        acc_accession aa
    WHERE
        g._genotype_key = aa._object_key
        AND aa._mgitype_key = 12
        AND aa._logicaldb_key = 1
        AND aa.preferred = 1
"#;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GenotypeRow {
    pub curie: String,
}

#[derive(Debug, Serialize)]
pub struct AgmDto {
    pub curie: String,
    pub taxon: &'static str,
    pub subtype: &'static str,
    #[serde(flatten)]
    pub common: CommonFields,
}

pub fn agm_dto(row: GenotypeRow) -> AgmDto {
    AgmDto {
        curie: row.curie,
        taxon: MOUSE_TAXON,
        subtype: "genotype",
        common: CommonFields::new(false, false),
    }
}

pub async fn run<W: Write>(
    pool: &PgPool,
    config: &Config,
    writer: &mut EnvelopeWriter<W>,
) -> Result<()> {
    let rows = sqlx::query_as::<_, GenotypeRow>(Q_GENOTYPES)
        .fetch_all(pool)
        .await?;
    let rows = sample_rows(rows, config.sample_limit);
    info!(count = rows.len(), "Writing AGM ingest set");

    writer.begin_set("agm_ingest_set")?;
    for row in rows {
        writer.write_dto(&agm_dto(row))?;
    }
    writer.end_set()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agm_dto_shape() {
        let dto = agm_dto(GenotypeRow { curie: "MGI:2166359".into() });
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["curie"], "MGI:2166359");
        assert_eq!(json["subtype"], "genotype");
        assert_eq!(json["taxon"], "NCBITaxon:10090");
    }
}
