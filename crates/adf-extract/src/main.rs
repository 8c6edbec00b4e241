//! MGI → Alliance datafeed extractor

use anyhow::Result;
use clap::Parser;
use tracing::info;

use adf_common::config::Config;
use adf_common::db;
use adf_common::envelope::{EnvelopeWriter, HeaderAttributes};
use adf_common::logging::{init_logging, LogConfig};
use adf_extract::constructs::ConstructSet;
use adf_extract::{agms, alleles, constructs, disease, genes, variants};

#[derive(Parser, Debug)]
#[command(name = "adf-extract")]
#[command(author, version, about = "MGI to Alliance curation datafeed extractor")]
struct Cli {
    /// Entity type to extract
    #[command(subcommand)]
    entity: Entity,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Entity {
    /// Emit the gene ingest set
    Genes,

    /// Emit the allele ingest set
    Alleles,

    /// Emit the AGM (genotype) ingest set
    Agms,

    /// Emit the disease annotation ingest sets (AGM and allele)
    DiseaseAnnotations,

    /// Emit construct objects or their genomic-entity associations
    Constructs {
        /// Which ingest set to emit
        #[arg(short = 't', long = "type", value_enum, default_value = "constructs")]
        set: ConstructSet,
    },

    /// Emit the variant ingest set
    Variants,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env()?;
    if cli.verbose {
        log_config = log_config.verbose();
    }
    init_logging(&log_config)?;

    let config = Config::load()?;
    let pool = db::create_pool(&config.database).await?;
    db::health_check(&pool).await?;

    let stdout = std::io::stdout();
    let mut writer = EnvelopeWriter::new(
        std::io::BufWriter::new(stdout.lock()),
        HeaderAttributes::from_config(&config),
    );
    writer.begin()?;

    match cli.entity {
        Entity::Genes => genes::run(&pool, &config, &mut writer).await?,
        Entity::Alleles => alleles::run(&pool, &config, &mut writer).await?,
        Entity::Agms => agms::run(&pool, &config, &mut writer).await?,
        Entity::DiseaseAnnotations => disease::run(&pool, &config, &mut writer).await?,
        Entity::Constructs { set } => constructs::run(&pool, &config, set, &mut writer).await?,
        Entity::Variants => variants::run(&pool, &config, &mut writer).await?,
    }

    writer.finish()?;
    info!("Extraction complete");
    Ok(())
}
