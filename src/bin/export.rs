use anyhow::Result;
use edinet_tools::core::output_dir_from_env;
use edinet_tools::edinet::archive;
use edinet_tools::export;
use edinet_tools::xbrl::{extract_rows, RowTable, TargetStatements, XbrlDocument};
use log::{error, info};
use std::fs;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "edinet-export",
    about = "Extract consolidated financial statements from downloaded filings into CSV"
)]
struct Opt {
    /// Directory holding downloaded ZIPs (default: EDINET_OUTPUT_DIR or ./outputs)
    #[structopt(long, parse(from_os_str))]
    output_dir: Option<PathBuf>,

    /// Also extract the consolidated statement of comprehensive income (322010)
    #[structopt(long)]
    include_comprehensive_income: bool,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let opt = Opt::from_args();

    let output_dir = opt.output_dir.unwrap_or_else(output_dir_from_env);
    let extracted_dir = output_dir.join("extracted");
    let merged_csv = output_dir.join("all_facts.csv");

    if extracted_dir.exists() {
        fs::remove_dir_all(&extracted_dir)?;
    }
    fs::create_dir_all(&extracted_dir)?;

    let targets = if opt.include_comprehensive_income {
        TargetStatements::default().with_comprehensive_income()
    } else {
        TargetStatements::default()
    };

    let filings = archive::extract_archives(&output_dir, &extracted_dir)?;
    info!("Parsing {} filings", filings.len());

    let mut merged = RowTable::default();
    for filing in &filings {
        let doc = match XbrlDocument::load(&filing.instance_path) {
            Ok(doc) => doc,
            Err(e) => {
                error!("Failed to load {}: {:#}", filing.archive_id, e);
                continue;
            }
        };

        let table = extract_rows(&doc, &targets);
        info!(
            "{}: company {}, net sales {}, {} rows",
            filing.archive_id,
            table.meta.company_name.as_deref().unwrap_or("-"),
            table.meta.net_sales.as_deref().unwrap_or("-"),
            table.len()
        );
        merged.extend(table);
    }

    export::write_rows(&merged_csv, &merged.rows)?;
    info!("Saved all facts to {}", merged_csv.display());
    Ok(())
}
