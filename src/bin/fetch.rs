use anyhow::Result;
use chrono::{Datelike, Duration, Local, NaiveDate};
use edinet_tools::core::EdinetConfig;
use edinet_tools::edinet::client::{self, DOC_TYPE_SECURITIES_REPORT};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "edinet-fetch", about = "Download XBRL filings from EDINET")]
struct Opt {
    /// First disclosure date to poll (YYYY-MM-DD; default two years back)
    #[structopt(long)]
    from: Option<NaiveDate>,

    /// Last disclosure date to poll (YYYY-MM-DD; default today)
    #[structopt(long)]
    to: Option<NaiveDate>,

    /// EDINET filer codes to keep (repeatable; default: all filers)
    #[structopt(long = "edinet-code")]
    edinet_codes: Vec<String>,

    /// Document type codes to keep (repeatable; default: 120, securities report)
    #[structopt(long = "doc-type")]
    doc_types: Vec<String>,

    /// Directory for downloaded ZIPs (default: EDINET_OUTPUT_DIR or ./outputs)
    #[structopt(long, parse(from_os_str))]
    output_dir: Option<PathBuf>,
}

fn progress_bar(len: u64, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {}",
                unit
            ))
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

/// Removes leftovers from previous runs so the export sees only this run's
/// downloads.
fn clear_dir(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let removed = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        if let Err(e) = removed {
            warn!("Failed to remove {} ({})", path.display(), e);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let opt = Opt::from_args();

    let config = EdinetConfig::from_env()?;
    let output_dir = opt.output_dir.unwrap_or_else(|| config.output_dir.clone());
    let to = opt.to.unwrap_or_else(|| Local::now().date_naive());
    let from = opt.from.unwrap_or_else(|| {
        to.with_year(to.year() - 2).unwrap_or(to - Duration::days(730))
    });
    let doc_types = if opt.doc_types.is_empty() {
        vec![DOC_TYPE_SECURITIES_REPORT.to_string()]
    } else {
        opt.doc_types
    };

    fs::create_dir_all(&output_dir)?;
    clear_dir(&output_dir)?;

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(std::time::Duration::from_secs(30))
        .connect_timeout(std::time::Duration::from_secs(10))
        .build()?;

    info!(
        "Polling EDINET disclosures {} to {} (doc types {:?})",
        from, to, doc_types
    );
    let total_days = (to - from).num_days().max(0) as u64 + 1;
    let poll_pb = progress_bar(total_days, "days");
    let hits = client::documents_for_date_range(
        &client,
        from,
        to,
        &config.api_key,
        &opt.edinet_codes,
        &doc_types,
        Some(&poll_pb),
    )
    .await?;
    poll_pb.finish();
    info!("Hit count: {} documents", hits.len());

    let download_pb = progress_bar(hits.len() as u64, "files");
    for doc in &hits {
        download_pb.inc(1);

        let edinet_code = doc.edinet_code.as_deref().unwrap_or("unknown");
        let report_period: String = doc
            .period_end
            .as_deref()
            .unwrap_or("")
            .chars()
            .take(7)
            .collect();
        let save_path = output_dir.join(format!("{}_{}.zip", edinet_code, report_period));

        match client::download_document(&client, &doc.doc_id, &config.api_key).await {
            Ok(bytes) => {
                if let Err(e) = fs::write(&save_path, &bytes) {
                    error!("Failed to save {} ({})", save_path.display(), e);
                    continue;
                }
                info!(
                    "Saved {} ({})",
                    save_path.display(),
                    doc.filer_name.as_deref().unwrap_or("unknown filer")
                );
            }
            Err(e) => {
                error!("Failed to download {}: {:#}", doc.doc_id, e);
                continue;
            }
        }
    }
    download_pb.finish();

    info!("Finished. Downloads are in {}", output_dir.display());
    Ok(())
}
