//! EDINET v2 API client: disclosure-document metadata and XBRL downloads.

use anyhow::{anyhow, Context as _, Result};
use chrono::{Duration, NaiveDate};
use indicatif::ProgressBar;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const LIST_ENDPOINT: &str = "https://disclosure.edinet-fsa.go.jp/api/v2/documents.json";
const DOCUMENT_ENDPOINT: &str = "https://api.edinet-fsa.go.jp/api/v2/documents";

/// Securities report (有価証券報告書).
pub const DOC_TYPE_SECURITIES_REPORT: &str = "120";

/// One entry of the EDINET document list. Only `docID` is guaranteed; the
/// API leaves the other fields null for some filings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(rename = "docID")]
    pub doc_id: String,
    #[serde(rename = "edinetCode")]
    pub edinet_code: Option<String>,
    #[serde(rename = "docTypeCode")]
    pub doc_type_code: Option<String>,
    #[serde(rename = "filerName")]
    pub filer_name: Option<String>,
    #[serde(rename = "periodEnd")]
    pub period_end: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    results: Vec<DocumentMeta>,
}

/// Lists the documents disclosed on `date`. `type=2` asks for metadata and
/// body listings.
pub async fn disclosure_documents(
    client: &Client,
    date: NaiveDate,
    api_key: &str,
) -> Result<Vec<DocumentMeta>> {
    let date_str = date.format("%Y-%m-%d").to_string();
    log::debug!("Fetching document list for {}", date_str);

    let response = client
        .get(LIST_ENDPOINT)
        .query(&[
            ("date", date_str.as_str()),
            ("type", "2"),
            ("Subscription-Key", api_key),
        ])
        .send()
        .await
        .with_context(|| format!("document list request for {} failed", date_str))?;

    log::debug!("Response status: {}", response.status());
    if !response.status().is_success() {
        return Err(anyhow!(
            "document list request for {} failed with status: {}",
            date_str,
            response.status()
        ));
    }

    let list: DocumentList = response
        .json()
        .await
        .with_context(|| format!("malformed document list for {}", date_str))?;
    Ok(list.results)
}

/// Keeps documents matching both code filters. An empty filter list keeps
/// every document carrying a value on that axis; documents without a value
/// are always dropped.
pub fn filter_by_codes(
    docs: Vec<DocumentMeta>,
    edinet_codes: &[String],
    doc_type_codes: &[String],
) -> Vec<DocumentMeta> {
    let matches = |value: &Option<String>, filter: &[String]| match value {
        Some(code) => filter.is_empty() || filter.iter().any(|c| c == code),
        None => false,
    };

    docs.into_iter()
        .filter(|doc| {
            matches(&doc.edinet_code, edinet_codes)
                && matches(&doc.doc_type_code, doc_type_codes)
        })
        .collect()
}

/// Polls every day of the inclusive range and returns the filtered hits.
/// Days that fail to fetch are logged and skipped.
pub async fn documents_for_date_range(
    client: &Client,
    start: NaiveDate,
    end: NaiveDate,
    api_key: &str,
    edinet_codes: &[String],
    doc_type_codes: &[String],
    progress: Option<&ProgressBar>,
) -> Result<Vec<DocumentMeta>> {
    let mut hits = Vec::new();
    let mut current = start;

    while current <= end {
        match disclosure_documents(client, current, api_key).await {
            Ok(docs) => {
                hits.extend(filter_by_codes(docs, edinet_codes, doc_type_codes));
            }
            Err(e) => {
                log::warn!("Failed to fetch {}: {:#}", current, e);
            }
        }
        if let Some(pb) = progress {
            pb.inc(1);
        }
        current += Duration::days(1);
    }

    Ok(hits)
}

/// Downloads the XBRL ZIP of one document (`type=1`).
pub async fn download_document(
    client: &Client,
    doc_id: &str,
    api_key: &str,
) -> Result<Vec<u8>> {
    let url = format!("{}/{}", DOCUMENT_ENDPOINT, doc_id);
    log::debug!("Downloading document {}", doc_id);

    let response = client
        .get(&url)
        .query(&[("type", "1"), ("Subscription-Key", api_key)])
        .send()
        .await
        .with_context(|| format!("download request for {} failed", doc_id))?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "download of {} failed with status: {}",
            doc_id,
            response.status()
        ));
    }

    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("failed to read body of {}", doc_id))?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(doc_id: &str, edinet: Option<&str>, doc_type: Option<&str>) -> DocumentMeta {
        DocumentMeta {
            doc_id: doc_id.to_string(),
            edinet_code: edinet.map(str::to_string),
            doc_type_code: doc_type.map(str::to_string),
            filer_name: None,
            period_end: None,
        }
    }

    #[test]
    fn test_filter_by_codes_both_axes() {
        let docs = vec![
            doc("D1", Some("E04539"), Some("120")),
            doc("D2", Some("E04539"), Some("130")),
            doc("D3", Some("E99999"), Some("120")),
        ];
        let filtered = filter_by_codes(
            docs,
            &["E04539".to_string()],
            &["120".to_string()],
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].doc_id, "D1");
    }

    #[test]
    fn test_filter_by_codes_empty_list_keeps_coded_docs() {
        let docs = vec![
            doc("D1", Some("E04539"), Some("120")),
            doc("D2", Some("E99999"), Some("120")),
            doc("D3", None, Some("120")),
            doc("D4", Some("E04539"), None),
        ];
        let filtered = filter_by_codes(docs, &[], &["120".to_string()]);
        let ids: Vec<&str> = filtered.iter().map(|d| d.doc_id.as_str()).collect();
        // Documents without an edinetCode never match, even with no filter.
        assert_eq!(ids, vec!["D1", "D2"]);
    }

    #[test]
    fn test_document_meta_deserializes_api_shape() {
        let json = r#"{
            "docID": "S100ABCD",
            "edinetCode": "E04539",
            "docTypeCode": "120",
            "filerName": "株式会社帝国ホテル",
            "periodEnd": "2025-03-31",
            "secCode": "97080"
        }"#;
        let meta: DocumentMeta = serde_json::from_str(json).unwrap();
        assert_eq!(meta.doc_id, "S100ABCD");
        assert_eq!(meta.edinet_code.as_deref(), Some("E04539"));
        assert_eq!(meta.period_end.as_deref(), Some("2025-03-31"));
    }
}
