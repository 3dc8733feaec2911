//! Output rows and the per-filing row table.
//!
//! Rows are append-only in walker emission order. They are never re-sorted
//! or deduplicated afterwards; presentation order is the whole point.

use serde::Serialize;

use super::document::FilingMeta;
use super::model::Period;

/// Column headers of the export, in field order.
pub const ROW_HEADERS: [&str; 15] = [
    "qualified_name",
    "default_label",
    "preferred_label",
    "label_path",
    "qname_path",
    "linkrole_definition",
    "value",
    "context_id",
    "period_start",
    "period_end",
    "period_instant",
    "decimals",
    "unit",
    "consolidation_status",
    "match_status",
];

/// One export row. Heading rows leave the fact columns empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    pub qualified_name: String,
    pub default_label: String,
    pub preferred_label: String,
    pub label_path: String,
    pub qname_path: String,
    pub linkrole_definition: String,
    pub value: String,
    pub context_id: String,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub period_instant: Option<String>,
    pub decimals: String,
    pub unit: Option<String>,
    pub consolidation_status: String,
    pub match_status: String,
}

impl OutputRow {
    pub fn heading(
        qualified_name: &str,
        default_label: &str,
        preferred_label: &str,
        label_path: &str,
        qname_path: &str,
        linkrole_definition: &str,
    ) -> Self {
        OutputRow {
            qualified_name: qualified_name.to_string(),
            default_label: default_label.to_string(),
            preferred_label: preferred_label.to_string(),
            label_path: label_path.to_string(),
            qname_path: qname_path.to_string(),
            linkrole_definition: linkrole_definition.to_string(),
            value: String::new(),
            context_id: String::new(),
            period_start: None,
            period_end: None,
            period_instant: None,
            decimals: String::new(),
            unit: None,
            consolidation_status: "Heading".to_string(),
            match_status: String::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn fact(
        qualified_name: &str,
        default_label: &str,
        preferred_label: &str,
        label_path: &str,
        qname_path: &str,
        linkrole_definition: &str,
        value: &str,
        context_id: &str,
        period: Option<&Period>,
        decimals: String,
        unit: Option<String>,
        consolidation_status: String,
        match_status: &str,
    ) -> Self {
        OutputRow {
            qualified_name: qualified_name.to_string(),
            default_label: default_label.to_string(),
            preferred_label: preferred_label.to_string(),
            label_path: label_path.to_string(),
            qname_path: qname_path.to_string(),
            linkrole_definition: linkrole_definition.to_string(),
            value: value.to_string(),
            context_id: context_id.to_string(),
            period_start: period.and_then(|p| p.start()).map(str::to_string),
            period_end: period.and_then(|p| p.end()).map(str::to_string),
            period_instant: period.and_then(|p| p.instant()).map(str::to_string),
            decimals,
            unit,
            consolidation_status,
            match_status: match_status.to_string(),
        }
    }

    pub fn is_heading(&self) -> bool {
        self.consolidation_status == "Heading"
    }
}

/// Rows of one walked filing plus its display metadata.
#[derive(Debug, Default)]
pub struct RowTable {
    pub rows: Vec<OutputRow>,
    pub meta: FilingMeta,
}

impl RowTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<OutputRow> {
        self.rows
    }

    /// Appends another filing's rows after this table's, preserving each
    /// filing's emission order. Metadata of the appended table is dropped.
    pub fn extend(&mut self, other: RowTable) {
        self.rows.extend(other.rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_row_shape() {
        let row = OutputRow::heading(
            "jppfs_cor:AssetsAbstract",
            "資産の部",
            "資産の部",
            "連結貸借対照表 > 資産の部",
            "jpcrp_cor:Heading > jppfs_cor:AssetsAbstract",
            "310010 連結貸借対照表",
        );
        assert!(row.is_heading());
        assert_eq!(row.value, "");
        assert_eq!(row.match_status, "");
        assert_eq!(row.period_instant, None);
    }

    #[test]
    fn test_extend_keeps_batch_order() {
        let heading = |qname: &str| {
            OutputRow::heading(qname, "", "", "", qname, "310010 連結貸借対照表")
        };

        let mut merged = RowTable::default();
        let mut first = RowTable::default();
        first.rows.push(heading("jppfs_cor:AssetsAbstract"));
        first.rows.push(heading("jppfs_cor:LiabilitiesAbstract"));
        let mut second = RowTable::default();
        second.rows.push(heading("jppfs_cor:EquityAbstract"));

        merged.extend(first);
        merged.extend(second);

        let qnames: Vec<&str> = merged
            .rows
            .iter()
            .map(|r| r.qualified_name.as_str())
            .collect();
        assert_eq!(
            qnames,
            vec![
                "jppfs_cor:AssetsAbstract",
                "jppfs_cor:LiabilitiesAbstract",
                "jppfs_cor:EquityAbstract",
            ]
        );
    }

    #[test]
    fn test_fact_row_period_columns() {
        let instant = Period::Instant("2025-03-31".to_string());
        let row = OutputRow::fact(
            "jppfs_cor:Assets",
            "資産",
            "資産",
            "資産",
            "jppfs_cor:Assets",
            "310010 連結貸借対照表",
            "1000000",
            "CurrentYearInstant",
            Some(&instant),
            "-3".to_string(),
            Some("iso4217:JPY".to_string()),
            "Consolidated".to_string(),
            "Match",
        );
        assert_eq!(row.period_start, None);
        assert_eq!(row.period_end, None);
        assert_eq!(row.period_instant, Some("2025-03-31".to_string()));
        assert!(!row.is_heading());
    }
}
