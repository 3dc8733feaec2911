//! Consolidation classification.
//!
//! Two independent estimators exist and they are reconciled per fact:
//!
//! * context-based: the explicit dimension on the fact's context. This is
//!   authoritative when present.
//! * presentation-based: a coarse scan of the heading trees, recording which
//!   consolidation member hangs under each top-level heading. Used as the
//!   fallback when the context carries no dimension, and to cross-check the
//!   context when both are known.

use std::collections::HashMap;
use std::fmt;

use super::document::XbrlDocument;
use super::model::{local_name, Context};

/// The axis spellings seen in instance contexts. Presentation trees only
/// ever use the first spelling.
const CONTEXT_AXES: [&str; 2] = [
    "ConsolidatedOrNonConsolidatedAxis",
    "ConsolidatedAndNonConsolidatedAxis",
];

const PRESENTATION_AXIS: &str = "ConsolidatedOrNonConsolidatedAxis";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsolidationStatus {
    Consolidated,
    NonConsolidated,
    Unknown,
}

impl fmt::Display for ConsolidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConsolidationStatus::Consolidated => "Consolidated",
            ConsolidationStatus::NonConsolidated => "NonConsolidated",
            ConsolidationStatus::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// Classifies a context from its dimensions. The first consolidation axis
/// found decides, even when its member is unrecognized.
pub fn from_context(context: Option<&Context>) -> ConsolidationStatus {
    let context = match context {
        Some(context) => context,
        None => return ConsolidationStatus::Unknown,
    };
    for dimension in &context.dimensions {
        if CONTEXT_AXES.contains(&local_name(&dimension.axis)) {
            return match local_name(&dimension.member) {
                "ConsolidatedMember" => ConsolidationStatus::Consolidated,
                "NonConsolidatedMember" => ConsolidationStatus::NonConsolidated,
                _ => ConsolidationStatus::Unknown,
            };
        }
    }
    ConsolidationStatus::Unknown
}

/// Presentation-based estimate per heading local name.
///
/// Walks down from every arc whose parent local name contains `Heading`,
/// tracking the most recent `*Axis*` element on the path. A `*Member*`
/// element reached under the consolidation axis records a status against the
/// originating heading; a later hit for the same heading overwrites.
pub fn heading_statuses(doc: &XbrlDocument) -> HashMap<String, ConsolidationStatus> {
    let mut statuses = HashMap::new();
    for role in doc.presentation_roles() {
        let arcs = match doc.presentation.get(role) {
            Some(arcs) => arcs,
            None => continue,
        };
        let mut headings: Vec<&str> = arcs
            .iter()
            .map(|a| a.from.as_str())
            .filter(|from| local_name(from).contains("Heading"))
            .collect();
        headings.sort_unstable();
        headings.dedup();

        for heading in headings {
            let heading_local = local_name(heading).to_string();
            descend(doc, role, heading, &heading_local, None, &mut statuses);
        }
    }
    statuses
}

fn descend(
    doc: &XbrlDocument,
    role: &str,
    node: &str,
    heading_local: &str,
    passed_axis: Option<&str>,
    statuses: &mut HashMap<String, ConsolidationStatus>,
) {
    for arc in doc.arcs_from(role, node) {
        let child_local = local_name(&arc.to);
        let axis = if child_local.contains("Axis") {
            Some(child_local)
        } else {
            passed_axis
        };

        if child_local.contains("Member") && axis == Some(PRESENTATION_AXIS) {
            // NonConsolidatedMember contains the Consolidated spelling, so
            // it must be tested first.
            let status = if child_local.contains("NonConsolidatedMember") {
                ConsolidationStatus::NonConsolidated
            } else if child_local.contains("ConsolidatedMember") {
                ConsolidationStatus::Consolidated
            } else {
                ConsolidationStatus::Unknown
            };
            statuses.insert(heading_local.to_string(), status);
        }

        descend(doc, role, &arc.to, heading_local, axis, statuses);
    }
}

/// The status used for filtering: context wins unless it is Unknown.
pub fn effective_status(
    ctx_status: ConsolidationStatus,
    heading_status: ConsolidationStatus,
) -> ConsolidationStatus {
    if ctx_status != ConsolidationStatus::Unknown {
        ctx_status
    } else {
        heading_status
    }
}

/// Reconciliation of the two estimators, as reported in the output.
pub fn match_status(
    heading_status: ConsolidationStatus,
    ctx_status: ConsolidationStatus,
) -> &'static str {
    let both_known = heading_status != ConsolidationStatus::Unknown
        && ctx_status != ConsolidationStatus::Unknown;
    if both_known {
        if heading_status == ctx_status {
            "Match"
        } else {
            "Mismatch"
        }
    } else {
        "Unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xbrl::model::{Dimension, Period, PresentationArc};
    use ConsolidationStatus::*;

    fn context_with(axis: &str, member: &str) -> Context {
        Context {
            id: "CurrentYearInstant".to_string(),
            period: Period::Instant("2025-03-31".to_string()),
            dimensions: vec![Dimension {
                axis: axis.to_string(),
                member: member.to_string(),
            }],
        }
    }

    #[test]
    fn test_from_context_recognizes_both_axis_spellings() {
        let or_axis = context_with(
            "jppfs_cor:ConsolidatedOrNonConsolidatedAxis",
            "jppfs_cor:ConsolidatedMember",
        );
        assert_eq!(from_context(Some(&or_axis)), Consolidated);

        let and_axis = context_with(
            "jppfs_cor:ConsolidatedAndNonConsolidatedAxis",
            "jppfs_cor:NonConsolidatedMember",
        );
        assert_eq!(from_context(Some(&and_axis)), NonConsolidated);
    }

    #[test]
    fn test_from_context_unknowns() {
        assert_eq!(from_context(None), Unknown);

        let no_axis = Context {
            id: "c".to_string(),
            period: Period::Instant("2025-03-31".to_string()),
            dimensions: Vec::new(),
        };
        assert_eq!(from_context(Some(&no_axis)), Unknown);

        let odd_member = context_with(
            "jppfs_cor:ConsolidatedOrNonConsolidatedAxis",
            "jppfs_cor:SomeOtherMember",
        );
        assert_eq!(from_context(Some(&odd_member)), Unknown);

        let other_axis = context_with(
            "jppfs_cor:OperatingSegmentsAxis",
            "jppfs_cor:ConsolidatedMember",
        );
        assert_eq!(from_context(Some(&other_axis)), Unknown);
    }

    #[test]
    fn test_effective_status_context_wins_unless_unknown() {
        assert_eq!(effective_status(Consolidated, NonConsolidated), Consolidated);
        assert_eq!(effective_status(NonConsolidated, Consolidated), NonConsolidated);
        assert_eq!(effective_status(Unknown, Consolidated), Consolidated);
        assert_eq!(effective_status(Unknown, Unknown), Unknown);
    }

    #[test]
    fn test_match_status_laws() {
        assert_eq!(match_status(Consolidated, Consolidated), "Match");
        assert_eq!(match_status(NonConsolidated, NonConsolidated), "Match");
        assert_eq!(match_status(Consolidated, NonConsolidated), "Mismatch");
        assert_eq!(match_status(NonConsolidated, Consolidated), "Mismatch");
        assert_eq!(match_status(Unknown, Consolidated), "Unknown");
        assert_eq!(match_status(Consolidated, Unknown), "Unknown");
        assert_eq!(match_status(Unknown, Unknown), "Unknown");
    }

    fn arc(from: &str, to: &str, order: f64) -> PresentationArc {
        PresentationArc {
            from: from.to_string(),
            to: to.to_string(),
            order,
            preferred_label: None,
        }
    }

    #[test]
    fn test_heading_statuses_scan() {
        let mut doc = XbrlDocument::new();
        doc.presentation.insert(
            "http://example.com/role/bs".to_string(),
            vec![
                arc(
                    "jpcrp_cor:ConsolidatedBalanceSheetHeading",
                    "jppfs_cor:BalanceSheetTable",
                    1.0,
                ),
                arc(
                    "jppfs_cor:BalanceSheetTable",
                    "jppfs_cor:ConsolidatedOrNonConsolidatedAxis",
                    1.0,
                ),
                arc(
                    "jppfs_cor:ConsolidatedOrNonConsolidatedAxis",
                    "jppfs_cor:ConsolidatedMember",
                    1.0,
                ),
            ],
        );
        doc.presentation.insert(
            "http://example.com/role/nc-pl".to_string(),
            vec![
                arc(
                    "jpcrp_cor:NonConsolidatedStatementOfIncomeHeading",
                    "jppfs_cor:StatementOfIncomeTable",
                    1.0,
                ),
                arc(
                    "jppfs_cor:StatementOfIncomeTable",
                    "jppfs_cor:ConsolidatedOrNonConsolidatedAxis",
                    1.0,
                ),
                arc(
                    "jppfs_cor:ConsolidatedOrNonConsolidatedAxis",
                    "jppfs_cor:NonConsolidatedMember",
                    2.0,
                ),
            ],
        );

        let statuses = heading_statuses(&doc);
        assert_eq!(
            statuses.get("ConsolidatedBalanceSheetHeading"),
            Some(&Consolidated)
        );
        assert_eq!(
            statuses.get("NonConsolidatedStatementOfIncomeHeading"),
            Some(&NonConsolidated)
        );
    }

    #[test]
    fn test_heading_statuses_ignore_other_axes() {
        let mut doc = XbrlDocument::new();
        doc.presentation.insert(
            "http://example.com/role/segments".to_string(),
            vec![
                arc(
                    "jpcrp_cor:SegmentInformationHeading",
                    "jppfs_cor:OperatingSegmentsAxis",
                    1.0,
                ),
                arc(
                    "jppfs_cor:OperatingSegmentsAxis",
                    "jppfs_cor:ConsolidatedMember",
                    1.0,
                ),
            ],
        );

        let statuses = heading_statuses(&doc);
        assert!(statuses.is_empty());
    }
}
