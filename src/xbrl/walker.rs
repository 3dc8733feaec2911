//! Presentation tree walker: turns the selected statements of one filing
//! into ordered output rows.
//!
//! Every abstract concept reached emits a heading row; every concrete
//! concept emits at most one fact row across the whole filing, chosen by
//! scanning the instance's facts in order and taking the first current-year
//! consolidated one. When a filing tags the same concept twice with equally
//! valid contexts, the earlier fact in the instance wins; that is inherited
//! behavior and the tests pin it down rather than hide it.

use log::debug;
use std::collections::{HashMap, HashSet};

use super::consolidation::{self, ConsolidationStatus};
use super::document::XbrlDocument;
use super::linkrole::{contains_markup, select_targets, strip_markup, TargetStatements};
use super::model::local_name;
use super::rows::{OutputRow, RowTable};

const CURRENT_YEAR_PREFIXES: [&str; 2] = ["CurrentYearDuration", "CurrentYearInstant"];

/// Walks the targeted statements of `doc` and returns the rows in
/// presentation order.
pub fn extract_rows(doc: &XbrlDocument, targets: &TargetStatements) -> RowTable {
    let linkroles = select_targets(doc, targets);
    let mut walker = Walker::new(doc);

    for linkrole in &linkroles {
        debug!("walking linkrole {} ({})", linkrole.code, linkrole.uri);
        for root in doc.root_concepts(&linkrole.uri) {
            walker.visit(&linkrole.uri, &linkrole.definition, &root, &[], &[]);
        }
    }

    RowTable {
        rows: walker.rows,
        meta: doc.filing_meta(),
    }
}

/// Per-walk mutable state. The seen set and preferred-label map span all
/// linkroles of one filing, never beyond it.
struct Walker<'a> {
    doc: &'a XbrlDocument,
    heading_statuses: HashMap<String, ConsolidationStatus>,
    preferred_labels: HashMap<String, String>,
    seen_qnames: HashSet<String>,
    rows: Vec<OutputRow>,
}

impl<'a> Walker<'a> {
    fn new(doc: &'a XbrlDocument) -> Self {
        Walker {
            doc,
            heading_statuses: consolidation::heading_statuses(doc),
            preferred_labels: HashMap::new(),
            seen_qnames: HashSet::new(),
            rows: Vec::new(),
        }
    }

    fn visit(
        &mut self,
        role: &str,
        definition: &str,
        qname: &str,
        label_path: &[String],
        qname_path: &[String],
    ) {
        let doc = self.doc;

        let default_label = doc
            .label(qname, "ja", None)
            .map(strip_markup)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| qname.to_string());
        // The parent arc's preferredLabel, recorded before recursing, takes
        // precedence over the standard label.
        let preferred_label = self
            .preferred_labels
            .get(qname)
            .cloned()
            .unwrap_or_else(|| default_label.clone());

        let mut full_label_path = label_path.to_vec();
        full_label_path.push(preferred_label.clone());
        let mut full_qname_path = qname_path.to_vec();
        full_qname_path.push(qname.to_string());
        let label_path_str = full_label_path.join(" > ");
        let qname_path_str = full_qname_path.join(" > ");

        if doc.is_abstract(qname) {
            self.rows.push(OutputRow::heading(
                qname,
                &default_label,
                &preferred_label,
                &label_path_str,
                &qname_path_str,
                definition,
            ));
        }

        self.emit_fact(
            qname,
            &default_label,
            &preferred_label,
            &label_path_str,
            &qname_path_str,
            definition,
            &full_qname_path[0],
        );

        for arc in doc.arcs_from(role, qname) {
            let child_label =
                self.child_display_label(&arc.to, arc.preferred_label.as_deref());
            self.preferred_labels.insert(arc.to.clone(), child_label);
            self.visit(role, definition, &arc.to, &full_label_path, &full_qname_path);
        }
    }

    /// Emits at most one fact row for `qname`: the first fact in instance
    /// order that is effectively consolidated, dated to the current year,
    /// free of markup, and not yet emitted under this filing.
    #[allow(clippy::too_many_arguments)]
    fn emit_fact(
        &mut self,
        qname: &str,
        default_label: &str,
        preferred_label: &str,
        label_path: &str,
        qname_path: &str,
        definition: &str,
        heading_qname: &str,
    ) {
        let doc = self.doc;
        let heading_status = self
            .heading_statuses
            .get(local_name(heading_qname))
            .copied()
            .unwrap_or(ConsolidationStatus::Unknown);

        for fact in doc.facts() {
            if fact.concept != qname {
                continue;
            }

            let context = doc.context(&fact.context_ref);
            let ctx_status = consolidation::from_context(context);
            let effective = consolidation::effective_status(ctx_status, heading_status);
            if effective != ConsolidationStatus::Consolidated {
                continue;
            }

            if !CURRENT_YEAR_PREFIXES
                .iter()
                .any(|prefix| fact.context_ref.starts_with(prefix))
            {
                continue;
            }

            if contains_markup(&fact.value) {
                continue;
            }

            if self.seen_qnames.contains(qname) {
                continue;
            }
            self.seen_qnames.insert(qname.to_string());

            let decimals = if fact.is_numeric() {
                fact.decimals.clone().unwrap_or_default()
            } else {
                "N/A".to_string()
            };
            let unit = fact
                .unit_ref
                .as_deref()
                .and_then(|id| doc.unit(id))
                .map(|u| u.to_string());

            debug!("emitting {} from context {}", qname, fact.context_ref);
            self.rows.push(OutputRow::fact(
                qname,
                default_label,
                preferred_label,
                label_path,
                qname_path,
                definition,
                &fact.value,
                &fact.context_ref,
                context.map(|c| &c.period),
                decimals,
                unit,
                effective.to_string(),
                consolidation::match_status(heading_status, ctx_status),
            ));
            break;
        }
    }

    /// Display label for a child node: the arc's preferredLabel role first,
    /// then the standard label, Japanese before English, the qname last.
    fn child_display_label(&self, qname: &str, preferred_role: Option<&str>) -> String {
        let doc = self.doc;
        let lookup = |lang: &str, role: Option<&str>| {
            doc.label(qname, lang, role)
                .map(strip_markup)
                .filter(|s| !s.is_empty())
        };

        let found = match preferred_role {
            Some(role) => lookup("ja", Some(role))
                .or_else(|| lookup("en", Some(role)))
                .or_else(|| lookup("ja", None))
                .or_else(|| lookup("en", None)),
            None => lookup("ja", None).or_else(|| lookup("en", None)),
        };
        found.unwrap_or_else(|| qname.to_string())
    }
}
