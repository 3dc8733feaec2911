//! Linkrole selection: which presentation extended link roles of a filing
//! are financial statements we extract.
//!
//! EDINET role definitions start with a 6-digit statement code followed by a
//! Japanese title, e.g. `310010 連結貸借対照表`. Definitions are sometimes
//! wrapped in XHTML fragments, so they are stripped before matching.

use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use super::document::XbrlDocument;
use super::model::Linkrole;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6}").unwrap());

/// Consolidated balance sheet, income statement, cash-flow statement.
const DEFAULT_CODES: [&str; 3] = ["310010", "321010", "342010"];

/// Consolidated statement of comprehensive income. Only some filers use the
/// two-statement layout, so this is opt-in.
const COMPREHENSIVE_INCOME_CODE: &str = "322010";

/// Removes markup tags, decodes HTML entities, normalizes NBSP, trims.
pub fn strip_markup(s: &str) -> String {
    let without_tags = TAG_RE.replace_all(s, "");
    decode_html_entities(without_tags.as_ref())
        .replace('\u{a0}', " ")
        .trim()
        .to_string()
}

/// Whether a fact value carries markup fragments. Such values are narrative
/// blocks mistagged into the statements and are never emitted.
pub fn contains_markup(s: &str) -> bool {
    TAG_RE.is_match(s)
}

/// Leading 6-digit statement code of a role definition, if present.
pub fn extract_code(definition: &str) -> Option<String> {
    CODE_RE
        .find(definition.trim())
        .map(|m| m.as_str().to_string())
}

/// The statement codes one extraction run targets.
#[derive(Debug, Clone)]
pub struct TargetStatements {
    codes: BTreeSet<String>,
}

impl Default for TargetStatements {
    fn default() -> Self {
        TargetStatements {
            codes: DEFAULT_CODES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl TargetStatements {
    pub fn with_comprehensive_income(mut self) -> Self {
        self.codes.insert(COMPREHENSIVE_INCOME_CODE.to_string());
        self
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }
}

/// Selects the targeted linkroles of a filing, sorted by (code, definition)
/// so statements always come out in the same order.
pub fn select_targets(doc: &XbrlDocument, targets: &TargetStatements) -> Vec<Linkrole> {
    let mut selected = Vec::new();
    for uri in doc.presentation_roles() {
        let definition = strip_markup(doc.role_definition(uri));
        let code = match extract_code(&definition) {
            Some(code) => code,
            None => continue,
        };
        if !targets.contains(&code) {
            continue;
        }
        selected.push(Linkrole {
            uri: uri.to_string(),
            definition,
            code,
        });
    }
    selected.sort_by(|a, b| a.code.cmp(&b.code).then_with(|| a.definition.cmp(&b.definition)));
    selected
}
