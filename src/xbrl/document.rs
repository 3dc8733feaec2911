//! Document model adapter: loads an EDINET XBRL instance document together
//! with the taxonomy files shipped next to it (presentation linkbase, label
//! linkbases, extension schema) and exposes the pieces the walker needs.
//!
//! Only the files inside the filing are consulted. The standard taxonomy
//! schemas live on the EDINET servers and are not resolved; abstractness for
//! those concepts falls back to the structural naming convention instead.

use anyhow::{anyhow, Context as _, Result};
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::model::{
    local_name, Concept, Context, Dimension, Fact, Label, Period, PresentationArc, Unit, UnitKind,
};

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// The standard label role, used when no preferred label is requested.
pub const STANDARD_LABEL_ROLE: &str = "http://www.xbrl.org/2003/role/label";

/// EDINET structural elements follow this naming convention; used for
/// concepts whose schema is not shipped inside the filing.
const STRUCTURAL_SUFFIXES: [&str; 6] = [
    "Abstract", "Heading", "Table", "Axis", "Member", "LineItems",
];

/// Filing-level metadata picked up while scanning facts. Used for progress
/// reporting only, never persisted into rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilingMeta {
    pub company_name: Option<String>,
    pub net_sales: Option<String>,
}

/// An in-memory XBRL filing: facts, contexts and units from the instance,
/// labels and presentation arcs from the sibling linkbases, role definitions
/// and abstract declarations from the extension schema.
#[derive(Debug, Default)]
pub struct XbrlDocument {
    /// Facts in instance order. The walker scans this in order and the first
    /// qualifying fact wins, so the order is load-bearing.
    pub facts: Vec<Fact>,
    pub contexts: HashMap<String, Context>,
    pub units: HashMap<String, Unit>,
    /// Labels per concept qname, in linkbase order.
    pub labels: HashMap<String, Vec<Label>>,
    /// Presentation arcs per extended link role URI.
    pub presentation: HashMap<String, Vec<PresentationArc>>,
    /// Role URI -> raw definition string from the extension schema.
    pub role_definitions: HashMap<String, String>,
    /// Concepts declared by the extension schema.
    pub schema_concepts: HashMap<String, Concept>,
}

impl XbrlDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the instance at `instance_path` plus every `*_pre.xml`,
    /// `*_lab.xml`, `*_lab-en.xml` and `*.xsd` found beside it. Any
    /// unreadable or malformed file aborts the load for this filing.
    pub fn load(instance_path: &Path) -> Result<Self> {
        let mut doc = XbrlDocument::new();

        let text = fs::read_to_string(instance_path)
            .with_context(|| format!("failed to read instance {}", instance_path.display()))?;
        doc.parse_instance(&text)
            .with_context(|| format!("failed to parse instance {}", instance_path.display()))?;

        let dir = instance_path.parent().unwrap_or_else(|| Path::new("."));
        let mut siblings: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("failed to list {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        siblings.sort();

        for path in siblings {
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };
            if name.ends_with("_pre.xml") {
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                doc.parse_presentation_linkbase(&text)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
            } else if name.ends_with("_lab.xml") || name.ends_with("_lab-en.xml") {
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                doc.parse_label_linkbase(&text)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
            } else if name.ends_with(".xsd") {
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                doc.parse_schema(&text)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
            }
        }

        debug!(
            "loaded {}: {} facts, {} contexts, {} presentation roles",
            instance_path.display(),
            doc.facts.len(),
            doc.contexts.len(),
            doc.presentation.len()
        );
        Ok(doc)
    }

    fn parse_instance(&mut self, text: &str) -> Result<()> {
        let tree = roxmltree::Document::parse(text)?;
        let root = tree.root_element();

        for node in root.children().filter(|n| n.is_element()) {
            match node.tag_name().name() {
                "context" => self.parse_context(node)?,
                "unit" => self.parse_unit(node)?,
                "schemaRef" => {}
                _ => {
                    // Facts are the namespaced elements carrying a contextRef.
                    if node.attribute("contextRef").is_some() {
                        let local = node.tag_name().name();
                        let qname = match node
                            .tag_name()
                            .namespace()
                            .and_then(|ns| node.lookup_prefix(ns))
                        {
                            Some(prefix) if !prefix.is_empty() => {
                                format!("{}:{}", prefix, local)
                            }
                            _ => local.to_string(),
                        };
                        self.facts.push(Fact {
                            concept: qname,
                            context_ref: node.attribute("contextRef").unwrap_or("").to_string(),
                            value: node.text().unwrap_or("").trim().to_string(),
                            decimals: node.attribute("decimals").map(str::to_string),
                            unit_ref: node.attribute("unitRef").map(str::to_string),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn parse_context(&mut self, node: roxmltree::Node) -> Result<()> {
        let id = node
            .attribute("id")
            .ok_or_else(|| anyhow!("context element without id"))?
            .to_string();

        let mut start = None;
        let mut end = None;
        let mut instant = None;
        let mut dimensions = Vec::new();

        for el in node.descendants().filter(|n| n.is_element()) {
            let text = el.text().unwrap_or("").trim();
            match el.tag_name().name() {
                "startDate" => start = Some(text.to_string()),
                "endDate" => end = Some(text.to_string()),
                "instant" => instant = Some(text.to_string()),
                "explicitMember" => {
                    if let Some(axis) = el.attribute("dimension") {
                        dimensions.push(Dimension {
                            axis: axis.to_string(),
                            member: text.to_string(),
                        });
                    }
                }
                _ => {}
            }
        }

        let period = match instant {
            Some(date) => Period::Instant(date),
            None => Period::Duration { start, end },
        };
        self.contexts.insert(
            id.clone(),
            Context {
                id,
                period,
                dimensions,
            },
        );
        Ok(())
    }

    fn parse_unit(&mut self, node: roxmltree::Node) -> Result<()> {
        let id = node
            .attribute("id")
            .ok_or_else(|| anyhow!("unit element without id"))?
            .to_string();

        let measures_under = |parent: roxmltree::Node| -> Vec<String> {
            parent
                .descendants()
                .filter(|n| n.is_element() && n.tag_name().name() == "measure")
                .map(|n| n.text().unwrap_or("").trim().to_string())
                .collect()
        };

        let divide = node
            .children()
            .find(|n| n.is_element() && n.tag_name().name() == "divide");
        let kind = match divide {
            Some(divide) => {
                let part = |name: &str| {
                    divide
                        .children()
                        .find(|n| n.is_element() && n.tag_name().name() == name)
                        .map(measures_under)
                        .unwrap_or_default()
                };
                UnitKind::Divide {
                    numerators: part("unitNumerator"),
                    denominators: part("unitDenominator"),
                }
            }
            None => UnitKind::Simple(measures_under(node)),
        };

        self.units.insert(id.clone(), Unit { id, kind });
        Ok(())
    }

    fn parse_presentation_linkbase(&mut self, text: &str) -> Result<()> {
        let tree = roxmltree::Document::parse(text)?;

        for plink in tree
            .root_element()
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "presentationLink")
        {
            let role = match plink.attribute((XLINK_NS, "role")) {
                Some(role) => role.to_string(),
                None => continue,
            };

            let mut locators: HashMap<&str, String> = HashMap::new();
            let mut raw_arcs = Vec::new();

            for child in plink.children().filter(|n| n.is_element()) {
                match child.tag_name().name() {
                    "loc" => {
                        if let (Some(label), Some(href)) = (
                            child.attribute((XLINK_NS, "label")),
                            child.attribute((XLINK_NS, "href")),
                        ) {
                            if let Some(qname) = qname_from_href(href) {
                                locators.insert(label, qname);
                            }
                        }
                    }
                    "presentationArc" => {
                        if let (Some(from), Some(to)) = (
                            child.attribute((XLINK_NS, "from")),
                            child.attribute((XLINK_NS, "to")),
                        ) {
                            let order = child
                                .attribute("order")
                                .and_then(|o| o.parse::<f64>().ok())
                                .unwrap_or(1.0);
                            let preferred_label =
                                child.attribute("preferredLabel").map(str::to_string);
                            raw_arcs.push((from, to, order, preferred_label));
                        }
                    }
                    _ => {}
                }
            }

            let arcs = self.presentation.entry(role).or_default();
            for (from, to, order, preferred_label) in raw_arcs {
                if let (Some(from_qname), Some(to_qname)) = (locators.get(from), locators.get(to))
                {
                    arcs.push(PresentationArc {
                        from: from_qname.clone(),
                        to: to_qname.clone(),
                        order,
                        preferred_label,
                    });
                }
            }
        }
        Ok(())
    }

    fn parse_label_linkbase(&mut self, text: &str) -> Result<()> {
        let tree = roxmltree::Document::parse(text)?;

        for llink in tree
            .root_element()
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "labelLink")
        {
            let mut locators: HashMap<&str, String> = HashMap::new();
            let mut resources: HashMap<&str, Label> = HashMap::new();
            let mut arcs = Vec::new();

            for child in llink.children().filter(|n| n.is_element()) {
                match child.tag_name().name() {
                    "loc" => {
                        if let (Some(label), Some(href)) = (
                            child.attribute((XLINK_NS, "label")),
                            child.attribute((XLINK_NS, "href")),
                        ) {
                            if let Some(qname) = qname_from_href(href) {
                                locators.insert(label, qname);
                            }
                        }
                    }
                    "label" => {
                        if let Some(resource_label) = child.attribute((XLINK_NS, "label")) {
                            resources.insert(
                                resource_label,
                                Label {
                                    lang: child
                                        .attribute((XML_NS, "lang"))
                                        .unwrap_or("")
                                        .to_string(),
                                    role: child
                                        .attribute((XLINK_NS, "role"))
                                        .unwrap_or(STANDARD_LABEL_ROLE)
                                        .to_string(),
                                    text: child.text().unwrap_or("").trim().to_string(),
                                },
                            );
                        }
                    }
                    "labelArc" => {
                        if let (Some(from), Some(to)) = (
                            child.attribute((XLINK_NS, "from")),
                            child.attribute((XLINK_NS, "to")),
                        ) {
                            arcs.push((from, to));
                        }
                    }
                    _ => {}
                }
            }

            for (from, to) in arcs {
                if let (Some(qname), Some(label)) = (locators.get(from), resources.get(to)) {
                    self.labels
                        .entry(qname.clone())
                        .or_default()
                        .push(label.clone());
                }
            }
        }
        Ok(())
    }

    fn parse_schema(&mut self, text: &str) -> Result<()> {
        let tree = roxmltree::Document::parse(text)?;

        for node in tree
            .root_element()
            .descendants()
            .filter(|n| n.is_element())
        {
            match node.tag_name().name() {
                "roleType" => {
                    if let Some(uri) = node.attribute("roleURI") {
                        let definition = node
                            .children()
                            .find(|n| n.is_element() && n.tag_name().name() == "definition")
                            .and_then(|n| n.text())
                            .unwrap_or("")
                            .to_string();
                        self.role_definitions.insert(uri.to_string(), definition);
                    }
                }
                "element" => {
                    if let Some(id) = node.attribute("id") {
                        let qname = qname_from_id(id);
                        let is_abstract = node.attribute("abstract") == Some("true");
                        self.schema_concepts
                            .insert(qname.clone(), Concept { qname, is_abstract });
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn context(&self, id: &str) -> Option<&Context> {
        self.contexts.get(id)
    }

    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.units.get(id)
    }

    /// Whether a concept is a structural heading rather than a reportable
    /// leaf. Extension concepts answer from their schema declaration; for
    /// everything else the EDINET naming convention decides.
    pub fn is_abstract(&self, qname: &str) -> bool {
        if let Some(concept) = self.schema_concepts.get(qname) {
            return concept.is_abstract;
        }
        let local = local_name(qname);
        STRUCTURAL_SUFFIXES
            .iter()
            .any(|suffix| local.ends_with(suffix))
    }

    /// Single exact label lookup. The ja -> en -> qname fallback chain lives
    /// at the call sites; this never errors, it only misses.
    pub fn label(&self, qname: &str, lang: &str, role: Option<&str>) -> Option<&str> {
        let candidates = self.labels.get(qname)?;
        let found = match role {
            Some(role) => candidates
                .iter()
                .find(|l| l.role == role && l.lang == lang),
            None => candidates
                .iter()
                .find(|l| l.role == STANDARD_LABEL_ROLE && l.lang == lang)
                .or_else(|| candidates.iter().find(|l| l.lang == lang)),
        };
        found.map(|l| l.text.as_str())
    }

    /// Presentation extended link role URIs, sorted for deterministic
    /// iteration independent of map order.
    pub fn presentation_roles(&self) -> Vec<&str> {
        let mut roles: Vec<&str> = self.presentation.keys().map(String::as_str).collect();
        roles.sort_unstable();
        roles
    }

    pub fn role_definition(&self, uri: &str) -> &str {
        self.role_definitions.get(uri).map(String::as_str).unwrap_or("")
    }

    /// Child arcs of `qname` within one linkrole, ordered by
    /// (display order, child qname).
    pub fn arcs_from(&self, role: &str, qname: &str) -> Vec<&PresentationArc> {
        let mut arcs: Vec<&PresentationArc> = self
            .presentation
            .get(role)
            .map(|arcs| arcs.iter().filter(|a| a.from == qname).collect())
            .unwrap_or_default();
        arcs.sort_by(|a, b| a.order.total_cmp(&b.order).then_with(|| a.to.cmp(&b.to)));
        arcs
    }

    /// Concepts with outgoing arcs but no incoming arc within the role,
    /// ordered by (minimum outgoing arc order, qname). This fixes the
    /// top-level section order of a statement.
    pub fn root_concepts(&self, role: &str) -> Vec<String> {
        let arcs = match self.presentation.get(role) {
            Some(arcs) => arcs,
            None => return Vec::new(),
        };

        let mut roots: Vec<String> = arcs
            .iter()
            .map(|a| a.from.clone())
            .filter(|from| !arcs.iter().any(|a| &a.to == from))
            .collect();
        roots.sort_unstable();
        roots.dedup();

        let min_order = |qname: &str| {
            arcs.iter()
                .filter(|a| a.from == qname)
                .map(|a| a.order)
                .fold(f64::INFINITY, f64::min)
        };
        roots.sort_by(|a, b| {
            min_order(a)
                .total_cmp(&min_order(b))
                .then_with(|| a.cmp(b))
        });
        roots
    }

    /// Filer display name and headline revenue, for progress reporting.
    pub fn filing_meta(&self) -> FilingMeta {
        let mut meta = FilingMeta::default();
        for fact in &self.facts {
            match local_name(&fact.concept) {
                "CompanyNameCoverPage" => meta.company_name = Some(fact.value.clone()),
                "NetSales" => meta.net_sales = Some(fact.value.clone()),
                _ => {}
            }
        }
        meta
    }
}

/// Resolves a locator href fragment (`...xsd#jppfs_cor_Assets`) to a
/// prefixed qname. EDINET local names never contain an underscore, so the
/// split at the last underscore is exact.
fn qname_from_href(href: &str) -> Option<String> {
    let fragment = href.split('#').nth(1)?;
    Some(qname_from_id(fragment))
}

fn qname_from_id(id: &str) -> String {
    match id.rsplit_once('_') {
        Some((prefix, local)) => format!("{}:{}", prefix, local),
        None => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qname_from_href() {
        assert_eq!(
            qname_from_href("jppfs_cor_2024-11-01.xsd#jppfs_cor_Assets"),
            Some("jppfs_cor:Assets".to_string())
        );
        assert_eq!(
            qname_from_href("local.xsd#jpcrp030000-asr_E00001-000_OperatingRevenue"),
            Some("jpcrp030000-asr_E00001-000:OperatingRevenue".to_string())
        );
        assert_eq!(qname_from_href("no-fragment.xsd"), None);
    }

    #[test]
    fn test_abstract_suffix_convention() {
        let doc = XbrlDocument::new();
        assert!(doc.is_abstract("jppfs_cor:AssetsAbstract"));
        assert!(doc.is_abstract("jppfs_cor:ConsolidatedOrNonConsolidatedAxis"));
        assert!(doc.is_abstract("jppfs_cor:NonConsolidatedMember"));
        assert!(doc.is_abstract("jpcrp_cor:BalanceSheetHeading"));
        assert!(!doc.is_abstract("jppfs_cor:Assets"));
    }

    #[test]
    fn test_schema_declaration_wins_over_suffix() {
        let mut doc = XbrlDocument::new();
        doc.schema_concepts.insert(
            "ext:OddlyNamedTable".to_string(),
            Concept {
                qname: "ext:OddlyNamedTable".to_string(),
                is_abstract: false,
            },
        );
        assert!(!doc.is_abstract("ext:OddlyNamedTable"));
    }

    #[test]
    fn test_label_lookup_prefers_standard_role() {
        let mut doc = XbrlDocument::new();
        doc.labels.insert(
            "jppfs_cor:Assets".to_string(),
            vec![
                Label {
                    lang: "ja".to_string(),
                    role: "http://www.xbrl.org/2003/role/verboseLabel".to_string(),
                    text: "資産の部".to_string(),
                },
                Label {
                    lang: "ja".to_string(),
                    role: STANDARD_LABEL_ROLE.to_string(),
                    text: "資産".to_string(),
                },
            ],
        );

        assert_eq!(doc.label("jppfs_cor:Assets", "ja", None), Some("資産"));
        assert_eq!(
            doc.label(
                "jppfs_cor:Assets",
                "ja",
                Some("http://www.xbrl.org/2003/role/verboseLabel")
            ),
            Some("資産の部")
        );
        assert_eq!(doc.label("jppfs_cor:Assets", "en", None), None);
        assert_eq!(doc.label("jppfs_cor:Liabilities", "ja", None), None);
    }
}
