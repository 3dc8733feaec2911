use std::fmt;

/// Returns the local part of a prefixed name such as `jppfs_cor:Assets`.
pub fn local_name(qname: &str) -> &str {
    qname.rsplit(':').next().unwrap_or(qname)
}

/// A reportable taxonomy element as declared by the filing's extension schema.
///
/// Standard-taxonomy concepts are not declared inside the filing itself, so
/// most concepts are known only by qname; see `XbrlDocument::is_abstract` for
/// how abstractness is resolved in that case.
#[derive(Debug, Clone, PartialEq)]
pub struct Concept {
    pub qname: String,
    pub is_abstract: bool,
}

/// A dimensional qualifier attached to a context (`explicitMember`).
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub axis: String,
    pub member: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Period {
    Duration {
        start: Option<String>,
        end: Option<String>,
    },
    Instant(String),
}

impl Period {
    pub fn start(&self) -> Option<&str> {
        match self {
            Period::Duration { start, .. } => start.as_deref(),
            Period::Instant(_) => None,
        }
    }

    pub fn end(&self) -> Option<&str> {
        match self {
            Period::Duration { end, .. } => end.as_deref(),
            Period::Instant(_) => None,
        }
    }

    pub fn instant(&self) -> Option<&str> {
        match self {
            Period::Duration { .. } => None,
            Period::Instant(date) => Some(date),
        }
    }
}

/// A reporting scope: period plus dimensional qualifiers. Referenced by facts
/// through `context_ref`.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    pub id: String,
    pub period: Period,
    pub dimensions: Vec<Dimension>,
}

/// One observed value. Facts keep instance order: the walker's
/// first-matching-fact rule makes that order significant.
#[derive(Debug, Clone, PartialEq)]
pub struct Fact {
    pub concept: String,
    pub context_ref: String,
    pub value: String,
    pub decimals: Option<String>,
    pub unit_ref: Option<String>,
}

impl Fact {
    /// Numeric items are exactly those carrying a unit reference.
    pub fn is_numeric(&self) -> bool {
        self.unit_ref.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitKind {
    Simple(Vec<String>),
    Divide {
        numerators: Vec<String>,
        denominators: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub id: String,
    pub kind: UnitKind,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            UnitKind::Simple(measures) => write!(f, "{}", measures.join(":")),
            UnitKind::Divide {
                numerators,
                denominators,
            } => write!(f, "{}/{}", numerators.join(":"), denominators.join(":")),
        }
    }
}

/// A concept label from a label linkbase.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub lang: String,
    pub role: String,
    pub text: String,
}

/// One parent-child edge of a presentation tree. `preferred_label` is the
/// label role the arc asks the child to be displayed with.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationArc {
    pub from: String,
    pub to: String,
    pub order: f64,
    pub preferred_label: Option<String>,
}

/// A presentation extended link role selected for extraction, with its
/// markup-stripped definition and leading statement code.
#[derive(Debug, Clone, PartialEq)]
pub struct Linkrole {
    pub uri: String,
    pub definition: String,
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("jppfs_cor:Assets"), "Assets");
        assert_eq!(local_name("Assets"), "Assets");
    }

    #[test]
    fn test_unit_display_simple() {
        let unit = Unit {
            id: "JPY".to_string(),
            kind: UnitKind::Simple(vec!["iso4217:JPY".to_string()]),
        };
        assert_eq!(unit.to_string(), "iso4217:JPY");
    }

    #[test]
    fn test_unit_display_divide() {
        let unit = Unit {
            id: "JPYPerShares".to_string(),
            kind: UnitKind::Divide {
                numerators: vec!["iso4217:JPY".to_string()],
                denominators: vec!["xbrli:shares".to_string()],
            },
        };
        assert_eq!(unit.to_string(), "iso4217:JPY/xbrli:shares");
    }

    #[test]
    fn test_period_accessors() {
        let duration = Period::Duration {
            start: Some("2024-04-01".to_string()),
            end: Some("2025-03-31".to_string()),
        };
        assert_eq!(duration.start(), Some("2024-04-01"));
        assert_eq!(duration.end(), Some("2025-03-31"));
        assert_eq!(duration.instant(), None);

        let instant = Period::Instant("2025-03-31".to_string());
        assert_eq!(instant.instant(), Some("2025-03-31"));
        assert_eq!(instant.start(), None);
    }
}
