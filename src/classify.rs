//! Ordered classification of generic proxy elements into categories.
//!
//! A proxy element's display name is matched against an ordered list of rules;
//! the first rule with any matching pattern wins. Order matters: "MemberSystem"
//! must be tried before "Member", "Pipe Fitting" before "Pipe".
//!
//! Navisworks exports carry plant tag codes (`Hgr-3001`, `VG3-101`, `41P-101A`)
//! rather than descriptive names, so they get their own table,
//! [`RuleSet::navis_default`].

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Category for entities with no display name.
pub const UNKNOWN: &str = "Unknown";
/// Category for names no rule matches.
pub const OTHER: &str = "Other";

/// A category name, usable as the local name of a class IRI.
pub type Category = String;

/// One classification rule as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub category: String,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone)]
struct CategoryRule {
    category: Category,
    patterns: Vec<Regex>,
}

/// The ordered rule table.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CategoryRule>,
}

const DEFAULT_RULES: &[(&str, &[&str])] = &[
    ("MemberSystem", &["membersystem", r"member\s*system"]),
    ("Hanger", &["hanger", r"spring\s*hanger", "clamp"]),
    ("PipeFitting", &[r"pipe\s*fitting", "fitting", "elbow", r"tee\b", "reducer"]),
    ("Flange", &["flange"]),
    ("ProcessUnit", &[r"process\s*unit"]),
    ("Conduit", &["conduit", "wireway"]),
    ("Assembly", &["assembly"]),
    ("Brace", &["brace", "bracing"]),
    ("GroutPad", &[r"grout\s*pad", "grout"]),
    ("Nozzle", &["nozzle"]),
    ("Slab", &["slab", "floor"]),
    ("Wall", &["wall", "partition"]),
    ("Column", &["column", "pillar"]),
    ("Beam", &["beam", "girder", "joist"]),
    ("Pipe", &["pipe", "piping"]),
    ("Duct", &["duct"]),
    ("CableTray", &[r"cable\s*tray", "cable"]),
    ("Insulation", &["insulation"]),
    ("Valve", &["valve"]),
    ("Pump", &["pump"]),
    ("Equipment", &["equipment", "tank", "vessel"]),
    ("Foundation", &["foundation", "footing"]),
    ("Railing", &["railing", "handrail"]),
    ("Stair", &["stair"]),
    ("Support", &["support"]),
    ("MemberPart", &["memberpart"]),
    ("Structural", &["structural"]),
    ("Aspect", &["aspect"]),
    ("Geometry", &["geometry"]),
];

/// Plant-code table for Navisworks display names. Patterns are literal
/// fragments; the first category with a fragment in the name wins.
const NAVIS_RULES: &[(&str, &[&str])] = &[
    ("Pipe", &["Pipe-", "Pipe ", "Piping"]),
    ("Valve", &["Valve-", "Valve ", "VG3-", "VC", "VL"]),
    (
        "PipeFitting",
        &[
            "Direction Change",
            "Eccentric",
            "Concentric",
            "Weldolet",
            "Sockolet",
            "Nipple",
            "Flange-",
            "Elbow",
        ],
    ),
    (
        "Equipment",
        &[
            "Tank",
            "Pump",
            "Vessel",
            "Exchanger",
            "Reactor",
            "Compressor",
            "40E-",
            "40V-",
            "41P-",
            "41V-",
        ],
    ),
    ("Hanger", &["Hgr", "Anvil_", "ASSY_", "Support"]),
    ("Structure", &["Beam_", "Column_", "Member", "Slab", "Foundation"]),
    ("Conduit", &["Conduit", "COND-", "Cable"]),
    ("Instrument", &["Instrument", "Gauge", "Meter", "Sensor"]),
    ("Insulation", &["Insulation"]),
    ("Ladder", &["Ladder", "Stair", "Platform", "Walkway"]),
    ("Nozzle", &["Nozzle", "STNoz"]),
];

/// Whether a category name can be used as an IRI local name.
pub fn is_valid_category(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl RuleSet {
    /// Compile a rule table. Patterns are matched case-insensitively.
    pub fn from_specs(specs: &[RuleSpec]) -> ConfigResult<Self> {
        let mut rules = Vec::with_capacity(specs.len());
        for spec in specs {
            if !is_valid_category(&spec.category) {
                return Err(ConfigError::InvalidCategory {
                    category: spec.category.clone(),
                });
            }
            let patterns = spec
                .patterns
                .iter()
                .map(|p| {
                    RegexBuilder::new(p)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| ConfigError::InvalidPattern {
                            category: spec.category.clone(),
                            pattern: p.clone(),
                            message: e.to_string(),
                        })
                })
                .collect::<ConfigResult<Vec<_>>>()?;
            rules.push(CategoryRule {
                category: spec.category.clone(),
                patterns,
            });
        }
        Ok(Self { rules })
    }

    /// The built-in rule table as specs, e.g. for writing a starter config.
    pub fn default_specs() -> Vec<RuleSpec> {
        specs(DEFAULT_RULES, |p| p.to_string())
    }

    /// The built-in Navisworks table as specs, fragments escaped as patterns.
    pub fn navis_default_specs() -> Vec<RuleSpec> {
        specs(NAVIS_RULES, regex::escape)
    }

    /// The built-in table for Navisworks display names.
    pub fn navis_default() -> Self {
        builtin(NAVIS_RULES, regex::escape)
    }

    /// Classify a display name.
    ///
    /// `None` or an empty name is [`UNKNOWN`]; a name no rule matches is [`OTHER`].
    pub fn classify(&self, name: Option<&str>) -> Category {
        self.classify_str(name).to_string()
    }

    /// Borrowing variant of [`classify`](Self::classify).
    pub fn classify_str(&self, name: Option<&str>) -> &str {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            return UNKNOWN;
        };
        self.rules
            .iter()
            .find(|rule| rule.patterns.iter().any(|re| re.is_match(name)))
            .map_or(OTHER, |rule| rule.category.as_str())
    }

    /// Category names in rule order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.category.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        builtin(DEFAULT_RULES, |p| p.to_string())
    }
}

fn specs(table: &[(&str, &[&str])], pattern: fn(&str) -> String) -> Vec<RuleSpec> {
    table
        .iter()
        .map(|(category, patterns)| RuleSpec {
            category: category.to_string(),
            patterns: patterns.iter().map(|p| pattern(p)).collect(),
        })
        .collect()
}

fn builtin(table: &[(&str, &[&str])], pattern: fn(&str) -> String) -> RuleSet {
    let rules = table
        .iter()
        .map(|(category, patterns)| CategoryRule {
            category: category.to_string(),
            patterns: patterns
                .iter()
                .filter_map(|p| RegexBuilder::new(&pattern(p)).case_insensitive(true).build().ok())
                .collect(),
        })
        .collect();
    RuleSet { rules }
}
