// src/profiles/mapping.rs

//! Per-company mapping tables: which source section feeds which template
//! section, which template sections are dropped, and the fixed reagent rows.

use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::utils::error::ProfileError;

// --- Built-in table ---

const BUILTIN_PROFILES: &str = r#"{
  "profiles": [
    {
      "key": "boster",
      "filename_prefixes": ["EK"],
      "brand_markers": ["Boster", "PicoKine"],
      "section_map": [
        { "target": "INTENDED USE", "source": "Assay Principle", "regex": true, "paragraph": 0 },
        { "target": "BACKGROUND", "source": "Background on", "regex": true },
        { "target": "ASSAY PRINCIPLE", "source": "Assay Principle", "regex": true, "paragraph": -1 },
        { "target": "OVERVIEW", "source": "Overview" },
        { "target": "TECHNICAL DETAILS", "source": "Technical Details" },
        { "target": "STANDARD CURVE EXAMPLE", "source": "Standard Curve Example$", "regex": true },
        { "target": "INTRA/INTER-ASSAY VARIABILITY", "source": "(Intra|Inter).*Variability", "regex": true,
          "table_headers": ["Intra-Assay", "Inter-Assay"] },
        { "target": "REPRODUCIBILITY", "source": "Reproducibility", "table_headers": ["Reproducibility"] },
        { "target": "REAGENT PREPARATION AND STORAGE", "source": "Reagent Preparation", "special_handling": true,
          "table_headers": ["Component", "Preparation", "Storage"] }
      ],
      "remove_sections": ["Dilution of Standard", "Sample Collection Notes", "Sample Activation"],
      "reagent_rows": [
        ["Microplate", "Equilibrate at room temperature for 60 min", "Store at 4°C"],
        ["Samples", "Dilute 1:50 in provided buffer", "Aliquot and store at -80°C"]
      ]
    },
    {
      "key": "red_dot",
      "filename_prefixes": ["RDR"],
      "brand_markers": ["Red Dot", "RedDot"],
      "section_map": [
        { "target": "INTENDED USE", "source": "Assay Principle", "regex": true, "paragraph": 0 },
        { "target": "BACKGROUND", "source": "Background on", "regex": true },
        { "target": "ASSAY PRINCIPLE", "source": "Assay Principle", "regex": true, "paragraph": -1 },
        { "target": "OVERVIEW", "source": "Overview" },
        { "target": "TECHNICAL DETAILS", "source": "Technical Details" },
        { "target": "STANDARD CURVE EXAMPLE", "source": "Standard Curve Example$", "regex": true },
        { "target": "INTRA/INTER-ASSAY VARIABILITY", "source": "(Intra|Inter).*Variability", "regex": true,
          "table_headers": ["Intra-Assay", "Inter-Assay"] },
        { "target": "REPRODUCIBILITY", "source": "Reproducibility", "table_headers": ["Reproducibility"] }
      ],
      "remove_sections": ["Dilution of Standard", "Sample Collection Notes", "Sample Activation"],
      "reagent_rows": [
        ["Microplate", "Equilibrate to room temperature", "Store at 4°C"],
        ["Samples", "Dilute 1:100 in assay buffer", "Store at -20°C"]
      ]
    }
  ]
}"#;

static BUILTIN: Lazy<ProfileTable> = Lazy::new(|| {
    ProfileTable::from_json(BUILTIN_PROFILES).expect("Failed to compile built-in company profiles")
});

// --- Types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyKey {
    Boster,
    RedDot,
}

impl CompanyKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyKey::Boster => "boster",
            CompanyKey::RedDot => "red_dot",
        }
    }
}

impl fmt::Display for CompanyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rule finds its source section heading.
#[derive(Debug, Clone)]
pub enum SourcePattern {
    /// Exact string equality.
    Literal(String),
    /// Case-insensitive search anywhere in the heading.
    Regex(Regex),
}

impl SourcePattern {
    pub fn matches(&self, heading: &str) -> bool {
        match self {
            SourcePattern::Literal(text) => heading == text,
            SourcePattern::Regex(re) => re.is_match(heading),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SourcePattern::Literal(text) => text,
            SourcePattern::Regex(re) => re.as_str(),
        }
    }
}

/// Picks a single paragraph out of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphSelector {
    First,
    Last,
    /// Zero-based from the start, or from the end when negative (-1 = last).
    At(isize),
}

impl ParagraphSelector {
    pub fn from_index(index: isize) -> Self {
        match index {
            0 => ParagraphSelector::First,
            -1 => ParagraphSelector::Last,
            other => ParagraphSelector::At(other),
        }
    }

    /// Concrete index into a list of `len` items, `None` when out of range.
    pub fn resolve(&self, len: usize) -> Option<usize> {
        let index = match self {
            ParagraphSelector::First => 0,
            ParagraphSelector::Last => -1,
            ParagraphSelector::At(i) => *i,
        };
        if index >= 0 {
            let index = index as usize;
            (index < len).then_some(index)
        } else {
            len.checked_sub(index.unsigned_abs())
        }
    }
}

#[derive(Debug, Clone)]
pub struct SectionRule {
    /// Template heading text.
    pub target: String,
    pub source: SourcePattern,
    pub selector: Option<ParagraphSelector>,
    /// Keywords expected in the paired source table's header row.
    pub table_headers: Vec<String>,
    /// Reagent preparation handling (synthetic rows, no italics).
    pub reagent_table: bool,
}

impl SectionRule {
    pub fn targets(&self, heading: &str) -> bool {
        self.target.eq_ignore_ascii_case(heading.trim())
    }
}

#[derive(Debug, Clone)]
pub struct CompanyProfile {
    pub key: CompanyKey,
    pub filename_prefixes: Vec<String>,
    pub brand_markers: Vec<String>,
    pub rules: Vec<SectionRule>,
    pub remove_sections: Vec<String>,
    pub reagent_rows: Vec<Vec<String>>,
}

impl CompanyProfile {
    pub fn rule_for_target(&self, heading: &str) -> Option<&SectionRule> {
        self.rules.iter().find(|rule| rule.targets(heading))
    }

    pub fn rule_targeting(&self, target: &str) -> Option<&SectionRule> {
        self.rules.iter().find(|rule| rule.target == target)
    }
}

/// All configured profiles; the first one is the fallback.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    profiles: Vec<CompanyProfile>,
}

impl ProfileTable {
    pub fn builtin() -> &'static ProfileTable {
        &BUILTIN
    }

    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let text = std::fs::read_to_string(path)?;
        let table = Self::from_json(&text)?;
        tracing::info!(
            "Loaded {} company profiles from {}",
            table.profiles.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_json(text: &str) -> Result<Self, ProfileError> {
        let raw: RawTable = serde_json::from_str(text)?;
        if raw.profiles.is_empty() {
            return Err(ProfileError::Empty);
        }
        let profiles = raw
            .profiles
            .into_iter()
            .map(RawProfile::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { profiles })
    }

    pub fn get(&self, key: CompanyKey) -> Option<&CompanyProfile> {
        self.profiles.iter().find(|p| p.key == key)
    }

    pub fn default_profile(&self) -> &CompanyProfile {
        // from_json rejects empty tables
        &self.profiles[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompanyProfile> {
        self.profiles.iter()
    }
}

// --- JSON shape ---

#[derive(Debug, Deserialize)]
struct RawTable {
    profiles: Vec<RawProfile>,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    key: CompanyKey,
    #[serde(default)]
    filename_prefixes: Vec<String>,
    #[serde(default)]
    brand_markers: Vec<String>,
    section_map: Vec<RawRule>,
    #[serde(default)]
    remove_sections: Vec<String>,
    #[serde(default)]
    reagent_rows: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    target: String,
    source: String,
    #[serde(default)]
    regex: bool,
    paragraph: Option<isize>,
    #[serde(default)]
    table_headers: Vec<String>,
    #[serde(default)]
    special_handling: bool,
}

impl RawProfile {
    fn compile(self) -> Result<CompanyProfile, ProfileError> {
        let rules = self
            .section_map
            .into_iter()
            .map(RawRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompanyProfile {
            key: self.key,
            filename_prefixes: self.filename_prefixes,
            brand_markers: self.brand_markers,
            rules,
            remove_sections: self.remove_sections,
            reagent_rows: self.reagent_rows,
        })
    }
}

impl RawRule {
    fn compile(self) -> Result<SectionRule, ProfileError> {
        let source = if self.regex {
            let re = RegexBuilder::new(&self.source)
                .case_insensitive(true)
                .build()
                .map_err(|source| ProfileError::InvalidPattern {
                    target: self.target.clone(),
                    source,
                })?;
            SourcePattern::Regex(re)
        } else {
            SourcePattern::Literal(self.source)
        };
        Ok(SectionRule {
            target: self.target,
            source,
            selector: self.paragraph.map(ParagraphSelector::from_index),
            table_headers: self.table_headers,
            reagent_table: self.special_handling,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_compiles_in_order() {
        let table = ProfileTable::builtin();
        let keys: Vec<CompanyKey> = table.iter().map(|p| p.key).collect();
        assert_eq!(keys, vec![CompanyKey::Boster, CompanyKey::RedDot]);
        assert_eq!(table.default_profile().key, CompanyKey::Boster);

        let boster = table.get(CompanyKey::Boster).unwrap();
        assert_eq!(boster.reagent_rows.len(), 2);
        let reagent = boster
            .rule_for_target("Reagent Preparation and Storage")
            .unwrap();
        assert!(reagent.reagent_table);
        assert_eq!(reagent.table_headers, vec!["Component", "Preparation", "Storage"]);
        assert!(table
            .get(CompanyKey::RedDot)
            .unwrap()
            .rule_for_target("REAGENT PREPARATION AND STORAGE")
            .is_none());
    }

    #[test]
    fn selectors_resolve_with_negative_indices() {
        assert_eq!(ParagraphSelector::from_index(0).resolve(3), Some(0));
        assert_eq!(ParagraphSelector::from_index(-1).resolve(3), Some(2));
        assert_eq!(ParagraphSelector::At(-3).resolve(3), Some(0));
        assert_eq!(ParagraphSelector::At(-4).resolve(3), None);
        assert_eq!(ParagraphSelector::At(3).resolve(3), None);
        assert_eq!(ParagraphSelector::Last.resolve(0), None);
    }

    #[test]
    fn regex_patterns_are_case_insensitive_literals_are_exact() {
        let boster = ProfileTable::builtin().get(CompanyKey::Boster).unwrap();
        let variability = boster.rule_targeting("INTRA/INTER-ASSAY VARIABILITY").unwrap();
        assert!(variability.source.matches("intra-assay variability"));
        let overview = boster.rule_targeting("OVERVIEW").unwrap();
        assert!(overview.source.matches("Overview"));
        assert!(!overview.source.matches("overview"));
        let curve = boster.rule_targeting("STANDARD CURVE EXAMPLE").unwrap();
        assert!(curve.source.matches("Typical Standard Curve Example"));
        assert!(!curve.source.matches("Standard Curve Example (continued)"));
    }

    #[test]
    fn invalid_json_profiles_are_rejected() {
        assert!(matches!(
            ProfileTable::from_json(r#"{"profiles": []}"#),
            Err(ProfileError::Empty)
        ));
        let bad_regex = r#"{"profiles": [{"key": "boster", "section_map": [
            {"target": "X", "source": "(unclosed", "regex": true}]}]}"#;
        assert!(matches!(
            ProfileTable::from_json(bad_regex),
            Err(ProfileError::InvalidPattern { .. })
        ));
        assert!(matches!(
            ProfileTable::from_json("not json"),
            Err(ProfileError::Parse(_))
        ));
    }

    #[test]
    fn custom_profile_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(
            &path,
            r#"{"profiles": [{"key": "red_dot", "section_map": [
                {"target": "OVERVIEW", "source": "Summary", "paragraph": 1}]}]}"#,
        )
        .unwrap();
        let table = ProfileTable::load(&path).unwrap();
        let profile = table.default_profile();
        assert_eq!(profile.key, CompanyKey::RedDot);
        assert_eq!(profile.rules[0].selector, Some(ParagraphSelector::At(1)));
        assert!(profile.remove_sections.is_empty());
    }
}
