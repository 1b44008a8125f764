// src/profiles/company.rs

use serde::Serialize;

use super::mapping::{CompanyKey, ProfileTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    FilenamePrefix,
    ContentMarker,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub company: CompanyKey,
    pub method: DetectionMethod,
}

/// Works out which company produced a source document.
///
/// Filename prefixes win over brand markers found in the raw part bytes;
/// with neither, the table's first profile is used.
pub fn detect_company(table: &ProfileTable, file_name: &str, parts: &[&[u8]]) -> Detection {
    for profile in table.iter() {
        if profile
            .filename_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && file_name.starts_with(prefix.as_str()))
        {
            tracing::debug!("Detected {} from filename '{}'", profile.key, file_name);
            return Detection {
                company: profile.key,
                method: DetectionMethod::FilenamePrefix,
            };
        }
    }

    let lowered: Vec<Vec<u8>> = parts.iter().map(|bytes| bytes.to_ascii_lowercase()).collect();
    for profile in table.iter() {
        for marker in &profile.brand_markers {
            let needle = marker.to_ascii_lowercase();
            if lowered.iter().any(|hay| contains_bytes(hay, needle.as_bytes())) {
                tracing::debug!("Detected {} from brand marker '{}'", profile.key, marker);
                return Detection {
                    company: profile.key,
                    method: DetectionMethod::ContentMarker,
                };
            }
        }
    }

    let company = table.default_profile().key;
    tracing::warn!(
        "Could not identify company for '{}', defaulting to {}",
        file_name,
        company
    );
    Detection {
        company,
        method: DetectionMethod::Fallback,
    }
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_prefix_takes_priority() {
        let table = ProfileTable::builtin();
        let found = detect_company(table, "RDR0042 kit.docx", &[b"Boster Biological"]);
        assert_eq!(found.company, CompanyKey::RedDot);
        assert_eq!(found.method, DetectionMethod::FilenamePrefix);

        let found = detect_company(table, "EK0001.docx", &[]);
        assert_eq!(found.company, CompanyKey::Boster);
    }

    #[test]
    fn brand_markers_match_case_insensitively() {
        let table = ProfileTable::builtin();
        let found = detect_company(table, "kit.docx", &[b"<w:t>made by REDDOT labs</w:t>"]);
        assert_eq!(found.company, CompanyKey::RedDot);
        assert_eq!(found.method, DetectionMethod::ContentMarker);
    }

    #[test]
    fn unknown_documents_fall_back_to_first_profile() {
        let table = ProfileTable::builtin();
        let found = detect_company(table, "kit.docx", &[b"<w:t>nothing here</w:t>"]);
        assert_eq!(found.company, CompanyKey::Boster);
        assert_eq!(found.method, DetectionMethod::Fallback);
    }
}
