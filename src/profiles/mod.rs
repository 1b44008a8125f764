// src/profiles/mod.rs
pub mod company;
pub mod mapping;

pub use company::{detect_company, Detection, DetectionMethod};
pub use mapping::{
    CompanyKey, CompanyProfile, ParagraphSelector, ProfileTable, SectionRule, SourcePattern,
};
