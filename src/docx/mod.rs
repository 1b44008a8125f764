// src/docx/mod.rs

//! Minimal DOCX document model: read a package, expose its stories as block
//! lists, write the lists back.

pub mod media;
pub mod model;
pub mod package;
pub mod parse;
pub mod styles;
pub mod xml;

#[cfg(test)]
pub mod fixture;

use std::path::Path;

use roxmltree::Document;

pub use model::{Alignment, Block, Cell, Paragraph, Run, Table};
pub use package::Package;
pub use styles::{BodyFormat, StyleSheet};

use crate::utils::error::DocxError;
use xml::{is_w, split_element, source_of};

const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// One XML story: the text before the container's children, the children as
/// blocks, and the text after them.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    prefix: String,
    pub blocks: Vec<Block>,
    suffix: String,
}

impl Part {
    /// Parses `xml`, using the first `w:body` element as container when
    /// present, otherwise the root element (`w:hdr`, `w:ftr`).
    pub fn parse(name: &str, xml: &str) -> Result<Self, DocxError> {
        let doc = Document::parse(xml).map_err(|source| DocxError::Xml {
            part: name.to_string(),
            source,
        })?;
        let root = doc.root_element();
        let container = root
            .children()
            .find(|n| is_w(*n, "body"))
            .unwrap_or(root);

        let range = container.range();
        let raw = source_of(xml, container);
        let span = split_element(raw)
            .ok_or_else(|| DocxError::Malformed(format!("{name}: unreadable container element")))?;
        let (prefix, suffix) = match span.inner {
            Some(inner) => {
                let inner_start = range.start + span.open_len;
                let inner_end = inner_start + inner.len();
                (xml[..inner_start].to_string(), xml[inner_end..].to_string())
            }
            None => (
                format!("{}<{}{}>", &xml[..range.start], span.qname, span.attrs),
                format!("</{}>{}", span.qname, &xml[range.end..]),
            ),
        };

        Ok(Self {
            name: name.to_string(),
            prefix,
            blocks: parse::parse_blocks(xml, container),
            suffix,
        })
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(self.prefix.len() + self.suffix.len() + 4096);
        xml.push_str(&self.prefix);
        for block in &self.blocks {
            xml.push_str(&block.to_xml());
        }
        xml.push_str(&self.suffix);
        xml
    }

    /// Calls `f` on every paragraph of the story, table cells included.
    pub fn for_each_paragraph_mut(&mut self, f: &mut dyn FnMut(&mut Paragraph)) {
        visit_blocks_mut(&mut self.blocks, f);
    }
}

fn visit_blocks_mut(blocks: &mut [Block], f: &mut dyn FnMut(&mut Paragraph)) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => f(p),
            Block::Table(t) => {
                for cell in t.cells_mut() {
                    visit_blocks_mut(&mut cell.blocks, f);
                }
            }
            _ => {}
        }
    }
}

/// An opened `.docx` file.
#[derive(Debug, Clone)]
pub struct WordDocument {
    package: Package,
    pub body: Part,
    pub styles: StyleSheet,
    /// Header and footer stories.
    pub margins: Vec<Part>,
}

impl WordDocument {
    pub fn open(path: &Path) -> Result<Self, DocxError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        let package = Package::from_bytes(bytes)?;
        let main = main_part_name(&package)?;
        let xml = package
            .get_str(&main)?
            .ok_or_else(|| DocxError::MissingPart(main.clone()))?;
        let body = Part::parse(&main, &xml)?;
        let styles = StyleSheet::parse(package.get_str(styles::STYLES_PART)?)?;

        let mut margins = Vec::new();
        let names: Vec<String> = package
            .part_names()
            .filter(|n| is_margin_part(n))
            .map(str::to_string)
            .collect();
        for name in names {
            let Some(xml) = package.get_str(&name)? else {
                continue;
            };
            match Part::parse(&name, &xml) {
                Ok(part) => margins.push(part),
                // Left untouched in the package.
                Err(e) => tracing::warn!("Skipping unreadable part {}: {}", name, e),
            }
        }

        tracing::debug!(
            "Opened document: {} body blocks, {} header/footer parts",
            body.blocks.len(),
            margins.len()
        );
        Ok(Self {
            package,
            body,
            styles,
            margins,
        })
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    /// Raw bytes of the main document part as it was read.
    pub fn main_part_bytes(&self) -> &[u8] {
        self.package.get(&self.body.name).unwrap_or_default()
    }

    /// Calls `f` on every paragraph: body, tables, headers and footers.
    pub fn for_each_paragraph_mut(&mut self, f: &mut dyn FnMut(&mut Paragraph)) {
        self.body.for_each_paragraph_mut(f);
        for part in &mut self.margins {
            part.for_each_paragraph_mut(f);
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let mut package = self.package.clone();
        package.set(&self.body.name, self.body.to_xml().into_bytes());
        if let Some(styles) = self.styles.xml() {
            package.set(styles::STYLES_PART, styles.as_bytes().to_vec());
        }
        for part in &self.margins {
            package.set(&part.name, part.to_xml().into_bytes());
        }
        package.to_bytes()
    }
}

fn is_margin_part(name: &str) -> bool {
    let Some(file) = name.strip_prefix("word/") else {
        return false;
    };
    !file.contains('/')
        && (file.starts_with("header") || file.starts_with("footer"))
        && file.ends_with(".xml")
}

/// Main document part from `_rels/.rels`, falling back to `word/document.xml`.
fn main_part_name(package: &Package) -> Result<String, DocxError> {
    let Some(rels) = package.get_str("_rels/.rels")? else {
        return Ok(DEFAULT_MAIN_PART.to_string());
    };
    let Ok(doc) = Document::parse(&rels) else {
        tracing::warn!("Unreadable _rels/.rels, assuming {}", DEFAULT_MAIN_PART);
        return Ok(DEFAULT_MAIN_PART.to_string());
    };
    let target = doc
        .root_element()
        .children()
        .filter(|n| n.is_element())
        .find(|n| {
            n.attribute("Type")
                .is_some_and(|t| t.ends_with("/officeDocument"))
        })
        .and_then(|n| n.attribute("Target"))
        .map(|t| t.trim_start_matches('/').to_string());
    Ok(target.unwrap_or_else(|| DEFAULT_MAIN_PART.to_string()))
}
