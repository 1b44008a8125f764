// src/docx/styles.rs

//! Style catalog (`word/styles.xml`): id → display name lookups and edits to
//! the default paragraph style.

use std::collections::HashMap;

use roxmltree::{Document, Node};

use super::xml::{is_w, w_attr, w_child, PropertyBag, PPR_ORDER, RPR_ORDER, STYLE_ORDER};
use crate::utils::error::DocxError;

pub const STYLES_PART: &str = "word/styles.xml";

/// Body font settings applied to the default paragraph style.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyFormat {
    pub font: String,
    /// Size in points.
    pub size_pt: f32,
    /// RGB hex, e.g. `000000`.
    pub color: String,
    /// Line spacing multiple, e.g. 1.15.
    pub line_spacing: f32,
}

#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    xml: Option<String>,
    names: HashMap<String, String>,
    default_paragraph: Option<String>,
}

impl StyleSheet {
    pub fn parse(xml: Option<String>) -> Result<Self, DocxError> {
        let Some(xml) = xml else {
            tracing::debug!("Package has no style part");
            return Ok(Self::default());
        };
        let mut names = HashMap::new();
        let mut default_paragraph = None;
        {
            let doc = Document::parse(&xml).map_err(|source| DocxError::Xml {
                part: STYLES_PART.to_string(),
                source,
            })?;
            for style in doc.root_element().children().filter(|n| is_w(*n, "style")) {
                let Some(id) = w_attr(style, "styleId") else {
                    continue;
                };
                let name = w_child(style, "name")
                    .and_then(|n| w_attr(n, "val"))
                    .unwrap_or(id);
                names.insert(id.to_string(), name.to_string());
                if is_default_paragraph(style) {
                    default_paragraph = Some(id.to_string());
                }
            }
        }
        Ok(Self {
            xml: Some(xml),
            names,
            default_paragraph,
        })
    }

    pub fn xml(&self) -> Option<&str> {
        self.xml.as_deref()
    }

    /// Display name of a paragraph style.
    ///
    /// No id means the default paragraph style. An id missing from the catalog
    /// resolves to the id itself so that `Heading1` still reads as a heading.
    pub fn display_name(&self, style_id: Option<&str>) -> String {
        match style_id {
            None => self
                .default_paragraph
                .as_deref()
                .and_then(|id| self.names.get(id))
                .cloned()
                .unwrap_or_else(|| "Normal".to_string()),
            Some(id) => match self.names.get(id) {
                Some(name) => name.clone(),
                None => {
                    tracing::debug!("Style id '{}' not in style catalog", id);
                    id.to_string()
                }
            },
        }
    }

    /// Rewrites the default paragraph style with `format`. Returns false when
    /// there is no such style to edit.
    pub fn apply_body_format(&mut self, format: &BodyFormat) -> Result<bool, DocxError> {
        let Some(xml) = self.xml.as_deref() else {
            return Ok(false);
        };
        let rewritten = {
            let doc = Document::parse(xml).map_err(|source| DocxError::Xml {
                part: STYLES_PART.to_string(),
                source,
            })?;
            let Some(style) = doc
                .root_element()
                .children()
                .filter(|n| is_w(*n, "style"))
                .find(|n| is_normal(*n))
            else {
                return Ok(false);
            };

            let mut ppr = match w_child(style, "pPr") {
                Some(node) => PropertyBag::parse(xml, node, PPR_ORDER),
                None => PropertyBag::new("w:pPr", PPR_ORDER),
            };
            let mut rpr = match w_child(style, "rPr") {
                Some(node) => PropertyBag::parse(xml, node, RPR_ORDER),
                None => PropertyBag::new("w:rPr", RPR_ORDER),
            };

            let line = ((240.0 * format.line_spacing).round() as u32).to_string();
            ppr.merge_empty("spacing", &[("line", &line), ("lineRule", "auto")], &[]);

            let size = ((format.size_pt * 2.0).round() as u32).to_string();
            rpr.merge_empty(
                "rFonts",
                &[("ascii", &format.font), ("hAnsi", &format.font)],
                &["asciiTheme", "hAnsiTheme"],
            );
            rpr.set_empty("color", &[("val", &format.color)]);
            rpr.set_empty("sz", &[("val", &size)]);
            rpr.set_empty("szCs", &[("val", &size)]);

            let mut bag = PropertyBag::parse(xml, style, STYLE_ORDER);
            bag.set("pPr", ppr.to_xml_always(), Vec::new());
            bag.set("rPr", rpr.to_xml_always(), Vec::new());

            let range = style.range();
            format!("{}{}{}", &xml[..range.start], bag.to_xml(), &xml[range.end..])
        };
        self.xml = Some(rewritten);
        Ok(true)
    }
}

fn is_default_paragraph(style: Node) -> bool {
    w_attr(style, "type") == Some("paragraph")
        && matches!(w_attr(style, "default"), Some("1") | Some("true") | Some("on"))
}

fn is_normal(style: Node) -> bool {
    if w_attr(style, "type") != Some("paragraph") {
        return false;
    }
    let named_normal = w_child(style, "name")
        .and_then(|n| w_attr(n, "val"))
        .is_some_and(|name| name.eq_ignore_ascii_case("normal"));
    named_normal || is_default_paragraph(style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::xml::W_NS;

    fn styles() -> String {
        format!(
            concat!(
                "<w:styles xmlns:w=\"{}\">",
                "<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\">",
                "<w:name w:val=\"Normal\"/><w:qFormat/>",
                "<w:pPr><w:spacing w:after=\"160\" w:line=\"259\" w:lineRule=\"auto\"/></w:pPr>",
                "<w:rPr><w:rFonts w:asciiTheme=\"minorHAnsi\" w:eastAsia=\"SimSun\"/></w:rPr>",
                "</w:style>",
                "<w:style w:type=\"paragraph\" w:styleId=\"Heading1\">",
                "<w:name w:val=\"heading 1\"/><w:basedOn w:val=\"Normal\"/></w:style>",
                "</w:styles>"
            ),
            W_NS
        )
    }

    #[test]
    fn display_names() {
        let sheet = StyleSheet::parse(Some(styles())).unwrap();
        assert_eq!(sheet.display_name(Some("Heading1")), "heading 1");
        assert_eq!(sheet.display_name(None), "Normal");
        assert_eq!(sheet.display_name(Some("Heading2")), "Heading2");
    }

    #[test]
    fn body_format_rewrites_normal_only() {
        let mut sheet = StyleSheet::parse(Some(styles())).unwrap();
        let applied = sheet
            .apply_body_format(&BodyFormat {
                font: "Calibri".into(),
                size_pt: 11.0,
                color: "000000".into(),
                line_spacing: 1.15,
            })
            .unwrap();
        assert!(applied);

        let xml = sheet.xml().unwrap();
        assert!(xml.contains(
            "<w:spacing w:after=\"160\" w:line=\"276\" w:lineRule=\"auto\"/>"
        ));
        assert!(xml.contains(
            "<w:rFonts w:eastAsia=\"SimSun\" w:ascii=\"Calibri\" w:hAnsi=\"Calibri\"/>"
        ));
        assert!(xml.contains("<w:sz w:val=\"22\"/>"));
        assert!(xml.contains("<w:color w:val=\"000000\"/>"));
        // Heading style untouched and still parseable.
        assert!(xml.contains("<w:name w:val=\"heading 1\"/><w:basedOn w:val=\"Normal\"/>"));
        assert!(StyleSheet::parse(Some(xml.to_string())).is_ok());
    }

    #[test]
    fn missing_style_part_is_not_an_error() {
        let mut sheet = StyleSheet::parse(None).unwrap();
        assert_eq!(sheet.display_name(Some("Heading1")), "Heading1");
        let applied = sheet
            .apply_body_format(&BodyFormat {
                font: "Calibri".into(),
                size_pt: 11.0,
                color: "000000".into(),
                line_spacing: 1.15,
            })
            .unwrap();
        assert!(!applied);
    }
}
