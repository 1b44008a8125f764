// src/docx/fixture.rs

//! In-memory `.docx` builder for tests.

use super::media::inline_picture_xml;
use super::package::Package;
use super::xml::{escape_text, PKG_REL_NS, R_NS, W_NS};

const STYLES: &str = concat!(
    "<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\"><w:name w:val=\"Normal\"/></w:style>",
    "<w:style w:type=\"paragraph\" w:styleId=\"Heading1\"><w:name w:val=\"heading 1\"/><w:basedOn w:val=\"Normal\"/></w:style>",
    "<w:style w:type=\"paragraph\" w:styleId=\"Heading2\"><w:name w:val=\"heading 2\"/><w:basedOn w:val=\"Normal\"/></w:style>",
    "<w:style w:type=\"paragraph\" w:styleId=\"ListParagraph\"><w:name w:val=\"List Paragraph\"/></w:style>",
);

pub fn heading(level: u8, text: &str) -> String {
    format!(
        "<w:p><w:pPr><w:pStyle w:val=\"Heading{level}\"/></w:pPr><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
        escape_text(text)
    )
}

pub fn para(text: &str) -> String {
    runs_para(&[(text, false, false)])
}

/// Paragraph built from `(text, bold, italic)` runs.
pub fn runs_para(runs: &[(&str, bool, bool)]) -> String {
    let mut xml = String::from("<w:p>");
    for (text, bold, italic) in runs {
        xml.push_str("<w:r>");
        if *bold || *italic {
            xml.push_str("<w:rPr>");
            if *bold {
                xml.push_str("<w:b/>");
            }
            if *italic {
                xml.push_str("<w:i/>");
            }
            xml.push_str("</w:rPr>");
        }
        xml.push_str(&format!(
            "<w:t xml:space=\"preserve\">{}</w:t></w:r>",
            escape_text(text)
        ));
    }
    xml.push_str("</w:p>");
    xml
}

pub fn table(rows: &[&[&str]]) -> String {
    let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut xml = String::from("<w:tbl><w:tblPr><w:tblW w:w=\"0\" w:type=\"auto\"/></w:tblPr><w:tblGrid>");
    for _ in 0..columns {
        xml.push_str("<w:gridCol w:w=\"2000\"/>");
    }
    xml.push_str("</w:tblGrid>");
    for row in rows {
        xml.push_str("<w:tr>");
        for cell in row.iter() {
            xml.push_str("<w:tc><w:tcPr><w:tcW w:w=\"2000\" w:type=\"dxa\"/></w:tcPr>");
            xml.push_str(&para(cell));
            xml.push_str("</w:tc>");
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

pub fn picture_para(rel_id: &str, cx: u64, cy: u64) -> String {
    format!(
        "<w:p><w:r>{}</w:r></w:p>",
        inline_picture_xml(rel_id, cx, cy, 1, "Picture 1")
    )
}

#[derive(Debug, Default)]
pub struct DocBuilder {
    blocks: Vec<String>,
    header: Option<String>,
    footer: Option<String>,
    images: Vec<(String, Vec<u8>)>,
}

impl DocBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(mut self, xml: String) -> Self {
        self.blocks.push(xml);
        self
    }

    pub fn header(mut self, inner: &str) -> Self {
        self.header = Some(inner.to_string());
        self
    }

    pub fn footer(mut self, inner: &str) -> Self {
        self.footer = Some(inner.to_string());
        self
    }

    /// Registers `word/media/<rel_id>.png` behind relationship `rel_id`.
    pub fn image(mut self, rel_id: &str, bytes: Vec<u8>) -> Self {
        self.images.push((rel_id.to_string(), bytes));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut package = Package::default();
        package.set(
            "[Content_Types].xml",
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
                "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
                "<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>",
                "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
                "<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>",
                "</Types>"
            )
            .as_bytes()
            .to_vec(),
        );
        package.set(
            "_rels/.rels",
            format!(
                "<Relationships xmlns=\"{PKG_REL_NS}\"><Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/></Relationships>"
            )
            .into_bytes(),
        );
        package.set(
            "word/document.xml",
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:document xmlns:w=\"{W_NS}\" xmlns:r=\"{R_NS}\"><w:body>{}<w:sectPr><w:pgSz w:w=\"12240\" w:h=\"15840\"/><w:cols w:space=\"720\" w:num=\"2\"/></w:sectPr></w:body></w:document>",
                self.blocks.concat()
            )
            .into_bytes(),
        );
        package.set(
            "word/styles.xml",
            format!("<w:styles xmlns:w=\"{W_NS}\">{STYLES}</w:styles>").into_bytes(),
        );

        let mut rels = String::new();
        for (rel_id, bytes) in &self.images {
            rels.push_str(&format!(
                "<Relationship Id=\"{rel_id}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/image\" Target=\"media/{rel_id}.png\"/>"
            ));
            package.set(&format!("word/media/{rel_id}.png"), bytes.clone());
        }
        package.set(
            "word/_rels/document.xml.rels",
            format!("<Relationships xmlns=\"{PKG_REL_NS}\">{rels}</Relationships>").into_bytes(),
        );

        if let Some(inner) = self.header {
            package.set(
                "word/header1.xml",
                format!("<w:hdr xmlns:w=\"{W_NS}\">{inner}</w:hdr>").into_bytes(),
            );
        }
        if let Some(inner) = self.footer {
            package.set(
                "word/footer1.xml",
                format!("<w:ftr xmlns:w=\"{W_NS}\">{inner}</w:ftr>").into_bytes(),
            );
        }

        package.to_bytes().expect("fixture package")
    }
}
