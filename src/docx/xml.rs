// src/docx/xml.rs

//! Small helpers for reading WordprocessingML with `roxmltree` and writing it
//! back as strings.
//!
//! Writing never goes through a DOM: untouched elements are carried as the exact
//! source slice (`node.range()`), and the few property containers the converter
//! edits (`w:rPr`, `w:pPr`, `w:tcPr`, `w:tblPr`, `w:sectPr`, `w:style`) are held
//! as a [`PropertyBag`] of child slices that can be replaced one at a time while
//! keeping schema order.

use roxmltree::Node;

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
pub const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

// --- Schema order of the children we edit ---

pub const RPR_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect",
    "bdr", "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout",
    "specVanish", "oMath", "rPrChange",
];

pub const PPR_ORDER: &[&str] = &[
    "pStyle", "keepNext", "keepLines", "pageBreakBefore", "framePr", "widowControl", "numPr",
    "suppressLineNumbers", "pBdr", "shd", "tabs", "suppressAutoHyphens", "kinsoku", "wordWrap",
    "overflowPunct", "topLinePunct", "autoSpaceDE", "autoSpaceDN", "bidi", "adjustRightInd",
    "snapToGrid", "spacing", "ind", "contextualSpacing", "mirrorIndents", "suppressOverlap",
    "jc", "textDirection", "textAlignment", "textboxTightWrap", "outlineLvl", "divId",
    "cnfStyle", "rPr", "sectPr", "pPrChange",
];

pub const TCPR_ORDER: &[&str] = &[
    "cnfStyle", "tcW", "gridSpan", "hMerge", "vMerge", "tcBorders", "shd", "noWrap", "tcMar",
    "textDirection", "tcFitText", "vAlign", "hideMark", "headers", "cellIns", "cellDel",
    "cellMerge", "tcPrChange",
];

pub const TBLPR_ORDER: &[&str] = &[
    "tblStyle", "tblpPr", "tblOverlap", "bidiVisual", "tblStyleRowBandSize",
    "tblStyleColBandSize", "tblW", "jc", "tblCellSpacing", "tblInd", "tblBorders", "shd",
    "tblLayout", "tblCellMar", "tblLook", "tblCaption", "tblDescription", "tblPrChange",
];

pub const SECTPR_ORDER: &[&str] = &[
    "headerReference", "footerReference", "footnotePr", "endnotePr", "type", "pgSz", "pgMar",
    "paperSrc", "pgBorders", "lnNumType", "pgNumType", "cols", "formProt", "vAlign",
    "noEndnote", "titlePg", "textDirection", "bidi", "rtlGutter", "docGrid", "printerSettings",
    "sectPrChange",
];

pub const STYLE_ORDER: &[&str] = &[
    "name", "aliases", "basedOn", "next", "link", "autoRedefine", "hidden", "uiPriority",
    "semiHidden", "unhideWhenUsed", "qFormat", "locked", "personal", "personalCompose",
    "personalReply", "rsid", "pPr", "rPr", "tblPr", "trPr", "tcPr", "tblStylePr",
];

// --- Escaping ---

pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attr(value: &str) -> String {
    escape_text(value)
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// --- Node helpers ---

/// True when `node` is a WordprocessingML element with local name `name`.
pub fn is_w(node: Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace() == Some(W_NS)
}

pub fn w_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| is_w(*child, name))
}

pub fn w_attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute((W_NS, name))
}

/// The exact source text of an element.
pub fn source_of<'s>(src: &'s str, node: Node) -> &'s str {
    let range = node.range();
    if range.end <= src.len() && range.start <= range.end {
        &src[range]
    } else {
        ""
    }
}

/// Concatenated `w:t` text below `node`, with tabs and breaks rendered as
/// `\t` / `\n`.
pub fn descendant_text(node: Node) -> String {
    let mut text = String::new();
    for descendant in node.descendants().filter(|n| n.is_element()) {
        if is_w(descendant, "t") {
            text.push_str(descendant.text().unwrap_or(""));
        } else if is_w(descendant, "tab") && descendant.parent().is_some_and(|p| is_w(p, "r")) {
            text.push('\t');
        } else if is_w(descendant, "br") || is_w(descendant, "cr") {
            text.push('\n');
        }
    }
    text
}

/// WordprocessingML toggle semantics: present with no `w:val`, or with any
/// value other than `0`/`false`/`off`, means on.
pub fn toggle_value(value: Option<&str>) -> bool {
    !matches!(value, Some("0") | Some("false") | Some("off"))
}

// --- Raw element splitting ---

/// Byte offset just past the `>` closing the opening tag, ignoring `>` inside
/// quoted attribute values.
fn open_tag_end(raw: &str) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (index, byte) in raw.bytes().enumerate() {
        match quote {
            Some(q) if byte == q => quote = None,
            Some(_) => {}
            None if byte == b'"' || byte == b'\'' => quote = Some(byte),
            None if byte == b'>' => return Some(index + 1),
            None => {}
        }
    }
    None
}

/// Pieces of a raw element's source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSpan<'a> {
    /// Qualified tag name as written, e.g. `w:body`.
    pub qname: &'a str,
    /// Attribute text of the opening tag including its leading whitespace.
    pub attrs: &'a str,
    /// Text between the tags; `None` for a self-closing element.
    pub inner: Option<&'a str>,
    /// Length of the opening tag in bytes.
    pub open_len: usize,
}

pub fn split_element(raw: &str) -> Option<ElementSpan<'_>> {
    if !raw.starts_with('<') {
        return None;
    }
    let open_end = open_tag_end(raw)?;
    let open = &raw[1..open_end - 1];
    let self_closing = open.ends_with('/');
    let open = open.trim_end_matches('/');
    let name_end = open
        .find(|c: char| c.is_whitespace())
        .unwrap_or(open.len());
    let qname = &open[..name_end];
    let attrs = open[name_end..].trim_end();
    let inner = if self_closing {
        None
    } else {
        let close = raw.rfind("</")?;
        if close < open_end {
            return None;
        }
        Some(&raw[open_end..close])
    };
    Some(ElementSpan {
        qname,
        attrs,
        inner,
        open_len: open_end,
    })
}

/// Builds an empty `w:` element with `w:` attributes.
pub fn empty_element(name: &str, attrs: &[(&str, &str)]) -> String {
    let mut xml = format!("<w:{name}");
    for (key, value) in attrs {
        xml.push_str(&format!(" w:{key}=\"{}\"", escape_attr(value)));
    }
    xml.push_str("/>");
    xml
}

// --- PropertyBag ---

/// One child of a property container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Local name of the element.
    pub name: String,
    /// Source text of the element.
    pub xml: String,
    /// `w:` attributes by local name.
    pub attrs: Vec<(String, String)>,
}

impl Property {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// An editable property container such as `w:rPr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyBag {
    tag: String,
    open_attrs: String,
    entries: Vec<Property>,
    order: &'static [&'static str],
}

impl PropertyBag {
    pub fn new(tag: &str, order: &'static [&'static str]) -> Self {
        Self {
            tag: tag.to_string(),
            open_attrs: String::new(),
            entries: Vec::new(),
            order,
        }
    }

    pub fn parse(src: &str, node: Node, order: &'static [&'static str]) -> Self {
        let raw = source_of(src, node);
        let (tag, open_attrs) = match split_element(raw) {
            Some(span) => (span.qname.to_string(), span.attrs.to_string()),
            None => (format!("w:{}", node.tag_name().name()), String::new()),
        };
        let entries = node
            .children()
            .filter(|child| child.is_element())
            .map(|child| Property {
                name: child.tag_name().name().to_string(),
                xml: source_of(src, child).to_string(),
                attrs: child
                    .attributes()
                    .filter(|a| a.namespace() == Some(W_NS))
                    .map(|a| (a.name().to_string(), a.value().to_string()))
                    .collect(),
            })
            .collect();
        Self {
            tag,
            open_attrs,
            entries,
            order,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn attr(&self, name: &str, key: &str) -> Option<&str> {
        self.get(name).and_then(|p| p.attr(key))
    }

    /// Toggle property state: `None` when the element is absent.
    pub fn toggle(&self, name: &str) -> Option<bool> {
        self.get(name).map(|p| toggle_value(p.attr("val")))
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|e| e.name != name);
    }

    fn rank(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|n| *n == name)
    }

    /// Replaces every `name` child with `xml`, or inserts it at its schema
    /// position.
    pub fn set(&mut self, name: &str, xml: String, attrs: Vec<(String, String)>) {
        let property = Property {
            name: name.to_string(),
            xml,
            attrs,
        };
        if let Some(index) = self.entries.iter().position(|e| e.name == name) {
            self.entries[index] = property;
            let mut seen = false;
            self.entries.retain(|e| {
                if e.name != name {
                    return true;
                }
                let keep = !seen;
                seen = true;
                keep
            });
            return;
        }
        let index = match self.rank(name) {
            Some(rank) => {
                let after = self
                    .entries
                    .iter()
                    .position(|e| self.rank(&e.name).is_some_and(|r| r > rank));
                match after {
                    Some(index) => index,
                    None => self
                        .entries
                        .iter()
                        .rposition(|e| self.rank(&e.name).is_some())
                        .map(|i| i + 1)
                        .unwrap_or(0),
                }
            }
            None => self.entries.len(),
        };
        self.entries.insert(index, property);
    }

    /// Sets an empty `w:` element carrying exactly `attrs`.
    pub fn set_empty(&mut self, name: &str, attrs: &[(&str, &str)]) {
        let xml = empty_element(name, attrs);
        let attrs = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.set(name, xml, attrs);
    }

    /// Like [`set_empty`](Self::set_empty) but keeps the existing element's
    /// other attributes, minus `drop`.
    pub fn merge_empty(&mut self, name: &str, attrs: &[(&str, &str)], drop: &[&str]) {
        let mut merged: Vec<(String, String)> = self
            .get(name)
            .map(|p| p.attrs.clone())
            .unwrap_or_default();
        merged.retain(|(k, _)| !drop.contains(&k.as_str()) && !attrs.iter().any(|(n, _)| n == k));
        merged.extend(attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        let borrowed: Vec<(&str, &str)> = merged
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        self.set_empty(name, &borrowed);
    }

    pub fn to_xml(&self) -> String {
        if self.entries.is_empty() {
            if self.open_attrs.is_empty() {
                return String::new();
            }
            return format!("<{}{}/>", self.tag, self.open_attrs);
        }
        let mut xml = format!("<{}{}>", self.tag, self.open_attrs);
        for entry in &self.entries {
            xml.push_str(&entry.xml);
        }
        xml.push_str(&format!("</{}>", self.tag));
        xml
    }

    /// Like [`to_xml`](Self::to_xml) but always emits the element.
    pub fn to_xml_always(&self) -> String {
        let xml = self.to_xml();
        if xml.is_empty() {
            format!("<{}/>", self.tag)
        } else {
            xml
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(inner: &str) -> String {
        format!("<w:root xmlns:w=\"{W_NS}\">{inner}</w:root>")
    }

    #[test]
    fn split_element_handles_quoted_gt_and_self_closing() {
        let span = split_element("<w:t a=\"x>y\">hi</w:t>").unwrap();
        assert_eq!(span.qname, "w:t");
        assert_eq!(span.attrs, " a=\"x>y\"");
        assert_eq!(span.inner, Some("hi"));

        let span = split_element("<w:b/>").unwrap();
        assert_eq!(span.qname, "w:b");
        assert_eq!(span.inner, None);
    }

    #[test]
    fn set_inserts_in_schema_order_and_replaces_duplicates() {
        let xml = wrap("<w:rPr><w:rFonts w:ascii=\"Arial\"/><w:sz w:val=\"20\"/></w:rPr>");
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let rpr = doc.root_element().first_element_child().unwrap();
        let mut bag = PropertyBag::parse(&xml, rpr, RPR_ORDER);

        bag.set_empty("i", &[("val", "0")]);
        bag.set_empty("color", &[("val", "0000FF")]);
        bag.set_empty("b", &[]);

        let names: Vec<&str> = bag.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["rFonts", "b", "i", "color", "sz"]);
        assert_eq!(bag.toggle("i"), Some(false));
        assert_eq!(bag.toggle("b"), Some(true));
        assert!(bag.to_xml().starts_with("<w:rPr><w:rFonts w:ascii=\"Arial\"/><w:b/>"));
    }

    #[test]
    fn merge_empty_keeps_unrelated_attributes() {
        let xml = wrap("<w:pPr><w:spacing w:after=\"200\" w:line=\"240\"/></w:pPr>");
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let ppr = doc.root_element().first_element_child().unwrap();
        let mut bag = PropertyBag::parse(&xml, ppr, PPR_ORDER);

        bag.merge_empty("spacing", &[("line", "276"), ("lineRule", "auto")], &[]);

        let spacing = bag.get("spacing").unwrap();
        assert_eq!(spacing.attr("after"), Some("200"));
        assert_eq!(spacing.attr("line"), Some("276"));
        assert_eq!(spacing.attr("lineRule"), Some("auto"));
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_text("a<b & c>"), "a&lt;b &amp; c&gt;");
        assert_eq!(escape_attr("\"q\""), "&quot;q&quot;");
    }
}
