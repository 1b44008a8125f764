// src/docx/model.rs

//! Block-level model of a WordprocessingML story (document body, header or
//! footer): paragraphs, tables, section properties and opaque elements.

use super::xml::{
    empty_element, escape_text, PropertyBag, PPR_ORDER, RPR_ORDER, TBLPR_ORDER, TCPR_ORDER,
};

/// Element kept verbatim, with its visible text for matching purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opaque {
    pub xml: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    /// Body-level `w:sectPr`.
    SectionBreak(PropertyBag),
    Opaque(Opaque),
}

impl Block {
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Block::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Block::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn to_xml(&self) -> String {
        match self {
            Block::Paragraph(p) => p.to_xml(),
            Block::Table(t) => t.to_xml(),
            Block::SectionBreak(bag) => bag.to_xml_always(),
            Block::Opaque(o) => o.xml.clone(),
        }
    }
}

// --- Runs ---

/// An inline picture (`w:drawing`) with the relationship id of its image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drawing {
    pub xml: String,
    pub embed: Option<String>,
    /// Extent in EMU.
    pub extent: Option<(u64, u64)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunContent {
    Text(String),
    Tab,
    Break,
    Drawing(Drawing),
    Opaque(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub props: PropertyBag,
    pub content: Vec<RunContent>,
}

impl Default for Run {
    fn default() -> Self {
        Self {
            props: PropertyBag::new("w:rPr", RPR_ORDER),
            content: Vec::new(),
        }
    }
}

impl Run {
    pub fn new(text: &str) -> Self {
        let mut run = Self::default();
        run.set_text(text);
        run
    }

    pub fn text(&self) -> String {
        let mut text = String::new();
        for item in &self.content {
            match item {
                RunContent::Text(t) => text.push_str(t),
                RunContent::Tab => text.push('\t'),
                RunContent::Break => text.push('\n'),
                _ => {}
            }
        }
        text
    }

    /// Replaces the textual content, keeping drawings and other inline objects.
    pub fn set_text(&mut self, text: &str) {
        let mut content = text_content(text);
        content.extend(
            self.content
                .drain(..)
                .filter(|c| matches!(c, RunContent::Drawing(_) | RunContent::Opaque(_))),
        );
        self.content = content;
    }

    /// Replaces every occurrence of `find` inside this run's text pieces and
    /// returns how many were replaced.
    pub fn replace(&mut self, find: &str, replace: &str) -> usize {
        if find.is_empty() {
            return 0;
        }
        let mut count = 0;
        for item in &mut self.content {
            if let RunContent::Text(text) = item {
                let hits = text.matches(find).count();
                if hits > 0 {
                    *text = text.replace(find, replace);
                    count += hits;
                }
            }
        }
        count
    }

    pub fn bold(&self) -> bool {
        self.props.toggle("b").unwrap_or(false)
    }

    pub fn italic(&self) -> bool {
        self.props.toggle("i").unwrap_or(false)
    }

    pub fn set_bold(&mut self, bold: bool) {
        if bold {
            self.props.set_empty("b", &[]);
        } else {
            self.props.set_empty("b", &[("val", "0")]);
        }
    }

    pub fn set_italic(&mut self, italic: bool) {
        if italic {
            self.props.set_empty("i", &[]);
        } else {
            self.props.set_empty("i", &[("val", "0")]);
        }
    }

    pub fn set_color(&mut self, hex: &str) {
        self.props.set_empty("color", &[("val", hex)]);
    }

    pub fn drawings(&self) -> impl Iterator<Item = &Drawing> {
        self.content.iter().filter_map(|c| match c {
            RunContent::Drawing(d) => Some(d),
            _ => None,
        })
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<w:r>");
        xml.push_str(&self.props.to_xml());
        for item in &self.content {
            match item {
                RunContent::Text(t) => {
                    xml.push_str("<w:t xml:space=\"preserve\">");
                    xml.push_str(&escape_text(t));
                    xml.push_str("</w:t>");
                }
                RunContent::Tab => xml.push_str("<w:tab/>"),
                RunContent::Break => xml.push_str("<w:br/>"),
                RunContent::Drawing(d) => xml.push_str(&d.xml),
                RunContent::Opaque(o) => xml.push_str(o),
            }
        }
        xml.push_str("</w:r>");
        xml
    }
}

fn text_content(text: &str) -> Vec<RunContent> {
    let mut content = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        match ch {
            '\t' | '\n' => {
                if !current.is_empty() {
                    content.push(RunContent::Text(std::mem::take(&mut current)));
                }
                content.push(if ch == '\t' {
                    RunContent::Tab
                } else {
                    RunContent::Break
                });
            }
            '\r' => {}
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        content.push(RunContent::Text(current));
    }
    content
}

// --- Paragraphs ---

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Run(Run),
    Opaque(Opaque),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alignment {
    Center,
    Justify,
}

impl Alignment {
    fn as_val(&self) -> &'static str {
        match self {
            Alignment::Center => "center",
            Alignment::Justify => "both",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    /// `w:pPr` without its `w:sectPr`.
    pub props: PropertyBag,
    /// Paragraph-level section properties (end of a document section).
    pub section: Option<PropertyBag>,
    pub inlines: Vec<Inline>,
}

impl Default for Paragraph {
    fn default() -> Self {
        Self {
            props: PropertyBag::new("w:pPr", PPR_ORDER),
            section: None,
            inlines: Vec::new(),
        }
    }
}

impl Paragraph {
    pub fn with_runs(runs: Vec<Run>) -> Self {
        Self {
            inlines: runs.into_iter().map(Inline::Run).collect(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> String {
        let mut text = String::new();
        for inline in &self.inlines {
            match inline {
                Inline::Run(r) => text.push_str(&r.text()),
                Inline::Opaque(o) => text.push_str(&o.text),
            }
        }
        text
    }

    pub fn style_id(&self) -> Option<&str> {
        self.props.attr("pStyle", "val")
    }

    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.inlines.iter().filter_map(|i| match i {
            Inline::Run(r) => Some(r),
            _ => None,
        })
    }

    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.inlines.iter_mut().filter_map(|i| match i {
            Inline::Run(r) => Some(r),
            _ => None,
        })
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.props.set_empty("jc", &[("val", alignment.as_val())]);
    }

    pub fn alignment(&self) -> Option<&str> {
        self.props.attr("jc", "val")
    }

    pub fn to_xml(&self) -> String {
        let mut props = self.props.clone();
        if let Some(section) = &self.section {
            props.set("sectPr", section.to_xml_always(), Vec::new());
        }
        let mut xml = String::from("<w:p>");
        xml.push_str(&props.to_xml());
        for inline in &self.inlines {
            match inline {
                Inline::Run(r) => xml.push_str(&r.to_xml()),
                Inline::Opaque(o) => xml.push_str(&o.xml),
            }
        }
        xml.push_str("</w:p>");
        xml
    }
}

// --- Tables ---

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub props: PropertyBag,
    pub blocks: Vec<Block>,
}

impl Cell {
    pub fn empty(width: Option<u32>) -> Self {
        let mut props = PropertyBag::new("w:tcPr", TCPR_ORDER);
        if let Some(width) = width {
            let w = width.to_string();
            props.set_empty("tcW", &[("w", &w), ("type", "dxa")]);
        }
        Self {
            props,
            blocks: vec![Block::Paragraph(Paragraph::default())],
        }
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(Block::as_paragraph)
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.blocks.iter_mut().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Paragraph texts joined by newlines.
    pub fn text(&self) -> String {
        self.paragraphs()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replaces the cell content; a cell always keeps at least one paragraph.
    pub fn set_paragraphs(&mut self, paragraphs: Vec<Paragraph>) {
        self.blocks = paragraphs.into_iter().map(Block::Paragraph).collect();
        if self.blocks.is_empty() {
            self.blocks.push(Block::Paragraph(Paragraph::default()));
        }
    }

    /// Replaces the cell content with one non-italic run.
    pub fn set_text(&mut self, text: &str) {
        let mut run = Run::new(text);
        run.set_italic(false);
        self.set_paragraphs(vec![Paragraph::with_runs(vec![run])]);
    }

    pub fn set_borders(&mut self, xml: String) {
        self.props.set("tcBorders", xml, Vec::new());
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<w:tc>");
        xml.push_str(&self.props.to_xml());
        let mut has_paragraph = false;
        for block in &self.blocks {
            has_paragraph |= matches!(block, Block::Paragraph(_));
            xml.push_str(&block.to_xml());
        }
        if !has_paragraph {
            xml.push_str("<w:p/>");
        }
        xml.push_str("</w:tc>");
        xml
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    /// `w:tblPrEx` / `w:trPr` source, emitted before the cells.
    pub leading: Vec<String>,
    pub cells: Vec<Cell>,
    /// Anything else found in the row (bookmarks, custom XML), emitted last.
    pub trailing: Vec<String>,
}

impl Row {
    pub fn texts(&self) -> Vec<String> {
        self.cells.iter().map(Cell::text).collect()
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<w:tr>");
        for item in &self.leading {
            xml.push_str(item);
        }
        for cell in &self.cells {
            xml.push_str(&cell.to_xml());
        }
        for item in &self.trailing {
            xml.push_str(item);
        }
        xml.push_str("</w:tr>");
        xml
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub props: PropertyBag,
    /// `w:tblGrid` source.
    pub grid_xml: Option<String>,
    /// `w:gridCol` widths in twentieths of a point.
    pub grid: Vec<Option<u32>>,
    pub rows: Vec<Row>,
    pub trailing: Vec<String>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            props: PropertyBag::new("w:tblPr", TBLPR_ORDER),
            grid_xml: None,
            grid: Vec::new(),
            rows: Vec::new(),
            trailing: Vec::new(),
        }
    }
}

impl Table {
    pub fn column_count(&self) -> usize {
        let widest_row = self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
        self.grid.len().max(widest_row)
    }

    /// Header (first) row cell texts, trimmed.
    pub fn header_texts(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.cells.iter().map(|c| c.text().trim().to_string()).collect())
            .unwrap_or_default()
    }

    /// A fresh row with one empty cell per grid column.
    pub fn new_row(&self) -> Row {
        let columns = self.column_count();
        let cells = (0..columns)
            .map(|i| Cell::empty(self.grid.get(i).copied().flatten()))
            .collect();
        Row {
            leading: Vec::new(),
            cells,
            trailing: Vec::new(),
        }
    }

    /// Drops every row after the header row.
    pub fn clear_data_rows(&mut self) {
        self.rows.truncate(1);
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.rows.iter_mut().flat_map(|r| r.cells.iter_mut())
    }

    /// Forces single black borders of size 4 on all four edges of every cell.
    pub fn normalize_borders(&mut self) {
        let edge = |name: &str| {
            empty_element(name, &[("val", "single"), ("sz", "4"), ("space", "0"), ("color", "000000")])
        };
        let borders = format!(
            "<w:tcBorders>{}{}{}{}</w:tcBorders>",
            edge("top"),
            edge("left"),
            edge("bottom"),
            edge("right")
        );
        for cell in self.cells_mut() {
            cell.set_borders(borders.clone());
        }
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<w:tbl>");
        xml.push_str(&self.props.to_xml_always());
        match &self.grid_xml {
            Some(grid) => xml.push_str(grid),
            None => {
                xml.push_str("<w:tblGrid>");
                for width in &self.grid {
                    match width {
                        Some(w) => xml.push_str(&format!("<w:gridCol w:w=\"{w}\"/>")),
                        None => xml.push_str("<w:gridCol/>"),
                    }
                }
                xml.push_str("</w:tblGrid>");
            }
        }
        for row in &self.rows {
            xml.push_str(&row.to_xml());
        }
        for item in &self.trailing {
            xml.push_str(item);
        }
        xml.push_str("</w:tbl>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_text_round_trips_tabs_and_breaks() {
        let run = Run::new("a\tb\nc");
        assert_eq!(run.content.len(), 5);
        assert_eq!(run.text(), "a\tb\nc");
        let xml = run.to_xml();
        assert!(xml.contains("<w:tab/>"));
        assert!(xml.contains("<w:br/>"));
    }

    #[test]
    fn run_replace_counts_occurrences() {
        let mut run = Run::new("Boster Biological, by Boster");
        assert_eq!(run.replace("Boster", "IR"), 2);
        assert_eq!(run.text(), "IR Biological, by IR");
        assert_eq!(run.replace("", "x"), 0);
    }

    #[test]
    fn run_flags() {
        let mut run = Run::new("x");
        assert!(!run.bold());
        run.set_bold(true);
        run.set_italic(false);
        assert!(run.bold());
        assert!(!run.italic());
        assert!(run.to_xml().starts_with("<w:r><w:rPr><w:b/><w:i w:val=\"0\"/></w:rPr>"));
    }

    #[test]
    fn new_row_follows_grid() {
        let table = Table {
            grid: vec![Some(2000), Some(3000)],
            ..Table::default()
        };
        let row = table.new_row();
        assert_eq!(row.cells.len(), 2);
        assert!(row.to_xml().contains("<w:tcW w:w=\"3000\" w:type=\"dxa\"/>"));
    }

    #[test]
    fn normalize_borders_replaces_existing() {
        let mut table = Table {
            grid: vec![None],
            ..Table::default()
        };
        let mut row = table.new_row();
        row.cells[0].set_borders("<w:tcBorders><w:top w:val=\"nil\"/></w:tcBorders>".into());
        table.rows.push(row);

        table.normalize_borders();

        let xml = table.to_xml();
        assert!(!xml.contains("nil"));
        assert_eq!(xml.matches("w:val=\"single\"").count(), 4);
    }
}
