// src/docx/parse.rs

//! `roxmltree` nodes → block model.

use roxmltree::Node;

use super::model::{Block, Cell, Drawing, Inline, Opaque, Paragraph, Row, Run, RunContent, Table};
use super::xml::{
    descendant_text, is_w, source_of, w_attr, w_child, PropertyBag, A_NS, PPR_ORDER, R_NS,
    RPR_ORDER, SECTPR_ORDER, TBLPR_ORDER, TCPR_ORDER, WP_NS,
};

/// Parses the element children of a story container (`w:body`, `w:hdr`,
/// `w:ftr`, `w:tc`).
pub fn parse_blocks(src: &str, container: Node) -> Vec<Block> {
    container
        .children()
        .filter(|child| child.is_element())
        .map(|child| parse_block(src, child))
        .collect()
}

fn parse_block(src: &str, node: Node) -> Block {
    if is_w(node, "p") {
        Block::Paragraph(parse_paragraph(src, node))
    } else if is_w(node, "tbl") {
        Block::Table(parse_table(src, node))
    } else if is_w(node, "sectPr") {
        Block::SectionBreak(PropertyBag::parse(src, node, SECTPR_ORDER))
    } else {
        Block::Opaque(opaque(src, node))
    }
}

fn opaque(src: &str, node: Node) -> Opaque {
    Opaque {
        xml: source_of(src, node).to_string(),
        text: descendant_text(node),
    }
}

pub fn parse_paragraph(src: &str, node: Node) -> Paragraph {
    let mut paragraph = Paragraph::default();
    for child in node.children().filter(|c| c.is_element()) {
        if is_w(child, "pPr") {
            let mut props = PropertyBag::parse(src, child, PPR_ORDER);
            if let Some(section) = w_child(child, "sectPr") {
                paragraph.section = Some(PropertyBag::parse(src, section, SECTPR_ORDER));
                props.remove("sectPr");
            }
            paragraph.props = props;
        } else if is_w(child, "r") {
            paragraph.inlines.push(Inline::Run(parse_run(src, child)));
        } else {
            paragraph.inlines.push(Inline::Opaque(opaque(src, child)));
        }
    }
    paragraph
}

fn parse_run(src: &str, node: Node) -> Run {
    let mut run = Run::default();
    for child in node.children().filter(|c| c.is_element()) {
        if is_w(child, "rPr") {
            run.props = PropertyBag::parse(src, child, RPR_ORDER);
        } else if is_w(child, "t") {
            run.content
                .push(RunContent::Text(child.text().unwrap_or("").to_string()));
        } else if is_w(child, "tab") {
            run.content.push(RunContent::Tab);
        } else if is_w(child, "br") || is_w(child, "cr") {
            // Page and column breaks are kept as-is.
            match w_attr(child, "type") {
                Some("page") | Some("column") => {
                    run.content
                        .push(RunContent::Opaque(source_of(src, child).to_string()));
                }
                _ => run.content.push(RunContent::Break),
            }
        } else if is_w(child, "drawing") {
            run.content.push(RunContent::Drawing(parse_drawing(src, child)));
        } else {
            run.content
                .push(RunContent::Opaque(source_of(src, child).to_string()));
        }
    }
    run
}

fn parse_drawing(src: &str, node: Node) -> Drawing {
    let embed = node
        .descendants()
        .find(|n| n.tag_name().name() == "blip" && n.tag_name().namespace() == Some(A_NS))
        .and_then(|blip| blip.attribute((R_NS, "embed")))
        .map(str::to_string);
    let extent = node
        .descendants()
        .find(|n| n.tag_name().name() == "extent" && n.tag_name().namespace() == Some(WP_NS))
        .and_then(|ext| {
            let cx = ext.attribute("cx")?.parse().ok()?;
            let cy = ext.attribute("cy")?.parse().ok()?;
            Some((cx, cy))
        });
    Drawing {
        xml: source_of(src, node).to_string(),
        embed,
        extent,
    }
}

pub fn parse_table(src: &str, node: Node) -> Table {
    let mut table = Table::default();
    for child in node.children().filter(|c| c.is_element()) {
        if is_w(child, "tblPr") {
            table.props = PropertyBag::parse(src, child, TBLPR_ORDER);
        } else if is_w(child, "tblGrid") {
            table.grid_xml = Some(source_of(src, child).to_string());
            table.grid = child
                .children()
                .filter(|c| is_w(*c, "gridCol"))
                .map(|c| w_attr(c, "w").and_then(|w| w.parse().ok()))
                .collect();
        } else if is_w(child, "tr") {
            table.rows.push(parse_row(src, child));
        } else {
            table.trailing.push(source_of(src, child).to_string());
        }
    }
    table
}

fn parse_row(src: &str, node: Node) -> Row {
    let mut row = Row::default();
    for child in node.children().filter(|c| c.is_element()) {
        if is_w(child, "tc") {
            row.cells.push(parse_cell(src, child));
        } else if is_w(child, "tblPrEx") || is_w(child, "trPr") {
            row.leading.push(source_of(src, child).to_string());
        } else {
            row.trailing.push(source_of(src, child).to_string());
        }
    }
    row
}

fn parse_cell(src: &str, node: Node) -> Cell {
    let mut cell = Cell::empty(None);
    cell.blocks.clear();
    for child in node.children().filter(|c| c.is_element()) {
        if is_w(child, "tcPr") {
            cell.props = PropertyBag::parse(src, child, TCPR_ORDER);
        } else {
            cell.blocks.push(parse_block(src, child));
        }
    }
    cell
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::xml::W_NS;

    fn body(inner: &str) -> String {
        format!(
            "<w:document xmlns:w=\"{W_NS}\" xmlns:r=\"{R_NS}\"><w:body>{inner}</w:body></w:document>"
        )
    }

    fn blocks_of(xml: &str) -> Vec<Block> {
        let doc = roxmltree::Document::parse(xml).unwrap();
        let body = doc
            .root_element()
            .children()
            .find(|n| is_w(*n, "body"))
            .unwrap();
        parse_blocks(xml, body)
    }

    #[test]
    fn paragraph_with_style_runs_and_hyperlink() {
        let xml = body(concat!(
            "<w:p><w:pPr><w:pStyle w:val=\"Heading1\"/></w:pPr>",
            "<w:r><w:rPr><w:b/></w:rPr><w:t>Assay </w:t></w:r>",
            "<w:hyperlink r:id=\"rId9\"><w:r><w:t>Principle</w:t></w:r></w:hyperlink>",
            "</w:p>"
        ));
        let blocks = blocks_of(&xml);
        let Block::Paragraph(p) = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(p.style_id(), Some("Heading1"));
        assert_eq!(p.text(), "Assay Principle");
        assert_eq!(p.runs().count(), 1);
        assert!(p.runs().next().unwrap().bold());
        assert!(p.to_xml().contains("<w:hyperlink r:id=\"rId9\">"));
    }

    #[test]
    fn table_and_section_properties() {
        let xml = body(concat!(
            "<w:tbl><w:tblPr><w:tblW w:w=\"0\" w:type=\"auto\"/></w:tblPr>",
            "<w:tblGrid><w:gridCol w:w=\"1200\"/><w:gridCol w:w=\"2400\"/></w:tblGrid>",
            "<w:tr><w:tc><w:p><w:r><w:t>Component</w:t></w:r></w:p></w:tc>",
            "<w:tc><w:p><w:r><w:t>Quantity</w:t></w:r></w:p></w:tc></w:tr>",
            "</w:tbl>",
            "<w:p><w:pPr><w:sectPr><w:cols w:num=\"2\"/></w:sectPr></w:pPr></w:p>",
            "<w:sectPr><w:pgSz w:w=\"12240\"/></w:sectPr>"
        ));
        let blocks = blocks_of(&xml);
        assert_eq!(blocks.len(), 3);
        let table = blocks[0].as_table().unwrap();
        assert_eq!(table.grid, vec![Some(1200), Some(2400)]);
        assert_eq!(table.header_texts(), vec!["Component", "Quantity"]);
        let Block::Paragraph(p) = &blocks[1] else {
            panic!("expected paragraph");
        };
        assert!(p.section.is_some());
        assert!(p.to_xml().contains("<w:sectPr><w:cols w:num=\"2\"/></w:sectPr>"));
        assert!(matches!(blocks[2], Block::SectionBreak(_)));
    }

    #[test]
    fn drawing_keeps_embed_and_extent() {
        let xml = format!(
            concat!(
                "<w:document xmlns:w=\"{w}\" xmlns:r=\"{r}\" xmlns:wp=\"{wp}\" xmlns:a=\"{a}\">",
                "<w:body><w:p><w:r><w:drawing><wp:inline><wp:extent cx=\"100\" cy=\"50\"/>",
                "<a:graphic><a:graphicData><a:blip r:embed=\"rId5\"/></a:graphicData></a:graphic>",
                "</wp:inline></w:drawing></w:r></w:p></w:body></w:document>"
            ),
            w = W_NS,
            r = R_NS,
            wp = WP_NS,
            a = A_NS
        );
        let blocks = blocks_of(&xml);
        let p = blocks[0].as_paragraph().unwrap();
        let drawing = p.runs().next().unwrap().drawings().next().unwrap();
        assert_eq!(drawing.embed.as_deref(), Some("rId5"));
        assert_eq!(drawing.extent, Some((100, 50)));
    }
}
