// src/convert/images.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::docx::media::{add_image, inline_picture_xml, EMU_PER_INCH};
use crate::docx::model::{Drawing, RunContent};
use crate::docx::{Alignment, Block, Paragraph, Run, WordDocument};
use crate::extractors::{ExtractedContent, PictureSnapshot};
use crate::profiles::CompanyProfile;
use crate::utils::error::DocxError;

const CURVE_ANCHOR_TEXT: &str = "Standard Curve Example";
const CURVE_TARGET: &str = "STANDARD CURVE EXAMPLE";
const PICTURE_WIDTH_INCHES: u64 = 4;

static DOC_PR_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<wp:docPr\b[^>]*?\sid="(\d+)""#).expect("Failed to compile DOC_PR_ID_RE")
});

/// The picture from the section matched by the standard curve rule, else
/// the first source picture.
pub fn curve_picture<'a>(
    content: &'a ExtractedContent,
    profile: &CompanyProfile,
) -> Option<&'a PictureSnapshot> {
    profile
        .rule_targeting(CURVE_TARGET)
        .and_then(|rule| content.find(&rule.source))
        .and_then(|section| content.section_pictures(section).next())
        .or_else(|| content.pictures.first())
}

/// Width fixed at four inches, height from the source aspect ratio.
pub fn scaled_extent(source: Option<(u64, u64)>) -> (u64, u64) {
    let cx = PICTURE_WIDTH_INCHES * EMU_PER_INCH;
    let cy = match source {
        Some((w, h)) if w > 0 => (cx as u128 * h as u128 / w as u128) as u64,
        _ => cx * 3 / 4,
    };
    (cx, cy)
}

fn next_doc_pr_id(blocks: &[Block]) -> u32 {
    let mut max = 0;
    for block in blocks {
        let xml = block.to_xml();
        for captures in DOC_PR_ID_RE.captures_iter(&xml) {
            if let Ok(id) = captures[1].parse::<u32>() {
                max = max.max(id);
            }
        }
    }
    max + 1
}

fn insert_picture(
    doc: &mut WordDocument,
    anchor: usize,
    picture: &PictureSnapshot,
) -> Result<(), DocxError> {
    let part = doc.body.name.clone();
    let rel_id = add_image(doc.package_mut(), &part, &picture.image)?;
    let (cx, cy) = scaled_extent(picture.extent);
    let id = next_doc_pr_id(&doc.body.blocks);

    let mut run = Run::default();
    run.content.push(RunContent::Drawing(Drawing {
        xml: inline_picture_xml(&rel_id, cx, cy, id, "Standard Curve"),
        embed: Some(rel_id),
        extent: Some((cx, cy)),
    }));
    let mut paragraph = Paragraph::with_runs(vec![run]);
    paragraph.set_alignment(Alignment::Center);
    doc.body.blocks.insert(anchor + 1, Block::Paragraph(paragraph));
    Ok(())
}

/// Places the standard curve picture after the template paragraph that
/// mentions it. Returns whether a picture was inserted.
pub fn insert_standard_curve(
    doc: &mut WordDocument,
    content: &ExtractedContent,
    profile: &CompanyProfile,
) -> bool {
    let Some(anchor) = doc
        .body
        .blocks
        .iter()
        .position(|b| b.as_paragraph().is_some_and(|p| p.text().contains(CURVE_ANCHOR_TEXT)))
    else {
        tracing::debug!("Template has no '{}' paragraph", CURVE_ANCHOR_TEXT);
        return false;
    };
    let Some(picture) = curve_picture(content, profile) else {
        tracing::info!("Source has no picture for the standard curve");
        return false;
    };

    match insert_picture(doc, anchor, picture) {
        Ok(()) => {
            tracing::info!("Inserted standard curve picture ({})", picture.image.extension);
            true
        }
        Err(e) => {
            tracing::warn!("Could not insert standard curve picture: {}", e);
            false
        }
    }
}
