// src/docx/media.rs

//! Image parts: resolving `r:embed` ids to bytes and adding new pictures to a
//! package (media part + relationship + content type).

use roxmltree::Document;

use super::package::Package;
use super::xml::{escape_attr, A_NS, PIC_NS, PKG_REL_NS, R_NS, WP_NS};
use crate::utils::error::DocxError;

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// EMU per inch.
pub const EMU_PER_INCH: u64 = 914_400;

/// An image carried by value out of a source package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    /// Lowercase file extension without the dot.
    pub extension: String,
}

/// Relationship part name for a part, e.g. `word/_rels/document.xml.rels`.
pub fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolves a relationship target relative to the source part's folder.
fn resolve_target(part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for piece in target.split('/') {
        match piece {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Looks up the image behind `rel_id` in the relationships of `part`.
pub fn resolve_image(
    package: &Package,
    part: &str,
    rel_id: &str,
) -> Result<Option<ImageData>, DocxError> {
    let rels_name = rels_part_for(part);
    let Some(rels) = package.get_str(&rels_name)? else {
        return Ok(None);
    };
    let doc = Document::parse(&rels).map_err(|source| DocxError::Xml {
        part: rels_name.clone(),
        source,
    })?;
    let target = doc
        .root_element()
        .children()
        .filter(|n| n.is_element())
        .find(|n| n.attribute("Id") == Some(rel_id))
        .filter(|n| n.attribute("TargetMode") != Some("External"))
        .and_then(|n| n.attribute("Target"));
    let Some(target) = target else {
        return Ok(None);
    };
    let name = resolve_target(part, target);
    Ok(package.get(&name).map(|bytes| ImageData {
        bytes: bytes.to_vec(),
        extension: name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "png".to_string()),
    }))
}

fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        "svg" => "image/svg+xml",
        _ => "image/png",
    }
}

/// Stores `image` in the package and links it from `part`. Returns the new
/// relationship id.
pub fn add_image(package: &mut Package, part: &str, image: &ImageData) -> Result<String, DocxError> {
    let mut index = 1;
    let media_name = loop {
        let candidate = format!("word/media/converted_image{index}.{}", image.extension);
        if !package.contains(&candidate) {
            break candidate;
        }
        index += 1;
    };
    package.set(&media_name, image.bytes.clone());

    let rels_name = rels_part_for(part);
    let rels = package.get_str(&rels_name)?.unwrap_or_else(|| {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Relationships xmlns=\"{PKG_REL_NS}\"></Relationships>"
        )
    });
    let existing_ids: Vec<String> = {
        let doc = Document::parse(&rels).map_err(|source| DocxError::Xml {
            part: rels_name.clone(),
            source,
        })?;
        doc.root_element()
            .children()
            .filter_map(|n| n.attribute("Id"))
            .map(str::to_string)
            .collect()
    };
    let mut n = existing_ids.len() + 1;
    let rel_id = loop {
        let candidate = format!("rId{n}");
        if !existing_ids.contains(&candidate) {
            break candidate;
        }
        n += 1;
    };
    let target = media_name.strip_prefix("word/").unwrap_or(&media_name);
    let relationship = format!(
        "<Relationship Id=\"{}\" Type=\"{IMAGE_REL_TYPE}\" Target=\"{}\"/>",
        rel_id,
        escape_attr(target)
    );
    let rels = insert_before_close(&rels, "</Relationships>", &relationship, &rels_name)?;
    package.set(&rels_name, rels.into_bytes());

    if let Some(types) = package.get_str(CONTENT_TYPES_PART)? {
        let needle = format!("Extension=\"{}\"", image.extension);
        let lower = types.to_ascii_lowercase();
        if !lower.contains(&needle.to_ascii_lowercase()) {
            let default = format!(
                "<Default Extension=\"{}\" ContentType=\"{}\"/>",
                image.extension,
                content_type_for(&image.extension)
            );
            let types = insert_before_close(&types, "</Types>", &default, CONTENT_TYPES_PART)?;
            package.set(CONTENT_TYPES_PART, types.into_bytes());
        }
    }

    tracing::debug!("Added image {} as {}", media_name, rel_id);
    Ok(rel_id)
}

fn insert_before_close(xml: &str, close: &str, fragment: &str, part: &str) -> Result<String, DocxError> {
    let position = xml
        .rfind(close)
        .ok_or_else(|| DocxError::Malformed(format!("{part} has no {close}")))?;
    let mut updated = String::with_capacity(xml.len() + fragment.len());
    updated.push_str(&xml[..position]);
    updated.push_str(fragment);
    updated.push_str(&xml[position..]);
    Ok(updated)
}

/// `w:drawing` markup for an inline picture. Namespaces are declared locally
/// so the fragment is valid whatever the host part declares.
pub fn inline_picture_xml(rel_id: &str, cx: u64, cy: u64, doc_pr_id: u32, name: &str) -> String {
    let name = escape_attr(name);
    format!(
        concat!(
            "<w:drawing><wp:inline xmlns:wp=\"{wp}\" distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">",
            "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/><wp:docPr id=\"{id}\" name=\"{name}\"/>",
            "<a:graphic xmlns:a=\"{a}\"><a:graphicData uri=\"{pic}\">",
            "<pic:pic xmlns:pic=\"{pic}\"><pic:nvPicPr><pic:cNvPr id=\"{id}\" name=\"{name}\"/><pic:cNvPicPr/></pic:nvPicPr>",
            "<pic:blipFill><a:blip xmlns:r=\"{r}\" r:embed=\"{rel}\"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>",
            "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
            "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
            "</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"
        ),
        wp = WP_NS,
        a = A_NS,
        pic = PIC_NS,
        r = R_NS,
        rel = rel_id,
        cx = cx,
        cy = cy,
        id = doc_pr_id,
        name = name,
    )
}
