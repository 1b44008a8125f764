// src/docx/package.rs

//! The OPC zip container: an ordered list of `(part name, bytes)`.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::utils::error::DocxError;

/// Upper bound on the buffer reserved from a zip entry's declared size.
const READ_HINT_CAP: u64 = 1 << 20;

fn read_capacity(declared: u64) -> usize {
    declared.min(READ_HINT_CAP) as usize
}

#[derive(Debug, Clone, Default)]
pub struct Package {
    entries: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::with_capacity(read_capacity(entry.size()));
            entry.read_to_end(&mut data)?;
            entries.push((name, data));
        }
        tracing::debug!("Read package with {} parts", entries.len());
        Ok(Self { entries })
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn get_str(&self, name: &str) -> Result<Option<String>, DocxError> {
        match self.get(name) {
            None => Ok(None),
            Some(bytes) => {
                let text = String::from_utf8(bytes.to_vec()).map_err(|source| {
                    DocxError::Encoding {
                        part: name.to_string(),
                        source,
                    }
                })?;
                // Drop a UTF-8 byte order mark; roxmltree does not expect one.
                Ok(Some(text.trim_start_matches('\u{feff}').to_string()))
            }
        }
    }

    /// Replaces a part, or appends it when absent.
    pub fn set(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.entries.push((name.to_string(), data)),
        }
    }

    /// Media is stored, everything else deflated, matching what Word writes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in &self.entries {
            let options = if name.starts_with("word/media/") {
                stored
            } else {
                deflated
            };
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }
        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_survive_a_round_trip() {
        let mut package = Package::default();
        package.set("word/document.xml", b"<doc/>".to_vec());
        package.set("word/media/image1.png", vec![0x89, 0x50, 0x4e, 0x47]);
        package.set("word/document.xml", b"<doc2/>".to_vec());

        let bytes = package.to_bytes().unwrap();
        let reread = Package::from_bytes(&bytes).unwrap();

        assert_eq!(reread.part_names().count(), 2);
        assert_eq!(reread.get("word/document.xml"), Some(&b"<doc2/>"[..]));
        assert!(reread.contains("word/media/image1.png"));
        assert_eq!(
            reread.get_str("word/document.xml").unwrap().as_deref(),
            Some("<doc2/>")
        );
        assert!(reread.get_str("missing.xml").unwrap().is_none());
    }

    #[test]
    fn declared_sizes_only_hint_the_buffer() {
        assert_eq!(read_capacity(512), 512);
        assert_eq!(read_capacity(u64::MAX), 1 << 20);

        let mut package = Package::default();
        let large = vec![7u8; (1 << 20) + 10];
        package.set("word/media/image1.bin", large.clone());
        let reread = Package::from_bytes(&package.to_bytes().unwrap()).unwrap();
        assert_eq!(reread.get("word/media/image1.bin"), Some(&large[..]));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(Package::from_bytes(b"not a zip").is_err());
    }
}
