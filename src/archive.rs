//! Archive Writer - bundles rendered badges into one downloadable file

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;

pub trait ArchiveWriter {
    fn add(&mut self, name: &str, bytes: &[u8]) -> Result<()>;
    fn len(&self) -> usize;
    fn finish(self: Box<Self>) -> Result<Vec<u8>>;
}

pub struct ZipArchiveWriter {
    inner: ZipWriter<Cursor<Vec<u8>>>,
    entries: usize,
}

impl ZipArchiveWriter {
    pub fn new() -> Self {
        Self {
            inner: ZipWriter::new(Cursor::new(Vec::new())),
            entries: 0,
        }
    }
}

impl Default for ZipArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn add(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.inner.start_file(name, options)?;
        self.inner.write_all(bytes)?;
        self.entries += 1;
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>> {
        Ok(self.inner.finish()?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_archive_is_valid() {
        let bytes = Box::new(ZipArchiveWriter::new()).finish().unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let mut writer = ZipArchiveWriter::new();
        writer.add("badge_1_a_b.png", b"one").unwrap();
        writer.add("badge_2_c_d.png", b"two").unwrap();
        assert_eq!(writer.len(), 2);
        let bytes = Box::new(writer).finish().unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.by_index(0).unwrap().name(), "badge_1_a_b.png");
        assert_eq!(archive.by_index(1).unwrap().name(), "badge_2_c_d.png");
    }
}
