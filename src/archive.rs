use std::io::{Cursor, Write};

use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const DEFAULT_EXTENSION: &str = "md";

/// Replaces path separators so a title can never nest or escape inside the archive.
pub fn sanitize_title(title: &str) -> String {
    title.replace(['/', '\\'], "-")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    Inserted,
    /// An entry with the same name existed; its content was overwritten.
    Replaced,
}

/// Collects rendered documents and seals them into an in-memory zip.
///
/// Names are unique: adding a document whose sanitized name is already taken
/// replaces the earlier content and keeps its position.
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    extension: String,
    entries: Vec<ArchiveEntry>,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSION)
    }
}

impl ArchiveBuilder {
    pub fn new(extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            extension: extension.trim_start_matches('.').to_string(),
            entries: Vec::new(),
        }
    }

    pub fn file_name(&self, title: &str) -> String {
        let stem = sanitize_title(title);
        if self.extension.is_empty() {
            stem
        } else {
            format!("{stem}.{}", self.extension)
        }
    }

    pub fn add(&mut self, title: &str, content: Vec<u8>) -> EntryOutcome {
        let name = self.file_name(title);
        if let Some(existing) = self.entries.iter_mut().find(|e| e.name == name) {
            existing.content = content;
            return EntryOutcome::Replaced;
        }
        self.entries.push(ArchiveEntry { name, content });
        EntryOutcome::Inserted
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finish(self) -> ZipResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for entry in self.entries {
            writer.start_file(entry.name, options)?;
            writer.write_all(&entry.content)?;
        }
        Ok(writer.finish()?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_both_separators() {
        assert_eq!(sanitize_title("a/b\\c"), "a-b-c");
        assert_eq!(sanitize_title("../../etc/passwd"), "..-..-etc-passwd");
        assert_eq!(sanitize_title("plain"), "plain");
    }

    #[test]
    fn extension_leading_dot_is_ignored() {
        let builder = ArchiveBuilder::new(".txt");
        assert_eq!(builder.file_name("notes"), "notes.txt");
        assert_eq!(ArchiveBuilder::new("").file_name("notes"), "notes");
    }

    #[test]
    fn duplicate_names_keep_last_content() {
        let mut builder = ArchiveBuilder::default();
        assert_eq!(builder.add("a/b", b"first".to_vec()), EntryOutcome::Inserted);
        assert_eq!(builder.add("a\\b", b"second".to_vec()), EntryOutcome::Replaced);
        assert_eq!(builder.len(), 1);
        assert_eq!(builder.entries()[0].name, "a-b.md");
        assert_eq!(builder.entries()[0].content, b"second");
    }
}
