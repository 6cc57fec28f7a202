//! Input buffers and spans into them
//!
//! Every name, literal and error location in the crate is a [`Span`]: a
//! `(source, offset, len)` view into a buffer owned by a [`SourceMap`]. The
//! schema never copies text out of its inputs, so the `SourceMap` must outlive
//! every [`crate::schema::Schema`] built from it.

/// Handle to one buffer in a [`SourceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(usize);

/// Byte range inside one source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub source: SourceId,
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn new(source: SourceId, offset: usize, len: usize) -> Self {
        Self {
            source,
            offset,
            len,
        }
    }

    /// A zero-length span that resolves to `""` in any source map.
    pub fn empty() -> Self {
        Self {
            source: SourceId(usize::MAX),
            offset: 0,
            len: 0,
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Span from the start of `self` through the end of `other`.
    pub fn to(self, other: Span) -> Span {
        debug_assert_eq!(self.source, other.source);
        let end = other.end().max(self.end());
        Span::new(self.source, self.offset, end - self.offset)
    }
}

/// Whether an input is a header or a C/C++ source file.
///
/// Struct definitions found in source files are pasted verbatim into the
/// generated source, since nothing else makes them visible to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Header,
    Source,
}

impl FileKind {
    pub fn from_filename(name: &str) -> Self {
        const SOURCE_SUFFIXES: [&str; 4] = [".c", ".cc", ".cxx", ".cpp"];
        if SOURCE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            FileKind::Source
        } else {
            FileKind::Header
        }
    }
}

/// One loaded input.
#[derive(Debug)]
pub struct SourceFile {
    name: String,
    text: String,
    kind: FileKind,
}

impl SourceFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }
}

/// Owns every input buffer of one generator invocation.
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a buffer. The file kind is derived from the name's suffix.
    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) -> SourceId {
        let name = name.into();
        let kind = FileKind::from_filename(&name);
        self.files.push(SourceFile {
            name,
            text: text.into(),
            kind,
        });
        SourceId(self.files.len() - 1)
    }

    /// Register a buffer read from disk or stdin. Bytes that aren't UTF-8
    /// (a Latin-1 comment, say) become U+FFFD; the scanner only slices
    /// ASCII runs, so tokens are unaffected.
    pub fn add_bytes(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> SourceId {
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        };
        self.add(name, text)
    }

    pub fn get(&self, id: SourceId) -> &SourceFile {
        &self.files[id.0]
    }

    /// Like [`SourceMap::get`], but `None` for the id of [`Span::empty`].
    pub fn try_get(&self, id: SourceId) -> Option<&SourceFile> {
        self.files.get(id.0)
    }

    pub fn files(&self) -> impl Iterator<Item = (SourceId, &SourceFile)> {
        self.files
            .iter()
            .enumerate()
            .map(|(index, file)| (SourceId(index), file))
    }

    /// Text covered by `span`.
    pub fn text(&self, span: Span) -> &str {
        if span.is_empty() {
            return "";
        }
        self.try_get(span.source)
            .and_then(|file| file.text.get(span.offset..span.end()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_suffix() {
        assert_eq!(FileKind::from_filename("settings.c"), FileKind::Source);
        assert_eq!(FileKind::from_filename("settings.cc"), FileKind::Source);
        assert_eq!(FileKind::from_filename("settings.cxx"), FileKind::Source);
        assert_eq!(FileKind::from_filename("settings.cpp"), FileKind::Source);
        assert_eq!(FileKind::from_filename("settings.h"), FileKind::Header);
        assert_eq!(FileKind::from_filename("<stdin>"), FileKind::Header);
    }

    #[test]
    fn test_span_text() {
        let mut sources = SourceMap::new();
        let id = sources.add("a.h", "struct foo {};");
        assert_eq!(sources.text(Span::new(id, 7, 3)), "foo");
        assert_eq!(sources.text(Span::empty()), "");
        assert_eq!(Span::new(id, 0, 6).to(Span::new(id, 7, 3)).len, 10);
    }

    #[test]
    fn test_add_bytes_tolerates_latin1() {
        let mut sources = SourceMap::new();
        let id = sources.add_bytes("latin1.h", b"/* \xa9 2024 */ int x;".to_vec());
        let text = sources.get(id).text();
        assert!(text.contains('\u{fffd}'));
        assert!(text.ends_with(" int x;"));

        let id = sources.add_bytes("utf8.h", "/* \u{a9} */".as_bytes().to_vec());
        assert_eq!(sources.get(id).text(), "/* \u{a9} */");
    }
}
