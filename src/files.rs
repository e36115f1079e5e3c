//! A source file database in the mould of `codespan-reporting`'s
//! `SimpleFiles`, with a `NonZeroU32` file id and 1-based line/column lookup
//! for the JSON projection.

use std::fmt;
use std::num::NonZeroU32;
use std::ops::Range;

use codespan_reporting::files::{Error, Files as FilesTrait, SimpleFile};

use crate::source::FileRange;

/// File id.
// `NonZeroU32` keeps `Option<FileId>` and range types small.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FileId(NonZeroU32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<u32> for FileId {
    type Error = <NonZeroU32 as TryFrom<u32>>::Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        let id = NonZeroU32::try_from(value)?;
        Ok(Self(id))
    }
}

impl From<FileId> for usize {
    fn from(value: FileId) -> Self {
        value.0.get() as Self
    }
}

/// A 1-based line/column pair derived from a byte position.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

pub struct Files {
    files: Vec<SimpleFile<String, String>>,
}

impl Default for Files {
    fn default() -> Self {
        Self::new()
    }
}

impl Files {
    pub fn new() -> Files {
        Files { files: Vec::new() }
    }

    /// Add a file to the database, returning the handle that can be used to
    /// refer to it again.
    pub fn add(&mut self, name: String, source: String) -> FileId {
        self.files.push(SimpleFile::new(name, source));
        let len = u32::try_from(self.files.len())
            .expect("too many files (maximum amount of files is `u32::MAX`)");
        FileId::try_from(len).unwrap()
    }

    /// Get the file corresponding to the given id.
    pub fn get(&self, file_id: FileId) -> Result<&SimpleFile<String, String>, Error> {
        let index = usize::from(file_id) - 1;
        self.files.get(index).ok_or(Error::FileMissing)
    }

    /// The name the file was registered under.
    pub fn file_name(&self, file_id: FileId) -> &str {
        self.get(file_id).map(|file| file.name().as_str()).unwrap_or("")
    }

    /// The source text of the file.
    pub fn file_source(&self, file_id: FileId) -> &str {
        self.get(file_id).map(|file| file.source().as_str()).unwrap_or("")
    }

    /// Convert a byte position into a 1-based line/column pair.
    pub fn line_column(&self, file_id: FileId, byte_pos: u32) -> LineColumn {
        match self.location(file_id, byte_pos as usize) {
            Ok(location) => LineColumn {
                line: location.line_number,
                column: location.column_number,
            },
            Err(_) => LineColumn { line: 1, column: 1 },
        }
    }

    /// Line/column pairs for both ends of a range.
    pub fn range_bounds(&self, range: FileRange) -> (LineColumn, LineColumn) {
        let start = self.line_column(range.file_id(), range.start());
        let end = self.line_column(range.file_id(), range.end());
        (start, end)
    }
}

impl<'a> FilesTrait<'a> for Files {
    type FileId = FileId;
    type Name = &'a str;
    type Source = &'a str;

    fn name(&'a self, file_id: FileId) -> Result<&'a str, Error> {
        Ok(self.get(file_id)?.name().as_str())
    }

    fn source(&'a self, file_id: FileId) -> Result<&'a str, Error> {
        Ok(self.get(file_id)?.source().as_str())
    }

    fn line_index(&self, file_id: FileId, byte_index: usize) -> Result<usize, Error> {
        self.get(file_id)?.line_index((), byte_index)
    }

    fn line_range(&self, file_id: FileId, line_index: usize) -> Result<Range<usize>, Error> {
        self.get(file_id)?.line_range((), line_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ByteRange;

    #[test]
    fn line_column_lookup() {
        let mut files = Files::new();
        let id = files.add("test.sap".into(), "module m;\nstruct S {}\n".into());

        assert_eq!(files.line_column(id, 0), LineColumn { line: 1, column: 1 });
        assert_eq!(files.line_column(id, 7), LineColumn { line: 1, column: 8 });
        // first byte of the second line
        assert_eq!(files.line_column(id, 10), LineColumn { line: 2, column: 1 });
    }

    #[test]
    fn range_bounds_spans_lines() {
        let mut files = Files::new();
        let id = files.add("test.sap".into(), "ab\ncd".into());
        let range = FileRange::new(id, ByteRange::new(1, 4));
        let (start, end) = files.range_bounds(range);
        assert_eq!(start, LineColumn { line: 1, column: 2 });
        assert_eq!(end, LineColumn { line: 2, column: 2 });
    }
}
