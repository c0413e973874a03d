// Line source: the import file, read one line at a time. Lines are handed
// out as raw bytes so that a line with broken encoding can still be
// reported on its own instead of failing the whole read.

use std::io;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::pipeline::ImportError;

pub struct LineSource<R> {
    reader: R,
    label: String,
    lines_read: usize,
}

impl LineSource<BufReader<File>> {
    /// Open the export at `path`. Fails when the file is missing, unreadable
    /// or a directory.
    pub async fn open(path: &Path) -> Result<Self, ImportError> {
        let unavailable = |source: io::Error| ImportError::InputUnavailable {
            path: path.to_path_buf(),
            source,
        };
        let metadata = tokio::fs::metadata(path).await.map_err(unavailable)?;
        if metadata.is_dir() {
            return Err(unavailable(io::Error::new(
                io::ErrorKind::InvalidInput,
                "path is a directory",
            )));
        }
        let file = File::open(path).await.map_err(unavailable)?;
        tracing::debug!(path = %path.display(), bytes = metadata.len(), "opened input");
        Ok(LineSource::from_reader(
            BufReader::new(file),
            path.display().to_string(),
        ))
    }
}

impl<R: AsyncBufRead + Unpin> LineSource<R> {
    pub fn from_reader(reader: R, label: impl Into<String>) -> Self {
        LineSource {
            reader,
            label: label.into(),
            lines_read: 0,
        }
    }

    /// Read the next line without its `\n` / `\r\n` terminator.
    /// Returns `None` at end of input.
    pub async fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(None);
        }
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        self.lines_read += 1;
        Ok(Some(line))
    }

    /// Number of lines handed out so far; also the 1-based number of the
    /// most recent line.
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Release the underlying reader.
    pub fn close(self) {
        tracing::debug!(input = %self.label, lines = self.lines_read, "closing input");
        drop(self.reader);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn source(text: &'static [u8]) -> LineSource<BufReader<Cursor<&'static [u8]>>> {
        LineSource::from_reader(BufReader::new(Cursor::new(text)), "memory")
    }

    #[tokio::test]
    async fn strips_line_endings() {
        let mut lines = source(b"one\r\ntwo\nthree");
        assert_eq!(lines.next_line().await.unwrap(), Some(b"one".to_vec()));
        assert_eq!(lines.next_line().await.unwrap(), Some(b"two".to_vec()));
        assert_eq!(lines.next_line().await.unwrap(), Some(b"three".to_vec()));
        assert_eq!(lines.next_line().await.unwrap(), None);
        assert_eq!(lines.lines_read(), 3);
    }

    #[tokio::test]
    async fn trailing_newline_adds_no_line_but_blank_lines_count() {
        let mut lines = source(b"a\n\nb\n");
        assert_eq!(lines.next_line().await.unwrap(), Some(b"a".to_vec()));
        assert_eq!(lines.next_line().await.unwrap(), Some(Vec::new()));
        assert_eq!(lines.next_line().await.unwrap(), Some(b"b".to_vec()));
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn open_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = LineSource::open(&dir.path().join("missing.jsonl")).await;
        assert!(matches!(result, Err(ImportError::InputUnavailable { .. })));
    }

    #[tokio::test]
    async fn open_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = LineSource::open(dir.path()).await;
        assert!(matches!(result, Err(ImportError::InputUnavailable { .. })));
    }
}
