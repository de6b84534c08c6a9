// SPDX-License-Identifier: Apache-2.0

use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Reads complete lines from a growing file while tracking the byte offset
/// just past the last line handed out.
///
/// Bytes after the last newline are held back until their newline arrives, so
/// the offset always points at the start of a line and can be used to resume.
pub struct LineReader {
    path: PathBuf,
    reader: BufReader<File>,
    /// Offset just after the last complete line returned
    offset: u64,
    /// Bytes of an unterminated trailing line
    partial: Vec<u8>,
}

impl LineReader {
    /// Open `path` positioned at `offset`.
    ///
    /// Fails if the file cannot be opened for reading or is not a regular file.
    /// An `offset` past the end of the file is accepted here but reported by
    /// [`LineReader::is_truncated`]: the file is shorter than the position it
    /// is resumed from, so it was cut or replaced since that position was taken.
    /// Waiting for it to grow back could resume in the middle of a line.
    pub fn open(path: impl AsRef<Path>, offset: u64) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;

        if !file.metadata()?.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        file.seek(SeekFrom::Start(offset))?;

        Ok(Self {
            path,
            reader: BufReader::new(file),
            offset,
            partial: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Offset just after the last complete line returned.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of buffered bytes belonging to an unterminated line.
    pub fn pending(&self) -> usize {
        self.partial.len()
    }

    /// Read the next complete line, without its trailing `\n`.
    ///
    /// Returns `None` at end of file. A trailing line without newline stays
    /// buffered and is completed by later calls once more data is appended.
    pub fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        self.reader.read_until(b'\n', &mut self.partial)?;

        if self.partial.last() != Some(&b'\n') {
            return Ok(None);
        }

        self.offset += self.partial.len() as u64;
        let mut line = std::mem::take(&mut self.partial);
        line.pop();
        Ok(Some(line))
    }

    /// True if the file is now shorter than what has already been consumed.
    pub fn is_truncated(&self) -> io::Result<bool> {
        let len = self.reader.get_ref().metadata()?.len();
        Ok(len < self.offset + self.partial.len() as u64)
    }

    /// Current length of the underlying file.
    pub fn file_len(&self) -> io::Result<u64> {
        Ok(self.reader.get_ref().metadata()?.len())
    }
}
