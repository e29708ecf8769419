//! Input/output plumbing
//!
//! Opens (optionally compressed) VCF input and writes output through a
//! temporary file that is renamed into place only on success.

use super::error::{NormalizeError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Default buffer size for BufReader/BufWriter (128KB)
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// Compression format of an input or output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Plain text (uncompressed)
    Plain,
    /// Gzip compressed (.gz)
    Gzip,
    /// Bzip2 compressed (.bz2)
    Bzip2,
}

impl CompressionFormat {
    /// Guess the format from the path extension alone
    pub fn from_extension(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") | Some("bgz") => CompressionFormat::Gzip,
            Some("bz2") => CompressionFormat::Bzip2,
            _ => CompressionFormat::Plain,
        }
    }

    /// Detect the format from leading magic bytes
    pub fn from_magic(magic: &[u8]) -> Self {
        if magic.len() >= 2 && magic[0] == 0x1f && magic[1] == 0x8b {
            CompressionFormat::Gzip
        } else if magic.len() >= 3 && magic[..3] == *b"BZh" {
            CompressionFormat::Bzip2
        } else {
            CompressionFormat::Plain
        }
    }
}

/// Detect compression format from file path and/or content
pub fn detect_compression(path: &Path) -> io::Result<CompressionFormat> {
    match CompressionFormat::from_extension(path) {
        CompressionFormat::Plain => {}
        format => return Ok(format),
    }

    let mut file = File::open(path)?;
    let mut magic = [0u8; 3];
    let bytes_read = file.read(&mut magic)?;
    Ok(CompressionFormat::from_magic(&magic[..bytes_read]))
}

/// Open a VCF input for buffered line reading, decompressing if needed
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    let not_found = |source| NormalizeError::InputNotFound {
        path: path.to_path_buf(),
        source,
    };

    let format = detect_compression(path).map_err(not_found)?;
    let file = File::open(path).map_err(not_found)?;

    let reader: Box<dyn BufRead> = match format {
        CompressionFormat::Gzip => Box::new(BufReader::with_capacity(
            DEFAULT_BUFFER_SIZE,
            flate2::read::MultiGzDecoder::new(file),
        )),
        CompressionFormat::Bzip2 => Box::new(BufReader::with_capacity(
            DEFAULT_BUFFER_SIZE,
            bzip2::read::BzDecoder::new(file),
        )),
        CompressionFormat::Plain => Box::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file)),
    };
    Ok(reader)
}

/// Line iterator that reuses a buffer and keeps line terminators
///
/// Metadata lines must round-trip byte for byte, so terminators are left in
/// place; use [`trim_line_end`] to drop them.
pub struct LineIterator<R: BufRead> {
    reader: R,
    buffer: String,
    line_no: usize,
}

impl<R: BufRead> LineIterator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::with_capacity(1024),
            line_no: 0,
        }
    }

    /// 1-based number of the line last returned
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Read the next raw line into the internal buffer
    /// Returns None at EOF, otherwise the 1-based line number and the line.
    /// Invalid UTF-8 is reported as `MalformedInput`.
    pub fn next_line(&mut self) -> Option<Result<(usize, &str)>> {
        self.buffer.clear();
        match self.reader.read_line(&mut self.buffer) {
            Ok(0) => None,
            Ok(_) => {
                self.line_no += 1;
                Some(Ok((self.line_no, self.buffer.as_str())))
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => Some(Err(
                NormalizeError::malformed(self.line_no + 1, "line is not valid UTF-8"),
            )),
            Err(e) => Some(Err(NormalizeError::Io(e))),
        }
    }
}

/// Strip a trailing `\n` or `\r\n`
pub fn trim_line_end(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

enum Sink {
    Plain(BufWriter<NamedTempFile>),
    Gzip(GzEncoder<BufWriter<NamedTempFile>>),
}

/// Output file written to a sibling temporary file and renamed on commit
///
/// Dropping without calling [`AtomicOutput::commit`] removes the temporary
/// file and leaves the destination untouched.
pub struct AtomicOutput {
    sink: Sink,
    path: PathBuf,
}

impl AtomicOutput {
    /// Create the temporary file next to `path`; `.gz` paths are gzip-compressed
    pub fn create(path: &Path) -> Result<Self> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let create_err = |source| NormalizeError::OutputWrite {
            path: path.to_path_buf(),
            source,
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix(".vcf-normalize");
        // Temp files default to 0600; ask for 0666 and let the umask apply
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let tmp = builder.tempfile_in(dir).map_err(create_err)?;

        // A replaced destination keeps its mode
        if let Ok(existing) = fs::metadata(path) {
            tmp.as_file()
                .set_permissions(existing.permissions())
                .map_err(create_err)?;
        }

        let buffered = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, tmp);

        // `.bgz` stays plain; this writer does not produce BGZF blocks
        let sink = match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => Sink::Gzip(GzEncoder::new(buffered, Compression::default())),
            _ => Sink::Plain(buffered),
        };

        Ok(Self {
            sink,
            path: path.to_path_buf(),
        })
    }

    /// Flush everything and atomically move the file into place
    pub fn commit(self) -> Result<()> {
        let path = self.path;
        let write_err = |source| NormalizeError::OutputWrite {
            path: path.clone(),
            source,
        };

        let buffered = match self.sink {
            Sink::Plain(w) => w,
            Sink::Gzip(encoder) => encoder.finish().map_err(write_err)?,
        };
        let tmp = buffered.into_inner().map_err(|e| write_err(e.into_error()))?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

impl Write for AtomicOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.sink {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.sink {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(w) => w.flush(),
        }
    }
}
