// LogSlice - platform/fs.rs
//
// Segment file I/O: edge-line probes, whole-segment loading, output writes
// and output directory management.
//
// Everything here returns plain `io::Result`; callers in `app` attach the
// path and operation when converting to `ExtractError::Io`.

use crate::util::constants;
use chrono::{DateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

// =============================================================================
// Edge lines
// =============================================================================

/// First and last line of a segment, without terminators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeLines {
    pub first: String,
    pub last: String,
}

/// Read the first and last line of a file without reading the rest of it.
///
/// The first line is read forward; the last by seeking back from EOF in
/// `EDGE_READ_CHUNK` steps. Returns `None` for a zero-length file. A single
/// line file yields the same text for both.
pub fn read_edge_lines(path: &Path) -> io::Result<Option<EdgeLines>> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(None);
    }

    let mut first = String::new();
    BufReader::new(&mut file).read_line(&mut first)?;
    strip_terminator_str(&mut first);

    let last = read_last_line(&mut file, len)?;
    Ok(Some(EdgeLines { first, last }))
}

fn read_last_line(file: &mut File, len: u64) -> io::Result<String> {
    // Bytes from `pos` to EOF, grown backwards one chunk at a time.
    let mut tail: Vec<u8> = Vec::new();
    let mut pos = len;

    loop {
        let step = constants::EDGE_READ_CHUNK.min(pos);
        pos -= step;
        file.seek(SeekFrom::Start(pos))?;
        let mut chunk = vec![0u8; step as usize];
        file.read_exact(&mut chunk)?;
        chunk.extend_from_slice(&tail);
        tail = chunk;

        let body = strip_terminator(&tail);
        if let Some(nl) = body.iter().rposition(|&b| b == b'\n') {
            return utf8(body[nl + 1..].to_vec());
        }
        if pos == 0 {
            return utf8(body.to_vec());
        }
    }
}

/// Drop one trailing `\n` or `\r\n`.
fn strip_terminator(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

fn strip_terminator_str(line: &mut String) {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
}

fn utf8(bytes: Vec<u8>) -> io::Result<String> {
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

// =============================================================================
// Whole-segment text
// =============================================================================

/// The full text of one segment, either on the heap or memory-mapped.
pub enum SegmentText {
    Owned(String),
    Mapped(memmap2::Mmap),
}

impl SegmentText {
    /// Load a segment. Files of at least `large_threshold` bytes are mapped
    /// with `memmap2`; smaller ones use `read_to_string`. Invalid UTF-8 is an
    /// `InvalidData` error in both modes.
    pub fn load(path: &Path, large_threshold: u64) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();

        if len >= large_threshold && len > 0 {
            tracing::debug!(
                file = %path.display(),
                size = len,
                "Memory-mapping large segment"
            );
            // SAFETY: the map is read-only and never mutated. A segment
            // modified by another process while mapped is outside what an
            // immutable archive allows.
            let map = unsafe { memmap2::Mmap::map(&file)? };
            std::str::from_utf8(&map).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            Ok(Self::Mapped(map))
        } else {
            let mut text = String::with_capacity(len as usize);
            BufReader::new(file).read_to_string(&mut text)?;
            Ok(Self::Owned(text))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Owned(text) => text,
            // SAFETY: validated as UTF-8 in `load`, and the map is read-only.
            Self::Mapped(map) => unsafe { std::str::from_utf8_unchecked(map) },
        }
    }

    /// Lines without terminators (`\n` and `\r\n` both accepted).
    pub fn lines(&self) -> Vec<&str> {
        self.as_str().lines().collect()
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, Self::Mapped(_))
    }
}

// =============================================================================
// Output writes
// =============================================================================

/// Write `lines` to a new file at `path`, each followed by `\n`.
///
/// Fails with `AlreadyExists` rather than overwrite. Returns bytes written.
pub fn write_lines(path: &Path, lines: &[&str]) -> io::Result<u64> {
    let file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let mut writer = BufWriter::with_capacity(constants::WRITE_BUFFER_SIZE, file);
    let mut bytes: u64 = 0;
    for line in lines {
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        bytes += line.len() as u64 + 1;
    }
    writer.flush()?;
    Ok(bytes)
}

/// Byte-exact copy of a whole segment. Fails rather than overwrite.
pub fn copy_segment(src: &Path, dst: &Path) -> io::Result<u64> {
    let mut reader = File::open(src)?;
    let file = OpenOptions::new().write(true).create_new(true).open(dst)?;
    let mut writer = BufWriter::with_capacity(constants::WRITE_BUFFER_SIZE, file);
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    Ok(bytes)
}

// =============================================================================
// Output directory
// =============================================================================

/// Name of the output directory for an extraction started at `now`.
pub fn output_dir_name(now: DateTime<Utc>) -> String {
    format!(
        "{}{}",
        constants::OUTPUT_DIR_PREFIX,
        now.format(constants::OUTPUT_DIR_TIME_FORMAT)
    )
}

/// The directory an extraction writes into.
///
/// Unstaged, segments are written straight into the final directory. Staged,
/// they go into a hidden sibling `.<name>.partial` that `finalize` renames.
#[derive(Debug)]
pub struct OutputDir {
    final_path: PathBuf,
    staging_path: Option<PathBuf>,
}

impl OutputDir {
    /// Create the output directory under `parent`. Never merges into an
    /// existing directory.
    pub fn create(parent: &Path, now: DateTime<Utc>, staged: bool) -> io::Result<Self> {
        let name = output_dir_name(now);
        let final_path = parent.join(&name);

        if !staged {
            std::fs::create_dir(&final_path)?;
            return Ok(Self {
                final_path,
                staging_path: None,
            });
        }

        if final_path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("'{}' already exists", final_path.display()),
            ));
        }
        let staging_path = parent.join(format!(".{name}{}", constants::STAGING_DIR_SUFFIX));
        std::fs::create_dir(&staging_path)?;
        Ok(Self {
            final_path,
            staging_path: Some(staging_path),
        })
    }

    /// Where segments are written now.
    pub fn write_dir(&self) -> &Path {
        self.staging_path.as_deref().unwrap_or(&self.final_path)
    }

    /// Where the output lives once the extraction completes.
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    pub fn is_staged(&self) -> bool {
        self.staging_path.is_some()
    }

    /// Move staged output to its final name. A no-op when unstaged.
    pub fn finalize(self) -> io::Result<PathBuf> {
        if let Some(staging) = &self.staging_path {
            if self.final_path.exists() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("'{}' already exists", self.final_path.display()),
                ));
            }
            std::fs::rename(staging, &self.final_path)?;
        }
        Ok(self.final_path)
    }
}

// =============================================================================
// File manager
// =============================================================================

/// Open the system file manager on `dir`.
///
/// The subprocess is spawned detached; a launch failure is logged at WARN
/// level and never propagated.
pub fn reveal_in_file_manager(dir: &Path) {
    #[cfg(target_os = "windows")]
    let program = "explorer";
    #[cfg(target_os = "macos")]
    let program = "open";
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let program = "xdg-open";

    if let Err(e) = std::process::Command::new(program).arg(dir).spawn() {
        tracing::warn!(
            path = %dir.display(),
            program,
            error = %e,
            "Failed to open output directory in file manager"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_edge_lines_lf_and_crlf() {
        let dir = tempfile::tempdir().unwrap();
        let lf = write(dir.path(), "lf.log", b"first,a\nmiddle,b\nlast,c\n");
        let crlf = write(dir.path(), "crlf.log", b"first,a\r\nmiddle,b\r\nlast,c\r\n");
        let bare = write(dir.path(), "bare.log", b"first,a\nlast,c");

        for path in [lf, crlf, bare] {
            let edges = read_edge_lines(&path).unwrap().unwrap();
            assert_eq!(edges.first, "first,a", "{}", path.display());
            assert_eq!(edges.last, "last,c", "{}", path.display());
        }
    }

    #[test]
    fn test_edge_lines_single_line_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let one = write(dir.path(), "one.log", b"only,x\n");
        let edges = read_edge_lines(&one).unwrap().unwrap();
        assert_eq!(edges.first, "only,x");
        assert_eq!(edges.last, "only,x");

        let empty = write(dir.path(), "empty.log", b"");
        assert_eq!(read_edge_lines(&empty).unwrap(), None);
    }

    #[test]
    fn test_last_line_longer_than_read_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let long = format!("last,{}", "y".repeat(constants::EDGE_READ_CHUNK as usize * 3));
        let content = format!("first,a\n{long}\n");
        let path = write(dir.path(), "long.log", content.as_bytes());
        let edges = read_edge_lines(&path).unwrap().unwrap();
        assert_eq!(edges.last, long);
    }

    #[test]
    fn test_segment_text_owned_and_mapped_agree() {
        let dir = tempfile::tempdir().unwrap();
        let content: String = (0..2000).map(|i| format!("line,{i}\r\n")).collect();
        let path = write(dir.path(), "seg.log", content.as_bytes());

        let owned = SegmentText::load(&path, u64::MAX).unwrap();
        let mapped = SegmentText::load(&path, constants::MIN_LARGE_FILE_THRESHOLD).unwrap();
        assert!(!owned.is_mapped());
        assert!(mapped.is_mapped());
        assert_eq!(owned.lines(), mapped.lines());
        assert_eq!(owned.lines().len(), 2000);
        assert_eq!(owned.lines()[1999], "line,1999");
    }

    #[test]
    fn test_segment_text_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.log", &[0x66, 0xff, 0xfe, b'\n']);
        let err = SegmentText::load(&path, u64::MAX).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let err = SegmentText::load(&path, 1).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_write_lines_terminates_every_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let bytes = write_lines(&path, &["a,1", "b,2"]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,1\nb,2\n");
        assert_eq!(bytes, 8);

        let err = write_lines(&path, &["c,3"]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_copy_segment_is_byte_exact() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(dir.path(), "src.log", b"a,1\r\nb,2");
        let dst = dir.path().join("dst.log");
        assert_eq!(copy_segment(&src, &dst).unwrap(), 8);
        assert_eq!(fs::read(&dst).unwrap(), b"a,1\r\nb,2");
    }

    #[test]
    fn test_output_dir_name_format() {
        let now = Utc.with_ymd_and_hms(2020, 8, 22, 21, 40, 47).unwrap()
            + chrono::Duration::milliseconds(762);
        assert_eq!(output_dir_name(now), "OutputLogs-2020-08-22T21-40-47-762Z");
    }

    #[test]
    fn test_output_dir_never_merges() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2021, 1, 2, 3, 4, 5).unwrap();
        let out = OutputDir::create(dir.path(), now, false).unwrap();
        assert!(out.final_path().is_dir());
        assert_eq!(out.write_dir(), out.final_path());

        let err = OutputDir::create(dir.path(), now, false).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_staged_output_renamed_on_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2021, 1, 2, 3, 4, 5).unwrap();
        let out = OutputDir::create(dir.path(), now, true).unwrap();
        assert!(out.is_staged());
        assert!(!out.final_path().exists());
        let staging = out.write_dir().to_path_buf();
        assert!(staging
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .ends_with(".partial"));

        write(&staging, "LogFile-1.log", b"x\n");
        let final_path = out.finalize().unwrap();
        assert!(!staging.exists());
        assert!(final_path.join("LogFile-1.log").is_file());
    }
}
