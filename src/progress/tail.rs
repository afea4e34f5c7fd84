//! Last-line reads of append-only job logs
//!
//! Logs grow for hours, so only a small suffix is read. The window doubles
//! when the suffix holds no line break, up to [`MAX_TAIL_WINDOW`].

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Result, StatusError};

/// Default number of trailing bytes read per job per tick
pub const DEFAULT_TAIL_WINDOW: u64 = 4096;

/// Upper bound for the trailing read when a single line is very long
pub const MAX_TAIL_WINDOW: u64 = 64 * 1024;

/// Read the last non-empty line of a log file.
///
/// Trailing line terminators are ignored, so a file ending in `\n` yields
/// the line before it. A line still being written is returned as is.
pub fn read_last_line(path: &Path, window: u64) -> Result<String> {
    let mut file = File::open(path).map_err(|e| unreadable(path, e.to_string()))?;
    let file_size = file
        .metadata()
        .map_err(|e| unreadable(path, e.to_string()))?
        .len();

    let mut window = window.max(1).min(file_size);
    loop {
        let chunk = read_suffix(&mut file, file_size, window)
            .map_err(|e| unreadable(path, e.to_string()))?;
        let text = String::from_utf8_lossy(&chunk);
        let text = text.trim_end_matches(['\n', '\r']);

        if let Some(idx) = text.rfind('\n') {
            return Ok(text[idx + 1..].trim_end_matches('\r').to_string());
        }

        // No break in the window: either the whole file is one line, or the
        // window cut the line short
        if window >= file_size || window >= MAX_TAIL_WINDOW {
            if text.is_empty() {
                return Err(unreadable(path, "log is empty".to_string()));
            }
            return Ok(text.to_string());
        }
        window = (window * 2).min(file_size).min(MAX_TAIL_WINDOW);
    }
}

fn read_suffix(file: &mut File, file_size: u64, window: u64) -> std::io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(file_size - window))?;
    let mut buf = Vec::with_capacity(window as usize);
    file.by_ref().take(window).read_to_end(&mut buf)?;
    Ok(buf)
}

fn unreadable(path: &Path, reason: String) -> StatusError {
    StatusError::LogUnreadable {
        path: path.to_path_buf(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_log(dir: &Path, content: &str) -> std::path::PathBuf {
        let path = dir.join("log.txt");
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_last_line_with_trailing_newline() {
        let dir = tempdir().unwrap();
        let path = write_log(dir.path(), "first\nsecond\n3/10 msgs left\n");
        assert_eq!(read_last_line(&path, DEFAULT_TAIL_WINDOW).unwrap(), "3/10 msgs left");
    }

    #[test]
    fn test_partial_last_line() {
        let dir = tempdir().unwrap();
        let path = write_log(dir.path(), "first\r\nstill writ");
        assert_eq!(read_last_line(&path, DEFAULT_TAIL_WINDOW).unwrap(), "still writ");
    }

    #[test]
    fn test_single_line_file() {
        let dir = tempdir().unwrap();
        let path = write_log(dir.path(), "only line");
        assert_eq!(read_last_line(&path, DEFAULT_TAIL_WINDOW).unwrap(), "only line");
    }

    #[test]
    fn test_window_grows_for_long_lines() {
        let dir = tempdir().unwrap();
        let long = "x".repeat(100);
        let path = write_log(dir.path(), &format!("head\n{}\n", long));
        assert_eq!(read_last_line(&path, 8).unwrap(), long);
    }

    #[test]
    fn test_large_log_reads_only_the_tail() {
        let dir = tempdir().unwrap();
        let mut content = String::new();
        for i in 0..10_000 {
            content.push_str(&format!("{}/10000 msgs left\n", 10_000 - i));
        }
        let path = write_log(dir.path(), &content);
        assert_eq!(read_last_line(&path, 64).unwrap(), "1/10000 msgs left");
    }

    #[test]
    fn test_empty_and_missing_logs_are_unreadable() {
        let dir = tempdir().unwrap();
        let empty = write_log(dir.path(), "");
        assert!(matches!(
            read_last_line(&empty, DEFAULT_TAIL_WINDOW),
            Err(StatusError::LogUnreadable { .. })
        ));

        let blank = dir.path().join("blank.txt");
        std::fs::write(&blank, "\n\n").unwrap();
        assert!(read_last_line(&blank, DEFAULT_TAIL_WINDOW).is_err());

        let missing = dir.path().join("missing.txt");
        assert!(matches!(
            read_last_line(&missing, DEFAULT_TAIL_WINDOW),
            Err(StatusError::LogUnreadable { .. })
        ));
    }
}
