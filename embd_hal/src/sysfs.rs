//! Small helpers for kernel attribute files.
//!
//! Attribute files are rewritten in place: every access seeks to offset 0
//! first, then issues a single read or write.

use embd_common::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Write `value` to the attribute at `path` (opened write-only, no create).
pub fn write_attr(path: &Path, value: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| Error::io("open", path, e))?;
    file.write_all(value.as_bytes())
        .map_err(|e| Error::io("write", path, e))
}

/// Append `value` to the attribute at `path`.
///
/// Used for capemgr `slots`, which behaves as a command sink.
pub fn append_attr(path: &Path, value: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| Error::io("open", path, e))?;
    file.write_all(value.as_bytes())
        .map_err(|e| Error::io("write", path, e))
}

/// Read the whole attribute at `path` as text.
pub fn read_attr(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io("read", path, e))
}

/// Rewind `file` and write `value`.
pub fn rewrite<F: Write + Seek>(file: &mut F, path: &Path, value: &str) -> Result<()> {
    file.seek(SeekFrom::Start(0))
        .map_err(|e| Error::io("seek", path, e))?;
    file.write_all(value.as_bytes())
        .map_err(|e| Error::io("write", path, e))
}

/// Rewind `file` and read it to the end.
pub fn reread(file: &mut File, path: &Path) -> Result<String> {
    file.seek(SeekFrom::Start(0))
        .map_err(|e| Error::io("seek", path, e))?;
    let mut buf = String::new();
    file.read_to_string(&mut buf)
        .map_err(|e| Error::io("read", path, e))?;
    Ok(buf)
}

// ─── Path Resolution ────────────────────────────────────────────────

/// One component of a wildcard path.
#[derive(Debug, Clone, Copy)]
pub enum Segment<'a> {
    /// Entry name must equal this string.
    Exact(&'a str),
    /// Entry name must start with this string (`ocp.*`).
    Prefix(&'a str),
}

impl Segment<'_> {
    fn accepts(&self, name: &str) -> bool {
        match self {
            Segment::Exact(exact) => name == *exact,
            Segment::Prefix(prefix) => name.starts_with(prefix),
        }
    }

    fn render(&self) -> String {
        match self {
            Segment::Exact(exact) => (*exact).to_string(),
            Segment::Prefix(prefix) => format!("{prefix}*"),
        }
    }
}

/// Render a pattern for error messages, e.g. `/sys/devices/ocp.*/helper.*`.
pub fn render_pattern(base: &Path, pattern: &[Segment<'_>]) -> PathBuf {
    pattern
        .iter()
        .fold(base.to_path_buf(), |path, segment| path.join(segment.render()))
}

/// Resolve `pattern` under `base`, returning the first match in name order.
///
/// A missing directory along the way is not an error; it just yields no match.
pub fn find_path(base: &Path, pattern: &[Segment<'_>]) -> Result<Option<PathBuf>> {
    let Some((segment, rest)) = pattern.split_first() else {
        return Ok(base.exists().then(|| base.to_path_buf()));
    };

    if let Segment::Exact(name) = segment {
        return find_path(&base.join(name), rest);
    }

    let entries = match fs::read_dir(base) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io("read_dir", base, e)),
    };

    let mut names = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| segment.accepts(name))
        .collect::<Vec<_>>();
    names.sort();

    for name in names {
        if let Some(found) = find_path(&base.join(name), rest)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Poll until `pattern` resolves under `base` or `timeout` elapses.
pub fn wait_for_path(
    base: &Path,
    pattern: &[Segment<'_>],
    timeout: Duration,
    interval: Duration,
) -> Result<PathBuf> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(found) = find_path(base, pattern)? {
            return Ok(found);
        }
        if Instant::now() >= deadline {
            return Err(Error::Timeout(format!(
                "{} did not appear within {timeout:?}",
                render_pattern(base, pattern).display()
            )));
        }
        thread::sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn find_path_matches_prefixes_in_order() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("ocp.3/helper.15")).unwrap();
        fs::create_dir_all(dir.path().join("ocp.2/helper.14")).unwrap();
        fs::write(dir.path().join("ocp.2/helper.14/AIN1"), "0").unwrap();
        fs::write(dir.path().join("ocp.3/helper.15/AIN1"), "0").unwrap();

        let pattern = [
            Segment::Prefix("ocp."),
            Segment::Prefix("helper."),
            Segment::Exact("AIN1"),
        ];
        let found = find_path(dir.path(), &pattern).unwrap().unwrap();
        assert_eq!(found, dir.path().join("ocp.2/helper.14/AIN1"));
    }

    #[test]
    fn find_path_missing_base_is_none() {
        let dir = TempDir::new().unwrap();
        let pattern = [Segment::Prefix("ocp.")];
        assert!(find_path(&dir.path().join("absent"), &pattern).unwrap().is_none());
    }

    #[test]
    fn wait_for_path_times_out() {
        let dir = TempDir::new().unwrap();
        let err = wait_for_path(
            dir.path(),
            &[Segment::Prefix("pwm_test_P9_14.")],
            Duration::from_millis(30),
            Duration::from_millis(5),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        assert!(err.to_string().contains("pwm_test_P9_14.*"));
    }

    #[test]
    fn rewrite_overwrites_from_start() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("value");
        fs::write(&path, "0").unwrap();
        let mut file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
        rewrite(&mut file, &path, "1").unwrap();
        rewrite(&mut file, &path, "0").unwrap();
        assert_eq!(reread(&mut file, &path).unwrap(), "0");
    }

    #[test]
    fn write_attr_requires_existing_file() {
        let dir = TempDir::new().unwrap();
        assert!(write_attr(&dir.path().join("export"), "4").is_err());
    }
}
