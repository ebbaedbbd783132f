//! Plain-text corpus of article URLs, one per line

use crate::storage::traits::{CorpusIndex, StorageError, StorageResult};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Reads every identifier from a corpus file
///
/// A missing file is an empty corpus. Blank lines are ignored.
pub fn load_all(path: &Path) -> StorageResult<HashSet<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashSet::new()),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

/// Append-only corpus file with an in-memory membership set
pub struct FileCorpusIndex {
    path: PathBuf,
    file: File,
    identifiers: HashSet<String>,
}

impl FileCorpusIndex {
    /// Opens (or creates) the corpus file and loads it fully into memory
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let identifiers = load_all(&path)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;

        // A crash mid-append can leave a partial last line
        terminate_last_line(&mut file).map_err(|e| StorageError::io(&path, e))?;

        tracing::info!(
            "Loaded {} known article URLs from {}",
            identifiers.len(),
            path.display()
        );

        Ok(Self {
            path,
            file,
            identifiers,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn identifiers(&self) -> &HashSet<String> {
        &self.identifiers
    }
}

fn terminate_last_line(file: &mut File) -> std::io::Result<()> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(());
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;

    if last[0] != b'\n' {
        file.write_all(b"\n")?;
        file.sync_data()?;
    }
    Ok(())
}

impl CorpusIndex for FileCorpusIndex {
    fn contains(&self, identifier: &str) -> bool {
        self.identifiers.contains(identifier)
    }

    fn append(&mut self, identifier: &str) -> StorageResult<bool> {
        if self.identifiers.contains(identifier) {
            return Ok(false);
        }

        let line = format!("{}\n", identifier);
        self.file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.flush())
            .and_then(|_| self.file.sync_data())
            .map_err(|e| StorageError::io(&self.path, e))?;

        self.identifiers.insert(identifier.to_string());
        Ok(true)
    }

    fn len(&self) -> usize {
        self.identifiers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const URL: &str = "https://news.example.com/clanek/domaci/volby-12345";

    #[test]
    fn test_open_missing_file() {
        let dir = tempdir().unwrap();
        let corpus = FileCorpusIndex::open(dir.path().join("urls.txt")).unwrap();

        assert!(corpus.is_empty());
        assert!(corpus.path().exists());
    }

    #[test]
    fn test_append_twice_writes_one_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        let mut corpus = FileCorpusIndex::open(&path).unwrap();

        assert!(corpus.append(URL).unwrap());
        assert!(!corpus.append(URL).unwrap());

        assert_eq!(corpus.len(), 1);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().filter(|l| *l == URL).count(), 1);
    }

    #[test]
    fn test_reopen_keeps_identifiers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        {
            let mut corpus = FileCorpusIndex::open(&path).unwrap();
            corpus.append(URL).unwrap();
        }

        let mut corpus = FileCorpusIndex::open(&path).unwrap();
        assert!(corpus.contains(URL));
        assert!(!corpus.append(URL).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_partial_last_line_is_terminated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(&path, "https://a.example/1\nhttps://a.example/2").unwrap();

        let mut corpus = FileCorpusIndex::open(&path).unwrap();
        corpus.append("https://a.example/3").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "https://a.example/1",
                "https://a.example/2",
                "https://a.example/3"
            ]
        );
    }

    #[test]
    fn test_load_all_skips_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(&path, "a\n\n  b  \n").unwrap();

        let ids = load_all(&path).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("b"));
    }
}
