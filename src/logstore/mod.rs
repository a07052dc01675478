//! Per-unit log storage
//!
//! [`LogStore`] keeps a capacity-bounded in-memory ring of the most recent
//! entries and appends every entry durably to a JSONL file. Reads are paged
//! newest-first: any page fully covered by the ring is served from memory,
//! older pages come from the file. When the file grows past a size threshold
//! it is rewritten keeping only the most recent K entries, with a system
//! entry recording the rotation.
//!
//! Sequence numbers are strictly increasing per unit and are never reused,
//! even across rotation or a clear.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use tracing::warn;

use crate::error::Result;
use crate::types::{LogEntry, LogLevel, PageMeta};
use crate::utils::atomic_write_with;

/// Bounded in-memory log ring with file-backed overflow
pub struct LogStore {
    path: PathBuf,
    memory_capacity: usize,
    rotate_threshold: u64,
    rotate_keep: usize,
    ring: VecDeque<LogEntry>,
    /// Next sequence number to assign; monotonic for the unit's lifetime
    next_sequence: u64,
    /// All entries ever appended (survives rotation and clear)
    total_count: u64,
    /// Entries currently retained in the backing file
    file_count: usize,
}

impl LogStore {
    /// Open a store, resuming sequence numbering from the backing file
    pub fn open(
        path: PathBuf,
        memory_capacity: usize,
        rotate_threshold: u64,
        rotate_keep: usize,
    ) -> Result<Self> {
        let mut store = Self {
            path,
            memory_capacity,
            rotate_threshold,
            rotate_keep,
            ring: VecDeque::new(),
            next_sequence: 1,
            total_count: 0,
            file_count: 0,
        };

        let existing = store.load_file_entries()?;
        store.file_count = existing.len();
        for entry in &existing {
            if entry.sequence >= store.next_sequence {
                store.next_sequence = entry.sequence + 1;
            }
        }
        store.total_count = store.next_sequence - 1;
        let skip = existing.len().saturating_sub(memory_capacity);
        store.ring.extend(existing.into_iter().skip(skip));

        Ok(store)
    }

    /// Append a log line, returning the stored entry
    pub fn append(&mut self, message: String, level: LogLevel) -> Result<LogEntry> {
        let entry = self.next_entry(message, level);
        self.push_entry(entry.clone())?;

        if self.file_size() > self.rotate_threshold {
            self.rotate()?;
        }

        Ok(entry)
    }

    /// Read a 1-indexed page, newest entries first
    pub fn read(&self, page: usize, limit: usize) -> Result<(Vec<LogEntry>, PageMeta)> {
        let page = page.max(1);
        let limit = limit.max(1);
        let total = self.file_count.max(self.ring.len());
        let meta = PageMeta::new(page, limit, total);

        let start = (page - 1) * limit;
        if start >= total {
            return Ok((Vec::new(), meta));
        }
        let end = (start + limit).min(total);

        // Offsets are from the newest entry; the ring holds the newest
        // `ring.len()` entries, so a page ending inside it never touches disk.
        let entries = if end <= self.ring.len() {
            self.ring
                .iter()
                .rev()
                .skip(start)
                .take(end - start)
                .cloned()
                .collect()
        } else {
            let all = self.load_file_entries()?;
            all.into_iter().rev().skip(start).take(end - start).collect()
        };

        Ok((entries, meta))
    }

    /// Empty the ring and truncate the file, leaving a system marker
    ///
    /// Destructive. The sequence counter keeps counting so numbers are never
    /// reused by post-clear entries.
    pub fn clear(&mut self) -> Result<LogEntry> {
        self.ring.clear();
        atomic_write_with(&self.path, |_| Ok(()))?;
        self.file_count = 0;

        let marker = self.next_entry("Logs cleared".to_string(), LogLevel::System);
        self.push_entry(marker.clone())?;
        Ok(marker)
    }

    /// All retained entries oldest-first as plain text, `[HH:MM:SS] message`
    pub fn export(&self) -> Result<String> {
        let entries = self.load_file_entries()?;
        let mut out = String::new();
        for entry in entries {
            out.push_str(&entry.export_line());
            out.push('\n');
        }
        Ok(out)
    }

    /// Total entries ever appended
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Next sequence number that will be assigned
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Current backing file size in bytes
    pub fn file_size(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    /// Most recent entries currently held in memory (newest last)
    pub fn recent(&self, count: usize) -> Vec<LogEntry> {
        let skip = self.ring.len().saturating_sub(count);
        self.ring.iter().skip(skip).cloned().collect()
    }

    fn next_entry(&mut self, message: String, level: LogLevel) -> LogEntry {
        let entry = LogEntry::new(self.next_sequence, message, level);
        self.next_sequence += 1;
        self.total_count += 1;
        entry
    }

    fn push_entry(&mut self, entry: LogEntry) -> Result<()> {
        self.ring.push_back(entry.clone());
        while self.ring.len() > self.memory_capacity {
            self.ring.pop_front();
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", entry.to_json_line()?)?;
        file.sync_all()?;
        self.file_count += 1;

        Ok(())
    }

    /// Rewrite the file keeping the most recent `rotate_keep` entries
    fn rotate(&mut self) -> Result<()> {
        let all = self.load_file_entries()?;
        let skip = all.len().saturating_sub(self.rotate_keep);
        let kept: Vec<&LogEntry> = all.iter().skip(skip).collect();

        atomic_write_with(&self.path, |file| {
            for entry in &kept {
                let line = entry
                    .to_json_line()
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                writeln!(file, "{}", line)?;
            }
            Ok(())
        })?;
        self.file_count = kept.len();

        let dropped = skip;
        let marker = self.next_entry(
            format!("Log rotated, {} older entries dropped", dropped),
            LogLevel::System,
        );
        self.push_entry(marker)?;

        Ok(())
    }

    fn load_file_entries(&self) -> Result<Vec<LogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            match LogEntry::from_json_line(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(line = line_num + 1, error = %e, "skipping unparsable log line");
                }
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_store(dir: &TempDir) -> LogStore {
        LogStore::open(dir.path().join("logs.jsonl"), 100, 1024 * 1024, 500).unwrap()
    }

    #[test]
    fn test_sequences_are_strictly_increasing() {
        let dir = TempDir::new().unwrap();
        let mut store = create_store(&dir);

        let a = store.append("one".to_string(), LogLevel::Info).unwrap();
        let b = store.append("two".to_string(), LogLevel::Info).unwrap();
        assert_eq!(a.sequence, 1);
        assert_eq!(b.sequence, 2);
        assert_eq!(store.total_count(), 2);
    }

    #[test]
    fn test_ring_drops_oldest_past_capacity() {
        let dir = TempDir::new().unwrap();
        let mut store =
            LogStore::open(dir.path().join("logs.jsonl"), 3, 1024 * 1024, 500).unwrap();

        for i in 0..5 {
            store.append(format!("line {}", i), LogLevel::Info).unwrap();
        }

        let recent = store.recent(10);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].message, "line 2");
        assert_eq!(recent[2].message, "line 4");
    }

    #[test]
    fn test_page_beyond_memory_is_served_from_file() {
        let dir = TempDir::new().unwrap();
        let mut store =
            LogStore::open(dir.path().join("logs.jsonl"), 100, 10 * 1024 * 1024, 500).unwrap();

        for i in 1..=150 {
            store.append(format!("line {}", i), LogLevel::Info).unwrap();
        }

        // Page 1 (newest 100) is fully inside the ring
        let (page1, meta1) = store.read(1, 100).unwrap();
        assert_eq!(page1.len(), 100);
        assert_eq!(page1[0].sequence, 150);
        assert_eq!(page1[99].sequence, 51);
        assert!(meta1.has_more);

        // Page 2 only exists on disk
        let (page2, meta2) = store.read(2, 100).unwrap();
        assert_eq!(page2.len(), 50);
        assert_eq!(page2[0].sequence, 50);
        assert_eq!(page2[49].sequence, 1);
        assert!(!meta2.has_more);
    }

    #[test]
    fn test_clear_keeps_sequence_monotonic() {
        let dir = TempDir::new().unwrap();
        let mut store = create_store(&dir);

        store.append("a".to_string(), LogLevel::Info).unwrap();
        store.append("b".to_string(), LogLevel::Info).unwrap();

        let marker = store.clear().unwrap();
        assert_eq!(marker.sequence, 3);
        assert_eq!(marker.level, LogLevel::System);

        let next = store.append("c".to_string(), LogLevel::Info).unwrap();
        assert_eq!(next.sequence, 4);

        // Only the marker and the new line survive the clear
        let (entries, _) = store.read(1, 10).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_rotation_keeps_recent_entries_and_marks() {
        let dir = TempDir::new().unwrap();
        // Tiny threshold so a handful of appends trigger rotation
        let mut store = LogStore::open(dir.path().join("logs.jsonl"), 100, 200, 2).unwrap();

        for i in 0..10 {
            store.append(format!("line {}", i), LogLevel::Info).unwrap();
        }

        let entries = store.load_file_entries().unwrap();
        assert!(entries.len() < 10);
        assert!(entries
            .iter()
            .any(|e| e.level == LogLevel::System && e.message.contains("rotated")));

        // Sequences survive rotation untouched
        let seqs: Vec<u64> = entries.iter().map(|e| e.sequence).collect();
        let mut sorted = seqs.clone();
        sorted.sort_unstable();
        assert_eq!(seqs, sorted);
    }

    #[test]
    fn test_reopen_resumes_sequence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs.jsonl");
        {
            let mut store = LogStore::open(path.clone(), 100, 1024 * 1024, 500).unwrap();
            store.append("a".to_string(), LogLevel::Info).unwrap();
            store.append("b".to_string(), LogLevel::Info).unwrap();
        }

        let mut reopened = LogStore::open(path, 100, 1024 * 1024, 500).unwrap();
        assert_eq!(reopened.next_sequence(), 3);
        let c = reopened.append("c".to_string(), LogLevel::Info).unwrap();
        assert_eq!(c.sequence, 3);
    }

    #[test]
    fn test_export_format() {
        let dir = TempDir::new().unwrap();
        let mut store = create_store(&dir);
        store.append("hello".to_string(), LogLevel::Info).unwrap();

        let text = store.export().unwrap();
        let line = text.lines().next().unwrap();
        assert!(line.starts_with('['));
        assert!(line.ends_with("] hello"));
        // [HH:MM:SS] is 10 chars plus a space
        assert_eq!(line.chars().nth(9), Some(']'));
    }
}
