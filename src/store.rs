//! Journal store: owns the entry history and the current pattern list,
//! re-runs the engine after every entry mutation and persists both through
//! a repository.

use crate::engine::PatternEngine;
use crate::model::{DiscoveredPattern, ReflectionEntry};
use ahash::AHashSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no entry with id {0}")]
    UnknownEntry(Uuid),
    #[error("no pattern with id {0}")]
    UnknownPattern(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait EntryRepository {
    fn load_entries(&self) -> StoreResult<Vec<ReflectionEntry>>;
    fn save_entries(&mut self, entries: &[ReflectionEntry]) -> StoreResult<()>;
}

pub trait PatternRepository {
    fn load_patterns(&self) -> StoreResult<Vec<DiscoveredPattern>>;
    fn save_patterns(&mut self, patterns: &[DiscoveredPattern]) -> StoreResult<()>;
}

const ENTRIES_FILE: &str = "entries.json";
const PATTERNS_FILE: &str = "patterns.json";

/// Two JSON documents in one directory. Missing files read as empty.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    dir: PathBuf,
}

impl JsonFileRepository {
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: for<'de> Deserialize<'de>>(&self, file: &str) -> StoreResult<Vec<T>> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read(&path)?;
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&raw)?)
    }

    fn write<T: Serialize>(&self, file: &str, items: &[T]) -> StoreResult<()> {
        let path = self.dir.join(file);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(items)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl EntryRepository for JsonFileRepository {
    fn load_entries(&self) -> StoreResult<Vec<ReflectionEntry>> {
        self.read(ENTRIES_FILE)
    }

    fn save_entries(&mut self, entries: &[ReflectionEntry]) -> StoreResult<()> {
        self.write(ENTRIES_FILE, entries)
    }
}

impl PatternRepository for JsonFileRepository {
    fn load_patterns(&self) -> StoreResult<Vec<DiscoveredPattern>> {
        self.read(PATTERNS_FILE)
    }

    fn save_patterns(&mut self, patterns: &[DiscoveredPattern]) -> StoreResult<()> {
        self.write(PATTERNS_FILE, patterns)
    }
}

/// Keeps everything in memory; useful for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    pub entries: Vec<ReflectionEntry>,
    pub patterns: Vec<DiscoveredPattern>,
}

impl EntryRepository for MemoryRepository {
    fn load_entries(&self) -> StoreResult<Vec<ReflectionEntry>> {
        Ok(self.entries.clone())
    }

    fn save_entries(&mut self, entries: &[ReflectionEntry]) -> StoreResult<()> {
        self.entries = entries.to_vec();
        Ok(())
    }
}

impl PatternRepository for MemoryRepository {
    fn load_patterns(&self) -> StoreResult<Vec<DiscoveredPattern>> {
        Ok(self.patterns.clone())
    }

    fn save_patterns(&mut self, patterns: &[DiscoveredPattern]) -> StoreResult<()> {
        self.patterns = patterns.to_vec();
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportData<'a> {
    entries: &'a [ReflectionEntry],
    patterns: &'a [DiscoveredPattern],
    exported_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ImportData {
    entries: Vec<ReflectionEntry>,
}

pub struct ReflectionStore<R> {
    repo: R,
    engine: PatternEngine,
    entries: Vec<ReflectionEntry>,
    patterns: Vec<DiscoveredPattern>,
}

impl<R: EntryRepository + PatternRepository> ReflectionStore<R> {
    pub fn open(repo: R, engine: PatternEngine) -> StoreResult<Self> {
        let mut entries = repo.load_entries()?;
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        let patterns = repo.load_patterns()?;
        tracing::debug!(entries = entries.len(), patterns = patterns.len(), "store opened");
        Ok(Self { repo, engine, entries, patterns })
    }

    /// Newest first.
    pub fn entries(&self) -> &[ReflectionEntry] {
        &self.entries
    }

    pub fn patterns(&self) -> &[DiscoveredPattern] {
        &self.patterns
    }

    pub fn active_patterns(&self) -> Vec<&DiscoveredPattern> {
        self.patterns.iter().filter(|p| !p.is_resolved).collect()
    }

    pub fn resolved_patterns(&self) -> Vec<&DiscoveredPattern> {
        self.patterns.iter().filter(|p| p.is_resolved).collect()
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn add_entry(&mut self, entry: ReflectionEntry) -> StoreResult<()> {
        tracing::info!(id = %entry.id, "adding entry");
        let pos = self.entries.iter().position(|e| e.date <= entry.date).unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.repo.save_entries(&self.entries)?;
        self.reanalyze()
    }

    pub fn delete_entry(&mut self, id: Uuid) -> StoreResult<()> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            tracing::warn!(%id, "delete requested for unknown entry");
            return Err(StoreError::UnknownEntry(id));
        }
        tracing::info!(%id, "deleted entry");
        self.repo.save_entries(&self.entries)?;
        self.reanalyze()
    }

    pub fn resolve_pattern(&mut self, id: &str) -> StoreResult<()> {
        self.resolve_pattern_at(id, Utc::now())
    }

    pub fn resolve_pattern_at(&mut self, id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let pattern = self
            .patterns
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::UnknownPattern(id.to_string()))?;
        pattern.is_resolved = true;
        pattern.resolved_at = Some(at);
        tracing::info!(id, "pattern resolved");
        self.repo.save_patterns(&self.patterns)
    }

    /// Drops the pattern from the current list. The next analysis run may
    /// produce it again if its trigger still holds.
    pub fn dismiss_pattern(&mut self, id: &str) -> StoreResult<()> {
        let before = self.patterns.len();
        self.patterns.retain(|p| p.id != id);
        if self.patterns.len() == before {
            return Err(StoreError::UnknownPattern(id.to_string()));
        }
        tracing::info!(id, "pattern dismissed");
        self.repo.save_patterns(&self.patterns)
    }

    /// Re-runs the engine over the current history and persists the result.
    pub fn reanalyze(&mut self) -> StoreResult<()> {
        self.patterns = self.engine.analyze(&self.entries, &self.patterns);
        tracing::debug!(patterns = self.patterns.len(), "patterns refreshed");
        self.repo.save_patterns(&self.patterns)
    }

    pub fn export_json(&self) -> StoreResult<String> {
        let data = ExportData { entries: &self.entries, patterns: &self.patterns, exported_at: Utc::now() };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Merges entries whose ids are not known yet and returns how many were added.
    /// Patterns in the document are ignored; they are recomputed.
    pub fn import_json(&mut self, data: &[u8]) -> StoreResult<usize> {
        let imported: ImportData = serde_json::from_slice(data)?;
        let mut known: AHashSet<Uuid> = self.entries.iter().map(|e| e.id).collect();
        let fresh: Vec<ReflectionEntry> = imported.entries.into_iter().filter(|e| known.insert(e.id)).collect();
        let added = fresh.len();
        self.entries.extend(fresh);
        self.entries.sort_by(|a, b| b.date.cmp(&a.date));
        tracing::info!(added, total = self.entries.len(), "imported entries");
        self.repo.save_entries(&self.entries)?;
        self.reanalyze()?;
        Ok(added)
    }

    pub fn clear(&mut self) -> StoreResult<()> {
        self.entries.clear();
        self.patterns.clear();
        self.repo.save_entries(&self.entries)?;
        self.repo.save_patterns(&self.patterns)
    }
}
