//! JSONL item repository
//!
//! One item per line, in creation order. The file is rewritten after every
//! mutation; a failed write leaves the in-memory state unchanged.

use indexmap::IndexMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tasklist_core::{Error, Item, ItemDraft, ItemUpdate, Result, generate_id};

/// Item storage behind the HTTP service
#[derive(Debug, Default)]
pub struct ItemRepository {
    path: Option<PathBuf>,
    items: IndexMap<String, Item>,
}

impl ItemRepository {
    /// Open (or start) a JSONL-backed repository at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items = if path.exists() {
            load(&path)?
        } else {
            IndexMap::new()
        };
        tracing::info!(path = %path.display(), count = items.len(), "repository opened");
        Ok(Self {
            path: Some(path),
            items,
        })
    }

    /// Repository that never touches disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn list(&self) -> Vec<Item> {
        self.items.values().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Store a new item with a fresh id, not yet completed
    pub fn create(&mut self, draft: ItemDraft) -> Result<Item> {
        let item = Item::from_draft(generate_id(), draft);
        let mut next = self.items.clone();
        next.insert(item.id.clone(), item.clone());
        self.commit(next)?;
        Ok(item)
    }

    /// Replace every mutable field of an existing item
    pub fn update(&mut self, id: &str, fields: ItemUpdate) -> Result<Item> {
        let mut next = self.items.clone();
        let item = next
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        item.apply(fields);
        let item = item.clone();
        self.commit(next)?;
        Ok(item)
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        let mut next = self.items.clone();
        if next.shift_remove(id).is_none() {
            return Err(Error::NotFound(id.to_string()));
        }
        self.commit(next)
    }

    fn commit(&mut self, next: IndexMap<String, Item>) -> Result<()> {
        if let Some(path) = &self.path {
            save(path, &next)?;
        }
        self.items = next;
        Ok(())
    }
}

fn load(path: &Path) -> Result<IndexMap<String, Item>> {
    let reader = BufReader::new(File::open(path)?);
    let mut items = IndexMap::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let item: Item = serde_json::from_str(&line)?;
        items.insert(item.id.clone(), item);
    }

    Ok(items)
}

fn save(path: &Path, items: &IndexMap<String, Item>) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    for item in items.values() {
        serde_json::to_writer(&mut writer, item)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}
