use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

// ── Seen-link store ───────────────────────────────────────────────────────────

/// Links that have already been announced, persisted as a sorted JSON array.
///
/// Loaded once at startup and rewritten after every mutation that adds a link.
pub struct SeenLinks {
    path: PathBuf,
    links: Mutex<BTreeSet<String>>,
}

impl SeenLinks {
    /// Open (or start) the store. A missing file is an empty set; so is a
    /// malformed one, after a warning.
    pub fn open(path: &Path) -> Self {
        let links = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(list) => list.into_iter().collect(),
                Err(e) => {
                    warn!("Ignoring malformed seen-link file {:?}: {}", path, e);
                    BTreeSet::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                warn!("Could not read seen-link file {:?}: {}", path, e);
                BTreeSet::new()
            }
        };

        debug!("Loaded {} seen links from {:?}", links.len(), path);
        Self {
            path: path.to_path_buf(),
            links: Mutex::new(links),
        }
    }

    pub fn has(&self, link: &str) -> bool {
        self.lock().contains(link)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record `links`; returns the ones that were not already present, in input order.
    pub fn add_many<I, S>(&self, links: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = self.lock();
        let mut added = Vec::new();

        for link in links {
            let link = link.into();
            if set.insert(link.clone()) {
                added.push(link);
            }
        }

        if !added.is_empty() {
            Self::flush(&self.path, &set)?;
        }

        Ok(added)
    }

    fn flush(path: &Path, links: &BTreeSet<String>) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create dir {:?}", parent))?;
        }
        let sorted: Vec<&String> = links.iter().collect();
        let json = serde_json::to_string_pretty(&sorted)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        // A panic mid-insert leaves the set usable; take it back.
        self.links.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
