//! Uniform directory view over local disk and object-store listings
//!
//! Local entries delegate to the OS. Remote entries walk an in-memory tree
//! synthesized from a flat key listing, where directories are the paths with a
//! trailing `/`.

use super::error::{DiscoveryError, Result};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Capabilities shared by every directory entry backend.
pub trait DirectoryEntry {
    fn is_dir(&self) -> bool;
    /// Immediate children in name order. Empty for files.
    fn children(&self) -> Result<Vec<Entry>>;
    /// Final path segment.
    fn name(&self) -> String;
    /// Full path used for display and exclusion matching, without a trailing `/`.
    fn display_path(&self) -> String;
}

/// A directory or file on either backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Local(LocalEntry),
    Remote(RemoteEntry),
}

impl Entry {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Entry::Local(LocalEntry::new(path))
    }

    /// Path of `self` below `root`, `/`-joined and without a trailing `/`.
    ///
    /// Falls back to the full display path when `self` is not below `root`.
    pub fn relative_to(&self, root: &Entry) -> String {
        match (self, root) {
            (Entry::Local(entry), Entry::Local(root)) => entry
                .path
                .strip_prefix(&root.path)
                .map(join_components)
                .unwrap_or_else(|_| entry.display_path()),
            (Entry::Remote(entry), Entry::Remote(root)) => entry
                .key
                .strip_prefix(&*root.key)
                .map(|rel| rel.trim_end_matches('/').to_string())
                .unwrap_or_else(|| entry.display_path()),
            _ => self.display_path(),
        }
    }

    fn as_dyn(&self) -> &dyn DirectoryEntry {
        match self {
            Entry::Local(entry) => entry,
            Entry::Remote(entry) => entry,
        }
    }
}

impl DirectoryEntry for Entry {
    fn is_dir(&self) -> bool {
        self.as_dyn().is_dir()
    }

    fn children(&self) -> Result<Vec<Entry>> {
        self.as_dyn().children()
    }

    fn name(&self) -> String {
        self.as_dyn().name()
    }

    fn display_path(&self) -> String {
        self.as_dyn().display_path()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_path())
    }
}

/// Forward-slash form of a relative path on every platform.
fn join_components(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// Local backend
// ============================================================================

/// Entry on local disk. Directory-ness is read once, at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    path: PathBuf,
    is_dir: bool,
}

impl LocalEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_dir = path.is_dir();
        Self { path, is_dir }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DirectoryEntry for LocalEntry {
    fn is_dir(&self) -> bool {
        self.is_dir
    }

    fn children(&self) -> Result<Vec<Entry>> {
        if !self.is_dir {
            return Ok(Vec::new());
        }
        let mut children = Vec::new();
        for entry in WalkDir::new(&self.path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            children.push(Entry::local(entry?.into_path()));
        }
        Ok(children)
    }

    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.display_path())
    }

    fn display_path(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

// ============================================================================
// Object-store backend
// ============================================================================

/// Synthetic root above the single top-level bucket entry.
const TREE_ROOT: &str = "";

/// Directory tree synthesized from a flat object key listing
///
/// Paths have the form `scheme://bucket/dir/.../name`; directories end in `/`.
#[derive(Debug)]
pub struct VirtualTree {
    children: HashMap<String, BTreeSet<String>>,
    object_count: usize,
}

impl VirtualTree {
    /// Build the tree for one listing of `bucket`.
    ///
    /// Keys ending in `/` are directory markers. Empty segments (`a//b`) are
    /// collapsed. The synthetic root must end up with exactly one child, the
    /// bucket itself.
    pub fn from_keys<I, S>(scheme: &str, bucket: &str, keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let top = format!("{}://{}/", scheme, bucket);
        let mut children: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut object_count = 0;

        for key in keys {
            let key = key.as_ref();
            let is_dir_marker = key.ends_with('/');
            let segments: Vec<&str> = key.split('/').filter(|s| !s.is_empty()).collect();
            if segments.is_empty() {
                continue;
            }
            if !is_dir_marker {
                object_count += 1;
            }

            children
                .entry(TREE_ROOT.to_string())
                .or_default()
                .insert(top.clone());

            let mut parent = top.clone();
            for (i, segment) in segments.iter().enumerate() {
                let is_last = i + 1 == segments.len();
                let mut path = format!("{}{}", parent, segment);
                if !is_last || is_dir_marker {
                    path.push('/');
                    children.entry(path.clone()).or_default();
                }
                children.entry(parent).or_default().insert(path.clone());
                parent = path;
            }
        }

        let top_level = children.get(TREE_ROOT).map_or(0, BTreeSet::len);
        if top_level != 1 {
            return Err(DiscoveryError::VirtualRoot {
                uri: top.trim_end_matches('/').to_string(),
                count: top_level,
            });
        }

        Ok(Self {
            children,
            object_count,
        })
    }

    /// Number of objects (not directory markers) in the listing.
    pub fn object_count(&self) -> usize {
        self.object_count
    }

    /// Directory entry for `path`, if the listing contains it.
    pub fn directory(self: &Arc<Self>, path: &str) -> Option<Entry> {
        let key = if path.ends_with('/') {
            path.to_string()
        } else {
            format!("{}/", path)
        };
        if !self.children.contains_key(&key) {
            return None;
        }
        Some(Entry::Remote(RemoteEntry {
            tree: Arc::clone(self),
            key: Arc::from(key),
        }))
    }
}

/// Entry inside a [`VirtualTree`]
#[derive(Clone)]
pub struct RemoteEntry {
    tree: Arc<VirtualTree>,
    key: Arc<str>,
}

impl RemoteEntry {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for RemoteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteEntry").field("key", &self.key).finish()
    }
}

impl PartialEq for RemoteEntry {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tree, &other.tree) && self.key == other.key
    }
}

impl Eq for RemoteEntry {}

impl DirectoryEntry for RemoteEntry {
    fn is_dir(&self) -> bool {
        self.key.ends_with('/')
    }

    fn children(&self) -> Result<Vec<Entry>> {
        let Some(paths) = self.tree.children.get(&*self.key) else {
            return Ok(Vec::new());
        };
        Ok(paths
            .iter()
            .map(|path| {
                Entry::Remote(RemoteEntry {
                    tree: Arc::clone(&self.tree),
                    key: Arc::from(path.as_str()),
                })
            })
            .collect())
    }

    fn name(&self) -> String {
        self.key
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string()
    }

    fn display_path(&self) -> String {
        self.key.trim_end_matches('/').to_string()
    }
}
