//! Snapshot persistence: the tree as a flat JSON array of node records and
//! the scratch note as plain text, both kept in the data directory.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::tree::Node;

/// File holding the node records.
pub const TREE_FILE: &str = "tree.json";
/// File holding the scratch note.
pub const TEXT_FILE: &str = "scratch.txt";

/// What a previous session left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    pub nodes: Vec<Node>,
    pub text: String,
}

impl Default for Loaded {
    fn default() -> Self {
        Self {
            nodes: vec![Node::root()],
            text: String::new(),
        }
    }
}

/// Storage collaborator for the tree and the scratch note.
pub trait Persistence {
    /// Load the last saved state, or a root-only tree and empty text when
    /// nothing was saved yet.
    fn load(&mut self) -> Result<Loaded>;
    fn save(&mut self, nodes: &[Node]) -> Result<()>;
    fn save_text(&mut self, text: &str) -> Result<()>;
}

/// Persistence backed by two files in a directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn tree_path(&self) -> PathBuf {
        self.dir.join(TREE_FILE)
    }

    fn text_path(&self) -> PathBuf {
        self.dir.join(TEXT_FILE)
    }

    /// Read the saved node records without touching the file. A missing file
    /// reads as a root-only tree; an unparsable one is an error.
    pub fn read_nodes(&self) -> Result<Vec<Node>> {
        let path = self.tree_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no saved tree, starting from root");
                return Ok(vec![Node::root()]);
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice::<Vec<Node>>(&bytes)?)
    }

    fn load_nodes(&self) -> Result<Vec<Node>> {
        match self.read_nodes() {
            Err(AppError::Persistence(err)) => {
                // Keep the unreadable file around instead of overwriting it
                // with the next save.
                let path = self.tree_path();
                let backup = path.with_extension("json.bak");
                warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    "saved tree is unreadable ({err}), starting from root"
                );
                fs::rename(&path, &backup)?;
                Ok(vec![Node::root()])
            }
            other => other,
        }
    }

    fn load_text(&self) -> Result<String> {
        match fs::read_to_string(self.text_path()) {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Write through a temp file in the same directory so a crash never
    /// leaves a half-written file behind.
    fn write_atomic(&self, target: &Path, data: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut temp = NamedTempFile::new_in(&self.dir)?;
        temp.write_all(data)?;
        temp.flush()?;
        temp.persist(target).map_err(|err| err.error)?;
        Ok(())
    }
}

impl Persistence for JsonStore {
    fn load(&mut self) -> Result<Loaded> {
        Ok(Loaded {
            nodes: self.load_nodes()?,
            text: self.load_text()?,
        })
    }

    fn save(&mut self, nodes: &[Node]) -> Result<()> {
        let data = serde_json::to_vec_pretty(nodes)?;
        self.write_atomic(&self.tree_path(), &data)?;
        debug!(nodes = nodes.len(), "saved tree");
        Ok(())
    }

    fn save_text(&mut self, text: &str) -> Result<()> {
        self.write_atomic(&self.text_path(), text.as_bytes())?;
        debug!(len = text.len(), "saved scratch text");
        Ok(())
    }
}

/// Recorded writes of a [`MemoryStore`].
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryState {
    pub nodes: Option<Vec<Node>>,
    pub text: String,
    pub saves: usize,
    pub text_saves: usize,
    /// Make every write fail.
    pub fail: bool,
}

/// In-memory persistence that counts writes. Clones share state, so a test
/// can keep a handle after boxing one into the app.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    state: std::rc::Rc<std::cell::RefCell<MemoryState>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_nodes(nodes: Vec<Node>) -> Self {
        let store = Self::default();
        store.state.borrow_mut().nodes = Some(nodes);
        store
    }

    pub fn state(&self) -> std::cell::RefMut<'_, MemoryState> {
        self.state.borrow_mut()
    }

    fn check(&self) -> Result<()> {
        if self.state.borrow().fail {
            return Err(std::io::Error::new(ErrorKind::PermissionDenied, "read-only").into());
        }
        Ok(())
    }
}

#[cfg(test)]
impl Persistence for MemoryStore {
    fn load(&mut self) -> Result<Loaded> {
        let state = self.state.borrow();
        Ok(Loaded {
            nodes: state.nodes.clone().unwrap_or_else(|| vec![Node::root()]),
            text: state.text.clone(),
        })
    }

    fn save(&mut self, nodes: &[Node]) -> Result<()> {
        self.check()?;
        let mut state = self.state.borrow_mut();
        state.nodes = Some(nodes.to_vec());
        state.saves += 1;
        Ok(())
    }

    fn save_text(&mut self, text: &str) -> Result<()> {
        self.check()?;
        let mut state = self.state.borrow_mut();
        state.text = text.to_string();
        state.text_saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeStore;
    use tempfile::TempDir;

    #[test]
    fn load_without_files_gives_root_and_empty_text() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStore::new(dir.path());
        assert_eq!(store.load().unwrap(), Loaded::default());
    }

    #[test]
    fn save_and_load_round_trip_records() {
        let dir = TempDir::new().unwrap();
        let mut tree = TreeStore::default();
        tree.add_path("src/main.rs");
        tree.add_path("docs");
        let main = tree.snapshot().find_by_path("app/src/main.rs").unwrap().id;
        tree.edit_content(main, "fn main() {\n    println!(\"hi\");\n}");
        let docs = tree.snapshot().find_by_path("app/docs").unwrap().id;
        tree.toggle_open(docs);

        let mut store = JsonStore::new(dir.path().join("nested"));
        store.save(tree.snapshot().nodes()).unwrap();
        store.save_text("remember the milk").unwrap();

        let loaded = JsonStore::new(dir.path().join("nested")).load().unwrap();
        assert_eq!(loaded.nodes, tree.snapshot().nodes());
        assert_eq!(loaded.text, "remember the milk");
    }

    #[test]
    fn saved_file_is_a_flat_record_array() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStore::new(dir.path());
        store.save(&[Node::root()]).unwrap();
        let raw = fs::read_to_string(dir.path().join(TREE_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["name"], "app");
        assert_eq!(value[0]["isOpen"], true);
        assert_eq!(value[0]["isFile"], false);
    }

    #[test]
    fn unreadable_tree_is_backed_up() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(TREE_FILE), "not json").unwrap();
        let mut store = JsonStore::new(dir.path());
        let loaded = store.load().unwrap();
        assert_eq!(loaded.nodes, vec![Node::root()]);
        assert!(dir.path().join("tree.json.bak").exists());
        assert!(!dir.path().join(TREE_FILE).exists());
    }

    #[test]
    fn read_nodes_reports_unreadable_tree_and_leaves_it_alone() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(TREE_FILE), "not json").unwrap();
        let store = JsonStore::new(dir.path());
        let err = store.read_nodes().unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
        assert!(dir.path().join(TREE_FILE).exists());
        assert!(!dir.path().join("tree.json.bak").exists());
    }

    #[test]
    fn overwrite_replaces_previous_save() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStore::new(dir.path());
        store.save_text("one").unwrap();
        store.save_text("two").unwrap();
        assert_eq!(store.load().unwrap().text, "two");
    }

    #[test]
    fn memory_store_counts_writes() {
        let mut store = MemoryStore::default();
        let handle = store.clone();
        store.save(&[Node::root()]).unwrap();
        store.save_text("x").unwrap();
        assert_eq!(handle.state().saves, 1);
        assert_eq!(handle.state().text_saves, 1);
        assert_eq!(store.load().unwrap().text, "x");

        handle.state().fail = true;
        assert!(store.save_text("y").is_err());
        assert_eq!(store.load().unwrap().text, "x");
    }
}
