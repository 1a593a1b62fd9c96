use std::time::Instant;

use tracing::{error, info, warn};

use crate::clipboard::Clipboard;
use crate::config::AppConfig;
use crate::editor::TextBuffer;
use crate::error::Result;
use crate::persist::Persistence;
use crate::theme::{self, ThemeColors};
use crate::tree::{to_structured_text, AddOutcome, Node, NodeId, Snapshot, TreeStore, TreeView};

/// Seconds a status message stays visible.
const STATUS_TTL_SECS: u64 = 3;

/// The kind of dialog being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    AddPath,
    EditContent { id: NodeId, name: String },
    DeleteConfirm { id: NodeId, name: String },
}

/// Application mode. Decides which handler receives keys.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    Scratch,
    Dialog(DialogKind),
}

/// State for a dialog's text input. `cursor_position` is a byte offset that
/// always sits on a char boundary.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    pub cursor_position: usize,
}

/// Main application state.
pub struct App {
    pub store: TreeStore,
    pub view: TreeView,
    /// Buffer of the edit dialog.
    pub editor: TextBuffer,
    /// Free-form note shown next to the tree.
    pub scratch: TextBuffer,
    pub mode: AppMode,
    pub dialog_state: DialogState,
    pub status_message: Option<(String, Instant)>,
    pub status_is_error: bool,
    pub should_quit: bool,
    pub theme: ThemeColors,
    pub use_icons: bool,
    pub confirm_delete: bool,
    pub tab_width: usize,
    persistence: Box<dyn Persistence>,
    clipboard: Box<dyn Clipboard>,
}

impl App {
    /// Load the previous session from `persistence` and build the app.
    pub fn new(
        config: &AppConfig,
        mut persistence: Box<dyn Persistence>,
        clipboard: Box<dyn Clipboard>,
    ) -> Result<Self> {
        let loaded = persistence.load()?;
        let snapshot = Snapshot::from_records(loaded.nodes.clone());
        let repaired = snapshot.nodes() != loaded.nodes.as_slice();
        info!(nodes = snapshot.len(), "loaded tree");

        let view = TreeView::new(&snapshot);
        let mut app = Self {
            store: TreeStore::new(snapshot),
            view,
            editor: TextBuffer::default(),
            scratch: TextBuffer::new(&loaded.text),
            mode: AppMode::Normal,
            dialog_state: DialogState::default(),
            status_message: None,
            status_is_error: false,
            should_quit: false,
            theme: theme::resolve_theme(&config.theme),
            use_icons: config.use_icons(),
            confirm_delete: config.confirm_delete(),
            tab_width: config.tab_width(),
            persistence,
            clipboard,
        };
        if repaired {
            warn!("saving repaired tree");
            app.commit();
        }
        Ok(app)
    }

    // ── Persistence ──────────────────────────────────────────────────────────

    /// Refresh the rows and hand the current snapshot to persistence. A failed
    /// write is reported but the in-memory tree stays as it is. Returns
    /// whether the write succeeded.
    fn commit(&mut self) -> bool {
        self.view.rebuild(self.store.snapshot());
        match self.persistence.save(self.store.snapshot().nodes()) {
            Ok(()) => true,
            Err(err) => {
                error!("failed to save tree: {err}");
                self.set_error_message(format!("Save failed: {err}"));
                false
            }
        }
    }

    fn save_scratch(&mut self) {
        if !self.scratch.modified {
            return;
        }
        match self.persistence.save_text(&self.scratch.text()) {
            Ok(()) => self.scratch.mark_saved(),
            Err(err) => {
                error!("failed to save scratch text: {err}");
                self.set_error_message(format!("Save failed: {err}"));
            }
        }
    }

    // ── Dialogs ──────────────────────────────────────────────────────────────

    /// Open a dialog of the given kind.
    pub fn open_dialog(&mut self, kind: DialogKind) {
        self.dialog_state = DialogState::default();
        self.mode = AppMode::Dialog(kind);
    }

    /// Close the current dialog and return to normal mode.
    pub fn close_dialog(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
    }

    /// Open the add dialog prefilled with the folder under the selection, so
    /// typing a name creates it there.
    pub fn open_add_dialog(&mut self) {
        let prefix = self
            .selected_node()
            .map(|node| {
                if node.is_file {
                    node.path
                        .rsplit_once('/')
                        .map(|(parent, _)| parent.to_string())
                        .unwrap_or_default()
                } else {
                    node.path.clone()
                }
            })
            .filter(|path| !path.is_empty())
            .map(|path| format!("{path}/"))
            .unwrap_or_default();

        self.open_dialog(DialogKind::AddPath);
        self.dialog_state.cursor_position = prefix.len();
        self.dialog_state.input = prefix;
    }

    /// Run `add_path` on the dialog input.
    pub fn submit_add(&mut self) {
        let input = self.dialog_state.input.trim().to_string();
        match self.store.add_path(&input) {
            AddOutcome::Blank => {}
            AddOutcome::Unchanged => {
                self.set_status_message(format!("{input} already exists"));
            }
            AddOutcome::BlockedByFile(path) => {
                self.set_error_message(format!("{path} is a file, not a folder"));
            }
            AddOutcome::Created(ids) => {
                self.close_dialog();
                let Some(&last) = ids.last() else {
                    return;
                };
                self.reveal(last);
                let saved = self.commit();
                self.view.select_id(last);
                if saved {
                    let noun = if ids.len() == 1 { "node" } else { "nodes" };
                    self.set_status_message(format!("Created {} {noun}", ids.len()));
                }
            }
        }
    }

    /// Open every closed ancestor of `id` so it has a visible row.
    fn reveal(&mut self, id: NodeId) {
        let mut parent = self.store.snapshot().get(id).and_then(|n| n.parent_id);
        while let Some(current) = parent {
            self.store.set_open(current, true);
            parent = self.store.snapshot().get(current).and_then(|n| n.parent_id);
        }
    }

    /// Open the edit dialog on the selected file.
    pub fn open_edit_dialog(&mut self) {
        let Some(node) = self.selected_node().filter(|n| n.is_file) else {
            return;
        };
        let (id, name) = (node.id, node.name.clone());
        let content = node.text().to_string();
        self.editor = TextBuffer::new(&content);
        self.open_dialog(DialogKind::EditContent { id, name });
    }

    /// Store the editor text as the file's content and close the dialog.
    pub fn save_edit(&mut self) {
        let AppMode::Dialog(DialogKind::EditContent { id, name }) = self.mode.clone() else {
            return;
        };
        let text = self.editor.text();
        self.close_dialog();
        if self.store.edit_content(id, &text) {
            self.editor.mark_saved();
            if self.commit() {
                self.set_status_message(format!("Saved {name}"));
            }
        } else {
            self.set_error_message(format!("{name} no longer exists"));
        }
    }

    /// Copy the editor text without closing the dialog.
    pub fn copy_edit(&mut self) {
        let text = self.editor.text();
        self.copy_to_clipboard(&text, "file content");
    }

    /// Ask for confirmation before deleting the selection, or delete right away
    /// when confirmation is disabled.
    pub fn request_delete(&mut self) {
        let Some(node) = self.selected_node() else {
            return;
        };
        let (id, name) = (node.id, node.name.clone());
        if id == NodeId::ROOT && self.store.snapshot().len() == 1 {
            self.set_status_message("Nothing to delete".to_string());
            return;
        }
        if self.confirm_delete {
            self.open_dialog(DialogKind::DeleteConfirm { id, name });
        } else {
            self.delete(id, &name);
        }
    }

    /// Delete the node named by the open confirmation dialog.
    pub fn confirm_delete_dialog(&mut self) {
        let AppMode::Dialog(DialogKind::DeleteConfirm { id, name }) = self.mode.clone() else {
            return;
        };
        self.close_dialog();
        self.delete(id, &name);
    }

    fn delete(&mut self, id: NodeId, name: &str) {
        let removed = self.store.delete_subtree(id);
        if removed == 0 {
            return;
        }
        if self.commit() {
            self.set_status_message(format!("Deleted {name} ({removed} removed)"));
        }
    }

    // ── Clipboard ────────────────────────────────────────────────────────────

    /// Copy the whole tree as indented text.
    pub fn copy_tree(&mut self) {
        let text = to_structured_text(self.store.snapshot());
        self.copy_to_clipboard(&text, "tree");
    }

    /// Copy the content of the selected file.
    pub fn copy_selected_file(&mut self) {
        let Some(node) = self.selected_node().filter(|n| n.is_file) else {
            return;
        };
        let (text, name) = (node.text().to_string(), node.name.clone());
        self.copy_to_clipboard(&text, &name);
    }

    fn copy_to_clipboard(&mut self, text: &str, what: &str) {
        match self.clipboard.copy_text(text) {
            Ok(()) => self.set_status_message(format!("Copied {what} to clipboard")),
            Err(err) => {
                warn!("clipboard copy failed: {err}");
                self.set_error_message(format!("Copy failed: {err}"));
            }
        }
    }

    // ── Tree navigation ──────────────────────────────────────────────────────

    pub fn selected_node(&self) -> Option<&Node> {
        self.view
            .selected_id()
            .and_then(|id| self.store.snapshot().get(id))
    }

    /// Toggle the selected folder, or open the edit dialog on a file.
    pub fn toggle_selected(&mut self) {
        let Some(node) = self.selected_node() else {
            return;
        };
        if node.is_file {
            self.open_edit_dialog();
            return;
        }
        let id = node.id;
        if self.store.toggle_open(id) {
            self.commit();
        }
    }

    /// Expand the selected folder (or no-op on files).
    pub fn expand_selected(&mut self) {
        if let Some(id) = self.view.selected_id() {
            if self.store.set_open(id, true) {
                self.commit();
            }
        }
    }

    /// Collapse the selected folder, or jump to parent if on a file or collapsed folder.
    pub fn collapse_selected(&mut self) {
        let Some(id) = self.view.selected_id() else {
            return;
        };
        if self.store.set_open(id, false) {
            self.commit();
        } else {
            self.view.select_parent();
        }
    }

    pub fn select_next(&mut self) {
        self.view.select_next();
    }

    pub fn select_previous(&mut self) {
        self.view.select_previous();
    }

    pub fn select_first(&mut self) {
        self.view.select_first();
    }

    pub fn select_last(&mut self) {
        self.view.select_last();
    }

    // ── Scratch pad ──────────────────────────────────────────────────────────

    pub fn focus_scratch(&mut self) {
        self.mode = AppMode::Scratch;
    }

    pub fn focus_tree(&mut self) {
        self.mode = AppMode::Normal;
    }

    /// Apply `edit` to the scratch buffer and save it if anything changed.
    pub fn edit_scratch(&mut self, edit: impl FnOnce(&mut TextBuffer)) {
        edit(&mut self.scratch);
        self.save_scratch();
    }

    // ── Dialog input ─────────────────────────────────────────────────────────

    /// Insert a character at the current cursor position.
    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog_state
            .input
            .insert(self.dialog_state.cursor_position, c);
        self.dialog_state.cursor_position += c.len_utf8();
    }

    /// Insert pasted text, dropping line breaks.
    pub fn dialog_input_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| *c != '\n' && *c != '\r') {
            self.dialog_input_char(c);
        }
    }

    /// Delete the character before the cursor (backspace).
    pub fn dialog_delete_char(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
            self.dialog_state
                .input
                .remove(self.dialog_state.cursor_position);
        }
    }

    /// Move cursor left by one character.
    pub fn dialog_move_cursor_left(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
        }
    }

    /// Move cursor right by one character.
    pub fn dialog_move_cursor_right(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(next) = self.dialog_state.input[pos..].chars().next() {
            self.dialog_state.cursor_position += next.len_utf8();
        }
    }

    /// Move cursor to the beginning of the input.
    pub fn dialog_cursor_home(&mut self) {
        self.dialog_state.cursor_position = 0;
    }

    /// Move cursor to the end of the input.
    pub fn dialog_cursor_end(&mut self) {
        self.dialog_state.cursor_position = self.dialog_state.input.len();
    }

    // ── Status ───────────────────────────────────────────────────────────────

    /// Set an informational status message with current timestamp.
    pub fn set_status_message(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now()));
        self.status_is_error = false;
    }

    pub fn set_error_message(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now()));
        self.status_is_error = true;
    }

    /// Clear the status message once it has been displayed long enough.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, ref created)) = self.status_message {
            if created.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                self.status_is_error = false;
            }
        }
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
