mod app;
mod clipboard;
mod components;
mod config;
mod editor;
mod error;
mod event;
mod handler;
mod logging;
mod persist;
mod theme;
mod tree;
mod tui;
mod ui;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use crate::app::App;
use crate::clipboard::Osc52Clipboard;
use crate::components::editor::Highlighter;
use crate::config::{AppConfig, GeneralConfig, ThemeConfig};
use crate::event::{Event, EventHandler};
use crate::persist::JsonStore;
use crate::tree::{to_structured_text, Snapshot};
use crate::tui::{install_panic_hook, Tui};

/// Sketch a project layout as a virtual folder/file tree and copy it as text.
#[derive(Parser, Debug)]
#[command(name = "sketch", version, about)]
struct Cli {
    /// Path to a config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory holding the saved tree and notes
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Color scheme: dark, light or custom
    #[arg(long, value_name = "NAME")]
    theme: Option<String>,

    /// Print the saved tree as indented text and exit
    #[arg(long)]
    print: bool,
}

impl Cli {
    /// Partial config built from the flags that were given.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                data_dir: self
                    .data_dir
                    .as_ref()
                    .map(|dir| dir.to_string_lossy().into_owned()),
                ..Default::default()
            },
            theme: ThemeConfig {
                scheme: self.theme.clone(),
                custom: None,
            },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let (config, config_warnings) = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    let data_dir = config.data_dir();
    if data_dir.is_file() {
        return Err(error::AppError::InvalidPath(format!(
            "{} is a file, expected a data directory",
            data_dir.display()
        )));
    }
    let store = JsonStore::new(&data_dir);

    if cli.print {
        for warning in &config_warnings {
            eprintln!("sketch: {warning}");
        }
        return print_tree(&store, &mut std::io::stdout().lock());
    }

    let _log_guard = logging::init(&config.log_dir(), config.log_level())?;
    for warning in &config_warnings {
        warning.log();
    }
    info!(
        data_dir = %data_dir.display(),
        scheme = config.theme_scheme(),
        "starting sketch"
    );

    let mut app = App::new(&config, Box::new(store), Box::new(Osc52Clipboard::stdout()))?;
    let highlighter = Highlighter::new(config.syntax_theme_name());

    install_panic_hook();
    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(100));

    let result = run(&mut tui, &mut app, &highlighter, &mut events).await;
    tui.restore()?;
    if let Err(err) = &result {
        error!("exiting after error: {err}");
    } else {
        info!("bye");
    }
    result
}

/// Write the saved tree as indented text. Read-only: an unreadable tree file
/// is reported as an error and left in place.
fn print_tree(store: &JsonStore, out: &mut impl Write) -> error::Result<()> {
    let nodes = store.read_nodes()?;
    let text = to_structured_text(&Snapshot::from_records(nodes));
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

async fn run(
    tui: &mut Tui,
    app: &mut App,
    highlighter: &Highlighter,
    events: &mut EventHandler,
) -> error::Result<()> {
    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(app, highlighter, frame);
        })?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(app, key),
            Event::Paste(text) => handler::handle_paste(app, &text),
            Event::Tick => app.clear_expired_status(),
            Event::Resize(_, _) => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::Persistence;
    use crate::tree::TreeStore;

    #[test]
    fn cli_flags_become_overrides() {
        let cli = Cli::parse_from(["sketch", "--data-dir", "/tmp/sketch", "--theme", "light"]);
        let overrides = cli.overrides();
        assert_eq!(overrides.general.data_dir.as_deref(), Some("/tmp/sketch"));
        assert_eq!(overrides.theme.scheme.as_deref(), Some("light"));
        assert!(overrides.general.confirm_delete.is_none());
        assert!(!cli.print);
    }

    #[test]
    fn print_tree_writes_saved_tree() {
        let dir = tempfile::tempdir().unwrap();
        let mut tree = TreeStore::default();
        tree.add_path("src/main.rs");
        tree.add_path("readme.md");
        let main = tree.snapshot().find_by_path("app/src/main.rs").unwrap().id;
        tree.edit_content(main, "fn main() {}");
        JsonStore::new(dir.path()).save(tree.snapshot().nodes()).unwrap();

        let mut out = Vec::new();
        print_tree(&JsonStore::new(dir.path()), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "src\n  main.rs\n    fn main() {}\nreadme.md\n"
        );
    }

    #[test]
    fn print_tree_of_empty_data_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        print_tree(&JsonStore::new(dir.path()), &mut out).unwrap();
        assert!(out.is_empty());
        assert!(!dir.path().join(persist::TREE_FILE).exists());
    }

    #[test]
    fn print_tree_leaves_unreadable_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let tree_file = dir.path().join(persist::TREE_FILE);
        std::fs::write(&tree_file, "{ broken").unwrap();

        let mut out = Vec::new();
        let err = print_tree(&JsonStore::new(dir.path()), &mut out).unwrap_err();
        assert!(matches!(err, error::AppError::Persistence(_)));
        assert!(tree_file.exists());
        assert!(!dir.path().join("tree.json.bak").exists());
        assert!(out.is_empty());
    }

    #[test]
    fn overrides_win_over_defaults() {
        let cli = Cli::parse_from(["sketch", "--theme", "light"]);
        let config = AppConfig::default().merge(&cli.overrides());
        assert_eq!(config.theme_scheme(), "light");
        assert!(config.confirm_delete());
    }
}
