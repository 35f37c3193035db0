//! quiet-text - print a file with syntax highlighting

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use tracing_subscriber::EnvFilter;

use quiet_text::config::Settings;
use quiet_text::editor::Editor;
use quiet_text::error::{EditorError, Result};
use quiet_text::render::Renderer;
use quiet_text::session::EditorSession;
use quiet_text::syntax::GrammarRegistry;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Parsed command line
#[derive(Debug, Default)]
struct Options {
    grammar: Option<PathBuf>,
    settings: Option<PathBuf>,
    no_color: bool,
    file: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Option<Options>> {
    let mut opts = Options::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(None);
            }
            "--version" | "-V" => {
                print_version();
                return Ok(None);
            }
            "--grammar" | "-g" => {
                let path = iter.next().ok_or_else(|| missing_value(arg))?;
                opts.grammar = Some(PathBuf::from(path));
            }
            "--settings" | "-s" => {
                let path = iter.next().ok_or_else(|| missing_value(arg))?;
                opts.settings = Some(PathBuf::from(path));
            }
            "--no-color" => opts.no_color = true,
            other if other.starts_with('-') => {
                return Err(EditorError::Message(format!("unknown option: {}", other)));
            }
            file => opts.file = Some(PathBuf::from(file)),
        }
    }
    Ok(Some(opts))
}

fn missing_value(flag: &str) -> EditorError {
    EditorError::Message(format!("{} needs a value", flag))
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let Some(opts) = parse_args(&args)? else {
        return Ok(());
    };
    let Some(file) = opts.file else {
        print_usage();
        return Err(EditorError::NoFile);
    };

    let mut registry = GrammarRegistry::with_builtins();
    let forced = opts
        .grammar
        .as_deref()
        .and_then(|path| load_grammar(&mut registry, path));

    let settings_path = opts.settings.unwrap_or_else(Settings::default_path);
    let session = EditorSession::new(settings_path);
    let tab_size = session.settings().tab_size;

    let mut editor = Editor::new(session, registry);
    editor.open_file(&file)?;
    if let Some(language) = forced {
        editor.set_language(&language);
    }
    tracing::info!(language = ?editor.language(), "rendering {}", file.display());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    Renderer::new(tab_size)
        .with_color(!opts.no_color)
        .render(&editor.document, &mut out)?;
    Ok(())
}

/// Register the grammar given on the command line
///
/// A grammar that fails to load is logged and the file is printed without
/// highlighting.
fn load_grammar(registry: &mut GrammarRegistry, path: &Path) -> Option<String> {
    match registry.load_file(path) {
        Ok(grammar) => Some(grammar.language.clone()),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "grammar not loaded, printing plain text");
            None
        }
    }
}

fn print_usage() {
    println!("quiet-text {} - syntax highlighted file printer", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: quiet-text [OPTIONS] FILE");
    println!();
    println!("Options:");
    println!("  -g, --grammar FILE   Highlight with this grammar document");
    println!("  -s, --settings FILE  Read settings from FILE (default config/settings.toml)");
    println!("      --no-color       Print without colors");
    println!("  -h, --help           Show this help message");
    println!("  -V, --version        Show version information");
    println!();
    println!("Set RUST_LOG=debug to see highlighting diagnostics.");
}

fn print_version() {
    println!("quiet-text {}", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("quiet-text").chain(list.iter().copied()).map(String::from).collect()
    }

    #[test]
    fn test_parse_args() {
        let opts = parse_args(&args(&["--grammar", "g.toml", "--no-color", "f.py"]))
            .unwrap()
            .unwrap();
        assert_eq!(opts.grammar, Some(PathBuf::from("g.toml")));
        assert!(opts.no_color);
        assert_eq!(opts.file, Some(PathBuf::from("f.py")));
        assert!(opts.settings.is_none());
    }

    #[test]
    fn test_load_grammar() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let good = dir.path().join("toy.toml");
        std::fs::write(&good, "language = 'toy'\n[[rules]]\nname = 'n'\npattern = '\\d+'\n").unwrap();
        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "language = 'broken'\n[[rules]]\nname = 'n'\n").unwrap();

        let mut registry = GrammarRegistry::with_builtins();
        assert_eq!(load_grammar(&mut registry, &good), Some("toy".to_string()));
        assert_eq!(load_grammar(&mut registry, &broken), None);
        assert_eq!(load_grammar(&mut registry, &dir.path().join("missing.toml")), None);
        assert_eq!(registry.languages(), vec!["python", "toy"]);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&["--settings"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
    }
}
