//! marksight - a terminal Markdown viewer.
//!
//! # Usage
//!
//! ```bash
//! marksight README.md
//! marksight --theme dark README.md
//! marksight --export page.html README.md
//! ```

use std::fs::File;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing_subscriber::EnvFilter;

use marksight::app::App;
use marksight::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use marksight::document::Document;
use marksight::files::read_markdown_file;
use marksight::theme::{ThemeMode, apply_theme, system_prefers_dark};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "MARKSIGHT_LOG";

/// A terminal Markdown viewer with vi keys, search and live reload
#[derive(Parser, Debug)]
#[command(name = "marksight", version, about, long_about = None)]
struct Cli {
    /// Markdown file to view
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Appearance: system, light or dark
    #[arg(long, value_enum)]
    theme: Option<ThemeMode>,

    /// Do not reload the file when it changes on disk
    #[arg(long)]
    no_watch: bool,

    /// Write the rendered page as standalone HTML and exit
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Write logs to a file (filter with MARKSIGHT_LOG)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

// Query the terminal background using OSC 11.
// We talk to /dev/tty so the terminal responds even when stdout is piped.
// On non-Unix platforms we skip the query entirely because the fallback
// (stdin/stdout) leaves an orphaned reader thread that blocks the console
// input buffer, preventing crossterm from receiving any keyboard events.
#[cfg(not(unix))]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    Ok(None)
}

#[cfg(unix)]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    use std::io::{Read, Write};
    use std::sync::mpsc;

    let (tx, rx) = mpsc::channel();

    let mut io = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/tty")?;
    let reader = io.try_clone()?;

    // OSC 11 query: ESC ] 11 ; ? BEL
    io.write_all(b"\x1b]11;?\x07")?;
    io.flush()?;

    std::thread::spawn(move || {
        let mut reader = reader;
        let mut buf = [0u8; 256];
        let mut collected: Vec<u8> = Vec::new();
        loop {
            match reader.read(&mut buf) {
                Ok(0) => {}
                Ok(n) => {
                    collected.extend_from_slice(&buf[..n]);
                    if collected.contains(&b'\x07') || collected.windows(2).any(|w| w == b"\x1b\\")
                    {
                        let _ = tx.send(collected);
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let collected = rx
        .recv_timeout(Duration::from_millis(75))
        .unwrap_or_default();
    let text = String::from_utf8_lossy(&collected);
    Ok(parse_osc11_reply(&text))
}

fn is_dark_rgb(r: u8, g: u8, b: u8) -> bool {
    let luma = 0.0722f32.mul_add(
        f32::from(b),
        0.2126f32.mul_add(f32::from(r), 0.7152 * f32::from(g)),
    );
    luma < 140.0
}

/// Whether the terminal background is dark: asked of the terminal first,
/// then guessed from the environment.
fn detect_system_dark() -> bool {
    if !std::io::stdout().is_terminal() {
        return system_prefers_dark();
    }
    let _raw = enable_raw_mode();
    let result = query_terminal_background();
    let _ = disable_raw_mode();
    match result {
        Ok(Some((r, g, b))) => is_dark_rgb(r, g, b),
        _ => system_prefers_dark(),
    }
}

fn parse_osc11_reply(reply: &str) -> Option<(u8, u8, u8)> {
    // Expect: ESC ] 11 ; rgb:RRRR/GGGG/BBBB BEL or ST
    let start = reply.find("rgb:")?;
    let data = &reply[start + 4..];
    let mut parts = data.split(['/', '\x07', '\x1b']);
    let r = parts.next()?;
    let g = parts.next()?;
    let b = parts.next()?;
    Some((
        parse_osc_component(r)?,
        parse_osc_component(g)?,
        parse_osc_component(b)?,
    ))
}

fn parse_osc_component(s: &str) -> Option<u8> {
    let hex = s.trim();
    if hex.len() >= 4 {
        let v = u16::from_str_radix(hex.get(..4)?, 16).ok()?;
        u8::try_from(v >> 8).ok()
    } else if hex.len() == 2 {
        u8::from_str_radix(hex, 16).ok()
    } else {
        None
    }
}

/// Install the log subscriber. The terminal belongs to the viewer, so the
/// interactive mode only logs when a file is given.
fn init_logging(log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    if let Some(path) = log_file {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if !interactive {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn export_page(file: Option<&Path>, theme: ThemeMode, out: &Path) -> Result<()> {
    let Some(file) = file else {
        anyhow::bail!("--export needs a FILE to render");
    };
    let source =
        read_markdown_file(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let base_dir = file.parent().map(Path::to_path_buf);
    let mut doc = Document::from_markdown(&source, base_dir);
    apply_theme(&mut doc, theme);
    std::fs::write(out, doc.page_html())
        .with_context(|| format!("Failed to write {}", out.display()))?;
    tracing::info!(path = %out.display(), "page exported");
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);
    let theme = cli.theme.or(effective.theme).unwrap_or_default();

    init_logging(effective.log_file.as_deref(), cli.export.is_none())?;

    if let Some(out) = &cli.export {
        return export_page(cli.file.as_deref(), theme, out);
    }

    let system_dark = if theme == ThemeMode::System {
        detect_system_dark()
    } else {
        system_prefers_dark()
    };

    // Run the application
    let mut app = App::new(cli.file)
        .with_watch(!(effective.no_watch || cli.no_watch))
        .with_theme(theme)
        .with_system_dark(system_dark)
        .with_config_paths(
            Some(global_path.clone()),
            if local_path.exists() {
                Some(local_path.clone())
            } else {
                None
            },
        );

    app.run().context("Application error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_osc11_reply_four_digit_components() {
        let reply = "\x1b]11;rgb:ffff/8080/0000\x07";
        assert_eq!(parse_osc11_reply(reply), Some((255, 128, 0)));
    }

    #[test]
    fn test_parse_osc11_reply_rejects_garbage() {
        assert_eq!(parse_osc11_reply("nothing here"), None);
        assert_eq!(parse_osc11_reply("rgb:zz/00/00"), None);
    }

    #[test]
    fn test_dark_and_light_backgrounds() {
        assert!(is_dark_rgb(13, 17, 23));
        assert!(!is_dark_rgb(255, 255, 255));
    }

    #[test]
    fn test_export_writes_standalone_page() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.md");
        let out = dir.path().join("doc.html");
        std::fs::write(&file, "# Hello\n\nBody").unwrap();
        export_page(Some(&file), ThemeMode::Dark, &out).unwrap();
        let html = std::fs::read_to_string(&out).unwrap();
        assert!(html.contains("theme-dark"));
        assert!(html.contains("Hello"));
    }

    #[test]
    fn test_export_needs_a_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(export_page(None, ThemeMode::Light, &dir.path().join("x.html")).is_err());
    }
}
