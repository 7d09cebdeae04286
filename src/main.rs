//! Blockpress - render block-structured blog posts.
//!
//! # Usage
//!
//! ```bash
//! blockpress render post.json --out post.html
//! blockpress render post.json --out post.html --watch
//! blockpress outline post.json
//! blockpress list posts.json --page 2 --query visa
//! ```

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use blockpress::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use blockpress::document::{Document, load_document, load_index};
use blockpress::highlight::HighlightBackground;
use blockpress::perf;
use blockpress::signal::Signal;
use blockpress::view::{DocumentView, ListingChange, ListingParams, ListingView, chrome};
use blockpress::watcher::{DEFAULT_DEBOUNCE, DocumentWatcher};

const WATCH_POLL: Duration = Duration::from_millis(250);
const TITLE_COLUMNS: usize = 48;
const CATEGORY_COLUMNS: usize = 16;

/// Render block-structured blog posts to HTML
#[derive(Parser, Debug)]
#[command(name = "blockpress", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Syntax highlight stylesheet background
    #[arg(long, global = true, value_enum)]
    theme: Option<HighlightBackground>,

    /// Pixels below the scroll offset that still count as "reached"
    #[arg(long, global = true, value_name = "PX")]
    scroll_threshold: Option<u32>,

    /// Log timing scopes
    #[arg(long, global = true)]
    perf: bool,

    /// Write detailed compile/render debug events to a file
    #[arg(long, global = true, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long, global = true)]
    save: bool,

    /// Clear saved defaults
    #[arg(long, global = true)]
    clear: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a post to HTML
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,

        /// Re-render whenever the post file changes
        #[arg(short, long)]
        watch: bool,

        /// Emit only the compiled body markup
        #[arg(long)]
        fragment: bool,
    },
    /// Print the heading outline of a post
    Outline {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print one page of the blog index
    List {
        #[arg(value_name = "INDEX")]
        index: PathBuf,

        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Only posts whose title, description or category contain every word
        #[arg(long, default_value = "")]
        query: String,

        #[arg(long)]
        category: Option<String>,

        #[arg(long, value_name = "N")]
        page_size: Option<usize>,

        /// Emit the listing as HTML instead of a table
        #[arg(long)]
        html: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

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

    perf::set_enabled(effective.perf || cli.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("BLOCKPRESS_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        tracing::warn!(
            path = %render_debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            %err,
            "failed to initialize render debug log"
        );
    }
    tracing::debug!(flags = ?effective, theme = ?cli.theme, threshold = ?cli.scroll_threshold, "effective configuration");

    match cli.command {
        Command::Render {
            file,
            out,
            watch,
            fragment,
        } => render(&file, out.as_deref(), watch || effective.watch, fragment, &effective),
        Command::Outline { file } => outline(&file),
        Command::List {
            index,
            page,
            query,
            category,
            page_size,
            html,
        } => {
            let params = ListingParams {
                page,
                page_size: page_size.unwrap_or_else(|| effective.page_size()),
                query,
                category,
            };
            list(&index, params, html)
        }
    }
}

fn load(file: &Path) -> Result<Document> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }
    load_document(file).with_context(|| format!("Failed to load post {}", file.display()))
}

fn render(
    file: &Path,
    out: Option<&Path>,
    watch: bool,
    fragment: bool,
    flags: &ConfigFlags,
) -> Result<()> {
    let documents = Signal::new();
    let scroll = Signal::new();
    let view = DocumentView::attach(&documents, &scroll, flags.scroll_threshold());
    documents.emit(&load(file)?);
    write_output(&view, out, fragment, flags.theme())?;

    if !watch {
        return Ok(());
    }
    let mut watcher = DocumentWatcher::new(file, DEFAULT_DEBOUNCE)
        .with_context(|| format!("Failed to watch {}", file.display()))?;
    eprintln!("Watching {} (Ctrl-C to stop)", watcher.target_path().display());
    loop {
        if watcher.poll_into(&documents) {
            write_output(&view, out, fragment, flags.theme())?;
        }
        std::thread::sleep(WATCH_POLL);
    }
}

fn write_output(
    view: &DocumentView,
    out: Option<&Path>,
    fragment: bool,
    theme: HighlightBackground,
) -> Result<()> {
    let _scope = perf::scope("render.output");
    let html = if fragment {
        view.compiled()
            .map(|compiled| compiled.markup.clone())
            .unwrap_or_default()
    } else {
        let title = view.document().map(|doc| doc.title.clone()).unwrap_or_default();
        chrome::render_page(&title, &view.render().unwrap_or_default(), theme)
    };

    match out {
        Some(path) => {
            fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(html.as_bytes()).context("Failed to write output")?;
            stdout.flush().context("Failed to write output")?;
        }
    }
    Ok(())
}

fn outline(file: &Path) -> Result<()> {
    let documents = Signal::new();
    let scroll = Signal::new();
    let view = DocumentView::attach(&documents, &scroll, 0.0);
    documents.emit(&load(file)?);

    let outline = view.outline();
    if outline.is_empty() {
        println!("No headings in this post");
        return Ok(());
    }
    let base = outline.min_level().unwrap_or(1);
    for entry in &outline {
        let indent = "  ".repeat(usize::from(entry.level.saturating_sub(base)));
        println!("{indent}- {} (#{})", entry.text, entry.id);
    }
    Ok(())
}

fn list(index: &Path, params: ListingParams, html: bool) -> Result<()> {
    let posts = load_index(index)
        .with_context(|| format!("Failed to load index {}", index.display()))?;
    let changes = Signal::<ListingChange>::new();
    let view = ListingView::attach(posts, params, &changes);

    if html {
        print!("{}", view.render());
        return Ok(());
    }

    let window = view.window();
    if window.is_empty() {
        println!("No results");
        return Ok(());
    }
    for post in view.page_items() {
        println!(
            "{}  {}  {}",
            fit(&post.title, TITLE_COLUMNS),
            fit(post.category.as_deref().unwrap_or("-"), CATEGORY_COLUMNS),
            post.id
        );
    }
    let pager = window
        .indicators()
        .iter()
        .map(|indicator| match indicator {
            blockpress::pagination::PageIndicator::Page(page) if *page == window.current_page() => {
                format!("[{page}]")
            }
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");
    println!();
    println!("{pager}  ({} posts)", view.matched());
    Ok(())
}

/// Pad or cut `text` to exactly `columns` terminal cells.
fn fit(text: &str, columns: usize) -> String {
    if text.width() <= columns {
        let pad = columns - text.width();
        return format!("{text}{}", " ".repeat(pad));
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > columns {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(columns.saturating_sub(used)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_pads_short_text() {
        assert_eq!(fit("abc", 5), "abc  ");
    }

    #[test]
    fn test_fit_truncates_wide_text_by_cells() {
        let out = fit("日本語のタイトル", 7);
        assert_eq!(out.width(), 7);
        assert!(out.starts_with("日本語"));
        assert!(out.contains('…'));
    }

    #[test]
    fn test_cli_parses_list_command() {
        let cli = Cli::try_parse_from([
            "blockpress",
            "list",
            "posts.json",
            "--page",
            "3",
            "--category",
            "Visa",
        ])
        .unwrap();
        match cli.command {
            Command::List { page, category, .. } => {
                assert_eq!(page, 3);
                assert_eq!(category.as_deref(), Some("Visa"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
