//! Syntax highlighting for code blocks.
//!
//! Uses syntect to emit class-annotated HTML spans. The matching stylesheet
//! comes from [`stylesheet`], so one compiled document can be shown under
//! either page theme.

use std::sync::OnceLock;

use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Page background the stylesheet is generated for.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightBackground {
    Light,
    Dark,
}

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Highlight `code` as `language`, returning the inner HTML of a `<code>`
/// element.
///
/// Returns `None` when no syntax matches the language tag; callers fall
/// back to escaped plain text.
pub fn highlight_html(language: Option<&str>, code: &str) -> Option<String> {
    let language = language?.trim();
    if language.is_empty() {
        return None;
    }
    let syntax_set = syntax_set();
    let syntax = syntax_set
        .find_syntax_by_token(language)
        .or_else(|| syntax_set.find_syntax_by_name(language))?;

    let _scope = crate::perf::scope("highlight.code_block");
    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, CLASS_STYLE);
    for line in LinesWithEndings::from(code) {
        if let Err(err) = generator.parse_html_for_line_which_includes_newline(line) {
            tracing::warn!(language, %err, "syntax highlighting failed, using plain text");
            return None;
        }
    }
    Some(generator.finalize())
}

/// CSS rules for the highlighted spans under the given background.
pub fn stylesheet(background: HighlightBackground) -> String {
    match css_for_theme_with_class_style(theme(background), CLASS_STYLE) {
        Ok(css) => css,
        Err(err) => {
            tracing::warn!(%err, "failed to build highlight stylesheet");
            String::new()
        }
    }
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set.load_defaults");
        SyntaxSet::load_defaults_newlines()
    })
}

fn theme_set() -> &'static ThemeSet {
    static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.theme.load_defaults");
        ThemeSet::load_defaults()
    })
}

fn theme(background: HighlightBackground) -> &'static Theme {
    static DARK: OnceLock<Theme> = OnceLock::new();
    static LIGHT: OnceLock<Theme> = OnceLock::new();
    let (cell, preferred) = match background {
        HighlightBackground::Dark => (
            &DARK,
            [
                "Monokai Extended",
                "Dracula",
                "Solarized (dark)",
                "base16-ocean.dark",
            ]
            .as_slice(),
        ),
        HighlightBackground::Light => (
            &LIGHT,
            ["InspiredGitHub", "Solarized (light)", "base16-ocean.light"].as_slice(),
        ),
    };
    cell.get_or_init(|| {
        let themes = &theme_set().themes;
        preferred
            .iter()
            .find_map(|name| themes.get(*name))
            .or_else(|| themes.values().next())
            .cloned()
            .unwrap_or_default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_rust_produces_classed_spans() {
        let html = highlight_html(Some("rust"), "fn main() {\n    let x = 1;\n}\n")
            .expect("rust syntax should be bundled");
        assert!(html.contains("<span class=\"hl-"), "got: {html}");
        assert!(html.contains("main"));
    }

    #[test]
    fn test_highlight_escapes_markup_in_code() {
        let html = highlight_html(Some("html"), "<b>bold</b>\n").expect("html syntax");
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;"));
    }

    #[test]
    fn test_highlight_unknown_language_is_none() {
        assert!(highlight_html(Some("nope-lang"), "just text").is_none());
    }

    #[test]
    fn test_highlight_without_language_is_none() {
        assert!(highlight_html(None, "plain").is_none());
        assert!(highlight_html(Some("  "), "plain").is_none());
    }

    #[test]
    fn test_stylesheets_differ_by_background() {
        let dark = stylesheet(HighlightBackground::Dark);
        let light = stylesheet(HighlightBackground::Light);
        assert!(dark.contains(".hl-"));
        assert_ne!(dark, light);
    }
}
