//! Page chrome around compiled markup: article header, outline navigation,
//! listing cards and the pager.

use std::fmt::Write;

use crate::document::{CompiledDocument, Document, PostSummary};
use crate::highlight::{HighlightBackground, stylesheet};
use crate::html::{escape_html, plain_text, push_escaped};
use crate::outline::Outline;
use crate::pagination::{PageIndicator, PageWindow};

/// Card descriptions longer than this many characters are cut.
pub const CARD_DESCRIPTION_CHARS: usize = 160;

const PAGE_STYLE: &str = "\
body{margin:0;font-family:system-ui,sans-serif;line-height:1.6}
.page{display:flex;gap:2rem;max-width:72rem;margin:0 auto;padding:2rem}
nav.outline{position:sticky;top:1rem;align-self:flex-start;min-width:14rem}
nav.outline a{display:block;text-decoration:none;color:inherit;opacity:.7}
nav.outline a.active{font-weight:600;opacity:1}
article{flex:1;min-width:0}
.embed iframe{border:0}
.pager a,.pager span{margin:0 .25rem}
";

/// Post header, body and related entities.
pub fn render_article(doc: &Document, compiled: &CompiledDocument) -> String {
    let mut html = String::from("<article class=\"post\">\n<header>\n");
    if !doc.title.is_empty() {
        html.push_str("<h1 class=\"post-title\">");
        push_escaped(&mut html, &doc.title);
        html.push_str("</h1>\n");
    }
    if let Some(cover) = doc.cover_image.as_deref().filter(|url| !url.is_empty()) {
        let _ = writeln!(
            html,
            "<img class=\"post-cover\" src=\"{}\" alt=\"{}\" />",
            escape_html(cover),
            escape_html(&doc.title)
        );
    }
    if let Some(description) = &doc.description {
        let _ = writeln!(
            html,
            "<p class=\"post-description\">{}</p>",
            escape_html(description)
        );
    }
    render_meta(&mut html, doc);
    html.push_str("</header>\n");

    if compiled.is_empty() {
        html.push_str("<p class=\"post-empty\">Nothing to show yet</p>\n");
    } else {
        html.push_str("<div class=\"post-body\">\n");
        html.push_str(&compiled.markup);
        html.push_str("</div>\n");
    }

    if !doc.related.is_empty() {
        html.push_str("<aside class=\"related\">\n<h2>Related</h2>\n<ul>\n");
        for entity in &doc.related {
            html.push_str("<li>");
            match entity.url.as_deref() {
                Some(url) => {
                    let _ = write!(
                        html,
                        "<a href=\"{}\">{}</a>",
                        escape_html(url),
                        escape_html(&entity.name)
                    );
                }
                None => push_escaped(&mut html, &entity.name),
            }
            html.push_str("</li>\n");
        }
        html.push_str("</ul>\n</aside>\n");
    }

    html.push_str("</article>\n");
    html
}

fn render_meta(html: &mut String, doc: &Document) {
    let mut items = Vec::new();
    if let Some(category) = &doc.category {
        items.push(format!(
            "<span class=\"post-category\">{}</span>",
            escape_html(category)
        ));
    }
    if let Some(rating) = doc.rating {
        items.push(format!("<span class=\"post-rating\">{rating:.1} / 5</span>"));
    }
    if let Some(created) = &doc.created_at {
        items.push(format!(
            "<time class=\"post-created\" datetime=\"{0}\">{0}</time>",
            escape_html(created)
        ));
    }
    if let Some(updated) = doc.updated_at.as_ref().filter(|u| Some(*u) != doc.created_at.as_ref()) {
        items.push(format!(
            "<span class=\"post-updated\">Updated <time datetime=\"{0}\">{0}</time></span>",
            escape_html(updated)
        ));
    }
    if !items.is_empty() {
        let _ = writeln!(html, "<p class=\"post-meta\">{}</p>", items.join(" "));
    }
}

/// Sidebar navigation for `outline`, marking `active`.
///
/// Indentation is relative to the shallowest heading present.
pub fn render_outline_nav(outline: &Outline, active: Option<&str>) -> String {
    let mut html = String::from("<nav class=\"outline\" aria-label=\"Contents\">\n");
    if outline.is_empty() {
        html.push_str("<p class=\"outline-empty\">No headings in this post</p>\n</nav>\n");
        return html;
    }

    let base = outline.min_level().unwrap_or(1);
    for entry in outline {
        let depth = entry.level.saturating_sub(base);
        let _ = write!(html, "<a class=\"depth-{depth}");
        if active == Some(entry.id.as_str()) {
            html.push_str(" active\" aria-current=\"location");
        }
        let _ = writeln!(
            html,
            "\" href=\"#{}\">{}</a>",
            escape_html(&entry.id),
            escape_html(&entry.text)
        );
    }
    html.push_str("</nav>\n");
    html
}

/// One post card on the index.
pub fn render_card(post: &PostSummary) -> String {
    let mut html = String::from("<div class=\"post-card\">\n");
    if let Some(cover) = post.cover_image.as_deref().filter(|url| !url.is_empty()) {
        let _ = writeln!(
            html,
            "<img class=\"post-card-cover\" src=\"{}\" alt=\"\" />",
            escape_html(cover)
        );
    }
    let _ = writeln!(
        html,
        "<h3><a href=\"/posts/{}\">{}</a></h3>",
        escape_html(&post.id),
        escape_html(&post.title)
    );
    if let Some(description) = &post.description {
        let text = truncate_chars(&plain_text(description), CARD_DESCRIPTION_CHARS);
        let _ = writeln!(html, "<p>{}</p>", escape_html(&text));
    }
    if let Some(category) = &post.category {
        let _ = writeln!(
            html,
            "<span class=\"post-category\">{}</span>",
            escape_html(category)
        );
    }
    if let Some(rating) = post.rating {
        let _ = writeln!(html, "<span class=\"post-rating\">{rating:.1} / 5</span>");
    }
    html.push_str("</div>\n");
    html
}

/// Cut `text` to at most `max` characters, ending on a word boundary when
/// one is close.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    let trimmed = match cut.rfind(char::is_whitespace) {
        Some(space) if space >= cut.len() / 2 => &cut[..space],
        _ => cut.as_str(),
    };
    format!("{}...", trimmed.trim_end())
}

/// Pager links for `window`.
pub fn render_pager(window: &PageWindow) -> String {
    if window.is_empty() {
        return "<nav class=\"pager\"><p class=\"pager-empty\">No results</p></nav>\n".to_string();
    }

    let mut html = String::from("<nav class=\"pager\" aria-label=\"Pages\">\n");
    if window.has_previous() {
        let _ = writeln!(
            html,
            "<a class=\"pager-prev\" href=\"?page={}\">Previous</a>",
            window.current_page() - 1
        );
    }
    for indicator in window.indicators() {
        match *indicator {
            PageIndicator::Page(page) if page == window.current_page() => {
                let _ = writeln!(html, "<span class=\"pager-current\" aria-current=\"page\">{page}</span>");
            }
            PageIndicator::Page(page) => {
                let _ = writeln!(html, "<a href=\"?page={page}\">{page}</a>");
            }
            PageIndicator::Ellipsis => {
                let _ = writeln!(html, "<span class=\"pager-gap\">{indicator}</span>");
            }
        }
    }
    if window.has_next() {
        let _ = writeln!(
            html,
            "<a class=\"pager-next\" href=\"?page={}\">Next</a>",
            window.current_page() + 1
        );
    }
    html.push_str("</nav>\n");
    html
}

/// A standalone HTML page around `body`.
pub fn render_page(title: &str, body: &str, background: HighlightBackground) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\" />\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n");
    let _ = writeln!(html, "<title>{}</title>", escape_html(title));
    html.push_str("<style>\n");
    html.push_str(PAGE_STYLE);
    html.push_str(&stylesheet(background));
    html.push_str("</style>\n</head>\n<body>\n<main class=\"page\">\n");
    html.push_str(body);
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, CompileCache, RelatedEntity};
    use crate::outline::OutlineEntry;
    use crate::pagination::paginate;
    use serde_json::json;

    fn entry(id: &str, level: u8) -> OutlineEntry {
        OutlineEntry {
            id: id.to_string(),
            text: id.to_uppercase(),
            level,
        }
    }

    #[test]
    fn test_outline_nav_marks_active_and_indents() {
        let outline = Outline::new(vec![entry("a", 2), entry("b", 3)]);
        let html = render_outline_nav(&outline, Some("b"));
        assert!(html.contains("<a class=\"depth-0\" href=\"#a\">A</a>"));
        assert!(html.contains(
            "<a class=\"depth-1 active\" aria-current=\"location\" href=\"#b\">B</a>"
        ));
    }

    #[test]
    fn test_outline_nav_empty_state() {
        let html = render_outline_nav(&Outline::default(), None);
        assert!(html.contains("No headings in this post"));
        assert!(!html.contains("<a "));
    }

    #[test]
    fn test_pager_markup() {
        let html = render_pager(&paginate(200, 9, 10));
        assert!(html.contains("<span class=\"pager-current\" aria-current=\"page\">10</span>"));
        assert_eq!(html.matches("pager-gap").count(), 2);
        assert!(html.contains("href=\"?page=23\""));
        assert!(html.contains("pager-prev"));
        assert!(html.contains("pager-next"));
    }

    #[test]
    fn test_pager_no_results() {
        let html = render_pager(&paginate(0, 9, 1));
        assert!(html.contains("No results"));
        assert!(!html.contains("href"));
    }

    #[test]
    fn test_card_escapes_and_truncates() {
        let post = PostSummary {
            id: "42".to_string(),
            title: "Fish & Chips".to_string(),
            description: Some("word ".repeat(60)),
            category: Some("Food".to_string()),
            ..PostSummary::default()
        };
        let html = render_card(&post);
        assert!(html.contains("Fish &amp; Chips"));
        assert!(html.contains("href=\"/posts/42\""));
        assert!(html.contains("...</p>"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("hello brave new world", 13), "hello brave...");
        assert_eq!(truncate_chars("ééééééé", 3), "ééé...");
    }

    #[test]
    fn test_article_with_metadata_and_related() {
        let mut doc = Document::from_blocks(
            "p1",
            vec![Block::new("paragraph", json!({ "text": "Body" }))],
        );
        doc.title = "Title".to_string();
        doc.category = Some("Study".to_string());
        doc.rating = Some(4.5);
        doc.related = vec![RelatedEntity {
            id: None,
            name: "TU Berlin".to_string(),
            url: Some("https://tu.berlin".to_string()),
        }];
        let compiled = CompileCache::default().get_or_compile(&doc);
        let html = render_article(&doc, &compiled);
        assert!(html.contains("<h1 class=\"post-title\">Title</h1>"));
        assert!(html.contains("4.5 / 5"));
        assert!(html.contains("<p>Body</p>"));
        assert!(html.contains("<a href=\"https://tu.berlin\">TU Berlin</a>"));
    }

    #[test]
    fn test_empty_article_has_explicit_state() {
        let doc = Document::from_blocks("empty", Vec::new());
        let compiled = CompileCache::default().get_or_compile(&doc);
        assert!(render_article(&doc, &compiled).contains("Nothing to show yet"));
    }

    #[test]
    fn test_page_wraps_body() {
        let html = render_page("A <b>", "<p>x</p>", HighlightBackground::Light);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>A &lt;b&gt;</title>"));
        assert!(html.contains("<p>x</p>"));
    }
}
