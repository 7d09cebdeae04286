//! Block to HTML transcoding.
//!
//! One rendering rule per block type. Transcoding is a pure function of the
//! block and its [`BlockContext`]; it never fails; malformed payloads render
//! from whatever fields are present.

use std::fmt::Write;

use super::block::{
    Block, BlockContent, ChecklistBlock, CodeBlock, EmbedBlock, HeaderBlock, ImageBlock,
    ListBlock, ListItem, ListStyle, QuoteBlock, TableBlock,
};
use crate::html::{escape_html, push_escaped};

/// Per-block values decided at document level.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockContext<'a> {
    /// Unique anchor id allocated for a header block
    pub heading_id: Option<&'a str>,
}

/// Services whose player URL may be framed inline.
const EMBED_SERVICES: &[&str] = &[
    "youtube",
    "vimeo",
    "coub",
    "codepen",
    "twitch-video",
    "twitch-channel",
    "instagram",
    "twitter",
    "facebook",
    "gfycat",
    "imgur",
    "pinterest",
    "yandex-music-track",
    "yandex-music-album",
    "yandex-music-playlist",
    "aparat",
    "miro",
];

/// Aspect ratio used when an embed carries no usable dimensions.
const DEFAULT_EMBED_RATIO: (u32, u32) = (16, 9);

/// Render one block to an HTML fragment.
pub fn transcode_block(block: &Block, ctx: &BlockContext<'_>) -> String {
    let mut html = String::new();

    match block.content() {
        BlockContent::Header(header) => render_header(&mut html, &header, ctx.heading_id),
        BlockContent::Paragraph(paragraph) => {
            let _ = writeln!(html, "<p>{}</p>", paragraph.text);
        }
        BlockContent::List(list) => render_list(&mut html, &list),
        BlockContent::Embed(embed) => render_embed(&mut html, &embed),
        BlockContent::Table(table) => render_table(&mut html, &table),
        BlockContent::Delimiter => html.push_str("<hr class=\"delimiter\" />\n"),
        BlockContent::Quote(quote) => render_quote(&mut html, &quote),
        BlockContent::Code(code) => render_code(&mut html, &code),
        BlockContent::Image(image) => render_image(&mut html, &image),
        BlockContent::Checklist(checklist) => render_checklist(&mut html, &checklist),
        BlockContent::Raw(raw) => {
            html.push_str(&raw.html);
            html.push('\n');
        }
        BlockContent::Unknown(kind) => {
            tracing::warn!(
                block_type = %kind,
                block_id = block.id.as_deref().unwrap_or(""),
                "skipping unsupported block type"
            );
        }
    }

    html
}

fn render_header(html: &mut String, header: &HeaderBlock, id: Option<&str>) {
    let level = header.level.clamp(1, 6);
    let _ = write!(html, "<h{level}");
    if let Some(id) = id.filter(|id| !id.is_empty()) {
        html.push_str(" id=\"");
        push_escaped(html, id);
        html.push('"');
    }
    let _ = writeln!(html, ">{}</h{level}>", header.text);
}

fn render_list(html: &mut String, list: &ListBlock) {
    let tag = match list.style {
        ListStyle::Ordered => "ol",
        ListStyle::Unordered => "ul",
    };
    render_list_items(html, tag, &list.items);
}

fn render_list_items(html: &mut String, tag: &str, items: &[ListItem]) {
    let _ = writeln!(html, "<{tag}>");
    for item in items {
        html.push_str("<li>");
        html.push_str(&item.content);
        if !item.items.is_empty() {
            html.push('\n');
            render_list_items(html, tag, &item.items);
        }
        html.push_str("</li>\n");
    }
    let _ = writeln!(html, "</{tag}>");
}

fn render_embed(html: &mut String, embed: &EmbedBlock) {
    let service = embed.service.as_deref().unwrap_or_default();
    let recognized = EMBED_SERVICES.contains(&service);

    match (recognized, embed.embed.as_deref()) {
        (true, Some(player)) => {
            let (width, height) = match (embed.width, embed.height) {
                (Some(w), Some(h)) => (w, h),
                _ => DEFAULT_EMBED_RATIO,
            };
            // Padding-bottom percentage keeps the frame's aspect ratio at any width.
            let ratio = f64::from(height) / f64::from(width) * 100.0;
            let _ = write!(
                html,
                "<figure class=\"embed embed-{}\">\n<div class=\"embed-frame\" style=\"position:relative;padding-bottom:{ratio:.2}%;height:0;overflow:hidden\">",
                escape_html(service)
            );
            html.push_str(
                "<iframe style=\"position:absolute;top:0;left:0;width:100%;height:100%\" src=\"",
            );
            push_escaped(html, player);
            html.push_str(
                "\" frameborder=\"0\" allowfullscreen loading=\"lazy\"></iframe></div>\n",
            );
        }
        _ => {
            let Some(url) = embed.source.as_deref().or(embed.embed.as_deref()) else {
                tracing::warn!(service, "embed block has no source url");
                html.push_str("<p class=\"embed-missing\">Embedded content unavailable</p>\n");
                return;
            };
            html.push_str("<figure class=\"embed embed-link\">\n<a href=\"");
            push_escaped(html, url);
            html.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
            push_escaped(html, url);
            html.push_str("</a>\n");
        }
    }

    if let Some(caption) = &embed.caption {
        let _ = writeln!(html, "<figcaption>{caption}</figcaption>");
    }
    html.push_str("</figure>\n");
}

fn render_table(html: &mut String, table: &TableBlock) {
    let Some((head, body)) = table.rows.split_first() else {
        html.push_str("<table></table>\n");
        return;
    };

    html.push_str("<table>\n<thead>\n<tr>");
    for cell in head {
        let _ = write!(html, "<th>{cell}</th>");
    }
    html.push_str("</tr>\n</thead>\n");

    if !body.is_empty() {
        html.push_str("<tbody>\n");
        for row in body {
            html.push_str("<tr>");
            for cell in row {
                let _ = write!(html, "<td>{cell}</td>");
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n");
    }
    html.push_str("</table>\n");
}

fn render_quote(html: &mut String, quote: &QuoteBlock) {
    let _ = write!(html, "<blockquote>\n<p>{}</p>\n", quote.text);
    if let Some(caption) = &quote.caption {
        let _ = writeln!(html, "<cite>{caption}</cite>");
    }
    html.push_str("</blockquote>\n");
}

fn render_code(html: &mut String, code: &CodeBlock) {
    html.push_str("<pre><code");
    if let Some(lang) = &code.language {
        html.push_str(" class=\"language-");
        push_escaped(html, lang);
        html.push('"');
    }
    html.push('>');
    match crate::highlight::highlight_html(code.language.as_deref(), &code.code) {
        Some(highlighted) => html.push_str(&highlighted),
        None => push_escaped(html, &code.code),
    }
    html.push_str("</code></pre>\n");
}

fn render_image(html: &mut String, image: &ImageBlock) {
    let Some(url) = &image.url else {
        tracing::warn!("image block has no url");
        return;
    };
    let mut classes = vec!["image"];
    if image.with_border {
        classes.push("image-border");
    }
    if image.stretched {
        classes.push("image-stretched");
    }
    if image.with_background {
        classes.push("image-background");
    }
    let _ = write!(html, "<figure class=\"{}\">\n<img src=\"", classes.join(" "));
    push_escaped(html, url);
    html.push_str("\" alt=\"");
    if let Some(caption) = &image.caption {
        push_escaped(html, &crate::html::plain_text(caption));
    }
    html.push_str("\" loading=\"lazy\" />\n");
    if let Some(caption) = &image.caption {
        let _ = writeln!(html, "<figcaption>{caption}</figcaption>");
    }
    html.push_str("</figure>\n");
}

fn render_checklist(html: &mut String, checklist: &ChecklistBlock) {
    html.push_str("<ul class=\"checklist\">\n");
    for item in &checklist.items {
        let (class, mark) = if item.checked {
            ("checked", "&#9745;")
        } else {
            ("unchecked", "&#9744;")
        };
        let _ = writeln!(
            html,
            "<li class=\"{class}\"><span class=\"checkbox\">{mark}</span> {}</li>",
            item.text
        );
    }
    html.push_str("</ul>\n");
}
