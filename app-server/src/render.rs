//! HTML for the chat page.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

use crate::config::UiConfig;
use crate::session::{Role, Transcript};

const STYLE: &str = "\
body{margin:0;font-family:system-ui,sans-serif;display:flex;min-height:100vh}
aside{width:16rem;padding:1.5rem;background:#f0f2f6}
main{flex:1;display:flex;flex-direction:column;max-width:48rem;margin:0 auto;padding:1.5rem}
.turn{padding:.75rem 1rem;margin:.5rem 0;border-radius:.5rem}
.turn.user{background:#eef3ff}
.turn.assistant{background:#f7f7f7}
.role{font-size:.75rem;text-transform:uppercase;color:#666}
form{display:flex;gap:.5rem;margin-top:auto;padding-top:1rem}
input[name=message]{flex:1;padding:.6rem;font-size:1rem}";

/// URL schemes allowed in rendered links and images.
const SAFE_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Render Markdown to HTML with raw HTML shown as text.
///
/// Link and image targets keep only `http`, `https`, `mailto` and relative
/// URLs; anything else becomes `#`.
pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
        .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Link {
                link_type,
                dest_url: sanitize_url(dest_url),
                title,
                id,
            }),
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Image {
                link_type,
                dest_url: sanitize_url(dest_url),
                title,
                id,
            }),
            other => other,
        });

    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

fn sanitize_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) {
        url
    } else {
        CowStr::Borrowed("#")
    }
}

/// A URL is relative unless a `:` comes before any `/`, `?` or `#`.
fn is_safe_url(url: &str) -> bool {
    let scheme_end = url.find([':', '/', '?', '#']);
    match scheme_end {
        Some(pos) if url[pos..].starts_with(':') => {
            let scheme = url[..pos].to_ascii_lowercase();
            SAFE_SCHEMES.contains(&scheme.as_str())
        }
        _ => true,
    }
}

/// Escape text for use in HTML content or a double-quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing to a String cannot fail.
    let _ = pulldown_cmark_escape::escape_html(&mut out, text);
    out
}

/// The full chat page: sidebar title, transcript in order, one input.
pub fn render_page(transcript: &Transcript, ui: &UiConfig) -> String {
    let title = escape_html(&ui.title);

    let mut turns = String::new();
    for turn in transcript.turns() {
        let role = turn.role.as_str();
        let label = match turn.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        turns.push_str(&format!(
            "<section class=\"turn {role}\"><div class=\"role\">{label}</div>{}</section>\n",
            render_markdown(&turn.content)
        ));
    }

    layout(
        &title,
        &format!(
            "{turns}<form method=\"post\" action=\"/\">\
             <input name=\"message\" autocomplete=\"off\" autofocus placeholder=\"Ask about the schedule\">\
             <button type=\"submit\">Send</button></form>"
        ),
    )
}

/// Shown when the pending question could not be answered.
pub fn render_error_page(ui: &UiConfig) -> String {
    let title = escape_html(&ui.title);
    layout(
        &title,
        "<section class=\"turn assistant\"><p>Sorry, something went wrong while answering. \
         Reload the page to try again.</p></section>",
    )
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <aside><h1>{title}</h1></aside>\n<main>\n{body}\n</main>\n</body>\n</html>\n"
    )
}
