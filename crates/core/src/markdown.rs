use pulldown_cmark::{Event, Options, Parser, html};

/// Converts markdown source into HTML for display.
pub trait MarkdownRenderer: Send + Sync {
    /// Render `source` to an HTML fragment.
    fn render(&self, source: &str) -> String;
}

/// CommonMark renderer with tables, strikethrough and task lists enabled.
///
/// Raw HTML in the source is emitted as escaped text, so rendered content
/// can be inserted into a page without further sanitizing.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonMarkRenderer;

impl MarkdownRenderer for CommonMarkRenderer {
    fn render(&self, source: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let parser = Parser::new_ext(source, options).map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });

        let mut out = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}
