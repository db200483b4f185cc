//! Turning a [`DirectoryListing`] into a response body.

use std::fmt::Write;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::unzip::DirectoryListing;

/// Characters escaped inside one URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Renders listings for one media type
pub trait ListingRenderer: Send + Sync {
    /// Value of the `Content-Type` header for rendered output
    fn content_type(&self) -> &'static str;

    fn render(&self, listing: &DirectoryListing) -> anyhow::Result<String>;
}

/// Machine-readable listing
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

impl ListingRenderer for JsonRenderer {
    fn content_type(&self) -> &'static str {
        "application/json; charset=utf-8"
    }

    fn render(&self, listing: &DirectoryListing) -> anyhow::Result<String> {
        Ok(serde_json::to_string(listing)?)
    }
}

/// Plain HTML page with breadcrumbs and a table of children.
///
/// Links are built from `mount`, the URL prefix the routes are served
/// under, followed by the percent-encoded full path.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    mount: String,
}

impl HtmlRenderer {
    pub fn new(mount: &str) -> Self {
        Self {
            mount: mount.trim_end_matches('/').to_string(),
        }
    }

    fn href(&self, full_path: &str) -> String {
        let mut href = self.mount.clone();
        for segment in full_path.split('/') {
            href.push('/');
            href.extend(utf8_percent_encode(segment, PATH_SEGMENT));
        }
        href
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

impl ListingRenderer for HtmlRenderer {
    fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }

    fn render(&self, listing: &DirectoryListing) -> anyhow::Result<String> {
        let title = listing
            .breadcrumbs
            .last()
            .map(|crumb| crumb.full_path.as_str())
            .unwrap_or_default();

        let mut html = String::new();
        writeln!(html, "<!DOCTYPE html>")?;
        writeln!(html, "<html>")?;
        writeln!(html, "<head>")?;
        writeln!(html, "<meta charset=\"utf-8\">")?;
        writeln!(html, "<title>{}</title>", escape_html(title))?;
        writeln!(html, "</head>")?;
        writeln!(html, "<body>")?;

        writeln!(html, "<nav class=\"breadcrumbs\">")?;
        for (i, crumb) in listing.breadcrumbs.iter().enumerate() {
            if i > 0 {
                write!(html, " / ")?;
            }
            if crumb.is_selected {
                write!(html, "<strong>{}</strong>", escape_html(&crumb.name))?;
            } else {
                write!(
                    html,
                    "<a href=\"{}\">{}</a>",
                    escape_html(&self.href(&crumb.full_path)),
                    escape_html(&crumb.name)
                )?;
            }
        }
        writeln!(html)?;
        writeln!(html, "</nav>")?;

        writeln!(html, "<table>")?;
        writeln!(html, "<tr><th>Name</th><th>Size</th></tr>")?;
        for child in &listing.children {
            let suffix = if child.is_directory { "/" } else { "" };
            writeln!(
                html,
                "<tr><td><a href=\"{}\">{}{}</a></td><td>{}</td></tr>",
                escape_html(&self.href(&child.full_path)),
                escape_html(&child.name),
                suffix,
                escape_html(child.size.as_deref().unwrap_or(""))
            )?;
        }
        writeln!(html, "</table>")?;

        writeln!(html, "</body>")?;
        writeln!(html, "</html>")?;
        Ok(html)
    }
}
