use multiindex::PageHit;

pub const NO_RESULTS_MESSAGE: &str = "Sorry, no page was found using that word.";

/// Render search hits as a minimal HTML page: one linked list item per hit,
/// or an explicit apology when there are none.
pub fn render_results(hits: &[PageHit]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html><html><head><title>Results</title></head><body><h1>Results</h1>",
    );
    if hits.is_empty() {
        html.push_str("<p>");
        html.push_str(NO_RESULTS_MESSAGE);
        html.push_str("</p>");
    } else {
        html.push_str("<ul>");
        for hit in hits {
            html.push_str("<a href=\"");
            html.push_str(&escape_html(&hit.url));
            html.push_str("\"><li>");
            html.push_str(&escape_html(&hit.title));
            html.push_str("</li></a>");
        }
        html.push_str("</ul>");
    }
    html.push_str("</body></html>");
    html
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
