//! Server-rendered HTML pages.

use axum::response::Html;
use serde_json::Value;

use crate::search::SearchResult;
use crate::store::Bookmark;

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!doctype html>
<html>
    <head>
        <meta charset="utf-8">
        <title>{title} | artgate</title>
        <link rel="stylesheet" href="/static/css/style.css">
    </head>
    <body>
        <nav>
            <a href="/">Search</a>
            <a href="/bookmarks">Bookmarks</a>
            <a href="/about">About</a>
        </nav>
        <main>
{body}
        </main>
        <script src="/static/js/bookmarks.js"></script>
    </body>
</html>
"#,
        title = escape(title),
        body = body,
    ))
}

fn search_form(query: &str) -> String {
    format!(
        r#"<form action="/search" method="get">
    <input type="text" name="q" value="{}" placeholder="Search artwork" autofocus>
    <input type="submit" value="Search">
</form>"#,
        escape(query)
    )
}

// Text fields render with line breaks kept.
fn multiline(s: &str) -> String {
    escape(s).replace('\n', "<br>")
}

fn card(title: &str, link: &str, image: &str, description: &str, bookmarked: bool) -> String {
    let (class, label) = if bookmarked {
        ("bookmark-button bookmarked", "Unbookmark")
    } else {
        ("bookmark-button", "Bookmark")
    };
    format!(
        r#"<article class="card">
    <a href="{link}"><img src="{image}" alt="{title}" loading="lazy"></a>
    <h2><a href="{link}">{title}</a></h2>
    <p>{description}</p>
    <button class="{class}" data-title="{title}" data-link="{link}" data-image="{image}" data-description="{description_attr}">{label}</button>
</article>"#,
        link = escape(link),
        image = escape(image),
        title = escape(title),
        description = multiline(description),
        description_attr = escape(description),
        class = class,
        label = label,
    )
}

pub fn home() -> Html<String> {
    layout("Search", &search_form(""))
}

pub fn about() -> Html<String> {
    layout(
        "About",
        "<h1>About</h1>\n<p>artgate searches a public art feed, shows the results with images served \
         through this site, and keeps a list of bookmarked pieces.</p>",
    )
}

pub fn results(query: &str, results: &[SearchResult]) -> Html<String> {
    let mut body = search_form(query);
    body.push_str(&format!("\n<h1>Results for \"{}\"</h1>\n", escape(query)));
    if results.is_empty() {
        body.push_str("<p>No results.</p>");
    }
    for r in results {
        body.push_str(&card(&r.title, &r.link, &r.image, &r.description, false));
        body.push('\n');
    }
    layout("Results", &body)
}

pub fn search_error(query: &str, message: &str) -> Html<String> {
    let body = format!(
        "{}\n<p class=\"error\">{}</p>",
        search_form(query),
        escape(message)
    );
    layout("Results", &body)
}

fn field<'a>(bookmark: &'a Bookmark, key: &str) -> &'a str {
    match bookmark.get(key) {
        Some(Value::String(s)) => s,
        _ => "",
    }
}

pub fn bookmarks(items: &[Bookmark]) -> Html<String> {
    let mut body = String::from("<h1>Bookmarks</h1>\n");
    if items.is_empty() {
        body.push_str("<p>No bookmarks yet.</p>");
    }
    for b in items {
        body.push_str(&card(
            field(b, "Title"),
            field(b, "Link"),
            field(b, "Image"),
            field(b, "Description"),
            true,
        ));
        body.push('\n');
    }
    layout("Bookmarks", &body)
}
