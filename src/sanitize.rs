use scraper::{Html, Node};

/// Reduces an HTML description to plain text.
///
/// Text nodes are kept verbatim in document order, every `<br>` becomes a newline
/// and all other markup is dropped. If the parser reports any error the input is
/// returned as-is.
///
/// html5ever recovers from every input, so "error" here means any recoverable
/// parse error: misnested blocks such as `<p><div>..</div></p>`, a bare `<`, or
/// `</br>`. Such descriptions are passed through raw and, once escaped by the
/// page, show up with their tags visible. That is accepted over guessing at a
/// repair of markup the feed itself got wrong.
pub fn sanitize_description(input: &str) -> String {
    let fragment = Html::parse_fragment(input);
    if !fragment.errors.is_empty() {
        tracing::debug!(errors = ?fragment.errors, "description did not parse cleanly, keeping raw text");
        return input.to_string();
    }

    let mut text = String::with_capacity(input.len());
    for node in fragment.tree.root().descendants() {
        match node.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(e) if e.name() == "br" => text.push('\n'),
            _ => {}
        }
    }

    text.trim().to_string()
}
