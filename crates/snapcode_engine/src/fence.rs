use scraper::{Html, Selector};

const FENCE: &str = "```";

/// Removes a code fence enclosing the whole completion.
///
/// Only an opener line at the very start (three backticks plus an optional
/// language hint) and a closer line at the very end are removed; fences inside
/// the payload are left alone. The result is trimmed once.
pub fn strip_code_fences(text: &str) -> String {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix(FENCE) {
        match rest.find('\n') {
            Some(idx) if is_language_hint(&rest[..idx]) => body = &rest[idx + 1..],
            None if is_language_hint(rest) => body = "",
            _ => {}
        }
    }

    if let Some(head) = body.trim_end().strip_suffix(FENCE) {
        if head.is_empty() || head.ends_with('\n') {
            body = head;
        }
    }

    body.trim().to_string()
}

fn is_language_hint(candidate: &str) -> bool {
    candidate
        .trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '_' | '.'))
}

/// Artifacts are fragments. If the service returned a whole document anyway,
/// keep only the body's inner markup.
pub fn unwrap_document_shell(markup: &str) -> String {
    let lowered = markup.to_ascii_lowercase();
    let has_shell = ["<!doctype", "<html", "<body"]
        .iter()
        .any(|tag| lowered.contains(tag));
    if !has_shell {
        return markup.to_string();
    }

    let doc = Html::parse_document(markup);
    match Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next().map(|body| body.inner_html()))
    {
        Some(inner) => inner.trim().to_string(),
        None => markup.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_tagged_fence() {
        let raw = "```html\n<div class=\"p-4\">Hi</div>\n```";
        assert_eq!(strip_code_fences(raw), "<div class=\"p-4\">Hi</div>");
    }

    #[test]
    fn strips_untagged_fence_with_surrounding_whitespace() {
        let raw = "\n  ```\n<section>\n  <h1>A</h1>\n</section>\n```  \n";
        assert_eq!(strip_code_fences(raw), "<section>\n  <h1>A</h1>\n</section>");
    }

    #[test]
    fn handles_crlf_line_endings() {
        let raw = "```html\r\n<p>x</p>\r\n```";
        assert_eq!(strip_code_fences(raw), "<p>x</p>");
    }

    #[test]
    fn unfenced_text_is_only_trimmed() {
        assert_eq!(strip_code_fences("  <p>plain</p>\n"), "<p>plain</p>");
    }

    #[test]
    fn inner_fences_are_preserved() {
        let raw = "```html\n<pre>```js\nx()\n```</pre>\n```";
        assert_eq!(strip_code_fences(raw), "<pre>```js\nx()\n```</pre>");
    }

    #[test]
    fn opener_followed_by_prose_is_not_a_fence() {
        let raw = "```this is not a hint!\n<p>x</p>";
        assert_eq!(strip_code_fences(raw), raw);
    }

    #[test]
    fn lone_fence_is_empty() {
        assert_eq!(strip_code_fences("```html"), "");
    }

    #[test]
    fn fragment_is_left_untouched() {
        let fragment = "<header class=\"flex\"><nav>Menu</nav></header>";
        assert_eq!(unwrap_document_shell(fragment), fragment);
    }

    #[test]
    fn document_shell_is_removed() {
        let doc = "<!DOCTYPE html><html><head><title>x</title></head><body><main><p>Hi</p></main></body></html>";
        assert_eq!(unwrap_document_shell(doc), "<main><p>Hi</p></main>");
    }
}
