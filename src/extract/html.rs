//! Tag scanning helpers for the handful of elements the marquee pages carry.
//!
//! This is not an HTML parser. It finds opening tags, pairs them with the matching closing
//! tag of the same name and hands out the slices in between.

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Tag name and class filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Selector<'s> {
    tag: Option<&'s str>,
    class: Option<&'s str>,
}

impl<'s> Selector<'s> {
    /// Match on tag name only.
    pub fn tag(tag: &'s str) -> Self {
        Self {
            tag: Some(tag),
            class: None,
        }
    }

    /// Match on one class token only.
    pub fn class(class: &'s str) -> Self {
        Self {
            tag: None,
            class: Some(class),
        }
    }

    /// Match on tag name and one class token.
    pub fn tag_class(tag: &'s str, class: &'s str) -> Self {
        Self {
            tag: Some(tag),
            class: Some(class),
        }
    }

    fn matches(&self, element: &Element<'_>) -> bool {
        self.tag
            .is_none_or(|tag| element.name.eq_ignore_ascii_case(tag))
            && self.class.is_none_or(|class| element.has_class(class))
    }
}

/// A located element: its name, raw attribute text and everything up to its closing tag.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    /// Tag name as written in the document.
    pub name: &'a str,
    /// Raw attribute text of the opening tag.
    pub attrs: &'a str,
    /// Markup between the opening and the matching closing tag.
    pub inner: &'a str,
}

impl<'a> Element<'a> {
    /// Pseudo element wrapping a whole document.
    pub fn document(doc: &'a str) -> Self {
        Self {
            name: "",
            attrs: "",
            inner: doc,
        }
    }

    /// Value of an attribute, with surrounding quotes removed.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        attributes(self.attrs)
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Whether the `class` attribute lists `class` as one of its tokens.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|value| value.split_whitespace().any(|token| token == class))
    }

    /// Every descendant matching `selector`, in document order.
    pub fn find_all(&self, selector: Selector<'_>) -> Vec<Element<'a>> {
        let doc = self.inner;
        let mut found = Vec::new();
        let mut pos = 0;

        while let Some(rel) = doc[pos..].find('<') {
            let at = pos + rel;
            if doc[at..].starts_with("<!--") {
                pos = skip_comment(doc, at);
                continue;
            }

            match open_tag_at(doc, at) {
                Some(tag) => {
                    let mut element = Element {
                        name: tag.name,
                        attrs: tag.attrs,
                        inner: "",
                    };
                    if selector.matches(&element) {
                        if !tag.self_closing && !is_void(tag.name) {
                            element.inner = &doc[tag.end..inner_end(doc, tag.name, tag.end)];
                        }
                        found.push(element);
                    }
                    pos = tag.end;
                }
                None => pos = at + 1,
            }
        }

        found
    }

    /// First descendant matching `selector`.
    pub fn first(&self, selector: Selector<'_>) -> Option<Element<'a>> {
        self.find_all(selector).into_iter().next()
    }

    /// Text content with tags stripped, entities decoded and whitespace collapsed.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.inner.len());
        let mut in_tag = false;

        for ch in self.inner.chars() {
            match ch {
                '<' => {
                    in_tag = true;
                    out.push(' ');
                }
                '>' => in_tag = false,
                _ if !in_tag => out.push(ch),
                _ => {}
            }
        }

        decode_entities(&out)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

struct OpenTag<'a> {
    name: &'a str,
    attrs: &'a str,
    end: usize,
    self_closing: bool,
}

fn open_tag_at(doc: &str, start: usize) -> Option<OpenTag<'_>> {
    let rest = doc.get(start + 1..)?;
    if !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }

    let name_len = rest
        .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
        .unwrap_or(rest.len());
    let attrs_start = start + 1 + name_len;
    let gt = tag_end(doc, attrs_start)?;
    let raw = doc[attrs_start..gt].trim();
    let self_closing = raw.ends_with('/');

    Some(OpenTag {
        name: &rest[..name_len],
        attrs: raw.trim_end_matches('/').trim_end(),
        end: gt + 1,
        self_closing,
    })
}

/// Index of the `>` closing the tag whose attributes start at `from`, skipping quoted values.
fn tag_end(doc: &str, from: usize) -> Option<usize> {
    let mut quote = None;
    for (offset, ch) in doc[from..].char_indices() {
        match (quote, ch) {
            (None, '"' | '\'') => quote = Some(ch),
            (Some(open), _) if ch == open => quote = None,
            (None, '>') => return Some(from + offset),
            _ => {}
        }
    }
    None
}

/// Start index of the closing tag balancing an element opened just before `from`.
/// An unclosed element runs to the end of the document.
fn inner_end(doc: &str, name: &str, from: usize) -> usize {
    let mut depth = 1usize;
    let mut pos = from;

    while let Some(rel) = doc[pos..].find('<') {
        let at = pos + rel;
        let rest = &doc[at..];

        if rest.starts_with("<!--") {
            pos = skip_comment(doc, at);
            continue;
        }

        if let Some(after) = rest.strip_prefix("</") {
            if names_tag(after, name) {
                depth -= 1;
                if depth == 0 {
                    return at;
                }
            }
            pos = at + 2;
            continue;
        }

        match open_tag_at(doc, at) {
            Some(tag) => {
                if tag.name.eq_ignore_ascii_case(name) && !tag.self_closing && !is_void(tag.name)
                {
                    depth += 1;
                }
                pos = tag.end;
            }
            None => pos = at + 1,
        }
    }

    doc.len()
}

fn names_tag(after: &str, name: &str) -> bool {
    after
        .get(..name.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(name))
        && !after[name.len()..].starts_with(|c: char| c.is_ascii_alphanumeric())
}

fn skip_comment(doc: &str, at: usize) -> usize {
    doc[at..]
        .find("-->")
        .map(|end| at + end + 3)
        .unwrap_or(doc.len())
}

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(name))
}

/// Iterate `key=value` pairs of an attribute string. Bare attributes yield an empty value.
fn attributes(attrs: &str) -> impl Iterator<Item = (&str, &str)> {
    let mut rest = attrs;
    std::iter::from_fn(move || {
        rest = rest.trim_start();
        if rest.is_empty() {
            return None;
        }

        let key_len = rest
            .find(|c: char| c == '=' || c.is_ascii_whitespace())
            .unwrap_or(rest.len());
        let key = &rest[..key_len];
        rest = rest[key_len..].trim_start();

        let Some(after_eq) = rest.strip_prefix('=') else {
            return Some((key, ""));
        };
        let after_eq = after_eq.trim_start();

        let value = match after_eq.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &after_eq[1..];
                let close = body.find(quote).unwrap_or(body.len());
                rest = body.get(close + 1..).unwrap_or("");
                &body[..close]
            }
            _ => {
                let end = after_eq
                    .find(|c: char| c.is_ascii_whitespace())
                    .unwrap_or(after_eq.len());
                rest = &after_eq[end..];
                &after_eq[..end]
            }
        };

        Some((key, value))
    })
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
        <div class="fields">
          <!-- <div class="field">commented out</div> -->
          <div class="field"><div class="inner">one</div><span>A &amp; B</span></div>
          <div class='field wide'>two<br/></div>
        </div>
    "#;

    #[test]
    fn nested_elements_of_same_name_are_balanced() {
        let root = Element::document(DOC);
        let fields = root.first(Selector::class("fields")).unwrap();
        let each = fields.find_all(Selector::class("field"));

        assert_eq!(each.len(), 2);
        assert!(each[0].inner.contains("<span>"));
        assert_eq!(each[0].text(), "one A & B");
        assert_eq!(each[1].text(), "two");
    }

    #[test]
    fn class_tokens_match_exactly() {
        let root = Element::document(DOC);
        assert_eq!(root.find_all(Selector::class("field")).len(), 2);
        assert_eq!(root.find_all(Selector::class("wide")).len(), 1);
        assert_eq!(root.find_all(Selector::class("fiel")).len(), 0);
    }

    #[test]
    fn attributes_handle_quotes_and_bare_values() {
        let element = Element {
            name: "td",
            attrs: r#"style='white-space:nowrap' data-x=3 hidden class="a b""#,
            inner: "",
        };
        assert_eq!(element.attr("style"), Some("white-space:nowrap"));
        assert_eq!(element.attr("data-x"), Some("3"));
        assert_eq!(element.attr("hidden"), Some(""));
        assert!(element.has_class("b"));
        assert_eq!(element.attr("missing"), None);
    }

    #[test]
    fn tag_names_are_case_insensitive() {
        let root = Element::document("<TABLE><TR><TH>Field 2</TH></TR></TABLE>");
        let th = root.first(Selector::tag("th")).unwrap();
        assert_eq!(th.text(), "Field 2");
    }

    #[test]
    fn unclosed_element_runs_to_end() {
        let root = Element::document("<h2>01:15");
        assert_eq!(root.first(Selector::tag("h2")).unwrap().text(), "01:15");
    }
}
