use std::collections::HashMap;

use crate::dom::Dom;
use crate::{Error, Result};

/// Single-pass HTML parser for page fixtures. Handles comments,
/// declarations, quoted and unquoted attributes, void and self-closing
/// tags, and character references. `<script>` and `<style>` bodies are
/// kept as raw text child nodes and never interpreted.
pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut dom = Dom::new();
    let mut stack = vec![dom.root];
    let bytes = html.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if starts_with_at(bytes, i, b"<!--") {
            if let Some(end) = find_subslice(bytes, i + 4, b"-->") {
                i = end + 3;
            } else {
                return Err(Error::HtmlParse("unclosed HTML comment".into()));
            }
            continue;
        }

        if bytes[i] == b'<' {
            if starts_with_at(bytes, i, b"</") {
                let (tag, next) = parse_end_tag(html, i)?;
                i = next;

                // An end tag with no open counterpart is ignored;
                // otherwise pop every element up to and including it.
                let matches_open = stack[1..].iter().any(|node| {
                    dom.tag_name(*node)
                        .is_some_and(|open_tag| open_tag.eq_ignore_ascii_case(&tag))
                });
                if matches_open {
                    while stack.len() > 1 {
                        let top = *stack
                            .last()
                            .ok_or_else(|| Error::HtmlParse("invalid stack state".into()))?;
                        let top_tag = dom.tag_name(top).unwrap_or("");
                        stack.pop();
                        if top_tag.eq_ignore_ascii_case(&tag) {
                            break;
                        }
                    }
                }
                continue;
            }

            if starts_with_at(bytes, i, b"<!") {
                let close = memchr_from(bytes, i, b'>')
                    .ok_or_else(|| Error::HtmlParse("unclosed declaration".into()))?;
                i = close + 1;
                continue;
            }

            let (tag, attrs, self_closing, next) = parse_start_tag(html, i)?;
            i = next;

            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            let node = dom.create_element(parent, tag.clone(), attrs);

            if tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style") {
                let close = find_raw_end_tag(bytes, i, &tag)
                    .ok_or_else(|| Error::HtmlParse(format!("unclosed <{tag}>")))?;
                if let Some(body) = html.get(i..close) {
                    if !body.is_empty() {
                        dom.create_text(node, body.to_string());
                    }
                }
                i = close;
                let (_, after_end) = parse_end_tag(html, i)?;
                i = after_end;
                continue;
            }

            if !self_closing && !is_void_tag(&tag) {
                stack.push(node);
            }
            continue;
        }

        let text_start = i;
        while i < bytes.len() && bytes[i] != b'<' {
            i += 1;
        }

        if let Some(text) = html.get(text_start..i) {
            if !text.is_empty() {
                let parent = *stack
                    .last()
                    .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
                let decoded = decode_character_references(text);
                if !decoded.is_empty() {
                    dom.create_text(parent, decoded);
                }
            }
        }
    }

    Ok(dom)
}

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    bytes.len() >= at + needle.len() && &bytes[at..at + needle.len()] == needle
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || from >= bytes.len() {
        return None;
    }
    (from..=bytes.len().saturating_sub(needle.len()))
        .find(|&i| &bytes[i..i + needle.len()] == needle)
}

fn memchr_from(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    (from..bytes.len()).find(|&i| bytes[i] == needle)
}

fn find_raw_end_tag(bytes: &[u8], from: usize, tag: &str) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        if starts_with_at(bytes, i, b"</") {
            let rest = &bytes[i + 2..];
            if rest.len() > tag.len() && rest[..tag.len()].eq_ignore_ascii_case(tag.as_bytes()) {
                // The name must end here, so "</scripts>" does not
                // close a <script> body.
                let after = rest[tag.len()];
                if after == b'>' || after == b'/' || after.is_ascii_whitespace() {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

fn parse_end_tag(html: &str, at: usize) -> Result<(String, usize)> {
    let bytes = html.as_bytes();
    let close = memchr_from(bytes, at, b'>')
        .ok_or_else(|| Error::HtmlParse("unclosed end tag".into()))?;
    let tag = html[at + 2..close].trim().to_string();
    if tag.is_empty() {
        return Err(Error::HtmlParse("empty end tag".into()));
    }
    Ok((tag, close + 1))
}

fn parse_start_tag(html: &str, at: usize) -> Result<(String, HashMap<String, String>, bool, usize)> {
    let bytes = html.as_bytes();
    let mut i = at + 1;

    let name_start = i;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' && bytes[i] != b'/'
    {
        i += 1;
    }
    let tag = html[name_start..i].to_string();
    if tag.is_empty() {
        return Err(Error::HtmlParse("empty start tag".into()));
    }

    let mut attrs = HashMap::new();
    let mut self_closing = false;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            return Err(Error::HtmlParse(format!("unclosed <{tag}>")));
        }
        if bytes[i] == b'>' {
            i += 1;
            break;
        }
        if bytes[i] == b'/' {
            self_closing = true;
            i += 1;
            continue;
        }

        let attr_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let attr_name = html[attr_start..i].to_ascii_lowercase();
        if attr_name.is_empty() {
            return Err(Error::HtmlParse(format!("malformed attribute in <{tag}>")));
        }

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                return Err(Error::HtmlParse(format!("unclosed <{tag}>")));
            }
            let value = if bytes[i] == b'"' || bytes[i] == b'\'' {
                let quote = bytes[i];
                i += 1;
                let value_start = i;
                let end = memchr_from(bytes, i, quote).ok_or_else(|| {
                    Error::HtmlParse(format!("unterminated attribute value in <{tag}>"))
                })?;
                i = end + 1;
                html[value_start..end].to_string()
            } else {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                html[value_start..i].to_string()
            };
            attrs.insert(attr_name, decode_character_references(&value));
        } else {
            attrs.insert(attr_name, String::new());
        }
    }

    Ok((tag, attrs, self_closing, i))
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

fn decode_character_references(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }

    fn decode_numeric(value: &str) -> Option<char> {
        let codepoint = if let Some(hex) = value
            .strip_prefix('x')
            .or_else(|| value.strip_prefix('X'))
        {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            value.parse::<u32>().ok()?
        };
        char::from_u32(codepoint)
    }

    fn decode_named(value: &str) -> Option<char> {
        match value {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{00A0}'),
            "auml" => Some('ä'),
            "ouml" => Some('ö'),
            "uuml" => Some('ü'),
            "Auml" => Some('Ä'),
            "Ouml" => Some('Ö'),
            "Uuml" => Some('Ü'),
            "szlig" => Some('ß'),
            _ => None,
        }
    }

    let mut out = String::new();
    let chars = src.chars().collect::<Vec<_>>();
    let mut i = 0usize;
    while i < chars.len() {
        if chars[i] != '&' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && chars[j] != ';' && j - i <= 10 {
            j += 1;
        }
        if j >= chars.len() || chars[j] != ';' {
            out.push('&');
            i += 1;
            continue;
        }

        let entity = chars[i + 1..j].iter().collect::<String>();
        let decoded = if let Some(numeric) = entity.strip_prefix('#') {
            decode_numeric(numeric)
        } else {
            decode_named(&entity)
        };

        match decoded {
            Some(ch) => {
                out.push(ch);
                i = j + 1;
            }
            None => {
                out.push('&');
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_and_ids() -> Result<()> {
        let dom = parse_html(
            r#"
            <div id='main-content'>
              <form id='drink-form' action='/add_drink' method='post'>
                <input id='selected-drink' name='drink' value='Radler'>
              </form>
            </div>
            "#,
        )?;
        let form = dom.by_id("drink-form").expect("form indexed");
        assert_eq!(dom.attr(form, "action").as_deref(), Some("/add_drink"));
        let input = dom.by_id("selected-drink").expect("input indexed");
        assert_eq!(dom.value(input)?, "Radler");
        assert_eq!(dom.parent(input), Some(form));
        Ok(())
    }

    #[test]
    fn void_and_self_closing_tags_do_not_nest() -> Result<()> {
        let dom = parse_html("<div id='a'><br><img src='x.png'/><p id='b'>t</p></div>")?;
        let p = dom.by_id("b").expect("p indexed");
        let a = dom.by_id("a").expect("div indexed");
        assert_eq!(dom.parent(p), Some(a));
        Ok(())
    }

    #[test]
    fn script_body_is_raw_text() -> Result<()> {
        let dom = parse_html("<div id='x'></div><script>if (1 < 2) {}</script>")?;
        assert!(dom.by_id("x").is_some());
        Ok(())
    }

    #[test]
    fn script_body_keeps_longer_end_tag_lookalikes() -> Result<()> {
        let dom = parse_html(
            "<script id='s'>if (x) { t = \"</scriptx>\"; }</script><p id='after'>ok</p>",
        )?;
        let script = dom.by_id("s").expect("script indexed");
        assert_eq!(dom.text_content(script), "if (x) { t = \"</scriptx>\"; }");
        assert_eq!(dom.text_content(dom.by_id("after").expect("p indexed")), "ok");
        Ok(())
    }

    #[test]
    fn character_references_decode_in_text_and_attributes() -> Result<()> {
        let dom = parse_html("<p id='msg' title='Getr&auml;nke'>&quot;Prost&quot; &#33;</p>")?;
        let p = dom.by_id("msg").expect("p indexed");
        assert_eq!(dom.attr(p, "title").as_deref(), Some("Getränke"));
        assert_eq!(dom.text_content(p), "\"Prost\" !");
        Ok(())
    }

    #[test]
    fn unclosed_comment_is_a_parse_error() {
        let err = parse_html("<!-- never closed").unwrap_err();
        assert_eq!(err, Error::HtmlParse("unclosed HTML comment".into()));
    }

    #[test]
    fn stray_end_tag_without_open_counterpart_is_ignored() -> Result<()> {
        let dom = parse_html("<div id='outer'><span>text</em></span><p id='p'></p></div>")?;
        let p = dom.by_id("p").expect("p indexed");
        let outer = dom.by_id("outer").expect("outer indexed");
        assert_eq!(dom.parent(p), Some(outer));
        Ok(())
    }
}
