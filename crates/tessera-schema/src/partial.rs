//! Best-effort JSON parsing for truncated input.
//!
//! Model output arrives as a growing prefix of one JSON document. At any
//! point the prefix may end mid-string, mid-number, or between a key and
//! its value. This parser walks the prefix with a recursive descent and
//! treats "input ran out" as a normal outcome rather than an error: it
//! returns the largest value tree that the prefix fully supports.

use serde_json::{Map, Number, Value};

/// Outcome of parsing one JSON value at the cursor.
enum Outcome {
    /// The value is syntactically complete.
    Complete(Value),
    /// The value is a container or string cut at the end of input; the
    /// carried value holds everything recovered so far.
    Truncated(Value),
    /// Input ended before anything usable was produced.
    Incomplete,
}

/// Parse a (possibly truncated) JSON document prefix.
///
/// Returns `None` when the prefix does not yet contain anything usable,
/// for example an empty string or a lone `{` with no complete members.
/// A lone `{` still yields `Some(Value::Object)` with no members, since
/// an empty object is a usable snapshot root.
pub fn parse_partial_json(input: &str) -> Option<Value> {
    let mut cursor = Cursor::new(input);
    cursor.skip_whitespace();
    if cursor.at_end() {
        return None;
    }
    match cursor.parse_value() {
        Outcome::Complete(v) | Outcome::Truncated(v) => Some(v),
        Outcome::Incomplete => None,
    }
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Cursor { input, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == ' ' || ch == '\t' || ch == '\n' || ch == '\r' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn parse_value(&mut self) -> Outcome {
        self.skip_whitespace();
        match self.peek() {
            None => Outcome::Incomplete,
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some('"') => self.parse_string().map_string(),
            Some('t') => self.parse_keyword("true", Value::Bool(true)),
            Some('f') => self.parse_keyword("false", Value::Bool(false)),
            Some('n') => self.parse_keyword("null", Value::Null),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(_) => Outcome::Incomplete,
        }
    }

    fn parse_object(&mut self) -> Outcome {
        self.bump();
        let mut map = Map::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Outcome::Truncated(Value::Object(map)),
                Some('}') => {
                    self.bump();
                    return Outcome::Complete(Value::Object(map));
                }
                Some(',') => {
                    self.bump();
                    continue;
                }
                Some('"') => {}
                Some(_) => return Outcome::Truncated(Value::Object(map)),
            }
            let key = match self.parse_string() {
                StringOutcome::Complete(s) => s,
                StringOutcome::Truncated(_) => {
                    return Outcome::Truncated(Value::Object(map));
                }
            };
            self.skip_whitespace();
            match self.peek() {
                Some(':') => {
                    self.bump();
                }
                _ => return Outcome::Truncated(Value::Object(map)),
            }
            match self.parse_value() {
                Outcome::Complete(v) => {
                    map.insert(key, v);
                }
                Outcome::Truncated(v) => {
                    map.insert(key, v);
                    return Outcome::Truncated(Value::Object(map));
                }
                Outcome::Incomplete => {
                    return Outcome::Truncated(Value::Object(map));
                }
            }
        }
    }

    fn parse_array(&mut self) -> Outcome {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Outcome::Truncated(Value::Array(items)),
                Some(']') => {
                    self.bump();
                    return Outcome::Complete(Value::Array(items));
                }
                Some(',') => {
                    self.bump();
                    continue;
                }
                Some(_) => {}
            }
            match self.parse_value() {
                Outcome::Complete(v) => items.push(v),
                Outcome::Truncated(v) => {
                    items.push(v);
                    return Outcome::Truncated(Value::Array(items));
                }
                Outcome::Incomplete => {
                    return Outcome::Truncated(Value::Array(items));
                }
            }
        }
    }

    /// Numbers cut at the end of input are withheld: `12` may still grow
    /// into `123` or `12.5`, so a frontier-cut numeric run yields nothing.
    fn parse_number(&mut self) -> Outcome {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit()
                || ch == '-'
                || ch == '+'
                || ch == '.'
                || ch == 'e'
                || ch == 'E'
            {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.at_end() {
            return Outcome::Incomplete;
        }
        let text = &self.input[start..self.pos];
        if let Ok(i) = text.parse::<i64>() {
            return Outcome::Complete(Value::Number(Number::from(i)));
        }
        if let Ok(f) = text.parse::<f64>() {
            if let Some(n) = Number::from_f64(f) {
                return Outcome::Complete(Value::Number(n));
            }
        }
        Outcome::Incomplete
    }

    /// Keyword literals cut at the end of input are withheld for the same
    /// reason as numbers: `tru` is not yet `true`.
    fn parse_keyword(&mut self, word: &str, value: Value) -> Outcome {
        let rest = &self.input[self.pos..];
        if rest.starts_with(word) {
            self.pos += word.len();
            return Outcome::Complete(value);
        }
        if word.starts_with(rest) {
            self.pos = self.input.len();
        } else {
            self.pos += rest.len().min(word.len());
        }
        Outcome::Incomplete
    }

    fn parse_string(&mut self) -> StringOutcome {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return StringOutcome::Truncated(out),
                Some('"') => return StringOutcome::Complete(out),
                Some('\\') => match self.bump() {
                    // An incomplete trailing escape is dropped from the
                    // recovered content; the next prefix completes it.
                    None => return StringOutcome::Truncated(out),
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some('/') => out.push('/'),
                    Some('b') => out.push('\u{0008}'),
                    Some('f') => out.push('\u{000C}'),
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some('u') => match self.parse_unicode_escape() {
                        UnicodeOutcome::Char(c) => out.push(c),
                        UnicodeOutcome::Truncated => return StringOutcome::Truncated(out),
                    },
                    Some(other) => out.push(other),
                },
                Some(ch) => out.push(ch),
            }
        }
    }

    fn parse_unicode_escape(&mut self) -> UnicodeOutcome {
        let Some(first) = self.read_hex4() else {
            return UnicodeOutcome::Truncated;
        };
        if (0xD800..0xDC00).contains(&first) {
            // High surrogate: needs a \uXXXX low surrogate to pair with.
            let checkpoint = self.pos;
            if self.peek() == Some('\\') {
                self.bump();
                if self.peek() == Some('u') {
                    self.bump();
                    if let Some(second) = self.read_hex4() {
                        if (0xDC00..0xE000).contains(&second) {
                            let combined = 0x10000
                                + ((first - 0xD800) << 10)
                                + (second - 0xDC00);
                            if let Some(c) = char::from_u32(combined) {
                                return UnicodeOutcome::Char(c);
                            }
                        }
                        self.pos = checkpoint;
                        return UnicodeOutcome::Char('\u{FFFD}');
                    }
                    return UnicodeOutcome::Truncated;
                }
                self.pos = checkpoint;
                return UnicodeOutcome::Char('\u{FFFD}');
            }
            if self.at_end() {
                return UnicodeOutcome::Truncated;
            }
            return UnicodeOutcome::Char('\u{FFFD}');
        }
        match char::from_u32(first) {
            Some(c) => UnicodeOutcome::Char(c),
            None => UnicodeOutcome::Char('\u{FFFD}'),
        }
    }

    fn read_hex4(&mut self) -> Option<u32> {
        let rest = &self.input[self.pos..];
        if rest.len() < 4 {
            self.pos = self.input.len();
            return None;
        }
        let digits = &rest[..4];
        let value = u32::from_str_radix(digits, 16).ok()?;
        self.pos += 4;
        Some(value)
    }
}

enum StringOutcome {
    Complete(String),
    Truncated(String),
}

enum UnicodeOutcome {
    Char(char),
    Truncated,
}

impl StringOutcome {
    fn map_string(self) -> Outcome {
        match self {
            StringOutcome::Complete(s) => Outcome::Complete(Value::String(s)),
            StringOutcome::Truncated(s) => Outcome::Truncated(Value::String(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn complete_document_parses_exactly() {
        let input = r#"{"version":1,"children":[{"type":"text","content":"hi"}]}"#;
        let parsed = parse_partial_json(input).unwrap();
        assert_eq!(
            parsed,
            json!({"version": 1, "children": [{"type": "text", "content": "hi"}]})
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(parse_partial_json("").is_none());
        assert!(parse_partial_json("   \n").is_none());
    }

    #[test]
    fn lone_open_brace_is_an_empty_object() {
        let parsed = parse_partial_json("{").unwrap();
        assert_eq!(parsed, json!({}));
    }

    #[test]
    fn key_without_value_is_dropped() {
        let parsed = parse_partial_json(r#"{"version":1,"children""#).unwrap();
        assert_eq!(parsed, json!({"version": 1}));
    }

    #[test]
    fn key_with_colon_but_no_value_is_dropped() {
        let parsed = parse_partial_json(r#"{"version":1,"children":"#).unwrap();
        assert_eq!(parsed, json!({"version": 1}));
    }

    #[test]
    fn truncated_string_value_surfaces_partial_content() {
        let parsed = parse_partial_json(r#"{"content":"Hello, wor"#).unwrap();
        assert_eq!(parsed, json!({"content": "Hello, wor"}));
    }

    #[test]
    fn truncated_escape_is_withheld() {
        let parsed = parse_partial_json(r#"{"content":"line one\"#).unwrap();
        assert_eq!(parsed, json!({"content": "line one"}));
        let parsed = parse_partial_json(r#"{"content":"snow \u26"#).unwrap();
        assert_eq!(parsed, json!({"content": "snow "}));
    }

    #[test]
    fn escape_sequences_decode() {
        let parsed =
            parse_partial_json(r#"{"content":"a\nb\t\"c\" é 😀"}"#).unwrap();
        assert_eq!(parsed, json!({"content": "a\nb\t\"c\" \u{e9} \u{1F600}"}));
    }

    #[test]
    fn frontier_number_is_withheld() {
        let parsed = parse_partial_json(r#"{"count":12"#).unwrap();
        assert_eq!(parsed, json!({}));
        let parsed = parse_partial_json(r#"{"count":12}"#).unwrap();
        assert_eq!(parsed, json!({"count": 12}));
        let parsed = parse_partial_json(r#"{"count":12,"done":true}"#).unwrap();
        assert_eq!(parsed, json!({"count": 12, "done": true}));
    }

    #[test]
    fn frontier_keyword_is_withheld() {
        let parsed = parse_partial_json(r#"{"done":tru"#).unwrap();
        assert_eq!(parsed, json!({}));
        let parsed = parse_partial_json(r#"{"done":true"#).unwrap();
        assert_eq!(parsed, json!({"done": true}));
    }

    #[test]
    fn truncated_array_keeps_complete_elements() {
        let parsed = parse_partial_json(r#"{"items":["a","b","c"#).unwrap();
        assert_eq!(parsed, json!({"items": ["a", "b", "c"]}));
    }

    #[test]
    fn nested_truncation_recovers_outer_structure() {
        let input = r#"{"version":1,"children":[{"type":"card","title":"Plans","children":[{"type":"text","content":"Basi"#;
        let parsed = parse_partial_json(input).unwrap();
        assert_eq!(
            parsed,
            json!({
                "version": 1,
                "children": [{
                    "type": "card",
                    "title": "Plans",
                    "children": [{"type": "text", "content": "Basi"}]
                }]
            })
        );
    }

    #[test]
    fn growing_prefixes_never_regress() {
        let full = r#"{"version":1,"children":[{"type":"text","content":"The answer"},{"type":"badge","text":"done","variant":"success"}]}"#;
        let mut last_len = 0usize;
        for end in 1..=full.len() {
            if !full.is_char_boundary(end) {
                continue;
            }
            if let Some(Value::Object(map)) = parse_partial_json(&full[..end]) {
                let children = map
                    .get("children")
                    .and_then(Value::as_array)
                    .map(Vec::len)
                    .unwrap_or(0);
                assert!(children >= last_len || children + 1 >= last_len);
                last_len = children.max(last_len);
            }
        }
        assert_eq!(last_len, 2);
    }

    #[test]
    fn whitespace_heavy_input_parses() {
        let input = "{\n  \"version\": 1,\n  \"children\": [\n    {\"type\": \"separator\"}\n  ]\n}";
        let parsed = parse_partial_json(input).unwrap();
        assert_eq!(
            parsed,
            json!({"version": 1, "children": [{"type": "separator"}]})
        );
    }
}
