//! Classification of a single physical line of the text format

/// What a line asks the parser to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Line<'a> {
    /// Empty or whitespace-only
    Blank,

    /// `# ...`
    Comment,

    /// `#include path` with the path stripped and unquoted
    Include(&'a str),

    /// A line that is exactly `}`
    Close,

    /// `name [attrs] <op> ...`
    Entry {
        /// Dotted name token (may be empty; the mutator rejects that)
        name: &'a str,
        /// Attributes in source order
        attrs: Vec<(String, String)>,
        /// Operator and its operand
        op: Op<'a>,
    },
}

/// The operator following a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Op<'a> {
    /// `= value`
    Assign(&'a str),
    /// `: source.path`
    Copy(&'a str),
    /// `:= target.path`
    Link(&'a str),
    /// `{`
    Block,
    /// `<< TERMINATOR`
    Heredoc(&'a str),
}

const INCLUDE: &str = "#include ";

/// Classify one line. The error is a message without location.
pub(crate) fn classify(raw: &str) -> Result<Line<'_>, String> {
    let s = raw.trim_start();

    if let Some(rest) = s.strip_prefix(INCLUDE) {
        return Ok(Line::Include(unquote(rest.trim())));
    }
    if s.starts_with('#') {
        return Ok(Line::Comment);
    }
    if s.starts_with('}') {
        if s.trim_end() == "}" {
            return Ok(Line::Close);
        }
        return Err(format!(
            "Trailing garbage on line following }}: {}",
            raw.trim_end()
        ));
    }
    if s.is_empty() {
        return Ok(Line::Blank);
    }

    let name_len = s
        .find(|c: char| !(is_name_char(c) || c == '.'))
        .unwrap_or(s.len());
    let name = &s[..name_len];
    let mut rest = s[name_len..].trim_start();

    let mut attrs = Vec::new();
    if let Some(list) = rest.strip_prefix('[') {
        let (parsed, after) = parse_attrs(list)?;
        attrs = parsed;
        rest = after.trim_start();
    }

    let op = if let Some(v) = rest.strip_prefix(":=") {
        Op::Link(v.trim())
    } else if let Some(v) = rest.strip_prefix('=') {
        Op::Assign(v.trim())
    } else if let Some(v) = rest.strip_prefix(':') {
        Op::Copy(v.trim())
    } else if rest.starts_with('{') {
        Op::Block
    } else if let Some(v) = rest.strip_prefix("<<") {
        Op::Heredoc(v.trim())
    } else {
        return Err(format!("Unable to parse line {}", raw.trim_end()));
    };

    Ok(Line::Entry { name, attrs, op })
}

/// Characters allowed in one component of a name.
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Whether a raw heredoc line ends the body: it starts with the terminator,
/// followed by whitespace or nothing.
pub(crate) fn is_terminator(raw: &str, terminator: &str) -> bool {
    raw.strip_prefix(terminator)
        .map_or(false, |rest| rest.chars().next().map_or(true, char::is_whitespace))
}

/// Strip one pair of surrounding double quotes.
fn unquote(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Parse `key=value, key2="quoted", flag]`, returning the attributes and
/// the text after the closing bracket.
fn parse_attrs(s: &str) -> Result<(Vec<(String, String)>, &str), String> {
    let mut attrs = Vec::new();
    let mut rest = s;

    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix(']') {
            return Ok((attrs, after));
        }

        let key_end = rest
            .find(|c: char| c == '=' || c == ',' || c == ']')
            .ok_or_else(|| "Missing ] in attribute list".to_string())?;
        let key = rest[..key_end].trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(format!("Invalid attribute name '{}'", key));
        }
        rest = &rest[key_end..];

        let value = match rest.strip_prefix('=') {
            Some(v) => {
                let v = v.trim_start();
                if let Some(quoted) = v.strip_prefix('"') {
                    let (value, after) = parse_quoted(quoted)?;
                    rest = after;
                    value
                } else {
                    let end = v
                        .find(|c: char| c == ',' || c == ']')
                        .ok_or_else(|| "Missing ] in attribute list".to_string())?;
                    rest = &v[end..];
                    v[..end].trim().to_string()
                }
            }
            None => "1".to_string(),
        };
        attrs.push((key.to_string(), value));

        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix(',') {
            rest = after;
        } else if !rest.starts_with(']') {
            return Err(format!("Expected , or ] in attribute list at: {}", rest.trim_end()));
        }
    }
}

/// Parse the body of a quoted string (after the opening quote). A
/// backslash escapes the next character; `\n` is a line break.
fn parse_quoted(s: &str) -> Result<(String, &str), String> {
    let mut out = String::new();
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((out, &s[i + 1..])),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, escaped)) => out.push(escaped),
                None => break,
            },
            _ => out.push(c),
        }
    }
    Err("Unterminated quoted attribute value".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(raw: &str) -> (String, Vec<(String, String)>, Op<'_>) {
        match classify(raw).unwrap() {
            Line::Entry { name, attrs, op } => (name.to_string(), attrs, op),
            other => panic!("expected entry, got {:?}", other),
        }
    }

    #[test]
    fn test_directives() {
        assert_eq!(classify("\n").unwrap(), Line::Blank);
        assert_eq!(classify("   # note\n").unwrap(), Line::Comment);
        assert_eq!(classify("#includes\n").unwrap(), Line::Comment);
        assert_eq!(
            classify("#include \"a b.hdf\"  \n").unwrap(),
            Line::Include("a b.hdf")
        );
        assert_eq!(classify("#include plain.hdf\n").unwrap(), Line::Include("plain.hdf"));
        assert_eq!(classify("  }  \n").unwrap(), Line::Close);
    }

    #[test]
    fn test_close_with_garbage() {
        let err = classify("} extra\n").unwrap_err();
        assert!(err.contains("Trailing garbage"));
    }

    #[test]
    fn test_operators() {
        assert_eq!(entry("Foo = bar \n").2, Op::Assign("bar"));
        assert_eq!(entry("Foo=bar").2, Op::Assign("bar"));
        assert_eq!(entry("A.B : C.D\n").2, Op::Copy("C.D"));
        assert_eq!(entry("A := C\n").2, Op::Link("C"));
        assert_eq!(entry("A {\n").2, Op::Block);
        assert_eq!(entry("A { trailing\n").2, Op::Block);
        assert_eq!(entry("X << EOM \n").2, Op::Heredoc("EOM"));
        assert_eq!(entry("a_1.b2 = \n").0, "a_1.b2");
        assert_eq!(entry("a_1.b2 = \n").2, Op::Assign(""));
    }

    #[test]
    fn test_unparseable() {
        let err = classify("Foo bar\n").unwrap_err();
        assert_eq!(err, "Unable to parse line Foo bar");
        assert!(classify("Foo-bar = 1\n").is_err());
    }

    #[test]
    fn test_attributes() {
        let (name, attrs, op) = entry("Item [lang=en, title=\"A \\\"b\\\", c\", hidden] = 1\n");
        assert_eq!(name, "Item");
        assert_eq!(
            attrs,
            vec![
                ("lang".to_string(), "en".to_string()),
                ("title".to_string(), "A \"b\", c".to_string()),
                ("hidden".to_string(), "1".to_string()),
            ]
        );
        assert_eq!(op, Op::Assign("1"));
    }

    #[test]
    fn test_attribute_newline_escape() {
        let (_, attrs, _) = entry("A [note=\"one\\ntwo\"] {\n");
        assert_eq!(attrs, vec![("note".to_string(), "one\ntwo".to_string())]);
    }

    #[test]
    fn test_attribute_errors() {
        assert!(classify("A [x=1 = 2\n").is_err());
        assert!(classify("A [x=\"open] = 2\n").is_err());
        assert!(classify("A [=1] = 2\n").is_err());
        assert!(classify("A [x y] = 2\n").is_err());
    }

    #[test]
    fn test_terminator_match() {
        assert!(is_terminator("EOM\n", "EOM"));
        assert!(is_terminator("EOM", "EOM"));
        assert!(is_terminator("EOM trailing\n", "EOM"));
        assert!(!is_terminator("EOMX\n", "EOM"));
        assert!(!is_terminator(" EOM\n", "EOM"));
    }
}
