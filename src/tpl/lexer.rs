#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Literal,
    /// `{# ... #}`
    Comment,
    /// `{{ ... }}`
    Output,
    /// `{% ... %}`
    Action,
}

/// A raw slice of the template, delimiters included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    /// The trimmed text between the delimiters. Literals are returned as is.
    pub fn inner(&self) -> &'a str {
        match self.kind {
            TokenKind::Literal => self.text,
            _ => self.text[2..self.text.len() - 2].trim(),
        }
    }
}

const DELIMITERS: [(&str, &str, TokenKind); 3] = [
    ("{{", "}}", TokenKind::Output),
    ("{%", "%}", TokenKind::Action),
    ("{#", "#}", TokenKind::Comment),
];

/// Splits a template into literal text and tags.
///
/// Concatenating the `text` of every token gives back `template`. A tag ends
/// at the first matching closer; an opener that is never closed stays part of
/// the surrounding literal.
pub fn tokenize(template: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while let Some(offset) = template[pos..].find('{') {
        let start = pos + offset;
        match match_tag(&template[start..]) {
            Some((kind, len)) => {
                if start > literal_start {
                    tokens.push(Token {
                        kind: TokenKind::Literal,
                        text: &template[literal_start..start],
                    });
                }
                tokens.push(Token {
                    kind,
                    text: &template[start..start + len],
                });
                pos = start + len;
                literal_start = pos;
            }
            // '{' is one byte, so this stays on a char boundary.
            None => pos = start + 1,
        }
    }

    if literal_start < template.len() {
        tokens.push(Token {
            kind: TokenKind::Literal,
            text: &template[literal_start..],
        });
    }
    tokens
}

/// Returns the tag kind and its full length if `s` starts with a closed tag.
fn match_tag(s: &str) -> Option<(TokenKind, usize)> {
    DELIMITERS.iter().find_map(|(open, close, kind)| {
        let body = s.strip_prefix(open)?;
        body.find(close)
            .map(|end| (*kind, open.len() + end + close.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    fn joined(tokens: &[Token]) -> String {
        tokens.iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_plain_text() {
        let tokens = tokenize("hello world");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Literal);
        assert_eq!(tokens[0].text, "hello world");
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_classifies_tags() {
        let tpl = "Hi {{ name }}{% if x %}!{% endif %}{# note #}";
        let tokens = tokenize(tpl);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Literal,
                TokenKind::Output,
                TokenKind::Action,
                TokenKind::Literal,
                TokenKind::Action,
                TokenKind::Comment,
            ]
        );
        assert_eq!(tokens[1].inner(), "name");
        assert_eq!(tokens[2].inner(), "if x");
        assert_eq!(joined(&tokens), tpl);
    }

    #[test]
    fn test_tags_span_newlines() {
        let tpl = "a{#\nmulti\nline\n#}b{{\n x \n}}";
        let tokens = tokenize(tpl);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Literal,
                TokenKind::Comment,
                TokenKind::Literal,
                TokenKind::Output,
            ]
        );
        assert_eq!(tokens[3].inner(), "x");
        assert_eq!(joined(&tokens), tpl);
    }

    #[test]
    fn test_first_closer_ends_tag() {
        let tokens = tokenize("{{ a }} }}");
        assert_eq!(tokens[0].text, "{{ a }}");
        assert_eq!(tokens[1].text, " }}");

        let tokens = tokenize("{{{ a }}}");
        assert_eq!(tokens[0].text, "{{{ a }}");
        assert_eq!(tokens[0].inner(), "{ a");
        assert_eq!(tokens[1].text, "}");
    }

    #[test]
    fn test_unclosed_opener_is_literal() {
        let tpl = "x {{ y and {% if z %}";
        let tokens = tokenize(tpl);
        assert_eq!(kinds(&tokens), vec![TokenKind::Literal, TokenKind::Action]);
        assert_eq!(tokens[0].text, "x {{ y and ");
        assert_eq!(joined(&tokens), tpl);
    }

    #[test]
    fn test_multibyte_text() {
        let tpl = "héllo {{ wörld }} ✓ {";
        let tokens = tokenize(tpl);
        assert_eq!(joined(&tokens), tpl);
        assert_eq!(tokens[1].inner(), "wörld");
    }
}
