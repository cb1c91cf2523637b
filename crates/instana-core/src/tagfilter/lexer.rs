use super::{EntityOrigin, LogicalOperator, Operator, ParseError};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    LParen,
    RParen,
    Colon,
    Origin(EntityOrigin),
    Logical(LogicalOperator),
    Operator(Operator),
    Boolean(bool),
    Number(f64),
    String(String),
    Identifier(String),
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Colon => "':'".to_string(),
            Token::Origin(origin) => format!("@{}", origin.as_str()),
            Token::Logical(op) => op.as_str().to_string(),
            Token::Operator(op) => op.as_str().to_string(),
            Token::Boolean(b) => b.to_string(),
            Token::Number(n) => n.to_string(),
            Token::String(_) => "string literal".to_string(),
            Token::Identifier(name) => format!("identifier {name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub(crate) token: Token,
    pub(crate) offset: usize,
    /// source text of the token, used where keywords stand as tag names.
    pub(crate) text: String,
}

impl Spanned {
    /// the token read as a tag name or key. words keep their source spelling
    /// even when they spell a keyword.
    pub(crate) fn as_name(&self) -> Option<String> {
        match &self.token {
            Token::Identifier(name) => Some(name.clone()),
            Token::Logical(_) | Token::Operator(_) | Token::Boolean(_) => Some(self.text.clone()),
            _ => None,
        }
    }
}

fn token_regex() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| {
        Regex::new(concat!(
            r"\A(?:",
            r"(?P<ws>\s+)",
            r"|(?P<lparen>\()",
            r"|(?P<rparen>\))",
            r"|(?P<colon>:)",
            r"|(?P<origin>@[A-Za-z]*)",
            r"|(?P<string>'(?:[^']|'')*')",
            r"|(?P<number>-?[0-9]+(?:\.[0-9]+)?(?:[eE][-+]?[0-9]+)?)",
            r"|(?P<word>[A-Za-z_][A-Za-z0-9_.\-/]*)",
            r")"
        ))
        .expect("tag filter token regex is valid")
    })
}

/// split `input` into tokens with byte offsets.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>, ParseError> {
    let re = token_regex();
    let mut tokens = Vec::new();
    let mut offset = 0;

    while offset < input.len() {
        let rest = &input[offset..];
        let Some(caps) = re.captures(rest) else {
            if rest.starts_with('\'') {
                return Err(ParseError::at(offset, "unterminated string literal"));
            }
            let found = rest.chars().next().unwrap_or_default();
            return Err(ParseError::at(offset, format!("unexpected character '{found}'")));
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        let text = whole.as_str();

        let token = if caps.name("ws").is_some() {
            None
        } else if caps.name("lparen").is_some() {
            Some(Token::LParen)
        } else if caps.name("rparen").is_some() {
            Some(Token::RParen)
        } else if caps.name("colon").is_some() {
            Some(Token::Colon)
        } else if caps.name("origin").is_some() {
            let origin = EntityOrigin::from_keyword(&text[1..].to_ascii_lowercase())
                .ok_or_else(|| {
                    ParseError::at(
                        offset,
                        format!("unknown entity origin '{text}', expected @src, @dest or @na"),
                    )
                })?;
            Some(Token::Origin(origin))
        } else if caps.name("string").is_some() {
            let inner = &text[1..text.len() - 1];
            Some(Token::String(inner.replace("''", "'")))
        } else if caps.name("number").is_some() {
            let number = text
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| ParseError::at(offset, format!("number '{text}' is out of range")))?;
            Some(Token::Number(number))
        } else {
            Some(classify_word(text))
        };

        if let Some(token) = token {
            tokens.push(Spanned {
                token,
                offset,
                text: text.to_string(),
            });
        }
        offset += text.len();
    }

    Ok(tokens)
}

fn classify_word(word: &str) -> Token {
    if word.eq_ignore_ascii_case("and") {
        return Token::Logical(LogicalOperator::And);
    }
    if word.eq_ignore_ascii_case("or") {
        return Token::Logical(LogicalOperator::Or);
    }
    if word.eq_ignore_ascii_case("true") {
        return Token::Boolean(true);
    }
    if word.eq_ignore_ascii_case("false") {
        return Token::Boolean(false);
    }
    match Operator::from_keyword(word) {
        Some(op) => Token::Operator(op),
        None => Token::Identifier(word.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|spanned| spanned.token)
            .collect()
    }

    #[test]
    fn tokenizes_comparison() {
        assert_eq!(
            kinds("call.type@src equals 'it''s'"),
            vec![
                Token::Identifier("call.type".to_string()),
                Token::Origin(EntityOrigin::Source),
                Token::Operator(Operator::Equals),
                Token::String("it's".to_string()),
            ]
        );
    }

    #[test]
    fn tokenizes_keywords_case_insensitively() {
        assert_eq!(
            kinds("(a Or b) AND TRUE -2.5"),
            vec![
                Token::LParen,
                Token::Identifier("a".to_string()),
                Token::Logical(LogicalOperator::Or),
                Token::Identifier("b".to_string()),
                Token::RParen,
                Token::Logical(LogicalOperator::And),
                Token::Boolean(true),
                Token::Number(-2.5),
            ]
        );
    }

    #[test]
    fn records_offsets() {
        let tokens = tokenize("  a  EQUALS 1").unwrap();
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![2, 5, 12]);
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = tokenize("a EQUALS 'x").unwrap_err();
        assert_eq!(err.column, 10);
    }

    #[test]
    fn rejects_numbers_outside_f64_range() {
        let err = tokenize("x EQUALS 1e400").unwrap_err();
        assert_eq!(err.column, 10);
        assert!(err.message.contains("1e400"));
        assert!(tokenize("x EQUALS -1e400").is_err());
        assert_eq!(kinds("1e300"), vec![Token::Number(1e300)]);
    }

    #[test]
    fn keywords_keep_their_source_text() {
        let tokens = tokenize("True and").unwrap();
        assert_eq!(tokens[0].token, Token::Boolean(true));
        assert_eq!(tokens[0].as_name().as_deref(), Some("True"));
        assert_eq!(tokens[1].as_name().as_deref(), Some("and"));
    }

    #[test]
    fn rejects_unknown_origin() {
        let err = tokenize("a@foo EQUALS 1").unwrap_err();
        assert_eq!(err.column, 2);
        assert!(err.message.contains("@foo"));
    }
}
