use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Emoji keywords
    Print,       // 🖨️
    Assign,      // ✍️
    Equal,       // 🟰
    Try,         // 👨🏿‍💻
    Catch,       // 🤦🏿‍♂️
    TryStart,    // 🚀
    Function,    // ▶️
    Return,      // ↩️
    Interpolate, // 💱
    Mult,        // ✖️ or *
    NumPlus,     // ➕

    // Type annotation markers
    TypeNumber, // 🔢
    TypeText,   // 📝
    TypeBool,   // ⚖️
    TypeAny,    // 🗑️

    // Structural / operator characters
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    EqualSign,
    Plus,
    Concat,
    Colon,

    // Literals and names
    Identifier,
    Str,
    Number,
    Boolean,
    Main,

    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::Print => "🖨️",
            TokenKind::Assign => "✍️",
            TokenKind::Equal => "🟰",
            TokenKind::Try => "👨🏿‍💻",
            TokenKind::Catch => "🤦🏿‍♂️",
            TokenKind::TryStart => "🚀",
            TokenKind::Function => "▶️",
            TokenKind::Return => "↩️",
            TokenKind::Interpolate => "💱",
            TokenKind::Mult => "✖️",
            TokenKind::NumPlus => "➕",
            TokenKind::TypeNumber => "🔢",
            TokenKind::TypeText => "📝",
            TokenKind::TypeBool => "⚖️",
            TokenKind::TypeAny => "🗑️",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Comma => ",",
            TokenKind::EqualSign => "=",
            TokenKind::Plus => "+",
            TokenKind::Concat => ".",
            TokenKind::Colon => ":",
            TokenKind::Identifier => "identifier",
            TokenKind::Str => "string",
            TokenKind::Number => "number",
            TokenKind::Boolean => "boolean",
            TokenKind::Main => "main",
            TokenKind::Eof => "end of input",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated interpolation")]
    UnterminatedInterpolation,
}

/// Fatal lexing failure. Carries the token sequence accumulated before the
/// point of failure so callers can still inspect the partial stream.
#[derive(Debug, thiserror::Error)]
#[error("{kind} at byte {position}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub position: usize,
    pub tokens: Vec<Token>,
}

/// Fixed emoji glyphs, matched by exact prefix before any per-character
/// classification. Some of these are zero-width-joiner compositions, so
/// prefix order over the whole sequence matters.
const EMOJI_TOKENS: &[(&str, TokenKind)] = &[
    ("🖨️", TokenKind::Print),
    ("✍️", TokenKind::Assign),
    ("🟰", TokenKind::Equal),
    ("👨🏿‍💻", TokenKind::Try),
    ("🤦🏿‍♂️", TokenKind::Catch),
    ("🚀", TokenKind::TryStart),
    ("▶️", TokenKind::Function),
    ("↩️", TokenKind::Return),
    ("✖️", TokenKind::Mult),
    ("➕", TokenKind::NumPlus),
    ("💱", TokenKind::Interpolate),
    ("🔢", TokenKind::TypeNumber),
    ("📝", TokenKind::TypeText),
    ("⚖️", TokenKind::TypeBool),
    ("🗑️", TokenKind::TypeAny),
];

/// Converts source text into an ordered token sequence, terminated by a
/// single Eof token. Unknown characters are skipped with a warning;
/// unterminated strings and interpolations stop lexing immediately.
pub fn tokens(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    'scan: while pos < source.len() {
        let rest = &source[pos..];

        for (glyph, kind) in EMOJI_TOKENS {
            if rest.starts_with(glyph) {
                tokens.push(Token::new(*kind, *glyph));
                pos += glyph.len();
                continue 'scan;
            }
        }

        let Some(c) = rest.chars().next() else {
            break;
        };

        match c {
            '{' => tokens.push(Token::new(TokenKind::LBrace, "{")),
            '}' => tokens.push(Token::new(TokenKind::RBrace, "}")),
            '(' => tokens.push(Token::new(TokenKind::LParen, "(")),
            ')' => tokens.push(Token::new(TokenKind::RParen, ")")),
            ',' => tokens.push(Token::new(TokenKind::Comma, ",")),
            '=' => tokens.push(Token::new(TokenKind::EqualSign, "=")),
            '+' => tokens.push(Token::new(TokenKind::Plus, "+")),
            '*' => tokens.push(Token::new(TokenKind::Mult, "*")),
            '.' => tokens.push(Token::new(TokenKind::Concat, ".")),
            ':' => tokens.push(Token::new(TokenKind::Colon, ":")),
            '"' => {
                match string(source, pos, &mut tokens) {
                    Ok(next) => pos = next,
                    Err((kind, position)) => {
                        return Err(LexError {
                            kind,
                            position,
                            tokens,
                        })
                    }
                }
                continue 'scan;
            }
            c if c.is_alphabetic() => {
                let len = word_len(rest);
                let word = &rest[..len];
                let kind = match word {
                    "true" | "false" => TokenKind::Boolean,
                    "main" => TokenKind::Main,
                    _ => TokenKind::Identifier,
                };
                tokens.push(Token::new(kind, word));
                pos += len;
                continue 'scan;
            }
            c if c.is_ascii_digit() => {
                let len = rest
                    .chars()
                    .take_while(|c| c.is_ascii_digit())
                    .map(char::len_utf8)
                    .sum();
                tokens.push(Token::new(TokenKind::Number, &rest[..len]));
                pos += len;
                continue 'scan;
            }
            c if c.is_whitespace() => {}
            '\u{FE0F}' | '\u{FEFF}' => {} // stray variation selector or BOM
            c => warn!("skipping unexpected character {c:?} (U+{:04X}) at byte {pos}", c as u32),
        }

        pos += c.len_utf8();
    }

    tokens.push(Token::new(TokenKind::Eof, ""));
    debug!("tokenized {} tokens", tokens.len());
    Ok(tokens)
}

/// Maximal run of a letter followed by letters or digits.
fn word_len(rest: &str) -> usize {
    rest.chars()
        .take_while(|c| c.is_alphanumeric())
        .map(char::len_utf8)
        .sum()
}

/// Scans a `"`-delimited string starting at the opening quote. An embedded
/// `💱{name}` splits the literal: the text accumulated so far is emitted as a
/// Str token, followed by Interpolate, LBrace, the name as an Identifier, and
/// RBrace; literal scanning then resumes. Returns the byte position just past
/// the closing quote.
fn string(
    source: &str,
    start: usize,
    tokens: &mut Vec<Token>,
) -> Result<usize, (LexErrorKind, usize)> {
    let mut pos = start + 1;
    let mut content = String::new();

    loop {
        let rest = &source[pos..];

        if rest.starts_with('"') {
            tokens.push(Token::new(TokenKind::Str, content));
            return Ok(pos + 1);
        }

        if rest.starts_with("💱{") {
            tokens.push(Token::new(TokenKind::Str, std::mem::take(&mut content)));
            tokens.push(Token::new(TokenKind::Interpolate, "💱"));
            tokens.push(Token::new(TokenKind::LBrace, "{"));
            pos += "💱{".len();

            let name_start = pos;
            while pos < source.len() && !source[pos..].starts_with('}') {
                pos += source[pos..]
                    .chars()
                    .next()
                    .map(char::len_utf8)
                    .unwrap_or(1);
            }
            if pos >= source.len() {
                return Err((LexErrorKind::UnterminatedInterpolation, pos));
            }

            tokens.push(Token::new(TokenKind::Identifier, &source[name_start..pos]));
            tokens.push(Token::new(TokenKind::RBrace, "}"));
            pos += 1; // past the }
            continue;
        }

        let Some(c) = rest.chars().next() else {
            return Err((LexErrorKind::UnterminatedString, pos));
        };
        content.push(c);
        pos += c.len_utf8();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokens(source)
            .expect("lexing should succeed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_print_statement() {
        let toks = tokens("🖨️\"Hello\"").unwrap();
        assert_eq!(
            toks,
            vec![
                Token::new(TokenKind::Print, "🖨️"),
                Token::new(TokenKind::Str, "Hello"),
                Token::new(TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_assignment_with_annotation() {
        assert_eq!(
            kinds("✍️x:🔢 = 10"),
            vec![
                TokenKind::Assign,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::TypeNumber,
                TokenKind::EqualSign,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_zwj_emoji_sequences() {
        assert_eq!(
            kinds("🚀v,2👨🏿‍💻{}🤦🏿‍♂️{}"),
            vec![
                TokenKind::TryStart,
                TokenKind::Identifier,
                TokenKind::Comma,
                TokenKind::Number,
                TokenKind::Try,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Catch,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let toks = tokens("main verdade true false abc123").unwrap();
        assert_eq!(
            toks.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::Main,
                TokenKind::Identifier,
                TokenKind::Boolean,
                TokenKind::Boolean,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
        assert_eq!(toks[4].text, "abc123");
    }

    #[test]
    fn test_interpolation_splits_string() {
        let toks = tokens("\"Oi 💱{name}\"").unwrap();
        assert_eq!(
            toks,
            vec![
                Token::new(TokenKind::Str, "Oi "),
                Token::new(TokenKind::Interpolate, "💱"),
                Token::new(TokenKind::LBrace, "{"),
                Token::new(TokenKind::Identifier, "name"),
                Token::new(TokenKind::RBrace, "}"),
                Token::new(TokenKind::Str, ""),
                Token::new(TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_fatal() {
        let err = tokens("✍️x = \"oops").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        // The partial stream up to the failure survives in the error.
        assert_eq!(
            err.tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::Assign,
                TokenKind::Identifier,
                TokenKind::EqualSign,
            ]
        );
    }

    #[test]
    fn test_unterminated_interpolation_is_fatal() {
        let err = tokens("🖨️\"Oi 💱{name").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedInterpolation);
    }

    #[test]
    fn test_unknown_character_is_skipped() {
        assert_eq!(kinds("✍️x @ = 1"), kinds("✍️x = 1"));
    }

    #[test]
    fn test_bom_and_variation_selector_discarded() {
        assert_eq!(kinds("\u{FEFF}✍️x\u{FE0F} = 1"), kinds("✍️x = 1"));
    }

    #[test]
    fn test_ascii_operator_aliases() {
        assert_eq!(
            kinds("x + y * z . w"),
            vec![
                TokenKind::Identifier,
                TokenKind::Plus,
                TokenKind::Identifier,
                TokenKind::Mult,
                TokenKind::Identifier,
                TokenKind::Concat,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }
}
