//! Tokenizer for the Ruby subset found in Puppetfiles

use crate::error::PuppetfileError;

/// A token kind
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Lexeme {
    /// String literal with escapes applied (interpolations kept verbatim)
    Str(String),
    /// `:name` or `:"name"`
    Symbol(String),
    /// `name:` hash key
    Label(String),
    Number(String),
    /// Identifier, keyword or variable (`@x`, `$x` keep their sigil)
    Ident(String),
    /// Capitalized identifier
    Const(String),
    /// Operator or delimiter
    Punct(&'static str),
    Newline,
    Eof,
}

impl Lexeme {
    /// Human readable form used in error messages
    pub(super) fn describe(&self) -> String {
        match self {
            Lexeme::Str(_) => "string literal".to_string(),
            Lexeme::Symbol(s) => format!("symbol `:{}`", s),
            Lexeme::Label(s) => format!("label `{}:`", s),
            Lexeme::Number(n) => format!("number `{}`", n),
            Lexeme::Ident(s) if is_keyword(s) => format!("keyword `{}`", s),
            Lexeme::Ident(s) | Lexeme::Const(s) => format!("`{}`", s),
            Lexeme::Punct(p) => format!("`{}`", p),
            Lexeme::Newline => "end of line".to_string(),
            Lexeme::Eof => "end of file".to_string(),
        }
    }
}

/// A lexeme with its position
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Token {
    pub(super) lexeme: Lexeme,
    /// 1-based line the token starts on
    pub(super) line: usize,
    /// Whether whitespace precedes the token
    pub(super) spaced: bool,
}

/// Reserved words of the subset
pub(super) const KEYWORDS: &[&str] = &[
    "and", "begin", "case", "def", "do", "else", "elsif", "end", "ensure", "false", "for", "if",
    "in", "nil", "not", "or", "rescue", "self", "then", "true", "unless", "until", "when", "while",
];

pub(super) fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

// Longest first
const OPERATORS: &[&str] = &[
    "**=", "<=>", "===", "...", "||=", "&&=", "<<=", ">>=", "==", "!=", ">=", "<=", "&&", "||",
    "=~", "!~", "**", "<<", ">>", "+=", "-=", "*=", "/=", "%=", "|=", "&=", "^=", "..", "&.",
    "->", "=>", "::", "+", "-", "*", "/", "%", "=", "<", ">", "!", "&", "|", "^", "~", "?", ":",
    ".", ",", ";", "(", ")", "[", "]", "{", "}",
];

pub(super) struct Lexer<'src> {
    source: &'src [u8],
    pos: usize,
    line: usize,
}

impl<'src> Lexer<'src> {
    pub(super) fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    pub(super) fn tokenize(mut self) -> Result<Vec<Token>, PuppetfileError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.lexeme == Lexeme::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.source[self.pos - 1] == b'\n'
    }

    fn starts_with(&self, text: &str) -> bool {
        self.source[self.pos..].starts_with(text.as_bytes())
    }

    fn token(&self, lexeme: Lexeme, line: usize, spaced: bool) -> Token {
        Token {
            lexeme,
            line,
            spaced,
        }
    }

    fn next_token(&mut self) -> Result<Token, PuppetfileError> {
        let spaced = self.skip_whitespace_and_comments()?;

        let line = self.line;
        let Some(ch) = self.peek_at(0) else {
            return Ok(self.token(Lexeme::Eof, line, spaced));
        };

        if ch == b'\n' {
            self.pos += 1;
            self.line += 1;
            return Ok(self.token(Lexeme::Newline, line, spaced));
        }

        // Everything after __END__ is data
        if self.at_line_start() && self.starts_with("__END__") {
            self.pos = self.source.len();
            return Ok(self.token(Lexeme::Eof, line, spaced));
        }

        let lexeme = if ch == b'\'' || ch == b'"' {
            Lexeme::Str(self.scan_string(ch)?)
        } else if ch == b':' && self.peek_at(1).is_some_and(|c| c == b'"' || c == b'\'') {
            self.pos += 1;
            let quote = self.source[self.pos];
            Lexeme::Symbol(self.scan_string(quote)?)
        } else if ch == b':' && self.peek_at(1).is_some_and(is_ident_start) {
            self.pos += 1;
            Lexeme::Symbol(self.scan_word(true))
        } else if is_ident_start(ch) || ch == b'@' || ch == b'$' {
            self.scan_ident()
        } else if ch.is_ascii_digit() {
            Lexeme::Number(self.scan_number())
        } else if let Some(op) = OPERATORS.iter().find(|op| self.starts_with(op)) {
            self.pos += op.len();
            Lexeme::Punct(*op)
        } else {
            return Err(PuppetfileError::syntax(
                line,
                format!("unexpected character `{}`", ch as char),
            ));
        };

        Ok(self.token(lexeme, line, spaced))
    }

    /// Skips blanks, comments and escaped newlines; returns whether anything was skipped
    fn skip_whitespace_and_comments(&mut self) -> Result<bool, PuppetfileError> {
        let start = self.pos;
        loop {
            match self.peek_at(0) {
                Some(b' ' | b'\t' | b'\r') => self.pos += 1,
                Some(b'\\') if self.peek_at(1) == Some(b'\n') => {
                    self.pos += 2;
                    self.line += 1;
                }
                Some(b'#') => {
                    while self.peek_at(0).is_some_and(|c| c != b'\n') {
                        self.pos += 1;
                    }
                }
                Some(b'=') if self.at_line_start() && self.starts_with("=begin") => {
                    self.skip_block_comment()?;
                }
                _ => break,
            }
        }
        Ok(self.pos > start)
    }

    fn skip_block_comment(&mut self) -> Result<(), PuppetfileError> {
        let opened_on = self.line;
        loop {
            while self.peek_at(0).is_some_and(|c| c != b'\n') {
                self.pos += 1;
            }
            if self.peek_at(0).is_none() {
                return Err(PuppetfileError::syntax(
                    opened_on,
                    "embedded document meets end of file",
                ));
            }
            self.pos += 1;
            self.line += 1;
            if self.starts_with("=end") {
                while self.peek_at(0).is_some_and(|c| c != b'\n') {
                    self.pos += 1;
                }
                return Ok(());
            }
        }
    }

    fn scan_string(&mut self, quote: u8) -> Result<String, PuppetfileError> {
        let opened_on = self.line;
        self.pos += 1;
        let mut value = Vec::new();

        loop {
            let Some(ch) = self.peek_at(0) else {
                return Err(PuppetfileError::syntax(opened_on, "unterminated string"));
            };
            self.pos += 1;
            match ch {
                b'\n' => {
                    self.line += 1;
                    value.push(ch);
                }
                c if c == quote => break,
                b'\\' => {
                    let Some(escaped) = self.peek_at(0) else {
                        return Err(PuppetfileError::syntax(opened_on, "unterminated string"));
                    };
                    self.pos += 1;
                    if escaped == b'\n' {
                        self.line += 1;
                    }
                    if quote == b'\'' {
                        // Single quotes only escape the quote and the backslash
                        if escaped != b'\'' && escaped != b'\\' {
                            value.push(b'\\');
                        }
                        value.push(escaped);
                    } else {
                        match escaped {
                            b'n' => value.push(b'\n'),
                            b't' => value.push(b'\t'),
                            b'0' => value.push(0),
                            b'\n' => {}
                            other => value.push(other),
                        }
                    }
                }
                b'#' if quote == b'"' && self.peek_at(0) == Some(b'{') => {
                    value.push(ch);
                    self.scan_interpolation(&mut value, opened_on)?;
                }
                _ => value.push(ch),
            }
        }

        Ok(String::from_utf8_lossy(&value).into_owned())
    }

    /// Copies `{...}` of an interpolation verbatim, balancing braces
    fn scan_interpolation(&mut self, value: &mut Vec<u8>, opened_on: usize) -> Result<(), PuppetfileError> {
        let mut depth = 0usize;
        while let Some(ch) = self.peek_at(0) {
            self.pos += 1;
            value.push(ch);
            match ch {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                b'\n' => self.line += 1,
                _ => {}
            }
        }
        Err(PuppetfileError::syntax(opened_on, "unterminated string"))
    }

    fn scan_word(&mut self, allow_suffix: bool) -> String {
        let start = self.pos;
        while self.peek_at(0).is_some_and(is_ident_continue) {
            self.pos += 1;
        }
        // Predicate and bang methods, unless this is `!=` or `?:`-style code
        if allow_suffix
            && matches!(self.peek_at(0), Some(b'?' | b'!'))
            && self.peek_at(1) != Some(b'=')
        {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.source[start..self.pos]).into_owned()
    }

    fn scan_ident(&mut self) -> Lexeme {
        let start = self.pos;
        while matches!(self.peek_at(0), Some(b'@' | b'$')) {
            self.pos += 1;
        }
        let sigil = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        let word = self.scan_word(sigil.is_empty());

        // `key: value`, but not `Foo::Bar`
        if sigil.is_empty() && self.peek_at(0) == Some(b':') && self.peek_at(1) != Some(b':') {
            self.pos += 1;
            return Lexeme::Label(word);
        }

        if sigil.is_empty() && word.starts_with(|c: char| c.is_ascii_uppercase()) {
            Lexeme::Const(word)
        } else {
            Lexeme::Ident(sigil + &word)
        }
    }

    fn scan_number(&mut self) -> String {
        let start = self.pos;
        while self
            .peek_at(0)
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.pos += 1;
        }
        if self.peek_at(0) == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            while self
                .peek_at(0)
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
            {
                self.pos += 1;
            }
        }
        String::from_utf8_lossy(&self.source[start..self.pos]).into_owned()
    }
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_' || ch >= 0x80
}

fn is_ident_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Lexeme> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.lexeme)
            .collect()
    }

    #[test]
    fn test_module_declaration() {
        assert_eq!(
            lex("mod 'puppetlabs/stdlib', :git => \"https://x\""),
            vec![
                Lexeme::Ident("mod".to_string()),
                Lexeme::Str("puppetlabs/stdlib".to_string()),
                Lexeme::Punct(","),
                Lexeme::Symbol("git".to_string()),
                Lexeme::Punct("=>"),
                Lexeme::Str("https://x".to_string()),
                Lexeme::Eof,
            ]
        );
    }

    #[test]
    fn test_labels_and_scopes() {
        assert_eq!(
            lex("ref: Foo::Bar"),
            vec![
                Lexeme::Label("ref".to_string()),
                Lexeme::Const("Foo".to_string()),
                Lexeme::Punct("::"),
                Lexeme::Const("Bar".to_string()),
                Lexeme::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_and_lines() {
        let tokens = Lexer::new("# header\nforge 'x' # trailing\n\n=begin\nmod 'a'\n=end\nmod")
            .tokenize()
            .unwrap();
        let idents: Vec<(String, usize)> = tokens
            .iter()
            .filter_map(|t| match &t.lexeme {
                Lexeme::Ident(s) => Some((s.clone(), t.line)),
                _ => None,
            })
            .collect();
        assert_eq!(
            idents,
            vec![("forge".to_string(), 2), ("mod".to_string(), 7)]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(lex(r#""a\tb""#)[0], Lexeme::Str("a\tb".to_string()));
        assert_eq!(lex(r"'a\nb'")[0], Lexeme::Str(r"a\nb".to_string()));
        assert_eq!(lex(r"'it\'s'")[0], Lexeme::Str("it's".to_string()));
        assert_eq!(
            lex(r#""v#{ENV['X'] || "1"}""#)[0],
            Lexeme::Str(r#"v#{ENV['X'] || "1"}"#.to_string())
        );
    }

    #[test]
    fn test_spacing_flag() {
        let tokens = Lexer::new("foo(1) foo (1)").tokenize().unwrap();
        assert!(!tokens[1].spaced);
        assert!(tokens[5].spaced);
    }

    #[test]
    fn test_predicate_methods_and_operators() {
        assert_eq!(
            lex("x.nil? != y"),
            vec![
                Lexeme::Ident("x".to_string()),
                Lexeme::Punct("."),
                Lexeme::Ident("nil?".to_string()),
                Lexeme::Punct("!="),
                Lexeme::Ident("y".to_string()),
                Lexeme::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("mod 'a'\nmod \"b").tokenize().unwrap_err();
        assert_eq!(err.line(), 2);
        assert!(err.to_string().contains("unterminated string"));
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("mod `a`").tokenize().unwrap_err();
        assert!(err.to_string().contains("unexpected character"));
    }

    #[test]
    fn test_data_section_is_ignored() {
        assert_eq!(
            lex("mod 'a'\n__END__\n'unterminated"),
            vec![
                Lexeme::Ident("mod".to_string()),
                Lexeme::Str("a".to_string()),
                Lexeme::Newline,
                Lexeme::Eof,
            ]
        );
    }
}
