//! Import specifier rewriting
//!
//! Registry sources import each other through fixed prefixes (`@/tools/...`,
//! `@/prompts/...`, `@/agents/...`). Before files land in a project those
//! prefixes are swapped for the project's configured aliases.
//!
//! Files are scanned with a small lexer that understands comments, string,
//! template and regex literals well enough to find module specifiers in
//! `import ... from "x"`, `export ... from "x"`, `import "x"`, `import("x")`
//! and `require("x")`. Only the specifier text is replaced; everything else is
//! copied through byte for byte.

use std::path::Path;

use crate::config::{Aliases, Config};
use crate::item::Category;

const SCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Keywords after which a `/` starts a regex literal rather than a division
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

/// Rewrite internal import prefixes in `raw` to the aliases in `config`.
///
/// Files that aren't JavaScript or TypeScript sources are returned unchanged.
pub fn rewrite_imports(filename: &str, raw: &str, config: &Config) -> String {
    if !is_script(filename) {
        return raw.to_string();
    }

    let mut scanner = Scanner::new(raw);
    scanner.scan_code(false);

    let mut out = String::with_capacity(raw.len());
    let mut last = 0;
    for (start, end) in scanner.specifiers {
        if let Some(replacement) = rewrite_specifier(&raw[start..end], &config.aliases) {
            out.push_str(&raw[last..start]);
            out.push_str(&replacement);
            last = end;
        }
    }
    out.push_str(&raw[last..]);
    out
}

fn is_script(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

/// `@/tools/lib/x` → `<tools alias>/lib/x`; `None` when nothing matches.
fn rewrite_specifier(specifier: &str, aliases: &Aliases) -> Option<String> {
    for category in Category::ALL {
        let prefix = format!("@/{}", category);
        let Some(rest) = specifier.strip_prefix(prefix.as_str()) else {
            continue;
        };
        if !rest.is_empty() && !rest.starts_with('/') {
            continue;
        }

        let alias = aliases.get(category).trim_end_matches('/');
        if alias == prefix {
            return None;
        }
        return Some(format!("{}{}", alias, rest));
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Word(usize, usize),
    Punct(u8),
    Literal,
}

/// Single-use lexer state for one file
struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    prev: Option<Token>,
    prev2: Option<Token>,
    /// Byte ranges of specifier text, quotes excluded
    specifiers: Vec<(usize, usize)>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            prev: None,
            prev2: None,
            specifiers: Vec::new(),
        }
    }

    fn push(&mut self, token: Token) {
        self.prev2 = self.prev;
        self.prev = Some(token);
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn word(&self, token: Option<Token>) -> Option<&'a str> {
        match token {
            Some(Token::Word(start, end)) => Some(&self.src[start..end]),
            _ => None,
        }
    }

    /// Scan code until end of input, or until the `}` closing a template
    /// substitution when `nested`.
    fn scan_code(&mut self, nested: bool) {
        let mut depth = 0usize;

        while let Some(byte) = self.peek(0) {
            match byte {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment(),
                b'/' if self.regex_allowed() => {
                    self.skip_regex();
                    self.push(Token::Literal);
                }
                b'\'' | b'"' => self.string(byte),
                b'`' => self.template(),
                b'{' => {
                    depth += 1;
                    self.pos += 1;
                    self.push(Token::Punct(byte));
                }
                b'}' => {
                    self.pos += 1;
                    if nested && depth == 0 {
                        return;
                    }
                    depth = depth.saturating_sub(1);
                    self.push(Token::Punct(byte));
                }
                b if is_word_byte(b) => {
                    let start = self.pos;
                    while self.peek(0).is_some_and(is_word_byte) {
                        self.pos += 1;
                    }
                    self.push(Token::Word(start, self.pos));
                }
                _ => {
                    self.pos += 1;
                    self.push(Token::Punct(byte));
                }
            }
        }
    }

    fn in_specifier_position(&self) -> bool {
        match self.prev {
            Some(Token::Word(..)) => matches!(self.word(self.prev), Some("from" | "import")),
            Some(Token::Punct(b'(')) => {
                matches!(self.word(self.prev2), Some("import" | "require"))
            }
            _ => false,
        }
    }

    fn regex_allowed(&self) -> bool {
        match self.prev {
            None => true,
            Some(Token::Punct(b')' | b']')) => false,
            Some(Token::Punct(_)) => true,
            Some(Token::Word(..)) => self
                .word(self.prev)
                .is_some_and(|w| REGEX_PRECEDING_KEYWORDS.contains(&w)),
            Some(Token::Literal) => false,
        }
    }

    fn string(&mut self, quote: u8) {
        let start = self.pos + 1;
        self.pos += 1;

        let mut end = None;
        while let Some(byte) = self.peek(0) {
            match byte {
                b'\\' => self.pos += 2,
                b'\n' => break,
                b if b == quote => {
                    end = Some(self.pos);
                    self.pos += 1;
                    break;
                }
                _ => self.pos += 1,
            }
        }

        if let Some(end) = end
            && self.in_specifier_position()
        {
            self.specifiers.push((start, end));
        }
        self.push(Token::Literal);
    }

    fn template(&mut self) {
        self.pos += 1;

        while let Some(byte) = self.peek(0) {
            match byte {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    break;
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.prev = Some(Token::Punct(b'{'));
                    self.prev2 = None;
                    self.scan_code(true);
                }
                _ => self.pos += 1,
            }
        }

        self.push(Token::Literal);
    }

    fn skip_regex(&mut self) {
        self.pos += 1;
        let mut in_class = false;

        while let Some(byte) = self.peek(0) {
            match byte {
                b'\\' => self.pos += 2,
                b'\n' => break,
                b'[' => {
                    in_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_class = false;
                    self.pos += 1;
                }
                b'/' if !in_class => {
                    self.pos += 1;
                    break;
                }
                _ => self.pos += 1,
            }
        }

        while self.peek(0).is_some_and(|b| b.is_ascii_alphabetic()) {
            self.pos += 1;
        }
    }

    fn skip_line_comment(&mut self) {
        while self.peek(0).is_some_and(|b| b != b'\n') {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        match self.src[self.pos..].find("*/") {
            Some(offset) => self.pos += offset + 2,
            None => self.pos = self.bytes.len(),
        }
    }
}

/// Identifier, keyword and number bytes. Non-ASCII bytes count as word bytes
/// so the scanner never stops inside a multi-byte character.
fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$' || byte >= 0x80
}
