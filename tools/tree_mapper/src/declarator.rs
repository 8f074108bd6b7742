//! Recovers what clang's JSON dump leaves out of a declarator: the names of parameters of
//! function types (`void (*cb)(int fd, char *buf)`) and the written text of array bounds
//! (`int a[MAX_SIZE + 1]`).
//!
//! The tokens after a declarator's name form a sequence of suffix groups, parameter lists and
//! array bounds, in the order the type applies them from the outside in: in
//! `int (*f(int a))(char b)`, `f` is a function taking `a` that returns a pointer to a function
//! taking `b`, and the groups are `(int a)` then `(char b)`.

use crate::tokens::{Token, tokenize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Group {
    Params(Vec<ParamDeclarator>),
    /// The text between `[` and `]`, empty for `[]`.
    Bound(String),
}

/// A parameter as written: its name, if any, and the suffix groups of its own declarator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamDeclarator {
    pub name: Option<String>,
    pub groups: Vec<Group>,
}

const QUALIFIERS: [&str; 11] = [
    "const",
    "volatile",
    "restrict",
    "__restrict",
    "__restrict__",
    "__const",
    "__volatile__",
    "_Nonnull",
    "_Nullable",
    "_Null_unspecified",
    "_Atomic",
];

const STORAGE: [&str; 10] = [
    "static",
    "extern",
    "register",
    "auto",
    "inline",
    "__inline",
    "__inline__",
    "_Noreturn",
    "_Thread_local",
    "__extension__",
];

const ATTRIBUTES: [&str; 8] = [
    "__attribute__",
    "__attribute",
    "__declspec",
    "asm",
    "__asm__",
    "__asm",
    "_Alignas",
    "alignas",
];

const TYPE_OPERATORS: [&str; 3] = ["typeof", "__typeof__", "__typeof"];

const TYPE_WORDS: [&str; 17] = [
    "void", "char", "short", "int", "long", "float", "double", "signed", "unsigned", "_Bool",
    "bool", "_Complex", "__int128", "_Float16", "__fp16", "__bf16", "__signed__",
];

/// Scans the suffix groups of a declarator. `text` starts at the declarator's name and may run
/// past the declarator; scanning stops at `=`, `:`, `,`, `;` or `{`.
pub fn suffix_groups(text: &str) -> Vec<Group> {
    let tokens = tokenize(text);
    let mut scanner = Scanner {
        text,
        tokens: &tokens,
        pos: 0,
    };
    if scanner.peek().is_some_and(|t| t.is_ident()) {
        scanner.pos += 1;
    }
    scanner.trailing_groups()
}

struct Scanner<'t, 'a> {
    text: &'a str,
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl<'t, 'a> Scanner<'t, 'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_is(&self, text: &str) -> bool {
        self.peek().is_some_and(|t| t.is(text))
    }

    fn peek_at(&self, n: usize) -> Option<Token<'a>> {
        self.tokens.get(self.pos + n).copied()
    }

    /// Skips a bracketed group starting at the current token.
    fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            self.pos += 1;
            match token.text {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    fn skip_attribute(&mut self) {
        self.pos += 1;
        if self.peek_is("(") {
            self.skip_balanced();
        }
    }

    /// Groups after a name: parameter lists, bounds and the `)` closing nested declarators.
    fn trailing_groups(&mut self) -> Vec<Group> {
        let mut groups = vec![];
        while let Some(token) = self.peek() {
            match token.text {
                "(" => {
                    self.pos += 1;
                    groups.push(Group::Params(self.param_list()));
                }
                "[" => groups.push(Group::Bound(self.bound())),
                ")" => self.pos += 1,
                t if QUALIFIERS.contains(&t) => self.pos += 1,
                t if ATTRIBUTES.contains(&t) => self.skip_attribute(),
                // Attribute-like macro, `int f(void) DEPRECATED("use g");`
                _ if token.is_ident() && self.peek_at(1).is_some_and(|t| t.is("(")) => {
                    self.skip_attribute()
                }
                _ => break,
            }
        }
        groups
    }

    /// Reads `[ ... ]` and returns the text between the brackets.
    fn bound(&mut self) -> String {
        let open = self.pos;
        self.skip_balanced();
        let Some(open_token) = self.tokens.get(open) else {
            return String::new();
        };
        let start = open_token.end();
        let end = match self.tokens.get(self.pos - 1) {
            Some(close) if self.pos - 1 > open && close.is("]") => close.start,
            _ => self.text.len(),
        };
        self.text[start..end].trim().to_string()
    }

    /// Reads the parameters of a list whose `(` was just consumed, through the closing `)`.
    fn param_list(&mut self) -> Vec<ParamDeclarator> {
        let tokens = self.tokens;
        let mut segments: Vec<&'t [Token<'a>]> = vec![];
        let mut start = self.pos;
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token.text {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" if depth > 0 => depth -= 1,
                ")" => break,
                "," if depth == 0 => {
                    segments.push(&tokens[start..self.pos]);
                    start = self.pos + 1;
                }
                _ => {}
            }
            self.pos += 1;
        }
        let end = self.pos.min(tokens.len());
        if start < end || !segments.is_empty() {
            segments.push(&tokens[start..end]);
        }
        // The closing `)`.
        self.pos += 1;

        if matches!(segments.as_slice(), [[only]] if only.is("void")) {
            return vec![];
        }
        segments
            .into_iter()
            .filter(|segment| !matches!(segment, [t] if t.is("...")))
            .map(|segment| self.param(segment))
            .collect()
    }

    fn param(&self, tokens: &'t [Token<'a>]) -> ParamDeclarator {
        let mut scanner = Scanner {
            text: self.text,
            tokens,
            pos: 0,
        };
        scanner.specifiers();
        scanner.declarator()
    }

    /// Skips declaration specifiers. The first identifier that is not a keyword is taken as a
    /// typedef name when no type specifier was seen yet; otherwise it belongs to the declarator.
    fn specifiers(&mut self) {
        let mut seen_type = false;
        while let Some(token) = self.peek() {
            let t = token.text;
            if QUALIFIERS.contains(&t) || STORAGE.contains(&t) {
                self.pos += 1;
            } else if matches!(t, "struct" | "union" | "enum") {
                self.pos += 1;
                if self.peek().is_some_and(|t| t.is_ident()) {
                    self.pos += 1;
                }
                if self.peek_is("{") {
                    self.skip_balanced();
                }
                seen_type = true;
            } else if TYPE_WORDS.contains(&t) {
                self.pos += 1;
                seen_type = true;
            } else if ATTRIBUTES.contains(&t) {
                self.skip_attribute();
            } else if TYPE_OPERATORS.contains(&t) {
                self.skip_attribute();
                seen_type = true;
            } else if token.is_ident() && !seen_type {
                self.pos += 1;
                seen_type = true;
            } else {
                break;
            }
        }
    }

    fn declarator(&mut self) -> ParamDeclarator {
        while let Some(token) = self.peek() {
            if token.is("*") || token.is("^") || QUALIFIERS.contains(&token.text) {
                self.pos += 1;
            } else if ATTRIBUTES.contains(&token.text) {
                self.skip_attribute();
            } else {
                break;
            }
        }

        let mut declarator = ParamDeclarator::default();
        match self.peek() {
            Some(token) if token.is_ident() => {
                declarator.name = Some(token.text.to_string());
                self.pos += 1;
            }
            Some(token)
                if token.is("(")
                    && self
                        .peek_at(1)
                        .is_some_and(|t| matches!(t.text, "*" | "^" | "(" | "[")) =>
            {
                self.pos += 1;
                declarator = self.declarator();
                if self.peek_is(")") {
                    self.pos += 1;
                }
            }
            _ => {}
        }

        while let Some(token) = self.peek() {
            match token.text {
                "(" => {
                    self.pos += 1;
                    let params = self.param_list();
                    declarator.groups.push(Group::Params(params));
                }
                "[" => {
                    let bound = self.bound();
                    declarator.groups.push(Group::Bound(bound));
                }
                t if ATTRIBUTES.contains(&t) => self.skip_attribute(),
                _ => break,
            }
        }
        declarator
    }
}
