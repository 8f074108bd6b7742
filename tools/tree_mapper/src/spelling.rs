//! Parser for the type spellings clang prints in `qualType`, such as `const char *const`,
//! `void (*(*)(int))(char)` or `struct (unnamed struct at a.h:3:5) [4]`.
//!
//! clang prints types as abstract declarators in a canonical form, so a small recursive-descent
//! parser over its tokens recovers the type tree. Names are left unresolved: tags carry their
//! name or, for anonymous tags, the location clang embeds in the spelling.

use crate::model::Qualifiers;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagKind {
    Struct,
    Union,
    Enum,
}

impl TagKind {
    pub fn from_keyword(keyword: &str) -> Option<TagKind> {
        match keyword {
            "struct" => Some(TagKind::Struct),
            "union" => Some(TagKind::Union),
            "enum" => Some(TagKind::Enum),
            _ => None,
        }
    }
}

/// Where clang says an anonymous tag was declared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnonLocation {
    pub file: String,
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for AnonLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagName {
    Named(String),
    Anonymous(AnonLocation),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ty {
    pub kind: TyKind,
    pub quals: Qualifiers,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TyKind {
    /// Builtin type specifiers in written order, e.g. `unsigned long`.
    Builtin(String),
    Tag(TagKind, TagName),
    Typedef(String),
    Pointer(Box<Ty>),
    Array(Box<Ty>, Option<u64>),
    Function {
        result: Box<Ty>,
        /// `None` for a function without a prototype, `int ()`.
        params: Option<Vec<Ty>>,
        variadic: bool,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub struct SpellingError {
    pub spelling: String,
    pub reason: String,
}

impl fmt::Display for SpellingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse type `{}`: {}", self.spelling, self.reason)
    }
}

impl std::error::Error for SpellingError {}

pub fn parse(spelling: &str) -> Result<Ty, SpellingError> {
    let error = |reason: String| SpellingError {
        spelling: spelling.to_string(),
        reason,
    };
    let tokens = lex(spelling).map_err(error)?;
    let mut parser = Parser { tokens, pos: 0 };
    let ty = parser.type_name().map_err(error)?;
    match parser.peek() {
        None => Ok(ty),
        Some(token) => Err(error(format!("unexpected {token:?}"))),
    }
}

const BUILTIN_WORDS: [&str; 16] = [
    "void", "char", "short", "int", "long", "float", "double", "signed", "unsigned", "_Bool",
    "bool", "_Complex", "__int128", "_Float16", "__fp16", "__bf16",
];

/// Nullability annotations clang prints after pointers; they do not change the type.
const IGNORED_WORDS: [&str; 5] = [
    "_Nonnull",
    "_Nullable",
    "_Null_unspecified",
    "_Nullable_result",
    "__unaligned",
];

/// Type-level operators clang may print instead of a type name.
const TYPE_OPERATORS: [&str; 7] = [
    "typeof",
    "typeof_unqual",
    "__typeof",
    "__typeof__",
    "_Atomic",
    "__underlying_type",
    "__auto_type",
];

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Word(String),
    Number(u64),
    Punct(char),
    Ellipsis,
    /// `(unnamed struct at a.h:3:5)`, with the tag keyword if clang printed one inside.
    Anonymous(Option<TagKind>, AnonLocation),
}

fn lex(spelling: &str) -> Result<Vec<Token>, String> {
    let mut tokens = vec![];
    let mut rest = spelling;
    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
        } else if rest.starts_with("...") {
            tokens.push(Token::Ellipsis);
            rest = &rest[3..];
        } else if c == '(' && anonymous_marker(&rest[1..]) {
            let end = matching_paren(rest).ok_or("unbalanced anonymous tag")?;
            let (kind, loc) = anonymous_tag(&rest[1..end])?;
            tokens.push(Token::Anonymous(kind, loc));
            rest = &rest[end + 1..];
        } else if c.is_ascii_alphabetic() || c == '_' {
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            tokens.push(Token::Word(rest[..end].to_string()));
            rest = &rest[end..];
        } else if c.is_ascii_digit() {
            let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            let n = rest[..end].parse().map_err(|e| format!("array size: {e}"))?;
            tokens.push(Token::Number(n));
            rest = &rest[end..];
        } else if "*()[],^".contains(c) {
            tokens.push(Token::Punct(c));
            rest = &rest[1..];
        } else {
            return Err(format!("unexpected character `{c}`"));
        }
    }
    Ok(tokens)
}

fn anonymous_marker(s: &str) -> bool {
    s.starts_with("unnamed ") || s.starts_with("anonymous ")
}

/// Byte index of the `)` matching the `(` that starts `s`.
fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses `unnamed struct at a.h:3:5` (also `anonymous at ...`).
fn anonymous_tag(inner: &str) -> Result<(Option<TagKind>, AnonLocation), String> {
    let (words, location) = inner
        .split_once(" at ")
        .ok_or_else(|| format!("no location in `({inner})`"))?;
    let kind = words.split_whitespace().find_map(TagKind::from_keyword);
    let mut parts = location.rsplitn(3, ':');
    let (Some(col), Some(line), Some(file)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("bad location `{location}`"));
    };
    let number = |s: &str| s.parse().map_err(|e| format!("bad location `{location}`: {e}"));
    Ok((
        kind,
        AnonLocation {
            file: file.to_string(),
            line: number(line)?,
            col: number(col)?,
        },
    ))
}

/// One step from the base type outwards.
enum Derivation {
    Pointer(Qualifiers),
    Array(Option<u64>),
    Function(Option<Vec<Ty>>, bool),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, c: char) -> Result<(), String> {
        match self.next() {
            Some(Token::Punct(p)) if p == c => Ok(()),
            other => Err(format!("expected `{c}`, found {other:?}")),
        }
    }

    fn is_punct(&self, c: char) -> bool {
        self.peek() == Some(&Token::Punct(c))
    }

    /// `specifiers abstract-declarator`
    fn type_name(&mut self) -> Result<Ty, String> {
        let base = self.specifiers()?;
        let derivations = self.abstract_declarator()?;
        Ok(derivations.into_iter().fold(base, |ty, derivation| match derivation {
            Derivation::Pointer(quals) => Ty {
                kind: TyKind::Pointer(Box::new(ty)),
                quals,
            },
            Derivation::Array(size) => Ty {
                kind: TyKind::Array(Box::new(ty), size),
                quals: Qualifiers::default(),
            },
            Derivation::Function(params, variadic) => Ty {
                kind: TyKind::Function {
                    result: Box::new(ty),
                    params,
                    variadic,
                },
                quals: Qualifiers::default(),
            },
        }))
    }

    /// Qualifier words; returns false at the first token that is not one.
    fn qualifier(&mut self, quals: &mut Qualifiers) -> Result<bool, String> {
        let Some(Token::Word(word)) = self.peek() else {
            return Ok(false);
        };
        match word.as_str() {
            "const" => quals.is_const = true,
            "volatile" => quals.is_volatile = true,
            "restrict" | "__restrict" | "__restrict__" => quals.is_restrict = true,
            w if IGNORED_WORDS.contains(&w) => {}
            "__attribute__" => {
                self.pos += 1;
                self.skip_group()?;
                return Ok(true);
            }
            _ => return Ok(false),
        }
        self.pos += 1;
        Ok(true)
    }

    fn skip_group(&mut self) -> Result<(), String> {
        self.expect('(')?;
        let mut depth = 1;
        while depth > 0 {
            match self.next() {
                Some(Token::Punct('(')) => depth += 1,
                Some(Token::Punct(')')) => depth -= 1,
                Some(_) => {}
                None => return Err("unbalanced parentheses".into()),
            }
        }
        Ok(())
    }

    fn specifiers(&mut self) -> Result<Ty, String> {
        let mut quals = Qualifiers::default();
        let mut builtin: Vec<String> = vec![];
        let mut kind = None;
        loop {
            if self.qualifier(&mut quals)? {
                continue;
            }
            match self.peek().cloned() {
                Some(Token::Word(word)) => {
                    if let Some(tag) = TagKind::from_keyword(&word) {
                        self.pos += 1;
                        let name = match self.next() {
                            Some(Token::Word(name)) => TagName::Named(name),
                            Some(Token::Anonymous(_, loc)) => TagName::Anonymous(loc),
                            other => return Err(format!("expected tag name, found {other:?}")),
                        };
                        kind = Some(TyKind::Tag(tag, name));
                    } else if BUILTIN_WORDS.contains(&word.as_str()) {
                        self.pos += 1;
                        builtin.push(word);
                    } else if TYPE_OPERATORS.contains(&word.as_str()) {
                        return Err(format!("unsupported type operator `{word}`"));
                    } else if kind.is_none() && builtin.is_empty() {
                        self.pos += 1;
                        kind = Some(TyKind::Typedef(word));
                    } else {
                        return Err(format!("unexpected `{word}`"));
                    }
                }
                Some(Token::Anonymous(Some(tag), loc)) if kind.is_none() => {
                    self.pos += 1;
                    kind = Some(TyKind::Tag(tag, TagName::Anonymous(loc)));
                }
                _ => break,
            }
        }
        let kind = match (kind, builtin.is_empty()) {
            (Some(kind), true) => kind,
            (None, false) => TyKind::Builtin(builtin.join(" ")),
            (None, true) => return Err("missing type specifier".into()),
            (Some(_), false) => return Err("conflicting type specifiers".into()),
        };
        Ok(Ty { kind, quals })
    }

    /// Returns the derivations to apply to the base type, innermost first.
    fn abstract_declarator(&mut self) -> Result<Vec<Derivation>, String> {
        let mut derivations = vec![];
        while self.is_punct('*') || self.is_punct('^') {
            if self.is_punct('^') {
                return Err("blocks are not supported".into());
            }
            self.pos += 1;
            let mut quals = Qualifiers::default();
            while self.qualifier(&mut quals)? {}
            derivations.push(Derivation::Pointer(quals));
        }

        // `(` opens a nested declarator only when a declarator can follow; otherwise it is a
        // parameter list.
        let inner = if self.is_punct('(')
            && matches!(
                self.peek_at(1),
                Some(Token::Punct('*' | '^' | '(' | '['))
            ) {
            self.pos += 1;
            let inner = self.abstract_declarator()?;
            self.expect(')')?;
            inner
        } else {
            vec![]
        };

        let mut suffixes = vec![];
        loop {
            let mut quals = Qualifiers::default();
            if self.qualifier(&mut quals)? {
                continue;
            }
            if self.is_punct('[') {
                self.pos += 1;
                let size = match self.peek() {
                    Some(Token::Number(n)) => {
                        let n = *n;
                        self.pos += 1;
                        Some(n)
                    }
                    _ => None,
                };
                self.expect(']')?;
                suffixes.push(Derivation::Array(size));
            } else if self.is_punct('(') {
                self.pos += 1;
                let (params, variadic) = self.parameter_list()?;
                suffixes.push(Derivation::Function(params, variadic));
            } else {
                break;
            }
        }

        // `T *[2][3]`: the pointer applies first, then the last suffix, then the nested part.
        derivations.extend(suffixes.into_iter().rev());
        derivations.extend(inner);
        Ok(derivations)
    }

    /// Parses the parameters up to and including the closing `)`.
    fn parameter_list(&mut self) -> Result<(Option<Vec<Ty>>, bool), String> {
        if self.is_punct(')') {
            self.pos += 1;
            return Ok((None, false));
        }
        let mut params = vec![];
        let mut variadic = false;
        loop {
            if self.peek() == Some(&Token::Ellipsis) {
                self.pos += 1;
                variadic = true;
            } else {
                params.push(self.type_name()?);
            }
            match self.next() {
                Some(Token::Punct(',')) => {}
                Some(Token::Punct(')')) => break,
                other => return Err(format!("expected `,` or `)`, found {other:?}")),
            }
        }
        let only_void = matches!(
            params.as_slice(),
            [Ty { kind: TyKind::Builtin(word), quals }]
                if word == "void" && *quals == Qualifiers::default()
        );
        if only_void && !variadic {
            params.clear();
        }
        Ok((Some(params), variadic))
    }
}
