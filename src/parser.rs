use std::ops::Range;

use tracing::debug;

use crate::ast::{
    AnchorKind, BackrefTarget, CharacterClass, ClassEscape, ClassItem, Direction, EscapeForm,
    EscapedChar, Expression, Flags, Group, GroupTable, Literal, Lookaround, Node, Polarity,
    Repetition,
};
use crate::error::SyntaxError;

/// Parse a pattern, either bare (`a|b`) or delimited with flags (`/a|b/gi`).
///
/// Example:
/// - Pattern: `a|b`     → Alternation([Literal('a'), Literal('b')])
/// - Pattern: `/a+/g`   → Repetition(Literal('a')) with the global flag
pub fn parse(source: &str) -> Result<Expression, SyntaxError> {
    let (body, base, flags) = split_flags(source)?;
    debug!(len = source.len(), "parsing expression");
    let mut parser = Parser::with_base(body, base);
    let root = parser.parse()?;
    let groups = parser.into_groups();
    debug!(groups = groups.count, "parsed expression");
    Ok(Expression {
        root,
        flags,
        groups,
    })
}

/// Split `/body/flags` into its parts. Anything else, including a slashed
/// source whose tail is not made of flag letters (`/usr/bin`), is a bare body.
fn split_flags(source: &str) -> Result<(&str, usize, Flags), SyntaxError> {
    let bare = || Ok((source, 0, Flags::default()));
    let Some(rest) = source.strip_prefix('/') else {
        return bare();
    };
    let Some(close) = rest.rfind('/') else {
        return bare();
    };
    let body = &rest[..close];
    let tail = &rest[close + 1..];
    let mut flags = Flags::default();
    let flag_base = 2 + body.chars().count();
    for (i, c) in tail.chars().enumerate() {
        let slot = match c {
            'd' => &mut flags.has_indices,
            'g' => &mut flags.global,
            'i' => &mut flags.ignore_case,
            'm' => &mut flags.multiline,
            's' => &mut flags.dot_all,
            'u' => &mut flags.unicode,
            'v' => &mut flags.unicode_sets,
            'y' => &mut flags.sticky,
            _ => return bare(),
        };
        if *slot {
            return Err(SyntaxError::new(format!("repeated flag '{c}'"), flag_base + i));
        }
        *slot = true;
    }
    Ok((body, 1, flags))
}

/// A lexical unit of the pattern outside character classes. `span` is a
/// byte range into the parser's pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Literal(Literal),
    ClassOpen { negated: bool },
    Anchor(AnchorKind),
    GroupOpen(GroupKind),
    GroupClose,
    Quantifier {
        min: u32,
        max: Option<u32>,
        greedy: bool,
    },
    Bar,
    Backref(BackrefTarget),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKind {
    Capture(Option<String>),
    NonCapture,
    Look(Direction, Polarity),
}

/// Parser for regular expressions.
///
/// The `Parser` struct holds the pattern and the current position.
/// It also manages group IDs for capturing groups.
pub struct Parser<'a> {
    pub pattern: &'a str,
    pub pos: usize,
    base: usize,
    next_group_id: usize,
    names: Vec<(String, usize)>,
    /// Names that a new group would clash with: those declared earlier on
    /// the current path. Sibling alternatives do not see each other's names.
    in_scope: Vec<String>,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given pattern.
    pub fn new(pattern: &'a str) -> Self {
        Self::with_base(pattern, 0)
    }

    /// Like `new`, but error offsets are shifted by `base` characters.
    fn with_base(pattern: &'a str, base: usize) -> Self {
        Self {
            pattern,
            pos: 0,
            base,
            next_group_id: 1,
            names: Vec::new(),
            in_scope: Vec::new(),
        }
    }

    fn into_groups(self) -> GroupTable {
        GroupTable {
            count: self.next_group_id - 1,
            names: self.names,
        }
    }

    /// Allocate a new group ID for capturing groups.
    fn alloc_group_id(&mut self) -> usize {
        let id = self.next_group_id;
        self.next_group_id += 1;
        id
    }

    /// Peek at the next character in the pattern without advancing.
    fn peek(&self) -> Option<char> {
        self.pattern[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.pattern[self.pos..].chars().nth(n)
    }

    /// Advance the parser by one character and return it.
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Advance past `expected` if it is next.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Character offset of a byte position, counted from the full source.
    fn offset_at(&self, byte: usize) -> usize {
        self.base + self.pattern[..byte].chars().count()
    }

    fn error_at(&self, message: impl Into<String>, byte: usize) -> SyntaxError {
        SyntaxError::new(message, self.offset_at(byte))
    }

    /// Entry point for parsing a regex pattern.
    pub fn parse(&mut self) -> Result<Node, SyntaxError> {
        let node = self.parse_alt()?;
        if let Some(token) = self.next_token()? {
            // parse_alt only stops early on a closing paren
            return Err(self.error_at("unmatched ')'", token.span.start));
        }
        Ok(node)
    }

    /// Scan the next token, advancing past it.
    pub fn next_token(&mut self) -> Result<Option<Token>, SyntaxError> {
        let start = self.pos;
        let Some(ch) = self.advance() else {
            return Ok(None);
        };
        let kind = match ch {
            '|' => TokenKind::Bar,
            ')' => TokenKind::GroupClose,
            '(' => TokenKind::GroupOpen(self.scan_group_open(start)?),
            '[' => TokenKind::ClassOpen {
                negated: self.eat('^'),
            },
            '^' => TokenKind::Anchor(AnchorKind::Start),
            '$' => TokenKind::Anchor(AnchorKind::End),
            '.' => TokenKind::Literal(Literal::Any),
            '*' => self.scan_lazy(0, None),
            '+' => self.scan_lazy(1, None),
            '?' => self.scan_lazy(0, Some(1)),
            '{' => match self.scan_braces(start)? {
                Some((min, max)) => self.scan_lazy(min, max),
                None => TokenKind::Literal(Literal::Char('{')),
            },
            '\\' => self.scan_escape(start)?,
            c => TokenKind::Literal(Literal::Char(c)),
        };
        Ok(Some(Token {
            kind,
            span: start..self.pos,
        }))
    }

    /// Scan the next token without consuming it.
    fn peek_token(&mut self) -> Result<Option<Token>, SyntaxError> {
        let saved = self.pos;
        let token = self.next_token();
        self.pos = saved;
        token
    }

    fn scan_lazy(&mut self, min: u32, max: Option<u32>) -> TokenKind {
        let greedy = !self.eat('?');
        TokenKind::Quantifier { min, max, greedy }
    }

    /// Scan `{m}`, `{m,}` or `{m,n}` after the opening brace. Returns `None`
    /// (and rewinds) when the brace does not start a quantifier, in which
    /// case it is a literal.
    fn scan_braces(&mut self, start: usize) -> Result<Option<(u32, Option<u32>)>, SyntaxError> {
        let saved = self.pos;
        let Some(min) = self.scan_number() else {
            return Ok(None);
        };
        let bounds = if self.eat('}') {
            Some((min, Some(min)))
        } else if self.eat(',') {
            if self.eat('}') {
                Some((min, None))
            } else {
                match self.scan_number() {
                    Some(max) if self.eat('}') => Some((min, Some(max))),
                    _ => None,
                }
            }
        } else {
            None
        };
        match bounds {
            Some((min, Some(max))) if max < min => Err(self.error_at(
                "numbers out of order in {} quantifier",
                start,
            )),
            Some(bounds) => Ok(Some(bounds)),
            None => {
                self.pos = saved;
                Ok(None)
            }
        }
    }

    /// Decimal count; values past `u32::MAX` saturate.
    fn scan_number(&mut self) -> Option<u32> {
        let from = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if from == self.pos {
            return None;
        }
        Some(self.pattern[from..self.pos].parse::<u32>().unwrap_or(u32::MAX))
    }

    fn scan_group_open(&mut self, start: usize) -> Result<GroupKind, SyntaxError> {
        if !self.eat('?') {
            return Ok(GroupKind::Capture(None));
        }
        match self.advance() {
            Some(':') => Ok(GroupKind::NonCapture),
            Some('=') => Ok(GroupKind::Look(Direction::Ahead, Polarity::Positive)),
            Some('!') => Ok(GroupKind::Look(Direction::Ahead, Polarity::Negative)),
            Some('<') if self.eat('=') => Ok(GroupKind::Look(Direction::Behind, Polarity::Positive)),
            Some('<') if self.eat('!') => Ok(GroupKind::Look(Direction::Behind, Polarity::Negative)),
            Some('<') => Ok(GroupKind::Capture(Some(self.scan_group_name(start)?))),
            _ => Err(self.error_at("invalid group", start)),
        }
    }

    /// Scan a group name up to and including the closing `>`.
    fn scan_group_name(&mut self, start: usize) -> Result<String, SyntaxError> {
        let from = self.pos;
        while let Some(c) = self.peek() {
            let valid = if self.pos == from {
                c.is_alphabetic() || c == '_' || c == '$'
            } else {
                c.is_alphanumeric() || c == '_' || c == '$'
            };
            if !valid {
                break;
            }
            self.advance();
        }
        let name = &self.pattern[from..self.pos];
        if name.is_empty() || !self.eat('>') {
            return Err(self.error_at("invalid capture group name", start));
        }
        Ok(name.to_string())
    }

    /// Scan an escape outside a character class, the backslash already consumed.
    fn scan_escape(&mut self, start: usize) -> Result<TokenKind, SyntaxError> {
        let Some(c) = self.advance() else {
            return Err(self.error_at("\\ at end of pattern", start));
        };
        let kind = match c {
            'b' => TokenKind::Anchor(AnchorKind::WordBoundary),
            'B' => TokenKind::Anchor(AnchorKind::NonWordBoundary),
            '1'..='9' => {
                let from = self.pos - 1;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
                // Too large to ever resolve; saturate and let render warn.
                let index = self.pattern[from..self.pos]
                    .parse::<usize>()
                    .unwrap_or(usize::MAX);
                TokenKind::Backref(BackrefTarget::Index(index))
            }
            'k' if self.eat('<') => {
                let name = self.scan_group_name(start)?;
                TokenKind::Backref(BackrefTarget::Name(name))
            }
            c => TokenKind::Literal(self.char_escape(c)),
        };
        Ok(kind)
    }

    /// Escapes shared by the top level and character classes.
    fn char_escape(&mut self, c: char) -> Literal {
        let escaped = |value, form| Literal::Escaped(EscapedChar { value, form });
        match c {
            'd' => Literal::Class(ClassEscape::Digit),
            'D' => Literal::Class(ClassEscape::NonDigit),
            'w' => Literal::Class(ClassEscape::Word),
            'W' => Literal::Class(ClassEscape::NonWord),
            's' => Literal::Class(ClassEscape::Whitespace),
            'S' => Literal::Class(ClassEscape::NonWhitespace),
            'n' => escaped('\n', EscapeForm::LineFeed),
            'r' => escaped('\r', EscapeForm::CarriageReturn),
            't' => escaped('\t', EscapeForm::Tab),
            'v' => escaped('\u{0B}', EscapeForm::VerticalTab),
            'f' => escaped('\u{0C}', EscapeForm::FormFeed),
            '0' => {
                let from = self.pos;
                let value = self.scan_octal(0);
                if self.pos == from {
                    escaped('\0', EscapeForm::Null)
                } else {
                    escaped(value, EscapeForm::Octal)
                }
            }
            'c' => match self.peek() {
                Some(letter) if letter.is_ascii_alphabetic() => {
                    self.advance();
                    let value = char::from(letter as u8 % 32);
                    escaped(value, EscapeForm::Control(letter))
                }
                // `\c` without a letter is a literal backslash; `c` is read next.
                _ => {
                    self.pos -= 1;
                    Literal::Char('\\')
                }
            },
            'x' => match self.scan_hex(2) {
                Some(value) => escaped(value, EscapeForm::Hex),
                None => Literal::Char('x'),
            },
            'u' => match self.scan_unicode() {
                Some(value) => escaped(value, EscapeForm::Unicode),
                None => Literal::Char('u'),
            },
            other => Literal::Char(other),
        }
    }

    /// Legacy octal escape continuing from `first`: at most three digits in
    /// total, stopping before the value would pass `\377`.
    fn scan_octal(&mut self, first: u32) -> char {
        let mut value = first;
        let mut digits = 1;
        while digits < 3 {
            let Some(digit) = self.peek().and_then(|c| c.to_digit(8)) else {
                break;
            };
            if value * 8 + digit > 0o377 {
                break;
            }
            self.advance();
            value = value * 8 + digit;
            digits += 1;
        }
        char::from_u32(value).unwrap_or('\0')
    }

    /// Read exactly `digits` hex digits, rewinding if they are not there.
    fn scan_hex(&mut self, digits: usize) -> Option<char> {
        let from = self.pos;
        for _ in 0..digits {
            if !self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.pos = from;
                return None;
            }
            self.advance();
        }
        u32::from_str_radix(&self.pattern[from..self.pos], 16)
            .ok()
            .and_then(char::from_u32)
    }

    /// `\uXXXX` or `\u{X...}`.
    fn scan_unicode(&mut self) -> Option<char> {
        if self.peek() != Some('{') {
            return self.scan_hex(4);
        }
        let saved = self.pos;
        self.advance();
        let from = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.advance();
        }
        let value = u32::from_str_radix(&self.pattern[from..self.pos], 16)
            .ok()
            .and_then(char::from_u32);
        match value {
            Some(value) if self.eat('}') => Some(value),
            _ => {
                self.pos = saved;
                None
            }
        }
    }

    /// Parse alternation (`|`) in the pattern.
    ///
    /// Example:
    /// - Pattern: `a|b|c` → Alternation([Literal('a'), Literal('b'), Literal('c')])
    /// - Pattern: `abc`   → Sequence([Literal('a'), Literal('b'), Literal('c')])
    fn parse_alt(&mut self) -> Result<Node, SyntaxError> {
        let mark = self.in_scope.len();
        let mut declared = Vec::new();
        let mut branches = vec![self.parse_seq()?];
        declared.extend(self.in_scope.drain(mark..));
        while matches!(self.peek_token()?, Some(Token { kind: TokenKind::Bar, .. })) {
            self.next_token()?;
            branches.push(self.parse_seq()?);
            declared.extend(self.in_scope.drain(mark..));
        }
        // Whatever follows the alternation may meet a name from any branch.
        for name in declared {
            if !self.in_scope.contains(&name) {
                self.in_scope.push(name);
            }
        }
        if branches.len() == 1 {
            if let Some(only) = branches.pop() {
                return Ok(only);
            }
        }
        Ok(Node::Alternation { branches })
    }

    /// Parse a sequence of regex atoms (concatenation). A single atom is
    /// returned as-is; no atoms yield an empty sequence.
    fn parse_seq(&mut self) -> Result<Node, SyntaxError> {
        let mut items = Vec::new();
        while let Some(token) = self.peek_token()? {
            if matches!(token.kind, TokenKind::Bar | TokenKind::GroupClose) {
                break;
            }
            items.push(self.parse_repeat()?);
        }
        if items.len() == 1 {
            if let Some(only) = items.pop() {
                return Ok(only);
            }
        }
        Ok(Node::Sequence { items })
    }

    /// Parse an atom followed by an optional quantifier.
    ///
    /// Example:
    /// - Pattern: `a?`     → Repetition { min: 0, max: Some(1) }
    /// - Pattern: `b{2,5}` → Repetition { min: 2, max: Some(5) }
    /// - Pattern: `c`      → Literal('c')
    fn parse_repeat(&mut self) -> Result<Node, SyntaxError> {
        let atom = self.parse_atom()?;
        let Some(Token {
            kind: TokenKind::Quantifier { min, max, greedy },
            span,
        }) = self.peek_token()?
        else {
            return Ok(atom);
        };
        let repeatable = match &atom {
            Node::Anchor { .. } => false,
            Node::Lookaround(look) => look.direction == Direction::Ahead,
            _ => true,
        };
        if !repeatable {
            return Err(self.error_at("nothing to repeat", span.start));
        }
        self.next_token()?;
        if let Some(Token {
            kind: TokenKind::Quantifier { .. },
            span,
        }) = self.peek_token()?
        {
            return Err(self.error_at("nothing to repeat", span.start));
        }
        Ok(Node::Repetition(Repetition {
            body: Box::new(atom),
            min,
            max,
            greedy,
        }))
    }

    /// Parse a single regex atom: group, char class, escape, literal, or anchor.
    ///
    /// Examples:
    /// - Pattern: `(abc)`  → Group { index: 1, body: Sequence(...) }
    /// - Pattern: `[a-z]`  → CharacterClass { items: [Range('a','z')] }
    /// - Pattern: `\d`     → Literal(Class(Digit))
    /// - Pattern: `\1`     → Backreference(Index(1))
    /// - Pattern: `(?=a)`  → Lookaround { Ahead, Positive }
    fn parse_atom(&mut self) -> Result<Node, SyntaxError> {
        let Some(token) = self.next_token()? else {
            return Ok(Node::empty());
        };
        match token.kind {
            TokenKind::Literal(literal) => Ok(Node::Literal { literal }),
            TokenKind::Anchor(anchor) => Ok(Node::Anchor { anchor }),
            TokenKind::Backref(target) => Ok(Node::Backreference { target }),
            TokenKind::ClassOpen { negated } => self.parse_char_class(negated, token.span.start),
            TokenKind::GroupOpen(kind) => self.parse_group(kind, token.span.start),
            TokenKind::Quantifier { .. } => {
                Err(self.error_at("nothing to repeat", token.span.start))
            }
            TokenKind::GroupClose => Err(self.error_at("unmatched ')'", token.span.start)),
            TokenKind::Bar => Err(self.error_at("unexpected '|'", token.span.start)),
        }
    }

    fn parse_group(&mut self, kind: GroupKind, start: usize) -> Result<Node, SyntaxError> {
        // Index is taken before the body so nested groups number after this one.
        let capture = match &kind {
            GroupKind::Capture(name) => {
                let index = self.alloc_group_id();
                if let Some(name) = name {
                    if self.in_scope.contains(name) {
                        return Err(self.error_at(format!("duplicate group name '{name}'"), start));
                    }
                    self.in_scope.push(name.clone());
                    self.names.push((name.clone(), index));
                }
                Some(index)
            }
            _ => None,
        };
        let body = Box::new(self.parse_alt()?);
        match self.next_token()? {
            Some(Token {
                kind: TokenKind::GroupClose,
                ..
            }) => {}
            _ => return Err(self.error_at("unterminated group", start)),
        }
        let node = match kind {
            GroupKind::Capture(name) => Node::Group(Group {
                capturing: true,
                name,
                index: capture,
                body,
            }),
            GroupKind::NonCapture => Node::Group(Group {
                capturing: false,
                name: None,
                index: None,
                body,
            }),
            GroupKind::Look(direction, polarity) => Node::Lookaround(Lookaround {
                direction,
                polarity,
                body,
            }),
        };
        Ok(node)
    }

    /// Parse a character class body, the `[` or `[^` already consumed.
    ///
    /// Examples:
    /// - Pattern: `[abc]`   → CharacterClass { items: [a, b, c], negated: false }
    /// - Pattern: `[^a-z]`  → CharacterClass { items: [Range(a, z)], negated: true }
    fn parse_char_class(&mut self, negated: bool, start: usize) -> Result<Node, SyntaxError> {
        let mut items = Vec::new();
        loop {
            let item_start = self.pos;
            let Some(ch) = self.advance() else {
                return Err(self.error_at("unterminated character class", start));
            };
            if ch == ']' {
                break;
            }
            let item = self.class_item(ch, start)?;
            let is_range = self.peek() == Some('-')
                && self.peek_nth(1).is_some_and(|next| next != ']');
            if !is_range {
                items.push(item);
                continue;
            }
            self.advance();
            let Some(next) = self.advance() else {
                return Err(self.error_at("unterminated character class", start));
            };
            let upper = self.class_item(next, start)?;
            match (item, upper) {
                (ClassItem::Char(lo), ClassItem::Char(hi)) => {
                    if hi < lo {
                        return Err(
                            self.error_at("range out of order in character class", item_start)
                        );
                    }
                    items.push(ClassItem::Range(lo, hi));
                }
                // A class escape on either side makes the dash literal.
                (lower, upper) => {
                    items.push(lower);
                    items.push(ClassItem::Char('-'));
                    items.push(upper);
                }
            }
        }
        Ok(Node::CharacterClass(CharacterClass { negated, items }))
    }

    fn class_item(&mut self, ch: char, start: usize) -> Result<ClassItem, SyntaxError> {
        if ch != '\\' {
            return Ok(ClassItem::Char(ch));
        }
        let Some(c) = self.advance() else {
            return Err(self.error_at("unterminated character class", start));
        };
        let item = match c {
            'b' => ClassItem::Char('\u{08}'),
            // Backreferences mean nothing inside a class; `\1`..`\7` are octal.
            '1'..='7' => ClassItem::Char(self.scan_octal(c.to_digit(8).unwrap_or(0))),
            c => match self.char_escape(c) {
                Literal::Char(value) => ClassItem::Char(value),
                Literal::Escaped(escaped) => ClassItem::Char(escaped.value),
                Literal::Class(escape) => ClassItem::Escape(escape),
                Literal::Any => ClassItem::Char('.'),
            },
        };
        Ok(item)
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
