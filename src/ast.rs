use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// A parsed expression: the node tree plus everything the renderer needs
/// to know about it as a whole.
#[derive(Debug, Clone, Serialize)]
pub struct Expression {
    pub root: Node,
    pub flags: Flags,
    pub groups: GroupTable,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Sequence {
        items: Vec<Node>,
    },
    Alternation {
        branches: Vec<Node>,
    },
    Group(Group),
    CharacterClass(CharacterClass),
    Literal {
        literal: Literal,
    },
    Repetition(Repetition),
    Anchor {
        anchor: AnchorKind,
    },
    Backreference {
        target: BackrefTarget,
    },
    Lookaround(Lookaround),
}

#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub capturing: bool,
    pub name: Option<String>,
    /// Set for capturing groups only, numbered from 1 in source order.
    pub index: Option<usize>,
    pub body: Box<Node>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CharacterClass {
    pub negated: bool,
    pub items: Vec<ClassItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ClassItem {
    Char(char),
    Range(char, char),
    Escape(ClassEscape),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassEscape {
    Digit,
    NonDigit,
    Word,
    NonWord,
    Whitespace,
    NonWhitespace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Char(char),
    Any,
    Class(ClassEscape),
    Escaped(EscapedChar),
}

/// A character written with an escape; `form` remembers how so labels can
/// describe it the way it was typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EscapedChar {
    pub value: char,
    pub form: EscapeForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapeForm {
    LineFeed,
    CarriageReturn,
    Tab,
    VerticalTab,
    FormFeed,
    Backspace,
    Null,
    Control(char),
    Hex,
    Unicode,
    Octal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Repetition {
    pub body: Box<Node>,
    pub min: u32,
    /// `None` means unbounded.
    pub max: Option<u32>,
    pub greedy: bool,
}

/// The visual shape a repetition takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatShape {
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
    /// `{n}`
    Exact(u32),
    /// `{m,n}` with m < n, other than `?`
    Bounded(u32, u32),
    /// `{m,}` with m >= 2
    AtLeast(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorKind {
    Start,
    End,
    WordBoundary,
    NonWordBoundary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BackrefTarget {
    Index(usize),
    Name(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Lookaround {
    pub direction: Direction,
    pub polarity: Polarity,
    pub body: Box<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ahead,
    Behind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
}

/// Flags from the `/body/flags` form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Flags {
    pub has_indices: bool,
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
    pub dot_all: bool,
    pub unicode: bool,
    pub unicode_sets: bool,
    pub sticky: bool,
}

/// Capturing groups of one expression, in source order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupTable {
    pub count: usize,
    pub names: Vec<(String, usize)>,
}

impl Node {
    pub fn empty() -> Self {
        Node::Sequence { items: Vec::new() }
    }

    pub fn literal(c: char) -> Self {
        Node::Literal {
            literal: Literal::Char(c),
        }
    }

    /// Number of nodes in this subtree, used as the progress total.
    pub fn count(&self) -> usize {
        1 + match self {
            Node::Sequence { items } => items.iter().map(Node::count).sum(),
            Node::Alternation { branches } => branches.iter().map(Node::count).sum(),
            Node::Group(group) => group.body.count(),
            Node::Repetition(repeat) => repeat.body.count(),
            Node::Lookaround(look) => look.body.count(),
            Node::CharacterClass(_)
            | Node::Literal { .. }
            | Node::Anchor { .. }
            | Node::Backreference { .. } => 0,
        }
    }
}

impl Repetition {
    pub fn shape(&self) -> RepeatShape {
        match (self.min, self.max) {
            (0, Some(1)) => RepeatShape::Optional,
            (0, None) => RepeatShape::ZeroOrMore,
            (1, None) => RepeatShape::OneOrMore,
            (min, None) => RepeatShape::AtLeast(min),
            (min, Some(max)) if min == max => RepeatShape::Exact(min),
            (min, Some(max)) => RepeatShape::Bounded(min, max),
        }
    }
}

impl CharacterClass {
    /// Code-point ranges in source order. Class escapes expand to the
    /// ranges they stand for.
    pub fn ranges(&self) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        for item in &self.items {
            match *item {
                ClassItem::Char(c) => out.push((c as u32, c as u32)),
                ClassItem::Range(lo, hi) => out.push((lo as u32, hi as u32)),
                ClassItem::Escape(escape) => out.extend(escape.ranges()),
            }
        }
        out
    }
}

const DIGIT: &[(u32, u32)] = &[(0x30, 0x39)];
const WORD: &[(u32, u32)] = &[(0x30, 0x39), (0x41, 0x5A), (0x5F, 0x5F), (0x61, 0x7A)];
const SPACE: &[(u32, u32)] = &[
    (0x09, 0x0D),
    (0x20, 0x20),
    (0xA0, 0xA0),
    (0x1680, 0x1680),
    (0x2000, 0x200A),
    (0x2028, 0x2029),
    (0x202F, 0x202F),
    (0x205F, 0x205F),
    (0x3000, 0x3000),
    (0xFEFF, 0xFEFF),
];

impl ClassEscape {
    pub fn ranges(self) -> Vec<(u32, u32)> {
        match self {
            Self::Digit => DIGIT.to_vec(),
            Self::Word => WORD.to_vec(),
            Self::Whitespace => SPACE.to_vec(),
            Self::NonDigit => complement(DIGIT),
            Self::NonWord => complement(WORD),
            Self::NonWhitespace => complement(SPACE),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Digit => "digit",
            Self::NonDigit => "non-digit",
            Self::Word => "word",
            Self::NonWord => "non-word",
            Self::Whitespace => "white space",
            Self::NonWhitespace => "non-white space",
        }
    }

    pub fn source(self) -> &'static str {
        match self {
            Self::Digit => "\\d",
            Self::NonDigit => "\\D",
            Self::Word => "\\w",
            Self::NonWord => "\\W",
            Self::Whitespace => "\\s",
            Self::NonWhitespace => "\\S",
        }
    }
}

fn complement(sorted: &[(u32, u32)]) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    let mut next = 0u32;
    for &(lo, hi) in sorted {
        if lo > next {
            out.push((next, lo - 1));
        }
        next = hi + 1;
    }
    out.push((next, 0x10FFFF));
    out
}

impl EscapedChar {
    pub fn label(&self) -> String {
        let code = self.value as u32;
        match self.form {
            EscapeForm::LineFeed => "line feed (0x0A)".to_string(),
            EscapeForm::CarriageReturn => "carriage return (0x0D)".to_string(),
            EscapeForm::Tab => "tab (0x09)".to_string(),
            EscapeForm::VerticalTab => "vertical tab (0x0B)".to_string(),
            EscapeForm::FormFeed => "form feed (0x0C)".to_string(),
            EscapeForm::Backspace => "backspace (0x08)".to_string(),
            EscapeForm::Null => "null (0x00)".to_string(),
            EscapeForm::Control(letter) => format!("ctrl-{}", letter.to_ascii_uppercase()),
            EscapeForm::Hex => format!("0x{code:02X}"),
            EscapeForm::Unicode => format!("U+{code:04X}"),
            EscapeForm::Octal => format!("octal: {code:o}"),
        }
    }
}

impl Literal {
    pub fn label(&self) -> String {
        match self {
            Literal::Char(c) => format!("\"{c}\""),
            Literal::Any => "any character".to_string(),
            Literal::Class(escape) => escape.label().to_string(),
            Literal::Escaped(escaped) => escaped.label(),
        }
    }
}

impl AnchorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "Start of line",
            Self::End => "End of line",
            Self::WordBoundary => "word boundary",
            Self::NonWordBoundary => "non-word boundary",
        }
    }
}

impl fmt::Display for BackrefTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Name(name) => write!(f, "\"{name}\""),
        }
    }
}

impl Flags {
    pub fn is_empty(&self) -> bool {
        *self == Flags::default()
    }

    /// Human-readable names of the set flags, in the order JavaScript
    /// prints them.
    pub fn names(&self) -> Vec<&'static str> {
        let table = [
            (self.has_indices, "indices"),
            (self.global, "global"),
            (self.ignore_case, "ignore case"),
            (self.multiline, "multiline"),
            (self.dot_all, "dot all"),
            (self.unicode, "unicode"),
            (self.unicode_sets, "unicode sets"),
            (self.sticky, "sticky"),
        ];
        table
            .into_iter()
            .filter_map(|(set, name)| set.then_some(name))
            .collect()
    }
}

impl GroupTable {
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, index)| *index)
    }

    pub fn resolves(&self, target: &BackrefTarget) -> bool {
        match target {
            BackrefTarget::Index(index) => (1..=self.count).contains(index),
            BackrefTarget::Name(name) => self.index_of(name).is_some(),
        }
    }
}

impl Expression {
    /// Backreferences that do not name an existing group, in source order.
    pub fn unresolved_references(&self) -> Vec<BackrefTarget> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        collect_backrefs(&self.root, &mut |target| {
            if !self.groups.resolves(target) && seen.insert(target.to_string()) {
                out.push(target.clone());
            }
        });
        out
    }
}

fn collect_backrefs(node: &Node, visit: &mut impl FnMut(&BackrefTarget)) {
    match node {
        Node::Backreference { target } => visit(target),
        Node::Sequence { items } => items.iter().for_each(|n| collect_backrefs(n, visit)),
        Node::Alternation { branches } => branches.iter().for_each(|n| collect_backrefs(n, visit)),
        Node::Group(group) => collect_backrefs(&group.body, visit),
        Node::Repetition(repeat) => collect_backrefs(&repeat.body, visit),
        Node::Lookaround(look) => collect_backrefs(&look.body, visit),
        Node::CharacterClass(_) | Node::Literal { .. } | Node::Anchor { .. } => {}
    }
}
