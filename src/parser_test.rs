use super::*;
use crate::ast::RepeatShape;

fn root(source: &str) -> Node {
    parse(source).unwrap().root
}

fn literal_char(node: &Node) -> Option<char> {
    match node {
        Node::Literal {
            literal: Literal::Char(c),
        } => Some(*c),
        _ => None,
    }
}

/// Capturing group indices in pre-order, i.e. in order of their opening paren.
fn group_indices(node: &Node, out: &mut Vec<usize>) {
    match node {
        Node::Group(group) => {
            if let Some(index) = group.index {
                out.push(index);
            }
            group_indices(&group.body, out);
        }
        Node::Sequence { items } => items.iter().for_each(|n| group_indices(n, out)),
        Node::Alternation { branches } => branches.iter().for_each(|n| group_indices(n, out)),
        Node::Repetition(repeat) => group_indices(&repeat.body, out),
        Node::Lookaround(look) => group_indices(&look.body, out),
        _ => {}
    }
}

// =============================================================================
// STRUCTURE
// =============================================================================

#[test]
fn alternation_of_two_literals() {
    let Node::Alternation { branches } = root("a|b") else {
        panic!("expected alternation");
    };
    assert_eq!(branches.len(), 2);
    assert_eq!(literal_char(&branches[0]), Some('a'));
    assert_eq!(literal_char(&branches[1]), Some('b'));
}

#[test]
fn concatenation_builds_sequence() {
    let Node::Sequence { items } = root("abc") else {
        panic!("expected sequence");
    };
    let chars: Vec<_> = items.iter().filter_map(literal_char).collect();
    assert_eq!(chars, vec!['a', 'b', 'c']);
}

#[test]
fn alternation_is_lowest_precedence() {
    let Node::Alternation { branches } = root("ab|cd|e") else {
        panic!("expected alternation");
    };
    assert_eq!(branches.len(), 3);
    assert!(matches!(&branches[0], Node::Sequence { items } if items.len() == 2));
    assert_eq!(literal_char(&branches[2]), Some('e'));
}

#[test]
fn empty_pattern_is_empty_sequence() {
    assert!(matches!(root(""), Node::Sequence { items } if items.is_empty()));
}

#[test]
fn empty_alternative_is_allowed() {
    let Node::Alternation { branches } = root("a|") else {
        panic!("expected alternation");
    };
    assert!(matches!(&branches[1], Node::Sequence { items } if items.is_empty()));
}

#[test]
fn group_then_backreference() {
    let expr = parse("(a)\\1").unwrap();
    let Node::Sequence { items } = &expr.root else {
        panic!("expected sequence");
    };
    let Node::Group(group) = &items[0] else {
        panic!("expected group");
    };
    assert!(group.capturing);
    assert_eq!(group.index, Some(1));
    assert_eq!(literal_char(&group.body), Some('a'));
    assert!(matches!(
        &items[1],
        Node::Backreference { target: BackrefTarget::Index(1) }
    ));
    assert_eq!(expr.groups.count, 1);
    assert!(expr.unresolved_references().is_empty());
}

#[test]
fn lone_backreference_is_unresolved_but_parses() {
    let expr = parse("\\2").unwrap();
    assert!(matches!(
        expr.root,
        Node::Backreference { target: BackrefTarget::Index(2) }
    ));
    assert_eq!(expr.unresolved_references(), vec![BackrefTarget::Index(2)]);
}

#[test]
fn group_indices_follow_source_order() {
    let expr = parse("((a)(?:b)(?<n>c))|(d(e))").unwrap();
    let mut seen = Vec::new();
    group_indices(&expr.root, &mut seen);
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    assert_eq!(expr.groups.count, 5);
    assert_eq!(expr.groups.index_of("n"), Some(3));
}

#[test]
fn named_group_and_named_backreference() {
    let expr = parse("(?<word>\\w+)\\k<word>").unwrap();
    let Node::Sequence { items } = &expr.root else {
        panic!("expected sequence");
    };
    let Node::Group(group) = &items[0] else {
        panic!("expected group");
    };
    assert_eq!(group.name.as_deref(), Some("word"));
    assert!(matches!(
        &items[1],
        Node::Backreference { target: BackrefTarget::Name(name) } if name == "word"
    ));
    assert!(expr.unresolved_references().is_empty());
}

#[test]
fn non_capturing_group_has_no_index() {
    let Node::Group(group) = root("(?:ab)") else {
        panic!("expected group");
    };
    assert!(!group.capturing);
    assert_eq!(group.index, None);
}

#[test]
fn lookarounds() {
    let cases = [
        ("(?=a)", Direction::Ahead, Polarity::Positive),
        ("(?!a)", Direction::Ahead, Polarity::Negative),
        ("(?<=a)", Direction::Behind, Polarity::Positive),
        ("(?<!a)", Direction::Behind, Polarity::Negative),
    ];
    for (source, direction, polarity) in cases {
        let Node::Lookaround(look) = root(source) else {
            panic!("expected lookaround for {source}");
        };
        assert_eq!(look.direction, direction, "{source}");
        assert_eq!(look.polarity, polarity, "{source}");
        assert_eq!(literal_char(&look.body), Some('a'));
    }
}

// =============================================================================
// QUANTIFIERS
// =============================================================================

#[test]
fn bounded_repetition() {
    let Node::Repetition(repeat) = root("a{2,5}") else {
        panic!("expected repetition");
    };
    assert_eq!((repeat.min, repeat.max), (2, Some(5)));
    assert!(repeat.greedy);
    assert_eq!(literal_char(&repeat.body), Some('a'));
    assert_eq!(repeat.shape(), RepeatShape::Bounded(2, 5));
}

#[test]
fn quantifier_shapes() {
    let cases = [
        ("a*", RepeatShape::ZeroOrMore),
        ("a+", RepeatShape::OneOrMore),
        ("a?", RepeatShape::Optional),
        ("a{3}", RepeatShape::Exact(3)),
        ("a{2,}", RepeatShape::AtLeast(2)),
        ("a{0,1}", RepeatShape::Optional),
        ("a{0,}", RepeatShape::ZeroOrMore),
    ];
    for (source, shape) in cases {
        let Node::Repetition(repeat) = root(source) else {
            panic!("expected repetition for {source}");
        };
        assert_eq!(repeat.shape(), shape, "{source}");
    }
}

#[test]
fn oversized_counts_saturate() {
    let Node::Repetition(repeat) = root("a{99999999999}") else {
        panic!("expected repetition");
    };
    assert_eq!((repeat.min, repeat.max), (u32::MAX, Some(u32::MAX)));

    let Node::Repetition(repeat) = root("a{2,99999999999}") else {
        panic!("expected repetition");
    };
    assert_eq!((repeat.min, repeat.max), (2, Some(u32::MAX)));
}

#[test]
fn lazy_modifier() {
    let Node::Repetition(repeat) = root("a+?") else {
        panic!("expected repetition");
    };
    assert!(!repeat.greedy);
}

#[test]
fn quantifier_binds_to_preceding_atom_only() {
    let Node::Sequence { items } = root("ab*") else {
        panic!("expected sequence");
    };
    assert_eq!(literal_char(&items[0]), Some('a'));
    assert!(matches!(&items[1], Node::Repetition(r) if literal_char(&r.body) == Some('b')));
}

#[test]
fn brace_without_quantifier_is_literal() {
    let Node::Sequence { items } = root("a{,3}") else {
        panic!("expected sequence");
    };
    let chars: Vec<_> = items.iter().filter_map(literal_char).collect();
    assert_eq!(chars, vec!['a', '{', ',', '3', '}']);
}

#[test]
fn lookahead_may_be_quantified() {
    assert!(matches!(root("(?=a)*"), Node::Repetition(_)));
}

// =============================================================================
// ESCAPES AND CLASSES
// =============================================================================

#[test]
fn escape_sequences() {
    let Node::Sequence { items } = root("\\d\\n\\x41\\u00e9\\cJ\\012\\0") else {
        panic!("expected sequence");
    };
    let labels: Vec<String> = items
        .iter()
        .map(|n| match n {
            Node::Literal { literal } => literal.label(),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(
        labels,
        vec![
            "digit",
            "line feed (0x0A)",
            "0x41",
            "U+00E9",
            "ctrl-J",
            "octal: 12",
            "null (0x00)",
        ]
    );
}

#[test]
fn incomplete_hex_escape_is_literal_letter() {
    let Node::Sequence { items } = root("\\xZ") else {
        panic!("expected sequence");
    };
    assert_eq!(literal_char(&items[0]), Some('x'));
    assert_eq!(literal_char(&items[1]), Some('Z'));
}

#[test]
fn anchors() {
    let Node::Sequence { items } = root("^\\b\\B$") else {
        panic!("expected sequence");
    };
    let kinds: Vec<_> = items
        .iter()
        .map(|n| match n {
            Node::Anchor { anchor } => *anchor,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            AnchorKind::Start,
            AnchorKind::WordBoundary,
            AnchorKind::NonWordBoundary,
            AnchorKind::End,
        ]
    );
}

#[test]
fn character_class_with_ranges() {
    let Node::CharacterClass(class) = root("[a-z0-9_]") else {
        panic!("expected class");
    };
    assert!(!class.negated);
    assert_eq!(
        class.items,
        vec![
            ClassItem::Range('a', 'z'),
            ClassItem::Range('0', '9'),
            ClassItem::Char('_'),
        ]
    );
    assert_eq!(class.ranges(), vec![(0x61, 0x7A), (0x30, 0x39), (0x5F, 0x5F)]);
}

#[test]
fn class_digit_escapes_are_octal() {
    let Node::CharacterClass(class) = root("[\\1-\\7]") else {
        panic!("expected class");
    };
    assert_eq!(class.items, vec![ClassItem::Range('\u{1}', '\u{7}')]);

    // Three digits at most, and never past \377.
    let Node::CharacterClass(class) = root("[\\377\\400\\8]") else {
        panic!("expected class");
    };
    assert_eq!(
        class.items,
        vec![
            ClassItem::Char('\u{FF}'),
            ClassItem::Char('\u{20}'),
            ClassItem::Char('0'),
            ClassItem::Char('8'),
        ]
    );
}

#[test]
fn negated_class_with_escapes() {
    let Node::CharacterClass(class) = root("[^\\d\\-\\]-]") else {
        panic!("expected class");
    };
    assert!(class.negated);
    assert_eq!(
        class.items,
        vec![
            ClassItem::Escape(ClassEscape::Digit),
            ClassItem::Char('-'),
            ClassItem::Char(']'),
            ClassItem::Char('-'),
        ]
    );
}

#[test]
fn escape_next_to_dash_makes_dash_literal() {
    let Node::CharacterClass(class) = root("[\\w-z]") else {
        panic!("expected class");
    };
    assert_eq!(
        class.items,
        vec![
            ClassItem::Escape(ClassEscape::Word),
            ClassItem::Char('-'),
            ClassItem::Char('z'),
        ]
    );
}

#[test]
fn delimited_form_with_flags() {
    let expr = parse("/a|b/gi").unwrap();
    assert!(expr.flags.global);
    assert!(expr.flags.ignore_case);
    assert!(!expr.flags.multiline);
    assert_eq!(expr.flags.names(), vec!["global", "ignore case"]);
    assert!(matches!(expr.root, Node::Alternation { .. }));
}

#[test]
fn slash_without_closing_is_bare_pattern() {
    let Node::Sequence { items } = root("/a") else {
        panic!("expected sequence");
    };
    assert_eq!(literal_char(&items[0]), Some('/'));
}

#[test]
fn slashed_path_is_bare_pattern() {
    let expr = parse("/usr/bin").unwrap();
    assert!(expr.flags.is_empty());
    let Node::Sequence { items } = expr.root else {
        panic!("expected sequence");
    };
    let chars: String = items.iter().filter_map(literal_char).collect();
    assert_eq!(chars, "/usr/bin");
}

#[test]
fn oversized_backreference_stays_unresolved() {
    let expr = parse("\\99999999999999999999999").unwrap();
    assert!(matches!(
        expr.root,
        Node::Backreference {
            target: BackrefTarget::Index(usize::MAX)
        }
    ));
    assert_eq!(expr.unresolved_references().len(), 1);
}

#[test]
fn same_name_in_separate_alternatives() {
    let expr = parse("(?<a>x)|(?<a>y)").unwrap();
    assert_eq!(expr.groups.count, 2);
    assert_eq!(expr.groups.index_of("a"), Some(1));

    let expr = parse("((?<y>\\d)|(?<y>x))-(?<m>\\d)").unwrap();
    assert_eq!(expr.groups.count, 4);
}

// =============================================================================
// ERRORS
// =============================================================================

fn error(source: &str) -> SyntaxError {
    parse(source).unwrap_err()
}

#[test]
fn unterminated_group() {
    let err = error("ab(c");
    assert_eq!(err.message, "unterminated group");
    assert_eq!(err.offset, 2);
}

#[test]
fn unmatched_close_paren() {
    let err = error("ab)c");
    assert_eq!(err.message, "unmatched ')'");
    assert_eq!(err.offset, 2);
}

#[test]
fn nothing_to_repeat() {
    assert_eq!(error("*a").offset, 0);
    assert_eq!(error("a|+").offset, 2);
    assert_eq!(error("a**").message, "nothing to repeat");
    assert_eq!(error("^*").message, "nothing to repeat");
    assert_eq!(error("(?<=a)?").message, "nothing to repeat");
}

#[test]
fn quantifier_out_of_order() {
    let err = error("a{5,2}");
    assert_eq!(err.message, "numbers out of order in {} quantifier");
    assert_eq!(err.offset, 1);
}

#[test]
fn class_range_out_of_order() {
    let err = error("x[z-a]");
    assert_eq!(err.message, "range out of order in character class");
    assert_eq!(err.offset, 2);
}

#[test]
fn unterminated_class() {
    assert_eq!(error("[abc").message, "unterminated character class");
}

#[test]
fn trailing_backslash() {
    let err = error("ab\\");
    assert_eq!(err.message, "\\ at end of pattern");
    assert_eq!(err.offset, 2);
}

#[test]
fn invalid_group_syntax() {
    assert_eq!(error("(?x)").message, "invalid group");
    assert_eq!(error("(?<1a>x)").message, "invalid capture group name");
    assert_eq!(error("(?<a>x)(?<a>y)").message, "duplicate group name 'a'");
    assert_eq!(error("(?<a>x|y)(?<a>z)").message, "duplicate group name 'a'");
    assert_eq!(error("((?<a>x)|y)(?<a>z)").message, "duplicate group name 'a'");
    assert_eq!(error("(?<a>(?<a>x))").message, "duplicate group name 'a'");
}

#[test]
fn offsets_count_characters_and_delimiters() {
    // "é" is two bytes but one character; the leading slash shifts by one.
    let err = error("/é(/");
    assert_eq!(err.offset, 2);
}

#[test]
fn repeated_flags() {
    let err = error("/a/gg");
    assert_eq!(err.message, "repeated flag 'g'");
    assert_eq!(err.offset, 4);
}

#[test]
fn tokens_carry_spans() {
    let mut parser = Parser::new("a{2}(?:");
    let first = parser.next_token().unwrap().unwrap();
    assert_eq!(first.kind, TokenKind::Literal(Literal::Char('a')));
    assert_eq!(first.span, 0..1);
    let second = parser.next_token().unwrap().unwrap();
    assert_eq!(
        second.kind,
        TokenKind::Quantifier {
            min: 2,
            max: Some(2),
            greedy: true
        }
    );
    assert_eq!(second.span, 1..4);
    let third = parser.next_token().unwrap().unwrap();
    assert_eq!(third.kind, TokenKind::GroupOpen(GroupKind::NonCapture));
    assert!(parser.next_token().unwrap().is_none());
}
