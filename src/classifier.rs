use lazy_static::lazy_static;
use pest::{iterators::Pair, Parser};
use std::collections::HashSet;

#[derive(Parser)]
#[grammar = "cfpl.pest"]
struct LineParser;

/// Statement kinds, one per grammar rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Declaration,
    UnarySign,
    Assignment,
    Input,
    Output,
    Start,
    Stop,
    Comment,
    UnaryIncrement,
    If,
    Else,
    While,
}

// Rule priority is part of the grammar: a line is matched against these
// in order and the first hit wins, so UnarySign must sit above the looser
// Assignment rule for sign-assignment to be recognized at all.
const GRAMMAR: [(Rule, Kind); 12] = [
    (Rule::declaration, Kind::Declaration),
    (Rule::unary_sign, Kind::UnarySign),
    (Rule::assignment, Kind::Assignment),
    (Rule::input, Kind::Input),
    (Rule::output, Kind::Output),
    (Rule::start, Kind::Start),
    (Rule::stop, Kind::Stop),
    (Rule::comment, Kind::Comment),
    (Rule::unary_increment, Kind::UnaryIncrement),
    (Rule::if_statement, Kind::If),
    (Rule::else_statement, Kind::Else),
    (Rule::while_statement, Kind::While),
];

lazy_static! {
    static ref KEYWORDS: HashSet<&'static str> = HashSet::from([
        "VAR", "AS", "INT", "FLOAT", "BOOL", "CHAR", "START", "STOP", "IF", "WHILE", "ELSE",
        "INPUT",
    ]);
}

pub fn is_reserved(name: &str) -> bool {
    KEYWORDS.contains(name)
}

/// Matches a trimmed, non-empty line against the ordered rule set.
/// `None` means the line fits no rule and structuring must abort.
pub fn classify(line: &str) -> Option<(Kind, Pair<Rule>)> {
    for (rule, kind) in GRAMMAR {
        if let Ok(mut pairs) = LineParser::parse(rule, line) {
            return Some((kind, pairs.next().unwrap()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(line: &str) -> Option<Kind> {
        classify(line).map(|(kind, _)| kind)
    }

    #[test]
    fn statement_kinds() {
        assert_eq!(kind("VAR a, b = 5, c = 'x' AS INT"), Some(Kind::Declaration));
        assert_eq!(kind("a = b + 2 * 3"), Some(Kind::Assignment));
        assert_eq!(kind("INPUT: a, b"), Some(Kind::Input));
        assert_eq!(kind("OUTPUT: \"hi\" & a"), Some(Kind::Output));
        assert_eq!(kind("START"), Some(Kind::Start));
        assert_eq!(kind("STOP"), Some(Kind::Stop));
        assert_eq!(kind("* anything at all"), Some(Kind::Comment));
        assert_eq!(kind("a++"), Some(Kind::UnaryIncrement));
        assert_eq!(kind("--a"), Some(Kind::UnaryIncrement));
        assert_eq!(kind("IF (a < 5)"), Some(Kind::If));
        assert_eq!(kind("ELSE"), Some(Kind::Else));
        assert_eq!(kind("WHILE (a <> b)"), Some(Kind::While));
    }

    #[test]
    fn sign_assignment_wins_over_assignment() {
        assert_eq!(kind("x = -y"), Some(Kind::UnarySign));
        assert_eq!(kind("x = +y"), Some(Kind::UnarySign));
        // A longer right-hand side falls through to the ordinary rule.
        assert_eq!(kind("x = -y + 1"), Some(Kind::Assignment));
        assert_eq!(kind("x = -5"), Some(Kind::Assignment));
    }

    #[test]
    fn keywords_do_not_leak_into_statements() {
        assert_eq!(kind("STARTED"), None);
        assert_eq!(kind("IFx"), None);
        assert_eq!(kind("WHILE"), None);
        assert_eq!(kind("VAR AS INT"), None);
    }

    #[test]
    fn no_match_for_garbage() {
        assert_eq!(kind("5 = x"), None);
        assert_eq!(kind("HELLO WORLD"), None);
    }

    #[test]
    fn reserved_words() {
        assert!(is_reserved("WHILE"));
        assert!(is_reserved("INT"));
        assert!(!is_reserved("While"));
        assert!(!is_reserved("counter"));
    }
}
