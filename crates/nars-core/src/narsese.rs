//! Narsese input: the line protocol and the sentence grammar
//! `[$p;d;q$] term punct [%f;c%]`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::budget::{Budget, truth_to_quality};
use crate::config::Parameters;
use crate::memory::Memory;
use crate::sentence::{Punctuation, Sentence, Task};
use crate::stamp::Stamp;
use crate::term::{Operator, Term, VarKind};
use crate::truth::TruthValue;

static SENTENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:\$(?P<budget>[^$]*)\$)?\s*(?P<term>.+?)\s*(?P<punct>[.?!])\s*(?:%(?P<truth>[^%]*)%)?\s*$",
    )
    .unwrap()
});

/// Copulas, all three characters wide. Checked before brackets because
/// several of them contain bracket characters.
const COPULAS: [&str; 7] = ["-->", "<->", "==>", "<=>", "{--", "--]", "{-]"];

const RESERVED: &[char] = &[
    '<', '>', '(', ')', '{', '}', '[', ']', ',', ';', '%', '$', '#', '?', '"',
];

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The line is not `[budget] term punctuation [truth]`.
    Sentence(String),
    /// The term text is malformed or names an invalid compound.
    Term(String),
    /// A budget or truth component is not a number in [0, 1].
    Value(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Sentence(line) => write!(f, "not a sentence: {line}"),
            ParseError::Term(term) => write!(f, "invalid term: {term}"),
            ParseError::Value(value) => write!(f, "invalid value: {value}"),
        }
    }
}

impl std::error::Error for ParseError {}

pub type Result<T> = std::result::Result<T, ParseError>;

// ---------------------------------------------------------------------------
// Protocol lines
// ---------------------------------------------------------------------------

/// One line of the input stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    Empty,
    Comment,
    /// `*`: forget everything.
    Reset,
    /// A bare integer: run that many ticks before reading more input.
    Steps(u64),
    Sentence(String),
}

impl InputLine {
    pub fn parse(line: &str) -> InputLine {
        let line = line.trim();
        if line.is_empty() {
            InputLine::Empty
        } else if line.starts_with("//") || line.starts_with('\'') {
            InputLine::Comment
        } else if line.starts_with('*') {
            InputLine::Reset
        } else if let Ok(n) = line.parse::<u64>() {
            InputLine::Steps(n)
        } else {
            InputLine::Sentence(line.to_owned())
        }
    }
}

// ---------------------------------------------------------------------------
// Sentences
// ---------------------------------------------------------------------------

/// Parse one sentence line into an input task stamped by `memory`.
pub fn parse_task(line: &str, memory: &mut Memory) -> Result<Task> {
    let caps = SENTENCE
        .captures(line)
        .ok_or_else(|| ParseError::Sentence(line.trim().to_owned()))?;
    let term_text: String = caps["term"].chars().filter(|c| !c.is_whitespace()).collect();
    let content = parse_term(&term_text)?;
    let punctuation = caps["punct"]
        .chars()
        .next()
        .and_then(Punctuation::from_symbol)
        .ok_or_else(|| ParseError::Sentence(line.trim().to_owned()))?;

    let params = memory.params();
    let truth = match punctuation {
        Punctuation::Question => None,
        _ => Some(parse_truth(caps.name("truth").map(|m| m.as_str()), params)?),
    };
    let budget = parse_budget(caps.name("budget").map(|m| m.as_str()), punctuation, truth.as_ref(), params)?;

    let stamp = Stamp::input(memory.next_serial(), memory.time());
    let sentence = Sentence::new(content, punctuation, truth, stamp);
    Ok(Task::input(sentence, budget))
}

fn parse_truth(text: Option<&str>, params: &Parameters) -> Result<TruthValue> {
    let Some(text) = text else {
        return Ok(TruthValue::new(1.0, params.default_judgment_confidence));
    };
    let values = unit_values(text, 2)?;
    let frequency = values.first().copied().unwrap_or(1.0);
    let confidence = values.get(1).copied().unwrap_or(params.default_judgment_confidence);
    Ok(TruthValue::new(frequency, confidence))
}

fn parse_budget(
    text: Option<&str>,
    punctuation: Punctuation,
    truth: Option<&TruthValue>,
    params: &Parameters,
) -> Result<Budget> {
    let (priority, durability) = match punctuation {
        Punctuation::Judgment => (params.default_judgment_priority, params.default_judgment_durability),
        Punctuation::Question => (params.default_question_priority, params.default_question_durability),
        Punctuation::Goal => (params.default_goal_priority, params.default_goal_durability),
    };
    let quality = truth.map_or(1.0, truth_to_quality);
    let values = match text {
        Some(text) => unit_values(text, 3)?,
        None => Vec::new(),
    };
    Ok(Budget::new(
        values.first().copied().unwrap_or(priority),
        values.get(1).copied().unwrap_or(durability),
        values.get(2).copied().unwrap_or(quality),
    ))
}

/// Up to `max` `;`-separated numbers in [0, 1].
fn unit_values(text: &str, max: usize) -> Result<Vec<f32>> {
    let parts: Vec<&str> = text.split(';').map(str::trim).filter(|p| !p.is_empty()).collect();
    if parts.len() > max {
        return Err(ParseError::Value(text.to_owned()));
    }
    parts
        .into_iter()
        .map(|p| match p.parse::<f32>() {
            Ok(v) if (0.0..=1.0).contains(&v) => Ok(v),
            _ => Err(ParseError::Value(p.to_owned())),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Terms
// ---------------------------------------------------------------------------

/// Parse a term with all whitespace already removed.
pub fn parse_term(s: &str) -> Result<Term> {
    let invalid = || ParseError::Term(s.to_owned());
    let first = s.chars().next().ok_or_else(invalid)?;
    match first {
        '<' => {
            let inner = s.strip_prefix('<').and_then(|t| t.strip_suffix('>')).ok_or_else(invalid)?;
            parse_statement(inner).ok_or_else(invalid)
        }
        '(' => {
            let inner = s.strip_prefix('(').and_then(|t| t.strip_suffix(')')).ok_or_else(invalid)?;
            parse_compound(inner)?.ok_or_else(invalid)
        }
        '{' => {
            let inner = s.strip_prefix('{').and_then(|t| t.strip_suffix('}')).ok_or_else(invalid)?;
            let components = split_arguments(inner)
                .into_iter()
                .map(parse_term)
                .collect::<Result<Vec<_>>>()?;
            Term::compound(Operator::SetExt, components).ok_or_else(invalid)
        }
        '[' => {
            let inner = s.strip_prefix('[').and_then(|t| t.strip_suffix(']')).ok_or_else(invalid)?;
            let components = split_arguments(inner)
                .into_iter()
                .map(parse_term)
                .collect::<Result<Vec<_>>>()?;
            Term::compound(Operator::SetInt, components).ok_or_else(invalid)
        }
        c => {
            if let Some(kind) = VarKind::from_prefix(c) {
                let name = &s[c.len_utf8()..];
                if name.is_empty() || name.contains(RESERVED) {
                    return Err(invalid());
                }
                return Ok(Term::variable(kind, name));
            }
            if s == "_" || s.contains(RESERVED) {
                return Err(invalid());
            }
            Ok(Term::atom(s))
        }
    }
}

fn parse_statement(inner: &str) -> Option<Term> {
    let (at, copula) = find_copula(inner)?;
    let subject = parse_term(&inner[..at]).ok()?;
    let predicate = parse_term(&inner[at + copula.len()..]).ok()?;
    match copula {
        "{--" => Term::inheritance(Term::compound(Operator::SetExt, vec![subject])?, predicate),
        "--]" => Term::inheritance(subject, Term::compound(Operator::SetInt, vec![predicate])?),
        "{-]" => Term::inheritance(
            Term::compound(Operator::SetExt, vec![subject])?,
            Term::compound(Operator::SetInt, vec![predicate])?,
        ),
        _ => Term::statement(Operator::from_copula(copula)?, subject, predicate),
    }
}

/// `(op, a, b, ...)`. Images take the relation first and mark the
/// relation's own slot with `_`.
fn parse_compound(inner: &str) -> Result<Option<Term>> {
    let mut args = split_arguments(inner).into_iter();
    let Some(connector) = args.next() else {
        return Ok(None);
    };
    let Some(operator) = Operator::from_connector(connector) else {
        return Ok(None);
    };
    let args: Vec<&str> = args.collect();

    if operator.is_image() {
        let Some((relation, rest)) = args.split_first() else {
            return Ok(None);
        };
        let Some(slot) = rest.iter().position(|a| *a == "_") else {
            return Ok(None);
        };
        let relation = parse_term(relation)?;
        let mut components = Vec::with_capacity(rest.len());
        for (i, arg) in rest.iter().enumerate() {
            components.push(if i == slot { relation.clone() } else { parse_term(arg)? });
        }
        let operator = match operator {
            Operator::ImageExt { .. } => Operator::ImageExt { relation_index: slot },
            _ => Operator::ImageInt { relation_index: slot },
        };
        return Ok(Term::compound(operator, components));
    }

    let components = args.into_iter().map(parse_term).collect::<Result<Vec<_>>>()?;
    Ok(Term::compound(operator, components))
}

fn opens(c: u8) -> bool {
    matches!(c, b'<' | b'(' | b'{' | b'[')
}

fn closes(c: u8) -> bool {
    matches!(c, b'>' | b')' | b'}' | b']')
}

fn copula_at(s: &str, i: usize) -> Option<&'static str> {
    COPULAS.iter().copied().find(|c| s[i..].starts_with(c))
}

/// Byte offset and text of the top-level copula.
fn find_copula(s: &str) -> Option<(usize, &'static str)> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        if s.is_char_boundary(i)
            && let Some(copula) = copula_at(s, i)
        {
            if depth == 0 {
                return Some((i, copula));
            }
            i += copula.len();
            continue;
        }
        if opens(bytes[i]) {
            depth += 1;
        } else if closes(bytes[i]) {
            depth = depth.checked_sub(1)?;
        }
        i += 1;
    }
    None
}

/// Split on top-level commas.
fn split_arguments(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if s.is_char_boundary(i)
            && let Some(copula) = copula_at(s, i)
        {
            i += copula.len();
            continue;
        }
        match bytes[i] {
            c if opens(c) => depth += 1,
            c if closes(c) => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < s.len() {
        parts.push(&s[start..]);
    }
    parts
}
