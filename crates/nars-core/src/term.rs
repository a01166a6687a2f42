//! Terms: atoms, variables and compounds built from a fixed operator set.
//!
//! Identity, ordering and hashing all go through the canonical name, which
//! is computed once at construction. Commutative compounds sort and
//! deduplicate their components so equal terms always print the same.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarKind {
    Independent,
    Dependent,
    Query,
}

impl VarKind {
    pub fn prefix(self) -> char {
        match self {
            VarKind::Independent => '$',
            VarKind::Dependent => '#',
            VarKind::Query => '?',
        }
    }

    pub fn from_prefix(c: char) -> Option<Self> {
        match c {
            '$' => Some(VarKind::Independent),
            '#' => Some(VarKind::Dependent),
            '?' => Some(VarKind::Query),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Inheritance,
    Similarity,
    Implication,
    Equivalence,
    SetExt,
    SetInt,
    IntersectionExt,
    IntersectionInt,
    DifferenceExt,
    DifferenceInt,
    Product,
    /// `(/, R, _, b)`; components hold the relation at `relation_index`,
    /// which is also where the placeholder is printed.
    ImageExt { relation_index: usize },
    ImageInt { relation_index: usize },
    Negation,
    Conjunction,
    Disjunction,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Inheritance => "-->",
            Operator::Similarity => "<->",
            Operator::Implication => "==>",
            Operator::Equivalence => "<=>",
            Operator::SetExt => "{",
            Operator::SetInt => "[",
            Operator::IntersectionExt => "&",
            Operator::IntersectionInt => "|",
            Operator::DifferenceExt => "-",
            Operator::DifferenceInt => "~",
            Operator::Product => "*",
            Operator::ImageExt { .. } => "/",
            Operator::ImageInt { .. } => "\\",
            Operator::Negation => "--",
            Operator::Conjunction => "&&",
            Operator::Disjunction => "||",
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            Operator::Inheritance
                | Operator::Similarity
                | Operator::Implication
                | Operator::Equivalence
        )
    }

    pub fn is_commutative(&self) -> bool {
        matches!(
            self,
            Operator::Similarity
                | Operator::Equivalence
                | Operator::SetExt
                | Operator::SetInt
                | Operator::IntersectionExt
                | Operator::IntersectionInt
                | Operator::Conjunction
                | Operator::Disjunction
        )
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Operator::ImageExt { .. } | Operator::ImageInt { .. })
    }

    /// Products and images support product/image restructuring.
    pub fn is_transformable(&self) -> bool {
        *self == Operator::Product || self.is_image()
    }

    pub fn relation_index(&self) -> Option<usize> {
        match self {
            Operator::ImageExt { relation_index } | Operator::ImageInt { relation_index } => {
                Some(*relation_index)
            }
            _ => None,
        }
    }

    /// Symmetric copula of the same order: `-->` to `<->`, `==>` to `<=>`.
    pub fn symmetric(&self) -> Option<Operator> {
        match self {
            Operator::Inheritance | Operator::Similarity => Some(Operator::Similarity),
            Operator::Implication | Operator::Equivalence => Some(Operator::Equivalence),
            _ => None,
        }
    }

    /// Copula from its textual form. Instance and property forms are
    /// handled by the parser, which rewrites them into inheritance.
    pub fn from_copula(s: &str) -> Option<Operator> {
        match s {
            "-->" => Some(Operator::Inheritance),
            "<->" => Some(Operator::Similarity),
            "==>" => Some(Operator::Implication),
            "<=>" => Some(Operator::Equivalence),
            _ => None,
        }
    }

    /// Prefix connector of a parenthesized compound. Images get relation
    /// index 0 here; the parser fixes it from the placeholder position.
    pub fn from_connector(s: &str) -> Option<Operator> {
        match s {
            "&" => Some(Operator::IntersectionExt),
            "|" => Some(Operator::IntersectionInt),
            "-" => Some(Operator::DifferenceExt),
            "~" => Some(Operator::DifferenceInt),
            "*" => Some(Operator::Product),
            "/" => Some(Operator::ImageExt { relation_index: 0 }),
            "\\" => Some(Operator::ImageInt { relation_index: 0 }),
            "--" => Some(Operator::Negation),
            "&&" => Some(Operator::Conjunction),
            "||" => Some(Operator::Disjunction),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Compound {
    operator: Operator,
    components: Vec<Term>,
    name: String,
    complexity: usize,
    constant: bool,
}

impl Compound {
    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn components(&self) -> &[Term] {
        &self.components
    }
}

#[derive(Clone, Debug)]
pub enum Term {
    Atom(Rc<str>),
    /// Stored with its prefix, e.g. `?x`.
    Variable(VarKind, Rc<str>),
    Compound(Rc<Compound>),
}

impl Term {
    pub fn atom(name: &str) -> Term {
        Term::Atom(Rc::from(name))
    }

    pub fn variable(kind: VarKind, name: &str) -> Term {
        Term::Variable(kind, Rc::from(format!("{}{}", kind.prefix(), name).as_str()))
    }

    /// Build a compound, or `None` when the components cannot form one.
    ///
    /// Commutative operators sort and deduplicate, intersections and
    /// junctions flatten nested terms of the same operator and collapse to
    /// their single component, double negation cancels, and statements
    /// that are reflexive or contain their own other side are rejected.
    pub fn compound(operator: Operator, components: Vec<Term>) -> Option<Term> {
        let mut components = components;
        match operator {
            Operator::Inheritance
            | Operator::Similarity
            | Operator::Implication
            | Operator::Equivalence => {
                if components.len() != 2 {
                    return None;
                }
                if operator.is_commutative() {
                    components.sort();
                }
                if invalid_statement(&components[0], &components[1]) {
                    return None;
                }
            }
            Operator::SetExt | Operator::SetInt => {
                components.sort();
                components.dedup();
                if components.is_empty() {
                    return None;
                }
            }
            Operator::IntersectionExt
            | Operator::IntersectionInt
            | Operator::Conjunction
            | Operator::Disjunction => {
                components = flatten(operator, components);
                components.sort();
                components.dedup();
                match components.len() {
                    0 => return None,
                    1 => return components.pop(),
                    _ => {}
                }
            }
            Operator::DifferenceExt | Operator::DifferenceInt => {
                if components.len() != 2 || components[0] == components[1] {
                    return None;
                }
            }
            Operator::Product => {
                if components.is_empty() {
                    return None;
                }
            }
            Operator::ImageExt { relation_index } | Operator::ImageInt { relation_index } => {
                if components.len() < 2 || relation_index >= components.len() {
                    return None;
                }
            }
            Operator::Negation => {
                if components.len() != 1 {
                    return None;
                }
                if let Some(Operator::Negation) = components[0].operator() {
                    return components[0].components().first().cloned();
                }
            }
        }

        let name = build_name(operator, &components);
        let complexity = 1 + components.iter().map(Term::complexity).sum::<usize>();
        let constant = components.iter().all(Term::is_constant);
        Some(Term::Compound(Rc::new(Compound {
            operator,
            components,
            name,
            complexity,
            constant,
        })))
    }

    pub fn statement(copula: Operator, subject: Term, predicate: Term) -> Option<Term> {
        if !copula.is_statement() {
            return None;
        }
        Term::compound(copula, vec![subject, predicate])
    }

    pub fn inheritance(subject: Term, predicate: Term) -> Option<Term> {
        Term::statement(Operator::Inheritance, subject, predicate)
    }

    pub fn name(&self) -> &str {
        match self {
            Term::Atom(name) | Term::Variable(_, name) => name,
            Term::Compound(c) => &c.name,
        }
    }

    /// Atoms count 1, variables 0, compounds 1 plus their components.
    pub fn complexity(&self) -> usize {
        match self {
            Term::Atom(_) => 1,
            Term::Variable(..) => 0,
            Term::Compound(c) => c.complexity,
        }
    }

    /// A term is constant when it contains no variable.
    pub fn is_constant(&self) -> bool {
        match self {
            Term::Atom(_) => true,
            Term::Variable(..) => false,
            Term::Compound(c) => c.constant,
        }
    }

    pub fn operator(&self) -> Option<Operator> {
        match self {
            Term::Compound(c) => Some(c.operator),
            _ => None,
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Term::Compound(_))
    }

    pub fn is_statement(&self) -> bool {
        self.operator().is_some_and(|op| op.is_statement())
    }

    pub fn is_operator(&self, operator: Operator) -> bool {
        self.operator() == Some(operator)
    }

    pub fn components(&self) -> &[Term] {
        match self {
            Term::Compound(c) => &c.components,
            _ => &[],
        }
    }

    pub fn component(&self, index: usize) -> Option<&Term> {
        self.components().get(index)
    }

    pub fn subject(&self) -> Option<&Term> {
        if self.is_statement() {
            self.component(0)
        } else {
            None
        }
    }

    pub fn predicate(&self) -> Option<&Term> {
        if self.is_statement() {
            self.component(1)
        } else {
            None
        }
    }

    /// Whether `other` is a direct component of this term.
    pub fn contains_component(&self, other: &Term) -> bool {
        self.components().iter().any(|c| c == other)
    }
}

/// A statement is invalid when its sides are equal, when one side is a
/// non-image compound containing the other, or when it mirrors itself
/// (`<<a --> b> --> <b --> a>>`).
pub fn invalid_statement(subject: &Term, predicate: &Term) -> bool {
    if subject == predicate {
        return true;
    }
    if invalid_reflexive(subject, predicate) || invalid_reflexive(predicate, subject) {
        return true;
    }
    if let (Some(s1), Some(p1), Some(s2), Some(p2)) = (
        subject.subject(),
        subject.predicate(),
        predicate.subject(),
        predicate.predicate(),
    ) {
        return s1 == p2 && p1 == s2;
    }
    false
}

fn invalid_reflexive(container: &Term, other: &Term) -> bool {
    match container.operator() {
        Some(op) if !op.is_image() => container.contains_component(other),
        _ => false,
    }
}

fn flatten(operator: Operator, components: Vec<Term>) -> Vec<Term> {
    let mut flat = Vec::with_capacity(components.len());
    for c in components {
        if c.is_operator(operator) {
            flat.extend(c.components().iter().cloned());
        } else {
            flat.push(c);
        }
    }
    flat
}

fn build_name(operator: Operator, components: &[Term]) -> String {
    let names: Vec<&str> = components.iter().map(Term::name).collect();
    match operator {
        op if op.is_statement() => format!("<{} {} {}>", names[0], op.symbol(), names[1]),
        Operator::SetExt => format!("{{{}}}", names.join(",")),
        Operator::SetInt => format!("[{}]", names.join(",")),
        Operator::ImageExt { relation_index } | Operator::ImageInt { relation_index } => {
            let mut parts = vec![operator.symbol(), names[relation_index]];
            for (i, name) in names.iter().enumerate() {
                parts.push(if i == relation_index { "_" } else { name });
            }
            format!("({})", parts.join(","))
        }
        op => format!("({},{})", op.symbol(), names.join(",")),
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Term::Compound(a), Term::Compound(b)) if Rc::ptr_eq(a, b) => true,
            _ => self.name() == other.name(),
        }
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name().cmp(other.name())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
