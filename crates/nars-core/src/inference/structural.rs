//! Single-premise restructuring between products and images:
//! `<(*, a, b) --> R>` ⟺ `<a --> (/, R, _, b)>` ⟺ `<b --> (/, R, a, _)>`,
//! and the intensional mirror with `(\, ...)` on the subject side.

use crate::budget;
use crate::context::StepContext;
use crate::memory::Memory;
use crate::term::{Operator, Term};

/// Derive every product/image rewrite of an inheritance whose subject or
/// predicate is a product or image.
pub fn transform_product_image(inheritance: &Term, memory: &mut Memory, ctx: &mut StepContext) {
    let (Some(subject), Some(predicate)) = (inheritance.subject(), inheritance.predicate()) else {
        return;
    };
    for (new_subject, new_predicate) in subject_rewrites(subject, predicate) {
        emit(new_subject, new_predicate, memory, ctx);
    }
    for (new_subject, new_predicate) in predicate_rewrites(subject, predicate) {
        emit(new_subject, new_predicate, memory, ctx);
    }
}

type Rewrite = (Option<Term>, Option<Term>);

fn subject_rewrites(subject: &Term, predicate: &Term) -> Vec<Rewrite> {
    match subject.operator() {
        Some(Operator::Product) => (0..subject.components().len())
            .map(|i| {
                (
                    subject.component(i).cloned(),
                    image_from_product(ImageSide::Extension, subject, predicate, i),
                )
            })
            .collect(),
        Some(Operator::ImageInt { relation_index }) => (0..subject.components().len())
            .map(|i| {
                if i == relation_index {
                    (
                        subject.component(i).cloned(),
                        product_from_image(subject, predicate, i),
                    )
                } else {
                    (
                        image_from_image(subject, predicate, i),
                        subject.component(i).cloned(),
                    )
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn predicate_rewrites(subject: &Term, predicate: &Term) -> Vec<Rewrite> {
    match predicate.operator() {
        Some(Operator::Product) => (0..predicate.components().len())
            .map(|i| {
                (
                    image_from_product(ImageSide::Intension, predicate, subject, i),
                    predicate.component(i).cloned(),
                )
            })
            .collect(),
        Some(Operator::ImageExt { relation_index }) => (0..predicate.components().len())
            .map(|i| {
                if i == relation_index {
                    (
                        product_from_image(predicate, subject, i),
                        predicate.component(i).cloned(),
                    )
                } else {
                    (
                        predicate.component(i).cloned(),
                        image_from_image(predicate, subject, i),
                    )
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn emit(subject: Option<Term>, predicate: Option<Term>, memory: &mut Memory, ctx: &mut StepContext) {
    let Some(content) = subject
        .zip(predicate)
        .and_then(|(s, p)| Term::inheritance(s, p))
    else {
        return;
    };
    let Some(task) = ctx.task.clone() else {
        return;
    };
    let truth = task.sentence().truth().copied();
    let budget = match &truth {
        Some(truth) => budget::compound_forward(truth, &content, memory, ctx),
        None => budget::compound_backward(&content, memory, ctx),
    };
    memory.single_premise_task(content, truth, budget, ctx);
}

#[derive(Clone, Copy)]
enum ImageSide {
    Extension,
    Intension,
}

/// `(*, a, b)` with `relation` in place of component `index`, as an image
/// whose placeholder sits there.
fn image_from_product(side: ImageSide, product: &Term, relation: &Term, index: usize) -> Option<Term> {
    let mut components = product.components().to_vec();
    *components.get_mut(index)? = relation.clone();
    let operator = match side {
        ImageSide::Extension => Operator::ImageExt { relation_index: index },
        ImageSide::Intension => Operator::ImageInt { relation_index: index },
    };
    Term::compound(operator, components)
}

/// Move the placeholder of `image` to `index`: the relation goes there and
/// `component` fills the old placeholder slot.
fn image_from_image(image: &Term, component: &Term, index: usize) -> Option<Term> {
    let operator = image.operator()?;
    let old_index = operator.relation_index()?;
    let mut components = image.components().to_vec();
    let relation = components.get(old_index)?.clone();
    components[old_index] = component.clone();
    *components.get_mut(index)? = relation;
    let operator = match operator {
        Operator::ImageExt { .. } => Operator::ImageExt { relation_index: index },
        _ => Operator::ImageInt { relation_index: index },
    };
    Term::compound(operator, components)
}

/// The product an image was cut from, with `component` back in the
/// placeholder slot.
fn product_from_image(image: &Term, component: &Term, index: usize) -> Option<Term> {
    let mut components = image.components().to_vec();
    *components.get_mut(index)? = component.clone();
    Term::compound(Operator::Product, components)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::budget::Budget;
    use crate::config::Parameters;
    use crate::sentence::{Punctuation, Sentence, Task};
    use crate::stamp::Stamp;
    use crate::truth::TruthValue;

    fn a(name: &str) -> Term {
        Term::atom(name)
    }

    fn product(names: &[&str]) -> Term {
        Term::compound(Operator::Product, names.iter().map(|n| a(n)).collect()).unwrap()
    }

    fn run(content: Term, punctuation: Punctuation) -> Vec<String> {
        let mut memory = Memory::new(Parameters::default());
        let truth = (punctuation == Punctuation::Judgment).then(|| TruthValue::new(1.0, 0.9));
        let sentence = Sentence::new(content.clone(), punctuation, truth, Stamp::input(1, 0));
        let task = Rc::new(Task::input(sentence, Budget::new(0.9, 0.8, 0.9)));
        let mut ctx = StepContext::for_task(task);
        transform_product_image(&content, &mut memory, &mut ctx);
        memory.drain_output()
    }

    #[test]
    fn test_product_subject_becomes_extensional_images() {
        let content = Term::inheritance(product(&["acid", "base"]), a("reaction")).unwrap();
        let out = run(content, Punctuation::Judgment);
        assert_eq!(
            out,
            vec![
                " OUT: <acid --> (/,reaction,_,base)>. %1.00;0.90%".to_owned(),
                " OUT: <base --> (/,reaction,acid,_)>. %1.00;0.90%".to_owned(),
            ]
        );
    }

    #[test]
    fn test_product_predicate_becomes_intensional_images() {
        let content = Term::inheritance(a("reaction"), product(&["acid", "base"])).unwrap();
        let out = run(content, Punctuation::Judgment);
        assert_eq!(
            out,
            vec![
                " OUT: <(\\,reaction,_,base) --> acid>. %1.00;0.90%".to_owned(),
                " OUT: <(\\,reaction,acid,_) --> base>. %1.00;0.90%".to_owned(),
            ]
        );
    }

    #[test]
    fn test_image_predicate_round_trips_to_product() {
        let image = image_from_product(ImageSide::Extension, &product(&["acid", "base"]), &a("reaction"), 0)
            .unwrap();
        assert_eq!(image.name(), "(/,reaction,_,base)");
        let content = Term::inheritance(a("acid"), image).unwrap();
        let out = run(content, Punctuation::Judgment);
        assert!(out.contains(&" OUT: <(*,acid,base) --> reaction>. %1.00;0.90%".to_owned()), "{out:?}");
        assert!(out.contains(&" OUT: <base --> (/,reaction,acid,_)>. %1.00;0.90%".to_owned()), "{out:?}");
    }

    #[test]
    fn test_question_keeps_punctuation() {
        let content = Term::inheritance(product(&["acid", "base"]), a("reaction")).unwrap();
        let out = run(content, Punctuation::Question);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|line| line.ends_with('?')));
    }

    #[test]
    fn test_plain_inheritance_has_no_rewrites() {
        let content = Term::inheritance(a("robin"), a("bird")).unwrap();
        assert!(run(content, Punctuation::Judgment).is_empty());
    }
}
