//! Integration tests across the whole core:
//! parse → input → work cycles → report lines.

use nars_core::{Item, Parameters, Reasoner};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const ANIMALS: &str = "\
<robin --> bird>.
<bird --> animal>.
";

const WORDS: [&str; 8] = [
    "robin", "bird", "animal", "swan", "penguin", "fish", "water", "flyer",
];

/// Random inheritance judgments and questions over a small vocabulary.
fn random_input(seed: u64, count: usize) -> String {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut lines = Vec::with_capacity(count);
    while lines.len() < count {
        let s = WORDS[rng.random_range(0..WORDS.len())];
        let p = WORDS[rng.random_range(0..WORDS.len())];
        if s == p {
            continue;
        }
        let copula = if rng.random_bool(0.2) { "<->" } else { "-->" };
        if rng.random_bool(0.15) {
            lines.push(format!("<{s} {copula} {p}>?"));
        } else {
            let f: f32 = rng.random_range(0.0..=1.0);
            lines.push(format!("<{s} {copula} {p}>. %{f:.2};0.90%"));
        }
    }
    lines.join("\n")
}

fn run_to_end(reasoner: &mut Reasoner, max_ticks: u64) -> Vec<String> {
    let mut out = Vec::new();
    for _ in 0..max_ticks {
        out.extend(reasoner.tick());
    }
    out
}

#[test]
fn deduction_end_to_end() {
    let mut reasoner = Reasoner::default();
    reasoner.add_input(ANIMALS);
    let out = run_to_end(&mut reasoner, 100);

    assert_eq!(out[0], "  IN: <robin --> bird>. %1.00;0.90%");
    assert_eq!(out[1], "  IN: <bird --> animal>. %1.00;0.90%");
    assert!(
        out.contains(&" OUT: <robin --> animal>. %1.00;0.81%".to_owned()),
        "no deduction in {out:#?}"
    );
}

#[test]
fn yes_no_question_answered_from_belief() {
    let mut reasoner = Reasoner::default();
    reasoner.add_input("<robin --> bird>.\n<robin --> bird>?");
    let out = reasoner.tick();
    assert_eq!(
        out,
        vec![
            "  IN: <robin --> bird>. %1.00;0.90%".to_owned(),
            "  IN: <robin --> bird>?".to_owned(),
            " OUT: <robin --> bird>. %1.00;0.90%".to_owned(),
        ]
    );
}

#[test]
fn revision_pools_evidence() {
    let mut reasoner = Reasoner::default();
    reasoner.add_input("<robin --> bird>. %1.00;0.90%\n<robin --> bird>. %0.00;0.90%");
    let out = reasoner.tick();
    assert!(
        out.contains(&" OUT: <robin --> bird>. %0.50;0.95%".to_owned()),
        "{out:#?}"
    );
}

#[test]
fn same_input_same_output() {
    let input = random_input(42, 60);
    let mut a = Reasoner::default();
    let mut b = Reasoner::default();
    a.add_input(&input);
    b.add_input(&input);

    let out_a = run_to_end(&mut a, 300);
    let out_b = run_to_end(&mut b, 300);
    assert!(out_a.len() > 60);
    assert_eq!(out_a, out_b);
}

#[test]
fn capacities_hold_under_load() {
    let params = Parameters {
        concept_bag_size: 12,
        task_link_bag_size: 5,
        term_link_bag_size: 8,
        novel_task_bag_size: 4,
        maximum_belief_length: 3,
        maximum_question_length: 2,
        ..Parameters::default()
    };
    let mut reasoner = Reasoner::new(params.clone());
    reasoner.add_input(&random_input(7, 200));
    run_to_end(&mut reasoner, 400);

    let memory = reasoner.memory();
    assert!(memory.concepts().len() <= params.concept_bag_size);
    assert!(memory.novel_tasks().len() <= params.novel_task_bag_size);
    for concept in memory.concepts().iter() {
        assert!(concept.task_links().len() <= params.task_link_bag_size);
        assert!(concept.term_links().len() <= params.term_link_bag_size);
        assert!(concept.beliefs().len() <= params.maximum_belief_length);
        assert!(concept.questions().count() <= params.maximum_question_length);
        let p = concept.priority();
        assert!((0.0..=1.0).contains(&p), "{} has priority {p}", concept.key());
    }
}

#[test]
fn reset_marker_forgets() {
    let mut reasoner = Reasoner::default();
    reasoner.add_input(ANIMALS);
    run_to_end(&mut reasoner, 20);
    assert!(!reasoner.memory().concepts().is_empty());

    reasoner.add_input("*\n<swan --> bird>.");
    let out = reasoner.tick();
    assert_eq!(out[0], "  IN: <swan --> bird>. %1.00;0.90%");
    assert!(out.iter().all(|l| !l.contains("robin")));
    assert!(reasoner.memory().concept("robin").is_none());
    assert!(reasoner.memory().concept("swan").is_some());
}
