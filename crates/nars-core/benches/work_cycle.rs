use criterion::{Criterion, black_box, criterion_group, criterion_main};
use nars_core::{Bag, Budget, Item, Reasoner};

const INPUT: &str = "\
<robin --> bird>.
<bird --> animal>.
<swan --> bird>.
<penguin --> bird>. %0.90;0.90%
<bird --> flyer>. %0.80;0.90%
<(*,acid,base) --> reaction>.
<robin --> animal>?
";

fn bench_work_cycle(c: &mut Criterion) {
    c.bench_function("work_cycle_200_ticks", |b| {
        b.iter(|| {
            let mut reasoner = Reasoner::default();
            reasoner.add_input(INPUT);
            black_box(reasoner.run(200))
        })
    });
}

#[derive(Debug)]
struct Entry {
    key: String,
    budget: Budget,
}

impl Item for Entry {
    fn key(&self) -> &str {
        &self.key
    }

    fn budget(&self) -> Budget {
        self.budget
    }

    fn set_budget(&mut self, budget: Budget) {
        self.budget = budget;
    }
}

fn bench_bag_take_put(c: &mut Criterion) {
    let mut bag = Bag::new(1000, 10);
    for i in 0..1000 {
        let p = (i % 97) as f32 / 100.0;
        bag.put_in(Entry {
            key: format!("item-{i}"),
            budget: Budget::new(p, 0.8, 0.5),
        });
    }
    c.bench_function("bag_take_out_put_back", |b| {
        b.iter(|| {
            if let Some(item) = bag.take_out() {
                bag.put_back(black_box(item));
            }
        })
    });
}

criterion_group!(benches, bench_work_cycle, bench_bag_take_put);
criterion_main!(benches);
