use criterion::{black_box, criterion_group, criterion_main, Criterion};
use search_core::{DocumentStatus, ExecutionPolicy, SearchServer};

/// Deterministic pseudo-random stream so runs are comparable.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

fn dictionary(rng: &mut Lcg, size: usize) -> Vec<String> {
    let mut words: Vec<String> = (0..size)
        .map(|_| {
            let len = 1 + rng.next() as usize % 10;
            (0..len).map(|_| (b'a' + (rng.next() % 26) as u8) as char).collect()
        })
        .collect();
    words.sort();
    words.dedup();
    words
}

fn text(rng: &mut Lcg, dictionary: &[String], words: usize, minus_ratio: u64) -> String {
    (0..words)
        .map(|_| {
            let word = &dictionary[rng.next() as usize % dictionary.len()];
            if minus_ratio > 0 && rng.next() % 100 < minus_ratio {
                format!("-{word}")
            } else {
                word.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn bench_policies(c: &mut Criterion) {
    let mut rng = Lcg(42);
    let dictionary = dictionary(&mut rng, 1000);
    let mut server = SearchServer::from_stop_words_text(&dictionary[0]).unwrap();
    for id in 0..2_000 {
        let doc = text(&mut rng, &dictionary, 70, 0);
        server.add_document(id, &doc, DocumentStatus::Active, &[1, 2, 3]).unwrap();
    }
    let query = text(&mut rng, &dictionary, 300, 10);

    for (name, policy) in [("seq", ExecutionPolicy::Sequential), ("par", ExecutionPolicy::Parallel)] {
        c.bench_function(&format!("match_document_{name}"), |b| {
            b.iter(|| {
                let mut matched = 0;
                for id in 0..200 {
                    matched += server.match_document_with(policy, black_box(&query), id).unwrap().0.len();
                }
                matched
            })
        });
        c.bench_function(&format!("find_top_documents_{name}"), |b| {
            b.iter(|| {
                server
                    .find_top_documents_with_status(policy, black_box(&query), DocumentStatus::Active)
                    .unwrap()
            })
        });
    }
}

criterion_group!(benches, bench_policies);
criterion_main!(benches);
