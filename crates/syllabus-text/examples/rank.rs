use std::env;
use std::path::PathBuf;

use syllabus_core::store::CorpusStore;
use syllabus_core::traits::Scorer;
use syllabus_core::types::{Query, WeightScheme};
use syllabus_text::TantivyCorpusIndexer;

// Rank a corpus against a query with the tantivy backend.
// Usage:
//   cargo run -p syllabus-text --example rank -- <corpus.json|dir> "<query>" [title body answer]

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 2 { eprintln!("Usage: rank <corpus> \"<query>\" [title body answer]"); std::process::exit(2); }
    let corpus = PathBuf::from(&args[0]);
    let query = Query::parse(&args[1]);
    let weights = match &args[2..] {
        [t, b, a] => WeightScheme::new(t.parse()?, b.parse()?, a.parse()?),
        [] => WeightScheme::default(),
        _ => { eprintln!("Weights need exactly three numbers"); std::process::exit(2); }
    };

    let store = CorpusStore::load(&corpus)?;
    let indexer = TantivyCorpusIndexer::in_memory()?.with_progress(true);
    indexer.index_documents(store.documents())?;
    let mut scorer = indexer.into_scorer()?;
    scorer.set_weights(&weights);

    println!("Query terms: {:?} ({})", query.terms(), weights);
    for (rank, hit) in scorer.ranked(&query, 10)?.iter().enumerate() {
        let title = store.documents().find(|d| d.id == hit.id).map(|d| d.title.clone()).unwrap_or_default();
        println!("{:>2}. [{:.4}] #{} {}", rank + 1, hit.score, hit.id, title);
    }
    Ok(())
}
