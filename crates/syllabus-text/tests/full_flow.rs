use syllabus_core::traits::Scorer;
use syllabus_core::types::{Document, Query, WeightScheme};
use syllabus_text::{TantivyCorpusIndexer, TantivyScorer};

fn corpus() -> Vec<Document> {
    let mut answered = Document::new(3, "lifetimes", "<p>elision rules</p>");
    answered.sub_documents.push(Document::new(30, "", "<p>ownership moves the value</p>"));
    vec![
        Document::new(1, "ownership basics", "memory is freed when the owner goes out of scope"),
        Document::new(2, "memory layout", "<p>ownership and borrowing rules for references</p>"),
        answered,
        Document::new(4, "closures", "capture environment"),
    ]
}

fn scorer(weights: WeightScheme) -> TantivyScorer {
    let indexer = TantivyCorpusIndexer::in_memory().expect("indexer");
    let count = indexer.index_documents(&corpus()).expect("index");
    assert_eq!(count, 4);
    let mut scorer = indexer.into_scorer().expect("scorer");
    scorer.set_weights(&weights);
    scorer
}

#[test]
fn field_weights_select_the_matching_field() {
    let q = Query::parse("ownership");
    assert_eq!(scorer(WeightScheme::new(1.0, 0.0, 0.0)).top_n(&q, 10).expect("title"), vec![1]);
    assert_eq!(scorer(WeightScheme::new(0.0, 1.0, 0.0)).top_n(&q, 10).expect("body"), vec![2]);
    assert_eq!(scorer(WeightScheme::new(0.0, 0.0, 1.0)).top_n(&q, 10).expect("answers"), vec![3]);
}

#[test]
fn mixed_weights_rank_every_match() {
    let s = scorer(WeightScheme::new(0.6, 0.3, 0.1));
    let hits = s.ranked(&Query::parse("ownership"), 10).expect("ranked");
    assert_eq!(hits.len(), 3);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn ties_break_by_ascending_id() {
    let docs = vec![Document::new(9, "tokio", ""), Document::new(5, "tokio", ""), Document::new(7, "tokio", "")];
    let indexer = TantivyCorpusIndexer::in_memory().expect("indexer");
    indexer.index_documents(&docs).expect("index");
    let mut s = indexer.into_scorer().expect("scorer");
    s.set_weights(&WeightScheme::new(1.0, 0.0, 0.0));
    assert_eq!(s.top_n(&Query::parse("tokio"), 2).expect("rank"), vec![5, 7]);
    assert_eq!(s.top_n(&Query::parse("tokio"), 5).expect("rank"), vec![5, 7, 9]);
}

#[test]
fn ranking_is_deterministic() {
    let s = scorer(WeightScheme::default());
    let q = Query::parse("ownership memory rules");
    let first = s.top_n(&q, 3).expect("rank");
    for _ in 0..5 { assert_eq!(s.top_n(&q, 3).expect("rank"), first); }
}

#[test]
fn empty_query_returns_nothing() {
    let s = scorer(WeightScheme::default());
    assert!(s.top_n(&Query::parse("the and of"), 5).expect("rank").is_empty());
    assert!(s.top_n(&Query::parse("ownership"), 0).expect("rank").is_empty());
    assert!(s.top_n(&Query::parse("nonexistentterm"), 5).expect("rank").is_empty());
}

#[test]
fn persisted_index_can_be_reopened() {
    let tmp = tempfile::tempdir().expect("tmp");
    let dir = tmp.path().join("tantivy");
    TantivyCorpusIndexer::new(&dir).expect("indexer").index_documents(&corpus()).expect("index");
    let mut s = TantivyScorer::open(&dir).expect("open");
    assert_eq!(s.num_docs(), 4);
    s.set_weights(&WeightScheme::new(1.0, 0.0, 0.0));
    assert_eq!(s.top_n(&Query::parse("closures"), 3).expect("rank"), vec![4]);
}
