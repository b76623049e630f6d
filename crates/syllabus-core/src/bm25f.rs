//! In-memory multi-field BM25 scoring.
//!
//! `CorpusStats` holds per-field postings and lengths built by the analyzer.
//! `Bm25fScorer` sums one BM25 score per field, each multiplied by the
//! field's weight from the active `WeightScheme`:
//!
//! ```text
//! idf(t)  = ln(1 + (N - df + 0.5) / (df + 0.5))
//! s_f(d)  = Σ_t idf(t) · tf·(k1+1) / (tf + k1·(1 - b_f + b_f·len/avglen))
//! s(d)    = Σ_f w_f · s_f(d)
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::analysis;
use crate::traits::Scorer;
use crate::types::{DocField, DocId, Document, Query, ScoredDoc, WeightScheme};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    pub k1: f64,
    pub title_b: f64,
    pub body_b: f64,
    pub answer_b: f64,
}

impl Bm25Params {
    pub fn b(&self, field: DocField) -> f64 {
        match field {
            DocField::Title => self.title_b,
            DocField::Body => self.body_b,
            DocField::Answers => self.answer_b,
        }
    }
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, title_b: 0.75, body_b: 0.75, answer_b: 0.75 }
    }
}

#[derive(Debug, Default, Clone)]
struct FieldStats {
    /// term -> (doc slot, term frequency), slots ascending
    postings: HashMap<String, Vec<(usize, u32)>>,
    lengths: Vec<u32>,
    avg_len: f64,
}

impl FieldStats {
    fn add(&mut self, slot: usize, terms: Vec<String>) {
        self.lengths.push(terms.len() as u32);
        let mut freqs: HashMap<String, u32> = HashMap::new();
        for t in terms { *freqs.entry(t).or_insert(0) += 1; }
        for (term, tf) in freqs { self.postings.entry(term).or_default().push((slot, tf)); }
    }

    fn finish(&mut self) {
        let total: u64 = self.lengths.iter().map(|&l| u64::from(l)).sum();
        self.avg_len = if self.lengths.is_empty() { 0.0 } else { total as f64 / self.lengths.len() as f64 };
    }
}

/// Term statistics for the title, body and accumulated answer text of every document.
#[derive(Debug, Default, Clone)]
pub struct CorpusStats {
    ids: Vec<DocId>,
    fields: [FieldStats; 3],
}

impl CorpusStats {
    pub fn build<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut stats = Self::default();
        for doc in documents {
            let slot = stats.ids.len();
            stats.ids.push(doc.id);
            stats.fields[DocField::Title.index()].add(slot, analysis::tokenize(&doc.title));
            stats.fields[DocField::Body.index()].add(slot, analysis::tokenize(&doc.body));
            stats.fields[DocField::Answers.index()].add(slot, analysis::tokenize(&doc.answer_text()));
        }
        for f in &mut stats.fields { f.finish(); }
        stats
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn doc_freq(&self, field: DocField, term: &str) -> usize {
        self.fields[field.index()].postings.get(term).map_or(0, Vec::len)
    }
}

pub fn idf(num_docs: f64, doc_freq: f64) -> f64 {
    (1.0 + (num_docs - doc_freq + 0.5) / (doc_freq + 0.5)).ln()
}

pub struct Bm25fScorer {
    stats: CorpusStats,
    params: Bm25Params,
    weights: WeightScheme,
}

impl Bm25fScorer {
    pub fn new(stats: CorpusStats, params: Bm25Params) -> Self {
        Self { stats, params, weights: WeightScheme::default() }
    }

    pub fn weights(&self) -> &WeightScheme {
        &self.weights
    }

    /// Every document with a positive score, best first, ties by ascending id.
    pub fn ranked(&self, query: &Query, n: usize) -> Vec<ScoredDoc> {
        if query.is_empty() || n == 0 || self.stats.is_empty() {
            return Vec::new();
        }
        // Sorted, deduplicated terms keep the float summation order stable.
        let terms: BTreeSet<&str> = query.terms().iter().map(String::as_str).collect();
        let num_docs = self.stats.len() as f64;
        let k1 = self.params.k1;
        let mut acc: HashMap<usize, f64> = HashMap::new();
        for field in DocField::ALL {
            let weight = f64::from(self.weights.weight(field));
            if weight <= 0.0 { continue; }
            let stats = &self.stats.fields[field.index()];
            let b = self.params.b(field);
            for term in &terms {
                let Some(postings) = stats.postings.get(*term) else { continue };
                let term_idf = idf(num_docs, postings.len() as f64);
                for &(slot, tf) in postings {
                    let tf = f64::from(tf);
                    let rel_len = if stats.avg_len > 0.0 { f64::from(stats.lengths[slot]) / stats.avg_len } else { 0.0 };
                    let norm = tf + k1 * (1.0 - b + b * rel_len);
                    *acc.entry(slot).or_insert(0.0) += weight * term_idf * tf * (k1 + 1.0) / norm;
                }
            }
        }
        let mut ranked: Vec<(DocId, f64)> = acc
            .into_iter()
            .filter(|(_, s)| *s > 0.0)
            .map(|(slot, s)| (self.stats.ids[slot], s))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked.into_iter().map(|(id, score)| ScoredDoc { id, score: score as f32 }).collect()
    }
}

impl Scorer for Bm25fScorer {
    fn set_weights(&mut self, weights: &WeightScheme) {
        self.weights = weights.clone();
    }

    fn top_n(&self, query: &Query, n: usize) -> anyhow::Result<Vec<DocId>> {
        Ok(self.ranked(query, n).into_iter().map(|h| h.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Document> {
        let mut with_answers = Document::new(3, "lifetimes", "elision rules");
        with_answers.sub_documents.push(Document::new(30, "", "ownership moves the value"));
        vec![
            Document::new(1, "ownership basics", "memory is freed when the owner goes out of scope"),
            Document::new(2, "memory layout", "ownership and borrowing rules for references"),
            with_answers,
            Document::new(4, "closures", "capture environment"),
        ]
    }

    fn scorer(weights: WeightScheme) -> Bm25fScorer {
        let mut s = Bm25fScorer::new(CorpusStats::build(&corpus()), Bm25Params::default());
        s.set_weights(&weights);
        s
    }

    #[test]
    fn title_weight_prefers_title_match() {
        let s = scorer(WeightScheme::new(1.0, 0.0, 0.0));
        assert_eq!(s.top_n(&Query::parse("ownership"), 10).expect("rank"), vec![1]);
    }

    #[test]
    fn body_weight_prefers_body_match() {
        let s = scorer(WeightScheme::new(0.0, 1.0, 0.0));
        assert_eq!(s.top_n(&Query::parse("ownership"), 10).expect("rank"), vec![2]);
    }

    #[test]
    fn answer_text_is_scored() {
        let s = scorer(WeightScheme::new(0.0, 0.0, 1.0));
        assert_eq!(s.top_n(&Query::parse("ownership"), 10).expect("rank"), vec![3]);
    }

    #[test]
    fn mixed_weights_rank_all_matches() {
        let s = scorer(WeightScheme::new(0.6, 0.3, 0.1));
        let ids = s.top_n(&Query::parse("ownership"), 10).expect("rank");
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], 1, "title carries the largest weight");
    }

    #[test]
    fn ties_break_by_ascending_id() {
        let docs = vec![Document::new(9, "tokio", ""), Document::new(5, "tokio", ""), Document::new(7, "tokio", "")];
        let mut s = Bm25fScorer::new(CorpusStats::build(&docs), Bm25Params::default());
        s.set_weights(&WeightScheme::new(1.0, 0.0, 0.0));
        assert_eq!(s.top_n(&Query::parse("tokio"), 2).expect("rank"), vec![5, 7]);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let s = scorer(WeightScheme::default());
        let q = Query::parse("ownership memory rules");
        let first = s.top_n(&q, 3).expect("rank");
        for _ in 0..5 { assert_eq!(s.top_n(&q, 3).expect("rank"), first); }
    }

    #[test]
    fn empty_query_and_zero_n_yield_nothing() {
        let s = scorer(WeightScheme::default());
        assert!(s.top_n(&Query::parse("the of"), 5).expect("rank").is_empty());
        assert!(s.top_n(&Query::parse("ownership"), 0).expect("rank").is_empty());
    }

    #[test]
    fn no_padding_when_few_documents_match() {
        let s = scorer(WeightScheme::default());
        assert_eq!(s.top_n(&Query::parse("closures"), 10).expect("rank"), vec![4]);
    }

    #[test]
    fn stats_count_document_frequency_per_field() {
        let stats = CorpusStats::build(&corpus());
        assert_eq!(stats.len(), 4);
        assert_eq!(stats.doc_freq(DocField::Title, "ownership"), 1);
        assert_eq!(stats.doc_freq(DocField::Body, "ownership"), 1);
        assert_eq!(stats.doc_freq(DocField::Answers, "ownership"), 1);
        assert_eq!(stats.doc_freq(DocField::Body, "memory"), 1);
        assert_eq!(stats.doc_freq(DocField::Title, "the"), 0, "stop words are not indexed");
    }

    #[test]
    fn set_weights_replaces_the_active_scheme() {
        let mut s = Bm25fScorer::new(CorpusStats::build(&corpus()), Bm25Params::default());
        assert_eq!(s.weights(), &WeightScheme::default());
        let title_only = WeightScheme::new(1.0, 0.0, 0.0).named("title-only");
        s.set_weights(&title_only);
        assert_eq!(s.weights(), &title_only);
    }

    #[test]
    fn idf_is_positive_for_common_terms() {
        assert!(idf(4.0, 4.0) > 0.0);
        assert!(idf(4.0, 1.0) > idf(4.0, 3.0));
    }
}
