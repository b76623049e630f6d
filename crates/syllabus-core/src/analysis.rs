//! Text analysis shared by corpus indexing and query construction.
//!
//! Lowercases, drops markup, splits on anything that is not alphanumeric and
//! removes stop words. The stop-word list matches the tantivy analyzer in
//! `syllabus-text`, so both scoring backends see the same terms.

pub const STOP_WORDS: &[&str] = &[
    "a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
];

pub fn tokenize(text: &str) -> Vec<String> {
    strip_markup(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !is_stop_word(t))
        .collect()
}

pub fn is_stop_word(term: &str) -> bool {
    STOP_WORDS.contains(&term)
}

/// Replaces `<...>` tags with a space; forum bodies are stored as HTML.
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => { in_tag = true; out.push(' '); }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
