use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

/// Tokens shorter than this (in chars) are dropped.
pub const MIN_TOKEN_CHARS: usize = 2;
const MAX_TOKEN_BYTES: usize = 40;

const STOP_WORDS: &[&str] = &[
	"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
];

/// Text analysis shared by catalog documents and queries: split on
/// non-alphanumerics, lowercase, drop English stop words and very short or
/// very long tokens.
#[derive(Clone)]
pub struct Analyzer {
	inner: TextAnalyzer,
}

impl Default for Analyzer {
	fn default() -> Self { Self::new() }
}

impl Analyzer {
	pub fn new() -> Self {
		let inner = TextAnalyzer::builder(SimpleTokenizer::default())
			.filter(RemoveLongFilter::limit(MAX_TOKEN_BYTES))
			.filter(LowerCaser)
			.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
			.build();
		Self { inner }
	}

	/// Terms of `text` in order of appearance, duplicates kept.
	pub fn terms(&self, text: &str) -> Vec<String> {
		// token_stream needs &mut; the analyzer is shared, so work on a copy.
		let mut analyzer = self.inner.clone();
		let mut stream = analyzer.token_stream(text);
		let mut terms = Vec::new();
		while stream.advance() {
			let token = &stream.token().text;
			if token.chars().count() >= MIN_TOKEN_CHARS { terms.push(token.clone()); }
		}
		terms
	}
}
