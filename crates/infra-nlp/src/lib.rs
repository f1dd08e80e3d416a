// Sentiq Infrastructure - NLP Adapter
// Implements: NlpBackend (rule-based sentence split, sentiment class, entity tags)

mod backend;
mod gazetteer;
mod lexicon;
mod text;

pub use backend::LexiconBackend;
pub use gazetteer::Gazetteer;
pub use lexicon::SentimentLexicon;
pub use text::{split_sentences, tokenize};
