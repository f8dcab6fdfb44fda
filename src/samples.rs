use include_dir::{include_dir, Dir};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::Deserialize;
use thiserror::Error;

static CORPUS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/corpus");

const BUNDLED_CORPUS: &str = "sentences.json";

#[derive(Debug, Error, PartialEq)]
pub enum CorpusError {
    #[error("corpus file {0} is not bundled")]
    Missing(String),
    #[error("corpus file is not valid json: {0}")]
    Malformed(String),
    #[error("corpus has no sentences")]
    Empty,
    #[error("corpus sentence {0} is blank")]
    BlankSentence(usize),
}

#[derive(Deserialize, Clone, Debug)]
struct Corpus {
    #[allow(dead_code)]
    name: String,
    sentences: Vec<String>,
}

/// Draws reference sentences uniformly at random from a fixed, non-empty corpus.
#[derive(Debug, Clone)]
pub struct SampleProvider {
    sentences: Vec<String>,
    rng: StdRng,
}

impl SampleProvider {
    /// The corpus compiled into the binary.
    pub fn bundled() -> Result<Self, CorpusError> {
        let file = CORPUS_DIR
            .get_file(BUNDLED_CORPUS)
            .ok_or_else(|| CorpusError::Missing(BUNDLED_CORPUS.to_string()))?;
        let text = file
            .contents_utf8()
            .ok_or_else(|| CorpusError::Malformed("not utf-8".to_string()))?;
        let corpus: Corpus =
            serde_json::from_str(text).map_err(|e| CorpusError::Malformed(e.to_string()))?;

        Self::from_sentences(corpus.sentences)
    }

    pub fn from_sentences(sentences: Vec<String>) -> Result<Self, CorpusError> {
        if sentences.is_empty() {
            return Err(CorpusError::Empty);
        }
        if let Some(idx) = sentences.iter().position(|s| s.trim().is_empty()) {
            return Err(CorpusError::BlankSentence(idx));
        }

        Ok(Self {
            sentences,
            rng: StdRng::from_entropy(),
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    pub fn next(&mut self) -> String {
        // construction guarantees at least one sentence
        self.sentences
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default()
    }
}
