pub mod alignment;
pub mod config;
pub mod corpus;
pub mod error;
pub mod evaluation;
pub mod output;
pub mod pipeline;
pub mod types;

pub use alignment::bleu::{corpus_bleu, symmetric_corpus_bleu, BleuScorer};
pub use config::{AlignerConfig, GapFillHeuristic};
pub use corpus::ArticleReader;
pub use error::AlignmentError;
pub use evaluation::{EvaluationReport, GoldEvaluator};
pub use pipeline::builder::SentenceAlignerBuilder;
pub use pipeline::pool::{AlignmentPool, Execution};
pub use pipeline::runtime::SentenceAligner;
pub use pipeline::traits::{AlignmentSink, LengthAligner, PathFinder, SimilarityScorer};
pub use types::{
    AlignMethod, AlignTag, AlignmentPair, Article, ArticleAlignment, Multialign, ScoreCandidate,
    ScoreTable, WorkingState,
};
