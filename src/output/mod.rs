//! Turning aligned articles into text: rendering, BLEU filtering and the
//! file or stdout writers.

pub mod filter;
pub mod render;
pub mod writer;

pub use filter::{BleuFilter, FilterMode, FilterOptions, FilterOutcome, OutputLine};
pub use render::{render_article, OutputOptions, RenderedLine};
pub use writer::{AlignedTextSink, PairWriter};
