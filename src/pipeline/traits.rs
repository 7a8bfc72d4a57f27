use crate::error::AlignmentError;
use crate::types::{ArticleAlignment, ScoreTable};

pub trait SimilarityScorer: Send + Sync {
    /// For every test sentence, the best-scoring references in descending
    /// order. Zero scores are never listed.
    fn score_sentences(&self, tests: &[&str], references: &[&str]) -> ScoreTable;
}

pub trait PathFinder: Send + Sync {
    fn find_path(
        &self,
        scores: &ScoreTable,
        test_len: usize,
        ref_len: usize,
    ) -> Vec<(usize, usize)>;
}

pub trait LengthAligner: Send + Sync {
    /// Groups of `(source offsets, target offsets)` for two blocks of
    /// sentence lengths.
    fn align_lengths(&self, source: &[usize], target: &[usize]) -> Vec<(Vec<usize>, Vec<usize>)>;
}

/// Receives aligned articles strictly in input order.
pub trait AlignmentSink {
    fn emit(&mut self, alignment: &ArticleAlignment) -> Result<(), AlignmentError>;

    fn finish(&mut self) -> Result<(), AlignmentError> {
        Ok(())
    }
}

impl<S: AlignmentSink + ?Sized> AlignmentSink for &mut S {
    fn emit(&mut self, alignment: &ArticleAlignment) -> Result<(), AlignmentError> {
        (**self).emit(alignment)
    }

    fn finish(&mut self) -> Result<(), AlignmentError> {
        (**self).finish()
    }
}

/// Feeds every article to both sinks, first `A` then `B`.
impl<A: AlignmentSink, B: AlignmentSink> AlignmentSink for (A, B) {
    fn emit(&mut self, alignment: &ArticleAlignment) -> Result<(), AlignmentError> {
        self.0.emit(alignment)?;
        self.1.emit(alignment)
    }

    fn finish(&mut self) -> Result<(), AlignmentError> {
        self.0.finish()?;
        self.1.finish()
    }
}

/// An absent sink ignores every article.
impl<S: AlignmentSink> AlignmentSink for Option<S> {
    fn emit(&mut self, alignment: &ArticleAlignment) -> Result<(), AlignmentError> {
        match self {
            Some(sink) => sink.emit(alignment),
            None => Ok(()),
        }
    }

    fn finish(&mut self) -> Result<(), AlignmentError> {
        match self {
            Some(sink) => sink.finish(),
            None => Ok(()),
        }
    }
}

/// Collects every article in memory.
impl AlignmentSink for Vec<ArticleAlignment> {
    fn emit(&mut self, alignment: &ArticleAlignment) -> Result<(), AlignmentError> {
        self.push(alignment.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Article, WorkingState};

    fn aligned(index: usize) -> ArticleAlignment {
        ArticleAlignment {
            index,
            article: Article::default(),
            multialign: Vec::new(),
            last_run: WorkingState::default(),
        }
    }

    #[test]
    fn pair_of_sinks_sees_every_article() {
        let mut sink: (Vec<ArticleAlignment>, Option<Vec<ArticleAlignment>>) =
            (Vec::new(), Some(Vec::new()));
        sink.emit(&aligned(0)).unwrap();
        sink.emit(&aligned(1)).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.0.len(), 2);
        assert_eq!(sink.1.map(|v| v.len()), Some(2));
    }

    #[test]
    fn absent_sink_accepts_everything() {
        let mut sink: Option<Vec<ArticleAlignment>> = None;
        assert!(sink.emit(&aligned(0)).is_ok());
        assert!(sink.finish().is_ok());
    }
}
