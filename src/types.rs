use std::fmt;

use serde::Serialize;

/// One article: both sides of the bitext plus any machine translations.
///
/// Every sequence in `source_to_target` is aligned 1:1 with `source`, every
/// sequence in `target_to_source` with `target`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Article {
    pub source: Vec<String>,
    pub target: Vec<String>,
    pub source_to_target: Vec<Vec<String>>,
    pub target_to_source: Vec<Vec<String>>,
    /// Original factored lines, kept only for output rendering.
    pub factored: Option<FactoredSides>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactoredSides {
    pub source: Vec<String>,
    pub target: Vec<String>,
}

impl Article {
    pub fn new(source: Vec<String>, target: Vec<String>) -> Self {
        Self {
            source,
            target,
            ..Self::default()
        }
    }

    pub fn with_source_to_target(mut self, translation: Vec<String>) -> Self {
        self.source_to_target.push(translation);
        self
    }

    pub fn with_target_to_source(mut self, translation: Vec<String>) -> Self {
        self.target_to_source.push(translation);
        self
    }

    /// An article with an empty side produces no alignments.
    pub fn is_degenerate(&self) -> bool {
        self.source.is_empty() || self.target.is_empty()
    }

    /// Sentences used as the "translation" column of the output: the first
    /// source-to-target translation, or the source itself when none exists.
    pub fn translation_view(&self) -> &[String] {
        self.source_to_target
            .first()
            .map(Vec::as_slice)
            .unwrap_or(&self.source)
    }
}

/// A candidate match for one test sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCandidate {
    pub score: f64,
    pub target: usize,
    /// Clipped n-gram match counts, lowest order first.
    pub correct: Vec<u32>,
}

/// Per test sentence, at most `max_alternatives` candidates sorted by
/// descending score.
pub type ScoreTable = Vec<Vec<ScoreCandidate>>;

/// Stage that committed an alignment pair in a single direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlignMethod {
    Bleu,
    GapFiller,
    GaleChurch,
}

impl AlignMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bleu => "BLEU",
            Self::GapFiller => "GAPFILLER",
            Self::GaleChurch => "GALECHURCH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlignTag {
    Bleu,
    GapFiller,
    GaleChurch,
    /// Both directions agreed; records what each direction used.
    Intersect {
        forward: AlignMethod,
        backward: AlignMethod,
    },
}

impl AlignTag {
    /// The single-direction method behind this tag. For intersected pairs
    /// this is the source-to-target method.
    pub fn method(self) -> AlignMethod {
        match self {
            Self::Bleu => AlignMethod::Bleu,
            Self::GapFiller => AlignMethod::GapFiller,
            Self::GaleChurch => AlignMethod::GaleChurch,
            Self::Intersect { forward, .. } => forward,
        }
    }
}

impl From<AlignMethod> for AlignTag {
    fn from(method: AlignMethod) -> Self {
        match method {
            AlignMethod::Bleu => Self::Bleu,
            AlignMethod::GapFiller => Self::GapFiller,
            AlignMethod::GaleChurch => Self::GaleChurch,
        }
    }
}

impl fmt::Display for AlignTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Intersect { forward, backward } => write!(
                f,
                "INTERSECT: {} - {}",
                forward.as_str(),
                backward.as_str()
            ),
            other => f.write_str(other.method().as_str()),
        }
    }
}

/// Group-to-group correspondence between source and target sentences.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlignmentPair {
    pub source: Vec<usize>,
    pub target: Vec<usize>,
    pub tag: AlignTag,
}

impl AlignmentPair {
    pub fn new(source: Vec<usize>, target: Vec<usize>, tag: AlignTag) -> Self {
        Self {
            source,
            target,
            tag,
        }
    }

    pub fn one_to_one(source: usize, target: usize, tag: AlignTag) -> Self {
        Self::new(vec![source], vec![target], tag)
    }

    /// Swap sides, used when a target-to-source run is folded back.
    pub fn mirrored(&self) -> Self {
        Self::new(self.target.clone(), self.source.clone(), self.tag)
    }

    pub fn same_groups(&self, other: &Self) -> bool {
        self.source == other.source && self.target == other.target
    }
}

/// Final ordered alignment of one article.
pub type Multialign = Vec<AlignmentPair>;

/// Sort pairs by source group, then target group.
pub fn sort_multialign(pairs: &mut Multialign) {
    pairs.sort_by(|a, b| {
        a.source
            .cmp(&b.source)
            .then_with(|| a.target.cmp(&b.target))
    });
}

/// Intermediate state of one alignment run (one direction, one translation).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkingState {
    pub scores: ScoreTable,
    pub bleu_path: Vec<(usize, usize)>,
    pub multialign: Multialign,
}

/// What a worker publishes for one article.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleAlignment {
    pub index: usize,
    pub article: Article,
    pub multialign: Multialign,
    /// State of the last direction run, kept for statistics.
    pub last_run: WorkingState,
}
