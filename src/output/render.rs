use std::collections::BTreeSet;

use crate::types::{AlignmentPair, ArticleAlignment};

/// How aligned articles are turned into text lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    /// Also emit every sentence no pair covers, opposite an empty line.
    pub printempty: bool,
    /// Write the full factored lines instead of the stripped text.
    pub factored: bool,
}

/// One output line pair.
///
/// `source`, `translation` and `target` are the plain sentences used for
/// scoring; `source_out` and `target_out` are what gets written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub source: String,
    pub translation: String,
    pub target: String,
    pub source_out: String,
    pub target_out: String,
    /// False for printempty placeholders.
    pub aligned: bool,
}

struct Sides<'a> {
    source: &'a [String],
    target: &'a [String],
    source_out: &'a [String],
    target_out: &'a [String],
    translation: &'a [String],
}

impl Sides<'_> {
    fn pair(&self, pair: &AlignmentPair) -> RenderedLine {
        RenderedLine {
            source: join(self.source, &pair.source),
            translation: join(self.translation, &pair.source),
            target: join(self.target, &pair.target),
            source_out: join(self.source_out, &pair.source),
            target_out: join(self.target_out, &pair.target),
            aligned: true,
        }
    }

    fn lone_source(&self, id: usize) -> RenderedLine {
        RenderedLine {
            source: self.source[id].clone(),
            translation: String::new(),
            target: String::new(),
            source_out: self.source_out[id].clone(),
            target_out: String::new(),
            aligned: false,
        }
    }

    fn lone_target(&self, id: usize) -> RenderedLine {
        RenderedLine {
            source: String::new(),
            translation: String::new(),
            target: self.target[id].clone(),
            source_out: String::new(),
            target_out: self.target_out[id].clone(),
            aligned: false,
        }
    }
}

/// Renders the pairs of one article in source order.
///
/// With `printempty`, uncovered source sentences below a pair's first
/// source index come first, then uncovered target sentences below its first
/// target index; leftovers follow the last pair.
pub fn render_article(alignment: &ArticleAlignment, options: &OutputOptions) -> Vec<RenderedLine> {
    let article = &alignment.article;
    let factored = article.factored.as_ref().filter(|_| options.factored);
    let sides = Sides {
        source: &article.source,
        target: &article.target,
        source_out: factored.map_or(&article.source, |f| &f.source),
        target_out: factored.map_or(&article.target, |f| &f.target),
        translation: article.translation_view(),
    };

    let mut pairs: Vec<&AlignmentPair> = alignment.multialign.iter().collect();
    pairs.sort_by(|a, b| a.source.cmp(&b.source).then_with(|| a.target.cmp(&b.target)));

    if !options.printempty {
        return pairs.into_iter().map(|pair| sides.pair(pair)).collect();
    }

    let covered_source: BTreeSet<usize> = pairs.iter().flat_map(|p| p.source.iter().copied()).collect();
    let covered_target: BTreeSet<usize> = pairs.iter().flat_map(|p| p.target.iter().copied()).collect();
    let mut next_source = 0;
    let mut next_target = 0;
    let mut lines = Vec::with_capacity(pairs.len());

    for pair in pairs {
        let source_start = pair.source.first().copied().unwrap_or(next_source);
        let target_start = pair.target.first().copied().unwrap_or(next_target);
        for id in next_source..source_start {
            if !covered_source.contains(&id) {
                lines.push(sides.lone_source(id));
            }
        }
        for id in next_target..target_start {
            if !covered_target.contains(&id) {
                lines.push(sides.lone_target(id));
            }
        }
        lines.push(sides.pair(pair));
        next_source = next_source.max(pair.source.last().map_or(next_source, |s| s + 1));
        next_target = next_target.max(pair.target.last().map_or(next_target, |t| t + 1));
    }

    for id in next_source..sides.source.len() {
        if !covered_source.contains(&id) {
            lines.push(sides.lone_source(id));
        }
    }
    for id in next_target..sides.target.len() {
        if !covered_target.contains(&id) {
            lines.push(sides.lone_target(id));
        }
    }
    lines
}

fn join(sentences: &[String], ids: &[usize]) -> String {
    ids.iter()
        .filter_map(|&id| sentences.get(id).map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
