//! Splits line-aligned corpus files into articles.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::error::AlignmentError;
use crate::types::{Article, FactoredSides};

pub type LineSource = Box<dyn BufRead + Send>;

/// Opens a corpus file, or stdin for `-`.
pub fn open_input(path: &str) -> Result<LineSource, AlignmentError> {
    if path == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(Path::new(path)).map_err(|e| AlignmentError::io("open corpus file", e))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Yields one [`Article`] per end-of-article marker, plus the article that
/// ends at end of file (possibly empty).
///
/// Translation streams advance in lockstep with the side they translate:
/// one translation line per text line, and one more at the marker. A
/// translation that runs out early reads as empty lines.
pub struct ArticleReader {
    source: LineSource,
    target: LineSource,
    source_to_target: Vec<LineSource>,
    target_to_source: Vec<LineSource>,
    marker: String,
    factored: bool,
    finished: bool,
}

struct SideLines {
    raw: Vec<String>,
    full: Vec<String>,
    translations: Vec<Vec<String>>,
    hit_eof: bool,
}

impl ArticleReader {
    pub fn new(source: LineSource, target: LineSource, marker: impl Into<String>) -> Self {
        Self {
            source,
            target,
            source_to_target: Vec::new(),
            target_to_source: Vec::new(),
            marker: marker.into(),
            factored: false,
            finished: false,
        }
    }

    pub fn with_source_to_target(mut self, translation: LineSource) -> Self {
        self.source_to_target.push(translation);
        self
    }

    pub fn with_target_to_source(mut self, translation: LineSource) -> Self {
        self.target_to_source.push(translation);
        self
    }

    /// Text lines are `word|factor|...`; alignment uses the first factor
    /// of each word and output keeps the full line.
    pub fn factored(mut self, factored: bool) -> Self {
        self.factored = factored;
        self
    }

    fn read_article(&mut self) -> Result<Article, AlignmentError> {
        let source = read_side(
            &mut self.source,
            &mut self.source_to_target,
            &self.marker,
            self.factored,
        )?;
        let target = read_side(
            &mut self.target,
            &mut self.target_to_source,
            &self.marker,
            self.factored,
        )?;
        self.finished = source.hit_eof || target.hit_eof;

        Ok(Article {
            source: source.raw,
            target: target.raw,
            source_to_target: source.translations,
            target_to_source: target.translations,
            factored: self.factored.then_some(FactoredSides {
                source: source.full,
                target: target.full,
            }),
        })
    }
}

impl Iterator for ArticleReader {
    type Item = Result<Article, AlignmentError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let article = self.read_article();
        if article.is_err() {
            self.finished = true;
        }
        Some(article)
    }
}

fn read_side(
    text: &mut LineSource,
    translations: &mut [LineSource],
    marker: &str,
    factored: bool,
) -> Result<SideLines, AlignmentError> {
    let mut side = SideLines {
        raw: Vec::new(),
        full: Vec::new(),
        translations: vec![Vec::new(); translations.len()],
        hit_eof: true,
    };

    while let Some(line) = read_trimmed(text)? {
        if line == marker {
            for stream in translations.iter_mut() {
                read_trimmed(stream)?;
            }
            side.hit_eof = false;
            break;
        }
        for (stream, lines) in translations.iter_mut().zip(side.translations.iter_mut()) {
            lines.push(read_trimmed(stream)?.unwrap_or_default());
        }
        if factored {
            side.raw.push(first_factors(&line));
        }
        side.full.push(line);
    }

    if !factored {
        side.raw = std::mem::take(&mut side.full);
    }
    Ok(side)
}

fn read_trimmed(reader: &mut LineSource) -> Result<Option<String>, AlignmentError> {
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .map_err(|e| AlignmentError::io("read corpus line", e))?;
    if read == 0 {
        return Ok(None);
    }
    line.truncate(line.trim_end().len());
    Ok(Some(line))
}

/// `a|DT|x cat|NN|y` -> `a cat`
pub fn first_factors(line: &str) -> String {
    line.split_whitespace()
        .map(|word| word.split('|').next().unwrap_or(word))
        .collect::<Vec<_>>()
        .join(" ")
}
