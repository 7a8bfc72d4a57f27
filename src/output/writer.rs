use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::AlignmentError;
use crate::output::filter::{BleuFilter, OutputLine};
use crate::output::render::{render_article, OutputOptions};
use crate::pipeline::traits::AlignmentSink;
use crate::types::ArticleAlignment;

pub type LineWriter = Box<dyn Write + Send>;

/// Destination for aligned line pairs.
pub enum PairWriter {
    /// Source and target lines go to two parallel streams.
    Split { source: LineWriter, target: LineWriter },
    /// One `source<TAB>target` line per pair.
    Tabbed(LineWriter),
}

impl PairWriter {
    /// `NAME-s` and `NAME-t` next to `base` (`suffix` is inserted before
    /// the side letter, e.g. `-bad`).
    pub fn create_files(base: &Path, suffix: &str) -> Result<Self, AlignmentError> {
        Ok(Self::Split {
            source: create(&side_path(base, suffix, "s"))?,
            target: create(&side_path(base, suffix, "t"))?,
        })
    }

    pub fn stdout() -> Self {
        Self::Tabbed(Box::new(BufWriter::new(io::stdout())))
    }

    pub fn write_pair(&mut self, source: &str, target: &str) -> Result<(), AlignmentError> {
        let written = match self {
            Self::Split {
                source: source_out,
                target: target_out,
            } => writeln!(source_out, "{source}").and_then(|()| writeln!(target_out, "{target}")),
            Self::Tabbed(out) => writeln!(out, "{source}\t{target}"),
        };
        written.map_err(|e| AlignmentError::io("write aligned lines", e))
    }

    fn write_lines(&mut self, lines: &[OutputLine]) -> Result<(), AlignmentError> {
        for line in lines {
            self.write_pair(&line.source, &line.target)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), AlignmentError> {
        let flushed = match self {
            Self::Split { source, target } => source.flush().and_then(|()| target.flush()),
            Self::Tabbed(out) => out.flush(),
        };
        flushed.map_err(|e| AlignmentError::io("flush aligned lines", e))
    }
}

pub fn side_path(base: &Path, suffix: &str, side: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!("{suffix}-{side}"));
    PathBuf::from(name)
}

fn create(path: &Path) -> Result<LineWriter, AlignmentError> {
    let file = File::create(path).map_err(|e| AlignmentError::io("create output file", e))?;
    tracing::debug!(path = %path.display(), "output file created");
    Ok(Box::new(BufWriter::new(file)))
}

/// Renders every article and writes it, either directly or through a
/// [`BleuFilter`] that holds lines back until the corpus is complete.
pub struct AlignedTextSink {
    good: PairWriter,
    bad: Option<PairWriter>,
    options: OutputOptions,
    filter: Option<BleuFilter>,
    lines: usize,
}

impl AlignedTextSink {
    pub fn new(good: PairWriter, options: OutputOptions) -> Self {
        Self {
            good,
            bad: None,
            options,
            filter: None,
            lines: 0,
        }
    }

    /// Filtered lines below the threshold go to `bad`.
    pub fn with_filter(mut self, filter: BleuFilter, bad: PairWriter) -> Self {
        self.filter = Some(filter);
        self.bad = Some(bad);
        self
    }

    /// Line pairs rendered so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    fn write_bad(&mut self, lines: &[OutputLine]) -> Result<(), AlignmentError> {
        match self.bad.as_mut() {
            Some(bad) => bad.write_lines(lines),
            None => Ok(()),
        }
    }
}

impl AlignmentSink for AlignedTextSink {
    fn emit(&mut self, alignment: &ArticleAlignment) -> Result<(), AlignmentError> {
        let rendered = render_article(alignment, &self.options);
        self.lines += rendered.len();
        match self.filter.as_mut() {
            Some(filter) => {
                let rejected = filter.add_article(&rendered);
                if !rejected.is_empty() {
                    tracing::debug!(
                        article = alignment.index,
                        lines = rejected.len(),
                        "language check rejected lines"
                    );
                }
                self.write_bad(&rejected)
            }
            None => {
                for line in &rendered {
                    self.good.write_pair(&line.source_out, &line.target_out)?;
                }
                Ok(())
            }
        }
    }

    fn finish(&mut self) -> Result<(), AlignmentError> {
        if let Some(filter) = self.filter.take() {
            let outcome = filter.finish();
            if let Some(average_score) = outcome.average_score {
                tracing::info!(average_score, "average BLEU score of the corpus");
            }
            tracing::info!(
                good = outcome.good.len(),
                bad = outcome.bad.len(),
                "filtered lines written"
            );
            self.good.write_lines(&outcome.good)?;
            self.write_bad(&outcome.bad)?;
        }
        self.good.flush()?;
        if let Some(bad) = self.bad.as_mut() {
            bad.flush()?;
        }
        Ok(())
    }
}
