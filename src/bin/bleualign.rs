use std::path::PathBuf;
use std::time::Duration;

use bleualign::config::{AlignerConfig, GapFillHeuristic};
use bleualign::corpus::{open_input, ArticleReader};
use bleualign::evaluation::{load_gold, GoldEvaluator};
use bleualign::output::{
    AlignedTextSink, BleuFilter, FilterMode, FilterOptions, OutputOptions, PairWriter,
};
use bleualign::pipeline::pool::{AlignmentPool, Execution};
use bleualign::pipeline::traits::AlignmentSink;
use bleualign::{AlignmentError, ArticleAlignment, SentenceAlignerBuilder};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "bleualign")]
#[command(about = "Align parallel texts sentence by sentence, using machine translations as a bridge")]
struct Args {
    /// Source text, one sentence per line (`-` for stdin).
    #[arg(short, long)]
    source: String,
    /// Target text, one sentence per line (`-` for stdin).
    #[arg(short, long)]
    target: String,
    /// Translation of the source text into the target language. May be
    /// repeated; `-` aligns source and target directly.
    #[arg(long = "srctotarget")]
    source_to_target: Vec<String>,
    /// Translation of the target text into the source language. May be
    /// repeated.
    #[arg(long = "targettosrc")]
    target_to_source: Vec<String>,
    /// Write NAME-s and NAME-t instead of tab-separated lines on stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// JSON file with aligner settings; flags below override it.
    #[arg(long, env = "BLEUALIGN_CONFIG")]
    config: Option<PathBuf>,
    /// Input lines are `word|factor|...`; align on the first factor.
    #[arg(long)]
    factored: bool,
    /// Split output into good and bad alignments by BLEU score
    /// (`sentences` or `articles`).
    #[arg(short, long)]
    filter: Option<FilterMode>,
    /// Percentage of lines kept as good when filtering.
    #[arg(long = "filterthreshold", default_value_t = FilterOptions::DEFAULT_THRESHOLD)]
    filter_threshold: f64,
    /// Also reject units whose source is closer to the target than its
    /// translation.
    #[arg(long = "filterlang")]
    filter_lang: bool,
    /// Align by sentence length only.
    #[arg(long = "galechurch")]
    gale_church: bool,
    /// Emit unaligned sentences opposite an empty line.
    #[arg(long = "printempty")]
    print_empty: bool,
    /// Gold alignment (JSON) to evaluate against.
    #[arg(long)]
    eval: Option<PathBuf>,
    /// Where to write the evaluation report as JSON.
    #[arg(long = "eval-report", requires = "eval")]
    eval_report: Option<PathBuf>,
    #[arg(long = "ngram-order")]
    ngram_order: Option<usize>,
    #[arg(long = "max-alternatives")]
    max_alternatives: Option<usize>,
    #[arg(long = "nto1")]
    n_to_1: Option<usize>,
    /// Gap-filling heuristics to enable (`bleu1to1`, `galechurch`).
    #[arg(long = "gapfill", value_delimiter = ',')]
    gap_fill: Option<Vec<GapFillHeuristic>>,
    /// End-of-article marker line.
    #[arg(long)]
    marker: Option<String>,
    /// Worker threads; 1 aligns on the main thread.
    #[arg(short = 'j', long)]
    workers: Option<usize>,
    /// 0 warnings, 1 progress, 2 statistics, 3 every decision.
    #[arg(short, long, default_value_t = 1)]
    verbosity: u8,
}

/// Ticks the spinner after each article reaches the output.
struct ProgressSink<S> {
    inner: S,
    progress: ProgressBar,
}

impl<S: AlignmentSink> AlignmentSink for ProgressSink<S> {
    fn emit(&mut self, alignment: &ArticleAlignment) -> Result<(), AlignmentError> {
        self.inner.emit(alignment)?;
        self.progress.inc(1);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), AlignmentError> {
        self.inner.finish()?;
        self.progress.finish_with_message("done");
        Ok(())
    }
}

fn main() {
    if let Err(err) = run() {
        tracing::error!(error = %err, "alignment failed");
        eprintln!("bleualign: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn aligner_config(args: &Args) -> Result<AlignerConfig, AlignmentError> {
    let mut config = match &args.config {
        Some(path) => AlignerConfig::load(path)?,
        None => AlignerConfig::default(),
    };
    if let Some(ngram_order) = args.ngram_order {
        config.ngram_order = ngram_order;
    }
    if let Some(max_alternatives) = args.max_alternatives {
        config.max_alternatives = max_alternatives;
    }
    if let Some(n_to_1) = args.n_to_1 {
        config.n_to_1 = n_to_1;
    }
    if let Some(heuristics) = &args.gap_fill {
        config.gap_fill_heuristics = heuristics.iter().copied().collect();
    }
    if let Some(marker) = &args.marker {
        config.end_of_article_marker = marker.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.gale_church_only |= args.gale_church;
    if args.source_to_target.iter().any(|path| path == "-") {
        config.no_translation_override = true;
    }
    Ok(config)
}

fn run() -> Result<(), AlignmentError> {
    let args = Args::parse();
    init_logging(args.verbosity);

    let config = aligner_config(&args)?;
    let source_to_target: Vec<&String> =
        args.source_to_target.iter().filter(|path| *path != "-").collect();
    if !args.target_to_source.is_empty() && source_to_target.is_empty() {
        return Err(AlignmentError::Config {
            message: "--targettosrc requires at least one --srctotarget translation".to_string(),
        });
    }
    config.validate_inputs(source_to_target.len(), args.target_to_source.len())?;

    let stdin_inputs = [&args.source, &args.target]
        .into_iter()
        .chain(source_to_target.iter().copied())
        .chain(&args.target_to_source)
        .filter(|path| *path == "-")
        .count();
    if stdin_inputs > 1 {
        return Err(AlignmentError::Config {
            message: "only one input can be read from stdin".to_string(),
        });
    }

    let filter = match args.filter {
        Some(mode) => {
            let options = FilterOptions {
                mode,
                threshold: args.filter_threshold,
                filterlang: args.filter_lang,
                ngram_order: config.ngram_order,
            };
            options.validate()?;
            Some(BleuFilter::new(options))
        }
        None => None,
    };

    let output_options = OutputOptions {
        printempty: args.print_empty,
        factored: args.factored,
    };
    let text_sink = match (&args.output, filter) {
        (Some(base), Some(filter)) => AlignedTextSink::new(
            PairWriter::create_files(base, "")?,
            output_options,
        )
        .with_filter(filter, PairWriter::create_files(base, "-bad")?),
        (Some(base), None) => {
            AlignedTextSink::new(PairWriter::create_files(base, "")?, output_options)
        }
        (None, Some(_)) => {
            return Err(AlignmentError::Config {
                message: "--filter needs --output to write the good and bad files".to_string(),
            })
        }
        (None, None) => AlignedTextSink::new(PairWriter::stdout(), output_options),
    };

    let evaluator = match &args.eval {
        Some(path) => {
            let evaluator = GoldEvaluator::new(load_gold(path)?);
            Some(match &args.eval_report {
                Some(report) => evaluator.with_report_path(report),
                None => evaluator,
            })
        }
        None => None,
    };

    let mut reader = ArticleReader::new(
        open_input(&args.source)?,
        open_input(&args.target)?,
        config.end_of_article_marker.clone(),
    )
    .factored(args.factored);
    for path in source_to_target {
        reader = reader.with_source_to_target(open_input(path)?);
    }
    for path in &args.target_to_source {
        reader = reader.with_target_to_source(open_input(path)?);
    }

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {pos} articles aligned {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.enable_steady_tick(Duration::from_millis(120));
    if args.verbosity == 0 {
        progress.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let execution = Execution::for_workers(config.workers);
    let aligner = SentenceAlignerBuilder::new(config).build()?;
    let mut sink = (
        ProgressSink {
            inner: text_sink,
            progress: progress.clone(),
        },
        evaluator,
    );
    let result = AlignmentPool::new(&aligner, execution).run(reader, &mut sink);
    if result.is_err() {
        progress.abandon_with_message("failed");
    }
    let articles = result?;
    tracing::info!(
        articles,
        lines = sink.0.inner.lines(),
        "alignment written"
    );
    Ok(())
}
