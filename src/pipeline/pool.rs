use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam::channel::{self, Receiver, Sender};

use crate::error::AlignmentError;
use crate::pipeline::runtime::SentenceAligner;
use crate::pipeline::traits::AlignmentSink;
use crate::types::{Article, ArticleAlignment};

/// How articles are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// Align and emit one article after the other on the calling thread.
    Inline,
    /// Producer thread, bounded task queue and a fixed pool of workers.
    /// Results are reordered before they reach the sink.
    Threaded { workers: usize },
}

impl Execution {
    pub fn for_workers(workers: usize) -> Self {
        if workers <= 1 {
            Self::Inline
        } else {
            Self::Threaded { workers }
        }
    }
}

enum Task {
    Align { index: usize, article: Article },
    Shutdown,
}

type Outcome = (usize, Result<ArticleAlignment, AlignmentError>);

/// Runs a corpus through a [`SentenceAligner`] and emits every article in
/// input order.
///
/// The first failure of any article is fatal: the producer stops reading,
/// workers drop the tasks still queued and the error is returned once every
/// thread has been joined.
pub struct AlignmentPool<'a> {
    aligner: &'a SentenceAligner,
    execution: Execution,
    queue_capacity: usize,
}

impl<'a> AlignmentPool<'a> {
    pub fn new(aligner: &'a SentenceAligner, execution: Execution) -> Self {
        Self {
            aligner,
            execution,
            queue_capacity: aligner.config().queue_capacity(),
        }
    }

    /// Aligns every article and returns how many were emitted.
    pub fn run<I, S>(&self, articles: I, sink: &mut S) -> Result<usize, AlignmentError>
    where
        I: IntoIterator<Item = Result<Article, AlignmentError>>,
        I::IntoIter: Send,
        S: AlignmentSink + ?Sized,
    {
        let emitted = match self.execution {
            Execution::Inline => self.run_inline(articles.into_iter(), sink)?,
            Execution::Threaded { workers } => {
                self.run_threaded(articles.into_iter(), workers.max(1), sink)?
            }
        };
        sink.finish()?;
        tracing::info!(articles = emitted, "corpus aligned");
        Ok(emitted)
    }

    fn run_inline<I, S>(&self, articles: I, sink: &mut S) -> Result<usize, AlignmentError>
    where
        I: Iterator<Item = Result<Article, AlignmentError>>,
        S: AlignmentSink + ?Sized,
    {
        let mut emitted = 0;
        for (index, article) in articles.enumerate() {
            let aligned = align_guarded(self.aligner, index, &article?)?;
            sink.emit(&aligned)?;
            emitted += 1;
        }
        Ok(emitted)
    }

    fn run_threaded<I, S>(
        &self,
        articles: I,
        workers: usize,
        sink: &mut S,
    ) -> Result<usize, AlignmentError>
    where
        I: Iterator<Item = Result<Article, AlignmentError>> + Send,
        S: AlignmentSink + ?Sized,
    {
        tracing::info!(workers, queue = self.queue_capacity, "starting alignment workers");
        let cancel = AtomicBool::new(false);
        let (task_tx, task_rx) = channel::bounded::<Task>(self.queue_capacity);
        let (result_tx, result_rx) = channel::unbounded::<Outcome>();
        let aligner = self.aligner;

        thread::scope(|s| {
            let cancel = &cancel;
            let producer = s.spawn(move || produce(articles, task_tx, workers, cancel));
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let task_rx = task_rx.clone();
                    let result_tx = result_tx.clone();
                    s.spawn(move || work(worker, aligner, task_rx, result_tx, cancel))
                })
                .collect();
            drop(task_rx);
            drop(result_tx);

            let mut ordered = OrderedEmitter::new(sink);
            let mut failure = None;
            for (index, outcome) in result_rx.iter() {
                if failure.is_some() {
                    continue;
                }
                let emitted = outcome.and_then(|aligned| ordered.push(aligned));
                if let Err(err) = emitted {
                    tracing::error!(article = index, error = %err, "aborting run");
                    cancel.store(true, Ordering::SeqCst);
                    failure = Some(err);
                }
            }

            let produced = producer
                .join()
                .map_err(|_| AlignmentError::runtime("producer", "thread panicked"))?;
            for handle in handles {
                handle
                    .join()
                    .map_err(|_| AlignmentError::runtime("worker", "thread panicked"))?;
            }
            if let Some(err) = failure {
                return Err(err);
            }
            let produced = produced?;
            if ordered.next != produced || !ordered.pending.is_empty() {
                return Err(AlignmentError::runtime(
                    "reorder",
                    format!(
                        "{} of {produced} articles emitted, {} still pending",
                        ordered.next,
                        ordered.pending.len()
                    ),
                ));
            }
            Ok(ordered.next)
        })
    }
}

/// Reads articles into the task queue, then sends one shutdown per worker.
fn produce<I>(
    articles: I,
    tasks: Sender<Task>,
    workers: usize,
    cancel: &AtomicBool,
) -> Result<usize, AlignmentError>
where
    I: Iterator<Item = Result<Article, AlignmentError>>,
{
    let mut produced = 0;
    let mut outcome = Ok(());
    for (index, article) in articles.enumerate() {
        if cancel.load(Ordering::SeqCst) {
            break;
        }
        match article {
            Ok(article) => {
                if tasks.send(Task::Align { index, article }).is_err() {
                    break;
                }
                produced += 1;
            }
            Err(err) => {
                cancel.store(true, Ordering::SeqCst);
                outcome = Err(err);
                break;
            }
        }
    }
    for _ in 0..workers {
        if tasks.send(Task::Shutdown).is_err() {
            break;
        }
    }
    tracing::debug!(articles = produced, "producer finished");
    outcome.map(|()| produced)
}

fn work(
    worker: usize,
    aligner: &SentenceAligner,
    tasks: Receiver<Task>,
    results: Sender<Outcome>,
    cancel: &AtomicBool,
) {
    let mut processed = 0usize;
    while let Ok(task) = tasks.recv() {
        let Task::Align { index, article } = task else {
            break;
        };
        if cancel.load(Ordering::SeqCst) {
            continue;
        }
        let outcome = align_guarded(aligner, index, &article);
        processed += 1;
        if results.send((index, outcome)).is_err() {
            break;
        }
    }
    tracing::debug!(worker, articles = processed, "worker stopped");
}

/// Aligns one article, turning errors and panics into a worker failure
/// carrying the article index.
fn align_guarded(
    aligner: &SentenceAligner,
    index: usize,
    article: &Article,
) -> Result<ArticleAlignment, AlignmentError> {
    match panic::catch_unwind(AssertUnwindSafe(|| aligner.align_article(index, article))) {
        Ok(Ok(aligned)) => Ok(aligned),
        Ok(Err(err)) => Err(AlignmentError::worker(index, err)),
        Err(_) => Err(AlignmentError::worker(index, "alignment panicked")),
    }
}

/// Holds finished articles until every earlier one has been emitted.
struct OrderedEmitter<'s, S: ?Sized> {
    sink: &'s mut S,
    next: usize,
    pending: BTreeMap<usize, ArticleAlignment>,
}

impl<'s, S: AlignmentSink + ?Sized> OrderedEmitter<'s, S> {
    fn new(sink: &'s mut S) -> Self {
        Self {
            sink,
            next: 0,
            pending: BTreeMap::new(),
        }
    }

    fn push(&mut self, aligned: ArticleAlignment) -> Result<(), AlignmentError> {
        self.pending.insert(aligned.index, aligned);
        while let Some(ready) = self.pending.remove(&self.next) {
            self.sink.emit(&ready)?;
            self.next += 1;
        }
        Ok(())
    }
}
