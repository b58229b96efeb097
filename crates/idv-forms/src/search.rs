//! Debounced provider search.
//!
//! Inputs are fed to a single worker task. The worker waits for a quiet
//! period after each input and evaluates only the latest one; inputs
//! superseded within the window are dropped without being evaluated. Only
//! one evaluation is ever pending and evaluations never overlap.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

/// Returns the names containing `query`, ignoring case. An empty query
/// matches every name.
pub fn filter_names(names: &[String], query: &str) -> Vec<String> {
    if query.is_empty() {
        return names.to_vec();
    }
    let needle = query.to_lowercase();
    names
        .iter()
        .filter(|name| name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// The published result of the latest evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterResult {
    /// The input that was evaluated.
    pub query: String,
    /// Matching names, in schema order.
    pub matches: Vec<String>,
    /// Number of evaluations performed so far; zero for the initial list.
    pub evaluation: u64,
}

/// Handle to a running debounced search.
///
/// Dropping the handle stops the worker once any pending input is flushed.
#[derive(Debug)]
pub struct SearchFilter {
    inputs: mpsc::UnboundedSender<String>,
    results: watch::Receiver<FilterResult>,
    worker: JoinHandle<()>,
}

impl SearchFilter {
    /// Starts a search worker over `names` on the current tokio runtime.
    pub fn spawn(names: Vec<String>, window: Duration) -> Self {
        let names: Arc<[String]> = names.into();
        let (inputs, rx) = mpsc::unbounded_channel();
        let (tx, results) = watch::channel(FilterResult {
            query: String::new(),
            matches: names.to_vec(),
            evaluation: 0,
        });
        let worker = tokio::spawn(run(names, window, rx, tx));
        Self {
            inputs,
            results,
            worker,
        }
    }

    /// Submits a raw search input, restarting the quiet period.
    pub fn input(&self, text: impl Into<String>) {
        // The worker only exits after every sender is gone.
        let _ = self.inputs.send(text.into());
    }

    /// Returns a receiver of evaluation results.
    pub fn results(&self) -> watch::Receiver<FilterResult> {
        self.results.clone()
    }

    /// Returns the latest evaluation result.
    pub fn current(&self) -> FilterResult {
        self.results.borrow().clone()
    }

    /// Flushes any pending input and waits for the worker to finish.
    pub async fn shutdown(self) -> FilterResult {
        let Self {
            inputs,
            results,
            worker,
        } = self;
        drop(inputs);
        if let Err(err) = worker.await {
            debug!(error = %err, "search worker ended abnormally");
        }
        let latest = results.borrow().clone();
        latest
    }
}

async fn run(
    names: Arc<[String]>,
    window: Duration,
    mut inputs: mpsc::UnboundedReceiver<String>,
    results: watch::Sender<FilterResult>,
) {
    let mut evaluation = 0;

    while let Some(first) = inputs.recv().await {
        let mut latest = first;
        let closed = loop {
            tokio::select! {
                next = inputs.recv() => match next {
                    Some(text) => latest = text,
                    None => break true,
                },
                () = tokio::time::sleep(window) => break false,
            }
        };

        evaluation += 1;
        let matches = filter_names(&names, &latest);
        debug!(query = %latest, matches = matches.len(), evaluation, "search evaluated");
        results.send_replace(FilterResult {
            query: latest,
            matches,
            evaluation,
        });

        if closed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        ["Royal Bank", "TD Canada Trust", "Scotiabank", "BMO"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_filter_names_case_insensitive() {
        assert_eq!(filter_names(&names(), "BANK"), vec!["Royal Bank", "Scotiabank"]);
        assert_eq!(filter_names(&names(), "td c"), vec!["TD Canada Trust"]);
        assert!(filter_names(&names(), "credit union").is_empty());
    }

    #[test]
    fn test_filter_names_empty_query() {
        assert_eq!(filter_names(&names(), ""), names());
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_result_is_full_list() {
        let search = SearchFilter::spawn(names(), Duration::from_millis(500));
        let current = search.current();
        assert_eq!(current.matches, names());
        assert_eq!(current.evaluation, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_evaluates_latest_only() {
        let search = SearchFilter::spawn(names(), Duration::from_millis(500));
        for text in ["s", "sc", "sco"] {
            search.input(text);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tokio::time::sleep(Duration::from_millis(600)).await;

        let current = search.current();
        assert_eq!(current.evaluation, 1);
        assert_eq!(current.query, "sco");
        assert_eq!(current.matches, vec!["Scotiabank"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_evaluated_inside_window() {
        let search = SearchFilter::spawn(names(), Duration::from_millis(500));
        search.input("bmo");
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(search.current().evaluation, 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(search.current().evaluation, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending_input() {
        let search = SearchFilter::spawn(names(), Duration::from_millis(500));
        search.input("royal");
        let last = search.shutdown().await;
        assert_eq!(last.evaluation, 1);
        assert_eq!(last.matches, vec!["Royal Bank"]);
    }
}
