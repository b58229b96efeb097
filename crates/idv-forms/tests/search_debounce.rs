mod common;

use std::time::Duration;

use idv_forms::prelude::*;

const WINDOW: Duration = Duration::from_millis(500);

fn names() -> Vec<String> {
    common::schema().provider_names().map(str::to_string).collect()
}

#[tokio::test(start_paused = true)]
async fn test_burst_within_window_evaluates_once() {
    let search = SearchFilter::spawn(names(), WINDOW);
    let mut results = search.results();

    search.input("a");
    tokio::time::sleep(Duration::from_millis(40)).await;
    search.input("ab");
    tokio::time::sleep(Duration::from_millis(40)).await;
    search.input("abc");

    results.changed().await.unwrap();
    let result = results.borrow_and_update().clone();
    assert_eq!(result.evaluation, 1);
    assert_eq!(result.query, "abc");
    assert!(result.matches.is_empty());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(search.current().evaluation, 1);
}

#[tokio::test(start_paused = true)]
async fn test_pause_longer_than_window_evaluates_twice() {
    let search = SearchFilter::spawn(names(), WINDOW);

    search.input("a");
    tokio::time::sleep(Duration::from_millis(600)).await;
    let first = search.current();
    assert_eq!(first.evaluation, 1);
    assert_eq!(first.query, "a");
    assert_eq!(
        first.matches,
        vec!["TD Canada Trust", "Royal Bank of Canada", "Scotiabank"]
    );

    search.input("ab");
    tokio::time::sleep(Duration::from_millis(600)).await;
    let second = search.current();
    assert_eq!(second.evaluation, 2);
    assert_eq!(second.query, "ab");
    assert_eq!(second.matches, vec!["Scotiabank"]);
}

#[tokio::test(start_paused = true)]
async fn test_each_input_restarts_the_window() {
    let search = SearchFilter::spawn(names(), WINDOW);
    for text in ["b", "bm", "bmo", "bm", "b"] {
        search.input(text);
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(search.current().evaluation, 0);
    }
    tokio::time::sleep(Duration::from_millis(200)).await;
    let result = search.current();
    assert_eq!(result.evaluation, 1);
    assert_eq!(result.query, "b");
    assert_eq!(result.matches, vec!["Royal Bank of Canada", "Scotiabank", "BMO"]);
}

#[tokio::test(start_paused = true)]
async fn test_empty_input_restores_full_list() {
    let search = SearchFilter::spawn(names(), WINDOW);
    search.input("scotia");
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(search.current().matches, vec!["Scotiabank"]);

    search.input("");
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(search.current().matches, names());
}

#[tokio::test(start_paused = true)]
async fn test_session_search_uses_configured_window() {
    let recorder = common::Recorder::new(common::OnAccepted::Complete);
    let config = FormConfig::new().search_debounce_ms(100);
    let mut session = FormSession::new(config, recorder.clone(), recorder);
    session.load_schema(common::schema()).unwrap();

    let search = session.search_filter();
    search.input("TD");
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(search.current().matches, vec!["TD Canada Trust"]);
}
