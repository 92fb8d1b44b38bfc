// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests for the log file receiver over real files.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tower::BoxError;

use logsaw::model::{Level, LogEvent, APPLICATION_KEY, HOSTNAME_KEY};
use logsaw::receivers::logfile::{LogFileReceiver, LogFileReceiverConfig};
use logsaw::receivers::output::{event_channel, EventStream};

fn xml_event(logger: &str, level: &str, message: &str) -> String {
    format!(
        r#"<log4j:event logger="{}" timestamp="1714557600000" level="{}" thread="main">
<log4j:message><![CDATA[{}]]></log4j:message>
<log4j:properties>
<log4j:data name="hostname" value="original-host"/>
<log4j:data name="application" value="original-app"/>
</log4j:properties>
</log4j:event>
"#,
        logger, level, message
    )
}

fn write_log(dir: &TempDir, name: &str, content: &str) -> (PathBuf, String) {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    let url = format!("file://{}", path.display());
    (path, url)
}

async fn start_receiver(
    config: LogFileReceiverConfig,
    task_set: &mut JoinSet<Result<(), BoxError>>,
    cancel: &CancellationToken,
) -> EventStream<LogEvent> {
    let (output, stream) = event_channel(64);
    let receiver = LogFileReceiver::new(config, Some(output)).unwrap();
    receiver.start(task_set, cancel).await;
    stream
}

/// Collect forwarded events until the receiver finishes and drops the
/// output, or the timeout expires.
async fn collect_events(stream: &mut EventStream<LogEvent>) -> Vec<LogEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = timeout(Duration::from_secs(5), stream.next()).await {
        events.push(event);
    }
    events
}

async fn drain(task_set: &mut JoinSet<Result<(), BoxError>>) {
    while let Some(result) = task_set.join_next().await {
        result.unwrap().unwrap();
    }
}

#[tokio::test]
async fn static_file_forwards_all_events_in_order() {
    let dir = TempDir::new().unwrap();
    let content = format!(
        "{}{}{}<log4j:event logger=\"d.bare\" timestamp=\"1714557600000\" level=\"INFO\"><log4j:message>four</log4j:message></log4j:event>\n",
        xml_event("a.first", "INFO", "one"),
        xml_event("b.second", "WARN", "two"),
        xml_event("c.third", "ERROR", "three"),
    );
    let (path, url) = write_log(&dir, "app.xml", &content);

    let mut task_set = JoinSet::new();
    let cancel = CancellationToken::new();
    let mut stream = start_receiver(LogFileReceiverConfig::new(&url), &mut task_set, &cancel).await;

    let events = collect_events(&mut stream).await;
    assert_eq!(events.len(), 4);
    assert_eq!(
        events.iter().map(|e| e.message.as_str()).collect::<Vec<_>>(),
        vec!["one", "two", "three", "four"]
    );

    // host/application rewritten where originally present
    for event in &events[..3] {
        assert_eq!(event.property(HOSTNAME_KEY), Some("file"));
        assert_eq!(
            event.property(APPLICATION_KEY),
            Some(path.to_str().unwrap())
        );
    }
    // untouched when the event never carried them
    assert_eq!(events[3].property(HOSTNAME_KEY), None);
    assert_eq!(events[3].property(APPLICATION_KEY), None);

    drain(&mut task_set).await;
}

#[tokio::test]
async fn filter_rejecting_everything_forwards_nothing() {
    let dir = TempDir::new().unwrap();
    let content = format!(
        "{}{}{}",
        xml_event("a", "INFO", "one"),
        xml_event("b", "WARN", "two"),
        xml_event("c", "ERROR", "three"),
    );
    let (_path, url) = write_log(&dir, "app.xml", &content);

    let mut task_set = JoinSet::new();
    let cancel = CancellationToken::new();
    let config =
        LogFileReceiverConfig::new(&url).with_filter_expression(Some("level > FATAL".to_string()));
    let mut stream = start_receiver(config, &mut task_set, &cancel).await;

    assert!(collect_events(&mut stream).await.is_empty());
    drain(&mut task_set).await;
}

#[tokio::test]
async fn filter_keeps_only_matching_events() {
    let dir = TempDir::new().unwrap();
    let content = format!(
        "{}{}{}",
        xml_event("a", "INFO", "one"),
        xml_event("b", "ERROR", "two"),
        xml_event("c", "DEBUG", "three"),
    );
    let (_path, url) = write_log(&dir, "app.xml", &content);

    let mut task_set = JoinSet::new();
    let cancel = CancellationToken::new();
    let config = LogFileReceiverConfig::new(&url)
        .with_filter_expression(Some("level >= ERROR".to_string()));
    let mut stream = start_receiver(config, &mut task_set, &cancel).await;

    let events = collect_events(&mut stream).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message, "two");
    assert_eq!(events[0].level, Level::Error);

    drain(&mut task_set).await;
}

#[tokio::test]
async fn invalid_filter_expression_disables_filtering() {
    let dir = TempDir::new().unwrap();
    let (_path, url) = write_log(&dir, "app.xml", &xml_event("a", "INFO", "one"));

    let mut task_set = JoinSet::new();
    let cancel = CancellationToken::new();
    let config = LogFileReceiverConfig::new(&url)
        .with_filter_expression(Some("this is !! not an expression ((".to_string()));
    let mut stream = start_receiver(config, &mut task_set, &cancel).await;

    assert_eq!(collect_events(&mut stream).await.len(), 1);
    drain(&mut task_set).await;
}

#[tokio::test]
async fn unknown_decoder_forwards_nothing() {
    let dir = TempDir::new().unwrap();
    let (_path, url) = write_log(&dir, "app.xml", &xml_event("a", "INFO", "one"));

    let mut task_set = JoinSet::new();
    let cancel = CancellationToken::new();
    let config = LogFileReceiverConfig::new(&url).with_decoder("com.example.NoSuchDecoder");
    let mut stream = start_receiver(config, &mut task_set, &cancel).await;

    // start() completed without panicking; the worker bails out and the
    // stream closes without ever carrying an event
    assert!(collect_events(&mut stream).await.is_empty());
    drain(&mut task_set).await;
}

#[tokio::test]
async fn missing_file_forwards_nothing() {
    let dir = TempDir::new().unwrap();
    let url = format!("file://{}", dir.path().join("nope.xml").display());

    let mut task_set = JoinSet::new();
    let cancel = CancellationToken::new();
    let mut stream =
        start_receiver(LogFileReceiverConfig::new(&url), &mut task_set, &cancel).await;

    assert!(collect_events(&mut stream).await.is_empty());
    drain(&mut task_set).await;
}

#[tokio::test]
async fn tailing_picks_up_appended_events() {
    let dir = TempDir::new().unwrap();
    let (path, url) = write_log(&dir, "app.xml", &xml_event("a.first", "INFO", "one"));

    let mut task_set = JoinSet::new();
    let cancel = CancellationToken::new();
    let config = LogFileReceiverConfig::new(&url)
        .with_tailing(true)
        .with_poll_interval(Duration::from_millis(50));
    let mut stream = start_receiver(config, &mut task_set, &cancel).await;

    let first = timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.message, "one");

    append(&path, &xml_event("a.second", "WARN", "two"));
    let second = timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.message, "two");

    // cancellation is the stop signal for the tail loop
    cancel.cancel();
    drain(&mut task_set).await;
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn current_thread_mode_processes_before_returning() {
    let dir = TempDir::new().unwrap();
    let content = format!(
        "{}{}",
        xml_event("a", "INFO", "one"),
        xml_event("b", "WARN", "two")
    );
    let (_path, url) = write_log(&dir, "app.xml", &content);

    let mut task_set = JoinSet::new();
    let cancel = CancellationToken::new();
    let config = LogFileReceiverConfig::new(&url).with_use_current_thread(true);
    let mut stream = start_receiver(config, &mut task_set, &cancel).await;

    // start() already ran the whole loop on this task
    assert_eq!(stream.len(), 2);
    assert_eq!(stream.next().await.unwrap().message, "one");
    assert_eq!(stream.next().await.unwrap().message, "two");
    assert!(stream.next().await.is_none());

    drain(&mut task_set).await;
}

#[tokio::test]
async fn json_decoder_end_to_end() {
    let dir = TempDir::new().unwrap();
    let content = concat!(
        r#"{"timestamp":"2024-05-01T10:00:00Z","level":"INFO","logger":"a.b","message":"one","properties":{"hostname":"original"}}"#,
        "\n",
        r#"{"timestamp":"2024-05-01T10:00:01Z","level":"ERROR","logger":"a.c","message":"two"}"#,
        "\n",
    );
    let (_path, url) = write_log(&dir, "events.json", content);

    let mut task_set = JoinSet::new();
    let cancel = CancellationToken::new();
    let config = LogFileReceiverConfig::new(&url).with_decoder("json");
    let mut stream = start_receiver(config, &mut task_set, &cancel).await;

    let events = collect_events(&mut stream).await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].logger, "a.b");
    assert_eq!(events[0].property(HOSTNAME_KEY), Some("file"));
    assert_eq!(events[1].property(HOSTNAME_KEY), None);

    drain(&mut task_set).await;
}

fn append(path: &Path, content: &str) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
}
