//! End-to-end tests for the executor facade

#![cfg(unix)]

use command_executor::{
    CancellationToken, CommandResponse, Error, Executor, InvocationOptions,
    ProcessExecutionResult, ResponseParser, Result,
};
use std::time::Duration;

/// Counts stdout lines, failing on a non-zero exit
struct LineCount;

impl ResponseParser for LineCount {
    type Output = usize;

    fn parse(&self, result: &ProcessExecutionResult) -> Result<CommandResponse<usize>> {
        if let Some(failed) = CommandResponse::gate(result) {
            return Ok(failed);
        }
        Ok(CommandResponse::ok(result.log_lines(), result.stdout_lines.len()))
    }
}

#[smol_potat::test]
async fn test_run_parses_output() {
    let executor = Executor::default();
    let response = executor
        .run(
            "sh",
            "-c 'echo a; echo b; echo c'",
            &InvocationOptions::new(),
            &LineCount,
        )
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.data, 3);
    assert_eq!(response.log, vec!["a", "b", "c"]);
}

#[smol_potat::test]
async fn test_failed_exit_keeps_log() {
    let executor = Executor::default();
    let response = executor
        .run(
            "sh",
            "-c 'echo out; echo \"no such object\" >&2; exit 1'",
            &InvocationOptions::new(),
            &LineCount,
        )
        .await
        .unwrap();

    assert!(!response.success);
    assert_eq!(response.error, "no such object");
    assert_eq!(response.data, 0);
    assert_eq!(response.log, vec!["out", "no such object"]);
}

#[smol_potat::test]
async fn test_timeout_surfaces_as_failed_response() {
    let executor = Executor::default();
    let response = executor
        .run(
            "sh",
            "-c 'sleep 10'",
            &InvocationOptions::new().with_timeout(Duration::from_millis(150)),
            &LineCount,
        )
        .await
        .unwrap();

    assert!(!response.success);
    assert_eq!(response.error, "Timeout after 150ms");
}

#[smol_potat::test]
async fn test_timed_out_response_keeps_log() {
    let executor = Executor::default();
    let response = executor
        .run(
            "sh",
            "-c 'echo started; sleep 10'",
            &InvocationOptions::new().with_timeout(Duration::from_millis(300)),
            &LineCount,
        )
        .await
        .unwrap();

    assert!(!response.success);
    assert_eq!(response.error, "Timeout after 300ms");
    assert_eq!(response.log, vec!["started"]);
}

#[smol_potat::test]
async fn test_unknown_binary_is_an_error() {
    let executor = Executor::default();
    let result = executor
        .run(
            "definitely-not-a-container-tool-12345",
            "ps",
            &InvocationOptions::new(),
            &LineCount,
        )
        .await;

    assert!(matches!(result, Err(Error::BinaryResolution { .. })));
}

#[test]
fn test_resolver_is_shared_between_clones() {
    let executor = Executor::default();
    let clone = executor.clone();

    let first = executor.resolve("sh");
    let second = clone.resolve("sh");
    assert!(first.is_resolved());
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[smol_potat::test]
async fn test_stream_with_env_and_cwd() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Executor::default();
    let options = InvocationOptions::new()
        .with_cwd(dir.path())
        .with_env("HARNESS_STREAM", "streamed");

    let stream = executor
        .stream_with(
            "sh",
            r#"-c 'echo "$HARNESS_STREAM"; pwd'"#,
            &options,
            CancellationToken::new(),
            Some,
        )
        .unwrap();

    let mut lines = Vec::new();
    while let Some(line) = stream.try_read(Duration::from_secs(5)).await {
        lines.push(line);
    }

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "streamed");
    assert_eq!(
        std::fs::canonicalize(&lines[1]).unwrap(),
        std::fs::canonicalize(dir.path()).unwrap()
    );
}
