use anyhow::{Context, Result};
use command_executor::{CancellationToken, Executor};
use std::time::{Duration, Instant};
use tracing::info;

/// How long a single read waits before the deadline is checked again
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub async fn run(
    executor: &Executor,
    name: &str,
    args: &str,
    filter: Option<String>,
    for_secs: Option<u64>,
) -> Result<bool> {
    let token = CancellationToken::new();
    let stream = executor
        .stream(name, args, token.clone(), move |line: String| match &filter {
            Some(text) => line.contains(text.as_str()).then_some(line),
            None => Some(line),
        })
        .with_context(|| format!("Failed to start {}", name))?;

    let deadline = for_secs.map(|secs| Instant::now() + Duration::from_secs(secs));

    loop {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            info!("Stream deadline reached, cancelling {}", stream.command());
            token.cancel();
            break;
        }

        match stream.try_read(POLL_INTERVAL).await {
            Some(line) => println!("{}", line),
            None if stream.is_finished() => break,
            None => {}
        }
    }

    // Let the reader observe the cancellation before reporting
    while token.is_cancelled() && !stream.is_finished() {
        smol::Timer::after(Duration::from_millis(10)).await;
    }

    for line in stream.stderr() {
        eprintln!("{}", line);
    }
    match stream.exit_code() {
        Some(code) if !stream.is_cancelled() => eprintln!("exited with {}", code),
        _ => eprintln!("cancelled"),
    }

    Ok(stream.is_success() || stream.is_cancelled())
}
