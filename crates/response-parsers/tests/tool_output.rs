//! Parsers fed by real child processes replaying captured tool output

#![cfg(unix)]

use command_executor::{CancellationToken, Executor, InvocationOptions};
use response_parsers::{
    ContainerDetails, DiffKind, DiffParser, FieldValue, JsonEnvelopeParser, KeyValueParser,
    ProcessColumn, TableParser,
};
use std::time::Duration;

fn fixture(name: &str) -> String {
    format!("'{}/tests/fixtures/{}'", env!("CARGO_MANIFEST_DIR"), name)
}

#[smol_potat::test]
async fn test_top_dialects_share_columns() {
    let executor = Executor::default();
    let options = InvocationOptions::new();

    let docker = executor
        .run("cat", &fixture("docker_top.txt"), &options, &TableParser)
        .await
        .unwrap();
    let podman = executor
        .run("cat", &fixture("podman_top.txt"), &options, &TableParser)
        .await
        .unwrap();
    assert!(docker.success && podman.success);

    for table in [&docker.data, &podman.data] {
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.rows[0].command(),
            Some("nginx: master process nginx -g daemon off;")
        );
        assert!(table.columns.contains(&Some(ProcessColumn::User)));
        assert!(table.columns.contains(&Some(ProcessColumn::ParentPid)));
        assert!(table.columns.contains(&Some(ProcessColumn::CpuTime)));
    }

    assert_eq!(docker.data.rows[1].pid(), Some(2902));
    assert_eq!(
        podman.data.rows[0]
            .get(ProcessColumn::Elapsed)
            .and_then(FieldValue::as_duration),
        Some(Duration::from_millis(3_723_500))
    );
}

#[smol_potat::test]
async fn test_windows_top_keeps_working_set_together() {
    let executor = Executor::default();
    let response = executor
        .run(
            "cat",
            &fixture("windows_top.txt"),
            &InvocationOptions::new(),
            &TableParser,
        )
        .await
        .unwrap();

    assert!(response.success);
    let table = response.data;
    assert_eq!(table.titles.len(), 4);
    assert_eq!(table.rows[1].command(), Some("csrss.exe"));
    assert_eq!(
        table.rows[1].get(ProcessColumn::WorkingSet),
        Some(&FieldValue::Text("1.724MB".to_string()))
    );
}

#[smol_potat::test]
async fn test_inspect_variants_decode_alike() {
    let executor = Executor::default();
    let options = InvocationOptions::new();
    let parser = JsonEnvelopeParser::<ContainerDetails>::new();

    let docker = executor
        .run("cat", &fixture("docker_inspect.json"), &options, &parser)
        .await
        .unwrap();
    let podman = executor
        .run("cat", &fixture("podman_inspect.json"), &options, &parser)
        .await
        .unwrap();

    assert!(docker.success, "{}", docker.error);
    assert!(podman.success, "{}", podman.error);
    assert_eq!(docker.data, podman.data);
    assert_eq!(docker.data.name, "web");
    assert_eq!(
        docker.data.config.entrypoint,
        Some(vec!["/docker-entrypoint.sh".to_string()])
    );
    assert_eq!(docker.data.state.health, None);
    assert!(!docker.log.is_empty());
}

#[smol_potat::test]
async fn test_env_script() {
    let executor = Executor::default();
    let response = executor
        .run(
            "cat",
            &fixture("env.txt"),
            &InvocationOptions::new(),
            &KeyValueParser,
        )
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.data.len(), 4);
    assert_eq!(response.data["DOCKER_HOST"], "tcp://192.168.99.100:2376");
    assert_eq!(response.log.len(), 6);
}

#[smol_potat::test]
async fn test_diff_parsed_and_streamed() {
    let executor = Executor::default();
    let response = executor
        .run(
            "cat",
            &fixture("diff.txt"),
            &InvocationOptions::new(),
            &DiffParser,
        )
        .await
        .unwrap();
    assert_eq!(response.data.len(), 6);
    assert_eq!(response.data[5].kind, DiffKind::Removed);

    let stream = executor
        .stream(
            "cat",
            &fixture("diff.txt"),
            CancellationToken::new(),
            |line| DiffParser::parse_line(&line).ok(),
        )
        .unwrap();

    let mut added = Vec::new();
    while let Some(entry) = stream.try_read(Duration::from_secs(5)).await {
        if entry.kind == DiffKind::Added {
            added.push(entry.item);
        }
    }
    assert_eq!(added, vec!["/etc/nginx/conf.d/site.conf", "/var/cache/nginx"]);
}
