//! Lane discovery and end-to-end runner tests.

use ceremony_testgen::runner::{RunnerOptions, TestLaneRunner};
use std::path::Path;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LANE_SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Deposit">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="AccountNumber" type="xs:string"/>
        <xs:element name="Amount" type="xs:decimal"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

const LANE_META: &str = r#"
context:
  contextId: deposits
  requiredMetadata:
    documenttype: "DEPOSIT"
  optionalMetadata:
    channel: [ONLINE, BRANCH]
generation:
  defaults:
    emptyRate: 0.0
"#;

fn write_lane(dir: &Path, subdir: &str, name: &str) {
    let lane_dir = dir.join(subdir);
    std::fs::create_dir_all(&lane_dir).unwrap();
    std::fs::write(lane_dir.join(format!("{name}.xsd")), LANE_SCHEMA).unwrap();
    std::fs::write(lane_dir.join(format!("{name}.meta.yaml")), LANE_META).unwrap();
}

fn dry_run_options() -> RunnerOptions {
    RunnerOptions {
        dry_run: true,
        count: 5,
        ..RunnerOptions::default()
    }
}

#[test]
fn discovers_lanes_with_sibling_meta_files() {
    let dir = tempfile::tempdir().unwrap();
    write_lane(dir.path(), "deposits", "dda");
    write_lane(dir.path(), "loans", "heloc");
    // An XSD without a meta file is not a lane.
    std::fs::write(dir.path().join("loans/orphan.xsd"), LANE_SCHEMA).unwrap();

    let runner = TestLaneRunner::new(dir.path(), dry_run_options());
    let lanes = runner.discover_lanes().unwrap();

    let names: Vec<String> = lanes.iter().map(|l| l.full_name()).collect();
    assert_eq!(names, vec!["deposits/dda", "loans/heloc"]);
}

#[tokio::test]
async fn dry_run_generates_without_submitting() {
    let dir = tempfile::tempdir().unwrap();
    write_lane(dir.path(), "deposits", "dda");

    let output_dir = tempfile::tempdir().unwrap();
    let options = RunnerOptions {
        output_dir: Some(output_dir.path().to_path_buf()),
        seed: Some(9),
        ..dry_run_options()
    };
    let mut runner = TestLaneRunner::new(dir.path(), options);
    let result = runner.run_all_lanes().await.unwrap();

    assert!(result.success());
    assert_eq!(result.lanes_run, 1);
    assert_eq!(result.total_xmls_generated, 5);
    assert_eq!(result.total_observations_submitted, 0);

    // Saved files follow the <lane>/<name>_NNNN.xml convention.
    let first = output_dir.path().join("deposits/dda/dda_0001.xml");
    assert!(first.exists(), "missing {}", first.display());
    let contents = std::fs::read_to_string(first).unwrap();
    assert!(contents.contains("<Deposit>"));
}

#[tokio::test]
async fn empty_lanes_directory_is_a_failed_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = TestLaneRunner::new(dir.path(), dry_run_options());
    let result = runner.run_all_lanes().await.unwrap();
    assert_eq!(result.lanes_run, 0);
    assert!(!result.success());
}

#[tokio::test]
async fn lane_with_missing_context_id_fails() {
    let dir = tempfile::tempdir().unwrap();
    let lane_dir = dir.path().join("broken");
    std::fs::create_dir_all(&lane_dir).unwrap();
    std::fs::write(lane_dir.join("bad.xsd"), LANE_SCHEMA).unwrap();
    std::fs::write(lane_dir.join("bad.meta.yaml"), "context:\n  displayName: x\n").unwrap();

    let mut runner = TestLaneRunner::new(dir.path(), dry_run_options());
    let result = runner.run_all_lanes().await.unwrap();

    assert!(!result.success());
    assert_eq!(result.lane_results.len(), 1);
    assert!(result.lane_results[0].errors[0].contains("contextId"));
}

#[tokio::test]
async fn selected_lanes_match_by_substring_without_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    write_lane(dir.path(), "deposits", "dda");
    write_lane(dir.path(), "loans", "heloc");

    let mut runner = TestLaneRunner::new(dir.path(), dry_run_options());
    let result = runner
        .run_selected_lanes(&["dda".to_string(), "deposits".to_string()])
        .await
        .unwrap();

    assert_eq!(result.lanes_run, 1);
    assert!(result.success());

    let result = runner
        .run_selected_lanes(&["no-such-lane".to_string()])
        .await
        .unwrap();
    assert_eq!(result.lanes_run, 0);
    assert!(!result.success());
}

#[tokio::test]
async fn full_run_creates_context_and_submits_observations() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/actuator/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    // Context does not exist yet, then creation succeeds.
    Mock::given(method("GET"))
        .and(path("/catalog/contexts/deposits"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/catalog/contexts"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/catalog/contexts/deposits/observations$"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_lane(dir.path(), "deposits", "dda");

    let options = RunnerOptions {
        api_url: server.uri(),
        count: 3,
        seed: Some(21),
        ..RunnerOptions::default()
    };
    let mut runner = TestLaneRunner::new(dir.path(), options);
    let result = runner.run_all_lanes().await.unwrap();

    assert!(result.success(), "{:?}", result.lane_results);
    assert_eq!(result.total_xmls_generated, 3);
    assert!(result.total_observations_submitted > 0);

    let requests = server.received_requests().await.unwrap();
    let submissions: Vec<_> = requests
        .iter()
        .filter(|r| r.url.path().ends_with("/observations"))
        .collect();
    assert_eq!(submissions.len(), 3);

    // Required metadata reaches every record; optional metadata comes
    // from the configured value list.
    let body: Vec<serde_json::Value> = serde_json::from_slice(&submissions[0].body).unwrap();
    assert!(!body.is_empty());
    for record in &body {
        assert_eq!(record["metadata"]["documenttype"], "DEPOSIT");
        let channel = record["metadata"]["channel"].as_str().unwrap();
        assert!(["ONLINE", "BRANCH"].contains(&channel));
    }
}
