use assert_cmd::Command;
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::json;
use tempfile::TempDir;

fn subscriber_tools(server: &MockServer) -> Command {
    let mut cmd = Command::cargo_bin("subscriber-tools").unwrap();
    cmd.env_remove("RUST_LOG")
        .env("MAILCHIMP_API_KEY", "abc123-us5")
        .env("MAILCHIMP_LIST_ID", "list-1")
        .env("MAILCHIMP_BASE_URL", server.base_url());
    cmd
}

fn members_page(server: &MockServer, members: serde_json::Value) {
    server.mock(|when, then| {
        when.method(GET)
            .path("/lists/list-1/members")
            .query_param("offset", "0");
        then.status(200)
            .json_body(json!({"members": members, "total_items": 3}));
    });
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_extract_dc_writes_dated_csv() {
    let server = MockServer::start();
    members_page(
        &server,
        json!([
            {"id": "1", "email_address": "a@x.org", "status": "subscribed",
             "merge_fields": {"FNAME": "Ann", "LNAME": "Lee"},
             "location": {"region": "DC", "city": "Washington"}},
            {"id": "2", "email_address": "b@x.org", "status": "subscribed",
             "location": {"region": "NY"}}
        ]),
    );
    let out = TempDir::new().unwrap();

    let assert = subscriber_tools(&server)
        .arg("extract-dc")
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .success();

    let stdout = stdout_of(assert.get_output());
    assert!(stdout.contains("Found 2 total members"));
    assert!(stdout.contains("Found 1 DC-based subscribers"));
    assert!(stdout.contains("✅ Exported 1 subscribers to"));

    let exported: Vec<_> = std::fs::read_dir(out.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(exported.len(), 1);
    assert!(exported[0].starts_with("dc_subscribers_"));

    let csv = std::fs::read_to_string(out.path().join(&exported[0])).unwrap();
    assert!(csv.starts_with("email,name,country,region,city,zip,subscribed_date\n"));
    assert!(csv.contains("a@x.org,Ann Lee,,DC,Washington,,"));
}

#[test]
fn test_assign_countries_with_yes_patches_members() {
    let server = MockServer::start();
    members_page(
        &server,
        json!([
            {"id": "uk1", "email_address": "a@ifs.org.uk", "status": "subscribed"},
            {"id": "gen", "email_address": "b@gmail.com", "status": "subscribed"}
        ]),
    );
    let patch = server.mock(|when, then| {
        when.method(PATCH)
            .path("/lists/list-1/members/uk1")
            .json_body(json!({"merge_fields": {"COUNTRY": "United Kingdom"}}));
        then.status(200).json_body(json!({"id": "uk1"}));
    });

    let assert = subscriber_tools(&server)
        .args(["assign-countries", "--yes"])
        .assert()
        .success();

    patch.assert();
    let stdout = stdout_of(assert.get_output());
    assert!(stdout.contains("Can assign country to 1 subscribers:"));
    assert!(stdout.contains("Auto-confirming update of 1 subscribers (--yes flag)"));
    assert!(stdout.contains("✅ Complete!"));
    assert!(stdout.contains("   Success: 1"));
}

#[test]
fn test_declined_confirmation_writes_nothing() {
    let server = MockServer::start();
    members_page(
        &server,
        json!([{"id": "uk1", "email_address": "a@ifs.org.uk", "status": "subscribed"}]),
    );
    let patch = server.mock(|when, then| {
        when.method(PATCH).path("/lists/list-1/members/uk1");
        then.status(200).json_body(json!({"id": "uk1"}));
    });

    let assert = subscriber_tools(&server)
        .arg("assign-countries")
        .write_stdin("no\n")
        .assert()
        .success();

    patch.assert_hits(0);
    assert!(stdout_of(assert.get_output()).contains("Cancelled."));
}

#[test]
fn test_closed_stdin_requires_yes_flag() {
    let server = MockServer::start();
    members_page(
        &server,
        json!([{"id": "uk1", "email_address": "a@ifs.org.uk", "status": "subscribed"}]),
    );

    let assert = subscriber_tools(&server)
        .arg("assign-countries")
        .write_stdin("")
        .assert()
        .failure();

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("Use --yes flag to confirm"));
}

#[test]
fn test_member_fetch_failure_aborts() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/lists/list-1/members");
        then.status(401).body("API Key Invalid");
    });

    let assert = subscriber_tools(&server)
        .arg("extract-orgs")
        .assert()
        .failure()
        .code(1);

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("Mailchimp rejected the API key"));
}

#[test]
fn test_missing_api_key() {
    let server = MockServer::start();

    subscriber_tools(&server)
        .env_remove("MAILCHIMP_API_KEY")
        .arg("sync-country")
        .assert()
        .failure()
        .code(3);
}

#[test]
fn test_add_uk_contacts_reads_csv_from_working_dir() {
    let server = MockServer::start();
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("uk_contacts.csv"),
        "email,first_name\nnew@x.org,Nia\n",
    )
    .unwrap();
    let lookup = server.mock(|when, then| {
        when.method(GET).path_contains("/lists/list-1/members/");
        then.status(404)
            .json_body(json!({"title": "Resource Not Found"}));
    });
    let add = server.mock(|when, then| {
        when.method(POST).path("/lists/list-1/members");
        then.status(200).json_body(json!({"id": "n1"}));
    });

    let assert = subscriber_tools(&server)
        .current_dir(dir.path())
        .args(["add-uk-contacts", "--yes"])
        .assert()
        .success();

    lookup.assert();
    add.assert();
    let stdout = stdout_of(assert.get_output());
    assert!(stdout.contains("Found 1 UK contacts in CSV"));
    assert!(stdout.contains("✓ Added: new@x.org"));
    assert!(stdout.contains("Added new subscribers: 1"));
    assert!(stdout.contains("Already set to UK: 0"));
    assert!(stdout.contains("Total UK contacts processed: 1"));
}
