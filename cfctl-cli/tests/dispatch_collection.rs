mod common;

use common::server::FixtureServer;
use common::{assert_exit_code, assert_output_contains, assert_output_not_contains, run_with_home, write_config};

#[test]
fn list_as_json_wraps_records_in_results() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(home.path(), &["inventory", "list", "Server", "-o", "json"]);
    assert_exit_code(&r, 0);
    assert_output_contains(&r, "\"results\"");
    assert_output_contains(&r, "\"server_id\": \"s-1\"");
}

#[test]
fn list_as_csv_renders_a_header_row() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(home.path(), &["inventory", "list", "Server", "-o", "csv"]);
    assert_exit_code(&r, 0);
    assert_output_contains(&r, "server_id");
    assert_output_contains(&r, "s-1");
}

#[test]
fn list_endpoint_discovers_both_fixture_services() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(home.path(), &["identity", "list", "Endpoint", "-o", "json"]);
    assert_exit_code(&r, 0);
    assert_output_contains(&r, "inventory");
    assert_output_contains(&r, "identity");
}

#[test]
fn minimal_flag_projects_down_to_preferred_columns() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(home.path(), &["inventory", "list", "Server", "-o", "json", "-m"]);
    assert_exit_code(&r, 0);
    assert_output_contains(&r, "\"server_id\"");
    assert_output_not_contains(&r, "\"region\"");
}

#[test]
fn columns_flag_projects_only_named_fields() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(
        home.path(),
        &["inventory", "list", "Server", "-o", "json", "--columns", "name"],
    );
    assert_exit_code(&r, 0);
    assert_output_contains(&r, "\"name\"");
    assert_output_not_contains(&r, "\"region\"");
}
