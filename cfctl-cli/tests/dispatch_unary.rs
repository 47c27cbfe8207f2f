mod common;

use common::server::FixtureServer;
use common::{assert_exit_code, assert_output_contains, run_with_home, write_config};

#[test]
fn get_echoes_requested_id_as_yaml_by_default() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(home.path(), &["inventory", "get", "Server", "-p", "server_id=s-7"]);
    assert_exit_code(&r, 0);
    assert_output_contains(&r, "server_id: s-7");
}

#[test]
fn get_as_json_unwraps_the_single_record() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(
        home.path(),
        &["identity", "get", "User", "-p", "user_id=u-1", "-o", "json"],
    );
    assert_exit_code(&r, 0);
    assert_output_contains(&r, "\"user_id\": \"u-1\"");
}

#[test]
fn create_surfaces_missing_required_parameter() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(home.path(), &["identity", "create", "User", "-p", "name=Ada"]);
    assert_exit_code(&r, 1);
    assert_output_contains(&r, "email");
}

#[test]
fn create_succeeds_with_required_parameters() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(
        home.path(),
        &[
            "identity",
            "create",
            "User",
            "-p",
            "name=Ada Lovelace",
            "-p",
            "email=ada@example.com",
        ],
    );
    assert_exit_code(&r, 0);
    assert_output_contains(&r, "ada@example.com");
}
