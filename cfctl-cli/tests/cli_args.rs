mod common;

use common::server::FixtureServer;
use common::{assert_exit_code, assert_output_contains, run_with_home, write_config};

#[test]
fn zero_arg_service_invocation_lists_resource_verbs() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(home.path(), &["inventory"]);
    assert_exit_code(&r, 0);
    assert_output_contains(&r, "Server");
    assert_output_contains(&r, "list");
    assert_output_contains(&r, "get");
}

#[test]
fn repeated_parameter_flags_are_merged_into_the_request() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(
        home.path(),
        &["inventory", "get", "Server", "-p", "server_id=s-42", "-o", "json"],
    );
    assert_exit_code(&r, 0);
    assert_output_contains(&r, "s-42");
}

#[test]
fn unknown_service_is_rejected_by_clap() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(home.path(), &["nonexistent", "list", "Thing"]);
    assert_exit_code(&r, 2);
}
