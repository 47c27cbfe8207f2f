mod common;

use common::server::FixtureServer;
use common::{assert_exit_code, assert_output_contains, run_with_home, write_config};

#[test]
fn no_subcommand_prints_usage_hint() {
    let home = tempfile::tempdir().unwrap();
    let r = run_with_home(home.path(), &[]);
    assert_exit_code(&r, 2);
    assert_output_contains(&r, "--help");
}

#[test]
fn unknown_output_format_is_rejected() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(home.path(), &["inventory", "get", "Server", "-p", "server_id=s-1", "-o", "xml"]);
    assert_exit_code(&r, 2);
    assert_output_contains(&r, "xml");
}

#[test]
fn watch_flag_rejected_outside_list() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(home.path(), &["inventory", "get", "Server", "-p", "server_id=s-1", "--watch"]);
    assert_exit_code(&r, 2);
    assert_output_contains(&r, "only valid with 'list'");
}

#[test]
fn non_numeric_rows_is_rejected() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(home.path(), &["inventory", "list", "Server", "--rows", "abc"]);
    assert_exit_code(&r, 2);
    assert_output_contains(&r, "non-negative integer");
}

#[test]
fn zero_rows_per_page_is_rejected() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(
        home.path(),
        &["inventory", "list", "Server", "--rows-per-page", "0"],
    );
    assert_exit_code(&r, 2);
    assert_output_contains(&r, "greater than zero");
}

#[test]
fn columns_flag_valid_only_on_list() {
    let fixture = FixtureServer::start();
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &fixture.endpoint());

    let r = run_with_home(
        home.path(),
        &["inventory", "get", "Server", "-p", "server_id=s-1", "--columns", "name"],
    );
    assert_exit_code(&r, 2);
}
