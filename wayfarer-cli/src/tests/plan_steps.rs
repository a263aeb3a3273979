//! Behaviour-driven step definitions driving the plan CLI scenarios.

use super::helpers::{Workspace, manual_clock, paris_request, write_utf8};
use super::*;
use crate::plan::run_plan_with;
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;

struct PlanWorld {
    workspace: Workspace,
    request_path: Utf8PathBuf,
    include_request: RefCell<bool>,
    cli_args: RefCell<Vec<String>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl PlanWorld {
    fn new() -> Self {
        let workspace = Workspace::new();
        let request_path = workspace.path("request.json");
        Self {
            workspace,
            request_path,
            include_request: RefCell::new(true),
            cli_args: RefCell::new(Vec::new()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec!["wayfarer".to_owned(), "plan".to_owned()];
        if *self.include_request.borrow() {
            argv.push(self.request_path.as_str().to_owned());
        }
        argv.extend(self.cli_args.borrow().iter().cloned());
        argv
    }

    fn route(&self) -> serde_json::Value {
        let borrowed = self.result.borrow();
        let result = borrowed.as_ref().expect("result recorded");
        result.as_ref().expect("expected success");
        serde_json::from_slice(&self.stdout.borrow()).expect("output should be route JSON")
    }

    fn error(&self) -> String {
        let borrowed = self.result.borrow();
        let error = borrowed
            .as_ref()
            .expect("result recorded")
            .as_ref()
            .expect_err("expected error");
        format!("{error:?}")
    }
}

#[fixture]
fn world() -> PlanWorld {
    PlanWorld::new()
}

#[given("a valid request exists on disk")]
fn valid_request_exists(#[from(world)] world: &PlanWorld) {
    let written = world.workspace.write_request(&paris_request());
    assert_eq!(written, world.request_path);
}

#[given("I ask for the cost goal")]
fn ask_for_cost(#[from(world)] world: &PlanWorld) {
    world
        .cli_args
        .borrow_mut()
        .extend(["--goal".to_owned(), "cost".to_owned()]);
}

#[given("the request contains invalid JSON")]
fn request_contains_invalid_json(#[from(world)] world: &PlanWorld) {
    write_utf8(&world.request_path, b"{ not valid json");
}

#[given("I omit the request path")]
fn omit_request_path(#[from(world)] world: &PlanWorld) {
    *world.include_request.borrow_mut() = false;
}

#[when("I run the plan command")]
fn run_plan_command(#[from(world)] world: &PlanWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Plan(args) => {
            let mut buffer = world.stdout.borrow_mut();
            run_plan_with(args, manual_clock(11), &mut *buffer)
        }
        Command::Watch(_) => panic!("expected plan command"),
    });
    world.result.replace(Some(outcome));
}

#[then("the command succeeds and prints a route visiting 3 waypoints")]
fn prints_three_waypoints(#[from(world)] world: &PlanWorld) {
    let route = world.route();
    let waypoints = route["waypoints"].as_array().expect("waypoints array");
    assert_eq!(waypoints.len(), 3);
}

#[then("every leg of the printed route travels by bus")]
fn every_leg_by_bus(#[from(world)] world: &PlanWorld) {
    let route = world.route();
    let legs = route["legs"].as_array().expect("legs array");
    assert!(!legs.is_empty());
    assert!(legs.iter().all(|leg| leg["leg"]["mode"] == "bus"), "{legs:?}");
}

#[then("the command fails because the request JSON is invalid")]
fn fails_invalid_json(#[from(world)] world: &PlanWorld) {
    assert!(world.error().starts_with("ParseRequest"));
}

#[then("the command fails because the request path is missing")]
fn fails_missing_request(#[from(world)] world: &PlanWorld) {
    let borrowed = world.result.borrow();
    match borrowed.as_ref().expect("result recorded") {
        Err(CliError::MissingArgument { field, .. }) => assert_eq!(*field, ARG_REQUEST),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

macro_rules! register_plan_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/plan_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: PlanWorld) {
            let _ = world;
        }
    };
}

register_plan_scenario!(plan_happy_path, "planning a request from JSON");
register_plan_scenario!(plan_for_cost, "optimising for cost");
register_plan_scenario!(plan_invalid_json, "rejecting invalid JSON input");
register_plan_scenario!(plan_missing_request, "rejecting missing request paths");
