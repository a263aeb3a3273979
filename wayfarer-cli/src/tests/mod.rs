//! Shared test harness modules for the Wayfarer CLI.

use super::*;

mod helpers;
mod plan_steps;
mod watch_unit;
