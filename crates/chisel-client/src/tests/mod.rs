//! Unit and protocol tests for the client core.

mod dispatch_unit;
mod support;
