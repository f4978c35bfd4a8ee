//! Unit tests for dispatcher delivery guarantees.

use std::cell::Cell;
use std::rc::Rc;

use rstest::rstest;

use crate::channel::ProcessLifecycle;
use crate::dispatch::{FailureFn, SuccessFn};
use crate::errors::{ClientError, Operation};
use crate::tests::support::{ScriptedReply, World};
use chisel_wire::{Command, Notice, Value};

fn interpret(input: &str) -> Command {
    Command::Interpret {
        input: input.into(),
    }
}

#[rstest]
fn call_async_runs_the_success_continuation_exactly_once() {
    let world = World::new(vec![ScriptedReply::Success(Value::str("done"))]);
    let mut client = world.client;
    client.ensure_process().expect("spawn failed");

    let successes = Rc::new(Cell::new(0u32));
    let failures = Rc::new(Cell::new(0u32));
    let on_success: SuccessFn = {
        let counter = Rc::clone(&successes);
        Box::new(move |_effects, _value| counter.set(counter.get() + 1))
    };
    let on_failure: FailureFn = {
        let counter = Rc::clone(&failures);
        Box::new(move |_effects, _diagnostic| counter.set(counter.get() + 1))
    };

    client
        .call_async_for(interpret(":version"), on_success, on_failure)
        .expect("call failed");

    // Never invoked synchronously within the call itself.
    assert_eq!((successes.get(), failures.get()), (0, 0));

    client.pump().expect("pump failed");
    assert_eq!((successes.get(), failures.get()), (1, 0));

    client.pump().expect("pump failed");
    assert_eq!((successes.get(), failures.get()), (1, 0));
}

#[rstest]
fn call_async_routes_failures_to_the_failure_continuation() {
    let world = World::new(vec![ScriptedReply::Failure("nope".into())]);
    let mut client = world.client;
    client.ensure_process().expect("spawn failed");

    let successes = Rc::new(Cell::new(0u32));
    let failures = Rc::new(Cell::new(0u32));
    let on_success: SuccessFn = {
        let counter = Rc::clone(&successes);
        Box::new(move |_effects, _value| counter.set(counter.get() + 1))
    };
    let on_failure: FailureFn = {
        let counter = Rc::clone(&failures);
        Box::new(move |_effects, _diagnostic| counter.set(counter.get() + 1))
    };

    client
        .call_async_for(interpret(":version"), on_success, on_failure)
        .expect("call failed");
    client.pump().expect("pump failed");
    client.pump().expect("pump failed");

    assert_eq!((successes.get(), failures.get()), (0, 1));
}

#[rstest]
fn quit_discards_pending_calls_without_running_continuations() {
    let world = World::new(vec![ScriptedReply::Success(Value::str("done"))]);
    let mut client = world.client;
    client.ensure_process().expect("spawn failed");

    let ran = Rc::new(Cell::new(0u32));
    let on_success: SuccessFn = {
        let counter = Rc::clone(&ran);
        Box::new(move |_effects, _value| counter.set(counter.get() + 1))
    };
    let on_failure: FailureFn = {
        let counter = Rc::clone(&ran);
        Box::new(move |_effects, _diagnostic| counter.set(counter.get() + 1))
    };

    client
        .call_async_for(interpret(":version"), on_success, on_failure)
        .expect("call failed");
    client.quit();
    client.pump().expect("pump failed");

    assert_eq!(ran.get(), 0);
    assert_eq!(client.session().loaded(), None);
    assert!(!world.channel.is_running());
}

#[rstest]
fn notices_route_to_their_observers() {
    let world = World::new(Vec::new());
    let mut client = world.client;
    client.ensure_process().expect("spawn failed");
    world
        .channel
        .push_notice(Notice::Output("Type checking Main.src".into()));
    world.channel.push_notice(Notice::Warning {
        file: "Main.src".into(),
        line: 3,
        message: "incomplete match".into(),
    });
    world.channel.push_notice(Notice::ProtocolVersion(1));

    client.pump().expect("pump failed");

    assert_eq!(
        world.presenter.messages(),
        vec!["Type checking Main.src".to_owned()]
    );
    assert_eq!(
        world.diagnostics.recorded(),
        vec![("Main.src".into(), 3, "incomplete match".into())]
    );
    assert_eq!(client.protocol_version(), Some(1));
}

#[rstest]
fn async_returns_observed_during_a_sync_call_wait_for_the_pump() {
    let world = World::new(vec![
        ScriptedReply::Success(Value::str("async done")),
        ScriptedReply::Success(Value::str("sync done")),
    ]);
    let mut client = world.client;
    client.ensure_process().expect("spawn failed");

    let ran = Rc::new(Cell::new(0u32));
    let on_success: SuccessFn = {
        let counter = Rc::clone(&ran);
        Box::new(move |_effects, _value| counter.set(counter.get() + 1))
    };
    let on_failure: FailureFn = Box::new(|_effects, _diagnostic| {});

    client
        .call_async_for(interpret(":version"), on_success, on_failure)
        .expect("call failed");

    // The synchronous call drains the async return while blocked, but the
    // continuation still waits for the host's pump.
    client.interpret(":doc plus").expect("interpret failed");
    assert_eq!(ran.get(), 0);

    client.pump().expect("pump failed");
    assert_eq!(ran.get(), 1);
}

#[rstest]
fn sync_call_without_a_running_process_is_rejected() {
    let world = World::new(Vec::new());
    let mut client = world.client;

    let result = client.call_sync_for(Operation::TypeOf, interpret(":version"));

    assert!(matches!(result, Err(ClientError::ProcessUnavailable)));
    assert!(world.channel.sent().is_empty());
}
