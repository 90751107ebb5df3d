//! Ordering guarantees between stores within one dispatch

use fluxury::prelude::*;
use fluxury::testing::{ListenerProbe, TestHarness};
use fluxury::CallbackStatus;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

fn message_store(flux: &Flux) -> Store<Vec<String>, Message> {
    flux.create_store(
        "MessageStore",
        Vec::new(),
        Cases::new().on("loadMessage", |state: &Arc<Vec<String>>, action: &Message| {
            let mut next = (**state).clone();
            next.extend(action.data_as::<String>().and_then(Result::ok));
            Arc::new(next)
        }),
    )
}

#[test]
fn test_wait_for_runs_dependency_first() {
    let flux = Flux::new();
    let messages = message_store(&flux);

    let source = messages.clone();
    let count = flux.create_store(
        "MessageCountStore",
        0usize,
        Reducer::function(
            move |state: &Arc<usize>, action: &Message, wait_for: &WaitFor<'_, Message>| {
                wait_for.wait(&[source.dispatch_token()])?;
                Ok(match action.kind.as_str() {
                    "loadMessage" => Arc::new(**state + 1),
                    _ => Arc::clone(state),
                })
            },
        ),
    );

    let probe = ListenerProbe::new();
    probe.attach(&messages);

    for (i, text) in ["Test", "Test2", "Test3"].into_iter().enumerate() {
        flux.dispatch_with("loadMessage", text).unwrap();
        assert_eq!(messages.get_state().len(), i + 1);
        assert_eq!(*count.get_state(), i + 1);
    }
    assert_eq!(*messages.get_state(), vec!["Test", "Test2", "Test3"]);
    assert_eq!(probe.count(), 3);
}

#[test]
fn test_dependent_registered_first_sees_fresh_state() {
    let flux = Flux::new();
    let later: Rc<RefCell<Option<Store<i32, Message>>>> = Rc::default();

    // Registered before the store it reads
    let target = later.clone();
    let doubled = flux.create_store(
        "Doubled",
        0,
        Reducer::function(move |_: &Arc<i32>, _: &Message, wait_for: &WaitFor<'_, Message>| {
            let base = target
                .borrow()
                .clone()
                .ok_or_else(|| DispatchError::handler("base store missing"))?;
            wait_for.wait(&[base.dispatch_token()])?;
            Ok(Arc::new(*base.get_state() * 2))
        }),
    );

    let base = flux.create_store(
        "Base",
        0,
        Cases::new().on("INC", |s: &Arc<i32>, _: &Message| Arc::new(**s + 1)),
    );
    *later.borrow_mut() = Some(base.clone());

    flux.dispatch("INC").unwrap();
    flux.dispatch("INC").unwrap();
    assert_eq!(*base.get_state(), 2);
    assert_eq!(*doubled.get_state(), 4);
}

/// Stores A and B plus a third store that waits on both in the given order.
/// Returns final states of A and B and the order their reducers ran in.
fn run_with_wait_order(a_first: bool) -> (i32, i32, Vec<&'static str>) {
    let flux = Flux::new();
    let runs = Rc::new(RefCell::new(Vec::new()));
    let tokens: Rc<RefCell<Vec<DispatchToken>>> = Rc::default();

    // Third store registers first so both dependencies are pulled forward
    let (order, deps) = (runs.clone(), tokens.clone());
    flux.create_store(
        "Summary",
        0,
        Reducer::function(move |s: &Arc<i32>, _: &Message, wait_for: &WaitFor<'_, Message>| {
            let mut wanted = deps.borrow().clone();
            if !a_first {
                wanted.reverse();
            }
            wait_for.wait(&wanted)?;
            order.borrow_mut().push("summary");
            Ok(Arc::clone(s))
        }),
    );

    let log = runs.clone();
    let a = flux.create_store(
        "A",
        1,
        Reducer::pure(move |s: &Arc<i32>, _: &Message| {
            log.borrow_mut().push("a");
            Arc::new(**s + 10)
        }),
    );
    let log = runs.clone();
    let b = flux.create_store(
        "B",
        2,
        Reducer::pure(move |s: &Arc<i32>, _: &Message| {
            log.borrow_mut().push("b");
            Arc::new(**s * 3)
        }),
    );
    tokens
        .borrow_mut()
        .extend([a.dispatch_token(), b.dispatch_token()]);

    flux.dispatch("GO").unwrap();
    flux.dispatch("GO").unwrap();

    let order = runs.borrow().clone();
    (*a.get_state(), *b.get_state(), order)
}

#[test]
fn test_wait_for_order_independent() {
    let (a1, b1, order1) = run_with_wait_order(true);
    let (a2, b2, order2) = run_with_wait_order(false);

    assert_eq!((a1, b1), (21, 18));
    assert_eq!((a1, b1), (a2, b2));

    // Every reducer runs exactly once per dispatch either way
    for order in [&order1, &order2] {
        assert_eq!(order.iter().filter(|r| **r == "a").count(), 2);
        assert_eq!(order.iter().filter(|r| **r == "b").count(), 2);
        assert_eq!(order.iter().filter(|r| **r == "summary").count(), 2);
    }
    assert_eq!(order1, vec!["a", "b", "summary", "a", "b", "summary"]);
    assert_eq!(order2, vec!["b", "a", "summary", "b", "a", "summary"]);
}

#[test]
fn test_self_wait_is_cyclic() {
    let flux = Flux::new();
    let own: Rc<Cell<Option<DispatchToken>>> = Rc::default();

    let me = own.clone();
    let store = flux.create_store(
        "Narcissus",
        0,
        Reducer::function(move |s: &Arc<i32>, _: &Message, wait_for: &WaitFor<'_, Message>| {
            if let Some(token) = me.get() {
                wait_for.wait(&[token])?;
            }
            Ok(Arc::new(**s + 1))
        }),
    );
    own.set(Some(store.dispatch_token()));

    let err = flux.dispatch("GO").unwrap_err();
    assert!(matches!(err, DispatchError::CyclicDependency { token } if token == store.dispatch_token()));
    assert_eq!(*store.get_state(), 0);
    assert!(!flux.dispatcher().is_dispatching());
}

#[test]
fn test_mutual_wait_is_cyclic_and_recoverable() {
    let flux = Flux::new();
    let tokens: Rc<RefCell<Vec<DispatchToken>>> = Rc::default();
    let armed = Rc::new(Cell::new(true));

    let mut stores = Vec::new();
    for (name, other) in [("Ping", 1usize), ("Pong", 0usize)] {
        let (deps, armed) = (tokens.clone(), armed.clone());
        let store = flux.create_store(
            name,
            0,
            Reducer::function(move |s: &Arc<i32>, _: &Message, wait_for: &WaitFor<'_, Message>| {
                if armed.get() {
                    let target = deps.borrow()[other];
                    wait_for.wait(&[target])?;
                }
                Ok(Arc::new(**s + 1))
            }),
        );
        tokens.borrow_mut().push(store.dispatch_token());
        stores.push(store);
    }

    let err = flux.dispatch("GO").unwrap_err();
    assert!(matches!(err, DispatchError::CyclicDependency { .. }));
    for token in tokens.borrow().iter() {
        assert_eq!(
            flux.dispatcher().status(*token),
            Some(CallbackStatus::PENDING)
        );
    }

    armed.set(false);
    flux.dispatch("GO").unwrap();
    assert!(stores.iter().all(|s| *s.get_state() == 1));
}

#[test]
fn test_reentrant_dispatch_fails_and_dispatcher_recovers() {
    let mut harness = TestHarness::<Message>::new();
    let armed = Rc::new(Cell::new(true));

    let trigger = armed.clone();
    harness.dispatcher().register(move |action: &Message, d: &Dispatcher<Message>| {
        if trigger.get() && action.kind == "OUTER" {
            d.dispatch(Message::new("INNER"))?;
        }
        Ok(())
    });
    let counter = Store::new(
        harness.dispatcher(),
        "Counter",
        0,
        Cases::new().on("OUTER", |s: &Arc<i32>, _: &Message| Arc::new(**s + 1)),
    );

    let err = harness.dispatch(Message::new("OUTER")).unwrap_err();
    assert!(matches!(err, DispatchError::ReentrantDispatch));
    assert_eq!(*counter.get_state(), 0);
    assert!(!harness.dispatcher().is_dispatching());

    armed.set(false);
    harness.dispatch(Message::new("OUTER")).unwrap();
    assert_eq!(*counter.get_state(), 1);

    let kinds: Vec<String> = harness
        .drain_dispatched()
        .into_iter()
        .map(|m| m.kind)
        .collect();
    assert_eq!(kinds, vec!["OUTER", "OUTER"]);
}

#[test]
fn test_listener_fires_after_state_is_final() {
    let flux = Flux::new();
    let messages = message_store(&flux);
    let observed = Rc::new(RefCell::new(Vec::new()));

    let (reader, sink) = (messages.clone(), observed.clone());
    messages.add_listener(move || sink.borrow_mut().push(reader.get_state().len()));

    flux.dispatch_with("loadMessage", "a").unwrap();
    flux.dispatch_with("loadMessage", "b").unwrap();
    assert_eq!(*observed.borrow(), vec![1, 2]);
}

#[test]
fn test_typed_actions_with_wait_for() {
    #[derive(Action, Clone, Debug)]
    enum Shop {
        AddItem(u32),
        Clear,
    }

    let dispatcher = Dispatcher::new();
    let cart = Store::new(
        &dispatcher,
        "Cart",
        Vec::<u32>::new(),
        Reducer::pure(|s: &Arc<Vec<u32>>, action: &Shop| match action {
            Shop::AddItem(price) => {
                let mut next = (**s).clone();
                next.push(*price);
                Arc::new(next)
            }
            Shop::Clear => Arc::new(Vec::new()),
        }),
    );

    let items = cart.clone();
    let total = Store::new(
        &dispatcher,
        "Total",
        0u32,
        Reducer::function(move |_: &Arc<u32>, _: &Shop, wait_for: &WaitFor<'_, Shop>| {
            wait_for.wait(&[items.dispatch_token()])?;
            Ok(Arc::new(items.get_state().iter().sum()))
        }),
    );

    dispatcher.dispatch(Shop::AddItem(3)).unwrap();
    dispatcher.dispatch(Shop::AddItem(4)).unwrap();
    assert_eq!(*total.get_state(), 7);

    dispatcher.dispatch(Shop::Clear).unwrap();
    assert_eq!(*total.get_state(), 0);
}
