//! End to end navigation through routes, handlers and views.

mod common;

use std::sync::atomic::Ordering;

use common::*;
use waypoint::error::{NavigationError, RouteError, ViewError};
use waypoint::{
    Dispatcher, DispatcherConfig, HandlerRef, NavigationOutcome, Parameters, Perspective,
};

#[test]
fn test_patterns_match_whole_urls() {
    let App {
        dispatcher,
        customers,
        ..
    } = app(DispatcherConfig::synchronous());

    let (handler, params) = dispatcher
        .resolve("Customer/42", Parameters::new())
        .unwrap();
    assert_eq!(handler, customers);
    assert_eq!(params, common::params([("id", "42")]));

    assert!(dispatcher.resolve("Customer/42/extra", Parameters::new()).is_none());
    assert!(dispatcher.resolve("/Customer/42", Parameters::new()).is_none());
    assert!(dispatcher.resolve("Customer/", Parameters::new()).is_none());
}

#[test]
fn test_defaults_never_overwrite() {
    let dispatcher = Dispatcher::with_config(DispatcherConfig::synchronous());
    let customers = HandlerRef::new(Customers::default());
    dispatcher
        .register_route(
            "/Customer/{id}",
            customers,
            params([("view", "list"), ("id", "0")]),
        )
        .unwrap();

    let (_, merged) = dispatcher
        .resolve("/Customer/42", params([("view", "grid"), ("id", "7")]))
        .unwrap();
    assert_eq!(merged, params([("id", "42"), ("view", "grid")]));

    let (_, merged) = dispatcher.resolve("/Customer/42", Parameters::new()).unwrap();
    assert_eq!(merged, params([("id", "42"), ("view", "list")]));
}

#[test]
fn test_duplicate_routes_follow_the_strictness_policy() {
    let strict = Dispatcher::with_config(DispatcherConfig::synchronous());
    let first = HandlerRef::new(Customers::default());
    let second = HandlerRef::new(Customers::default());
    strict
        .register_route("Customer/{id}", first.clone(), Parameters::new())
        .unwrap();
    let err = strict
        .register_route("Customer/{id}", second.clone(), Parameters::new())
        .unwrap_err();
    assert!(matches!(err, RouteError::DuplicateRoute { .. }));

    let relaxed = Dispatcher::builder()
        .threaded(false)
        .strict_routes(false)
        .build();
    assert_eq!(
        relaxed.register_route("Customer/{id}", first.clone(), Parameters::new()),
        Ok(true)
    );
    assert_eq!(
        relaxed.register_route("Customer/{id}", second, Parameters::new()),
        Ok(false)
    );
    let (handler, _) = relaxed.resolve("Customer/1", Parameters::new()).unwrap();
    assert_eq!(handler, first);
    assert_eq!(relaxed.routes().len(), 1);
}

#[tokio::test]
async fn test_navigation_presents_and_caches_the_view() {
    init_tracing();
    let App {
        dispatcher,
        host,
        customers,
    } = app(DispatcherConfig::synchronous());

    let outcome = dispatcher
        .navigate("Customer/42", Parameters::new())
        .await
        .wait()
        .await;
    assert_eq!(outcome.key(), Some(&customer_key(Perspective::READ)));
    assert_eq!(
        host.take(),
        vec![
            Event::Begin(customers.id()),
            Event::Complete(customers.id(), customer_key(Perspective::READ)),
        ]
    );

    let view = customers.bound_view().unwrap();
    assert_eq!(shown(&view), Some(Customer::new("42")));

    dispatcher
        .navigate("Customer/43", Parameters::new())
        .await
        .wait()
        .await;
    let again = customers.bound_view().unwrap();
    assert!(again.ptr_eq(&view));
    assert_eq!(shown(&view), Some(Customer::new("43")));
    assert_eq!(view.with(|detail: &mut CustomerDetail| detail.renders), Some(2));
    assert_eq!(dispatcher.views().cached_len(), 1);

    let entry = customers.view_entry().unwrap();
    assert_eq!(entry.uri(), "Customer/43");
    assert_eq!(entry.parameters(), &params([("id", "43")]));
    let cached = dispatcher.views().cached_entries().cloned().collect::<Vec<_>>();
    assert_eq!(cached, vec![entry]);
}

#[tokio::test]
async fn test_unmapped_perspective_fails_once_without_completing() {
    let App {
        dispatcher,
        host,
        customers,
    } = app(DispatcherConfig::synchronous());

    let outcome = dispatcher
        .navigate("Customer/42", params([("perspective", "update")]))
        .await
        .wait()
        .await;
    let err = outcome.error().unwrap();
    assert!(err.is_unmapped_perspective());
    assert!(matches!(
        err,
        NavigationError::View(ViewError::UnmappedPerspective { key })
            if key == &customer_key(Perspective::new("update"))
    ));
    assert_eq!(host.failures(), 1);
    assert_eq!(host.completions(), 0);
    assert!(customers.bound_view().is_none());
    // The failed navigation is not recorded as the handler's current entry.
    assert_eq!(customers.view_entry().unwrap().uri(), "");
}

#[tokio::test]
async fn test_load_failures_and_panics_are_reported_to_the_host() {
    let App {
        dispatcher,
        host,
        customers,
    } = app(DispatcherConfig::synchronous());

    let outcome = dispatcher
        .navigate("Customer/panic", Parameters::new())
        .await
        .wait()
        .await;
    match outcome {
        NavigationOutcome::Failed(NavigationError::LoadPanicked { panic, .. }) => {
            assert_eq!(panic.message(), Some("customer store unavailable"));
        }
        other => panic!("expected a panic, got {other:?}"),
    }

    let failing = HandlerRef::new(Customers::default());
    let outcome = dispatcher
        .dispatch(None, failing.clone(), "Customer", Parameters::new())
        .await
        .wait()
        .await;
    assert!(matches!(
        outcome.error(),
        Some(NavigationError::LoadFailed { .. })
    ));
    assert_eq!(host.failures(), 2);

    // The panicking handler is still usable.
    let outcome = dispatcher
        .navigate("Customer/1", Parameters::new())
        .await
        .wait()
        .await;
    assert!(outcome.is_completed());
    assert_eq!(
        customers.with(|h: &mut Customers| h.loads).await,
        Some(2)
    );
}

#[tokio::test]
async fn test_redirect_suppresses_completion_of_the_original_navigation() {
    let App {
        dispatcher,
        host,
        customers,
    } = app(DispatcherConfig::synchronous());
    let redirect = HandlerRef::new(Redirect::default());
    dispatcher
        .register_route("Legacy/{id}", redirect.clone(), params([("to", "Customer/7")]))
        .unwrap();

    let outcome = dispatcher
        .navigate("Legacy/7", Parameters::new())
        .await
        .wait()
        .await;
    assert!(matches!(outcome, NavigationOutcome::Redirected));
    assert_eq!(
        host.take(),
        vec![
            Event::Begin(redirect.id()),
            Event::Begin(customers.id()),
            Event::Complete(customers.id(), customer_key(Perspective::READ)),
        ]
    );
    assert_eq!(shown(&customers.bound_view().unwrap()), Some(Customer::new("7")));

    // Nothing is left cancelled for the next navigation.
    let outcome = dispatcher
        .navigate("Customer/8", Parameters::new())
        .await
        .wait()
        .await;
    assert!(outcome.is_completed());
}

#[tokio::test]
async fn test_redirect_to_an_unknown_url_still_cancels() {
    let App {
        dispatcher, host, ..
    } = app(DispatcherConfig::synchronous());
    let redirect = HandlerRef::new(Redirect::default());
    dispatcher
        .register_route("Away", redirect, params([("to", "https://example.com")]))
        .unwrap();

    let outcome = dispatcher.navigate("Away", Parameters::new()).await.wait().await;
    assert!(matches!(outcome, NavigationOutcome::Redirected));
    assert_eq!(host.completions(), 0);
    assert_eq!(host.failures(), 0);
}

#[tokio::test]
async fn test_bound_views_receive_the_new_model_before_the_host() {
    let App {
        dispatcher,
        host,
        customers,
    } = app(DispatcherConfig::synchronous());

    dispatcher
        .navigate("Customer/1", Parameters::new())
        .await
        .wait()
        .await;
    let view = customers.bound_view().unwrap();

    host.presenting.store(false, Ordering::SeqCst);
    dispatcher
        .navigate("Customer/2", Parameters::new())
        .await
        .wait()
        .await;
    assert_eq!(shown(&view), Some(Customer::new("2")));
    // Only the host renders.
    assert_eq!(view.with(|detail: &mut CustomerDetail| detail.renders), Some(1));

    drop(view);
    dispatcher.views().clear_cache();
    assert!(customers.bound_view().is_none());
}

#[tokio::test]
async fn test_viewports_get_their_own_views() {
    let App {
        dispatcher,
        customers,
        ..
    } = app(DispatcherConfig::synchronous());
    let detail = HandlerRef::new(Customers::default());
    detail.set_viewport("detail");

    dispatcher
        .navigate("Customer/1", Parameters::new())
        .await
        .wait()
        .await;
    dispatcher
        .dispatch(None, detail.clone(), "Customer/2", params([("id", "2")]))
        .await
        .wait()
        .await;

    let list_view = customers.bound_view().unwrap();
    let detail_view = detail.bound_view().unwrap();
    assert!(!list_view.ptr_eq(&detail_view));
    assert_eq!(shown(&list_view), Some(Customer::new("1")));
    assert_eq!(shown(&detail_view), Some(Customer::new("2")));

    let key = customer_key(Perspective::READ);
    let views = dispatcher.views();
    assert_eq!(views.cached_len(), 2);
    assert_eq!(views.get_in(&key, "detail"), Some(detail_view.clone()));
    assert_eq!(views.get(&key), Some(list_view));
}
