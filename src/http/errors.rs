//! The error pipeline.
//!
//! # Data Flow
//! ```text
//! Failure (from a stage, a handler, a rejection or a caught panic)
//!     → classify: log by severity, strip client-class traces
//!     → notify:   status >= 500 → attach origin, hand to the reporter
//!     → render:   {"code", "message"} with the failure's status
//! ```
//!
//! # Design Decisions
//! - Every failure passes through here exactly once, from the driver
//! - Client-class failures are logged at warn without their trace
//! - Reporting is detached; its outcome never changes the response

use std::any::Any;

use axum::response::{IntoResponse, Response};
use tracing::Span;

use crate::failure::{Failure, RequestOrigin};
use crate::observability::metrics;
use crate::reporting::Reporter;

/// Stage 1: log at a severity derived from the status.
///
/// Foreign errors were already wrapped as `InternalServerError` when they
/// became a `Failure`, so every value reaching here is a taxonomy member.
pub fn classify(mut failure: Failure, span: &Span) -> Failure {
    span.in_scope(|| {
        if failure.is_server_error() {
            tracing::error!(
                status = failure.status().as_u16(),
                code = failure.kind().code(),
                error = %failure.message(),
                cause = ?failure.cause_chain(),
                trace = ?failure.trace(),
                "Request failed"
            );
        } else {
            failure.clear_trace();
            tracing::warn!(
                status = failure.status().as_u16(),
                code = failure.kind().code(),
                error = %failure.message(),
                "Request rejected"
            );
        }
    });
    metrics::record_failure(failure.kind().code());
    failure
}

/// Stage 2: report server-class failures with the request they came from.
pub fn notify(failure: Failure, origin: &RequestOrigin, reporter: &Reporter) -> Failure {
    if !failure.is_server_error() {
        return failure;
    }
    let failure = failure.with_origin(origin.clone());
    reporter.dispatch(failure.clone());
    failure
}

/// Run both stages and render the client response.
pub fn handle(failure: Failure, origin: &RequestOrigin, span: &Span, reporter: &Reporter) -> Response {
    let failure = classify(failure, span);
    let failure = notify(failure, origin, reporter);
    failure.render()
}

/// Panic handler for `CatchPanicLayer`: the panic re-enters as a failure.
pub fn failure_from_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    Failure::panicked(payload).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::backtrace::Backtrace;
    use std::collections::HashMap;
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::http::{Method, StatusCode};
    use futures_util::future::BoxFuture;
    use futures_util::FutureExt;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    use crate::failure::FailureKind;
    use crate::reporting::{ErrorSink, ReportError};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Failure>>);

    impl ErrorSink for Arc<Recorder> {
        fn report(&self, failure: Failure) -> BoxFuture<'static, Result<(), ReportError>> {
            self.0.lock().unwrap().push(failure);
            futures_util::future::ready(Ok(())).boxed()
        }
    }

    fn origin() -> RequestOrigin {
        RequestOrigin {
            method: Method::GET,
            url: "/widgets?page=2".into(),
        }
    }

    #[derive(Debug, Clone)]
    struct Captured {
        level: Level,
        fields: HashMap<String, String>,
    }

    /// Layer keeping every event it sees.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<Captured>>>);

    struct FieldVisitor<'a>(&'a mut HashMap<String, String>);

    impl Visit for FieldVisitor<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.insert(field.name().to_string(), format!("{value:?}"));
        }
    }

    impl<S: Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = HashMap::new();
            event.record(&mut FieldVisitor(&mut fields));
            self.0.lock().unwrap().push(Captured {
                level: *event.metadata().level(),
                fields,
            });
        }
    }

    fn captured<R>(f: impl FnOnce() -> R) -> (R, Vec<Captured>) {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let out = tracing::subscriber::with_default(subscriber, f);
        let events = capture.0.lock().unwrap().clone();
        (out, events)
    }

    #[test]
    fn client_failures_are_warned_without_trace() {
        let traced = Failure::not_found("/x").with_trace(Backtrace::force_capture());
        assert!(traced.trace().is_some());

        let (failure, events) = captured(|| classify(traced, &Span::none()));

        assert!(failure.trace().is_none());
        assert_eq!(failure.kind(), FailureKind::NotFound);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, Level::WARN);
        assert_eq!(events[0].fields["error"], "/x");
        assert!(!events[0].fields.contains_key("trace"));
    }

    #[test]
    fn server_failures_are_logged_as_errors_with_cause() {
        let failure = Failure::wrap(std::io::Error::other("boom")).with_trace(Backtrace::force_capture());

        let (failure, events) = captured(|| classify(failure, &Span::none()));

        assert!(failure.trace().is_some());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, Level::ERROR);
        assert_eq!(events[0].fields["status"], "500");
        assert_eq!(events[0].fields["cause"], r#"["boom"]"#);
        assert!(events[0].fields["trace"].starts_with("Some("));
    }

    #[tokio::test]
    async fn server_failures_are_reported_once_with_origin() {
        let recorder = Arc::new(Recorder::default());
        let reporter = Reporter::new(Arc::new(recorder.clone()));

        let response = handle(
            Failure::wrap(std::io::Error::other("boom")),
            &origin(),
            &Span::none(),
            &reporter,
        );
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let reports = recorder.0.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].origin(), Some(&origin()));
        assert_eq!(reports[0].message(), "boom");
    }

    #[tokio::test]
    async fn client_failures_are_never_reported() {
        let recorder = Arc::new(Recorder::default());
        let reporter = Reporter::new(Arc::new(recorder.clone()));

        let failure = notify(Failure::validation("bad"), &origin(), &reporter);
        assert!(failure.origin().is_none());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rendered_body_hides_server_details() {
        let response = handle(
            Failure::internal("connection string postgres://secret"),
            &origin(),
            &Span::none(),
            &Reporter::disabled(),
        );
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(
            body,
            r#"{"code":"InternalServerError","message":"Internal Server Error"}"#
        );
    }

    #[test]
    fn panics_become_internal_failures() {
        let response = failure_from_panic(Box::new("kaboom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let failure = response.extensions().get::<Failure>().unwrap();
        assert_eq!(failure.message(), "kaboom");
    }
}
