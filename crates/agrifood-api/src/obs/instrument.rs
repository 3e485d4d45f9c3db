//! Per-route instrumentation middleware.
//!
//! The timer starts when the request enters the middleware. The sample is
//! recorded when the response body has been fully handed to the server, which
//! is the closest observable point to "response finished". A body dropped
//! before it completes (client went away) records nothing.

use std::pin::Pin;
use std::task::{Context, Poll};

use agrifood_core::metrics::HistogramTimer;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};

use super::metrics::HttpMetrics;

/// Middleware state: the metrics sink plus the registered route label.
#[derive(Clone)]
pub struct RouteInstrument {
    metrics: HttpMetrics,
    route: &'static str,
}

impl RouteInstrument {
    /// `route` is the logical route pattern, never the raw request path.
    pub fn new(metrics: HttpMetrics, route: &'static str) -> Self {
        Self { metrics, route }
    }
}

/// Use with `axum::middleware::from_fn_with_state(RouteInstrument::new(..), track)`.
pub async fn track(State(inst): State<RouteInstrument>, req: Request, next: Next) -> Response {
    let timer = inst.metrics.start_timer();
    let method = req.method().clone();

    let response = next.run(req).await;

    let pending = Pending {
        metrics: inst.metrics,
        route: inst.route,
        status: response.status(),
        method,
        timer,
    };

    // Nothing follows the head for these, so the response is finished now.
    if pending.method == Method::HEAD || !status_has_body(pending.status) {
        pending.finish();
        return response;
    }

    response.map(|inner| {
        Body::new(FinishBody {
            inner,
            pending: Some(pending),
        })
    })
}

fn status_has_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

/// A request whose sample has not been recorded yet.
struct Pending {
    metrics: HttpMetrics,
    method: Method,
    route: &'static str,
    status: StatusCode,
    timer: HistogramTimer,
}

impl Pending {
    fn finish(self) {
        let status = self.status.as_u16();
        match self
            .metrics
            .finish(self.timer, self.method.as_str(), self.route, status)
        {
            Ok(elapsed) => tracing::debug!(
                method = %self.method,
                route = self.route,
                status,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "request recorded"
            ),
            Err(e) => tracing::warn!(route = self.route, error = %e, "request not recorded"),
        }
    }
}

/// Response body that records its request exactly once, at end of stream.
struct FinishBody {
    inner: Body,
    pending: Option<Pending>,
}

impl FinishBody {
    fn finish(&mut self) {
        if let Some(p) = self.pending.take() {
            p.finish();
        }
    }
}

impl HttpBody for FinishBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let polled = Pin::new(&mut self.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(None) => self.finish(),
            Poll::Ready(Some(Ok(_))) if self.inner.is_end_stream() => self.finish(),
            Poll::Ready(Some(Err(e))) => {
                // The response never completes; drop the sample.
                tracing::debug!(error = %e, "response body failed");
                self.pending = None;
            }
            _ => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for FinishBody {
    fn drop(&mut self) {
        // Servers may stop polling once the body reports end of stream.
        if self.inner.is_end_stream() {
            self.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bodyless_statuses() {
        assert!(!status_has_body(StatusCode::NO_CONTENT));
        assert!(!status_has_body(StatusCode::NOT_MODIFIED));
        assert!(!status_has_body(StatusCode::CONTINUE));
        assert!(status_has_body(StatusCode::OK));
        assert!(status_has_body(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
