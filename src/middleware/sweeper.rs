//! Tears down request-scoped connections when their response ends.
//!
//! The handle rides along with the response body. A normal response
//! releases it at end-of-stream, or when the body is dropped if the
//! transport gave up first. A streaming response (server-sent events)
//! ignores end-of-stream and releases only when the body is dropped,
//! which is what happens when the client disconnects.

use axum::{
    body::Body,
    http::header::CONTENT_TYPE,
    response::Response,
};
use bytes::Bytes;
use http_body::{Frame, SizeHint};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, warn};

use crate::database::{ConnectionHandle, Lifecycle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    /// Release at end-of-stream or drop, whichever comes first
    OnFinish,
    /// Release only when the body is dropped
    OnClose,
}

impl SweepMode {
    pub fn for_response(response: &Response) -> Self {
        let streaming = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(false, |v| v.starts_with("text/event-stream"));

        if streaming {
            SweepMode::OnClose
        } else {
            SweepMode::OnFinish
        }
    }
}

/// Bind a handle's teardown to the response. Shared handles are left alone.
pub fn attach(response: Response, handle: Arc<ConnectionHandle>) -> Response {
    if handle.lifecycle() != Lifecycle::RequestScoped {
        return response;
    }

    let mode = SweepMode::for_response(&response);
    let (parts, body) = response.into_parts();
    let body = SweepBody {
        inner: body,
        guard: SweepGuard::new(handle, mode),
    };
    Response::from_parts(parts, Body::new(body))
}

/// Owns the release of one request-scoped handle
pub struct SweepGuard {
    handle: Option<Arc<ConnectionHandle>>,
    mode: SweepMode,
}

impl SweepGuard {
    pub fn new(handle: Arc<ConnectionHandle>, mode: SweepMode) -> Self {
        Self {
            handle: Some(handle),
            mode,
        }
    }

    fn on_finish(&mut self) {
        if self.mode == SweepMode::OnFinish {
            self.release("finish");
        }
    }

    fn on_close(&mut self) {
        self.release("close");
    }

    fn release(&mut self, event: &'static str) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        debug!("Releasing connection {} to {} on {}", handle.id(), handle.host(), event);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move { handle.destroy().await });
            }
            Err(_) => {
                // Pool connections close when the last reference drops
                warn!(
                    "No runtime to destroy connection {} to {} on {}",
                    handle.id(),
                    handle.host(),
                    event
                );
            }
        }
    }
}

impl Drop for SweepGuard {
    fn drop(&mut self) {
        self.on_close();
    }
}

pub struct SweepBody {
    inner: Body,
    guard: SweepGuard,
}

impl http_body::Body for SweepBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(None) => this.guard.on_finish(),
            Poll::Ready(Some(Err(_))) => this.guard.on_close(),
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
