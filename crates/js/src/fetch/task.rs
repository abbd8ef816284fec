use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};

use log::{debug, trace};

use super::response::{FetchReply, Response};
use crate::bindings::{JSError, JSValue};
use crate::bridge::HostBridge;

/// Where a fetch task stands.
#[derive(Debug)]
pub enum FetchState {
    /// Waiting on the host task with this id.
    Pending(String),
    Completed(Response),
    Failed(JSError),
    /// The outcome was handed to the awaiting caller.
    Finished,
}

/// An in-flight fetch.
///
/// Each poll asks the host once. While the host has no outcome the task wakes
/// itself and returns `Pending`, which puts it at the back of the scheduler's
/// ready queue: every other runnable continuation gets a turn before the next
/// host poll.
#[derive(Debug)]
pub struct FetchTask {
    bridge: HostBridge,
    state: FetchState,
    polls: usize,
}

impl FetchTask {
    pub(crate) fn pending(bridge: HostBridge, id: String) -> Self {
        Self {
            bridge,
            state: FetchState::Pending(id),
            polls: 0,
        }
    }

    pub(crate) fn failed(bridge: HostBridge, error: JSError) -> Self {
        Self {
            bridge,
            state: FetchState::Failed(error),
            polls: 0,
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    /// Host task id, while the task is pending.
    pub fn id(&self) -> Option<&str> {
        match &self.state {
            FetchState::Pending(id) => Some(id),
            _ => None,
        }
    }

    /// How many times the host has been polled.
    pub const fn poll_count(&self) -> usize {
        self.polls
    }

    /// Ask the host once and advance the state if the task reached a terminal outcome.
    pub fn poll_host(&mut self) -> bool {
        let FetchState::Pending(id) = &self.state else {
            return true;
        };
        self.polls += 1;
        let reply = self
            .bridge
            .call_json_optional::<FetchReply>("fetch", "poll", vec![JSValue::from(id.as_str())]);
        match reply {
            Ok(None) => {
                trace!("fetch task {id} still pending after {} polls", self.polls);
                return false;
            }
            Ok(Some(reply)) => {
                debug!("fetch task {id} completed with status {}", reply.status);
                self.state = FetchState::Completed(Response::from_reply(reply));
            }
            Err(failure) => {
                debug!("fetch task {id} failed: {}", failure.message);
                self.state = FetchState::Failed(failure.into_error(JSError::Network));
            }
        }
        true
    }
}

impl Future for FetchTask {
    type Output = Result<Response, JSError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if !this.poll_host() {
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        match mem::replace(&mut this.state, FetchState::Finished) {
            FetchState::Completed(response) => Poll::Ready(Ok(response)),
            FetchState::Failed(error) => Poll::Ready(Err(error)),
            FetchState::Pending(_) | FetchState::Finished => Poll::Ready(Err(JSError::InternalError(
                String::from("fetch task polled after completion"),
            ))),
        }
    }
}
