//! Test doubles for [`RemoteCaller`].
//!
//! Compiled only with the `test-support` feature; production wiring never
//! sees these types. Their own tests live in `tests/test_support.rs`, which
//! requires the same feature.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::caller::RemoteCaller;
use crate::outcome::RemoteOutcome;
use crate::request::{Method, RemoteRequest};

/// A call observed by [`ScriptedCaller`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct ScriptState {
    queued: HashMap<String, VecDeque<RemoteOutcome>>,
    fallback: HashMap<String, RemoteOutcome>,
    calls: Vec<RecordedCall>,
}

/// Answers calls from a script keyed by `"METHOD url"`.
///
/// Queued outcomes are consumed first, then the route's fallback. Calls to
/// unscripted routes get a transient failure.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCaller {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedCaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one outcome for the route.
    pub fn on(&self, method: Method, url: &str, outcome: RemoteOutcome) -> &Self {
        self.state
            .lock()
            .unwrap()
            .queued
            .entry(route(&method, url))
            .or_default()
            .push_back(outcome);
        self
    }

    /// Answers every call to the route with `outcome` once the queue is empty.
    pub fn always(&self, method: Method, url: &str, outcome: RemoteOutcome) -> &Self {
        self.state
            .lock()
            .unwrap()
            .fallback
            .insert(route(&method, url), outcome);
        self
    }

    /// Every call received, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of calls received for the route.
    pub fn call_count(&self, method: Method, url: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.method == method && c.url == url)
            .count()
    }
}

fn route(method: &Method, url: &str) -> String {
    format!("{method} {url}")
}

#[async_trait]
impl RemoteCaller for ScriptedCaller {
    async fn call(&self, request: &RemoteRequest) -> RemoteOutcome {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall {
            method: request.method.clone(),
            url: request.url.clone(),
            body: request.body.clone(),
        });

        let key = route(&request.method, &request.url);
        if let Some(outcome) = state.queued.get_mut(&key).and_then(VecDeque::pop_front) {
            return outcome;
        }
        state.fallback.get(&key).cloned().unwrap_or_else(|| {
            RemoteOutcome::TransientNetworkFailure(format!("no scripted response for {key}"))
        })
    }
}

/// Wraps a caller and replaces a fraction of its answers with `fault`.
///
/// Models the randomly failing collaborators used to exercise compensation.
#[derive(Debug)]
pub struct FaultInjectingCaller<C> {
    inner: C,
    rate: f64,
    fault: RemoteOutcome,
    injected: AtomicUsize,
}

impl<C: RemoteCaller> FaultInjectingCaller<C> {
    /// `rate` is the probability in `[0, 1]` that a call returns `fault`
    /// without reaching `inner`.
    pub fn new(inner: C, rate: f64, fault: RemoteOutcome) -> Self {
        Self {
            inner,
            rate: rate.clamp(0.0, 1.0),
            fault,
            injected: AtomicUsize::new(0),
        }
    }

    /// How many calls were answered with the injected fault.
    pub fn injected(&self) -> usize {
        self.injected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<C: RemoteCaller> RemoteCaller for FaultInjectingCaller<C> {
    async fn call(&self, request: &RemoteRequest) -> RemoteOutcome {
        if rand::random::<f64>() < self.rate {
            self.injected.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(endpoint = %request.target(), "injecting fault");
            return self.fault.clone();
        }
        self.inner.call(request).await
    }
}

