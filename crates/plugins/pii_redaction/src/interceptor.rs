// Copyright 2026
// SPDX-License-Identifier: Apache-2.0
//
// Call interception: redact the arguments, forward, redact the result.
//
// Downstream failures are returned as-is and never redacted. Any redaction
// failure rejects the call, before forwarding when it happens inbound.

use crate::config::RedactionConfig;
use crate::engine::{Redactable, RedactionEngine};
use crate::error::{CallError, ConfigError, RedactionError};
use crate::observer::{NoopObserver, RedactionObserver};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

pub const TOOLS_CALL_METHOD: &str = "tools/call";

/// Lifecycle of one intercepted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Received,
    InboundRedacted,
    Forwarded,
    AwaitingResult,
    OutboundRedacted,
    Returned,
    Errored,
    Cancelled,
}

impl CallState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CallState::Returned | CallState::Errored | CallState::Cancelled)
    }

    pub fn can_transition_to(self, next: CallState) -> bool {
        use CallState::*;
        matches!(
            (self, next),
            (Received, InboundRedacted | Errored | Cancelled)
                | (InboundRedacted, Forwarded | Cancelled)
                | (Forwarded, AwaitingResult | Errored | Cancelled)
                | (AwaitingResult, OutboundRedacted | Errored | Cancelled)
                | (OutboundRedacted, Returned)
        )
    }
}

/// Transport data that travels with a call but is never redacted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallMetadata {
    /// JSON-RPC request id, if the transport supplied one.
    pub request_id: Option<Value>,
    pub tool: String,
    /// The `_meta` object of the request.
    pub meta: Option<Map<String, Value>>,
}

/// A call as seen by the interceptor: metadata plus the redactable params.
#[derive(Debug, Clone, PartialEq)]
pub struct CallEnvelope {
    pub metadata: CallMetadata,
    /// Tool arguments. Must be an object, or `Null` when absent.
    pub params: Value,
}

impl CallEnvelope {
    pub fn new(tool: impl Into<String>, params: Value) -> Self {
        Self {
            metadata: CallMetadata {
                tool: tool.into(),
                ..CallMetadata::default()
            },
            params,
        }
    }

    /// Splits a JSON-RPC `tools/call` request into metadata and arguments.
    pub fn from_message(message: Value) -> Result<Self, RedactionError> {
        let Value::Object(mut message) = message else {
            return Err(RedactionError::Schema { kind: "message is not an object" });
        };
        if message.get("method").and_then(Value::as_str) != Some(TOOLS_CALL_METHOD) {
            return Err(RedactionError::Schema { kind: "message is not a tools/call request" });
        }
        let request_id = message.remove("id");
        let mut params = match message.remove("params") {
            Some(Value::Object(params)) => params,
            _ => return Err(RedactionError::Schema { kind: "tools/call params are not an object" }),
        };
        let tool = match params.remove("name") {
            Some(Value::String(name)) => name,
            _ => return Err(RedactionError::Schema { kind: "tools/call has no tool name" }),
        };
        let meta = match params.remove("_meta") {
            None => None,
            Some(Value::Object(meta)) => Some(meta),
            Some(_) => return Err(RedactionError::Schema { kind: "_meta is not an object" }),
        };
        let arguments = params.remove("arguments").unwrap_or(Value::Null);

        Ok(Self {
            metadata: CallMetadata {
                request_id,
                tool,
                meta,
            },
            params: arguments,
        })
    }

    /// Rebuilds the JSON-RPC request. `Null` params are omitted.
    pub fn into_message(self) -> Value {
        let CallMetadata {
            request_id,
            tool,
            meta,
        } = self.metadata;

        let mut params = Map::new();
        params.insert("name".to_string(), Value::String(tool));
        if let Some(meta) = meta {
            params.insert("_meta".to_string(), Value::Object(meta));
        }
        if !self.params.is_null() {
            params.insert("arguments".to_string(), self.params);
        }

        let mut message = Map::new();
        message.insert("jsonrpc".to_string(), Value::from("2.0"));
        if let Some(id) = request_id {
            message.insert("id".to_string(), id);
        }
        message.insert("method".to_string(), Value::from(TOOLS_CALL_METHOD));
        message.insert("params".to_string(), Value::Object(params));
        Value::Object(message)
    }
}

/// Per-call bookkeeping. Created when a call arrives and dropped when it ends.
pub struct CallContext {
    call_id: String,
    tool: String,
    state: CallState,
    observer: Arc<dyn RedactionObserver>,
}

impl CallContext {
    pub fn new(metadata: &CallMetadata, observer: Arc<dyn RedactionObserver>) -> Self {
        let call_id = match &metadata.request_id {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        };
        Self {
            call_id,
            tool: metadata.tool.clone(),
            state: CallState::Received,
            observer,
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    fn transition(&mut self, next: CallState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal call transition {:?} -> {:?}",
            self.state,
            next
        );
        self.observer
            .on_state_change(&self.call_id, &self.tool, self.state, next);
        self.state = next;
    }
}

/// Wraps a downstream handler with inbound and outbound redaction.
#[derive(Clone)]
pub struct Interceptor {
    engine: Arc<RedactionEngine>,
    observer: Arc<dyn RedactionObserver>,
    offload_threshold: usize,
    blocking_permits: Arc<Semaphore>,
}

impl Interceptor {
    pub fn new(engine: Arc<RedactionEngine>) -> Self {
        let defaults = RedactionConfig::default();
        Self {
            engine,
            observer: Arc::new(NoopObserver),
            offload_threshold: defaults.offload_threshold_bytes,
            blocking_permits: Arc::new(Semaphore::new(defaults.max_blocking_redactions)),
        }
    }

    /// Builds the engine from `config` and shares `observer` between the
    /// engine and the call pipeline.
    pub fn from_config(
        config: &RedactionConfig,
        observer: Arc<dyn RedactionObserver>,
    ) -> Result<Self, ConfigError> {
        let engine = RedactionEngine::from_config(config)?.with_observer(Arc::clone(&observer));
        Ok(Self::new(Arc::new(engine))
            .with_observer(observer)
            .with_offload(config.offload_threshold_bytes, config.max_blocking_redactions))
    }

    pub fn with_observer(mut self, observer: Arc<dyn RedactionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Payloads heavier than `threshold` string bytes are redacted on the
    /// blocking pool, at most `permits` at a time.
    pub fn with_offload(mut self, threshold: usize, permits: usize) -> Self {
        self.offload_threshold = threshold;
        self.blocking_permits = Arc::new(Semaphore::new(permits.max(1)));
        self
    }

    pub fn engine(&self) -> &Arc<RedactionEngine> {
        &self.engine
    }

    /// Redacts a payload, offloading heavy ones to `spawn_blocking`.
    pub async fn redact_payload<R>(&self, mut payload: R) -> Result<R, RedactionError>
    where
        R: Redactable + Send + 'static,
    {
        if payload.string_weight() <= self.offload_threshold {
            payload.redact_with(&self.engine)?;
            return Ok(payload);
        }

        let permit = Arc::clone(&self.blocking_permits)
            .acquire_owned()
            .await
            .map_err(|_| RedactionError::WorkerFailed)?;
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            payload.redact_with(&engine).map(|()| payload)
        })
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "redaction worker did not complete");
            RedactionError::WorkerFailed
        })?
    }

    /// Runs one call through the pipeline.
    ///
    /// `handler` only ever sees the redacted envelope and is not invoked when
    /// inbound redaction fails. If `cancel` fires while the handler runs, the
    /// handler future is dropped and no result is produced.
    pub async fn intercept<R, E, F, Fut>(
        &self,
        envelope: CallEnvelope,
        cancel: &CancellationToken,
        handler: F,
    ) -> Result<R, CallError<E>>
    where
        R: Redactable + Send + 'static,
        F: FnOnce(CallEnvelope) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        let CallEnvelope { metadata, params } = envelope;
        let mut ctx = CallContext::new(&metadata, Arc::clone(&self.observer));

        if !matches!(params, Value::Object(_) | Value::Null) {
            let err = RedactionError::Schema {
                kind: "call params are not a mapping",
            };
            return Err(self.reject(&mut ctx, err));
        }
        let params = match self.redact_payload(params).await {
            Ok(params) => params,
            Err(err) => return Err(self.reject(&mut ctx, err)),
        };
        ctx.transition(CallState::InboundRedacted);

        if cancel.is_cancelled() {
            return Err(self.cancelled(&mut ctx));
        }

        ctx.transition(CallState::Forwarded);
        let call = handler(CallEnvelope { metadata, params });
        ctx.transition(CallState::AwaitingResult);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(self.cancelled(&mut ctx)),
            outcome = call => outcome,
        };

        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                ctx.transition(CallState::Errored);
                self.observer.on_downstream_error(ctx.call_id(), ctx.tool());
                return Err(CallError::Downstream(err));
            }
        };

        match self.redact_payload(result).await {
            Ok(result) => {
                ctx.transition(CallState::OutboundRedacted);
                ctx.transition(CallState::Returned);
                Ok(result)
            }
            Err(err) => Err(self.reject(&mut ctx, err)),
        }
    }

    fn reject<E>(&self, ctx: &mut CallContext, error: RedactionError) -> CallError<E> {
        ctx.transition(CallState::Errored);
        self.observer.on_rejected(ctx.call_id(), ctx.tool(), &error);
        CallError::Rejected(error)
    }

    fn cancelled<E>(&self, ctx: &mut CallContext) -> CallError<E> {
        ctx.transition(CallState::Cancelled);
        self.observer.on_cancelled(ctx.call_id(), ctx.tool());
        CallError::Cancelled
    }
}

impl std::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor")
            .field("engine", &self.engine)
            .field("offload_threshold", &self.offload_threshold)
            .finish_non_exhaustive()
    }
}
