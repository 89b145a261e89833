//! Scripted `ClientConnector` that never touches the network.
//!
//! Addresses starting with `down` are refused. Every dial (a connect attempt
//! that got past address validation) is counted, as is every close.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use opsdeck_core::{ClientConnector, ClientHandle};
use opsdeck_domain::{
    ConnectError, InstanceDescriptor, InstanceId, OpsDeckError, ResourceKind,
    Result as DomainResult,
};

#[derive(Default)]
pub struct Counters {
    pub dials: AtomicUsize,
    pub closes: AtomicUsize,
}

impl Counters {
    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub struct FakeConnector {
    pub counters: Arc<Counters>,
    delay: Duration,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self { counters: Arc::new(Counters::default()), delay: Duration::ZERO }
    }

    /// Sleep this long inside every dial.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ClientConnector for FakeConnector {
    type Handle = FakeClient;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Elasticsearch
    }

    async fn connect(&self, descriptor: &InstanceDescriptor) -> Result<FakeClient, ConnectError> {
        let Some(address) = descriptor.address() else {
            return Err(ConnectError::MissingAddress(descriptor.id));
        };

        self.counters.dials.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if address.starts_with("down") {
            return Err(ConnectError::ConnectRefused {
                instance_id: descriptor.id,
                address: address.to_string(),
                reason: "connection refused".into(),
            });
        }

        Ok(FakeClient {
            instance_id: descriptor.id,
            address: address.to_string(),
            closed: AtomicBool::new(false),
            counters: Arc::clone(&self.counters),
        })
    }
}

#[derive(Debug)]
pub struct FakeClient {
    pub instance_id: InstanceId,
    pub address: String,
    closed: AtomicBool,
    counters: Arc<Counters>,
}

impl FakeClient {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Counters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Counters")
            .field("dials", &self.dials())
            .field("closes", &self.closes())
            .finish()
    }
}

#[async_trait]
impl ClientHandle for FakeClient {
    async fn close(&self) -> DomainResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(OpsDeckError::Internal("client already closed".into()));
        }
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
