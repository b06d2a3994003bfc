//! Backend capability interface.
//!
//! The RTU layer never builds or transmits a query itself. A concrete
//! backend (hardware bus, local simulator, distributed grid fabric)
//! implements [`QueryBackend`] and is composed into the gateway at
//! construction time; the gateway resolves and validates addressing,
//! then delegates here.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::ready::ReadySignal;
use crate::types::{Address, Cot, IoValue};

/// An unsolicited value pushed from the backend toward the RTU.
#[derive(Debug, Clone, PartialEq)]
pub struct PushUpdate {
    /// COA scope of the originating datapoint.
    pub coa: Address,
    /// IOA of the originating datapoint.
    pub ioa: Address,
    /// The pushed value.
    pub value: IoValue,
}

/// Sending half of the unsolicited-update channel, handed to the
/// backend at startup. Not every backend pushes values; ones that do
/// clone this and send from wherever their event loop lives.
pub type PushSender = mpsc::Sender<PushUpdate>;

/// Capability interface implemented by concrete backends.
///
/// Only `build_query` and `send_query` are required; the lifecycle
/// hooks have defaults suitable for backends without startup
/// coordination or resources to release.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// The backend's query representation, opaque to the gateway.
    type Query: Send;

    /// Construct a backend-specific query for the datapoint at
    /// `(coa, ioa)` with cause `cot`.
    ///
    /// The gateway resolves the cause before calling, so `cot` is never
    /// the sentinel here. `value` of `None` means "build a read query";
    /// any other value means "build a write query carrying it". The
    /// gateway only calls this for attached datapoints; behavior for
    /// unattached addresses is undefined.
    async fn build_query(
        &self,
        coa: &Address,
        ioa: &Address,
        cot: Cot,
        value: Option<IoValue>,
    ) -> Self::Query;

    /// Transmit a query built by [`QueryBackend::build_query`].
    ///
    /// `None` signals failure. A non-absent result is either a read's
    /// returned value or a write acknowledgment, at the backend's
    /// discretion.
    async fn send_query(&self, query: Self::Query) -> Option<IoValue>;

    /// The default cause of transmission of the datapoint at
    /// `(coa, ioa)` changed in a way that affects periodic delivery.
    ///
    /// The gateway calls this whenever the previous or the new cause is
    /// the periodic cause (1), so backends can start or stop whatever
    /// mechanism produces the unsolicited updates.
    async fn periodicity_changed(&self, _coa: &Address, _ioa: &Address, _new_cot: Cot) {}

    /// Start backend-specific communication and mark `ready` once the
    /// RTU can serve queries.
    ///
    /// Backends pushing unsolicited values keep a clone of `updates`.
    /// The default marks readiness immediately, for backends with no
    /// startup coordination.
    async fn start(&self, ready: &ReadySignal, _updates: &PushSender) -> Result<()> {
        ready.set();
        Ok(())
    }

    /// Release backend-specific resources.
    async fn stop(&self) -> Result<()> {
        Ok(())
    }
}
