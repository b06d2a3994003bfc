//! The RTU IO gateway.
//!
//! [`Rtu`] is the public get/set surface of the layer. It resolves an
//! address against the datapoint store, applies the command-type and
//! cause-of-transmission rules, and delegates query construction and
//! transmission to the composed [`QueryBackend`].
//!
//! Expected operational failures (unattached addresses, missing
//! relationships, rejected command types, failed transmissions) are
//! absorbed into absent results plus a warning log line, so call sites
//! never need error handling for them. Only construction and the
//! readiness wait surface real errors.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::backend::{PushSender, PushUpdate, QueryBackend};
use crate::error::{Result, RtuError};
use crate::log::{nop_sink, LogSink};
use crate::ready::ReadySignal;
use crate::store::{CotUpdate, DataPointStore};
use crate::types::{
    Address, Cot, DataPoint, Field, IoValue, PrimitiveDataPoint, TypeId, TypeIdCheck,
};

/// Capacity of the unsolicited-update channel.
const PUSH_CHANNEL_CAPACITY: usize = 100;

/// RTU construction parameters.
#[derive(Clone)]
pub struct RtuConfig {
    coa: Address,
    rows: Vec<Vec<Field>>,
    includes_relationship: bool,
    autostart: bool,
    log: Arc<dyn LogSink>,
}

impl RtuConfig {
    /// Create a configuration for an RTU with the given own COA.
    pub fn new(coa: impl Into<Address>) -> Self {
        Self {
            coa: coa.into(),
            rows: Vec::new(),
            includes_relationship: false,
            autostart: false,
            log: nop_sink(),
        }
    }

    /// Supply the datapoint rows the store is populated from.
    pub fn data_points(mut self, rows: Vec<Vec<Field>>) -> Self {
        self.rows = rows;
        self
    }

    /// Declare whether the rows carry the relationship cell at index 4.
    ///
    /// Without it, an empty relationship is inserted at that canonical
    /// position during conversion.
    pub fn includes_relationship(mut self, includes: bool) -> Self {
        self.includes_relationship = includes;
        self
    }

    /// Start the backend and wait for readiness at the end of
    /// construction.
    pub fn autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }

    /// Install a log sink. Without one, a no-op sink is used.
    pub fn logger(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }
}

/// The RTU: datapoint store plus IO gateway over a composed backend.
pub struct Rtu<B: QueryBackend> {
    store: DataPointStore,
    backend: B,
    log: Arc<dyn LogSink>,
    ready: ReadySignal,
    started: AtomicBool,
    push_tx: PushSender,
    push_rx: Option<mpsc::Receiver<PushUpdate>>,
}

impl<B: QueryBackend> Rtu<B> {
    /// Build the RTU from a backend and configuration.
    ///
    /// Populates the datapoint store from the configured rows and runs
    /// the relationship check once; a malformed row, a duplicate key or
    /// a dangling relationship is a fatal configuration error and no
    /// RTU is produced. With `autostart` set, the backend is started
    /// and readiness awaited before this returns.
    pub async fn new(backend: B, config: RtuConfig) -> Result<Self> {
        let RtuConfig {
            coa,
            rows,
            includes_relationship,
            autostart,
            log,
        } = config;

        if !includes_relationship {
            log.info("datapoint rows carry no relationship column; inserting empty relationships");
        }

        let store = match DataPointStore::from_rows(coa, &rows, includes_relationship) {
            Ok(store) => store,
            Err(err) => {
                log.critical(&format!("refusing to build RTU: {err}"));
                return Err(err);
            }
        };

        let dangling = store.dangling_relationships();
        if let Some((first, related)) = dangling.first().cloned() {
            for (dp, related) in &dangling {
                log.critical(&format!(
                    "invalid relationship for datapoint {dp}: no datapoint with IOA {related} under COA {coa}",
                    coa = dp.coa
                ));
            }
            return Err(RtuError::DanglingRelationship {
                coa: first.coa,
                ioa: first.ioa,
                related,
            });
        }

        let (push_tx, push_rx) = mpsc::channel(PUSH_CHANNEL_CAPACITY);
        let rtu = Self {
            store,
            backend,
            log,
            ready: ReadySignal::new(),
            started: AtomicBool::new(false),
            push_tx,
            push_rx: Some(push_rx),
        };

        if autostart {
            rtu.wait_until_ready(None).await?;
        }

        Ok(rtu)
    }

    /// The RTU's own COA.
    #[inline]
    pub fn coa(&self) -> &Address {
        self.store.coa()
    }

    /// The composed backend.
    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Check readiness without waiting.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready.is_set()
    }

    /// Start the backend (once) and block until the readiness signal
    /// fires or `timeout` elapses.
    ///
    /// Fails with [`RtuError::ReadyTimeout`] when the bound is
    /// exceeded; callers may retry or abort.
    pub async fn wait_until_ready(&self, timeout: Option<Duration>) -> Result<()> {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.backend.start(&self.ready, &self.push_tx).await?;
            self.log.info("backend started");
        }
        self.ready.wait(timeout).await
    }

    /// Stop the backend and clear the readiness signal.
    ///
    /// The deterministic teardown path; dropping the RTU only clears
    /// the signal as a safety net.
    pub async fn stop(&self) -> Result<()> {
        self.backend.stop().await?;
        self.ready.clear();
        self.started.store(false, Ordering::Release);
        self.log.info("backend stopped");
        Ok(())
    }

    /// Take the receiving half of the unsolicited-update channel.
    ///
    /// This can only be called once. Returns None if already taken.
    pub fn subscribe(&mut self) -> Option<mpsc::Receiver<PushUpdate>> {
        self.push_rx.take()
    }

    /// Retrieve the IO of an attached datapoint.
    ///
    /// `cot` of [`Cot::DEFAULT`] uses the cause the datapoint was
    /// configured with. A non-sentinel `type_id` enables the
    /// command-type restriction. Absent covers unattached addresses,
    /// rejected command types and failed transmissions alike; the log
    /// line disambiguates.
    pub async fn get(
        &self,
        coa: &Address,
        ioa: &Address,
        cot: Cot,
        type_id: TypeId,
    ) -> Option<IoValue> {
        let Some(dp) = self.store.get(coa, ioa) else {
            self.log.warning(&format!(
                "tried to get IO for unattached datapoint (coa {coa}, ioa {ioa})"
            ));
            return None;
        };

        if !self.command_type_permitted("get", &dp, type_id) {
            return None;
        }

        let cot = cot.or_default(dp.cot);
        let query = self.backend.build_query(coa, ioa, cot, None).await;
        let result = self.backend.send_query(query).await;

        match &result {
            None => self.log.warning(&format!(
                "retrieving IO for attached datapoint (coa {coa}, ioa {ioa}, cot {cot}) failed"
            )),
            Some(value) => {
                if let Some(domain) = type_id.permitted_values() {
                    if !domain.permits(value) {
                        self.log.warning(&format!(
                            "retrieved IO {value} outside the permitted set for type ID {type_id} from (coa {coa}, ioa {ioa})"
                        ));
                    }
                }
                self.log.debug(&format!(
                    "get (coa {coa}, ioa {ioa}, cot {cot}) answered with {value}"
                ));
            }
        }
        result
    }

    /// Overwrite the IO of an attached datapoint.
    ///
    /// The flow mirrors [`Rtu::get`], with the query carrying `value`.
    /// By the backend contract an absent `value` builds a read query,
    /// so set cannot express an intentional absent write; this is a
    /// documented limitation of the capability interface, not special-
    /// cased here. A value outside the permitted set for `type_id` is
    /// logged but still sent.
    pub async fn set(
        &self,
        coa: &Address,
        ioa: &Address,
        value: Option<IoValue>,
        cot: Cot,
        type_id: TypeId,
    ) -> Option<IoValue> {
        let Some(dp) = self.store.get(coa, ioa) else {
            self.log.warning(&format!(
                "tried to set IO for unattached datapoint (coa {coa}, ioa {ioa})"
            ));
            return None;
        };

        if !self.command_type_permitted("set", &dp, type_id) {
            return None;
        }

        if let (Some(value), Some(domain)) = (&value, type_id.permitted_values()) {
            if !domain.permits(value) {
                self.log.warning(&format!(
                    "setting IO {value} outside the permitted set for type ID {type_id} on (coa {coa}, ioa {ioa})"
                ));
            }
        }

        let cot = cot.or_default(dp.cot);
        let query = self.backend.build_query(coa, ioa, cot, value).await;
        let result = self.backend.send_query(query).await;

        match &result {
            None => self.log.warning(&format!(
                "setting IO for attached datapoint (coa {coa}, ioa {ioa}, cot {cot}) failed"
            )),
            Some(ack) => self.log.debug(&format!(
                "set (coa {coa}, ioa {ioa}, cot {cot}) acknowledged with {ack}"
            )),
        }
        result
    }

    /// Retrieve the IO of the datapoint related to `(coa, ioa)`.
    pub async fn get_related(
        &self,
        coa: &Address,
        ioa: &Address,
        cot: Cot,
        type_id: TypeId,
    ) -> Option<IoValue> {
        let Some(related) = self.resolve_related("get", coa, ioa) else {
            return None;
        };
        self.get(&related.coa, &related.ioa, cot, type_id).await
    }

    /// Overwrite the IO of the datapoint related to `(coa, ioa)`.
    pub async fn set_related(
        &self,
        coa: &Address,
        ioa: &Address,
        value: Option<IoValue>,
        cot: Cot,
        type_id: TypeId,
    ) -> Option<IoValue> {
        let Some(related) = self.resolve_related("set", coa, ioa) else {
            return None;
        };
        self.set(&related.coa, &related.ioa, value, cot, type_id)
            .await
    }

    /// Check whether a datapoint is attached at `(coa, ioa)`.
    #[inline]
    pub fn has(&self, coa: &Address, ioa: &Address) -> bool {
        self.store.contains(coa, ioa)
    }

    /// The primitive datapoint at `(coa, ioa)`, if attached.
    pub fn data_point(&self, coa: &Address, ioa: &Address) -> Option<PrimitiveDataPoint> {
        self.store.get(coa, ioa).map(|dp| dp.primitive())
    }

    /// The primitive datapoint at `(coa, ioa)` paired with a freshly
    /// queried IO (queried with the configured cause).
    pub async fn data_point_with_value(
        &self,
        coa: &Address,
        ioa: &Address,
    ) -> Option<(PrimitiveDataPoint, Option<IoValue>)> {
        let dp = self.store.get(coa, ioa)?;
        let value = self.get(coa, ioa, Cot::DEFAULT, TypeId::UNSPECIFIED).await;
        Some((dp.primitive(), value))
    }

    /// The primitive datapoint related to `(coa, ioa)`, if any.
    pub fn related_data_point(
        &self,
        coa: &Address,
        ioa: &Address,
    ) -> Option<PrimitiveDataPoint> {
        self.store.get_related(coa, ioa).map(|dp| dp.primitive())
    }

    /// The related primitive datapoint paired with a freshly queried
    /// IO.
    pub async fn related_data_point_with_value(
        &self,
        coa: &Address,
        ioa: &Address,
    ) -> Option<(PrimitiveDataPoint, Option<IoValue>)> {
        let related = self.store.get_related(coa, ioa)?;
        self.data_point_with_value(&related.coa, &related.ioa).await
    }

    /// The complete datapoint at `(coa, ioa)` including backend
    /// extras. Mostly useful to backend implementations.
    pub fn complex_data_point(&self, coa: &Address, ioa: &Address) -> Option<DataPoint> {
        self.store.get(coa, ioa)
    }

    /// The complete related datapoint including backend extras.
    pub fn related_complex_data_point(
        &self,
        coa: &Address,
        ioa: &Address,
    ) -> Option<DataPoint> {
        self.store.get_related(coa, ioa)
    }

    /// All IOAs under `coa`; `None` selects the RTU's own COA.
    pub fn ioas(&self, coa: Option<&Address>) -> HashSet<Address> {
        self.store.ioas(coa)
    }

    /// All attached primitive datapoints.
    pub fn data_points(&self) -> HashSet<PrimitiveDataPoint> {
        self.store.data_points()
    }

    /// Keys of all datapoints the RTU expects periodic updates from.
    pub fn periodic_ids(&self) -> HashSet<(Address, Address)> {
        self.store.periodic_ids()
    }

    /// Primitive datapoints the RTU expects periodic updates from.
    pub fn periodic_data_points(&self) -> HashSet<PrimitiveDataPoint> {
        self.store.periodic_data_points()
    }

    /// IOAs of periodic datapoints under `coa`; `None` selects the
    /// RTU's own COA.
    pub fn periodic_ioas(&self, coa: Option<&Address>) -> HashSet<Address> {
        self.store.periodic_ioas(coa)
    }

    /// Validate a supplied type ID against the datapoint at
    /// `(coa, ioa)`.
    pub fn validate_type_id(
        &self,
        coa: &Address,
        ioa: &Address,
        type_id: TypeId,
    ) -> TypeIdCheck {
        match self.store.get(coa, ioa) {
            None => TypeIdCheck::Unattached,
            Some(dp) => TypeId::validate_command(dp.type_id, type_id),
        }
    }

    /// Change the default cause of transmission of the addressed
    /// datapoint.
    ///
    /// An unattached address or a cause outside [1,47] is rejected with
    /// a warning, without raising. Whenever the previous or the new
    /// cause is the periodic cause, the backend is additionally
    /// signaled so it can mirror the change in its model.
    pub async fn change_cause_of_transmission(
        &self,
        coa: &Address,
        ioa: &Address,
        new_cot: u8,
    ) {
        match self.store.update_cot(coa, ioa, new_cot) {
            CotUpdate::Unattached => self.log.warning(&format!(
                "cannot change COT for unattached datapoint (coa {coa}, ioa {ioa})"
            )),
            CotUpdate::InvalidCot => self.log.warning(&format!(
                "tried to change COT to invalid value {new_cot} for datapoint (coa {coa}, ioa {ioa})"
            )),
            update @ CotUpdate::Updated { previous, current } => {
                self.log.debug(&format!(
                    "changed COT of (coa {coa}, ioa {ioa}) from {previous} to {current}"
                ));
                if update.touches_periodicity() {
                    self.backend.periodicity_changed(coa, ioa, current).await;
                }
            }
        }
    }

    fn command_type_permitted(&self, op: &str, dp: &DataPoint, type_id: TypeId) -> bool {
        if type_id.is_unspecified() {
            return true;
        }
        let check = TypeId::validate_command(dp.type_id, type_id);
        if check.permits_query() {
            true
        } else {
            self.log.warning(&format!(
                "rejecting {op} query with command type ID {type_id} for (coa {coa}, ioa {ioa}); \
                 this datapoint expects type ID {stored} for command queries",
                coa = dp.coa,
                ioa = dp.ioa,
                stored = dp.type_id
            ));
            false
        }
    }

    fn resolve_related(&self, op: &str, coa: &Address, ioa: &Address) -> Option<DataPoint> {
        let related = self.store.get_related(coa, ioa);
        if related.is_none() {
            self.log.warning(&format!(
                "cannot {op} related IO for (coa {coa}, ioa {ioa}): no resolvable relationship"
            ));
        }
        related
    }
}

impl<B: QueryBackend> Drop for Rtu<B> {
    fn drop(&mut self) {
        // safety net only; releasing backend resources needs stop()
        if self.ready.is_set() {
            self.ready.clear();
            self.log
                .debug("RTU dropped while ready; backend resources require an explicit stop()");
        }
    }
}
