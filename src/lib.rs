//! # voltage_rtu
//!
//! Backend-agnostic RTU datapoint layer with IEC 60870-5-104 addressing
//! semantics.
//!
//! This crate models the supervisory side of an RTU (Remote Terminal
//! Unit): a store of addressed datapoints, the IEC-104-flavored
//! validation rules around them, and a get/set gateway that delegates
//! query construction and transmission to an interchangeable backend
//! (physical hardware, a local simulator, or a distributed
//! grid-simulation fabric).
//!
//! ## Features
//!
//! - **Kind-sensitive addressing**: numeric and symbolic COA/IOA keys
//!   that never alias
//! - **Relationship integrity**: datapoint cross-references checked once,
//!   fatally, at construction
//! - **Command-type restriction**: command queries (type IDs 45-69) are
//!   pinned to the type a datapoint was declared for
//! - **Periodic bookkeeping**: derived views over all datapoints with
//!   cause-of-transmission 1
//! - **Composed backends**: `build_query`/`send_query` capability trait,
//!   injected rather than subclassed
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use voltage_rtu::{Cot, Field, IoValue, QueryBackend, Rtu, RtuConfig, TypeId};
//!
//! #[tokio::main]
//! async fn main() -> voltage_rtu::Result<()> {
//!     // rows of [coa, ioa, type_id, cot, related_ioa?, extras...]
//!     let rows = vec![
//!         vec![Field::Int(1), Field::Int(10), Field::Int(30), Field::Int(20)],
//!         vec![Field::Int(1), Field::Int(11), Field::Int(45), Field::Int(6)],
//!     ];
//!
//!     let backend = MySimulatorBackend::connect("sim:9500").await?;
//!     let rtu = Rtu::new(
//!         backend,
//!         RtuConfig::new(1i64).data_points(rows).autostart(true),
//!     )
//!     .await?;
//!
//!     // read with the configured cause, write a single command
//!     let value = rtu.get(&1i64.into(), &10i64.into(), Cot::DEFAULT, TypeId::UNSPECIFIED).await;
//!     rtu.set(
//!         &1i64.into(),
//!         &11i64.into(),
//!         Some(IoValue::Bool(true)),
//!         Cot::DEFAULT,
//!         TypeId::UNSPECIFIED,
//!     )
//!     .await;
//!
//!     rtu.stop().await
//! }
//! ```
//!
//! ## Layer Boundary
//!
//! The crate deliberately stops at the backend capability:
//!
//! ```text
//! caller ──> Rtu (resolve, validate, effective COT) ──> QueryBackend
//!                                                        build_query
//!                                                        send_query
//! ```
//!
//! Everything behind `build_query`/`send_query` (wire protocol,
//! transport, simulation) belongs to the concrete backend. Expected
//! operational failures come back as absent values with warning log
//! context rather than errors.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod backend;
pub mod error;
pub mod log;
pub mod ready;
pub mod rtu;
pub mod store;
pub mod types;

// Re-export main types
pub use backend::{PushSender, PushUpdate, QueryBackend};
pub use error::{Result, RtuError};
pub use log::{nop_sink, LogSink, NopSink};
#[cfg(feature = "tracing-support")]
pub use log::TracingSink;
pub use ready::ReadySignal;
pub use rtu::{Rtu, RtuConfig};
pub use store::{CotUpdate, DataPointStore};
pub use types::*;
