//! Core type definitions for the RTU datapoint layer:
//!
//! - `Address` - kind-sensitive COA/IOA addressing
//! - `Cot` - cause of transmission
//! - `TypeId` - ASDU type identification and the command-type check
//! - `IoValue` - values exchanged with the backend
//! - `DataPoint` / `PrimitiveDataPoint` - datapoint shapes and the row
//!   conversion contract

mod address;
mod cot;
mod datapoint;
mod type_id;
mod value;

pub use address::*;
pub use cot::*;
pub use datapoint::*;
pub use type_id::*;
pub use value::*;
