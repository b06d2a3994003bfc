//! Datapoint definitions and the row conversion contract.
//!
//! Datapoint configurations arrive as rows of loosely typed cells, the
//! way they come out of a station table or a simulator export. One row
//! is `[coa, ioa, type_id, cot, related_ioa?, extras...]`; the first
//! four or five cells convert into the fixed shape below, everything
//! after them is backend-specific and passes through untouched.

use crate::error::{Result, RtuError};
use crate::types::{Address, Cot, TypeId};

/// One cell of an externally supplied datapoint row.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Integer cell.
    Int(i64),
    /// Floating-point cell.
    Float(f64),
    /// Text cell.
    Text(String),
    /// Boolean cell.
    Bool(bool),
    /// Empty cell.
    Empty,
}

impl Field {
    fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bool(_) => "boolean",
            Self::Empty => "empty",
        }
    }
}

impl From<i64> for Field {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Field {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Field {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&Address> for Field {
    fn from(value: &Address) -> Self {
        match value {
            Address::Numeric(v) => Self::Int(*v),
            Address::Text(s) => Self::Text(s.clone()),
        }
    }
}

/// A complete datapoint as held by the store: the primitive quintuple
/// plus backend-specific extras.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    /// Common address of the owning station scope.
    pub coa: Address,
    /// Information object address within the COA scope.
    pub ioa: Address,
    /// ASDU type the datapoint was declared for.
    pub type_id: TypeId,
    /// Configured default cause of transmission.
    pub cot: Cot,
    /// IOA of a related datapoint in the same COA scope, if any.
    pub related_ioa: Option<Address>,
    /// Backend-specific trailing cells, opaque to the core.
    pub extra: Vec<Field>,
}

impl DataPoint {
    /// Convert one external row into a datapoint.
    ///
    /// With `includes_relationship` the row must carry the relationship
    /// cell at index 4 (an address, or an empty cell / empty text for
    /// "no relationship"); without it, an empty relationship is inserted
    /// at that canonical position and index 4 onward counts as extras.
    ///
    /// Fails fast on any shape mismatch, naming the offending cell.
    pub fn from_row(row: &[Field], includes_relationship: bool) -> Result<Self> {
        let required = if includes_relationship { 5 } else { 4 };
        if row.len() < required {
            return Err(RtuError::malformed_row(format!(
                "expected at least {} cells, got {}",
                required,
                row.len()
            )));
        }

        let coa = address_cell(&row[0], 0)?;
        let ioa = address_cell(&row[1], 1)?;
        let type_id = TypeId::concrete(int_cell(&row[2], 2, "type ID")?)?;
        let cot = Cot::concrete(int_cell(&row[3], 3, "COT")?)?;

        let (related_ioa, extra_start) = if includes_relationship {
            (relationship_cell(&row[4])?, 5)
        } else {
            (None, 4)
        };

        Ok(Self {
            coa,
            ioa,
            type_id,
            cot,
            related_ioa,
            extra: row[extra_start..].to_vec(),
        })
    }

    /// The primitive (address + metadata) part of this datapoint.
    pub fn primitive(&self) -> PrimitiveDataPoint {
        PrimitiveDataPoint {
            coa: self.coa.clone(),
            ioa: self.ioa.clone(),
            type_id: self.type_id,
            cot: self.cot,
            related_ioa: self.related_ioa.clone(),
        }
    }

    /// Check if this datapoint delivers unsolicited periodic updates.
    #[inline]
    pub fn is_periodic(&self) -> bool {
        self.cot.is_periodic()
    }
}

/// The five-field address + metadata quintuple of a datapoint, without
/// backend extras. Hashable, so query results can be returned as sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimitiveDataPoint {
    /// Common address of the owning station scope.
    pub coa: Address,
    /// Information object address within the COA scope.
    pub ioa: Address,
    /// ASDU type the datapoint was declared for.
    pub type_id: TypeId,
    /// Configured default cause of transmission.
    pub cot: Cot,
    /// IOA of a related datapoint in the same COA scope, if any.
    pub related_ioa: Option<Address>,
}

impl std::fmt::Display for PrimitiveDataPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, ",
            self.coa, self.ioa, self.type_id, self.cot
        )?;
        match &self.related_ioa {
            Some(rel) => write!(f, "{})", rel),
            None => f.write_str("none)"),
        }
    }
}

fn address_cell(cell: &Field, index: usize) -> Result<Address> {
    match cell {
        Field::Int(v) => Ok(Address::Numeric(*v)),
        Field::Text(s) if !s.is_empty() => Ok(Address::Text(s.clone())),
        other => Err(RtuError::malformed_row(format!(
            "cell {} must be an address, got {} cell",
            index,
            other.kind()
        ))),
    }
}

fn int_cell(cell: &Field, index: usize, what: &str) -> Result<u8> {
    match cell {
        Field::Int(v) => u8::try_from(*v).map_err(|_| {
            RtuError::malformed_row(format!("cell {} ({}) out of range: {}", index, what, v))
        }),
        other => Err(RtuError::malformed_row(format!(
            "cell {} ({}) must be an integer, got {} cell",
            index,
            what,
            other.kind()
        ))),
    }
}

fn relationship_cell(cell: &Field) -> Result<Option<Address>> {
    match cell {
        Field::Empty => Ok(None),
        Field::Text(s) if s.is_empty() => Ok(None),
        Field::Int(v) => Ok(Some(Address::Numeric(*v))),
        Field::Text(s) => Ok(Some(Address::Text(s.clone()))),
        other => Err(RtuError::malformed_row(format!(
            "cell 4 (relationship) must be an address or empty, got {} cell",
            other.kind()
        ))),
    }
}
