//! The datapoint store.
//!
//! Authoritative mapping from `(coa, ioa)` to datapoint definition,
//! populated exactly once at construction and read-dominant afterwards.
//! The only post-construction mutation is [`DataPointStore::update_cot`],
//! which rewrites the addressed entry under the write lock, so
//! concurrent readers never observe a half-updated datapoint.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Result, RtuError};
use crate::types::{Address, Cot, DataPoint, Field, PrimitiveDataPoint};

/// Outcome of a cause-of-transmission update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CotUpdate {
    /// The entry was replaced.
    Updated {
        /// Cause before the update.
        previous: Cot,
        /// Cause after the update.
        current: Cot,
    },
    /// No datapoint at the addressed key; nothing changed.
    Unattached,
    /// The new cause lies outside [1,47]; nothing changed.
    InvalidCot,
}

impl CotUpdate {
    /// Check whether the update involved the periodic cause on either
    /// side, meaning the backend must mirror the change.
    #[inline]
    pub fn touches_periodicity(&self) -> bool {
        match self {
            Self::Updated { previous, current } => {
                previous.is_periodic() || current.is_periodic()
            }
            _ => false,
        }
    }
}

/// Map from address to datapoint definition, keyed `coa -> ioa -> dp`.
#[derive(Debug)]
pub struct DataPointStore {
    coa: Address,
    points: RwLock<HashMap<Address, HashMap<Address, DataPoint>>>,
}

impl DataPointStore {
    /// Build the store from external rows.
    ///
    /// Every row runs through the conversion contract
    /// ([`DataPoint::from_row`]); any malformed row or duplicate
    /// `(coa, ioa)` key fails the whole operation and no store is
    /// produced.
    pub fn from_rows(
        coa: Address,
        rows: &[Vec<Field>],
        includes_relationship: bool,
    ) -> Result<Self> {
        let mut points: HashMap<Address, HashMap<Address, DataPoint>> = HashMap::new();
        for row in rows {
            let dp = DataPoint::from_row(row, includes_relationship)?;
            let scope = points.entry(dp.coa.clone()).or_default();
            if scope.contains_key(&dp.ioa) {
                return Err(RtuError::DuplicateKey {
                    coa: dp.coa,
                    ioa: dp.ioa,
                });
            }
            scope.insert(dp.ioa.clone(), dp);
        }
        Ok(Self {
            coa,
            points: RwLock::new(points),
        })
    }

    /// The store's own primary COA.
    #[inline]
    pub fn coa(&self) -> &Address {
        &self.coa
    }

    // Entries are only ever replaced whole, so a lock poisoned by a
    // panicking reader still holds consistent data.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Address, HashMap<Address, DataPoint>>> {
        self.points.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Address, HashMap<Address, DataPoint>>> {
        self.points.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exact, kind-sensitive lookup.
    pub fn get(&self, coa: &Address, ioa: &Address) -> Option<DataPoint> {
        self.read().get(coa)?.get(ioa).cloned()
    }

    /// Resolve the stored relationship of `(coa, ioa)`, then look the
    /// related datapoint up under the same COA scope.
    ///
    /// Absent when the target is unattached, stores no relationship, or
    /// the relationship does not resolve.
    pub fn get_related(&self, coa: &Address, ioa: &Address) -> Option<DataPoint> {
        let guard = self.read();
        let scope = guard.get(coa)?;
        let related = scope.get(ioa)?.related_ioa.as_ref()?;
        scope.get(related).cloned()
    }

    /// Check for an exact key match.
    pub fn contains(&self, coa: &Address, ioa: &Address) -> bool {
        self.read().get(coa).is_some_and(|scope| scope.contains_key(ioa))
    }

    /// All IOAs stored under `coa`; `None` selects the store's own
    /// primary COA.
    pub fn ioas(&self, coa: Option<&Address>) -> HashSet<Address> {
        let coa = coa.unwrap_or(&self.coa);
        self.read()
            .get(coa)
            .map(|scope| scope.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// All primitive datapoints attached to the store.
    pub fn data_points(&self) -> HashSet<PrimitiveDataPoint> {
        self.read()
            .values()
            .flat_map(|scope| scope.values().map(DataPoint::primitive))
            .collect()
    }

    /// Keys of all datapoints expecting unsolicited periodic updates.
    pub fn periodic_ids(&self) -> HashSet<(Address, Address)> {
        self.read()
            .values()
            .flat_map(|scope| scope.values())
            .filter(|dp| dp.is_periodic())
            .map(|dp| (dp.coa.clone(), dp.ioa.clone()))
            .collect()
    }

    /// Primitive datapoints expecting unsolicited periodic updates.
    pub fn periodic_data_points(&self) -> HashSet<PrimitiveDataPoint> {
        self.read()
            .values()
            .flat_map(|scope| scope.values())
            .filter(|dp| dp.is_periodic())
            .map(DataPoint::primitive)
            .collect()
    }

    /// IOAs of periodic datapoints under `coa`; `None` selects the
    /// store's own primary COA.
    pub fn periodic_ioas(&self, coa: Option<&Address>) -> HashSet<Address> {
        let coa = coa.unwrap_or(&self.coa);
        self.read()
            .get(coa)
            .map(|scope| {
                scope
                    .values()
                    .filter(|dp| dp.is_periodic())
                    .map(|dp| dp.ioa.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace the cause of transmission of the addressed datapoint.
    ///
    /// Only the `cot` field changes; relationships and extras stay as
    /// configured. An unattached key or a cause outside [1,47] leaves
    /// the store untouched and reports why.
    pub fn update_cot(&self, coa: &Address, ioa: &Address, new_cot: u8) -> CotUpdate {
        let Ok(current) = Cot::concrete(new_cot) else {
            return CotUpdate::InvalidCot;
        };
        let mut guard = self.write();
        let Some(dp) = guard.get_mut(coa).and_then(|scope| scope.get_mut(ioa)) else {
            return CotUpdate::Unattached;
        };
        let previous = dp.cot;
        dp.cot = current;
        CotUpdate::Updated { previous, current }
    }

    /// All datapoints whose stored relationship does not resolve to an
    /// attached datapoint in the same COA scope, each paired with the
    /// IOA that failed to resolve.
    pub fn dangling_relationships(&self) -> Vec<(PrimitiveDataPoint, Address)> {
        let guard = self.read();
        let mut dangling = Vec::new();
        for scope in guard.values() {
            for dp in scope.values() {
                if let Some(related) = &dp.related_ioa {
                    if !scope.contains_key(related) {
                        dangling.push((dp.primitive(), related.clone()));
                    }
                }
            }
        }
        dangling
    }

    /// Check that every stored relationship resolves.
    ///
    /// The single consistency gate for the whole store; construction
    /// runs it once and treats a failure as fatal.
    pub fn relationships_resolve(&self) -> bool {
        self.dangling_relationships().is_empty()
    }

    /// Number of stored datapoints.
    pub fn len(&self) -> usize {
        self.read().values().map(HashMap::len).sum()
    }

    /// Check if the store holds no datapoints.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeId;

    fn int_row(cells: &[i64]) -> Vec<Field> {
        cells.iter().map(|v| Field::Int(*v)).collect()
    }

    fn store_with_relationships() -> DataPointStore {
        DataPointStore::from_rows(
            Address::from(1i64),
            &[
                vec![
                    Field::Int(1),
                    Field::Int(10),
                    Field::Int(30),
                    Field::Int(20),
                    Field::Int(11),
                ],
                vec![
                    Field::Int(1),
                    Field::Int(11),
                    Field::Int(30),
                    Field::Int(20),
                    Field::Empty,
                ],
                vec![
                    Field::Int(2),
                    Field::Int(10),
                    Field::Int(45),
                    Field::Int(1),
                    Field::Empty,
                ],
            ],
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_returns_inserted_fields_unchanged() {
        let store = store_with_relationships();
        let dp = store
            .get(&Address::from(1i64), &Address::from(10i64))
            .unwrap();
        assert_eq!(dp.coa, Address::Numeric(1));
        assert_eq!(dp.ioa, Address::Numeric(10));
        assert_eq!(dp.type_id, TypeId::concrete(30).unwrap());
        assert_eq!(dp.cot, Cot::concrete(20).unwrap());
        assert_eq!(dp.related_ioa, Some(Address::Numeric(11)));
    }

    #[test]
    fn test_lookup_is_kind_sensitive() {
        let store = DataPointStore::from_rows(
            Address::from(5i64),
            &[int_row(&[5, 10, 30, 20])],
            false,
        )
        .unwrap();
        assert!(store.get(&Address::from(5i64), &Address::from(10i64)).is_some());
        assert!(store.get(&Address::from("5"), &Address::from(10i64)).is_none());
        assert!(store.get(&Address::from(5i64), &Address::from("10")).is_none());
    }

    #[test]
    fn test_related_lookup() {
        let store = store_with_relationships();
        let related = store
            .get_related(&Address::from(1i64), &Address::from(10i64))
            .unwrap();
        assert_eq!(related.ioa, Address::Numeric(11));
        assert_eq!(related.related_ioa, None);

        // no relationship stored on 11
        assert!(store
            .get_related(&Address::from(1i64), &Address::from(11i64))
            .is_none());
        // unattached target
        assert!(store
            .get_related(&Address::from(1i64), &Address::from(99i64))
            .is_none());
    }

    #[test]
    fn test_ioas_with_own_coa_sentinel() {
        let store = store_with_relationships();
        let own: HashSet<Address> = [Address::Numeric(10), Address::Numeric(11)].into();
        assert_eq!(store.ioas(None), own);

        let other: HashSet<Address> = [Address::Numeric(10)].into();
        assert_eq!(store.ioas(Some(&Address::from(2i64))), other);
        assert!(store.ioas(Some(&Address::from(7i64))).is_empty());
    }

    #[test]
    fn test_periodic_views() {
        let store = store_with_relationships();
        let ids = store.periodic_ids();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains(&(Address::Numeric(2), Address::Numeric(10))));

        assert_eq!(store.periodic_data_points().len(), 1);
        assert!(store.periodic_ioas(None).is_empty());
        assert_eq!(store.periodic_ioas(Some(&Address::from(2i64))).len(), 1);
    }

    #[test]
    fn test_update_cot_replaces_only_cot() {
        let store = store_with_relationships();
        let coa = Address::from(1i64);
        let ioa = Address::from(10i64);
        let update = store.update_cot(&coa, &ioa, 1);
        assert_eq!(
            update,
            CotUpdate::Updated {
                previous: Cot::concrete(20).unwrap(),
                current: Cot::PERIODIC,
            }
        );
        assert!(update.touches_periodicity());

        let dp = store.get(&coa, &ioa).unwrap();
        assert_eq!(dp.cot, Cot::PERIODIC);
        assert_eq!(dp.type_id, TypeId::concrete(30).unwrap());
        assert_eq!(dp.related_ioa, Some(Address::Numeric(11)));

        // the periodic view follows the mutation
        assert!(store
            .periodic_ids()
            .contains(&(Address::Numeric(1), Address::Numeric(10))));
    }

    #[test]
    fn test_update_cot_rejections() {
        let store = store_with_relationships();
        let coa = Address::from(1i64);
        assert_eq!(
            store.update_cot(&coa, &Address::from(99i64), 5),
            CotUpdate::Unattached
        );
        assert_eq!(
            store.update_cot(&coa, &Address::from(10i64), 99),
            CotUpdate::InvalidCot
        );
        assert_eq!(
            store.update_cot(&coa, &Address::from(10i64), 0),
            CotUpdate::InvalidCot
        );
        // unchanged
        let dp = store.get(&coa, &Address::from(10i64)).unwrap();
        assert_eq!(dp.cot, Cot::concrete(20).unwrap());
        assert!(!CotUpdate::Unattached.touches_periodicity());
    }

    #[test]
    fn test_non_periodic_update_does_not_touch_periodicity() {
        let store = store_with_relationships();
        let update = store.update_cot(&Address::from(1i64), &Address::from(10i64), 30);
        assert!(!update.touches_periodicity());
    }

    #[test]
    fn test_relationship_check() {
        let store = store_with_relationships();
        assert!(store.relationships_resolve());

        let dangling = DataPointStore::from_rows(
            Address::from(1i64),
            &[int_row(&[1, 10, 30, 20, 12]), int_row(&[1, 11, 30, 20])],
            true,
        );
        // row 2 is too short with relationships enabled
        assert!(dangling.is_err());

        let dangling = DataPointStore::from_rows(
            Address::from(1i64),
            &[
                vec![
                    Field::Int(1),
                    Field::Int(10),
                    Field::Int(30),
                    Field::Int(20),
                    Field::Int(12),
                ],
                vec![
                    Field::Int(1),
                    Field::Int(11),
                    Field::Int(30),
                    Field::Int(20),
                    Field::Empty,
                ],
            ],
            true,
        )
        .unwrap();
        assert!(!dangling.relationships_resolve());
        let bad = dangling.dangling_relationships();
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].0.ioa, Address::Numeric(10));
        assert_eq!(bad[0].1, Address::Numeric(12));
    }

    #[test]
    fn test_relationship_scope_is_per_coa() {
        // 20 exists, but only under COA 2; the relationship must not
        // resolve across scopes
        let store = DataPointStore::from_rows(
            Address::from(1i64),
            &[
                vec![
                    Field::Int(1),
                    Field::Int(10),
                    Field::Int(30),
                    Field::Int(20),
                    Field::Int(20),
                ],
                vec![
                    Field::Int(2),
                    Field::Int(20),
                    Field::Int(30),
                    Field::Int(20),
                    Field::Empty,
                ],
            ],
            true,
        )
        .unwrap();
        assert!(!store.relationships_resolve());
    }

    #[test]
    fn test_duplicate_key_fails_whole_operation() {
        let err = DataPointStore::from_rows(
            Address::from(1i64),
            &[int_row(&[1, 10, 30, 20]), int_row(&[1, 10, 31, 21])],
            false,
        )
        .unwrap_err();
        assert!(matches!(err, RtuError::DuplicateKey { .. }));
    }

    #[test]
    fn test_malformed_row_fails_whole_operation() {
        let err = DataPointStore::from_rows(
            Address::from(1i64),
            &[int_row(&[1, 10, 30, 20]), int_row(&[1, 11, 30])],
            false,
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_len_and_emptiness() {
        let store = store_with_relationships();
        assert_eq!(store.len(), 3);
        assert!(!store.is_empty());

        let empty =
            DataPointStore::from_rows(Address::from(1i64), &[], false).unwrap();
        assert!(empty.is_empty());
    }
}
