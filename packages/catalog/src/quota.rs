use crate::error::StoreError;
use crate::store::Catalog;

/// Advisory capacity accounting over catalog totals.
///
/// The admission check reads the current total and compares; the read and
/// the later create are not one atomic step, so concurrent uploads may
/// briefly overshoot the pool. That is accepted: the quota protects disk
/// budgets, not invariants.
#[derive(Clone, Copy, Debug)]
pub struct Quota {
    capacity: u64,
}

impl Quota {
    pub fn new(capacity: u64) -> Self {
        Self { capacity }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Bytes still available when `used` bytes are already stored. Never
    /// underflows; an over-full pool reports zero.
    pub fn remaining(&self, used: u64) -> u64 {
        self.capacity.saturating_sub(used)
    }

    /// Admission check for `incoming` bytes, scoped to one owner or to the
    /// whole pool.
    pub async fn check(
        &self,
        catalog: &dyn Catalog,
        owner: Option<&str>,
        incoming: u64,
    ) -> Result<(), StoreError> {
        let used = catalog.total_size(owner).await?;
        let available = self.remaining(used);
        if incoming > available {
            return Err(StoreError::Validation(format!(
                "Not enough storage available: {incoming} bytes requested, \
                 {available} free"
            )));
        }
        Ok(())
    }
}
