use serde::{Deserialize, Serialize};

/// Maps reel cursor slots to item pool indices.
///
/// Slots count item boundaries crossed since the spin began (slot 0 is the
/// item centred at rest). Before the reel commits, slots walk the pool in
/// order from the starting item. Committing splices the winner into the
/// landing slot; every slot from `splice_from` onward is laid out relative
/// to the winner so the strip stays in pool order around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelStrip {
    pool_size: usize,
    start_item: usize,
    splice: Option<Splice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Splice {
    from: i64,
    landing: i64,
    winner: usize,
}

impl ReelStrip {
    /// `pool_size` must be > 0; callers validate it.
    pub fn new(pool_size: usize, start_item: usize) -> Self {
        let pool_size = pool_size.max(1);
        Self {
            pool_size,
            start_item: start_item % pool_size,
            splice: None,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Place `winner` at `landing`, rewriting slots from `landing - margin`.
    pub fn splice(&mut self, landing: i64, winner: usize, margin: u32) {
        self.splice = Some(Splice {
            from: landing - i64::from(margin),
            landing,
            winner: winner % self.pool_size,
        });
    }

    /// Pool index shown at `slot`.
    pub fn item_at(&self, slot: i64) -> usize {
        let n = self.pool_size as i64;
        let index = match self.splice {
            Some(s) if slot >= s.from => s.winner as i64 + (slot - s.landing),
            _ => self.start_item as i64 + slot,
        };
        index.rem_euclid(n) as usize
    }
}
