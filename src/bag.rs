use crate::item::{Appearance, ItemBase, ItemId};

/// A sorted, duplicate-free sequence of item ids plus an integer weight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Items with id < the bag's pack threshold, packed into a bitmap.
    pub bitmap: u16,
    /// Remaining items, sorted ascending, none below the pack threshold.
    pub tail: Vec<ItemId>,
    pub weight: u32,
}

impl Transaction {
    pub fn new(items: Vec<ItemId>, weight: u32) -> Self {
        Transaction {
            bitmap: 0,
            tail: items,
            weight,
        }
    }

    pub fn len(&self) -> usize {
        self.bitmap.count_ones() as usize + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates all item ids in the transaction (unpacked bitmap items
    /// first, ascending, then the tail).
    pub fn items(&self) -> Vec<ItemId> {
        let mut v: Vec<ItemId> = (0..16)
            .filter(|b| self.bitmap & (1 << b) != 0)
            .collect();
        v.extend_from_slice(&self.tail);
        v
    }

    pub fn contains(&self, item: ItemId) -> bool {
        if item < 16 {
            self.bitmap & (1 << item) != 0
        } else {
            self.tail.binary_search(&item).is_ok()
        }
    }
}

/// Owns a growable array of transactions and the underlying item base.
/// After `pack`, items with id < k live in each transaction's bitmap.
/// After `sort`/`reduce`, identical transactions are collapsed with
/// weights summed, and the bag is strictly increasing lexicographically.
pub struct TransactionBag {
    pub base: ItemBase,
    pub transactions: Vec<Transaction>,
    pack_threshold: u16,
}

impl TransactionBag {
    pub fn new(base: ItemBase) -> Self {
        TransactionBag {
            base,
            transactions: Vec::new(),
            pack_threshold: 0,
        }
    }

    pub fn push(&mut self, t: Transaction) {
        self.transactions.push(t);
    }

    pub fn total_weight(&self) -> u64 {
        self.transactions.iter().map(|t| t.weight as u64).sum()
    }

    /// Removes transactions whose retained size (after `keep` decides
    /// which items to drop) is below `min_items`.
    pub fn filter<F>(&mut self, min_items: usize, keep: F)
    where
        F: Fn(ItemId) -> bool,
    {
        for t in &mut self.transactions {
            t.tail.retain(|&i| keep(i));
            if t.bitmap != 0 {
                let mut bm = 0u16;
                for b in 0..16u16 {
                    if t.bitmap & (1 << b) != 0 && keep(b as ItemId) {
                        bm |= 1 << b;
                    }
                }
                t.bitmap = bm;
            }
        }
        self.transactions.retain(|t| t.len() >= min_items);
    }

    /// Remaps every transaction's items through `mapping` (as produced by
    /// `ItemBase::recode`), dropping items that map to `None`, and
    /// discarding transactions that become empty.
    pub fn recode(&mut self, mapping: &[Option<ItemId>]) {
        for t in &mut self.transactions {
            let mut items: Vec<ItemId> = t
                .items()
                .into_iter()
                .filter_map(|old| mapping.get(old as usize).copied().flatten())
                .collect();
            items.sort_unstable();
            t.bitmap = 0;
            t.tail = items;
        }
        self.transactions.retain(|t| !t.is_empty());
    }

    /// Moves items with id < k into each transaction's bitmap prefix,
    /// removing them from the tail. `k` must be <= 16.
    pub fn pack(&mut self, k: u16) {
        assert!(k <= 16, "pack threshold must fit in a u16 bitmap");
        self.pack_threshold = k;
        for t in &mut self.transactions {
            let mut bitmap = t.bitmap;
            t.tail.retain(|&item| {
                if (item as u16) < k {
                    bitmap |= 1 << item;
                    false
                } else {
                    true
                }
            });
            t.bitmap = bitmap;
        }
    }

    /// Sorts transactions lexicographically on (bitmap, tail).
    pub fn sort(&mut self) {
        self.transactions
            .sort_by(|a, b| a.bitmap.cmp(&b.bitmap).then_with(|| a.tail.cmp(&b.tail)));
    }

    /// Collapses equal (bitmap, tail) transactions by summing weights.
    /// Must be called after `sort`. Post-condition: transactions are
    /// strictly increasing lexicographically.
    pub fn reduce(&mut self) {
        let mut out: Vec<Transaction> = Vec::with_capacity(self.transactions.len());
        for t in self.transactions.drain(..) {
            if let Some(last) = out.last_mut() {
                if last.bitmap == t.bitmap && last.tail == t.tail {
                    last.weight += t.weight;
                    continue;
                }
            }
            out.push(t);
        }
        self.transactions = out;
    }

    /// True iff all transactions have equal length (required for the
    /// table-based shuffle surrogate).
    pub fn istab(&self) -> bool {
        match self.transactions.first() {
            None => true,
            Some(first) => {
                let len = first.len();
                self.transactions.iter().all(|t| t.len() == len)
            }
        }
    }

    /// Support of a single item: sum of weights of transactions
    /// containing it.
    pub fn item_support(&self, item: ItemId) -> u64 {
        self.transactions
            .iter()
            .filter(|t| t.contains(item))
            .map(|t| t.weight as u64)
            .sum()
    }

    /// Support of an itemset (all items present): sum of weights of
    /// transactions containing every item in `items`.
    pub fn support(&self, items: &[ItemId]) -> u64 {
        self.transactions
            .iter()
            .filter(|t| items.iter().all(|&i| t.contains(i)))
            .map(|t| t.weight as u64)
            .sum()
    }

    pub fn appearance(&self, id: ItemId) -> Appearance {
        self.base.app(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemObj;

    fn bag_from(transactions: Vec<Vec<i64>>) -> TransactionBag {
        let mut base = ItemBase::new();
        let mut bag = TransactionBag::new(ItemBase::new());
        for items in &transactions {
            for &i in items {
                base.add2ta(ItemObj::Int(i)).unwrap();
            }
            let ids = base.finta(1);
            bag.push(Transaction::new(ids, 1));
        }
        bag.base = base;
        bag
    }

    #[test]
    fn support_counts_transactions_containing_all_items() {
        let mut bag = bag_from(vec![
            vec![1, 2, 3],
            vec![1, 2],
            vec![1, 3],
            vec![2, 3],
            vec![1],
        ]);
        let one = bag.base.add(ItemObj::Int(1)).unwrap();
        let two = bag.base.add(ItemObj::Int(2)).unwrap();
        assert_eq!(bag.support(&[one]), 4);
        assert_eq!(bag.support(&[two]), 3);
        assert_eq!(bag.support(&[one, two]), 2);
    }

    #[test]
    fn reduce_collapses_duplicate_transactions() {
        let mut bag = bag_from(vec![vec![1, 2], vec![2, 1], vec![3]]);
        bag.sort();
        bag.reduce();
        assert_eq!(bag.transactions.len(), 2);
        assert_eq!(bag.transactions[1].weight, 2);
    }

    #[test]
    fn pack_moves_low_ids_into_bitmap() {
        let mut bag = bag_from(vec![vec![0, 1, 5]]);
        bag.pack(4);
        let t = &bag.transactions[0];
        assert_eq!(t.bitmap, 0b0000_0000_0000_0011);
        assert_eq!(t.tail, vec![5]);
    }

    #[test]
    fn istab_detects_uniform_length() {
        let uniform = bag_from(vec![vec![1, 2], vec![3, 4]]);
        assert!(uniform.istab());
        let skewed = bag_from(vec![vec![1, 2], vec![3]]);
        assert!(!skewed.istab());
    }
}
