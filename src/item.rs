use std::collections::HashMap;

use crate::error::{FimError, Result};

/// Dense internal item identifier, assigned in order of first insertion.
pub type ItemId = u32;

/// External item object: either integer- or string-valued. A single item
/// base is uniformly one or the other, matching the host contract that
/// a transaction list's items are "uniformly integer-valued or uniformly
/// string-valued" (spec.md §6).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ItemObj {
    Int(i64),
    Str(Box<str>),
}

/// Appearance indicator controlling whether an item may occur in a rule's
/// body, head, both, or neither.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Appearance {
    None,
    Body,
    Head,
    Both,
}

impl Appearance {
    pub fn allows_body(self) -> bool {
        matches!(self, Appearance::Body | Appearance::Both)
    }
    pub fn allows_head(self) -> bool {
        matches!(self, Appearance::Head | Appearance::Both)
    }
}

/// Direction in which `recode` reassigns ids by frequency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecodeDirection {
    Ascending,
    Descending,
    Unchanged,
}

struct Entry {
    obj: ItemObj,
    freq: u32,
    app: Appearance,
}

/// Append-only mapping `object -> id` plus the reverse array `id ->
/// object`, carrying per-item frequency and appearance flags.
///
/// `add2ta`/`finta` implement the in-construction transaction buffer: items
/// are appended one at a time (duplicates tolerated) and `finta` sorts and
/// deduplicates them into a finished transaction.
pub struct ItemBase {
    index: HashMap<ItemObj, ItemId>,
    entries: Vec<Entry>,
    buf: Vec<ItemId>,
}

impl ItemBase {
    pub fn new() -> Self {
        ItemBase {
            index: HashMap::new(),
            entries: Vec::new(),
            buf: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the existing id for `obj`, or allocates a new one.
    pub fn add(&mut self, obj: ItemObj) -> Result<ItemId> {
        if let Some(&id) = self.index.get(&obj) {
            return Ok(id);
        }
        let id = self.entries.len();
        let id: ItemId = id
            .try_into()
            .map_err(|_| FimError::OutOfMemory("item id space exhausted".into()))?;
        self.entries.push(Entry {
            obj: obj.clone(),
            freq: 0,
            app: Appearance::Both,
        });
        self.index.insert(obj, id);
        Ok(id)
    }

    /// Appends `obj` to the in-construction transaction buffer. Duplicates
    /// are tolerated; `finta` collapses them.
    pub fn add2ta(&mut self, obj: ItemObj) -> Result<()> {
        let id = self.add(obj)?;
        self.buf.push(id);
        Ok(())
    }

    /// Finalizes the current transaction: sorts, deduplicates, bumps each
    /// distinct item's frequency by `weight`, and returns the finished
    /// sorted item list. The buffer is cleared for the next transaction.
    pub fn finta(&mut self, weight: u32) -> Vec<ItemId> {
        self.buf.sort_unstable();
        self.buf.dedup();
        for &id in &self.buf {
            self.entries[id as usize].freq += weight;
        }
        std::mem::take(&mut self.buf)
    }

    pub fn set_app(&mut self, id: ItemId, app: Appearance) {
        self.entries[id as usize].app = app;
    }

    pub fn app(&self, id: ItemId) -> Appearance {
        self.entries[id as usize].app
    }

    pub fn freq(&self, id: ItemId) -> u32 {
        self.entries[id as usize].freq
    }

    pub fn obj(&self, id: ItemId) -> &ItemObj {
        &self.entries[id as usize].obj
    }

    /// Drops items whose frequency is below `min_support` or whose
    /// appearance flag falls outside `[app_min, app_max]`'s allowed set
    /// (`app_min`/`app_max` bound which of body/head/both/none is kept --
    /// here expressed directly as a predicate for clarity), then reassigns
    /// ids by frequency according to `dir`. Returns the old-id -> new-id
    /// map (`None` for dropped items).
    pub fn recode<F>(
        &mut self,
        min_support: u32,
        keep_app: F,
        dir: RecodeDirection,
    ) -> Vec<Option<ItemId>>
    where
        F: Fn(Appearance) -> bool,
    {
        let n = self.entries.len();
        let mut kept: Vec<usize> = (0..n)
            .filter(|&i| self.entries[i].freq >= min_support && keep_app(self.entries[i].app))
            .collect();

        match dir {
            RecodeDirection::Ascending => {
                kept.sort_by_key(|&i| self.entries[i].freq);
            }
            RecodeDirection::Descending => {
                kept.sort_by_key(|&i| std::cmp::Reverse(self.entries[i].freq));
            }
            RecodeDirection::Unchanged => {}
        }

        let mut mapping = vec![None; n];
        let mut new_entries = Vec::with_capacity(kept.len());
        for (new_id, &old_id) in kept.iter().enumerate() {
            mapping[old_id] = Some(new_id as ItemId);
            new_entries.push(Entry {
                obj: self.entries[old_id].obj.clone(),
                freq: self.entries[old_id].freq,
                app: self.entries[old_id].app,
            });
        }
        // Rebuild the index so obj -> id lookups reflect the new ids.
        self.index.clear();
        for (new_id, entry) in new_entries.iter().enumerate() {
            self.index.insert(entry.obj.clone(), new_id as ItemId);
        }
        self.entries = new_entries;
        mapping
    }
}

impl Default for ItemBase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_returns_same_id_for_repeat_object() {
        let mut ib = ItemBase::new();
        let a = ib.add(ItemObj::Int(1)).unwrap();
        let b = ib.add(ItemObj::Int(1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn finta_sorts_and_dedups_and_bumps_frequency() {
        let mut ib = ItemBase::new();
        ib.add2ta(ItemObj::Int(3)).unwrap();
        ib.add2ta(ItemObj::Int(1)).unwrap();
        ib.add2ta(ItemObj::Int(3)).unwrap();
        let ta = ib.finta(2);
        assert_eq!(ta.len(), 2);
        assert_eq!(ib.freq(ta[0]), 2);
    }

    #[test]
    fn recode_drops_infrequent_and_reorders_descending() {
        let mut ib = ItemBase::new();
        let a = ib.add(ItemObj::Int(1)).unwrap();
        let b = ib.add(ItemObj::Int(2)).unwrap();
        let c = ib.add(ItemObj::Int(3)).unwrap();
        // freq: a=1, b=3, c=2
        ib.entries[a as usize].freq = 1;
        ib.entries[b as usize].freq = 3;
        ib.entries[c as usize].freq = 2;
        let map = ib.recode(2, |_| true, RecodeDirection::Descending);
        assert_eq!(map[a as usize], None);
        assert_eq!(ib.len(), 2);
        assert_eq!(ib.freq(map[b as usize].unwrap()), 3);
        assert_eq!(ib.freq(map[c as usize].unwrap()), 2);
        assert!(map[b as usize].unwrap() < map[c as usize].unwrap());
    }
}
