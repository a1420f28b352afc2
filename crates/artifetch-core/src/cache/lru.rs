//! LRU の byte budget 管理
//!
//! hash id とサイズだけを持つ。バイト列そのものはキャッシュ側の map にある。
//!
//! アクセス順は単調増加する tick で表す。`touch` / `remove` は
//! O(log n) なので、slots のロックを握ったままでもエントリ数に比例しない。

use std::collections::{BTreeMap, HashMap};

struct Entry {
    tick: u64,
    size: u64,
}

pub(crate) struct LruState {
    /// tick 昇順 = 古い順（先頭から追い出す）
    order: BTreeMap<u64, String>,
    entries: HashMap<String, Entry>,
    next_tick: u64,
    current_bytes: u64,
    max_bytes: u64,
}

impl LruState {
    pub(crate) fn new(max_bytes: u64) -> Self {
        Self {
            order: BTreeMap::new(),
            entries: HashMap::new(),
            next_tick: 0,
            current_bytes: 0,
            max_bytes,
        }
    }

    fn tick(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    /// 最近使ったものとして末尾へ
    pub(crate) fn touch(&mut self, hash_id: &str) {
        let tick = self.tick();
        if let Some(entry) = self.entries.get_mut(hash_id)
            && let Some(id) = self.order.remove(&entry.tick)
        {
            entry.tick = tick;
            self.order.insert(tick, id);
        }
    }

    /// 新しいエントリを追跡し、場所を空けるために追い出したものを返す
    pub(crate) fn admit(&mut self, hash_id: &str, size: u64) -> Vec<(String, u64)> {
        self.remove(hash_id);

        let mut evicted = Vec::new();
        while self.current_bytes + size > self.max_bytes {
            let Some((_, oldest)) = self.order.pop_first() else {
                break;
            };
            let oldest_size = self.entries.remove(&oldest).map_or(0, |e| e.size);
            self.current_bytes = self.current_bytes.saturating_sub(oldest_size);
            evicted.push((oldest, oldest_size));
        }

        let tick = self.tick();
        self.order.insert(tick, hash_id.to_string());
        self.entries.insert(hash_id.to_string(), Entry { tick, size });
        self.current_bytes += size;
        evicted
    }

    pub(crate) fn remove(&mut self, hash_id: &str) -> Option<u64> {
        let entry = self.entries.remove(hash_id)?;
        self.order.remove(&entry.tick);
        self.current_bytes = self.current_bytes.saturating_sub(entry.size);
        Some(entry.size)
    }

    pub(crate) fn current_bytes(&self) -> u64 {
        self.current_bytes
    }
}
