use rand::Rng;

/// Maximum height of the skip list.
pub const MAX_HEIGHT: usize = 16;

/// Probability that a node is promoted one level higher.
const LEVEL_PROBABILITY: f64 = 0.5;

/// Arena slot of the head sentinel.
const HEAD: usize = 0;

/// A single node in the skip list.
///
/// Each node has one forward pointer per level it participates in. Level 0
/// contains all nodes (a regular sorted linked list). Higher levels skip
/// over nodes, enabling O(log n) average-case search.
///
/// ```text
/// Level 3:  HEAD ──────────────────────────────► 50 ──────────► NIL
/// Level 2:  HEAD ──────────► 20 ────────────────► 50 ──────────► NIL
/// Level 1:  HEAD ──► 10 ──► 20 ────► 35 ────────► 50 ──► 60 ──► NIL
/// Level 0:  HEAD ──► 10 ──► 20 ──► 25 ──► 35 ──► 50 ──► 60 ──► 70 ► NIL
/// ```
///
/// Nodes live in an arena (`SkipList::nodes`) and point at each other by
/// slot index, so the whole structure is safe code with no raw pointers.
struct SkipNode {
    key: Vec<u8>,
    value: Vec<u8>,
    forward: Vec<Option<usize>>,
}

/// A probabilistic sorted map over raw byte keys.
///
/// Each inserted node gets its height from repeated coin flips (promotion
/// probability 1/2, capped at [`MAX_HEIGHT`]), which keeps expected search
/// depth logarithmic without any rebalancing.
///
/// Average case: O(log n) insert, lookup, and removal; O(n) iteration.
///
/// Not internally synchronized. Single-writer access is the owner's
/// responsibility — the memtable sits behind the engine's locks.
pub struct SkipList {
    /// Arena of nodes; slot 0 is the head sentinel whose key is never
    /// compared. Slots freed by `remove` are recycled via `free`.
    nodes: Vec<SkipNode>,
    free: Vec<usize>,
    /// Current height: number of levels with at least one real node, min 1.
    height: usize,
    len: usize,
}

impl SkipList {
    /// Create a new empty skip list.
    pub fn new() -> Self {
        let head = SkipNode {
            key: Vec::new(),
            value: Vec::new(),
            forward: vec![None; MAX_HEIGHT],
        };
        SkipList {
            nodes: vec![head],
            free: Vec::new(),
            height: 1,
            len: 0,
        }
    }

    /// Insert a key-value pair. Overwrites in place if the key already
    /// exists, leaving the node's position and height unchanged.
    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) {
        let update = self.predecessors(&key);

        if let Some(found) = self.nodes[update[0]].forward[0] {
            if self.nodes[found].key == key {
                self.nodes[found].value = value;
                return;
            }
        }

        let height = self.random_height();
        let node = SkipNode {
            key,
            value,
            forward: vec![None; height],
        };
        let idx = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };

        // Predecessors on levels above the old height are the head sentinel,
        // which `predecessors` already filled in.
        if height > self.height {
            self.height = height;
        }

        for level in 0..height {
            let pred = update[level];
            let next = self.nodes[pred].forward[level];
            self.nodes[idx].forward[level] = next;
            self.nodes[pred].forward[level] = Some(idx);
        }
        self.len += 1;
    }

    /// Look up a key. Returns the stored value if present.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let mut cur = HEAD;
        for level in (0..self.height).rev() {
            while let Some(next) = self.nodes[cur].forward[level] {
                if self.nodes[next].key.as_slice() < key {
                    cur = next;
                } else {
                    break;
                }
            }
        }
        let found = self.nodes[cur].forward[0]?;
        if self.nodes[found].key == key {
            Some(self.nodes[found].value.as_slice())
        } else {
            None
        }
    }

    /// Remove a key, unlinking its node from every level it participates
    /// in. Returns whether the key was present.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        let update = self.predecessors(key);
        let Some(target) = self.nodes[update[0]].forward[0] else {
            return false;
        };
        if self.nodes[target].key != key {
            return false;
        }

        for level in 0..self.height {
            // Levels are populated bottom-up, so the first level whose
            // predecessor doesn't point at the node is where its height ends.
            if self.nodes[update[level]].forward[level] != Some(target) {
                break;
            }
            let next = self.nodes[target].forward[level];
            self.nodes[update[level]].forward[level] = next;
        }

        while self.height > 1 && self.nodes[HEAD].forward[self.height - 1].is_none() {
            self.height -= 1;
        }

        // Recycle the slot with an empty payload so the arena doesn't keep
        // dead keys alive.
        self.nodes[target] = SkipNode {
            key: Vec::new(),
            value: Vec::new(),
            forward: Vec::new(),
        };
        self.free.push(target);
        self.len -= 1;
        true
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the skip list is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every entry, resetting to the empty state.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[HEAD].forward.fill(None);
        self.free.clear();
        self.height = 1;
        self.len = 0;
    }

    /// Iterate over all entries in ascending key order.
    /// Traverses level 0 — the bottom level contains every entry.
    pub fn iter(&self) -> SkipListIterator<'_> {
        SkipListIterator {
            list: self,
            current: self.nodes[HEAD].forward[0],
        }
    }

    /// Per level from the top down, the last node whose key is strictly
    /// less than `key`. Levels at or above the current height fall back to
    /// the head sentinel.
    fn predecessors(&self, key: &[u8]) -> [usize; MAX_HEIGHT] {
        let mut update = [HEAD; MAX_HEIGHT];
        let mut cur = HEAD;
        for level in (0..self.height).rev() {
            while let Some(next) = self.nodes[cur].forward[level] {
                if self.nodes[next].key.as_slice() < key {
                    cur = next;
                } else {
                    break;
                }
            }
            update[level] = cur;
        }
        update
    }

    /// Coin-flip height for a new node: start at 1, promote with
    /// probability 1/2, cap at [`MAX_HEIGHT`].
    fn random_height(&self) -> usize {
        let mut rng = rand::thread_rng();
        let mut height = 1;
        while height < MAX_HEIGHT && rng.gen_bool(LEVEL_PROBABILITY) {
            height += 1;
        }
        height
    }
}

impl Default for SkipList {
    fn default() -> Self {
        SkipList::new()
    }
}

/// Iterator over skip list entries in ascending key order.
pub struct SkipListIterator<'a> {
    list: &'a SkipList,
    current: Option<usize>,
}

impl<'a> Iterator for SkipListIterator<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.current?;
        let node = &self.list.nodes[idx];
        self.current = node.forward[0];
        Some((node.key.as_slice(), node.value.as_slice()))
    }
}
