/// Min-heap over ids `0..n` keyed by mutable integer scores.
///
/// `heap` maps positions to ids and `heap_idx` is its inverse, so the
/// position of any id is found in O(1) and `update` re-sifts it in
/// O(log n). Popped ids stay in the arrays past `size`; nothing is ever
/// reallocated.
#[derive(Clone, Debug)]
pub struct IndexedHeap {
    heap: Vec<usize>,     // pos -> id
    heap_idx: Vec<usize>, // id -> pos
    scores: Vec<usize>,   // id -> score
    size: usize
}

impl IndexedHeap {
    pub fn new(scores: Vec<usize>) -> Self {
        let n = scores.len();
        let mut h = Self {
            heap: (0..n).collect(),
            heap_idx: (0..n).collect(),
            scores,
            size: 0
        };

        for id in 0..n {
            h.size += 1;
            h.sift_up(id);
        }

        h.debug_check();
        h
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn capacity(&self) -> usize {
        self.heap.len()
    }

    pub fn contains(&self, id: usize) -> bool {
        self.heap_idx[id] < self.size
    }

    pub fn score(&self, id: usize) -> usize {
        self.scores[id]
    }

    pub fn peek(&self) -> Option<usize> {
        (self.size > 0).then(|| self.heap[0])
    }

    pub fn pop_min(&mut self) -> Option<usize> {
        if self.size == 0 {
            return None
        }

        let id = self.heap[0];
        self.size -= 1;
        self.swap(0, self.size);
        self.sift_down(0);

        self.debug_check();
        Some(id)
    }

    // Re-inserts a popped id.
    pub fn push(&mut self, id: usize, score: usize) {
        assert!(!self.contains(id), "{id} is already in the heap.");

        // all positions >= size hold popped ids.
        self.swap(self.heap_idx[id], self.size);
        self.size += 1;
        self.scores[id] = score;
        self.sift_up(self.size - 1);

        self.debug_check();
    }

    pub fn update(&mut self, id: usize, score: usize) {
        assert!(self.contains(id), "{id} is not in the heap.");

        let old = std::mem::replace(&mut self.scores[id], score);
        let pos = self.heap_idx[id];

        if score < old {
            self.sift_up(pos);
        } else if score > old {
            self.sift_down(pos);
        }

        self.debug_check();
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.key(pos) >= self.key(parent) {
                break
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let l = 2 * pos + 1;
            if l >= self.size {
                break
            }

            let r = l + 1;
            let c = if r < self.size && self.key(r) < self.key(l) { r } else { l };

            if self.key(pos) <= self.key(c) {
                break
            }
            self.swap(pos, c);
            pos = c;
        }
    }

    fn key(&self, pos: usize) -> usize {
        self.scores[self.heap[pos]]
    }

    fn swap(&mut self, p1: usize, p2: usize) {
        self.heap.swap(p1, p2);
        self.heap_idx[self.heap[p1]] = p1;
        self.heap_idx[self.heap[p2]] = p2;
    }

    pub fn is_valid(&self) -> bool {
        let n = self.capacity();
        let pos_ok = (0..n).all(|id| self.heap[self.heap_idx[id]] == id);
        let ord_ok = (1..self.size).all(|p| self.key((p - 1) / 2) <= self.key(p));
        pos_ok && ord_ok
    }

    fn debug_check(&self) {
        debug_assert!(self.is_valid(), "heap invariant violated.");
    }
}
