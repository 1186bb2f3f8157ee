use std::cmp::Ordering::*;
use std::fmt::Display;
use delegate::delegate;
use itertools::{EitherOrBoth, Itertools};
use sprs::PermView;
use splu::Modulus;

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpEntry {
    pub ind: usize,
    pub val: u64
}

impl SpEntry {
    pub fn new(ind: usize, val: u64) -> Self {
        Self { ind, val }
    }
}

/// Sparse vector over `Z/nZ`.
///
/// Entries are kept strictly increasing by index and never hold zero.
/// The modulus is not stored; operations take it explicitly.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpVec {
    entries: Vec<SpEntry>
}

impl SpVec {
    pub fn zero() -> Self {
        Self { entries: vec![] }
    }

    pub fn unit(i: usize) -> Self {
        Self { entries: vec![SpEntry::new(i, 1)] }
    }

    // `entries` must already satisfy the invariants.
    pub(crate) fn from_raw(entries: Vec<SpEntry>) -> Self {
        let v = Self { entries };
        debug_assert!(v.is_valid());
        v
    }

    delegate! { to self.entries {
        #[call(len)]
        pub fn nnz(&self) -> usize;

        #[call(is_empty)]
        pub fn is_zero(&self) -> bool;
    }}

    pub fn entries(&self) -> &[SpEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<SpEntry> {
        self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.entries.iter().map(|e| (e.ind, e.val))
    }

    pub fn at(&self, i: usize) -> u64 {
        match self.entries.binary_search_by_key(&i, |e| e.ind) {
            Ok(k) => self.entries[k].val,
            Err(_) => 0
        }
    }

    pub fn max_ind(&self) -> Option<usize> {
        self.entries.last().map(|e| e.ind)
    }

    pub fn clear(&mut self) {
        self.entries = vec![];
    }

    pub fn is_valid(&self) -> bool {
        self.entries.iter().all(|e| e.val != 0) &&
        self.entries.iter().tuple_windows().all(|(e1, e2)| e1.ind < e2.ind)
    }

    pub fn from_entries<I>(m: &Modulus, entries: I) -> Self
    where I: IntoIterator<Item = (usize, u64)> {
        let entries = entries.into_iter()
            .map(|(i, a)| SpEntry::new(i, m.reduce(a)))
            .sorted_by_key(|e| e.ind)
            .coalesce(|e1, e2|
                if e1.ind == e2.ind {
                    Ok(SpEntry::new(e1.ind, m.add(e1.val, e2.val)))
                } else {
                    Err((e1, e2))
                }
            )
            .filter(|e| e.val != 0)
            .collect();
        Self { entries }
    }

    pub fn from_sorted_entries<I>(entries: I) -> Self
    where I: IntoIterator<Item = (usize, u64)> {
        let entries = entries.into_iter().map(|(i, a)| SpEntry::new(i, a)).collect();
        let v = Self { entries };
        assert!(v.is_valid(), "entries must be strictly increasing and nonzero.");
        v
    }

    pub fn from_dense(m: &Modulus, data: &[u64]) -> Self {
        let entries = data.iter().enumerate().filter_map(|(i, &a)| {
            let a = m.reduce(a);
            (a != 0).then(|| SpEntry::new(i, a))
        }).collect();
        Self { entries }
    }

    pub fn to_dense(&self, len: usize) -> Vec<u64> {
        assert!(self.max_ind().map_or(true, |i| i < len));

        let mut vec = vec![0; len];
        for e in self.entries.iter() {
            vec[e.ind] = e.val;
        }
        vec
    }

    pub fn permute_inds(&mut self, p: PermView) {
        for e in self.entries.iter_mut() {
            e.ind = p.at(e.ind);
        }
        self.entries.sort_unstable_by_key(|e| e.ind);
    }

    pub fn union_nnz(u: &SpVec, v: &SpVec) -> usize {
        u.entries.iter().merge_join_by(
            v.entries.iter(),
            |e1, e2| e1.ind.cmp(&e2.ind)
        ).count()
    }

    pub fn scalar_mul_assign(&mut self, c: u64, m: &Modulus) {
        let c = m.reduce(c);
        if c == 0 {
            self.clear();
        } else if c == 1 {
            return
        } else {
            // c·a may vanish when n is not prime.
            self.entries.retain_mut(|e| {
                e.val = m.mul(e.val, c);
                e.val != 0
            });
            if self.entries.is_empty() {
                self.clear();
            }
        }
    }

    pub fn scalar_mul(&self, c: u64, m: &Modulus) -> SpVec {
        if m.reduce(c) == 0 {
            return SpVec::zero()
        }
        let mut res = self.clone();
        res.scalar_mul_assign(c, m);
        res
    }

    pub fn neg_assign(&mut self, m: &Modulus) {
        for e in self.entries.iter_mut() {
            e.val = m.neg(e.val);
        }
    }

    pub fn neg(&self, m: &Modulus) -> SpVec {
        let mut res = self.clone();
        res.neg_assign(m);
        res
    }

    //  self = self + c·v
    //
    //  The buffer of `self` is grown to the union size and filled from the
    //  tail, consuming both inputs from the highest index downwards:
    //
    //    u: [u0 u1 u2 .  .  .]      i: next unread u (from the right)
    //    w: [.  .  .  w3 w4 w5]     k: last written slot
    //
    //  `k >= i` holds throughout, so unread entries of `self` are never
    //  overwritten. The result occupies `k..` and is shifted to the front.

    pub fn scalar_addmul_assign(&mut self, v: &SpVec, c: u64, m: &Modulus) {
        let c = m.reduce(c);
        if c == 0 || v.is_zero() {
            return
        }
        if self.is_zero() {
            *self = v.scalar_mul(c, m);
            return
        }

        let unnz = self.nnz();
        let wnnz = Self::union_nnz(self, v);

        let w = &mut self.entries;
        let v = &v.entries;
        w.resize(wnnz, SpEntry::default());

        let (mut i, mut j, mut k) = (unnz, v.len(), wnnz);

        while i > 0 && j > 0 {
            let (ue, ve) = (w[i - 1], v[j - 1]);
            let e = match ue.ind.cmp(&ve.ind) {
                Greater => {
                    i -= 1;
                    ue
                },
                Less => {
                    j -= 1;
                    SpEntry::new(ve.ind, m.mul(ve.val, c))
                },
                Equal => {
                    i -= 1;
                    j -= 1;
                    SpEntry::new(ue.ind, m.add(ue.val, m.mul(ve.val, c)))
                }
            };
            if e.val != 0 {
                k -= 1;
                w[k] = e;
            }
        }

        while j > 0 {
            j -= 1;
            let ve = v[j];
            let a = m.mul(ve.val, c);
            if a != 0 {
                k -= 1;
                w[k] = SpEntry::new(ve.ind, a);
            }
        }

        if i > 0 && k > i {
            w.copy_within(0..i, k - i);
        }
        k -= i;

        w.drain(..k);

        if w.is_empty() {
            *w = vec![];
        } else {
            w.shrink_to_fit();
        }

        debug_assert!(self.is_valid());
    }

    pub fn scalar_addmul(u: &SpVec, v: &SpVec, c: u64, m: &Modulus) -> SpVec {
        let mut w = u.clone();
        w.scalar_addmul_assign(v, c, m);
        w
    }

    pub fn scalar_submul_assign(&mut self, v: &SpVec, c: u64, m: &Modulus) {
        self.scalar_addmul_assign(v, m.neg(m.reduce(c)), m)
    }

    pub fn scalar_submul(u: &SpVec, v: &SpVec, c: u64, m: &Modulus) -> SpVec {
        Self::scalar_addmul(u, v, m.neg(m.reduce(c)), m)
    }

    pub fn add_assign(&mut self, v: &SpVec, m: &Modulus) {
        self.scalar_addmul_assign(v, 1, m)
    }

    pub fn sub_assign(&mut self, v: &SpVec, m: &Modulus) {
        self.scalar_addmul_assign(v, m.neg(1), m)
    }

    pub fn add(u: &SpVec, v: &SpVec, m: &Modulus) -> SpVec {
        Self::scalar_addmul(u, v, 1, m)
    }

    pub fn sub(u: &SpVec, v: &SpVec, m: &Modulus) -> SpVec {
        Self::scalar_addmul(u, v, m.neg(1), m)
    }

    pub fn dot(u: &SpVec, v: &SpVec, m: &Modulus) -> u64 {
        u.entries.iter().merge_join_by(
            v.entries.iter(),
            |e1, e2| e1.ind.cmp(&e2.ind)
        ).fold(0, |res, e| match e {
            EitherOrBoth::Both(e1, e2) => m.add(res, m.mul(e1.val, e2.val)),
            _ => res
        })
    }

    pub fn dot_dense(&self, v: &[u64], m: &Modulus) -> u64 {
        self.entries.iter().fold(0, |res, e|
            m.add(res, m.mul(e.val, m.reduce(v[e.ind])))
        )
    }
}

impl Display for SpVec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.entries.iter().map(|e| format!("{}: {}", e.ind, e.val)).join(", ");
        write!(f, "[{s}]")
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;
    use sprs::PermOwned;
    use super::*;

    fn vec_of(m: &Modulus, data: &[u64]) -> SpVec {
        SpVec::from_dense(m, data)
    }

    fn rand_vec(rng: &mut StdRng, m: &Modulus, len: usize, density: f64) -> Vec<u64> {
        (0..len).map(|_|
            if rng.gen::<f64>() < density {
                rng.gen_range(1..m.n())
            } else {
                0
            }
        ).collect()
    }

    #[test]
    fn from_dense() {
        let m = Modulus::new(7);
        let v = vec_of(&m, &[1, 0, 3, 12, 0, 7]);
        assert_eq!(v.entries(), &[
            SpEntry::new(0, 1),
            SpEntry::new(2, 3),
            SpEntry::new(3, 5),
        ]);
        assert_eq!(v.nnz(), 3);
    }

    #[test]
    fn from_entries() {
        let m = Modulus::new(7);
        let v = SpVec::from_entries(&m, [(4, 5), (0, 1), (2, 3), (4, 2), (1, 6), (1, 3)]);
        assert_eq!(v, SpVec::from_sorted_entries([(0, 1), (1, 2), (2, 3)]));
    }

    #[test]
    #[should_panic]
    fn from_sorted_entries_unsorted() {
        SpVec::from_sorted_entries([(2, 1), (1, 1)]);
    }

    #[test]
    #[should_panic]
    fn from_sorted_entries_zero() {
        SpVec::from_sorted_entries([(1, 0)]);
    }

    #[test]
    fn to_dense() {
        let m = Modulus::new(7);
        let v = vec_of(&m, &[1, 0, 3, 5, 0]);
        assert_eq!(v.to_dense(5), vec![1, 0, 3, 5, 0]);
        assert_eq!(v.to_dense(7), vec![1, 0, 3, 5, 0, 0, 0]);
    }

    #[test]
    fn at() {
        let m = Modulus::new(7);
        let v = vec_of(&m, &[1, 0, 3, 5, 0]);
        assert_eq!(v.at(0), 1);
        assert_eq!(v.at(1), 0);
        assert_eq!(v.at(3), 5);
        assert_eq!(v.at(100), 0);
    }

    #[test]
    fn unit() {
        let v = SpVec::unit(3);
        assert_eq!(v.to_dense(5), vec![0, 0, 0, 1, 0]);
    }

    #[test]
    fn display() {
        let m = Modulus::new(7);
        let v = vec_of(&m, &[1, 0, 3]);
        assert_eq!(v.to_string(), "[0: 1, 2: 3]");
        assert_eq!(SpVec::zero().to_string(), "[]");
    }

    #[test]
    fn permute_inds() {
        let m = Modulus::new(7);
        let p = PermOwned::new(vec![1, 3, 0, 2]);
        let mut v = vec_of(&m, &[4, 1, 2, 3]);
        v.permute_inds(p.view());
        assert_eq!(v.to_dense(4), vec![2, 4, 3, 1]);
    }

    #[test]
    fn union_nnz() {
        let m = Modulus::new(7);
        let u = vec_of(&m, &[1, 0, 3, 0, 2]);
        let v = vec_of(&m, &[0, 0, 1, 4, 0, 1]);
        assert_eq!(SpVec::union_nnz(&u, &v), 5);
        assert_eq!(SpVec::union_nnz(&u, &SpVec::zero()), 3);
    }

    #[test]
    fn add() {
        let m = Modulus::new(7);
        let u = vec_of(&m, &[1, 0, 3, 5, 0]);
        let v = vec_of(&m, &[2, 1, 4, 3, 2]);
        assert_eq!(SpVec::add(&u, &v, &m), vec_of(&m, &[3, 1, 0, 1, 2]));
    }

    #[test]
    fn add_commutes() {
        let m = Modulus::new(7);
        let u = vec_of(&m, &[1, 0, 3, 5, 0, 6]);
        let v = vec_of(&m, &[2, 1, 4, 0, 0, 1]);
        assert_eq!(SpVec::add(&u, &v, &m), SpVec::add(&v, &u, &m));
    }

    #[test]
    fn sub() {
        let m = Modulus::new(7);
        let u = vec_of(&m, &[1, 0, 3, 5, 0]);
        let v = vec_of(&m, &[2, 1, 3, 3, 2]);
        assert_eq!(SpVec::sub(&u, &v, &m), vec_of(&m, &[6, 6, 0, 2, 5]));
    }

    #[test]
    fn neg() {
        let m = Modulus::new(7);
        let v = vec_of(&m, &[1, 0, 3, 5, 0]);
        assert_eq!(v.neg(&m), vec_of(&m, &[6, 0, 4, 2, 0]));
    }

    #[test]
    fn scalar_mul() {
        let m = Modulus::new(7);
        let v = vec_of(&m, &[1, 0, 3, 5, 0]);
        assert_eq!(v.scalar_mul(3, &m), vec_of(&m, &[3, 0, 2, 1, 0]));
        assert_eq!(v.scalar_mul(1, &m), v);
    }

    #[test]
    fn scalar_mul_zero() {
        let m = Modulus::new(7);
        let mut v = vec_of(&m, &[1, 0, 3, 5, 0]);
        assert!(v.scalar_mul(0, &m).is_zero());

        v.scalar_mul_assign(0, &m);
        assert!(v.is_zero());
        assert_eq!(v.entries.capacity(), 0);
    }

    #[test]
    fn unreduced_scalar() {
        let m = Modulus::new(7);
        let u = vec_of(&m, &[1, 0, 3, 5, 0]);
        let v = vec_of(&m, &[2, 1, 3, 3, 2]);

        assert!(u.scalar_mul(7, &m).is_zero());
        assert_eq!(u.scalar_mul(10, &m), u.scalar_mul(3, &m));
        assert_eq!(SpVec::scalar_addmul(&u, &v, 14, &m), u);
        assert_eq!(SpVec::scalar_addmul(&u, &v, 9, &m), SpVec::scalar_addmul(&u, &v, 2, &m));
        assert_eq!(SpVec::scalar_submul(&u, &v, 8, &m), SpVec::sub(&u, &v, &m));

        let mut w = u.clone();
        w.scalar_mul_assign(21, &m);
        assert!(w.is_zero());

        let mut w = SpVec::zero();
        w.scalar_addmul_assign(&v, 15, &m);
        assert_eq!(w, v);
    }

    #[test]
    fn scalar_mul_prime_power() {
        let m = Modulus::new(9);
        let v = vec_of(&m, &[3, 1, 6, 2]);
        assert_eq!(v.scalar_mul(3, &m), vec_of(&m, &[0, 3, 0, 6]));
    }

    #[test]
    fn double() {
        let m = Modulus::new(7);
        let u = vec_of(&m, &[1, 0, 3, 5, 0, 4]);
        let w = SpVec::scalar_addmul(&u, &u, 1, &m);
        assert_eq!(w, u.scalar_mul(2, &m));
    }

    #[test]
    fn cancel() {
        let m = Modulus::new(7);
        let u = vec_of(&m, &[1, 0, 3, 5, 0, 4]);
        let w = SpVec::scalar_addmul(&u, &u, m.neg(1), &m);
        assert!(w.is_zero());

        let mut w = u.clone();
        w.sub_assign(&u, &m);
        assert!(w.is_zero());
        assert_eq!(w.entries.capacity(), 0);
    }

    #[test]
    fn addmul_zero_scalar() {
        let m = Modulus::new(7);
        let u = vec_of(&m, &[1, 0, 3, 5, 0]);
        let v = vec_of(&m, &[2, 1, 3, 3, 2]);
        assert_eq!(SpVec::scalar_addmul(&u, &v, 0, &m), u);
        assert_eq!(SpVec::scalar_addmul(&u, &SpVec::zero(), 0, &m), u);
    }

    #[test]
    fn addmul_empty() {
        let m = Modulus::new(7);
        let u = SpVec::zero();
        let v = vec_of(&m, &[2, 1, 3, 3, 2]);
        assert_eq!(SpVec::scalar_addmul(&u, &v, 2, &m), v.scalar_mul(2, &m));
        assert_eq!(SpVec::scalar_addmul(&v, &u, 2, &m), v);
    }

    #[test]
    fn addmul_assign() {
        let m = Modulus::new(7);
        let mut u = vec_of(&m, &[1, 0, 3, 0, 0, 4, 0]);
        let v = vec_of(&m, &[0, 2, 2, 0, 1, 1, 1]);

        // u + 2v = [1, 4, 0, 0, 2, 6, 2]
        u.scalar_addmul_assign(&v, 2, &m);

        assert_eq!(u, vec_of(&m, &[1, 4, 0, 0, 2, 6, 2]));
    }

    #[test]
    fn addmul_assign_tail_of_u() {
        let m = Modulus::new(7);
        let mut u = vec_of(&m, &[1, 2, 3, 0, 0]);
        let v = vec_of(&m, &[0, 0, 0, 1, 1]);
        u.scalar_addmul_assign(&v, 3, &m);
        assert_eq!(u, vec_of(&m, &[1, 2, 3, 3, 3]));
    }

    #[test]
    fn addmul_assign_cancel_middle() {
        let m = Modulus::new(7);
        let mut u = vec_of(&m, &[0, 1, 2, 5, 0, 3]);
        let v = vec_of(&m, &[1, 0, 1, 1, 0, 0]);

        // cancels at 2, leaves 0 and 3 updated.
        u.scalar_addmul_assign(&v, 5, &m);
        assert_eq!(u, vec_of(&m, &[5, 1, 0, 3, 0, 3]));
    }

    #[test]
    fn submul() {
        let m = Modulus::new(7);
        let u = vec_of(&m, &[1, 0, 3, 5, 0]);
        let v = vec_of(&m, &[2, 1, 3, 3, 2]);
        let w = SpVec::scalar_submul(&u, &v, 3, &m);
        assert_eq!(w, vec_of(&m, &[2, 4, 1, 3, 1]));
    }

    #[test]
    fn dot() {
        let m = Modulus::new(7);
        let u = vec_of(&m, &[1, 0, 3, 5, 0]);
        let v = vec_of(&m, &[2, 1, 3, 3, 2]);
        assert_eq!(SpVec::dot(&u, &v, &m), 5); // 2 + 9 + 15 = 26
        assert_eq!(u.dot_dense(&[2, 1, 3, 3, 2], &m), 5);
        assert_eq!(SpVec::dot(&u, &SpVec::zero(), &m), 0);
    }

    #[test]
    fn addmul_rand() {
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..200 {
            let m = Modulus::new([2, 3, 7, 9, 101][rng.gen_range(0..5)]);
            let len = rng.gen_range(0..40);
            let (d1, d2) = (rng.gen(), rng.gen());
            let a = rand_vec(&mut rng, &m, len, d1);
            let b = rand_vec(&mut rng, &m, len, d2);
            let c = rng.gen_range(0..m.n());

            let mut u = vec_of(&m, &a);
            let v = vec_of(&m, &b);
            u.scalar_addmul_assign(&v, c, &m);

            let expected = (0..len).map(|i| m.add(a[i], m.mul(c, b[i]))).collect::<Vec<_>>();

            assert!(u.is_valid());
            assert_eq!(u.to_dense(len), expected);
        }
    }
}
