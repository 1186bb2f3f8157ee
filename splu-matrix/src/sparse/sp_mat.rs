use std::ops::{Add, AddAssign, Neg, Sub, SubAssign, Mul, MulAssign};
use std::fmt::{Display, Debug};
use auto_impl_ops::auto_ops;
use itertools::Itertools;
use log::trace;
use sprs::{PermOwned, PermView};
use splu::Modulus;
use super::*;

cfg_if::cfg_if! {
    if #[cfg(feature = "multithread")] {
        use rayon::prelude::*;
    }
}

/// Row-major sparse matrix over `Z/nZ`.
///
/// Each row is an owned `SpVec` with indices `< ncols`, all rows share
/// the matrix's modulus.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpMat {
    shape: (usize, usize),
    modulus: Modulus,
    rows: Vec<SpVec>
}

impl MatTrait for SpMat {
    fn shape(&self) -> (usize, usize) {
        self.shape
    }
}

impl SpMat {
    pub fn zero(shape: (usize, usize), modulus: Modulus) -> Self {
        let rows = vec![SpVec::zero(); shape.0];
        Self { shape, modulus, rows }
    }

    pub fn id(n: usize, modulus: Modulus) -> Self {
        let rows = (0..n).map(SpVec::unit).collect();
        Self { shape: (n, n), modulus, rows }
    }

    pub fn from_rows<I>(ncols: usize, modulus: Modulus, rows: I) -> Self
    where I: IntoIterator<Item = SpVec> {
        let rows = rows.into_iter().collect_vec();
        for (i, r) in rows.iter().enumerate() {
            assert!(
                r.max_ind().map_or(true, |j| j < ncols),
                "row {i} has an entry out of range (ncols = {ncols})."
            );
        }
        let shape = (rows.len(), ncols);
        Self { shape, modulus, rows }
    }

    pub fn from_entries<T>(shape: (usize, usize), modulus: Modulus, entries: T) -> Self
    where T: IntoIterator<Item = (usize, usize, u64)> {
        let (m, n) = shape;
        let mut buckets = vec![vec![]; m];
        for (i, j, a) in entries {
            assert!(i < m && j < n, "({i}, {j}) is out of range for shape {shape:?}.");
            buckets[i].push((j, a));
        }
        let rows = buckets.into_iter().map(|b|
            SpVec::from_entries(&modulus, b)
        ).collect();
        Self { shape, modulus, rows }
    }

    pub fn from_dense_data<I>(shape: (usize, usize), modulus: Modulus, data: I) -> Self
    where I: IntoIterator<Item = i64> {
        let (m, n) = shape;
        let data = data.into_iter().collect_vec();
        assert_eq!(data.len(), m * n, "data length does not match shape {shape:?}.");

        Self::from_entries(
            shape,
            modulus,
            data.into_iter().enumerate().map(|(k, a)| {
                let (i, j) = (k / n, k % n);
                (i, j, modulus.from_i64(a))
            })
        )
    }

    pub fn modulus(&self) -> &Modulus {
        &self.modulus
    }

    pub fn rows(&self) -> &[SpVec] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> &SpVec {
        &self.rows[i]
    }

    pub(crate) fn row_mut(&mut self, i: usize) -> &mut SpVec {
        &mut self.rows[i]
    }

    pub fn into_rows(self) -> Vec<SpVec> {
        self.rows
    }

    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.nnz()).sum()
    }

    pub fn is_zero(&self) -> bool {
        self.rows.iter().all(|r| r.is_zero())
    }

    pub fn is_id(&self) -> bool {
        self.is_square() && self.rows.iter().enumerate().all(|(i, r)|
            r == &SpVec::unit(i)
        )
    }

    pub fn at(&self, i: usize, j: usize) -> u64 {
        assert!(i < self.nrows() && j < self.ncols());
        self.rows[i].at(j)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, u64)> + '_ {
        self.rows.iter().enumerate().flat_map(|(i, r)|
            r.iter().map(move |(j, a)| (i, j, a))
        )
    }

    pub fn to_dense(&self) -> Vec<Vec<u64>> {
        let n = self.ncols();
        self.rows.iter().map(|r| r.to_dense(n)).collect()
    }

    pub fn is_upper_triang(&self) -> bool {
        self.iter().all(|(i, j, _)| i <= j)
    }

    pub fn is_lower_triang(&self) -> bool {
        self.iter().all(|(i, j, _)| i >= j)
    }

    // Rows are filled in increasing order, so each column comes out sorted.
    pub fn transpose(&self) -> Self {
        let (m, n) = self.shape;
        let mut cols = vec![vec![]; n];

        for i in 0..m {
            for e in self.rows[i].entries() {
                cols[e.ind].push(SpEntry::new(i, e.val));
            }
        }

        let rows = cols.into_iter().map(SpVec::from_raw).collect();
        Self { shape: (n, m), modulus: self.modulus, rows }
    }

    // entry (i, j) moves to (p.at(i), q.at(j)).
    pub fn permute(&self, p: PermView, q: PermView) -> Self {
        assert_eq!(p.dim(), self.nrows());
        assert_eq!(q.dim(), self.ncols());

        let mut rows = vec![SpVec::zero(); self.nrows()];
        for (i, r) in self.rows.iter().enumerate() {
            let mut r = r.clone();
            r.permute_inds(q.clone());
            rows[p.at(i)] = r;
        }
        Self { shape: self.shape, modulus: self.modulus, rows }
    }

    pub fn permute_rows(&self, p: PermView) -> Self {
        let q = PermOwned::identity(self.ncols());
        self.permute(p, q.view())
    }

    pub fn permute_cols(&self, q: PermView) -> Self {
        let p = PermOwned::identity(self.nrows());
        self.permute(p.view(), q)
    }

    pub fn scalar_mul(&self, c: u64) -> Self {
        let c = self.modulus.reduce(c);
        let rows = self.rows.iter().map(|r| r.scalar_mul(c, &self.modulus)).collect();
        Self { shape: self.shape, modulus: self.modulus, rows }
    }

    pub fn mul_vec(&self, v: &[u64]) -> Vec<u64> {
        assert_eq!(self.ncols(), v.len());

        let m = &self.modulus;
        let f = |r: &SpVec| r.dot_dense(v, m);

        cfg_if::cfg_if! {
            if #[cfg(feature = "multithread")] {
                if crate::config::should_parallelize(self.nrows()) {
                    return self.rows.par_iter().map(f).collect()
                }
            }
        }

        self.rows.iter().map(f).collect()
    }

    fn mul_row(&self, r: &SpVec, b: &SpMat) -> SpVec {
        r.iter().fold(SpVec::zero(), |mut res, (k, a)| {
            res.scalar_addmul_assign(&b.rows[k], a, &self.modulus);
            res
        })
    }

    fn assert_compat(&self, b: &SpMat) {
        assert_eq!(self.modulus, b.modulus, "moduli must match.");
    }
}

impl Default for SpMat {
    fn default() -> Self {
        Self::zero((0, 0), Modulus::new(2))
    }
}

impl Neg for &SpMat {
    type Output = SpMat;
    fn neg(self) -> Self::Output {
        let m = &self.modulus;
        let rows = self.rows.iter().map(|r| r.neg(m)).collect();
        SpMat { shape: self.shape, modulus: self.modulus, rows }
    }
}

impl Neg for SpMat {
    type Output = SpMat;
    fn neg(mut self) -> Self::Output {
        let m = self.modulus;
        self.rows.iter_mut().for_each(|r| r.neg_assign(&m));
        self
    }
}

macro_rules! impl_addsub {
    ($trait:ident, $method:ident, $c:expr) => {
        #[auto_ops]
        impl<'a, 'b> $trait<&'b SpMat> for &'a SpMat {
            type Output = SpMat;
            fn $method(self, rhs: &'b SpMat) -> Self::Output {
                self.assert_compat(rhs);
                assert_eq!(self.shape, rhs.shape);

                let m = &self.modulus;
                let c = ($c)(m);
                let rows = Iterator::zip(self.rows.iter(), rhs.rows.iter()).map(|(u, v)|
                    SpVec::scalar_addmul(u, v, c, m)
                ).collect();

                SpMat { shape: self.shape, modulus: self.modulus, rows }
            }
        }
    };
}

impl_addsub!(Add, add, |_: &Modulus| 1);
impl_addsub!(Sub, sub, |m: &Modulus| m.neg(1));

#[auto_ops]
impl<'a, 'b> Mul<&'b SpMat> for &'a SpMat {
    type Output = SpMat;
    fn mul(self, rhs: &'b SpMat) -> Self::Output {
        self.assert_compat(rhs);
        assert_eq!(self.ncols(), rhs.nrows());

        trace!("mul: {:?} * {:?}", self.shape, rhs.shape);

        let shape = (self.nrows(), rhs.ncols());
        let f = |r: &SpVec| self.mul_row(r, rhs);

        cfg_if::cfg_if! {
            if #[cfg(feature = "multithread")] {
                if crate::config::should_parallelize(self.nrows()) {
                    let rows = self.rows.par_iter().map(f).collect();
                    return SpMat { shape, modulus: self.modulus, rows }
                }
            }
        }

        let rows = self.rows.iter().map(f).collect();
        SpMat { shape, modulus: self.modulus, rows }
    }
}

// Larger matrices print their nonzero rows only.
const DENSE_DISPLAY_MAX: usize = 32;

impl Display for SpMat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}x{} over {}", self.shape.0, self.shape.1, self.modulus)?;

        if self.nrows() > DENSE_DISPLAY_MAX || self.ncols() > DENSE_DISPLAY_MAX {
            for (i, r) in self.rows.iter().enumerate().filter(|(_, r)| !r.is_zero()) {
                writeln!(f, "{i}: {r}")?;
            }
            return Ok(())
        }

        let dense = self.to_dense();
        let w = dense.iter().flatten().map(|a| a.to_string().len()).max().unwrap_or(1);

        for r in dense.iter() {
            let line = r.iter().map(|a| format!("{a:>w$}")).join(" ");
            writeln!(f, "[{line}]")?;
        }
        Ok(())
    }
}

impl Debug for SpMat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
impl SpMat {
    // Each entry is nonzero with probability `density`.
    pub fn rand<R: rand::Rng>(shape: (usize, usize), modulus: Modulus, density: f64, rng: &mut R) -> Self {
        let (m, n) = shape;
        let mut entries = vec![];

        for i in 0..m {
            for j in 0..n {
                if rng.gen::<f64>() < density {
                    entries.push((i, j, rng.gen_range(1..modulus.n())));
                }
            }
        }

        Self::from_entries(shape, modulus, entries)
    }
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;

    pub(crate) fn f7() -> Modulus {
        Modulus::new(7)
    }

    #[test]
    fn init() {
        let a = SpMat::from_entries((2, 3), f7(), [
            (0, 0, 1),
            (0, 2, 2),
            (1, 0, 3),
            (1, 1, 4),
            (1, 1, 3),
        ]);
        assert_eq!(a.shape(), (2, 3));
        assert_eq!(a.nnz(), 3);
        assert_eq!(a.to_dense(), vec![
            vec![1, 0, 2],
            vec![3, 0, 0],
        ]);
    }

    #[test]
    fn from_dense_data() {
        let a = SpMat::from_dense_data((2, 2), f7(), [1, -1, 0, 9]);
        assert_eq!(a.to_dense(), vec![
            vec![1, 6],
            vec![0, 2],
        ]);
        assert_eq!(a.at(0, 1), 6);
        assert_eq!(a.at(1, 0), 0);
    }

    #[test]
    #[should_panic]
    fn from_rows_out_of_range() {
        SpMat::from_rows(2, f7(), [SpVec::unit(2)]);
    }

    #[test]
    fn id() {
        let a = SpMat::id(3, f7());
        assert!(a.is_id());
        assert!(!SpMat::zero((3, 3), f7()).is_id());
    }

    #[test]
    fn transpose() {
        let a = SpMat::from_dense_data((3, 4), f7(), 0..12);
        let b = a.transpose();

        assert_eq!(b, SpMat::from_dense_data((4, 3), f7(), [
            0, 4, 1,
            1, 5, 2,
            2, 6, 3,
            3, 0, 4,
        ]));
        assert_eq!(b.transpose(), a);
    }

    #[test]
    fn transpose_empty() {
        let a = SpMat::zero((0, 3), f7());
        let b = a.transpose();
        assert_eq!(b.shape(), (3, 0));
        assert!(b.is_zero());
    }

    #[test]
    fn permute() {
        let p = PermOwned::new(vec![1, 2, 3, 0]);
        let q = PermOwned::new(vec![3, 0, 2, 1]);
        let a = SpMat::from_dense_data((4, 4), Modulus::new(17), 0..16);
        let b = a.permute(p.view(), q.view());
        assert_eq!(b, SpMat::from_dense_data((4, 4), Modulus::new(17), [
            13, 15, 14, 12,
             1,  3,  2,  0,
             5,  7,  6,  4,
             9, 11, 10,  8,
        ]));
    }

    #[test]
    fn permute_rows_cols() {
        let md = Modulus::new(17);
        let p = PermOwned::new(vec![2, 0, 1]);
        let q = PermOwned::new(vec![1, 2, 3, 0]);
        let a = SpMat::from_dense_data((3, 4), md, 0..12);
        assert_eq!(
            a.permute_rows(p.view()).permute_cols(q.view()),
            a.permute(p.view(), q.view())
        );
    }

    #[test]
    fn triang() {
        let a = SpMat::from_dense_data((3, 4), f7(), [
            1, 2, 0, 3,
            0, 1, 1, 0,
            0, 0, 0, 5,
        ]);
        assert!(a.is_upper_triang());
        assert!(!a.is_lower_triang());
        assert!(a.transpose().is_lower_triang());
    }

    #[test]
    fn add_sub_neg() {
        let a = SpMat::from_dense_data((2, 3), f7(), [1, 2, 3, 4, 5, 6]);
        let b = SpMat::from_dense_data((2, 3), f7(), [6, 0, 4, 3, 2, 1]);

        assert_eq!(&a + &b, SpMat::from_dense_data((2, 3), f7(), [0, 2, 0, 0, 0, 0]));
        assert_eq!(&a - &b, SpMat::from_dense_data((2, 3), f7(), [2, 2, 6, 1, 3, 5]));
        assert_eq!(&a + -&a, SpMat::zero((2, 3), f7()));
        assert!((a.clone() - a).is_zero());
    }

    #[test]
    fn scalar_mul() {
        let a = SpMat::from_dense_data((2, 2), f7(), [1, 2, 3, 4]);
        assert_eq!(a.scalar_mul(3), SpMat::from_dense_data((2, 2), f7(), [3, 6, 2, 5]));
        assert!(a.scalar_mul(14).is_zero());

        let c = 5;
        let ac = a.scalar_mul(c);
        let ac1 = a.scalar_mul(c - 1);
        assert_eq!(ac - ac1, a);
    }

    #[test]
    #[should_panic]
    fn add_modulus_mismatch() {
        let a = SpMat::id(2, f7());
        let b = SpMat::id(2, Modulus::new(5));
        let _ = a + b;
    }

    #[test]
    fn mul() {
        let a = SpMat::from_dense_data((2, 3), f7(), [1, 2, 0, 0, 1, 3]);
        let b = SpMat::from_dense_data((3, 2), f7(), [1, 0, 3, 1, 0, 2]);
        assert_eq!(&a * &b, SpMat::from_dense_data((2, 2), f7(), [0, 2, 3, 0]));
        assert_eq!(&a * SpMat::id(3, f7()), a);
    }

    #[test]
    fn mul_vec() {
        let a = SpMat::from_dense_data((2, 3), f7(), [1, 2, 0, 0, 1, 3]);
        assert_eq!(a.mul_vec(&[1, 2, 3]), vec![5, 4]);
    }

    #[test]
    fn mul_multithread() {
        let md = Modulus::new(101);
        let a = SpMat::from_dense_data((40, 30), md, (0..1200).map(|k| (k * 7) % 5 - 2));
        let b = SpMat::from_dense_data((30, 20), md, (0..600).map(|k| (k * 3) % 4 - 1));

        crate::config::set_parallel_min_rows(usize::MAX);
        let c1 = &a * &b;
        crate::config::set_parallel_min_rows(1);
        let c2 = &a * &b;
        crate::config::set_parallel_min_rows(1024);

        assert_eq!(c1, c2);
    }

    #[test]
    fn display() {
        let a = SpMat::from_dense_data((2, 2), Modulus::new(11), [1, 10, 0, 3]);
        assert_eq!(a.to_string(), "2x2 over Z/11\n[ 1 10]\n[ 0  3]\n");
    }

    #[test]
    fn display_large() {
        let a = SpMat::from_entries((100, 1000), f7(), [(3, 999, 2), (3, 0, 1), (70, 5, 6)]);
        assert_eq!(a.to_string(), "100x1000 over Z/7\n3: [0: 1, 999: 2]\n70: [5: 6]\n");
    }

    #[test]
    #[should_panic]
    fn from_dense_data_short() {
        SpMat::from_dense_data((2, 2), f7(), [1]);
    }

    #[test]
    #[should_panic]
    fn from_dense_data_no_cols() {
        SpMat::from_dense_data((2, 0), f7(), [1, 2]);
    }

    #[test]
    fn from_dense_data_empty() {
        let a = SpMat::from_dense_data((2, 0), f7(), Vec::<i64>::new());
        assert_eq!(a.shape(), (2, 0));
        assert!(a.is_zero());
    }

    #[test]
    #[cfg(feature = "serde")]
    fn serialize() {
        let a = SpMat::from_dense_data((3, 4), f7(), (0..12).map(|x| x % 5));
        let ser = serde_json::to_string(&a).unwrap();
        let des = serde_json::from_str(&ser).unwrap();
        assert_eq!(a, des);
    }
}
