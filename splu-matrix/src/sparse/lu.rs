// Sparse PLUQ factorization over Z/nZ with Markowitz-style pivoting.
//
// The sparsest remaining column is always eliminated first, using its
// sparsest incident row as the pivot row. See also:
//
// "Parallel Sparse PLUQ Factorization modulo p", Charles Bouillaguet, Claire Delaplace, Marie-Emilie Voge.
// https://hal.inria.fr/hal-01646133/document

use derive_more::Display;
use log::{debug, trace};
use sprs::{PermOwned, PermView};

use splu::Modulus;
use super::*;
use super::heap::IndexedHeap;
use super::util::perm_from_vec;

const LOG_THRESHOLD: usize = 10_000;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum LuError {
    #[display("pivot at ({row}, {col}) is not a unit")]
    NonUnitPivot { row: usize, col: usize }
}

impl std::error::Error for LuError {}

/// Result of [`lu`]: permutations `p`, `q` and factors `l`, `u` with
///
/// ```text
///   a.permute(p, q) == l * u
/// ```
///
/// `l` is `m × m` lower triangular with unit diagonal on `0..rank`,
/// and `u` is `m × n` upper triangular with nonzero rows only in
/// `0..rank`. Rows and columns that never became pivots are sent to
/// the trailing slots of `p` and `q`.
#[derive(Clone, Debug)]
pub struct SpLu {
    rank: usize,
    p: PermOwned,
    q: PermOwned,
    l: SpMat,
    u: SpMat
}

impl SpLu {
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn p(&self) -> PermView {
        self.p.view()
    }

    pub fn q(&self) -> PermView {
        self.q.view()
    }

    pub fn l(&self) -> &SpMat {
        &self.l
    }

    pub fn u(&self) -> &SpMat {
        &self.u
    }

    pub fn modulus(&self) -> &Modulus {
        self.u.modulus()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.u.shape()
    }

    pub fn into_parts(self) -> (usize, PermOwned, PermOwned, SpMat, SpMat) {
        (self.rank, self.p, self.q, self.l, self.u)
    }
}

pub fn lu(a: &SpMat) -> Result<SpLu, LuError> {
    let (m, n) = a.shape();
    let modulus = *a.modulus();

    if a.is_empty() {
        return Ok(SpLu {
            rank: 0,
            p: PermOwned::identity(m),
            q: PermOwned::identity(n),
            l: SpMat::zero((m, m), modulus),
            u: SpMat::zero((m, n), modulus)
        })
    }

    let mut w = LuWorker::new(a);
    w.run()?;
    Ok(w.finish())
}

/// Factors `a` into caller-provided containers and returns the rank.
///
/// `l` must be `m × m`, `u` must be `m × n`, and both must share the
/// modulus of `a`. On return `p[i]` (resp. `q[j]`) is the image of row
/// `i` (resp. column `j`).
pub fn lu_into(a: &SpMat, l: &mut SpMat, u: &mut SpMat, p: &mut [usize], q: &mut [usize]) -> Result<usize, LuError> {
    let (m, n) = a.shape();

    assert_eq!(l.shape(), (m, m), "L must be {m}x{m}.");
    assert_eq!(u.shape(), (m, n), "U must be {m}x{n}.");
    assert_eq!(p.len(), m, "P must have length {m}.");
    assert_eq!(q.len(), n, "Q must have length {n}.");
    assert_eq!(l.modulus(), a.modulus(), "modulus mismatch.");
    assert_eq!(u.modulus(), a.modulus(), "modulus mismatch.");

    let res = lu(a)?;

    for (i, x) in p.iter_mut().enumerate() {
        *x = res.p.at(i);
    }
    for (j, x) in q.iter_mut().enumerate() {
        *x = res.q.at(j);
    }

    let (rank, _, _, l_res, u_res) = res.into_parts();
    *l = l_res;
    *u = u_res;

    Ok(rank)
}

pub fn rank(a: &SpMat) -> Result<usize, LuError> {
    lu(a).map(|res| res.rank())
}

// Slots of a permutation, assigned from the front (pivots) and from
// the back (vanished rows / cols). `front <= back` always holds.
#[derive(Clone, Debug)]
struct PermSlots {
    data: Vec<Option<usize>>,
    front: usize,
    back: usize
}

impl PermSlots {
    fn new(n: usize) -> Self {
        Self { data: vec![None; n], front: 0, back: n }
    }

    fn is_assigned(&self, i: usize) -> bool {
        self.data[i].is_some()
    }

    fn assign_front(&mut self, i: usize) {
        debug_assert!(!self.is_assigned(i));
        debug_assert!(self.front < self.back);

        self.data[i] = Some(self.front);
        self.front += 1;
    }

    fn assign_back(&mut self, i: usize) {
        debug_assert!(!self.is_assigned(i));
        debug_assert!(self.front < self.back);

        self.back -= 1;
        self.data[i] = Some(self.back);
    }

    fn into_perm(self) -> PermOwned {
        debug_assert_eq!(self.front, self.back);
        let p = self.data.into_iter().flatten().collect();
        perm_from_vec(p)
    }
}

pub(crate) struct LuWorker {
    modulus: Modulus,
    lt: SpMat, // column-major working copy
    u: SpMat,  // row-major working copy
    heap: IndexedHeap,
    rows: PermSlots,
    cols: PermSlots
}

impl LuWorker {
    pub(crate) fn new(a: &SpMat) -> Self {
        let (m, n) = a.shape();
        let modulus = *a.modulus();
        let lt = a.transpose();
        let u = a.clone();

        let mut rows = PermSlots::new(m);
        for i in 0..m {
            if u.row(i).is_zero() {
                rows.assign_back(i);
            }
        }

        let mut cols = PermSlots::new(n);
        for j in 0..n {
            if lt.row(j).is_zero() {
                cols.assign_back(j);
            }
        }

        let scores = lt.rows().iter().map(|c| c.nnz()).collect();
        let heap = IndexedHeap::new(scores);

        Self { modulus, lt, u, heap, rows, cols }
    }

    pub(crate) fn rank(&self) -> usize {
        self.rows.front
    }

    pub(crate) fn run(&mut self) -> Result<(), LuError> {
        let (m, n) = self.u.shape();
        let total = m.min(n);
        let report = total >= LOG_THRESHOLD;

        trace!("lu: {m}x{n}, nnz: {} ..", self.u.nnz());

        while let Some(pc) = self.heap.pop_min() {
            // columns that are already empty have been sent to the back.
            if self.lt.row(pc).is_zero() {
                continue
            }

            self.eliminate_at(pc)?;

            let r = self.rank();
            if report && r % LOG_THRESHOLD == 0 {
                trace!("  pivots: {r}/{total}, nnz(U): {}", self.u.nnz());
            }
        }

        trace!("lu: {m}x{n} => rank: {}.", self.rank());

        Ok(())
    }

    fn select_row(&self, pc: usize) -> usize {
        let pcol = self.lt.row(pc);
        let mut pr = pcol.entries()[0].ind;

        for e in &pcol.entries()[1..] {
            if self.u.row(e.ind).nnz() < self.u.row(pr).nnz() {
                pr = e.ind;
            }
        }

        pr
    }

    pub(crate) fn eliminate_at(&mut self, pc: usize) -> Result<(), LuError> {
        debug_assert!(!self.cols.is_assigned(pc));
        debug_assert!(!self.lt.row(pc).is_zero());

        let m = self.modulus;
        let pr = self.select_row(pc);

        let Some(cinv) = m.inv(self.u.row(pr).at(pc)) else {
            return Err(LuError::NonUnitPivot { row: pr, col: pc })
        };

        self.cols.assign_front(pc);
        self.rows.assign_front(pr);

        let mut pcol = std::mem::take(self.lt.row_mut(pc));
        let prow = std::mem::take(self.u.row_mut(pr));

        // row elimination: row -= (row[pc] / pivot) * prow
        for (r, _) in pcol.iter() {
            if self.rows.is_assigned(r) {
                continue
            }

            let row = self.u.row_mut(r);
            let c = m.neg(m.mul(cinv, row.at(pc)));
            row.scalar_addmul_assign(&prow, c, &m);

            if row.is_zero() {
                self.rows.assign_back(r);
            }
        }

        // column elimination: col -= col[pr] * (pcol / pivot)
        pcol.scalar_mul_assign(cinv, &m);

        for (c, _) in prow.iter() {
            if self.cols.is_assigned(c) {
                continue
            }

            let col = self.lt.row_mut(c);
            let d = m.neg(col.at(pr));
            col.scalar_addmul_assign(&pcol, d, &m);

            let nnz = col.nnz();
            if nnz == 0 {
                self.cols.assign_back(c);
            }
            self.heap.update(c, nnz);
        }

        *self.lt.row_mut(pc) = pcol;
        *self.u.row_mut(pr) = prow;

        Ok(())
    }

    pub(crate) fn finish(self) -> SpLu {
        let rank = self.rank();
        let (m, n) = self.u.shape();

        let p = self.rows.into_perm();
        let q = self.cols.into_perm();

        let l = self.lt.transpose().permute(p.view(), q.view());
        let l = SpMat::from_rows(m, self.modulus, l.into_rows());
        let u = self.u.permute(p.view(), q.view());

        debug!(
            "lu: {m}x{n}, rank: {rank}, nnz(L): {}, nnz(U): {}.",
            l.nnz(), u.nnz()
        );

        SpLu { rank, p, q, l, u }
    }
}
