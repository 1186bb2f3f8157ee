use log::trace;
use splu::Modulus;

use super::*;
use super::lu::{lu, LuError, SpLu};

impl SpLu {
    /// Finds some `x` with `a * x == b`, or `None` if the system is
    /// inconsistent. Free variables are set to zero.
    pub fn solve(&self, b: &[u64]) -> Option<Vec<u64>> {
        let (m, n) = self.shape();
        assert_eq!(b.len(), m, "rhs must have length {m}.");

        let md = self.modulus();
        let r = self.rank();

        // c = P b
        let mut c = vec![0; m];
        for (i, &bi) in b.iter().enumerate() {
            c[self.p().at(i)] = md.reduce(bi);
        }

        let z = solve_lower_unit(self.l(), &c);

        if z[r..].iter().any(|&zi| zi != 0) {
            trace!("solve: inconsistent system.");
            return None
        }

        let y = solve_upper(self.u(), r, &z[..r]);

        // x = Q^{-1} y
        let x = (0..n).map(|j| y[self.q().at(j)]).collect();
        Some(x)
    }
}

pub fn solve(a: &SpMat, b: &[u64]) -> Result<Option<Vec<u64>>, LuError> {
    let res = lu(a)?;
    Ok(res.solve(b))
}

// Forward substitution with the diagonal of `l` taken as 1. Rows past
// the rank carry no diagonal entry, so their results are the residuals.
fn solve_lower_unit(l: &SpMat, c: &[u64]) -> Vec<u64> {
    let md = l.modulus();
    let mut z = c.to_vec();

    for k in 0..l.nrows() {
        let s = l.row(k).iter().take_while(|&(j, _)| j < k).fold(0, |s, (j, a)|
            md.add(s, md.mul(a, z[j]))
        );
        z[k] = md.sub(z[k], s);
    }

    z
}

// Back substitution on the leading `z.len() × z.len()` block of `u`.
// Columns past it are free and set to zero.
fn solve_upper(u: &SpMat, rank: usize, z: &[u64]) -> Vec<u64> {
    debug_assert_eq!(z.len(), rank);

    let md: &Modulus = u.modulus();
    let mut y = vec![0; u.ncols()];

    for k in (0..rank).rev() {
        let row = u.row(k);
        let mut s = z[k];
        let mut piv = 0;

        for (j, a) in row.iter() {
            if j == k {
                piv = a;
            } else {
                s = md.sub(s, md.mul(a, y[j]));
            }
        }

        y[k] = md.div(s, piv);
    }

    y
}
