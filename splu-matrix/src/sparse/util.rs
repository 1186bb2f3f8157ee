use sprs::{PermOwned, PermView};

pub fn perm_to_vec(p: PermView) -> Vec<usize> {
    (0..p.dim()).map(|i| p.at(i)).collect()
}

pub fn is_perm(p: &[usize]) -> bool {
    let n = p.len();
    let mut seen = vec![false; n];
    p.iter().all(|&i|
        i < n && !std::mem::replace(&mut seen[i], true)
    )
}

pub(crate) fn perm_from_vec(p: Vec<usize>) -> PermOwned {
    assert!(is_perm(&p), "not a permutation: {p:?}");
    PermOwned::new(p)
}
