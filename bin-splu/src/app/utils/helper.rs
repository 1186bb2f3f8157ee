use std::str::FromStr;
use itertools::Itertools;
use crate::app::err::*;

pub fn measure<F, Res>(proc: F) -> (Res, std::time::Duration)
where F: FnOnce() -> Res {
    let start = std::time::Instant::now();
    let res = proc();
    let time = start.elapsed();
    (res, time)
}

pub fn guard_panic<F, R>(f: F) -> AppResult<R>
where F: FnOnce() -> AppResult<R> + std::panic::UnwindSafe {
    std::panic::catch_unwind(|| {
        f()
    }).unwrap_or_else(|e| {
        let info = match e.downcast::<String>() {
            Ok(v) => *v,
            Err(e) => match e.downcast::<&str>() {
                Ok(v) => v.to_string(),
                _ => "Unknown Source of Error".to_owned()
            }
        };
        err!("panic: {info}")
    })
}

// "1, -2,3" -> [1, -2, 3]
pub fn parse_list<T: FromStr>(s: &str) -> AppResult<Vec<T>> {
    let s = s.trim().trim_start_matches('[').trim_end_matches(']');
    if s.trim().is_empty() {
        return Ok(vec![])
    }

    let mut res = vec![];
    for t in s.split(',') {
        let t = t.trim();
        let Ok(a) = T::from_str(t) else {
            return err!("cannot parse '{}' as {}.", t, std::any::type_name::<T>())
        };
        res.push(a);
    }
    Ok(res)
}

pub fn vec2str<T: ToString>(v: &[T]) -> String {
    format!("[{}]", v.iter().map(|a| a.to_string()).join(", "))
}
