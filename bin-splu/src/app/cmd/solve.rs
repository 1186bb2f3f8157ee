use log::info;
use splu_matrix::MatTrait;
use splu_matrix::sparse::lu::lu;
use crate::app::utils::*;
use crate::app::err::*;

pub fn dispatch(args: &Args) -> AppResult<String> {
    let a = load_mat(&args.input)?;
    let m = *a.modulus();

    let b = parse_list::<i64>(&args.rhs)?;
    ensure!(b.len() == a.nrows(), "rhs must have {} entries, got {}.", a.nrows(), b.len());
    let b = b.into_iter().map(|x| m.from_i64(x)).collect::<Vec<_>>();

    let res = lu(&a)?;
    info!("rank: {}", res.rank());

    match res.solve(&b) {
        Some(x) => Ok(vec2str(&x)),
        None => Ok("no solution.".to_string())
    }
}

#[derive(Clone, Default, Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(short, long)]
    pub rhs: String,

    #[arg(long, default_value = "0")]
    pub log: u8,
}
