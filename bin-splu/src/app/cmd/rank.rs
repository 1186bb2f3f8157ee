use splu_matrix::sparse::lu::rank;
use crate::app::utils::*;
use crate::app::err::*;

pub fn dispatch(args: &Args) -> AppResult<String> {
    let a = load_mat(&args.input)?;
    let r = rank(&a)?;
    Ok(r.to_string())
}

#[derive(Clone, Default, Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long, default_value = "0")]
    pub log: u8,
}
