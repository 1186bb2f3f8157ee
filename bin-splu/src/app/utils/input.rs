use std::path::Path;
use clap::ValueEnum;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use splu::Modulus;
use splu_matrix::MatTrait;
use splu_matrix::sparse::SpMat;
use crate::app::err::*;

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum, Display, Debug, Default)]
#[clap(rename_all="lower")]
pub enum Format {
    #[default] Json,
    Csv
}

#[derive(Clone, Default, Debug, clap::Args)]
pub struct InputArgs {
    /// Matrix as inline text or a file path.
    pub input: String,

    #[arg(short, long)]
    pub modulus: Option<u64>,

    #[arg(short, long, default_value = "json")]
    pub format: Format,
}

/// `{"modulus": 7, "shape": [2, 3], "entries": [[0, 1, 5], ...]}`
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MatData {
    pub modulus: u64,
    pub shape: (usize, usize),
    pub entries: Vec<(usize, usize, i64)>
}

impl MatData {
    pub fn from_mat(a: &SpMat) -> Self {
        let modulus = a.modulus().n();
        let shape = a.shape();
        let entries = a.iter().map(|(i, j, v)| (i, j, v as i64)).collect();
        Self { modulus, shape, entries }
    }

    pub fn into_mat(self) -> AppResult<SpMat> {
        let m = modulus_from(self.modulus)?;
        let (rows, cols) = self.shape;

        for &(i, j, _) in self.entries.iter() {
            ensure!(i < rows && j < cols, "entry ({i}, {j}) is out of range for shape {:?}.", self.shape);
        }

        let entries = self.entries.into_iter().map(|(i, j, v)| (i, j, m.from_i64(v)));
        Ok(SpMat::from_entries(self.shape, m, entries))
    }
}

pub fn modulus_from(n: u64) -> AppResult<Modulus> {
    ensure!(n >= 2 && n < Modulus::MAX, "invalid modulus: {n}.");
    Ok(Modulus::new(n))
}

pub fn load_mat(args: &InputArgs) -> AppResult<SpMat> {
    let a = match args.format {
        Format::Json => load_json(&args.input, args.modulus)?,
        Format::Csv  => load_csv(&args.input, args.modulus)?,
    };

    log::info!("input: {}x{} over {}, nnz: {}", a.nrows(), a.ncols(), a.modulus(), a.nnz());

    Ok(a)
}

fn load_json(input: &str, modulus: Option<u64>) -> AppResult<SpMat> {
    let mut data = if let Ok(data) = serde_json::from_str::<MatData>(input) {
        data
    } else if Path::new(input).is_file() {
        let text = std::fs::read_to_string(input)?;
        serde_json::from_str::<MatData>(&text)?
    } else {
        return err!("invalid input matrix: '{}'", input)
    };

    if let Some(n) = modulus {
        data.modulus = n;
    }

    data.into_mat()
}

fn load_csv(input: &str, modulus: Option<u64>) -> AppResult<SpMat> {
    let Some(n) = modulus else {
        return err!("`--modulus` is required for csv input.")
    };
    let m = modulus_from(n)?;

    let text = if Path::new(input).is_file() {
        std::fs::read_to_string(input)?
    } else {
        input.to_string()
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut data = vec![];
    let mut shape = (0, None);

    for rec in rdr.records() {
        let rec = rec?;
        let i = shape.0;

        let mut row = vec![];
        for s in rec.iter() {
            let Ok(a) = s.parse::<i64>() else {
                return err!("cannot parse '{s}' at row {i}.")
            };
            row.push(a);
        }

        match shape.1 {
            None => shape.1 = Some(row.len()),
            Some(k) => ensure!(k == row.len(), "row {i} has {} entries, expected {k}.", row.len())
        }

        data.extend(row);
        shape.0 += 1;
    }

    let shape = (shape.0, shape.1.unwrap_or(0));
    Ok(SpMat::from_dense_data(shape, m, data))
}
