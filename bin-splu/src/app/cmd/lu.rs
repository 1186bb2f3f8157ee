use log::info;
use splu_matrix::sparse::{perm_to_vec, SpMat};
use splu_matrix::sparse::lu::{lu, SpLu};
use crate::app::utils::*;
use crate::app::err::*;

pub fn dispatch(args: &Args) -> AppResult<String> {
    App::new(args.clone()).run()
}

#[derive(Clone, Default, Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(short, long)]
    pub json: bool,

    #[arg(short, long)]
    pub check: bool,

    #[arg(long, default_value = "0")]
    pub log: u8,
}

pub struct App {
    args: Args,
    buff: String
}

impl App {
    pub fn new(args: Args) -> Self {
        let buff = String::with_capacity(1024);
        App { args, buff }
    }

    pub fn run(&mut self) -> AppResult<String> {
        let a = load_mat(&self.args.input)?;
        let res = lu(&a)?;

        info!("rank: {}", res.rank());

        if self.args.check {
            self.check(&a, &res)?;
        }

        if self.args.json {
            self.out_json(&res)?;
        } else {
            self.out_text(&res);
        }

        Ok(self.flush())
    }

    fn check(&self, a: &SpMat, res: &SpLu) -> AppResult<()> {
        let pa = a.permute(res.p(), res.q());
        let lu = res.l() * res.u();
        ensure!(pa == lu, "check failed: P A Q^t != L U.");

        info!("check: ok.");
        Ok(())
    }

    fn out_text(&mut self, res: &SpLu) {
        self.out(&format!("rank: {}", res.rank()));
        self.out(&format!("P: {}", vec2str(&perm_to_vec(res.p()))));
        self.out(&format!("Q: {}", vec2str(&perm_to_vec(res.q()))));
        self.out(&format!("L: {}", res.l().to_string().trim_end()));
        self.out(&format!("U: {}", res.u().to_string().trim_end()));
    }

    fn out_json(&mut self, res: &SpLu) -> AppResult<()> {
        let json = serde_json::json!({
            "rank": res.rank(),
            "p": perm_to_vec(res.p()),
            "q": perm_to_vec(res.q()),
            "l": MatData::from_mat(res.l()),
            "u": MatData::from_mat(res.u()),
        });
        let str = serde_json::to_string_pretty(&json)?;
        self.out(&str);
        Ok(())
    }

    fn out(&mut self, str: &str) {
        self.buff.push_str(str);
        self.buff.push('\n');
    }

    fn flush(&mut self) -> String {
        let res = std::mem::take(&mut self.buff);
        res.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = r#"{"modulus": 7, "shape": [3, 3], "entries": [[0, 0, 1], [0, 1, 2], [1, 0, 2], [1, 1, 4], [2, 1, 1], [2, 2, 3]]}"#;

    fn args(input: &str) -> Args {
        Args {
            input: InputArgs { input: input.to_string(), ..Default::default() },
            ..Default::default()
        }
    }

    #[test]
    fn text() {
        let res = dispatch(&args(A)).unwrap();
        let lines = res.lines().collect::<Vec<_>>();

        assert_eq!(lines[0], "rank: 2");
        assert_eq!(lines[1], "P: [1, 2, 0]");
        assert_eq!(lines[2], "Q: [1, 2, 0]");
        assert_eq!(lines[3], "L: 3x3 over Z/7");
    }

    #[test]
    fn json() {
        let args = Args { json: true, check: true, ..args(A) };
        let res = dispatch(&args).unwrap();
        let v: serde_json::Value = serde_json::from_str(&res).unwrap();

        assert_eq!(v["rank"], 2);
        assert_eq!(v["p"], serde_json::json!([1, 2, 0]));

        let l: MatData = serde_json::from_value(v["l"].clone()).unwrap();
        let u: MatData = serde_json::from_value(v["u"].clone()).unwrap();
        assert_eq!(l.shape, (3, 3));
        assert_eq!(u.shape, (3, 3));
        assert_eq!(l.into_mat().unwrap().nnz(), 3);
        assert_eq!(u.into_mat().unwrap().nnz(), 4);
    }

    #[test]
    fn csv() {
        let args = Args {
            input: InputArgs {
                input: "1, 0\n0, 1".to_string(),
                modulus: Some(3),
                format: Format::Csv
            },
            check: true,
            ..Default::default()
        };
        let res = dispatch(&args).unwrap();
        assert!(res.starts_with("rank: 2"));
    }

    #[test]
    fn non_unit() {
        let input = r#"{"modulus": 9, "shape": [2, 2], "entries": [[0, 0, 3], [1, 1, 1]]}"#;
        let res = dispatch(&args(input));
        assert!(res.is_err());
    }
}
