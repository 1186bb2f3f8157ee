use log::info;
use clap::{Parser, Subcommand};

use super::cmd::{lu, rank, solve};
use super::err::*;
use super::utils::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Cmd,

    /// Run every step on the current thread.
    #[arg(long, global = true)]
    pub single_thread: bool,
}

#[derive(Subcommand, Debug)]
#[clap(rename_all="lower")]
pub enum Cmd {
    Lu(lu::Args),
    Rank(rank::Args),
    Solve(solve::Args),
}

impl CliArgs {
    fn log_level(&self) -> log::LevelFilter {
        use log::LevelFilter::*;
        let level = match &self.command {
            Cmd::Lu(args)    => args.log,
            Cmd::Rank(args)  => args.log,
            Cmd::Solve(args) => args.log,
        };
        match level {
            1 => Info,
            2 => Debug,
            3 => Trace,
            _ => Off,
        }
    }
}

pub struct App {
    pub args: CliArgs
}

impl App {
    pub fn new() -> Self {
        let args = CliArgs::parse();
        App { args }
    }

    pub fn run(&self) -> AppResult<String> {
        self.init_logger()?;

        info!("args: {:?}", self.args);

        if self.args.single_thread {
            splu_matrix::config::set_multithread_enabled(false);
        }
        info!("multithread: {}", splu_matrix::config::is_multithread_enabled());

        let (res, time) = measure(||
            self.dispatch()
        );

        info!("time: {:?}", time);

        res
    }

    fn init_logger(&self) -> AppResult<()> {
        let l = self.args.log_level();
        splu::util::log::init_simple_logger(l)?;
        Ok(())
    }

    fn dispatch(&self) -> AppResult<String> {
        guard_panic(||
            match &self.args.command {
                Cmd::Lu(args)    => lu::dispatch(args),
                Cmd::Rank(args)  => rank::dispatch(args),
                Cmd::Solve(args) => solve::dispatch(args),
            }
        )
    }
}
