use std::process::ExitCode;

use clap::Parser;
use log::error;

mod clean;
mod duration;
mod error;
mod helm;
mod release;
mod render;
mod selection;

fn main() -> ExitCode {
    let args = clean::CommandArgs::parse();
    configure_logger(args.verbosity);

    match clean::handle(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn configure_logger(verbosity: u8) {
    let mut clog = colog::default_builder();
    let log_level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    clog.filter(None, log_level);
    clog.init();
}
