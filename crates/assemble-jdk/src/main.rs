use assemble_jdk::execute;
use assemble_jdk::runner::build_status;

use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    let start = Instant::now();
    let res = execute();
    println!();
    println!("{}", build_status(res.is_ok(), start.elapsed()));
    match res {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
