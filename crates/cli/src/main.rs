use std::process::ExitCode;

fn main() -> ExitCode {
    logex_cli::run()
}
