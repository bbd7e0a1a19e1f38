use std::process::ExitCode;

fn main() -> ExitCode {
    leadgen_cli::run()
}
