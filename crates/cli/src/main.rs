use std::process::ExitCode;

fn main() -> ExitCode {
    automarket_cli::run()
}
