use std::process::ExitCode;

fn main() -> ExitCode {
    dramwise_cli::run()
}
