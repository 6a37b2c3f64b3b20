use std::process::ExitCode;

fn main() -> ExitCode {
    onboarder::cli::run()
}
