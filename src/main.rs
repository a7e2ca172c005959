use std::process::ExitCode;

fn main() -> ExitCode {
    ecore_graph::cli::run()
}
