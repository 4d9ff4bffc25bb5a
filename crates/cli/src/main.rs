use std::process::ExitCode;

fn main() -> ExitCode {
    ticketroute_cli::run()
}
