use std::process::ExitCode;

fn main() -> ExitCode {
    voicecart_cli::run()
}
