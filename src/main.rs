use std::process::ExitCode;

fn main() -> ExitCode {
    event_board_lib::run()
}
