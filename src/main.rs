use std::process::ExitCode;

fn main() -> ExitCode {
    free_food_sync_lib::run()
}
