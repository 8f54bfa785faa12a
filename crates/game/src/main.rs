use std::process::ExitCode;

mod app;

fn main() -> ExitCode {
    let wiring = app::bootstrap::build_app();
    app::runner::run(wiring)
}
