use std::process::ExitCode;

mod app;

fn main() -> ExitCode {
    match app::bootstrap::build_app() {
        Ok(app) => app::loop_runner::run(app),
        Err(err) => {
            tracing::error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
