use std::process::ExitCode;

fn main() -> ExitCode {
    match shoplist::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "shoplist exited with an error");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
