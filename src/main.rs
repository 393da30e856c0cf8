use loadprep::RunOutcome;

/// Exit status when structural anomalies halt the run before script generation.
const EXIT_STRUCTURAL_ANOMALIES: i32 = 2;

fn main() {
    match loadprep::run() {
        Ok(RunOutcome::Completed) => {}
        Ok(RunOutcome::Halted) => std::process::exit(EXIT_STRUCTURAL_ANOMALIES),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
