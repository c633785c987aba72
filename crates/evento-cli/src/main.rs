mod cli;

fn main() {
    if let Err(e) = cli::run() {
        // Failure envelopes have already been rendered.
        if e.downcast_ref::<cli::output::ReportedError>().is_none() {
            eprintln!("{e:#}"); // pretty anyhow chain
        }
        std::process::exit(1);
    }
}
