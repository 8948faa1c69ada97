//! isobench CLI entry point.

fn main() {
    if let Err(e) = isobench_cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
