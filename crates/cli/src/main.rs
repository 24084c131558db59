fn main() {
    if let Err(e) = lsifkit_cli::run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
