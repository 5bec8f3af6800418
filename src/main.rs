fn main() {
    if let Err(err) = todochat::cli::main() {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}
