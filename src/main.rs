fn main() {
    if let Err(err) = chatterm::cli::main() {
        eprintln!("❌ Error: {err}");
        std::process::exit(1);
    }
}
