fn main() {
    if let Err(e) = moderato::cli::main() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
