fn main() -> Result<(), Box<dyn std::error::Error>> {
    labchat::cli::main()
}
