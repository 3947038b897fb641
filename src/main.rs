fn main() -> Result<(), eframe::Error> {
    // Set up logging; RUST_LOG=debug shows merges and detaches
    env_logger::init();

    venn_layout::run_app()
}
