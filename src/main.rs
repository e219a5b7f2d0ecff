// Main entry point of the tile-forge binary
fn main() {
    // Exit with a non-zero code when the run fails
    std::process::exit(match tile_forge::run() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    });
}
