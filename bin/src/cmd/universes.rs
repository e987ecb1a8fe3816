//! Universe listing.

use malaga::PRESETS;

/// Print the built-in universes.
pub(crate) fn list_universes(verbose: bool) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Available Universes                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    for preset in PRESETS {
        let symbols = preset.symbols();
        println!(
            "  {:15} - {} ({} instruments, top {})",
            preset.name,
            preset.description,
            symbols.len(),
            preset.top_k
        );
        if verbose {
            for line in symbols.chunks(10) {
                println!("      {}", line.join(" "));
            }
            println!();
        }
    }
    println!();

    if !verbose {
        println!("Use --verbose to list tickers.");
    }
    println!("Any comma-separated ticker list is also accepted, e.g. --universe AAPL,MSFT,NVDA\n");
}
