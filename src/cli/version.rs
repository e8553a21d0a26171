/// Display version information
pub fn execute() {
    println!("permafy {}", env!("CARGO_PKG_VERSION"));
    println!("Archive IPFS content permanently on Arweave");
}
