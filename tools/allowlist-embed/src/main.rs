//! allowlist-embed: hash a released bootloader image and print the
//! `AllowlistEntry` literal to paste into `src/classify.rs`.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use sha2::{Digest, Sha256};

#[derive(Parser, Debug)]
#[command(
    name = "allowlist-embed",
    about = "Generate bootgate allowlist entries from bootloader images"
)]
struct Args {
    /// Bootloader image, padded to the full flash window
    image: PathBuf,

    /// Release label recorded in the entry (e.g. v1.0.5)
    #[arg(short, long)]
    release: String,

    /// Classification for the entry: verified or repairable
    #[arg(short, long, default_value = "verified")]
    kind: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let kind = match args.kind.as_str() {
        "verified" => "Classification::Verified",
        "repairable" => "Classification::Repairable",
        other => bail!("unknown classification {other:?} (use verified or repairable)"),
    };

    let image = fs::read(&args.image)
        .with_context(|| format!("reading {}", args.image.display()))?;
    if image.is_empty() {
        bail!("image is empty");
    }

    // Same construction the device uses: SHA-256 applied twice.
    let first = Sha256::digest(&image);
    let digest = Sha256::digest(first);

    println!("    AllowlistEntry {{");
    println!("        digest: [");
    for row in digest.chunks(8) {
        let bytes: Vec<String> = row.iter().map(|b| format!("0x{b:02x}")).collect();
        println!("            {},", bytes.join(", "));
    }
    println!("        ],");
    println!("        kind: {kind},");
    println!("        release: {:?},", args.release);
    println!("    }},");
    eprintln!("sha256x2({}) = {}", args.image.display(), hex::encode(digest));

    Ok(())
}
