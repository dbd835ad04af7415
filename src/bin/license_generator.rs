//! License generator - mints a Yoyaku license key for one year.
//!
//! The key is derived from the same secret the application validates
//! against (`YOYAKU_LICENSE_SECRET`, or the compiled-in default).

use clap::Parser;
use std::process;
use yoyaku_lib::config::{DEFAULT_LICENSE_SECRET, LICENSE_SECRET_ENV};
use yoyaku_lib::license::KeyGenerator;

const MIN_YEAR: i32 = 2024;
const MAX_YEAR: i32 = 2030;

#[derive(Parser)]
#[command(name = "license-generator")]
#[command(about = "Generate a Yoyaku license key for a given year", long_about = None)]
struct Args {
    /// License year (2024-2030)
    #[arg(long)]
    year: i32,

    /// Derivation secret (defaults to $YOYAKU_LICENSE_SECRET, then the built-in secret)
    #[arg(long)]
    secret: Option<String>,
}

fn main() {
    let args = Args::parse();

    if !(MIN_YEAR..=MAX_YEAR).contains(&args.year) {
        eprintln!("Error: El año debe estar entre {MIN_YEAR} y {MAX_YEAR}");
        process::exit(1);
    }

    let secret = args
        .secret
        .or_else(|| std::env::var(LICENSE_SECRET_ENV).ok())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LICENSE_SECRET.to_string());
    let generator = KeyGenerator::new(secret);
    let key = generator.generate_key(args.year);

    println!("╔════════════════════════════════════════╗");
    println!("║     GENERADOR DE LICENCIAS YOYAKU      ║");
    println!("╚════════════════════════════════════════╝");
    println!();
    println!("Año:        {}", args.year);
    println!("Licencia:   {key}");
    println!();
    println!("Esta licencia incluye:");
    println!("  ✓ Uso perpetuo del software");
    println!("  ✓ 1 año de actualizaciones");
    println!("  ✓ Soporte técnico durante el período");
    println!();

    // Round-trip the key through the validator before handing it out
    match generator.validate_key(&key) {
        Ok(v) if v.valid && v.year == args.year => {
            println!("✓ Licencia validada correctamente");
        }
        Ok(v) if v.valid => {
            eprintln!("Error: Año de validación no coincide ({} != {})", v.year, args.year);
            process::exit(1);
        }
        Ok(_) => {
            eprintln!("Error: La licencia generada no es válida");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error validando licencia: {e}");
            process::exit(1);
        }
    }
}
