//! dr.cfg layout dump utility
//! Shows the record regions of a dr.cfg file and the raw bytes behind every decoded field

use anyhow::Context;
use clap::Parser;
use drcfg_rs::bitwise::{decode_text, read_u32_le, read_u8};
use drcfg_rs::core::layout::{FieldKind, FieldSpec, RecordLayout, RegionKind};
use drcfg_rs::formats::cfg::region_bytes;
use drcfg_rs::{Config, MemoryMap};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cfg-dump", version, about = "Dump the record regions of a dr.cfg file")]
struct Args {
    file: PathBuf,

    /// Print the region table and hexdumps but not individual records
    #[arg(long)]
    layout_only: bool,

    /// TOML configuration file with a [layout] override
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;
    drcfg_rs::init_tracing(&config.log_filter);

    let data = fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let mmap = MemoryMap::new(&data);
    let layout = config.layout;

    println!("File: {} ({})", args.file.display(), mmap);
    println!("Header: 0x0000..{:#06x}\n", layout.header_len());

    println!("{:<7} {:<16} {:>6} {:>6}", "Region", "Bytes", "Size", "Count");
    for kind in [RegionKind::Lap, RegionKind::Finish] {
        let region = layout.region(kind);
        let record = RecordLayout::for_kind(kind);
        let count = match region.len() {
            Some(len) if len % record.size == 0 => (len / record.size).to_string(),
            Some(len) => format!("{}+", len / record.size),
            None => "-".to_string(),
        };
        println!(
            "{:<7} {:<16} {:>6} {:>6}",
            kind.to_string(),
            region.to_string(),
            record.size,
            count
        );
    }

    for kind in [RegionKind::Lap, RegionKind::Finish] {
        let region = layout.region(kind);
        let record = RecordLayout::for_kind(kind);

        println!("\n=== {} region {} ===\n", kind, region);
        let bytes = match region_bytes(&mmap, region, record) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Skipping {} region: {}", kind, e);
                continue;
            }
        };
        print!("{}", mmap.printable(region.start, region.end)?);

        if args.layout_only {
            continue;
        }

        println!();
        for (rec_no, chunk) in bytes.chunks_exact(record.size).enumerate() {
            let base = region.start + rec_no * record.size;
            println!("{} record #{} @ {:#06x}", kind, rec_no, base);
            for field in record.fields {
                print_field(field, chunk, base);
            }
        }
    }

    Ok(())
}

fn print_field(field: &FieldSpec, record: &[u8], base: usize) {
    let Some(bytes) = field.bytes(record) else {
        println!("  {:<12} <outside record>", field.name);
        return;
    };

    let hex: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();
    let value = match field.kind {
        FieldKind::Text => format!("\"{}\"", decode_text(bytes)),
        FieldKind::U8 => read_u8(bytes, 0).map_or_else(|e| e.to_string(), |v| v.to_string()),
        FieldKind::U32Le => {
            read_u32_le(bytes, 0).map_or_else(|e| e.to_string(), |v| v.to_string())
        }
    };

    println!(
        "  {:<12} {:#06x}  {:<30} {}",
        field.name,
        base + field.offset,
        hex.join(" "),
        value
    );
}
