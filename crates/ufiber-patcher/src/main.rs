use std::{
    fs,
    io::{Write, stdout},
    path::{Path, PathBuf},
};

use clap::Parser;
use clap_num::maybe_hex;
use colored::Colorize;
use ufiber_nvram::{
    GponSerial, Nvram, Region,
    nvram::hl::{NVRAM_LENGTH, NVRAM_OFFSET},
};

use crate::err::Error;

mod err;
mod logging;

type Result<T> = core::result::Result<T, Error>;

#[derive(Parser)]
#[command(version, about = "Apply configuration changes to UFiber mtdblock3 dumps")]
struct Cli {
    /// mtdblock3 dump
    #[arg(short, long)]
    input: PathBuf,

    /// Patched image, `patched-<input>` next to the input if not set
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// NVRAM offset in the dump
    #[arg(long, default_value_t = NVRAM_OFFSET, value_parser=maybe_hex::<usize>)]
    offset: usize,

    /// NVRAM length covered by the checksum
    #[arg(long, default_value_t = NVRAM_LENGTH, value_parser=maybe_hex::<usize>)]
    length: usize,

    /// The SLID (or PLOAM password)
    #[arg(long)]
    slid: Option<String>,

    /// 4 character vendor id (e.g. HWTC, ALCL), requires --serial
    #[arg(long)]
    vendor: Option<String>,

    /// 8 character serial number, or 16 hex digits (e.g. 41-4C-43-4C-xx-xx-xx-xx)
    /// where the first 4 bytes replace --vendor
    #[arg(long)]
    serial: Option<String>,

    /// MAC address to clone (e.g. 04:18:D6:A1:B2:C3)
    #[arg(long)]
    mac: Option<String>,

    /// Don't write the patched image
    #[arg(long)]
    dry_run: bool,
}

fn default_output(input: &Path) -> Result<PathBuf> {
    let name = input
        .file_name()
        .ok_or_else(|| Error::OutputName(input.display().to_string()))?;
    Ok(input.with_file_name(format!("patched-{}", name.to_string_lossy())))
}

fn patch(cli: &Cli, nvram: &mut Nvram) -> Result<()> {
    if let Some(serial) = GponSerial::parse(cli.vendor.as_deref(), cli.serial.as_deref())? {
        log!("Setting GPON serial number... ");
        status!(serial.apply(nvram))?;
    }

    if let Some(mac) = cli.mac.as_deref().filter(|m| !m.trim().is_empty()) {
        log!("Setting MAC address... ");
        status!(nvram.set_base_mac_address_hex(&mac.trim().replace([':', '-'], "")))?;
    }

    if let Some(slid) = cli.slid.as_deref().filter(|s| !s.trim().is_empty()) {
        log!("Setting SLID... ");
        status!(nvram.set_gpon_password(slid))?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    log!("Reading {}... ", cli.input.display());
    let data = status!(fs::read(&cli.input))?;

    log!("Parsing NVRAM at {:#x}... ", cli.offset);
    let mut nvram = status!(Nvram::parse_at(&data, Region::new(cli.offset, cli.length)))?;
    println!("{}", "### Original image ###".bold());
    println!("{nvram}");
    println!();

    patch(&cli, &mut nvram)?;
    let patched = nvram.finalize().to_vec();
    println!("{}", "### Patched image ###".bold());
    println!("{nvram}");

    if cli.dry_run {
        println!("{}", "### Dry-run completed, nothing is written".yellow());
        return Ok(());
    }

    let output = match &cli.output {
        Some(output) => output.clone(),
        None => default_output(&cli.input)?,
    };
    log!("Writing {}... ", output.display());
    status!(fs::write(&output, patched))?;

    Ok(())
}
