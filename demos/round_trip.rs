//! Round trip of a tiled constraint system through the matrix form.
//!
//! Builds `tile = s0 # T`, constrains `tile <= d0 < tile + T` and `d1 = d0 + shift`,
//! then assembles the SDBM and extracts the constraints back.
//!
//! Run with:
//! ```bash
//! cargo run --example round_trip -- --tile 8 --shift 3
//! ```

use clap::Parser;
use log::info;
use sdbm_rs::dbm::Sdbm;
use sdbm_rs::manager::{SdbmConfig, SdbmManager};

#[derive(Debug, Parser)]
#[command(author, version, about = "SDBM round trip")]
struct Cli {
    /// Tile size
    #[arg(long, default_value = "8")]
    tile: i64,

    /// Offset between d1 and d0
    #[arg(long, default_value = "3")]
    shift: i64,

    /// Print the assembled matrix
    #[arg(long)]
    dump: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log: simplelog::LevelFilter,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    simplelog::TermLogger::init(
        cli.log,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    if cli.tile <= 0 {
        return Err(color_eyre::eyre::eyre!("tile size must be positive, got {}", cli.tile));
    }

    let mgr = SdbmManager::with_config(SdbmConfig::default().with_table_bits(8));
    let d0 = mgr.dim(0);
    let d1 = mgr.dim(1);
    let tile = mgr.stripe(mgr.symbol(0), cli.tile);

    let inequalities = vec![
        mgr.subtract(tile, d0),
        mgr.eval(mgr.eval(d0 - tile) - (cli.tile - 1)),
    ];
    let equalities = vec![mgr.eval(mgr.eval(d1 - d0) - cli.shift)];

    println!("input:");
    for &e in &inequalities {
        println!("  {} <= 0", mgr.display(e));
    }
    for &e in &equalities {
        println!("  {} = 0", mgr.display(e));
    }

    let sdbm = Sdbm::build(&mgr, &inequalities, &equalities);
    if cli.dump {
        println!("{}", sdbm.dump(&mgr));
    }

    let (inequalities, equalities) = sdbm.get_expressions(&mgr);
    println!("extracted:");
    for &e in &inequalities {
        println!("  {} <= 0", mgr.display(e));
    }
    for &e in &equalities {
        println!("  {} = 0", mgr.display(e));
    }

    for &e in inequalities.iter().chain(&equalities) {
        info!("{} as affine: {}", mgr.display(e), mgr.to_affine(e));
    }

    println!("mgr = {:?}", mgr);
    Ok(())
}
