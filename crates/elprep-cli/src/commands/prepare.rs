use std::path::Path;

use anyhow::{Context, Result};
use elprep_io::{load_network, read_cost_records, read_price_series, save_network};
use elprep_scenarios::{prepare_network, PrepareContext, Wildcards};
use tracing::info;

use super::load_config;

pub struct PrepareArgs<'a> {
    pub network: &'a Path,
    pub out: &'a Path,
    pub costs: &'a Path,
    pub config: Option<&'a Path>,
    pub co2_price: Option<&'a Path>,
    pub opts: &'a str,
    pub ll: &'a str,
}

pub fn handle(args: &PrepareArgs<'_>) -> Result<()> {
    let config = load_config(args.config)?;
    let network = load_network(args.network)?;
    let cost_records = read_cost_records(args.costs)?;
    let co2_price = args.co2_price.map(read_price_series).transpose()?;
    let wildcards = Wildcards::new(args.opts, args.ll);

    info!(
        "Preparing {} with opts '{}' and ll '{}'",
        args.network.display(),
        args.opts,
        args.ll
    );
    let ctx = PrepareContext {
        config: &config,
        wildcards: &wildcards,
        cost_records: &cost_records,
        co2_price: co2_price.as_ref(),
    };
    let prepared = prepare_network(network, &ctx)
        .with_context(|| format!("preparing network '{}'", args.network.display()))?;
    save_network(&prepared, args.out)?;
    println!(
        "Prepared network written to {} ({} snapshots, {} global constraints)",
        args.out.display(),
        prepared.snapshots.len(),
        prepared.global_constraints.len()
    );
    Ok(())
}
