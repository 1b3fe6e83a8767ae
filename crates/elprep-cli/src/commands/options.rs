use std::path::Path;

use anyhow::Result;
use elprep_scenarios::{PreparePlan, Wildcards};

use super::load_config;

pub fn handle(opts: &str, ll: &str, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let plan = PreparePlan::resolve(&config, &Wildcards::new(opts, ll))?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
