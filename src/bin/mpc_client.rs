//! Runs one party's side of a secure multi-party computation against an
//! `mpc_broker` instance, then prints the reconstructed result.

use std::collections::HashMap;
use std::fs;

use clap::Parser;
use mpc_api::{ExprId, HttpTransport, PartyConfig, ProtocolSpec, SmcParty, ValueDict};

#[derive(Parser, Debug)]
#[command(about = "Runs one party's side of a secure multi-party computation")]
struct Args {
    /// Path to a PartyConfig JSON file: client id, broker host/port, modulus.
    #[arg(long)]
    config: String,

    /// Path to a ProtocolSpec JSON file: the expression tree and the
    /// sorted participant list. Must be byte-identical across parties.
    #[arg(long)]
    protocol: String,

    /// Path to a JSON object mapping this party's own secret ids
    /// (rendered, e.g. `"ab12cd==": 3000`) to their plain integer values.
    #[arg(long)]
    inputs: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config: PartyConfig = serde_json::from_str(&fs::read_to_string(&args.config)?)?;
    let spec: ProtocolSpec = serde_json::from_str(&fs::read_to_string(&args.protocol)?)?;
    let raw_inputs: HashMap<String, i64> = serde_json::from_str(&fs::read_to_string(&args.inputs)?)?;

    let own_values: ValueDict = raw_inputs
        .into_iter()
        .map(|(label, value)| {
            let id = ExprId::from_label(&label)
                .ok_or_else(|| anyhow::anyhow!("malformed secret id '{label}' in inputs file"))?;
            Ok((id, value))
        })
        .collect::<anyhow::Result<ValueDict>>()?;

    let transport = HttpTransport::new(config.client_id.clone(), &config.broker_host, config.broker_port);
    let party = SmcParty::new(config.client_id.clone(), transport).with_modulus(config.modulus);

    let result = party.run(&spec, &own_values).await?;
    println!("{result}");
    Ok(())
}
