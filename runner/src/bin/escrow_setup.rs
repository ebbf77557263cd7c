use std::process;

use escrow_setup_config::SetupConfig;
use escrow_setup_runner::{defaults, run_setup};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    defaults::init_tracing();

    let config = match SetupConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("invalid configuration: {err}");
            process::exit(1);
        }
    };

    info!(
        rpc = %config.rpc_url,
        commitment = %config.commitment,
        keys_dir = %config.keys_dir.display(),
        parallel_branches = config.parallel_branches,
        "starting escrow setup"
    );

    match run_setup(&config).await {
        Ok(report) => {
            println!("✨Setup complete✨\n");
            println!("{report}");
        }
        Err(err) => {
            error!("escrow setup failed: {err:#}");
            process::exit(1);
        }
    }
}
