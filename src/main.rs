use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cosmos_tx_sender::chain::{BroadcastMode, CosmosWallet, LcdClient, LocalSigner, TxSender};
use cosmos_tx_sender::config::Config;

#[derive(Parser)]
#[command(name = "cosmos-tx-sender")]
#[command(about = "Build, sign, broadcast and confirm Cosmos transactions", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a default configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "config.toml")]
        output: String,
    },

    /// Print the address derived from the mnemonic
    Address {
        /// Configuration file path
        #[arg(short, long, default_value = "config.toml")]
        config: String,

        #[arg(long, env = "SENDER_MNEMONIC", hide_env_values = true)]
        mnemonic: String,
    },

    /// Sign and broadcast the messages in a JSON file
    Send {
        /// Configuration file path
        #[arg(short, long, default_value = "config.toml")]
        config: String,

        /// JSON file holding one amino message or an array of them
        #[arg(short, long)]
        messages: String,

        /// Override the configured gas limit
        #[arg(long)]
        gas: Option<u64>,

        /// Override the configured memo
        #[arg(long)]
        memo: Option<String>,

        /// Override the broadcast mode (sync, async, block)
        #[arg(long)]
        mode: Option<String>,

        /// Wait for the transaction to be included in a block
        #[arg(short, long)]
        wait: bool,

        #[arg(long, env = "SENDER_MNEMONIC", hide_env_values = true)]
        mnemonic: String,
    },

    /// Wait for a broadcast transaction to be included
    Wait {
        /// Configuration file path
        #[arg(short, long, default_value = "config.toml")]
        config: String,

        /// Transaction hash
        hash: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cosmos_tx_sender=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { output } => {
            let config = Config::default();
            config.save(&output)?;
            info!("Configuration file created at: {}", output);
        }
        Commands::Address { config, mnemonic } => {
            let config = Config::load(&config)?;
            let wallet = CosmosWallet::from_mnemonic(&mnemonic, "", &config.wallet.address_prefix)?;
            println!("{}", wallet.address);
            info!("Public key: {}", hex::encode(wallet.public_key_compressed()));
        }
        Commands::Send {
            config,
            messages,
            gas,
            memo,
            mode,
            wait,
            mnemonic,
        } => {
            let mut config = Config::load(&config)?;
            if let Some(gas) = gas {
                config.tx.gas = gas;
            }
            if let Some(memo) = memo {
                config.tx.memo = memo;
            }
            if let Some(mode) = mode {
                config.tx.broadcast_mode = mode;
            }
            config.validate()?;

            run_send(&config, &messages, &mnemonic, wait).await?;
        }
        Commands::Wait { config, hash } => {
            let config = Config::load(&config)?;
            let client = LcdClient::new(
                config.node.rest_endpoint.clone(),
                std::time::Duration::from_secs(config.node.request_timeout_secs),
            )?;

            let tx = config.poller().wait_for(&hash, &client).await?;
            info!("Transaction {} included at height {}", hash, tx_height(&tx));
        }
    }

    Ok(())
}

async fn run_send(config: &Config, messages_path: &str, mnemonic: &str, wait: bool) -> Result<()> {
    let messages = read_messages(messages_path)?;
    let request = config.transaction_request(messages)?;

    let wallet = CosmosWallet::from_mnemonic(mnemonic, "", &config.wallet.address_prefix)?;
    let signer = LocalSigner::new(wallet);
    let sender_address = signer.address().to_string();

    let sender_config = config.sender_config();
    if let BroadcastMode::Other(mode) = &sender_config.broadcast_mode {
        info!("Using non-standard broadcast mode {:?}", mode);
    }
    let sender = TxSender::from_lcd(sender_config)?;

    info!("Sending {} message(s) from {}", request.messages.len(), sender_address);
    let handle = sender.send(&request, &sender_address, &signer).await?;

    println!("{}", handle.hash);
    info!("Broadcast accepted: hash={} sequence={}", handle.hash, handle.sequence);

    if wait {
        let tx = handle.check_inclusion().await?;
        info!("Transaction included at height {}", tx_height(&tx));
    }

    Ok(())
}

fn read_messages(path: &str) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read messages from {}", path))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path))?;

    let messages = match value {
        Value::Array(messages) => messages,
        Value::Object(_) => vec![value],
        _ => bail!("{} must contain a message object or an array of messages", path),
    };
    if messages.is_empty() {
        bail!("{} contains no messages", path);
    }
    Ok(messages)
}

fn tx_height(tx: &Value) -> String {
    match tx.get("height") {
        Some(Value::String(height)) => height.clone(),
        Some(height) => height.to_string(),
        None => "unknown".to_string(),
    }
}
