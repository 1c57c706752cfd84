//! Exchange wallet monitoring via blockchain.info
//!
//! Polls a small set of known exchange cold/hot wallets and classifies
//! their most recent transactions as inflows (deposits to the
//! exchange, sell pressure) or outflows (withdrawals, accumulation).

use std::time::Duration;

use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use super::{FlowDirection, WalletMovement};

const DEFAULT_BASE_URL: &str = "https://blockchain.info";
const SATS_PER_BTC: f64 = 100_000_000.0;
const TXS_PER_ADDRESS: usize = 5;

/// Well-known exchange wallets polled by default
pub const DEFAULT_EXCHANGE_WALLETS: &[&str] = &[
    // Binance cold wallet
    "34xp4vRoCGJym3xR7yCVPFHoCNxv4Twseo",
    // Bitfinex cold wallet
    "3D2oetdNuZUqQHPJmcMDDHYoqkyNVsFk9r",
];

#[derive(Debug, Deserialize)]
struct AddressResponse {
    #[serde(default)]
    txs: Vec<Tx>,
}

#[derive(Debug, Deserialize)]
struct Tx {
    time: i64,
    #[serde(default)]
    inputs: Vec<TxInput>,
    #[serde(default)]
    out: Vec<TxOutput>,
}

#[derive(Debug, Deserialize)]
struct TxInput {
    prev_out: Option<TxOutput>,
}

#[derive(Debug, Deserialize)]
struct TxOutput {
    addr: Option<String>,
    #[serde(default)]
    value: u64,
}

pub struct BlockchainInfoClient {
    client: Client,
    base_url: String,
    wallets: Vec<String>,
}

impl BlockchainInfoClient {
    pub fn new(wallets: Vec<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            wallets,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Recent movements across all tracked wallets. A wallet that
    /// fails to load is skipped, not fatal.
    pub async fn recent_movements(&self) -> anyhow::Result<Vec<WalletMovement>> {
        let mut movements = Vec::new();
        for wallet in &self.wallets {
            match self.address_movements(wallet).await {
                Ok(mut found) => movements.append(&mut found),
                Err(e) => warn!("wallet {wallet} fetch failed: {e}"),
            }
        }
        Ok(movements)
    }

    async fn address_movements(&self, address: &str) -> anyhow::Result<Vec<WalletMovement>> {
        let url = format!("{}/address/{address}?format=json", self.base_url);
        let body: AddressResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut movements = Vec::new();
        for tx in body.txs.iter().take(TXS_PER_ADDRESS) {
            let Some(time) = Utc.timestamp_opt(tx.time, 0).single() else {
                continue;
            };
            let spent_sats: u64 = tx
                .inputs
                .iter()
                .filter_map(|inp| inp.prev_out.as_ref())
                .filter(|out| out.addr.as_deref() == Some(address))
                .map(|out| out.value)
                .sum();
            let received_sats: u64 = tx
                .out
                .iter()
                .filter(|out| out.addr.as_deref() == Some(address))
                .map(|out| out.value)
                .sum();

            // Spends without change back are outflows from the
            // exchange; pure receives are deposits onto it
            if spent_sats > 0 && received_sats == 0 {
                movements.push(WalletMovement {
                    direction: FlowDirection::Outflow,
                    amount_btc: spent_sats as f64 / SATS_PER_BTC,
                    time,
                });
            } else if received_sats > 0 && spent_sats == 0 {
                movements.push(WalletMovement {
                    direction: FlowDirection::Inflow,
                    amount_btc: received_sats as f64 / SATS_PER_BTC,
                    time,
                });
            }
        }
        Ok(movements)
    }
}
