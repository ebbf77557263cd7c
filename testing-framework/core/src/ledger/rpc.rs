use std::time::Duration;

use async_trait::async_trait;
use escrow_setup_config::{Commitment, SetupConfig};
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer as _,
    system_instruction,
    transaction::Transaction,
};
use spl_token::{solana_program::program_pack::Pack as _, state::Mint};
use tokio::time::{sleep, timeout};
use tracing::debug;

use super::{LedgerClient, LedgerError, Submitted, associated_token_address};

const HTTP_TOO_MANY_REQUESTS: u16 = 429;
const RATE_LIMIT_MARKERS: [&str; 4] = [
    "429",
    "too many requests",
    "rate limit",
    "airdrop request limit",
];

/// [`LedgerClient`] backed by a Solana JSON-RPC endpoint.
pub struct RpcLedger {
    client: RpcClient,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl RpcLedger {
    #[must_use]
    pub fn new(
        rpc_url: impl Into<String>,
        commitment: Commitment,
        confirm_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client: RpcClient::new_with_commitment(
                rpc_url.into(),
                commitment_config(commitment),
            ),
            confirm_timeout,
            poll_interval,
        }
    }

    #[must_use]
    pub fn from_config(config: &SetupConfig) -> Self {
        Self::new(
            config.rpc_url.clone(),
            config.commitment,
            config.timings.confirm_timeout,
            config.timings.confirm_poll_interval,
        )
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.client.url()
    }

    async fn submit(
        &self,
        operation: &'static str,
        instructions: &[Instruction],
        payer: &Keypair,
        co_signers: &[&Keypair],
    ) -> Result<Signature, LedgerError> {
        let blockhash = self
            .client
            .get_latest_blockhash()
            .await
            .map_err(|err| classify(operation, err))?;

        let mut signers = Vec::with_capacity(co_signers.len() + 1);
        signers.push(payer);
        signers.extend_from_slice(co_signers);

        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&payer.pubkey()),
            signers.as_slice(),
            blockhash,
        );

        let signature = self
            .client
            .send_transaction(&tx)
            .await
            .map_err(|err| classify(operation, err))?;
        debug!(operation, %signature, "transaction submitted");

        Ok(signature)
    }
}

#[async_trait]
impl LedgerClient for RpcLedger {
    async fn request_airdrop(
        &self,
        recipient: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, LedgerError> {
        self.client
            .request_airdrop(recipient, lamports)
            .await
            .map_err(|err| classify("request_airdrop", err))
    }

    async fn confirm(&self, signature: &Signature) -> Result<(), LedgerError> {
        let commitment = self.client.commitment();
        let poll = async {
            loop {
                let status = self
                    .client
                    .get_signature_status_with_commitment(signature, commitment)
                    .await
                    .map_err(|err| classify("confirm", err))?;

                match status {
                    Some(Ok(())) => return Ok(()),
                    Some(Err(err)) => {
                        return Err(LedgerError::TransactionFailed {
                            signature: *signature,
                            message: err.to_string(),
                        });
                    }
                    None => debug!(%signature, "transaction not yet confirmed"),
                }

                sleep(self.poll_interval).await;
            }
        };

        timeout(self.confirm_timeout, poll)
            .await
            .map_err(|_| LedgerError::ConfirmationTimeout {
                signature: *signature,
                timeout: self.confirm_timeout,
            })?
    }

    async fn create_mint(
        &self,
        payer: &Keypair,
        mint_authority: &Pubkey,
        decimals: u8,
    ) -> Result<Submitted<Pubkey>, LedgerError> {
        const OPERATION: &str = "create_mint";

        let mint = Keypair::new();
        let rent = self
            .client
            .get_minimum_balance_for_rent_exemption(Mint::LEN)
            .await
            .map_err(|err| classify(OPERATION, err))?;

        let instructions = [
            system_instruction::create_account(
                &payer.pubkey(),
                &mint.pubkey(),
                rent,
                Mint::LEN as u64,
                &spl_token::id(),
            ),
            spl_token::instruction::initialize_mint2(
                &spl_token::id(),
                &mint.pubkey(),
                mint_authority,
                None,
                decimals,
            )
            .map_err(|err| LedgerError::rejected(OPERATION, err.to_string()))?,
        ];

        let signature = self.submit(OPERATION, &instructions, payer, &[&mint]).await?;
        Ok(Submitted::new(mint.pubkey(), signature))
    }

    async fn create_associated_token_account(
        &self,
        payer: &Keypair,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Submitted<Pubkey>, LedgerError> {
        let instruction =
            spl_associated_token_account_client::instruction::create_associated_token_account(
                &payer.pubkey(),
                owner,
                mint,
                &spl_token::id(),
            );

        let signature = self
            .submit("create_associated_token_account", &[instruction], payer, &[])
            .await?;
        Ok(Submitted::new(
            associated_token_address(owner, mint),
            signature,
        ))
    }

    async fn mint_to(
        &self,
        authority: &Keypair,
        mint: &Pubkey,
        destination: &Pubkey,
        amount: u64,
    ) -> Result<Signature, LedgerError> {
        const OPERATION: &str = "mint_to";

        let instruction = spl_token::instruction::mint_to(
            &spl_token::id(),
            mint,
            destination,
            &authority.pubkey(),
            &[],
            amount,
        )
        .map_err(|err| LedgerError::rejected(OPERATION, err.to_string()))?;

        self.submit(OPERATION, &[instruction], authority, &[]).await
    }

    async fn token_balance(&self, account: &Pubkey) -> Result<u64, LedgerError> {
        const OPERATION: &str = "token_balance";

        let balance = self
            .client
            .get_token_account_balance(account)
            .await
            .map_err(|err| classify(OPERATION, err))?;

        balance.amount.parse::<u64>().map_err(|err| {
            LedgerError::rejected(
                OPERATION,
                format!("unreadable amount '{}': {err}", balance.amount),
            )
        })
    }
}

fn commitment_config(commitment: Commitment) -> CommitmentConfig {
    match commitment {
        Commitment::Processed => CommitmentConfig::processed(),
        Commitment::Confirmed => CommitmentConfig::confirmed(),
        Commitment::Finalized => CommitmentConfig::finalized(),
    }
}

fn classify(operation: &'static str, err: ClientError) -> LedgerError {
    let (status, transport) = match err.kind() {
        ClientErrorKind::Reqwest(source) => (source.status().map(|s| s.as_u16()), true),
        ClientErrorKind::Io(_) => (None, true),
        _ => (None, false),
    };
    let message = err.to_string();

    if status == Some(HTTP_TOO_MANY_REQUESTS) || mentions_rate_limit(&message) {
        return LedgerError::RateLimited { operation, message };
    }

    if transport {
        LedgerError::Network {
            operation,
            source: Box::new(err),
        }
    } else {
        LedgerError::Rejected { operation, message }
    }
}

fn mentions_rate_limit(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    RATE_LIMIT_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}
