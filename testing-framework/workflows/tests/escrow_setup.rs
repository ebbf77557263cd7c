use std::{collections::HashSet, sync::Arc};

use escrow_setup_config::constants::{ALICE_LABEL, BOB_LABEL, TOKEN_X, TOKEN_Y};
use escrow_setup_core::{
    SetupTimings,
    address_book::AddressBook,
    ledger::{LedgerClient, LedgerEvent, MemoryLedger, Operation},
    scenario::{Participants, Party, RunContext, Runner, ScenarioError},
};
use escrow_setup_workflows::{BalanceReport, escrow_setup};
use solana_sdk::{
    native_token::LAMPORTS_PER_SOL,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer as _,
};
use tempfile::TempDir;

struct Harness {
    dir: TempDir,
    ledger: Arc<MemoryLedger>,
    alice: Pubkey,
    bob: Pubkey,
    operator: Pubkey,
}

impl Harness {
    fn new() -> (Self, RunContext) {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(MemoryLedger::new());
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        let operator = Keypair::new();
        let operator_pubkey = operator.pubkey();

        let participants = Participants::new(
            vec![Party::new(ALICE_LABEL, alice), Party::new(BOB_LABEL, bob)],
            operator,
        );
        let book = AddressBook::open(dir.path().join("addresses.json"))
            .unwrap()
            .with_slot_files(dir.path());
        let shared: Arc<dyn LedgerClient> = ledger.clone();
        let context = RunContext::new(
            shared,
            participants,
            book,
            SetupTimings::immediate(),
        );

        (
            Self {
                dir,
                ledger,
                alice,
                bob,
                operator: operator_pubkey,
            },
            context,
        )
    }

    fn events(&self) -> Vec<LedgerEvent> {
        self.ledger.events()
    }

    fn submitted_at(&self, wanted: impl Fn(&Operation) -> bool) -> Vec<(usize, Signature, Operation)> {
        self.events()
            .into_iter()
            .enumerate()
            .filter_map(|(idx, event)| match event {
                LedgerEvent::Submitted {
                    signature,
                    operation,
                } if wanted(&operation) => Some((idx, signature, operation)),
                _ => None,
            })
            .collect()
    }

    fn confirmed_at(&self, signature: &Signature) -> usize {
        self.events()
            .iter()
            .position(|event| matches!(event, LedgerEvent::Confirmed { signature: s } if s == signature))
            .unwrap_or_else(|| panic!("{signature} never confirmed"))
    }

    /// Every account creation comes after its mint is confirmed, and every
    /// issuance after its destination account is confirmed.
    fn assert_confirmed_before_use(&self) {
        let mints = self.submitted_at(|op| matches!(op, Operation::CreateMint { .. }));
        let accounts = self.submitted_at(|op| matches!(op, Operation::CreateAccount { .. }));
        let issues = self.submitted_at(|op| matches!(op, Operation::MintTo { .. }));

        for (idx, _, op) in &accounts {
            let Operation::CreateAccount { mint, .. } = op else {
                unreachable!()
            };
            let (_, mint_sig, _) = mints
                .iter()
                .find(|(_, _, m)| matches!(m, Operation::CreateMint { mint: created, .. } if created == mint))
                .expect("account for an unknown mint");
            assert!(self.confirmed_at(mint_sig) < *idx);
        }

        for (idx, _, op) in &issues {
            let Operation::MintTo { destination, .. } = op else {
                unreachable!()
            };
            let (_, account_sig, _) = accounts
                .iter()
                .find(|(_, _, a)| {
                    matches!(a, Operation::CreateAccount { address, .. } if address == destination)
                })
                .expect("issuance into an unknown account");
            assert!(self.confirmed_at(account_sig) < *idx);
        }
    }
}

#[tokio::test]
async fn bootstraps_two_token_types_with_asymmetric_balances() {
    let (harness, context) = Harness::new();
    let mut scenario = escrow_setup(false).build().unwrap();

    let context = Runner::new(context).run(&mut scenario).await.unwrap();
    let report = BalanceReport::from_context(&context);

    assert_eq!(report.amount(ALICE_LABEL, TOKEN_X), Some(50));
    assert_eq!(report.amount(ALICE_LABEL, TOKEN_Y), Some(0));
    assert_eq!(report.amount(BOB_LABEL, TOKEN_X), Some(0));
    assert_eq!(report.amount(BOB_LABEL, TOKEN_Y), Some(50));
    assert_eq!(report.rows().len(), 4);

    let mints = harness.ledger.mints();
    assert_eq!(mints.len(), 2);
    assert_ne!(mints[0].address, mints[1].address);
    for mint in &mints {
        assert_eq!(mint.decimals, 0);
        assert_eq!(mint.freeze_authority, None);
        assert_eq!(mint.mint_authority, harness.operator);
        assert_eq!(mint.supply, 50);
    }

    let accounts = harness.ledger.token_accounts();
    let distinct: HashSet<_> = accounts.iter().map(|account| account.address).collect();
    assert_eq!(accounts.len(), 4);
    assert_eq!(distinct.len(), 4);
    assert!(accounts.iter().all(|account| account.owner == harness.alice || account.owner == harness.bob));

    assert_eq!(harness.ledger.lamports(&harness.alice), 2 * LAMPORTS_PER_SOL);
    assert_eq!(harness.ledger.lamports(&harness.bob), 2 * LAMPORTS_PER_SOL);

    harness.assert_confirmed_before_use();
}

#[tokio::test]
async fn funds_alice_then_bob_then_operator_before_any_mint() {
    let (harness, context) = Harness::new();
    let mut scenario = escrow_setup(false).build().unwrap();
    Runner::new(context).run(&mut scenario).await.unwrap();

    let airdrops = harness.submitted_at(|op| matches!(op, Operation::Airdrop { .. }));
    let recipients: Vec<Pubkey> = airdrops
        .iter()
        .map(|(_, _, op)| match op {
            Operation::Airdrop { recipient, .. } => *recipient,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(recipients, vec![harness.alice, harness.bob, harness.operator]);

    for pair in airdrops.windows(2) {
        assert!(harness.confirmed_at(&pair[0].1) < pair[1].0);
    }

    let (_, operator_sig, _) = airdrops[2];
    let first_mint = harness.submitted_at(|op| matches!(op, Operation::CreateMint { .. }))[0].0;
    assert!(harness.confirmed_at(&operator_sig) < first_mint);
}

#[tokio::test]
async fn token_type_x_is_finished_before_y_starts() {
    let (harness, context) = Harness::new();
    let mut scenario = escrow_setup(false).build().unwrap();
    let context = Runner::new(context).run(&mut scenario).await.unwrap();

    let x = context.token_type(TOKEN_X).unwrap();
    let y = context.token_type(TOKEN_Y).unwrap();

    let mint_x = harness.submitted_at(|op| matches!(op, Operation::CreateMint { .. }))[0].2;
    assert!(matches!(mint_x, Operation::CreateMint { mint, .. } if mint == x.mint));

    let last_x = harness
        .submitted_at(|op| matches!(op, Operation::MintTo { mint, .. } if *mint == x.mint))[0]
        .0;
    let first_y = harness
        .submitted_at(|op| matches!(op, Operation::CreateMint { mint, .. } if *mint == y.mint))[0]
        .0;
    assert!(last_x < first_y);
}

#[tokio::test]
async fn records_every_address_slot() {
    let (harness, context) = Harness::new();
    let mut scenario = escrow_setup(false).build().unwrap();
    let context = Runner::new(context).run(&mut scenario).await.unwrap();

    let x = context.token_type(TOKEN_X).unwrap();
    let y = context.token_type(TOKEN_Y).unwrap();
    let expected = [
        ("mint_x", x.mint),
        ("alice_x", x.holding(ALICE_LABEL).unwrap()),
        ("bob_x", x.holding(BOB_LABEL).unwrap()),
        ("mint_y", y.mint),
        ("alice_y", y.holding(ALICE_LABEL).unwrap()),
        ("bob_y", y.holding(BOB_LABEL).unwrap()),
    ];

    let reopened = AddressBook::open(harness.dir.path().join("addresses.json")).unwrap();
    assert_eq!(reopened.len(), expected.len());
    for (slot, address) in expected {
        assert_eq!(context.address(slot), Some(address), "slot {slot}");
        assert_eq!(reopened.get(slot), Some(address), "slot {slot}");

        let raw = std::fs::read_to_string(harness.dir.path().join(format!("{slot}_pub.json")))
            .unwrap();
        assert_eq!(raw, format!("\"{address}\""));
    }
}

#[tokio::test]
async fn exhausted_faucet_stops_before_any_token_work() {
    let (harness, context) = Harness::new();
    harness.ledger.rate_limit_faucet(harness.alice, usize::MAX);
    let mut scenario = escrow_setup(false).build().unwrap();

    let err = Runner::new(context)
        .run(&mut scenario)
        .await
        .err()
        .unwrap();

    assert!(matches!(err, ScenarioError::Workload { ref name, .. } if name == "fund_identities"));
    assert!(harness.ledger.mints().is_empty());
    assert!(harness.ledger.token_accounts().is_empty());
    assert!(
        harness
            .submitted_at(|op| !matches!(op, Operation::Airdrop { .. }))
            .is_empty()
    );
    assert!(
        !harness
            .dir
            .path()
            .join("addresses.json")
            .exists()
    );
}

#[tokio::test]
async fn transient_faucet_limits_are_absorbed() {
    let (harness, context) = Harness::new();
    harness.ledger.rate_limit_faucet(harness.bob, 3);
    let mut scenario = escrow_setup(false).build().unwrap();

    let context = Runner::new(context).run(&mut scenario).await.unwrap();

    assert_eq!(context.funded().len(), 3);
    assert_eq!(harness.ledger.lamports(&harness.bob), 2 * LAMPORTS_PER_SOL);
    assert_eq!(
        BalanceReport::from_context(&context).amount(BOB_LABEL, TOKEN_Y),
        Some(50)
    );
}

#[tokio::test]
async fn parallel_branches_keep_per_branch_ordering() {
    let (harness, context) = Harness::new();
    let mut scenario = escrow_setup(true).build().unwrap();
    assert!(scenario.parallel_branches());

    let context = Runner::new(context).run(&mut scenario).await.unwrap();
    let report = BalanceReport::from_context(&context);

    assert_eq!(report.amount(ALICE_LABEL, TOKEN_X), Some(50));
    assert_eq!(report.amount(BOB_LABEL, TOKEN_Y), Some(50));
    assert_eq!(report.amount(ALICE_LABEL, TOKEN_Y), Some(0));
    assert_eq!(report.amount(BOB_LABEL, TOKEN_X), Some(0));
    assert_eq!(harness.ledger.token_accounts().len(), 4);

    let operator_airdrop = harness
        .submitted_at(|op| matches!(op, Operation::Airdrop { recipient, .. } if *recipient == harness.operator))[0]
        .1;
    let first_mint = harness.submitted_at(|op| matches!(op, Operation::CreateMint { .. }))[0].0;
    assert!(harness.confirmed_at(&operator_airdrop) < first_mint);

    harness.assert_confirmed_before_use();
}
