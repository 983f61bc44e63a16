//! Faucet contract scenarios, driven through the shared fixture cache.
//!
//! All tests share one chain and one cache behind a mutex, so they run
//! strictly sequentially against the same instance. Each test begins by
//! loading the fixture, which restores the chain to the post-deployment
//! state no matter what earlier tests did to it.

use std::sync::{Mutex, MutexGuard, OnceLock};

use testchain_core::*;

/// Result bundle of the shared setup, mirroring what each scenario needs:
/// the deployed faucet, its owner, and a funded non-owner account.
struct FaucetFixture {
    faucet: Faucet,
    owner: Signer,
    alice: Signer,
}

struct Harness {
    chain: Chain,
    fixtures: FixtureCache,
}

fn harness() -> MutexGuard<'static, Harness> {
    static HARNESS: OnceLock<Mutex<Harness>> = OnceLock::new();
    HARNESS
        .get_or_init(|| {
            Mutex::new(Harness {
                chain: Chain::new().unwrap(),
                fixtures: FixtureCache::new(),
            })
        })
        .lock()
        // A failed test must not poison the suite; the fixture load at the
        // top of each test re-establishes a clean chain anyway.
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Deploys the faucet and funds it with 1 ether from alice.
fn deploy_and_fund(chain: &Chain) -> Result<FaucetFixture> {
    let owner = chain.signers()[0].clone();
    let alice = chain.signers()[1].clone();
    let bob = chain.signers()[2].clone();

    let faucet = Faucet::deploy(chain, &owner)?;
    chain.send_transaction(&TransferRequest::new(
        alice.address().clone(),
        faucet.address().clone(),
        parse_ether("1")?,
    ))?;

    // Diagnostic trace only; nothing asserts on these lines.
    println!("Owner address: {}", owner.address());
    println!("Alice address: {}", alice.address());
    println!("Bob address:   {}", bob.address());

    Ok(FaucetFixture {
        faucet,
        owner,
        alice,
    })
}

#[test]
fn test_deploy_sets_the_owner() {
    let h = harness();
    let f = h.fixtures.load(&h.chain, deploy_and_fund).unwrap();

    assert_eq!(f.faucet.owner(&h.chain).unwrap(), *f.owner.address());
    println!("OK: owner matches deployer");
}

#[test]
fn test_rejects_withdrawals_above_the_limit() {
    let h = harness();
    let f = h.fixtures.load(&h.chain, deploy_and_fund).unwrap();

    let err = f
        .faucet
        .withdraw(&h.chain, f.alice.address(), parse_ether("0.2").unwrap())
        .unwrap_err();
    assert_eq!(err.revert_reason(), Some("So much ether"));
    println!("OK: 0.2 ether withdrawal reverted");
}

#[test]
fn test_pays_out_small_withdrawals() {
    let h = harness();
    let f = h.fixtures.load(&h.chain, deploy_and_fund).unwrap();

    let balance = h.chain.get_balance(f.alice.address());
    f.faucet
        .withdraw(&h.chain, f.alice.address(), parse_ether("0.02").unwrap())
        .unwrap();

    assert!(h.chain.get_balance(f.alice.address()) > balance);
    println!("OK: 0.02 ether withdrawal paid out");
}

#[test]
fn test_restricts_withdraw_all_to_the_owner() {
    let h = harness();
    let f = h.fixtures.load(&h.chain, deploy_and_fund).unwrap();

    let err = f
        .faucet
        .withdraw_all(&h.chain, f.alice.address())
        .unwrap_err();
    assert_eq!(err.revert_reason(), Some("You are not the owner"));
    println!("OK: non-owner withdraw_all reverted");
}

#[test]
fn test_sweeps_the_whole_balance_to_the_owner() {
    let h = harness();
    let f = h.fixtures.load(&h.chain, deploy_and_fund).unwrap();

    let balance = h.chain.get_balance(f.owner.address());
    f.faucet.withdraw_all(&h.chain, f.owner.address()).unwrap();

    assert!(h.chain.get_balance(f.owner.address()) > balance);
    assert_eq!(f.faucet.balance(&h.chain), 0);
    println!("OK: owner swept the faucet");
}

#[test]
fn test_destroys_the_contract() {
    let h = harness();
    let f = h.fixtures.load(&h.chain, deploy_and_fund).unwrap();

    f.faucet.destroy(&h.chain, f.owner.address()).unwrap();

    assert_eq!(h.chain.code_at(f.faucet.address()), "0x");
    println!("OK: faucet destroyed, code removed");
}

#[test]
fn test_refuses_destruction_by_non_owner() {
    let h = harness();
    let f = h.fixtures.load(&h.chain, deploy_and_fund).unwrap();

    let err = f.faucet.destroy(&h.chain, f.alice.address()).unwrap_err();
    assert_eq!(err.revert_reason(), Some("You are not the owner"));
    assert_ne!(h.chain.code_at(f.faucet.address()), "0x");
    println!("OK: non-owner destroy reverted");
}

#[test]
fn test_every_load_reestablishes_identical_state() {
    let h = harness();
    let f = h.fixtures.load(&h.chain, deploy_and_fund).unwrap();

    let owner_balance = h.chain.get_balance(f.owner.address());
    let faucet_balance = f.faucet.balance(&h.chain);
    let faucet_code = h.chain.code_at(f.faucet.address());
    let block = h.chain.block_number();
    let root = h.chain.state().snapshot().compute_state_root();

    for _ in 0..3 {
        // Arbitrary state-mutating traffic between loads.
        f.faucet
            .withdraw(&h.chain, f.alice.address(), parse_ether("0.02").unwrap())
            .unwrap();
        let bob = h.chain.signers()[2].address().clone();
        h.chain
            .send_transaction(&TransferRequest::new(
                f.alice.address().clone(),
                bob,
                parse_ether("5").unwrap(),
            ))
            .unwrap();

        let f = h.fixtures.load(&h.chain, deploy_and_fund).unwrap();
        assert_eq!(h.chain.get_balance(f.owner.address()), owner_balance);
        assert_eq!(f.faucet.balance(&h.chain), faucet_balance);
        assert_eq!(h.chain.code_at(f.faucet.address()), faucet_code);
        assert_eq!(h.chain.block_number(), block);
        assert_eq!(h.chain.state().snapshot().compute_state_root(), root);
    }
    println!("OK: fixture loads are idempotent");
}
