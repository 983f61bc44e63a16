use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::process;

use testchain_core::*;

#[derive(Parser)]
#[command(name = "testchain-cli")]
#[command(about = "Testchain CLI - deterministic local test chain with a faucet contract")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the derived dev signer accounts
    Accounts {
        /// BIP39 mnemonic (defaults to the well-known dev mnemonic)
        #[arg(short, long)]
        mnemonic: Option<String>,

        /// Number of signers to derive
        #[arg(short, long, default_value = "3")]
        count: usize,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Generate a fresh BIP39 mnemonic for a custom chain
    GenerateMnemonic,

    /// Run the faucet scenario end to end on a fresh chain
    Scenario,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Accounts {
            mnemonic,
            count,
            json,
        } => handle_accounts(mnemonic, count, json),
        Commands::GenerateMnemonic => handle_generate_mnemonic(),
        Commands::Scenario => handle_scenario(),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn handle_accounts(mnemonic: Option<String>, count: usize, json: bool) -> anyhow::Result<()> {
    let mnemonic = mnemonic.unwrap_or_else(|| DEV_MNEMONIC.to_string());
    if !validate_mnemonic(&mnemonic) {
        bail!("Invalid mnemonic phrase");
    }

    let signers = derive_signers(&mnemonic, count)?;
    let summaries: Vec<SignerSummary> = signers.iter().map(|s| s.summary()).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for summary in &summaries {
            println!(
                "#{} {} ({})",
                summary.index, summary.address, summary.derivation_path
            );
        }
    }

    Ok(())
}

fn handle_generate_mnemonic() -> anyhow::Result<()> {
    let mnemonic = generate_mnemonic()?;
    println!("Mnemonic: {}", mnemonic);
    Ok(())
}

/// Bundle produced by the scenario fixture.
struct FaucetScenario {
    faucet: Faucet,
    owner: Signer,
    alice: Signer,
}

/// Deploys the faucet and funds it with 1 ether from alice.
fn faucet_fixture(chain: &Chain) -> Result<FaucetScenario> {
    let owner = chain.signers()[0].clone();
    let alice = chain.signers()[1].clone();

    let faucet = Faucet::deploy(chain, &owner)?;
    chain.send_transaction(&TransferRequest::new(
        alice.address().clone(),
        faucet.address().clone(),
        parse_ether("1")?,
    ))?;

    Ok(FaucetScenario {
        faucet,
        owner,
        alice,
    })
}

fn handle_scenario() -> anyhow::Result<()> {
    let chain = Chain::new().context("failed to build chain")?;
    let cache = FixtureCache::new();

    let bundle = cache.load(&chain, faucet_fixture)?;
    let faucet = &bundle.faucet;
    println!("Faucet deployed at {}", faucet.address());
    println!("Owner: {}", faucet.owner(&chain)?);
    println!("Faucet balance: {} ether", format_ether(faucet.balance(&chain)));

    // A request above the limit is rejected with the contract's reason.
    let alice = bundle.alice.address();
    match faucet.withdraw(&chain, alice, parse_ether("0.2")?) {
        Err(e) => println!("withdraw 0.2 ether -> {}", e),
        Ok(()) => bail!("withdraw above the limit unexpectedly succeeded"),
    }

    faucet.withdraw(&chain, alice, parse_ether("0.02")?)?;
    println!(
        "withdraw 0.02 ether -> ok, faucet balance now {} ether",
        format_ether(faucet.balance(&chain))
    );

    // Reload the fixture: the chain snaps back to the post-deploy state.
    let bundle = cache.load(&chain, faucet_fixture)?;
    let faucet = &bundle.faucet;
    println!(
        "fixture reloaded -> faucet balance restored to {} ether",
        format_ether(faucet.balance(&chain))
    );

    let owner = bundle.owner.address();
    faucet.withdraw_all(&chain, owner)?;
    println!(
        "withdraw_all as owner -> faucet balance {} ether",
        format_ether(faucet.balance(&chain))
    );

    faucet.destroy(&chain, owner)?;
    println!("destroy -> code at faucet: {}", chain.code_at(faucet.address()));

    Ok(())
}
