//! Faucet contract model.
//!
//! A single owner deploys the faucet; anyone may top it up with a plain
//! transfer and withdraw small amounts. Sweeping the balance and
//! destroying the contract are owner-only. Every revert check runs before
//! any table is touched, so a rejected call leaves the chain unchanged.

use bytes::Bytes;

use crate::accounts::Signer;
use crate::chain::currency::WEI_PER_ETHER;
use crate::chain::state::{Address, StateError};
use crate::chain::Chain;
use crate::contract::RevertReason;
use crate::error::{Result, TestchainError};

/// Per-call withdrawal limit: 0.1 ether. Requests above this revert with
/// "So much ether".
pub const WITHDRAW_LIMIT_WEI: u128 = WEI_PER_ETHER / 10;

/// Storage slot holding the owner address.
const OWNER_SLOT: &str = "owner";

/// Code blob installed at the faucet address. The simulator never executes
/// it; it only marks the account as a contract for `code_at` queries.
const FAUCET_BYTECODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52, 0xfa, 0x0c, 0xe7];

/// Typed handle to a deployed faucet.
#[derive(Debug, Clone)]
pub struct Faucet {
    address: Address,
}

impl Faucet {
    /// Deploys a faucet; the deployer becomes the owner.
    pub fn deploy(chain: &Chain, deployer: &Signer) -> Result<Self> {
        let address =
            chain.create_contract(deployer.address(), Bytes::from_static(FAUCET_BYTECODE))?;
        chain.state().set_storage(&address, OWNER_SLOT, deployer.address());
        log::debug!("faucet deployed at {} owned by {}", address, deployer.address());
        Ok(Self { address })
    }

    /// The contract address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Current contract balance in wei.
    pub fn balance(&self, chain: &Chain) -> u128 {
        chain.get_balance(&self.address)
    }

    /// View call: the owner address. Fails once the contract is destroyed.
    pub fn owner(&self, chain: &Chain) -> Result<Address> {
        self.require_deployed(chain)?;
        chain
            .state()
            .get_storage(&self.address, OWNER_SLOT)
            .ok_or_else(|| TestchainError::State(format!("owner slot missing at {}", self.address)))
    }

    /// Pays `amount_wei` from the faucet to the caller. Any account may
    /// call this; amounts above `WITHDRAW_LIMIT_WEI` revert.
    pub fn withdraw(&self, chain: &Chain, caller: &Address, amount_wei: u128) -> Result<()> {
        chain.begin_call(caller, &self.address)?;
        if amount_wei > WITHDRAW_LIMIT_WEI {
            return Err(RevertReason::AboveWithdrawalLimit.into());
        }
        chain
            .state()
            .transfer(&self.address, caller, amount_wei)
            .map_err(TestchainError::from)?;
        chain.finish_call(caller);
        log::debug!("faucet {} paid {} wei to {}", self.address, amount_wei, caller);
        Ok(())
    }

    /// Sweeps the whole faucet balance to the owner. Owner-only.
    pub fn withdraw_all(&self, chain: &Chain, caller: &Address) -> Result<()> {
        chain.begin_call(caller, &self.address)?;
        self.require_owner(chain, caller)?;
        let balance = chain.get_balance(&self.address);
        chain
            .state()
            .transfer(&self.address, caller, balance)
            .map_err(TestchainError::from)?;
        chain.finish_call(caller);
        log::debug!("faucet {} swept {} wei to owner {}", self.address, balance, caller);
        Ok(())
    }

    /// Destroys the contract: sweeps the balance to the owner, clears the
    /// storage, and removes the code. Owner-only. Afterwards `code_at`
    /// returns `"0x"` and every further call fails.
    pub fn destroy(&self, chain: &Chain, caller: &Address) -> Result<()> {
        chain.begin_call(caller, &self.address)?;
        self.require_owner(chain, caller)?;
        let balance = chain.get_balance(&self.address);
        chain
            .state()
            .transfer(&self.address, caller, balance)
            .map_err(TestchainError::from)?;
        chain.state().clear_storage(&self.address);
        chain.state().remove_code(&self.address);
        chain.finish_call(caller);
        log::debug!("faucet {} destroyed by {}", self.address, caller);
        Ok(())
    }

    fn require_deployed(&self, chain: &Chain) -> Result<()> {
        if chain.state().get_code(&self.address).is_none() {
            return Err(StateError::NoContract(self.address.clone()).into());
        }
        Ok(())
    }

    fn require_owner(&self, chain: &Chain, caller: &Address) -> Result<()> {
        let owner = self.owner(chain)?;
        if *caller != owner {
            return Err(RevertReason::NotOwner.into());
        }
        Ok(())
    }
}
