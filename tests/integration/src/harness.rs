//! Integration Test Harness
//!
//! This module provides a reusable test harness that:
//! - Boots a Soroban Env
//! - Deploys the payment token, asset registry and market engine
//! - Creates test accounts (admin/seller/buyer/bidders)
//! - Seeds token balances
//! - Provides typed contract clients and balance helpers

use soroban_sdk::{
    testutils::{Address as _, Ledger, LedgerInfo},
    token::{Client as TokenClient, StellarAssetClient},
    Address, Env, String,
};

use asset_registry::{AssetRegistryContract, AssetRegistryContractClient};
use market_engine::{MarketEngineContract, MarketEngineContractClient, SaleKind};

/// Default test token decimals
pub const TOKEN_DECIMALS: u32 = 7;

/// Default user initial balance
pub const DEFAULT_USER_BALANCE: i128 = 1000_0000000;

/// Listing fee used across integration tests (0.5 tokens)
pub const LISTING_FEE: i128 = 5_000_000;

/// Test accounts container
pub struct TestAccounts {
    pub admin: Address,
    pub seller: Address,
    pub buyer: Address,
    pub bidder1: Address,
    pub bidder2: Address,
}

impl TestAccounts {
    /// Create new test accounts
    pub fn new(e: &Env) -> Self {
        Self {
            admin: Address::generate(e),
            seller: Address::generate(e),
            buyer: Address::generate(e),
            bidder1: Address::generate(e),
            bidder2: Address::generate(e),
        }
    }
}

/// Deployed contract addresses
pub struct DeployedContracts {
    pub market: Address,
    pub registry: Address,
    pub token: Address,
}

/// Main test harness structure
pub struct TestHarness {
    pub env: Env,
    pub accounts: TestAccounts,
    pub contracts: DeployedContracts,
}

impl TestHarness {
    /// Create a new test harness with all contracts deployed and initialized
    pub fn new() -> Self {
        let env = Env::default();
        env.mock_all_auths();

        // Set initial ledger state
        env.ledger().set(LedgerInfo {
            timestamp: 1704067200, // Jan 1, 2024 00:00:00 UTC
            protocol_version: 21,
            sequence_number: 1,
            network_id: Default::default(),
            base_reserve: 10,
            min_temp_entry_ttl: 1000,
            min_persistent_entry_ttl: 1000,
            max_entry_ttl: 10000,
        });

        let accounts = TestAccounts::new(&env);

        // Deploy token contract (Stellar Asset Contract)
        let token_admin = Address::generate(&env);
        let token = env.register_stellar_asset_contract_v2(token_admin.clone());
        let token_address = token.address();

        // Deploy contracts
        let registry = env.register_contract(None, AssetRegistryContract);
        let market = env.register_contract(None, MarketEngineContract);

        // Initialize the registry and the engine
        let registry_client = AssetRegistryContractClient::new(&env, &registry);
        registry_client.initialize(&accounts.admin);

        let market_client = MarketEngineContractClient::new(&env, &market);
        market_client.initialize(&accounts.admin, &token_address, &LISTING_FEE);

        // Mint tokens to users
        let token_client = StellarAssetClient::new(&env, &token_address);
        token_client.mint(&accounts.seller, &DEFAULT_USER_BALANCE);
        token_client.mint(&accounts.buyer, &DEFAULT_USER_BALANCE);
        token_client.mint(&accounts.bidder1, &DEFAULT_USER_BALANCE);
        token_client.mint(&accounts.bidder2, &DEFAULT_USER_BALANCE);

        let contracts = DeployedContracts {
            market,
            registry,
            token: token_address,
        };

        Self {
            env,
            accounts,
            contracts,
        }
    }

    // ========================================================================
    // Contract Interaction Helpers
    // ========================================================================

    /// Get market engine client
    pub fn market(&self) -> MarketEngineContractClient<'_> {
        MarketEngineContractClient::new(&self.env, &self.contracts.market)
    }

    /// Get asset registry client
    pub fn registry(&self) -> AssetRegistryContractClient<'_> {
        AssetRegistryContractClient::new(&self.env, &self.contracts.registry)
    }

    /// Get token client
    pub fn token_client(&self) -> TokenClient<'_> {
        TokenClient::new(&self.env, &self.contracts.token)
    }

    /// Check user balance
    pub fn balance(&self, user: &Address) -> i128 {
        self.token_client().balance(user)
    }

    /// Mint a fresh asset to `owner` and return its id
    pub fn mint_asset(&self, owner: &Address) -> u32 {
        self.registry()
            .mint(owner, &String::from_str(&self.env, "https://assets.example/item"))
    }

    /// Mint an asset to `seller` and list it on the market
    pub fn list(&self, seller: &Address, price: i128, sale_kind: SaleKind) -> (u32, u64) {
        let asset_id = self.mint_asset(seller);
        let item_id =
            self.market()
                .create_item(seller, &self.contracts.registry, &asset_id, &price, &sale_kind);
        (asset_id, item_id)
    }

    /// Sum of the balances of every account plus the engine's escrow holdings
    pub fn total_held(&self) -> i128 {
        self.balance(&self.accounts.admin)
            + self.balance(&self.accounts.seller)
            + self.balance(&self.accounts.buyer)
            + self.balance(&self.accounts.bidder1)
            + self.balance(&self.accounts.bidder2)
            + self.balance(&self.contracts.market)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod harness_tests {
    use super::*;

    #[test]
    fn test_harness_creation() {
        let harness = TestHarness::new();

        // Verify accounts are created
        assert_ne!(harness.accounts.admin, harness.accounts.seller);
        assert_ne!(harness.accounts.bidder1, harness.accounts.bidder2);

        // Verify contracts are deployed and initialized
        assert_eq!(harness.market().get_admin(), harness.accounts.admin);
        assert_eq!(harness.market().get_listing_fee(), LISTING_FEE);
        assert_eq!(harness.registry().get_admin(), harness.accounts.admin);
    }

    #[test]
    fn test_token_balances() {
        let harness = TestHarness::new();

        // Verify initial balances
        assert_eq!(
            harness.balance(&harness.accounts.seller),
            DEFAULT_USER_BALANCE
        );
        assert_eq!(
            harness.balance(&harness.accounts.bidder1),
            DEFAULT_USER_BALANCE
        );
    }
}
