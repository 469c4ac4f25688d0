#![no_std]
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, symbol_short, Address, Env, String,
};


// ============================================================================
// Error Types
// ============================================================================

/// Registry errors
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum RegistryError {
    /// Contract has not been initialized
    NotInitialized = 1,
    /// Contract has already been initialized
    AlreadyInitialized = 2,
    /// Asset with the given asset_id does not exist
    AssetNotFound = 3,
    /// `from` is not the current owner of the asset
    NotOwner = 4,
}

// ============================================================================
// Data Types
// ============================================================================

/// A registered asset and its current owner of record
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssetRecord {
    pub asset_id: u32,
    pub owner: Address,
    pub uri: String,
    pub minted_at: u64,
}

/// Storage keys for the contract
#[contracttype]
pub enum DataKey {
    /// Admin address (singleton)
    Admin,
    /// Counter for generating unique asset IDs
    AssetCounter,
    /// Owner mapping (asset_id -> Address)
    Owner(u32),
    /// Asset data (asset_id -> AssetRecord)
    Record(u32),
    /// Total number of minted assets
    TotalSupply,
}

// ============================================================================
// Storage Module
// ============================================================================

mod storage {
    use super::*;

    pub fn set_admin(e: &Env, admin: &Address) {
        e.storage().instance().set(&DataKey::Admin, admin);
    }

    pub fn get_admin(e: &Env) -> Option<Address> {
        e.storage().instance().get(&DataKey::Admin)
    }

    pub fn has_admin(e: &Env) -> bool {
        e.storage().instance().has(&DataKey::Admin)
    }

    pub fn increment_asset_counter(e: &Env) -> u32 {
        let count: u32 = e
            .storage()
            .instance()
            .get(&DataKey::AssetCounter)
            .unwrap_or(0);
        let new_count = count + 1;
        e.storage()
            .instance()
            .set(&DataKey::AssetCounter, &new_count);
        new_count
    }

    pub fn set_owner(e: &Env, asset_id: u32, owner: &Address) {
        e.storage()
            .persistent()
            .set(&DataKey::Owner(asset_id), owner);
    }

    pub fn get_owner(e: &Env, asset_id: u32) -> Option<Address> {
        e.storage().persistent().get(&DataKey::Owner(asset_id))
    }

    pub fn set_record(e: &Env, asset_id: u32, record: &AssetRecord) {
        e.storage()
            .persistent()
            .set(&DataKey::Record(asset_id), record);
    }

    pub fn get_record(e: &Env, asset_id: u32) -> Option<AssetRecord> {
        e.storage().persistent().get(&DataKey::Record(asset_id))
    }

    pub fn increment_total_supply(e: &Env) {
        let supply: u32 = e
            .storage()
            .instance()
            .get(&DataKey::TotalSupply)
            .unwrap_or(0);
        e.storage()
            .instance()
            .set(&DataKey::TotalSupply, &(supply + 1));
    }

    pub fn get_total_supply(e: &Env) -> u32 {
        e.storage()
            .instance()
            .get(&DataKey::TotalSupply)
            .unwrap_or(0)
    }
}

// ============================================================================
// Contract Implementation
// ============================================================================

#[contract]
pub struct AssetRegistryContract;

#[contractimpl]
impl AssetRegistryContract {
    // ========================================================================
    // Initialization
    // ========================================================================

    /// Initialize the registry with an admin address
    ///
    /// # Errors
    /// * `AlreadyInitialized` - If the contract has already been initialized
    pub fn initialize(e: Env, admin: Address) -> Result<(), RegistryError> {
        if storage::has_admin(&e) {
            return Err(RegistryError::AlreadyInitialized);
        }

        storage::set_admin(&e, &admin);
        e.storage().instance().set(&DataKey::AssetCounter, &0u32);
        e.storage().instance().set(&DataKey::TotalSupply, &0u32);

        Ok(())
    }

    /// Get the admin address
    pub fn get_admin(e: Env) -> Result<Address, RegistryError> {
        storage::get_admin(&e).ok_or(RegistryError::NotInitialized)
    }

    // ========================================================================
    // Minting
    // ========================================================================

    /// Mint a new asset to `to`
    ///
    /// Asset IDs are assigned from a monotonically increasing counter and
    /// never reused.
    ///
    /// # Returns
    /// The asset_id of the newly minted asset
    pub fn mint(e: Env, to: Address, uri: String) -> Result<u32, RegistryError> {
        to.require_auth();

        if !storage::has_admin(&e) {
            return Err(RegistryError::NotInitialized);
        }

        let asset_id = storage::increment_asset_counter(&e);
        let minted_at = e.ledger().timestamp();

        let record = AssetRecord {
            asset_id,
            owner: to.clone(),
            uri: uri.clone(),
            minted_at,
        };

        storage::set_record(&e, asset_id, &record);
        storage::set_owner(&e, asset_id, &to);
        storage::increment_total_supply(&e);

        e.events()
            .publish((symbol_short!("Mint"), asset_id), (to, uri, minted_at));

        Ok(asset_id)
    }

    // ========================================================================
    // Query Functions
    // ========================================================================

    /// Get the current owner of an asset
    pub fn owner_of(e: Env, asset_id: u32) -> Result<Address, RegistryError> {
        storage::get_owner(&e, asset_id).ok_or(RegistryError::AssetNotFound)
    }

    /// Get the full asset record
    pub fn get_asset(e: Env, asset_id: u32) -> Result<AssetRecord, RegistryError> {
        storage::get_record(&e, asset_id).ok_or(RegistryError::AssetNotFound)
    }

    /// Get total supply of registered assets
    pub fn total_supply(e: Env) -> u32 {
        storage::get_total_supply(&e)
    }

    // ========================================================================
    // Transfer
    // ========================================================================

    /// Transfer an asset to a new owner
    ///
    /// # Errors
    /// * `AssetNotFound` - If the asset does not exist
    /// * `NotOwner` - If `from` is not the current owner
    pub fn transfer(
        e: Env,
        from: Address,
        to: Address,
        asset_id: u32,
    ) -> Result<(), RegistryError> {
        from.require_auth();

        let current_owner =
            storage::get_owner(&e, asset_id).ok_or(RegistryError::AssetNotFound)?;
        if current_owner != from {
            return Err(RegistryError::NotOwner);
        }

        storage::set_owner(&e, asset_id, &to);

        if let Some(mut record) = storage::get_record(&e, asset_id) {
            record.owner = to.clone();
            storage::set_record(&e, asset_id, &record);
        }

        e.events().publish(
            (symbol_short!("Transfer"), asset_id),
            (from, to, e.ledger().timestamp()),
        );

        Ok(())
    }
}
