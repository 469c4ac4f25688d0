#![no_std]

use soroban_sdk::{
    contract, contractclient, contracterror, contractimpl, contracttype, symbol_short, token,
    Address, Env, Map, Vec,
};

// ============================================================================
// Error Types
// ============================================================================

/// Market engine errors
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum MarketError {
    /// Engine not initialized
    NotInitialized = 1,
    /// Already initialized
    AlreadyInitialized = 2,
    /// Item not found
    ItemNotFound = 3,
    /// Caller lacks the required role or identity
    Unauthorized = 4,
    /// Operation on an item whose sale has already resolved
    AlreadyResolved = 5,
    /// Relist requires a resolved item
    NotResolved = 6,
    /// Seller cannot bid on their own item
    SelfBid = 7,
    /// Bid amount must be greater than 0
    ZeroBid = 8,
    /// Cumulative bid must exceed the current standing bid
    BidTooLow = 9,
    /// Fixed-price purchase must pay the asking price exactly
    IncorrectPayment = 10,
    /// Operation does not apply to this item's sale kind
    WrongSaleKind = 11,
    /// Price must be greater than 0
    InvalidPrice = 12,
    /// Asset custody transfer failed
    AssetTransferFailed = 13,
    /// Fund transfer failed
    FundTransferFailed = 14,
}

// ============================================================================
// Data Types
// ============================================================================

/// How an item is sold
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SaleKind {
    Fixed = 1,
    Auction = 2,
}

/// Where an item is in its sale lifecycle
///
/// `Listed` and `Relisted` are both actively for sale; only `Resolved` is
/// terminal, until the asset holder relists.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ItemState {
    Listed = 0,
    Relisted = 1,
    Resolved = 2,
}

/// One listed item instance
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketItem {
    pub item_id: u64,
    /// Custody contract holding the underlying asset
    pub asset_contract: Address,
    pub asset_id: u32,
    pub seller: Address,
    /// Holder of record: the engine while for sale, the buyer/winner after
    pub custodian: Address,
    /// Asking price (meaningful when sale_kind = Fixed)
    pub price: i128,
    pub sale_kind: SaleKind,
    /// Highest standing cumulative bid; non-decreasing while for sale
    pub current_bid: i128,
    pub current_bidder: Option<Address>,
    /// Amount actually paid at the most recent resolution
    pub sell_price: i128,
    pub state: ItemState,
    pub listed_at: u64,
}

/// Storage keys
#[contracttype]
pub enum DataKey {
    /// Administrator address
    Admin,
    /// Token contract used for all payments and escrow
    PaymentToken,
    /// Flat listing fee charged at create/relist
    ListingFee,
    /// Counter for assigning item IDs
    ItemCounter,
    /// Item data (item_id -> MarketItem)
    Item(u64),
    /// Escrow ledger (item_id -> Map<bidder, cumulative deposit>)
    Escrow(u64),
}

// ============================================================================
// Asset Custody Interface
// ============================================================================

/// Interface the engine requires from an asset-custody contract.
///
/// `transfer` must fail unless `from` is the asset's current owner.
#[contractclient(name = "AssetCustodyClient")]
pub trait AssetCustody {
    fn owner_of(e: Env, asset_id: u32) -> Address;
    fn transfer(e: Env, from: Address, to: Address, asset_id: u32);
}


// ============================================================================
// Storage Module
// ============================================================================

mod storage {
    use super::*;

    pub fn has_admin(e: &Env) -> bool {
        e.storage().instance().has(&DataKey::Admin)
    }

    pub fn set_admin(e: &Env, admin: &Address) {
        e.storage().instance().set(&DataKey::Admin, admin);
    }

    pub fn admin(e: &Env) -> Result<Address, MarketError> {
        e.storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(MarketError::NotInitialized)
    }

    pub fn set_payment_token(e: &Env, address: &Address) {
        e.storage().instance().set(&DataKey::PaymentToken, address);
    }

    pub fn payment_token(e: &Env) -> Result<Address, MarketError> {
        e.storage()
            .instance()
            .get(&DataKey::PaymentToken)
            .ok_or(MarketError::NotInitialized)
    }

    pub fn set_listing_fee(e: &Env, fee: i128) {
        e.storage().instance().set(&DataKey::ListingFee, &fee);
    }

    pub fn listing_fee(e: &Env) -> Result<i128, MarketError> {
        e.storage()
            .instance()
            .get(&DataKey::ListingFee)
            .ok_or(MarketError::NotInitialized)
    }

    pub fn next_item_id(e: &Env) -> u64 {
        let count: u64 = e
            .storage()
            .instance()
            .get(&DataKey::ItemCounter)
            .unwrap_or(0);
        let new_count = count + 1;
        e.storage()
            .instance()
            .set(&DataKey::ItemCounter, &new_count);
        new_count
    }

    pub fn item_count(e: &Env) -> u64 {
        e.storage()
            .instance()
            .get(&DataKey::ItemCounter)
            .unwrap_or(0)
    }

    pub fn set_item(e: &Env, item: &MarketItem) {
        e.storage()
            .persistent()
            .set(&DataKey::Item(item.item_id), item);
    }

    pub fn item(e: &Env, item_id: u64) -> Result<MarketItem, MarketError> {
        e.storage()
            .persistent()
            .get(&DataKey::Item(item_id))
            .ok_or(MarketError::ItemNotFound)
    }

    pub fn escrow(e: &Env, item_id: u64) -> Map<Address, i128> {
        e.storage()
            .persistent()
            .get(&DataKey::Escrow(item_id))
            .unwrap_or(Map::new(e))
    }

    pub fn set_escrow(e: &Env, item_id: u64, ledger: &Map<Address, i128>) {
        e.storage()
            .persistent()
            .set(&DataKey::Escrow(item_id), ledger);
    }

    pub fn clear_escrow(e: &Env, item_id: u64) {
        e.storage().persistent().remove(&DataKey::Escrow(item_id));
    }
}

// ============================================================================
// Transfer Helpers
// ============================================================================

/// Move payment tokens, mapping any failure to `FundTransferFailed`.
///
/// A returned error aborts the whole invocation, so a stuck payout can
/// never leave partial state behind.
fn pay(e: &Env, from: &Address, to: &Address, amount: i128) -> Result<(), MarketError> {
    if amount == 0 {
        return Ok(());
    }
    let client = token::Client::new(e, &storage::payment_token(e)?);
    match client.try_transfer(from, to, &amount) {
        Ok(_) => Ok(()),
        Err(_) => Err(MarketError::FundTransferFailed),
    }
}

/// Move the underlying asset through its custody contract.
///
/// The custody contract rejects transfers where `from` is not the current
/// owner, which doubles as the ownership check at listing time.
fn move_asset(
    e: &Env,
    asset_contract: &Address,
    from: &Address,
    to: &Address,
    asset_id: u32,
) -> Result<(), MarketError> {
    let custody = AssetCustodyClient::new(e, asset_contract);
    match custody.try_transfer(from, to, &asset_id) {
        Ok(_) => Ok(()),
        Err(_) => Err(MarketError::AssetTransferFailed),
    }
}

fn asset_owner(
    e: &Env,
    asset_contract: &Address,
    asset_id: u32,
) -> Result<Address, MarketError> {
    let custody = AssetCustodyClient::new(e, asset_contract);
    match custody.try_owner_of(&asset_id) {
        Ok(Ok(owner)) => Ok(owner),
        _ => Err(MarketError::AssetTransferFailed),
    }
}

// ============================================================================
// Contract Implementation
// ============================================================================

#[contract]
pub struct MarketEngineContract;

#[contractimpl]
impl MarketEngineContract {
    // ========================================================================
    // Initialization
    // ========================================================================

    /// Initialize the engine
    ///
    /// # Arguments
    /// * `admin` - Administrator address; receives listing fees
    /// * `payment_token` - Token contract used for all payments and escrow
    /// * `listing_fee` - Flat fee charged at item creation and relist
    pub fn initialize(
        e: Env,
        admin: Address,
        payment_token: Address,
        listing_fee: i128,
    ) -> Result<(), MarketError> {
        if storage::has_admin(&e) {
            return Err(MarketError::AlreadyInitialized);
        }

        admin.require_auth();

        storage::set_admin(&e, &admin);
        storage::set_payment_token(&e, &payment_token);
        storage::set_listing_fee(&e, listing_fee);
        e.storage().instance().set(&DataKey::ItemCounter, &0u64);

        Ok(())
    }

    /// Get the administrator address
    pub fn get_admin(e: Env) -> Result<Address, MarketError> {
        storage::admin(&e)
    }

    /// Get the payment token contract address
    pub fn get_payment_token(e: Env) -> Result<Address, MarketError> {
        storage::payment_token(&e)
    }

    // ========================================================================
    // Fee Policy
    // ========================================================================

    /// Replace the listing fee (administrator only)
    pub fn set_listing_fee(e: Env, caller: Address, fee: i128) -> Result<(), MarketError> {
        caller.require_auth();

        let admin = storage::admin(&e)?;
        if caller != admin {
            return Err(MarketError::Unauthorized);
        }

        storage::set_listing_fee(&e, fee);

        e.events().publish((symbol_short!("FeeSet"),), fee);

        Ok(())
    }

    /// Get the current listing fee
    pub fn get_listing_fee(e: Env) -> Result<i128, MarketError> {
        storage::listing_fee(&e)
    }

    // ========================================================================
    // Item Registry
    // ========================================================================

    /// List an asset for sale
    ///
    /// Charges the listing fee (paid to the administrator) and moves the
    /// asset from the seller into engine custody. Fails with
    /// `AssetTransferFailed` if the seller is not the asset's current owner.
    ///
    /// # Returns
    /// The item_id of the new listing
    pub fn create_item(
        e: Env,
        seller: Address,
        asset_contract: Address,
        asset_id: u32,
        price: i128,
        sale_kind: SaleKind,
    ) -> Result<u64, MarketError> {
        seller.require_auth();

        let admin = storage::admin(&e)?;

        if price <= 0 {
            return Err(MarketError::InvalidPrice);
        }

        // EFFECTS
        let item_id = storage::next_item_id(&e);
        let item = MarketItem {
            item_id,
            asset_contract: asset_contract.clone(),
            asset_id,
            seller: seller.clone(),
            custodian: e.current_contract_address(),
            price,
            sale_kind,
            current_bid: 0,
            current_bidder: None,
            sell_price: 0,
            state: ItemState::Listed,
            listed_at: e.ledger().timestamp(),
        };
        storage::set_item(&e, &item);

        // INTERACTIONS
        let fee = storage::listing_fee(&e)?;
        pay(&e, &seller, &admin, fee)?;
        move_asset(
            &e,
            &asset_contract,
            &seller,
            &e.current_contract_address(),
            asset_id,
        )?;

        e.events().publish(
            (symbol_short!("ItemNew"), item_id),
            (seller, asset_contract, asset_id, price, sale_kind),
        );

        Ok(item_id)
    }

    /// Relist a resolved item for a new sale round
    ///
    /// The caller must be the asset's current owner. Charges the listing fee
    /// again and moves the asset back into engine custody; bid fields are
    /// reset and the caller becomes the seller.
    pub fn relist(
        e: Env,
        caller: Address,
        item_id: u64,
        price: i128,
        sale_kind: SaleKind,
    ) -> Result<(), MarketError> {
        caller.require_auth();

        let admin = storage::admin(&e)?;
        let mut item = storage::item(&e, item_id)?;

        if item.state != ItemState::Resolved {
            return Err(MarketError::NotResolved);
        }
        if price <= 0 {
            return Err(MarketError::InvalidPrice);
        }

        let owner = asset_owner(&e, &item.asset_contract, item.asset_id)?;
        if owner != caller {
            return Err(MarketError::Unauthorized);
        }

        // EFFECTS
        item.seller = caller.clone();
        item.custodian = e.current_contract_address();
        item.price = price;
        item.sale_kind = sale_kind;
        item.current_bid = 0;
        item.current_bidder = None;
        item.state = ItemState::Relisted;
        storage::set_item(&e, &item);

        // INTERACTIONS
        let fee = storage::listing_fee(&e)?;
        pay(&e, &caller, &admin, fee)?;
        move_asset(
            &e,
            &item.asset_contract,
            &caller,
            &e.current_contract_address(),
            item.asset_id,
        )?;

        e.events().publish(
            (symbol_short!("Relist"), item_id),
            (caller, price, sale_kind),
        );

        Ok(())
    }

    /// Get an item
    pub fn get_item(e: Env, item_id: u64) -> Result<MarketItem, MarketError> {
        storage::item(&e, item_id)
    }

    /// Total number of items ever created
    pub fn item_count(e: Env) -> u64 {
        storage::item_count(&e)
    }

    /// All items currently for sale, in ascending item_id order
    pub fn fetch_unsold(e: Env) -> Vec<MarketItem> {
        let mut items: Vec<MarketItem> = Vec::new(&e);

        for item_id in 1..=storage::item_count(&e) {
            if let Ok(item) = storage::item(&e, item_id) {
                if item.state != ItemState::Resolved {
                    items.push_back(item);
                }
            }
        }

        items
    }

    /// All items whose current seller is `seller`, in ascending item_id order
    pub fn fetch_created_by(e: Env, seller: Address) -> Vec<MarketItem> {
        let mut items: Vec<MarketItem> = Vec::new(&e);

        for item_id in 1..=storage::item_count(&e) {
            if let Ok(item) = storage::item(&e, item_id) {
                if item.seller == seller {
                    items.push_back(item);
                }
            }
        }

        items
    }

    // ========================================================================
    // Auction Protocol
    // ========================================================================

    /// Place or top up a bid on an auction item
    ///
    /// Bids are cumulative: `amount` is added to the bidder's existing
    /// escrowed deposit for this item, and the new cumulative total must
    /// exceed the current standing bid. Deposits stay escrowed until the
    /// auction closes, so an outbid bidder can top up rather than restart.
    pub fn bid(e: Env, bidder: Address, item_id: u64, amount: i128) -> Result<(), MarketError> {
        bidder.require_auth();

        let mut item = storage::item(&e, item_id)?;

        if item.state == ItemState::Resolved {
            return Err(MarketError::AlreadyResolved);
        }
        if item.sale_kind != SaleKind::Auction {
            return Err(MarketError::WrongSaleKind);
        }
        if bidder == item.seller {
            return Err(MarketError::SelfBid);
        }
        if amount <= 0 {
            return Err(MarketError::ZeroBid);
        }

        let mut escrow = storage::escrow(&e, item_id);
        let cumulative = escrow.get(bidder.clone()).unwrap_or(0) + amount;
        if cumulative <= item.current_bid {
            return Err(MarketError::BidTooLow);
        }

        // EFFECTS
        escrow.set(bidder.clone(), cumulative);
        storage::set_escrow(&e, item_id, &escrow);

        item.current_bid = cumulative;
        item.current_bidder = Some(bidder.clone());
        storage::set_item(&e, &item);

        // INTERACTIONS - escrow the increment with the engine
        pay(&e, &bidder, &e.current_contract_address(), amount)?;

        e.events()
            .publish((symbol_short!("Bid"), item_id), (bidder, cumulative));

        Ok(())
    }

    /// Close an auction (seller only)
    ///
    /// With a standing bidder: pays the winning cumulative bid to the seller,
    /// refunds every other depositor in full, and hands the asset to the
    /// winner. With no bids the asset simply returns to the seller. Either
    /// way the item resolves and further bids fail `AlreadyResolved`.
    pub fn close_auction(e: Env, caller: Address, item_id: u64) -> Result<(), MarketError> {
        caller.require_auth();

        let mut item = storage::item(&e, item_id)?;

        if item.state == ItemState::Resolved {
            return Err(MarketError::AlreadyResolved);
        }
        if item.sale_kind != SaleKind::Auction {
            return Err(MarketError::WrongSaleKind);
        }
        if caller != item.seller {
            return Err(MarketError::Unauthorized);
        }

        let engine = e.current_contract_address();

        match item.current_bidder.clone() {
            Some(winner) => {
                let winning_bid = item.current_bid;
                let escrow = storage::escrow(&e, item_id);

                // EFFECTS
                item.sell_price = winning_bid;
                item.current_bid = 0;
                item.current_bidder = None;
                item.custodian = winner.clone();
                item.state = ItemState::Resolved;
                storage::set_item(&e, &item);
                storage::clear_escrow(&e, item_id);

                // INTERACTIONS - the winner's deposit is consumed as the
                // seller payout; every other depositor is refunded in full
                pay(&e, &engine, &item.seller, winning_bid)?;
                for (holder, balance) in escrow.iter() {
                    if holder != winner && balance > 0 {
                        pay(&e, &engine, &holder, balance)?;
                    }
                }
                move_asset(&e, &item.asset_contract, &engine, &winner, item.asset_id)?;

                e.events().publish(
                    (symbol_short!("AucClose"), item_id),
                    (winner, winning_bid),
                );
            }
            None => {
                // EFFECTS
                item.custodian = item.seller.clone();
                item.state = ItemState::Resolved;
                storage::set_item(&e, &item);

                // INTERACTIONS - no bids, the asset goes back to the seller
                move_asset(
                    &e,
                    &item.asset_contract,
                    &engine,
                    &item.seller,
                    item.asset_id,
                )?;

                e.events()
                    .publish((symbol_short!("AucNoBid"), item_id), item.seller.clone());
            }
        }

        Ok(())
    }

    /// A bidder's escrowed cumulative deposit for an item
    pub fn escrow_balance(e: Env, item_id: u64, bidder: Address) -> i128 {
        storage::escrow(&e, item_id).get(bidder).unwrap_or(0)
    }

    // ========================================================================
    // Sale Protocol
    // ========================================================================

    /// Buy a fixed-price item
    ///
    /// `payment` must equal the asking price exactly; both overpayment and
    /// underpayment fail with `IncorrectPayment`.
    pub fn buy_fixed(
        e: Env,
        buyer: Address,
        item_id: u64,
        payment: i128,
    ) -> Result<(), MarketError> {
        buyer.require_auth();

        let mut item = storage::item(&e, item_id)?;

        if item.state == ItemState::Resolved {
            return Err(MarketError::AlreadyResolved);
        }
        if item.sale_kind != SaleKind::Fixed {
            return Err(MarketError::WrongSaleKind);
        }
        if payment != item.price {
            return Err(MarketError::IncorrectPayment);
        }

        // EFFECTS
        item.sell_price = payment;
        item.custodian = buyer.clone();
        item.state = ItemState::Resolved;
        storage::set_item(&e, &item);

        // INTERACTIONS
        pay(&e, &buyer, &item.seller, payment)?;
        move_asset(
            &e,
            &item.asset_contract,
            &e.current_contract_address(),
            &buyer,
            item.asset_id,
        )?;

        e.events()
            .publish((symbol_short!("Sale"), item_id), (buyer, payment));

        Ok(())
    }
}
