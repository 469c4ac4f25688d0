//! Integration Test Suite for the Market Engine
//!
//! Cross-contract tests that exercise the engine against a real Stellar
//! Asset Contract for payments and the asset registry for custody:
//! - End-to-end listing, bidding, resolution and relist flows
//! - Escrow and balance-conservation invariants across whole flows
//!
//! # Test Organization
//! - `harness`: Reusable test harness and helpers
//! - `market_tests`: End-to-end marketplace flows

#![cfg(test)]

pub mod harness;
