//! QuantLab Core — the backtest simulation engine.
//!
//! This crate contains the heart of the system:
//! - Domain types (fixed-point money, bars, orders, fills, positions, exits)
//! - Min/max heaps backing the order books
//! - Chronological bar feed merge
//! - Simulation state with FIFO fill ledgers and a margin ledger
//! - Pure order executor with shorting, leverage, and partial fills
//! - Exit, limit, and scheduled order books
//! - The per-bar engine loop
//! - The strategy trait (the plugin seam) and built-in strategies
//! - Bar data providers with a disk-backed response cache

pub mod collections;
pub mod data;
pub mod domain;
pub mod feed;
pub mod params;
pub mod sim;
pub mod strategy;
