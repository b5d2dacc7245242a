//! Ordered containers used by the simulation books.

pub mod heap;

pub use heap::{MaxHeap, MinHeap};
