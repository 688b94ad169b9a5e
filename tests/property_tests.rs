// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Entry Point
//!
//! This test suite uses proptest to verify invariants of topology synthesis
//! across generated zone lists, address blocks and listener port sets.

mod property;
