// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Properties of topology synthesis that must hold for every valid input.

mod topology;
