// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Structural properties of the resource graph and the topology invariants
//! that every synthesized stack must satisfy.

mod graph_properties;
