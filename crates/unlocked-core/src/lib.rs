// ABOUTME: Core data models shared across the UnlockEd server crates
// ABOUTME: Users, programs, activities, provider platforms and OIDC clients with no I/O
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # UnlockEd Core
//!
//! Plain data types used by the HTTP layer, the database layer and the
//! OIDC registration flow. Nothing in this crate touches the network or
//! the database.

/// Domain models
pub mod models;

pub use models::ModelParseError;
