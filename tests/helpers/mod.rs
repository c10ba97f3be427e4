// ABOUTME: Test helper modules shared by integration tests
// ABOUTME: Router request driver and a stand-in identity provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(dead_code)]

pub mod axum_test;
pub mod mock_idp;
