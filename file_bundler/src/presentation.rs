// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Presentation Layer
//!
//! The HTTP surface: a thin translation between the wire contract and the
//! application services. See [`http_server::BundleServer`].

pub mod http_server;

pub use http_server::BundleServer;
