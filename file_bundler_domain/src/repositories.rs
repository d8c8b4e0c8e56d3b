// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Repositories
//!
//! Persistence ports of the bundler domain. The single port is
//! [`job_repository::JobRepository`]; any backing store satisfying it is
//! acceptable.

pub mod job_repository;

pub use job_repository::JobRepository;
