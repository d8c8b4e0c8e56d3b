// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Layer
//!
//! Orchestration of the bundle job pipeline over the domain ports:
//!
//! - [`services::bundle_service::BundleService`] - validate, expand,
//!   bin-pack, persist, dispatch
//! - [`services::archive_worker::ArchiveWorker`] - one archive end-to-end
//! - [`services::job_tracker::JobTracker`] - serialized completion
//!   aggregation
//! - [`services::snapshot_service::SnapshotService`] - the read side
//! - [`services::output_namer::OutputNamer`] - artifact naming and URL
//!   mapping

pub mod services;
