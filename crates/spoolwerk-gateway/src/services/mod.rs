// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — wires configuration, adapter, cache store, and the
// dispatch/management/submission front ends into one cloneable handle.

pub mod data_dir;
pub mod gateway;
