// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolwerk Print — the printer adapter contract and its transports: rpcclient
// (full management), smbclient, IPP and LPD (transfer-only), and a mock.
// SMB tool output is parsed by pure functions in `parser`; processes are
// spawned through the `CommandRunner` seam.

pub mod adapter;
pub mod ipp_client;
pub mod lpr_client;
pub mod mock;
pub mod parser;
pub mod rpc_client;
pub mod runner;
pub mod smb_client;
pub mod spool;

pub use adapter::{PrinterAdapter, build_adapter, build_adapter_with_runner};
pub use ipp_client::IppTransferAdapter;
pub use lpr_client::LpdTransferAdapter;
pub use mock::MockAdapter;
pub use rpc_client::RpcAdapter;
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};
pub use smb_client::{SmbCredentials, SmbTransferAdapter};
