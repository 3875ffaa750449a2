// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolwerk Gateway — print dispatch by stable printer id, printer management,
// and the inbound submission boundary, wired together by `services::gateway`.

pub mod dispatch;
pub mod management;
pub mod services;
pub mod submission;

pub use dispatch::{PrintDispatcher, PrintRequest, PrintResponse, Simulation};
pub use management::{ActionOutcome, ClearOutcome, PrinterManager};
pub use services::gateway::Gateway;
pub use submission::{Submission, SubmissionHandler, SubmissionOutcome};
