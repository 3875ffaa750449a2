// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end: list -> resolve -> print -> manage, against the mock adapter.

use std::sync::Arc;

use spoolwerk_cache::{CacheState, printer_id};
use spoolwerk_core::ErrorKind;
use spoolwerk_core::config::{GatewayConfig, TransportKind};
use spoolwerk_core::types::{Printer, PrinterState};
use spoolwerk_gateway::{Gateway, PrintRequest};
use spoolwerk_print::MockAdapter;

const PDF: &str = "JVBERi0xLjQK";

fn mock_config() -> GatewayConfig {
    GatewayConfig {
        transport: TransportKind::Mock,
        ..GatewayConfig::default()
    }
}

#[tokio::test]
async fn list_resolve_print_manage() {
    let adapter = Arc::new(MockAdapter::with_printers(vec![Printer::new(
        "HP-1",
        "smb://host/HP-1",
    )]));
    let gateway = Gateway::with_adapter(mock_config(), adapter.clone()).expect("gateway");

    // Empty cache populates synchronously with derived ids.
    let printers = gateway.directory().list(false).await.expect("list");
    assert_eq!(printers.len(), 1);
    assert_eq!(printers[0].id, printer_id("hp-1"));
    assert_eq!(printers[0].uri, "smb://host/HP-1");
    assert_eq!(
        gateway.directory().cache_state().await.expect("state"),
        CacheState::Fresh
    );

    let id = printers[0].id.clone();
    let response = gateway
        .dispatcher()
        .print(PrintRequest {
            printer_id: id.clone(),
            file_base64: PDF.into(),
        })
        .await
        .expect("print");
    assert_eq!(response.printer_name, "HP-1");
    assert!(response.job_id.starts_with("mock-job-"));

    let status = gateway.manager().printer_status(&id).await.expect("status");
    assert_eq!(status.name, "HP-1");
    assert_eq!(status.status, PrinterState::Online);

    let outcome = gateway.manager().pause_job(&id, 7).await.expect("pause job");
    assert!(outcome.success);
    let cleared = gateway.manager().clear_queue(&id).await.expect("clear");
    assert_eq!(cleared.canceled_count, 0);

    // One discovery served everything above.
    assert_eq!(adapter.list_calls(), 1);
    assert_eq!(adapter.print_calls(), 1);
}

#[tokio::test]
async fn renamed_printer_gets_new_id() {
    let adapter = Arc::new(MockAdapter::with_printers(vec![Printer::new(
        "HP-1",
        "smb://host/HP-1",
    )]));
    let gateway = Gateway::with_adapter(mock_config(), adapter.clone()).expect("gateway");
    let old_id = gateway.directory().list(false).await.expect("list")[0].id.clone();

    adapter.clear_printers();
    adapter.add_printer(Printer::new("HP-1-Floor2", "smb://host/HP-1-Floor2"));
    let refreshed = gateway.directory().list(true).await.expect("refresh");

    assert_ne!(refreshed[0].id, old_id);
    let err = gateway
        .dispatcher()
        .print(PrintRequest {
            printer_id: old_id,
            file_base64: PDF.into(),
        })
        .await
        .expect_err("old id is gone");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn queue_message_and_direct_call_agree() {
    let gateway = Gateway::init(mock_config()).expect("gateway");
    let id = printer_id("Mock Printer 2");

    let message = format!(r#"{{"printerId":"{id}","fileBase64":"{PDF}"}}"#);
    let queued = gateway.submissions().handle_message(message.as_bytes()).await;
    let direct = gateway
        .submissions()
        .handle(PrintRequest {
            printer_id: id,
            file_base64: PDF.into(),
        })
        .await;

    assert!(queued.is_success());
    assert!(direct.is_success());
}

#[tokio::test]
async fn simulation_mode_never_reaches_adapter() {
    let adapter = Arc::new(MockAdapter::new());
    let config = GatewayConfig {
        simulate_print: true,
        simulate_delay_ms: 10,
        ..mock_config()
    };
    let gateway = Gateway::with_adapter(config, adapter.clone()).expect("gateway");

    let response = gateway
        .dispatcher()
        .print(PrintRequest {
            printer_id: printer_id("Mock Printer 1"),
            file_base64: PDF.into(),
        })
        .await
        .expect("simulated");
    assert!(response.simulated);
    assert_eq!(adapter.print_calls(), 0);
}
