//! Feature collector tests against an in-memory device

mod common;

use common::{render, row, sample, series_count, StaticClient};
use mikrotik_exporter::collectors::{InterfaceCollector, LteCollector, ResourceCollector};
use mikrotik_exporter::context::CollectorContext;
use mikrotik_exporter::error::ExporterError;
use mikrotik_exporter::registry::Collector;
use prometheus::Registry;

const DEVICE: [&str; 2] = ["gw", "https://10.0.0.1"];

fn lte_client() -> StaticClient {
    StaticClient::new().on(
        "/interface/lte/print",
        vec![row(&[("name", "lte1")]), row(&[("name", "lte2")])],
    )
}

#[test]
fn test_lte_collects_every_interface() {
    let client = lte_client()
        .on_arg(
            "/interface/lte/monitor",
            "=numbers=lte1",
            vec![row(&[
                ("current-cellid", "12345"),
                ("primary-band", "B20@10Mhz earfcn: 6300"),
                ("rssi", "-87"),
                ("rsrp", "-110"),
                ("rsrq", "-12"),
                ("sinr", "4"),
                ("status", "connected"),
            ])],
        )
        .on_arg(
            "/interface/lte/monitor",
            "=numbers=lte2",
            vec![row(&[
                ("current-cellid", "777"),
                ("primary-band", "B3"),
                ("rssi", "-95"),
                ("status", "searching"),
            ])],
        );

    let registry = Registry::new();
    let collector = LteCollector::new().unwrap();
    collector.describe(&registry).unwrap();

    let ctx = CollectorContext::new(&client).with_labels(DEVICE);
    collector.collect(&ctx).unwrap();

    let text = render(&registry);
    let lte1 = [
        ("name", "gw"),
        ("address", "https://10.0.0.1"),
        ("interface", "lte1"),
        ("cell_id", "12345"),
        ("primary_band", "B20@10Mhz"),
    ];
    assert_eq!(sample(&text, "lte_interface_rssi", &lte1), Some(-87.0));
    assert_eq!(sample(&text, "lte_interface_sinr", &lte1), Some(4.0));
    assert_eq!(sample(&text, "lte_interface_connected", &lte1), Some(1.0));

    let lte2 = [("interface", "lte2"), ("cell_id", "777"), ("primary_band", "B3")];
    assert_eq!(sample(&text, "lte_interface_rssi", &lte2), Some(-95.0));
    assert_eq!(sample(&text, "lte_interface_connected", &lte2), Some(0.0));
    // lte2 reported no sinr
    assert_eq!(series_count(&text, "lte_interface_sinr"), 1);

    assert_eq!(
        client.calls()[0],
        "/interface/lte/print ?disabled=false =.proplist=name"
    );
}

#[test]
fn test_lte_partial_failure_keeps_other_interfaces() {
    let client = lte_client()
        .fail("/interface/lte/monitor", Some("=numbers=lte1"), "modem busy")
        .on_arg(
            "/interface/lte/monitor",
            "=numbers=lte2",
            vec![row(&[("current-cellid", "777"), ("primary-band", "B3"), ("rssi", "-95")])],
        );

    let registry = Registry::new();
    let collector = LteCollector::new().unwrap();
    collector.describe(&registry).unwrap();

    let ctx = CollectorContext::new(&client).with_labels(DEVICE);
    let err = collector.collect(&ctx).unwrap_err();

    match &err {
        ExporterError::Multiple(errs) => {
            assert_eq!(errs.len(), 1);
            let message = errs.errors()[0].to_string();
            assert!(message.contains("lte1"), "{}", message);
            assert!(message.contains("modem busy"), "{}", message);
        }
        other => panic!("unexpected error: {other}"),
    }

    let text = render(&registry);
    assert_eq!(
        sample(&text, "lte_interface_rssi", &[("interface", "lte2")]),
        Some(-95.0)
    );
    assert_eq!(series_count(&text, "lte_interface_rssi"), 1);
}

#[test]
fn test_lte_conversion_errors_name_the_interface() {
    let client = lte_client()
        .on_arg(
            "/interface/lte/monitor",
            "=numbers=lte1",
            vec![row(&[("rssi", "-80"), ("rsrp", "unknown")])],
        )
        .on_arg("/interface/lte/monitor", "=numbers=lte2", vec![]);

    let registry = Registry::new();
    let collector = LteCollector::new().unwrap();
    collector.describe(&registry).unwrap();

    let ctx = CollectorContext::new(&client).with_labels(DEVICE);
    let message = collector.collect(&ctx).unwrap_err().to_string();

    assert!(message.starts_with("1 error occurred:"), "{}", message);
    assert!(message.contains("collect lte for lte1 error"), "{}", message);
    assert!(message.contains("rsrp"), "{}", message);

    let text = render(&registry);
    assert_eq!(
        sample(&text, "lte_interface_rssi", &[("interface", "lte1"), ("cell_id", "")]),
        Some(-80.0)
    );
}

#[test]
fn test_lte_name_query_failure_aborts_collector() {
    let client = StaticClient::new().fail("/interface/lte/print", None, "no such command prefix");

    let collector = LteCollector::new().unwrap();
    let ctx = CollectorContext::new(&client).with_labels(DEVICE);
    let err = collector.collect(&ctx).unwrap_err();

    assert!(matches!(err, ExporterError::Context { .. }));
    assert!(err.to_string().starts_with("fetch lte interface names error"));
    assert_eq!(client.calls().len(), 1);
}

#[test]
fn test_interface_collector() {
    let client = StaticClient::new().on(
        "/interface/print",
        vec![
            row(&[
                ("name", "ether1"),
                ("type", "ether"),
                ("comment", "uplink"),
                ("running", "true"),
                ("rx-byte", "1000"),
                ("tx-byte", "2000"),
                ("actual-mtu", "1500"),
            ]),
            row(&[
                ("name", "ether2"),
                ("type", "ether"),
                ("disabled", "true"),
                ("rx-byte", "5"),
            ]),
            row(&[
                ("name", "wlan1"),
                ("type", "wlan"),
                ("running", "sometimes"),
                ("rx-byte", "42"),
            ]),
        ],
    );

    let registry = Registry::new();
    let collector = InterfaceCollector::new().unwrap();
    collector.describe(&registry).unwrap();

    let ctx = CollectorContext::new(&client).with_labels(DEVICE);
    let err = collector.collect(&ctx).unwrap_err();
    assert!(err.to_string().contains("collect interface wlan1 error"));

    let text = render(&registry);
    let ether1 = [("interface", "ether1"), ("type", "ether"), ("comment", "uplink")];
    assert_eq!(sample(&text, "interface_rx_bytes_total", &ether1), Some(1000.0));
    assert_eq!(sample(&text, "interface_tx_bytes_total", &ether1), Some(2000.0));
    assert_eq!(sample(&text, "interface_running", &ether1), Some(1.0));
    assert_eq!(sample(&text, "interface_actual_mtu", &ether1), Some(1500.0));
    assert!(text.contains("# TYPE interface_rx_bytes_total counter"));

    // disabled interfaces are skipped, failed conversions keep the rest of the row
    assert!(!text.contains("interface=\"ether2\""));
    assert_eq!(
        sample(&text, "interface_rx_bytes_total", &[("interface", "wlan1")]),
        Some(42.0)
    );
    assert_eq!(series_count(&text, "interface_running"), 1);

    let proplist = &client.calls()[0];
    assert!(proplist.starts_with("/interface/print =.proplist=name,type,comment,disabled,rx-byte"));
}

#[test]
fn test_resource_collector() {
    let client = StaticClient::new().on(
        "/system/resource/print",
        vec![row(&[
            ("board-name", "hAP ax3"),
            ("version", "7.16 (stable)"),
            ("cpu-load", "3"),
            ("free-memory", "800000000"),
            ("total-memory", "1073741824"),
            ("uptime", "1w2d3h4m5s"),
        ])],
    );

    let registry = Registry::new();
    let collector = ResourceCollector::new().unwrap();
    collector.describe(&registry).unwrap();

    let ctx = CollectorContext::new(&client).with_labels(DEVICE);
    collector.collect(&ctx).unwrap();

    let text = render(&registry);
    let labels = [("board_name", "hAP ax3"), ("version", "7.16 (stable)")];
    assert_eq!(sample(&text, "system_resource_cpu_load", &labels), Some(3.0));
    assert_eq!(
        sample(&text, "system_resource_uptime_seconds", &labels),
        Some(788_645.0)
    );
    assert_eq!(series_count(&text, "system_resource_free_hdd_space"), 0);

    collector.reset();
    assert_eq!(series_count(&render(&registry), "system_resource_cpu_load"), 0);
}
