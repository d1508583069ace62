//! Text rendering of registry snapshots
//!
//! One line per record: index, name, MAC (lowercase colon-hex),
//! classification, VLAN id, MTU, link speed, administrative state,
//! attached-to name. The field order is part of the query contract.

use crate::types::InterfaceRecord;
use std::fmt::Write;

/// Header printed before the record lines
const REPORT_HEADER: &str = "Interface Tracker:";

/// Render one record as a report line (no trailing newline)
pub fn record_line(record: &InterfaceRecord) -> String {
    format!(
        "{} {} {} {} {} {} {} {} {}",
        record.index,
        record.name,
        record.mac,
        record.kind.as_str(),
        record.vlan_id,
        record.mtu,
        record.speed_mbps,
        record.admin_state.as_str(),
        record.attached_to
    )
}

/// Render a full snapshot as the line-oriented text report
pub fn render_snapshot(records: &[InterfaceRecord]) -> String {
    let mut out = String::with_capacity(64 + records.len() * 64);
    out.push_str(REPORT_HEADER);
    out.push('\n');
    for record in records {
        // Writing into a String cannot fail
        let _ = writeln!(out, "{}", record_line(record));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdminState, InterfaceKind, MacAddress};

    fn make_record() -> InterfaceRecord {
        InterfaceRecord {
            index: 2,
            name: "eth0".to_string(),
            kind: InterfaceKind::Physical,
            mac: MacAddress([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]),
            vlan_id: 0,
            mtu: 1500,
            speed_mbps: 1000,
            admin_state: AdminState::Up,
            attached_to: "none".to_string(),
        }
    }

    #[test]
    fn test_record_line_field_order() {
        assert_eq!(
            record_line(&make_record()),
            "2 eth0 aa:bb:cc:dd:ee:ff Physical 0 1500 1000 UP none"
        );
    }

    #[test]
    fn test_record_line_down_with_master() {
        let mut record = make_record();
        record.admin_state = AdminState::Down;
        record.attached_to = "br0".to_string();
        record.vlan_id = 100;
        assert_eq!(
            record_line(&record),
            "2 eth0 aa:bb:cc:dd:ee:ff Physical 100 1500 1000 DOWN br0"
        );
    }

    #[test]
    fn test_render_empty_snapshot() {
        assert_eq!(render_snapshot(&[]), "Interface Tracker:\n");
    }

    #[test]
    fn test_render_snapshot_one_line_per_record() {
        let mut second = make_record();
        second.index = 3;
        second.name = "eth1".to_string();

        let report = render_snapshot(&[make_record(), second]);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Interface Tracker:");
        assert!(lines[1].starts_with("2 eth0"));
        assert!(lines[2].starts_with("3 eth1"));
    }
}
