//! Property tests for connection-table parsing and counting

use connwatch_core::monitoring::{
    ColumnLayout, ConnectionCounter, StatePolicy, count_connections, extract_port,
};
use proptest::prelude::*;

const TARGET_PORT: u16 = 8500;

/// Strategy for dotted-quad IPv4 addresses
fn ipv4_strategy() -> impl Strategy<Value = String> {
    (any::<u8>(), any::<u8>(), any::<u8>(), any::<u8>())
        .prop_map(|(a, b, c, d)| format!("{a}.{b}.{c}.{d}"))
}

/// Strategy for ports other than the target
fn other_port_strategy() -> impl Strategy<Value = u16> {
    (1u16..=u16::MAX).prop_filter("not the target port", |p| *p != TARGET_PORT)
}

/// Strategy for netstat state tokens
fn netstat_state_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "ESTABLISHED",
        "SYN_SENT",
        "SYN_RECV",
        "FIN_WAIT1",
        "FIN_WAIT2",
        "TIME_WAIT",
        "CLOSE",
        "CLOSE_WAIT",
        "LAST_ACK",
        "LISTEN",
        "CLOSING",
    ])
}

/// Strategy for lines too short to be a connection in either layout
fn short_line_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[A-Za-z0-9:._*-]{1,12}", 0..5).prop_map(|tokens| tokens.join(" "))
}

fn netstat_line(local: &str, lport: u16, remote: &str, rport: u16, state: &str) -> String {
    format!("tcp        0      0 {local}:{lport}    {remote}:{rport}    {state}")
}

proptest! {
    /// Property: connections to other ports never count, whatever their state
    #[test]
    fn other_ports_count_zero(
        lines in prop::collection::vec(
            (ipv4_strategy(), other_port_strategy(), ipv4_strategy(), other_port_strategy(), netstat_state_strategy()),
            0..40,
        ),
    ) {
        let raw: String = lines
            .iter()
            .map(|(l, lp, r, rp, s)| netstat_line(l, *lp, r, *rp, s) + "\n")
            .collect();
        for policy in [StatePolicy::ExcludeTimeWait, StatePolicy::EstablishedOnly] {
            prop_assert_eq!(count_connections(&raw, TARGET_PORT, ColumnLayout::NETSTAT, policy), 0);
        }
    }

    /// Property: k established target lines count k regardless of interleaved noise
    #[test]
    fn matching_lines_are_counted_exactly(
        matching in prop::collection::vec((ipv4_strategy(), other_port_strategy(), ipv4_strategy()), 0..20),
        noise in prop::collection::vec(
            (ipv4_strategy(), other_port_strategy(), ipv4_strategy(), other_port_strategy(), netstat_state_strategy()),
            0..20,
        ),
        seed in any::<u64>(),
    ) {
        let mut lines: Vec<String> = matching
            .iter()
            .map(|(l, lp, r)| netstat_line(l, *lp, r, TARGET_PORT, "ESTABLISHED"))
            .collect();
        lines.extend(noise.iter().map(|(l, lp, r, rp, s)| netstat_line(l, *lp, r, *rp, s)));
        // Deterministic shuffle driven by the seed
        let len = lines.len();
        if len > 1 {
            let mut state = seed;
            for i in (1..len).rev() {
                state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                let j = usize::try_from(state % (i as u64 + 1)).unwrap_or(0);
                lines.swap(i, j);
            }
        }
        let raw = lines.join("\n");

        let expected = matching.len() as u64;
        for policy in [StatePolicy::ExcludeTimeWait, StatePolicy::EstablishedOnly] {
            prop_assert_eq!(
                count_connections(&raw, TARGET_PORT, ColumnLayout::NETSTAT, policy),
                expected
            );
        }
    }

    /// Property: appending short garbage lines never changes the count
    #[test]
    fn short_lines_never_affect_count(
        base in prop::collection::vec(
            (ipv4_strategy(), other_port_strategy(), ipv4_strategy(), any::<bool>(), netstat_state_strategy()),
            0..20,
        ),
        garbage in prop::collection::vec(short_line_strategy(), 0..20),
    ) {
        let raw: String = base
            .iter()
            .map(|(l, lp, r, to_target, s)| {
                let rport = if *to_target { TARGET_PORT } else { *lp };
                netstat_line(l, *lp, r, rport, s) + "\n"
            })
            .collect();
        let with_garbage = format!("{raw}{}", garbage.join("\n"));

        for layout in [ColumnLayout::NETSTAT, ColumnLayout::SS] {
            let counter = ConnectionCounter::new(TARGET_PORT, layout, StatePolicy::ExcludeTimeWait);
            prop_assert_eq!(counter.count(&raw), counter.count(&with_garbage));
        }
    }

    /// Property: the port of a well-formed `host:port` string is recovered
    #[test]
    fn extract_port_recovers_port(host in ipv4_strategy(), port in any::<u16>()) {
        prop_assert_eq!(extract_port(&format!("{host}:{port}")), Some(port));
    }

    /// Property: addresses without a numeric port suffix yield nothing
    #[test]
    fn extract_port_rejects_non_numeric(host in ipv4_strategy(), suffix in "[a-zA-Z*]{1,5}") {
        prop_assert_eq!(extract_port(&format!("{host}:{suffix}")), None);
        prop_assert_eq!(extract_port(&host), None);
    }

    /// Property: anything established-only counts is also counted by exclude-time-wait
    #[test]
    fn established_only_is_stricter(state in "[A-Z_-]{1,12}") {
        if StatePolicy::EstablishedOnly.counts(&state) {
            prop_assert!(StatePolicy::ExcludeTimeWait.counts(&state));
        }
    }

    /// Property: exclude-time-wait counts every state except TIME_WAIT
    #[test]
    fn exclude_time_wait_counts_everything_else(state in "[A-Z_]{1,12}") {
        prop_assert_eq!(
            StatePolicy::ExcludeTimeWait.counts(&state),
            state != "TIME_WAIT"
        );
    }
}

#[test]
fn time_wait_is_never_counted() {
    for state in ["TIME_WAIT", "TIME-WAIT"] {
        assert!(!StatePolicy::ExcludeTimeWait.counts(state));
        assert!(!StatePolicy::EstablishedOnly.counts(state));
    }
}

#[test]
fn ss_layout_counts_estab_spelling() {
    let raw = "ESTAB 0 0 10.0.0.1:443 10.0.0.2:8500\nESTAB 0 0 10.0.0.1:444 10.0.0.2:8501\n";
    assert_eq!(
        count_connections(raw, TARGET_PORT, ColumnLayout::SS, StatePolicy::EstablishedOnly),
        1
    );
}
