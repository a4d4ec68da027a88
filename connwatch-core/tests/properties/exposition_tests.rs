//! Property tests for exposition rendering

use connwatch_core::monitoring::exposition::{is_valid_metric_name, render};
use connwatch_core::monitoring::{MetricStyle, Tally};
use proptest::prelude::*;

fn metric_name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_:][a-zA-Z0-9_:]{0,30}"
}

fn tally_strategy() -> impl Strategy<Value = Tally> {
    prop_oneof![
        any::<u32>().prop_map(|n| Tally::Count(u64::from(n))),
        Just(Tally::Unavailable),
    ]
}

fn style_strategy() -> impl Strategy<Value = MetricStyle> {
    prop_oneof![Just(MetricStyle::PortLabel), Just(MetricStyle::PortInName)]
}

proptest! {
    /// Property: every fragment is exactly HELP, TYPE and one sample line
    #[test]
    fn fragment_has_three_lines(
        name in metric_name_strategy(),
        port in 1u16..,
        tally in tally_strategy(),
        style in style_strategy(),
    ) {
        let text = render(tally, &name, port, style);
        prop_assert!(text.ends_with('\n'));

        let lines: Vec<&str> = text.lines().collect();
        prop_assert_eq!(lines.len(), 3);
        prop_assert!(lines[0].starts_with("# HELP "));
        prop_assert!(lines[1].starts_with("# TYPE "));
        prop_assert!(lines[1].ends_with(" gauge"));
        prop_assert!(!lines[2].starts_with('#'));
    }

    /// Property: the sample value is the count, or -1 when unavailable
    #[test]
    fn sample_value_matches_tally(
        name in metric_name_strategy(),
        port in 1u16..,
        tally in tally_strategy(),
        style in style_strategy(),
    ) {
        let text = render(tally, &name, port, style);
        let sample = text.lines().nth(2).unwrap_or_default();
        let value = sample.rsplit(' ').next().unwrap_or_default();

        let expected = match tally {
            Tally::Count(n) => n.to_string(),
            Tally::Unavailable => "-1".to_string(),
        };
        prop_assert_eq!(value, expected.as_str());
    }

    /// Property: HELP, TYPE and the sample share one metric name in both styles
    #[test]
    fn lines_agree_on_metric_name(
        name in metric_name_strategy(),
        port in 1u16..,
        style in style_strategy(),
    ) {
        let text = render(Tally::Count(1), &name, port, style);
        let lines: Vec<&str> = text.lines().collect();

        let rendered_name = match style {
            MetricStyle::PortLabel => name.clone(),
            MetricStyle::PortInName => format!("{name}_{port}"),
        };
        prop_assert!(is_valid_metric_name(&rendered_name));
        let help_prefix = format!("# HELP {rendered_name} ");
        prop_assert!(lines[0].starts_with(&help_prefix));
        prop_assert_eq!(lines[1], format!("# TYPE {rendered_name} gauge"));

        let sample_prefix = match style {
            MetricStyle::PortLabel => format!("{name}{{port=\"{port}\"}} "),
            MetricStyle::PortInName => format!("{rendered_name} "),
        };
        prop_assert!(lines[2].starts_with(&sample_prefix));
    }

    /// Property: names starting with a digit or containing a dash are rejected
    #[test]
    fn invalid_metric_names_rejected(
        digit in "[0-9]",
        tail in "[a-z_]{0,10}",
    ) {
        let name = format!("{digit}{tail}");
        prop_assert!(!is_valid_metric_name(&name));
        let dashed = format!("a-{tail}");
        prop_assert!(!is_valid_metric_name(&dashed));
    }
}
