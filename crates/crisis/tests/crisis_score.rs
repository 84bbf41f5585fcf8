use configuration::CrisisSettings;
use core_types::fixtures::{WalkParams, calm_market, flat, random_walk, snapshot, trending};
use core_types::{AlertLevel, AssetClass, MacroReading};
use crisis::{CrisisAnalyzer, CrisisError};
use proptest::prelude::*;

fn analyzer() -> CrisisAnalyzer {
    CrisisAnalyzer::new(CrisisSettings::default()).unwrap()
}

#[test]
fn single_observation_instrument_is_excluded() {
    let market = calm_market(120).with_instrument(flat("VIX", AssetClass::Index, 1, 14.0));

    let report = analyzer().analyze(&market).unwrap();

    assert_eq!(report.excluded_instruments, vec!["VIX".to_string()]);
    assert!(report.indicators.contains_key("volatility_stress"));
    assert!(report.indicators.contains_key("correlation_breakdown"));
    assert!((0.0..=1.0).contains(&report.crisis_score));
}

#[test]
fn only_short_histories_fail_with_insufficient_indicators() {
    let market = snapshot(vec![
        flat("EUR/USD", AssetClass::Forex, 1, 1.08),
        flat("SPX", AssetClass::Index, 5, 5_000.0),
    ]);

    match analyzer().analyze(&market) {
        Err(CrisisError::InsufficientIndicators { computed, required }) => {
            assert_eq!(computed, 0);
            assert_eq!(required, 2);
        }
        other => panic!("expected InsufficientIndicators, got {other:?}"),
    }
}

#[test]
fn crash_scores_above_calm_market() {
    let calm = analyzer().analyze(&calm_market(120)).unwrap();

    let crash = snapshot(vec![
        trending("EUR/USD", AssetClass::Forex, 120, 1.1, -0.004),
        trending("SPX", AssetClass::Index, 120, 5_200.0, -0.008),
        trending("BTC/USD", AssetClass::Crypto, 120, 68_000.0, -0.012),
        trending("XAU/USD", AssetClass::Metal, 120, 2_300.0, 0.006),
    ])
    .with_macro("credit_spread", MacroReading { value: 6.5, baseline: 3.5, scale: 3.0 });
    let stressed = analyzer().analyze(&crash).unwrap();

    assert!(stressed.indicators["threshold_breach"] > 0.9);
    assert_eq!(stressed.indicators["macro_deviation"], 1.0);
    assert!(stressed.crisis_score > calm.crisis_score);
    assert!(stressed.alert_level >= AlertLevel::Low);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn crisis_score_stays_in_unit_interval(
        seed in 0u64..10_000,
        volatility in 0.001f64..0.08,
        drift in -0.01f64..0.01,
        bars in 31usize..160,
        macro_value in -10.0f64..10.0,
    ) {
        let walk = |symbol: &str, class, offset: u64| random_walk(symbol, class, WalkParams {
            bars,
            drift,
            volatility,
            seed: seed + offset,
            ..WalkParams::default()
        });
        let market = snapshot(vec![
            walk("EUR/USD", AssetClass::Forex, 0),
            walk("BTC/USD", AssetClass::Crypto, 1),
            walk("SPX", AssetClass::Index, 2),
        ])
        .with_macro("rates", MacroReading { value: macro_value, baseline: 0.0, scale: 5.0 });

        let report = analyzer().analyze(&market).unwrap();
        prop_assert!((0.0..=1.0).contains(&report.crisis_score));
        for value in report.indicators.values() {
            prop_assert!((0.0..=1.0).contains(value));
        }
    }
}
