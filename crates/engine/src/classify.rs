use configuration::ClassificationThresholds;
use core_types::{AlertKind, AlertLevel, CrisisReport, MarketAlert, MarketCondition, RiskAssessment};

/// Applies the market-condition rules top-down; the first match wins.
///
/// A missing input never matches its rule. Returns `None` only when both
/// inputs are missing.
pub fn classify(
    crisis_score: Option<f64>,
    var_95: Option<f64>,
    thresholds: &ClassificationThresholds,
) -> Option<MarketCondition> {
    if crisis_score.is_none() && var_95.is_none() {
        return None;
    }
    let score_above = |t: f64| crisis_score.is_some_and(|s| s > t);
    let var_below = |t: f64| var_95.is_some_and(|v| v < t);

    let condition = if score_above(thresholds.crisis_score) || var_below(thresholds.crisis_var_95) {
        MarketCondition::Crisis
    } else if score_above(thresholds.high_risk_score) || var_below(thresholds.high_risk_var_95) {
        MarketCondition::HighRisk
    } else if score_above(thresholds.moderate_risk_score) {
        MarketCondition::ModerateRisk
    } else {
        MarketCondition::Normal
    };
    Some(condition)
}

/// Human-facing alerts derived from the crisis and risk sections.
pub fn market_alerts(
    crisis: Option<&CrisisReport>,
    risk: Option<&RiskAssessment>,
    thresholds: &ClassificationThresholds,
) -> Vec<MarketAlert> {
    let mut alerts = Vec::new();

    if let Some(report) = crisis {
        let score = report.crisis_score;
        if score > thresholds.crisis_score {
            alerts.push(MarketAlert {
                level: AlertLevel::High,
                kind: AlertKind::Crisis,
                message: format!("Crisis score {score:.2} exceeds {}", thresholds.crisis_score),
                value: score,
            });
        } else if score > thresholds.high_risk_score {
            alerts.push(MarketAlert {
                level: AlertLevel::Medium,
                kind: AlertKind::Risk,
                message: format!("Elevated crisis score {score:.2}"),
                value: score,
            });
        }
    }

    if let Some(assessment) = risk {
        if assessment.var_95 < thresholds.crisis_var_95 {
            alerts.push(MarketAlert {
                level: AlertLevel::High,
                kind: AlertKind::Risk,
                message: format!(
                    "Portfolio VaR(95%) of {:.2}% over {} days",
                    assessment.var_95 * 100.0,
                    assessment.horizon_days
                ),
                value: assessment.var_95,
            });
        }
    }

    alerts
}
