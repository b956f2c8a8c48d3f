//! Re-identification risk aggregation over attack families.
//!
//! The attacks themselves run elsewhere; this module turns their success
//! rates into a risk per family and an overall release flag.

use super::models::{
    AttackFamily, AttackInputs, AttackObservation, FamilyRisk, OverallReidentification,
    ReidentificationResult, RiskLevel,
};

fn clamp_rate(family: AttackFamily, name: &str, rate: f64) -> f64 {
    if rate.is_nan() {
        tracing::warn!("{} {} is NaN, treated as 0.0", family, name);
        return 0.0;
    }
    if !(0.0..=1.0).contains(&rate) {
        tracing::warn!("{} {} {} clamped to [0.0, 1.0]", family, name, rate);
    }
    rate.clamp(0.0, 1.0)
}

/// Risk for one family: the attack's advantage over the baseline.
pub fn family_risk(
    family: AttackFamily,
    observation: AttackObservation,
    threshold: f64,
) -> FamilyRisk {
    let attack = clamp_rate(family, "attack_success_rate", observation.attack_success_rate);
    let baseline = clamp_rate(
        family,
        "baseline_success_rate",
        observation.baseline_success_rate,
    );
    let risk = (attack - baseline).max(0.0);

    FamilyRisk {
        attack_success_rate: attack,
        baseline_success_rate: baseline,
        risk,
        safe: risk < threshold,
    }
}

/// Aggregates the three attack families.
pub fn assess_reidentification(inputs: &AttackInputs, threshold: f64) -> ReidentificationResult {
    let [singling_out, linkability, attribute_inference] =
        AttackFamily::ALL.map(|family| family_risk(family, inputs.get(family), threshold));

    let risks = [singling_out.risk, linkability.risk, attribute_inference.risk];
    let max_risk = risks.iter().copied().fold(0.0, f64::max);
    let mean_risk = risks.iter().sum::<f64>() / risks.len() as f64;
    let safe = singling_out.safe && linkability.safe && attribute_inference.safe;

    tracing::debug!(max_risk, mean_risk, safe, "Re-identification risk aggregated");

    ReidentificationResult {
        singling_out,
        linkability,
        attribute_inference,
        threshold,
        overall: OverallReidentification {
            max_risk,
            mean_risk,
            risk_level: RiskLevel::from_risk(max_risk),
            safe,
        },
    }
}
