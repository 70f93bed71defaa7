use super::status::StressStatus;
use super::SubIndexKind;

/// Closed lookup of farm guidance keyed by the primary driver and its band.
pub fn recommendations(kind: SubIndexKind, status: StressStatus) -> &'static [&'static str] {
    use StressStatus::*;
    use SubIndexKind::*;

    match (kind, status) {
        (WaterStress, Healthy) => &["Soil moisture adequate; continue routine scouting."],
        (WaterStress, Mild) => {
            &["Monitor soil moisture weekly and check the 7-day rainfall outlook."]
        }
        (WaterStress, Moderate) => &[
            "Prioritize irrigation on light or sandy soils where available.",
            "Scout for afternoon leaf rolling as an early drought signal.",
        ],
        (WaterStress, Severe) => &[
            "Irrigate where available, targeting 25 mm per week.",
            "Delay nitrogen side-dress until rainfall returns.",
            "Start documenting moisture stress for crop insurance.",
        ],
        (WaterStress, Critical) => &[
            "Irrigate immediately where available; drought losses are accruing.",
            "Photograph and date drought damage for insurance claims.",
            "Review grain marketing commitments against reduced yield potential.",
        ],
        (HeatStress, Healthy) => &["Canopy temperatures within tolerance; no heat action needed."],
        (HeatStress, Mild) => &["Watch afternoon canopy temperatures over the coming week."],
        (HeatStress, Moderate) => &[
            "Shift irrigation to early morning to cool the canopy.",
            "Scout tassels and silks for heat blast.",
        ],
        (HeatStress, Severe) => &[
            "Schedule irrigation ahead of forecast heat waves.",
            "Check pollination success by inspecting silk browning and ear tips.",
        ],
        (HeatStress, Critical) => &[
            "Expect kernel abortion; inspect ears for incomplete pollination.",
            "Update yield estimates and notify your crop insurance agent.",
        ],
        (VegetationHealth, Healthy) => &["Canopy development on track for the growth stage."],
        (VegetationHealth, Mild) => {
            &["Compare field NDVI with neighbouring fields to locate weak zones."]
        }
        (VegetationHealth, Moderate) => &[
            "Ground-truth low-NDVI zones for nutrient deficiency or disease.",
            "Pull tissue samples to confirm nitrogen status.",
        ],
        (VegetationHealth, Severe) => &[
            "Scout low-vigour areas for disease, insect pressure, or stand loss.",
            "Evaluate a rescue nitrogen application if deficiency is confirmed.",
        ],
        (VegetationHealth, Critical) => &[
            "Assess stand loss and replant options with an agronomist.",
            "File a notice of loss if damage is confirmed.",
        ],
        (AtmosphericStress, Healthy) => &["Evaporative demand normal."],
        (AtmosphericStress, Mild) => {
            &["Evaporative demand rising; keep an eye on soil moisture reserves."]
        }
        (AtmosphericStress, Moderate) => {
            &["Plan irrigation to keep pace with elevated crop water use."]
        }
        (AtmosphericStress, Severe) => &[
            "Increase irrigation frequency; demand is outpacing typical supply.",
            "Avoid foliar applications during hot, dry afternoons.",
        ],
        (AtmosphericStress, Critical) => &[
            "Irrigate at night to limit evaporative losses.",
            "Monitor soil moisture daily; depletion will be rapid.",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_driver_and_band_has_guidance() {
        for kind in SubIndexKind::priority_order() {
            for status in StressStatus::ordered() {
                let advice = recommendations(kind, status);
                assert!(!advice.is_empty(), "{kind:?}/{status:?} has no guidance");
                assert!(advice.iter().all(|line| !line.trim().is_empty()));
            }
        }
    }

    #[test]
    fn severe_drought_guidance_mentions_irrigation() {
        let advice = recommendations(SubIndexKind::WaterStress, StressStatus::Severe);
        assert!(advice[0].contains("Irrigate"));
    }
}
