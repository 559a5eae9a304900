//! Mach-dependent drag correction for turbulent skin friction.
//!
//! Reference-temperature method: the wall and reference temperatures rise with local
//! Mach, and the skin friction scales with the reference density/viscosity ratio.

use rf_core::units::constants::SUTHERLAND_S_K;

/// Factor multiplying the raw drag coefficient at local Mach `mach` and static
/// temperature `temperature` [K]. Exactly one at zero Mach.
pub fn drag_correction_factor(mach: f64, temperature: f64) -> f64 {
    let m2 = mach * mach;
    let tw_tinf = 1.0 + 1.78 * m2;
    let tp_tinf = 1.0 + 0.035 * m2 + 0.45 * (tw_tinf - 1.0);
    let tp = tp_tinf * temperature;
    let rp_rinf = tp_tinf.powf(2.5) * (tp + SUTHERLAND_S_K) / (temperature + SUTHERLAND_S_K);
    (1.0 / tp_tinf) * (1.0 / rp_rinf).powf(0.2)
}

pub fn corrected_drag(cd: f64, mach: f64, temperature: f64) -> f64 {
    drag_correction_factor(mach, temperature) * cd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_at_zero_mach() {
        assert_eq!(drag_correction_factor(0.0, 288.15), 1.0);
        assert_eq!(corrected_drag(0.0123, 0.0, 216.65), 0.0123);
    }

    #[test]
    fn correction_reduces_drag_with_mach() {
        let low = drag_correction_factor(0.3, 288.15);
        let high = drag_correction_factor(0.8, 288.15);
        assert!(low < 1.0);
        assert!(high < low);
        assert!(high > 0.0);
    }

    #[test]
    fn symmetric_in_mach_sign() {
        assert_eq!(drag_correction_factor(0.5, 250.0), drag_correction_factor(-0.5, 250.0));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn zero_mach_is_identity(cd in 0.0_f64..1.0, t in 150.0_f64..350.0) {
                prop_assert!((corrected_drag(cd, 0.0, t) - cd).abs() <= 1e-15 * cd.max(1.0));
            }

            #[test]
            fn factor_in_unit_interval(mach in 0.0_f64..3.0, t in 150.0_f64..350.0) {
                let f = drag_correction_factor(mach, t);
                prop_assert!(f > 0.0 && f <= 1.0);
            }
        }
    }
}
