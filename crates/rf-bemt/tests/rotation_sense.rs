//! Reversing the rotor spin flips thrust and leaves the coefficients alone.

use nalgebra::Vector3;
use proptest::prelude::*;
use rf_airfoils::{ConstantPolar, PolarSet};
use rf_bemt::{BladeGeometry, OperatingCondition, spin};
use rf_core::units::{deg, m, rad_per_s};

fn setup() -> (BladeGeometry, PolarSet) {
    let geometry = BladeGeometry::builder(3, m(0.6), m(0.08))
        .station_count(12)
        .uniform_chord(m(0.05))
        .uniform_twist(deg(14.0))
        .build()
        .unwrap();
    let mut polars = PolarSet::new();
    polars.insert(Box::new(ConstantPolar::new("flat", 0.6, 0.015)));
    (geometry, polars)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn negating_omega_negates_thrust(omega in 60.0_f64..400.0, v in 0.0_f64..15.0) {
        let (geometry, polars) = setup();
        let base = OperatingCondition::sea_level().with_velocity(Vector3::new(v, 0.0, 0.0));
        let fwd = spin(&geometry, &polars, &[base.clone().with_omega(rad_per_s(omega))]).unwrap();
        let rev = spin(&geometry, &polars, &[base.with_omega(rad_per_s(-omega))]).unwrap();

        let (f, r) = (&fwd.performance[0], &rev.performance[0]);
        prop_assert_eq!(r.thrust.value, -f.thrust.value);
        prop_assert_eq!(r.torque.value, f.torque.value);
        prop_assert_eq!(r.power.value, f.power.value);
        prop_assert_eq!(r.thrust_coefficient, f.thrust_coefficient);
        prop_assert_eq!(r.torque_coefficient, f.torque_coefficient);
        prop_assert_eq!(r.power_coefficient, f.power_coefficient);
    }
}
