// rf-core/src/units.rs

use uom::si::f64::{
    Angle as UomAngle, AngularVelocity as UomAngularVelocity,
    DynamicViscosity as UomDynamicViscosity, Force as UomForce, Length as UomLength,
    MassDensity as UomMassDensity, Power as UomPower,
    ThermodynamicTemperature as UomThermodynamicTemperature,
    Torque as UomTorque, Velocity as UomVelocity,
};

// Public canonical unit types (SI, f64)
pub type Angle = UomAngle;
pub type AngularVelocity = UomAngularVelocity;
pub type DynVisc = UomDynamicViscosity;
pub type Force = UomForce;
pub type Length = UomLength;
pub type Density = UomMassDensity;
pub type Power = UomPower;
pub type Temperature = UomThermodynamicTemperature;
pub type Torque = UomTorque;
pub type Velocity = UomVelocity;

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn rad(v: f64) -> Angle {
    use uom::si::angle::radian;
    Angle::new::<radian>(v)
}

#[inline]
pub fn deg(v: f64) -> Angle {
    use uom::si::angle::degree;
    Angle::new::<degree>(v)
}

#[inline]
pub fn rad_per_s(v: f64) -> AngularVelocity {
    use uom::si::angular_velocity::radian_per_second;
    AngularVelocity::new::<radian_per_second>(v)
}

#[inline]
pub fn kg_per_m3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

#[inline]
pub fn pa_s(v: f64) -> DynVisc {
    use uom::si::dynamic_viscosity::pascal_second;
    DynVisc::new::<pascal_second>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn newtons(v: f64) -> Force {
    use uom::si::force::newton;
    Force::new::<newton>(v)
}

#[inline]
pub fn newton_meters(v: f64) -> Torque {
    use uom::si::torque::newton_meter;
    Torque::new::<newton_meter>(v)
}

#[inline]
pub fn watts(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

pub mod constants {
    pub const G0_MPS2: f64 = 9.806_65;

    /// Specific gas constant of dry air [J/(kg·K)]
    pub const R_AIR: f64 = 287.052_87;

    /// Ratio of specific heats for air
    pub const GAMMA_AIR: f64 = 1.4;

    pub const SEA_LEVEL_TEMPERATURE_K: f64 = 288.15;
    pub const SEA_LEVEL_PRESSURE_PA: f64 = 101_325.0;

    /// Sutherland's constant for air [K]
    pub const SUTHERLAND_S_K: f64 = 110.4;
}
