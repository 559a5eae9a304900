//! Rotor blade geometry.

use crate::error::{BemtError, BemtResult};
use rf_airfoils::PolarSet;
use rf_core::numeric::{linspace, strictly_increasing};
use rf_core::units::{Angle, Length, Velocity};
use rf_core::AirfoilId;
use std::f64::consts::PI;

/// Default number of azimuth stations used by the blade-element branch.
pub const DEFAULT_AZIMUTH_STATIONS: usize = 24;

/// Slack allowed when checking stations against `[hub/tip, 1]`.
const STATION_BOUND_SLACK: f64 = 1e-12;

/// Rotation sense of the rotor, used to orient injected wake velocities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    Positive,
    Negative,
}

impl Rotation {
    pub fn sign(self) -> f64 {
        match self {
            Rotation::Positive => 1.0,
            Rotation::Negative => -1.0,
        }
    }
}

/// Which load model produces the sectional forces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FidelityMode {
    /// Azimuth-averaged BEMT stations.
    #[default]
    Bemt,
    /// Azimuthally resolved blade-element loads on top of the converged BEMT inflow.
    BladeElement,
}

/// Validated, immutable rotor blade geometry.
///
/// Radial stations are stored normalized by tip radius. Twist and pitch are in radians,
/// chord and radii in meters.
#[derive(Clone, Debug)]
pub struct BladeGeometry {
    blade_count: u32,
    tip_radius: f64,
    hub_radius: f64,
    stations: Vec<f64>,
    twist: Vec<f64>,
    chord: Vec<f64>,
    airfoils: Vec<AirfoilId>,
    pitch_command: f64,
    thrust_angle: f64,
    rotation: Rotation,
    mode: FidelityMode,
    azimuth_stations: usize,
    induced_hover_velocity: f64,
    origin: [f64; 3],
}

impl BladeGeometry {
    /// Start building a geometry with the required scalar dimensions.
    pub fn builder(blade_count: u32, tip_radius: Length, hub_radius: Length) -> BladeGeometryBuilder {
        BladeGeometryBuilder::new(blade_count, tip_radius, hub_radius)
    }

    pub fn blade_count(&self) -> u32 {
        self.blade_count
    }

    /// Tip radius [m]
    pub fn tip_radius(&self) -> f64 {
        self.tip_radius
    }

    /// Hub radius [m]
    pub fn hub_radius(&self) -> f64 {
        self.hub_radius
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// Normalized radial stations r/R.
    pub fn stations(&self) -> &[f64] {
        &self.stations
    }

    /// Dimensional station radii [m].
    pub fn radii(&self) -> Vec<f64> {
        self.stations.iter().map(|chi| chi * self.tip_radius).collect()
    }

    /// Twist per station [rad], excluding the pitch command.
    pub fn twist(&self) -> &[f64] {
        &self.twist
    }

    /// Chord per station [m].
    pub fn chord(&self) -> &[f64] {
        &self.chord
    }

    pub fn airfoils(&self) -> &[AirfoilId] {
        &self.airfoils
    }

    /// Collective pitch command [rad]
    pub fn pitch_command(&self) -> f64 {
        self.pitch_command
    }

    /// Twist plus pitch command per station [rad].
    pub fn total_pitch(&self) -> Vec<f64> {
        self.twist.iter().map(|t| t + self.pitch_command).collect()
    }

    /// Thrust-line tilt relative to the body x axis [rad]
    pub fn thrust_angle(&self) -> f64 {
        self.thrust_angle
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn mode(&self) -> FidelityMode {
        self.mode
    }

    pub fn azimuth_station_count(&self) -> usize {
        self.azimuth_stations
    }

    /// Azimuth stations `linspace(0, 2π, Na)` [rad].
    pub fn azimuths(&self) -> Vec<f64> {
        linspace(0.0, 2.0 * PI, self.azimuth_stations)
    }

    /// Hover induced velocity added (twice) to the axial velocity [m/s]
    pub fn induced_hover_velocity(&self) -> f64 {
        self.induced_hover_velocity
    }

    /// Rotor hub location used when sampling an injected wake field [m].
    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    /// Radial element width [m], taken from the first two stations.
    pub fn delta_r(&self) -> f64 {
        (self.stations[1] - self.stations[0]) * self.tip_radius
    }

    /// Check that every station's airfoil is registered in `polars`.
    pub fn check_airfoils(&self, polars: &PolarSet) -> BemtResult<()> {
        for &id in &self.airfoils {
            polars.get(id)?;
        }
        Ok(())
    }
}

/// Builder for [`BladeGeometry`]; all checks run in [`BladeGeometryBuilder::build`].
#[derive(Clone, Debug)]
pub struct BladeGeometryBuilder {
    blade_count: u32,
    tip_radius: f64,
    hub_radius: f64,
    stations: Option<Vec<f64>>,
    station_count: Option<usize>,
    twist: Distribution,
    chord: Distribution,
    airfoils: Option<Vec<AirfoilId>>,
    uniform_airfoil: AirfoilId,
    pitch_command: f64,
    thrust_angle: f64,
    rotation: Rotation,
    mode: FidelityMode,
    azimuth_stations: usize,
    induced_hover_velocity: f64,
    origin: [f64; 3],
}

#[derive(Clone, Debug)]
enum Distribution {
    Unset,
    Uniform(f64),
    PerStation(Vec<f64>),
}

impl Distribution {
    fn len(&self) -> Option<usize> {
        match self {
            Distribution::PerStation(v) => Some(v.len()),
            _ => None,
        }
    }

    fn resolve(&self, n: usize, what: &str) -> BemtResult<Vec<f64>> {
        match self {
            Distribution::Unset => Err(BemtError::InvalidGeometry {
                what: format!("{what} distribution not set"),
            }),
            Distribution::Uniform(v) => Ok(vec![*v; n]),
            Distribution::PerStation(v) if v.len() == n => Ok(v.clone()),
            Distribution::PerStation(v) => Err(BemtError::InvalidGeometry {
                what: format!("{what} has {} values for {n} stations", v.len()),
            }),
        }
    }
}

impl BladeGeometryBuilder {
    pub fn new(blade_count: u32, tip_radius: Length, hub_radius: Length) -> Self {
        Self {
            blade_count,
            tip_radius: tip_radius.value,
            hub_radius: hub_radius.value,
            stations: None,
            station_count: None,
            twist: Distribution::Unset,
            chord: Distribution::Unset,
            airfoils: None,
            uniform_airfoil: AirfoilId::from_index(0),
            pitch_command: 0.0,
            thrust_angle: 0.0,
            rotation: Rotation::Positive,
            mode: FidelityMode::Bemt,
            azimuth_stations: DEFAULT_AZIMUTH_STATIONS,
            induced_hover_velocity: 0.0,
            origin: [0.0; 3],
        }
    }

    /// Normalized radial stations r/R, strictly increasing in `[hub/tip, 1]`.
    pub fn stations(mut self, stations: Vec<f64>) -> Self {
        self.stations = Some(stations);
        self
    }

    /// Number of stations when no explicit distribution is given.
    ///
    /// Stations then default to `linspace(hub/tip, 1, n + 1)` without the tip point.
    pub fn station_count(mut self, n: usize) -> Self {
        self.station_count = Some(n);
        self
    }

    /// Per-station twist [rad].
    pub fn twist(mut self, twist: Vec<f64>) -> Self {
        self.twist = Distribution::PerStation(twist);
        self
    }

    pub fn uniform_twist(mut self, twist: Angle) -> Self {
        self.twist = Distribution::Uniform(twist.value);
        self
    }

    /// Per-station chord [m].
    pub fn chord(mut self, chord: Vec<f64>) -> Self {
        self.chord = Distribution::PerStation(chord);
        self
    }

    pub fn uniform_chord(mut self, chord: Length) -> Self {
        self.chord = Distribution::Uniform(chord.value);
        self
    }

    /// Per-station airfoil assignment.
    pub fn airfoils(mut self, airfoils: Vec<AirfoilId>) -> Self {
        self.airfoils = Some(airfoils);
        self
    }

    /// Same airfoil at every station (the default is id 0).
    pub fn uniform_airfoil(mut self, airfoil: AirfoilId) -> Self {
        self.airfoils = None;
        self.uniform_airfoil = airfoil;
        self
    }

    pub fn pitch_command(mut self, pitch: Angle) -> Self {
        self.pitch_command = pitch.value;
        self
    }

    pub fn thrust_angle(mut self, angle: Angle) -> Self {
        self.thrust_angle = angle.value;
        self
    }

    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn mode(mut self, mode: FidelityMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn azimuth_stations(mut self, n: usize) -> Self {
        self.azimuth_stations = n;
        self
    }

    pub fn induced_hover_velocity(mut self, v: Velocity) -> Self {
        self.induced_hover_velocity = v.value;
        self
    }

    pub fn origin(mut self, origin: [Length; 3]) -> Self {
        self.origin = origin.map(|l| l.value);
        self
    }

    fn resolve_station_count(&self) -> BemtResult<usize> {
        if let Some(stations) = &self.stations {
            return Ok(stations.len());
        }
        if let Some(n) = self.chord.len().or(self.twist.len()) {
            return Ok(n);
        }
        if let Some(airfoils) = &self.airfoils {
            return Ok(airfoils.len());
        }
        self.station_count.ok_or_else(|| BemtError::InvalidGeometry {
            what: "station count cannot be inferred".to_string(),
        })
    }

    /// Validate and freeze the geometry.
    ///
    /// # Errors
    /// Returns `InvalidGeometry` for zero blades, non-positive or inverted radii, fewer
    /// than two stations, non-monotonic or out-of-range stations, distribution length
    /// mismatches, non-positive chord, non-finite angles, or fewer than two azimuths.
    pub fn build(self) -> BemtResult<BladeGeometry> {
        let invalid = |what: String| -> BemtResult<BladeGeometry> {
            Err(BemtError::InvalidGeometry { what })
        };

        if self.blade_count == 0 {
            return invalid("blade count must be at least 1".to_string());
        }
        if !(self.tip_radius.is_finite() && self.tip_radius > 0.0) {
            return invalid(format!("tip radius must be positive, got {}", self.tip_radius));
        }
        if !(self.hub_radius.is_finite() && self.hub_radius >= 0.0 && self.hub_radius < self.tip_radius) {
            return invalid(format!(
                "hub radius must lie in [0, tip), got {} for tip {}",
                self.hub_radius, self.tip_radius
            ));
        }

        let n = self.resolve_station_count()?;
        if n < 2 {
            return invalid(format!("at least 2 radial stations required, got {n}"));
        }

        let chi_hub = self.hub_radius / self.tip_radius;
        let stations = match &self.stations {
            Some(s) => s.clone(),
            None => {
                let mut chi = linspace(chi_hub, 1.0, n + 1);
                chi.truncate(n);
                chi
            }
        };
        if stations.iter().any(|c| !c.is_finite()) {
            return invalid("radial stations must be finite".to_string());
        }
        if !strictly_increasing(&stations) {
            return invalid("radial stations must be strictly increasing".to_string());
        }
        if stations[0] < chi_hub - STATION_BOUND_SLACK || stations[n - 1] > 1.0 + STATION_BOUND_SLACK {
            return invalid(format!(
                "radial stations must lie in [{chi_hub}, 1], got [{}, {}]",
                stations[0],
                stations[n - 1]
            ));
        }

        let twist = self.twist.resolve(n, "twist")?;
        let chord = self.chord.resolve(n, "chord")?;
        if twist.iter().any(|t| !t.is_finite()) {
            return invalid("twist must be finite".to_string());
        }
        if chord.iter().any(|c| !(c.is_finite() && *c > 0.0)) {
            return invalid("chord must be positive".to_string());
        }

        let airfoils = match self.airfoils {
            Some(a) if a.len() == n => a,
            Some(a) => {
                return invalid(format!("airfoil assignment has {} entries for {n} stations", a.len()));
            }
            None => vec![self.uniform_airfoil; n],
        };

        if !self.pitch_command.is_finite() || !self.thrust_angle.is_finite() {
            return invalid("pitch command and thrust angle must be finite".to_string());
        }
        if self.azimuth_stations < 2 {
            return invalid(format!(
                "at least 2 azimuth stations required, got {}",
                self.azimuth_stations
            ));
        }
        if !self.induced_hover_velocity.is_finite() {
            return invalid("induced hover velocity must be finite".to_string());
        }
        if self.origin.iter().any(|o| !o.is_finite()) {
            return invalid("origin must be finite".to_string());
        }

        Ok(BladeGeometry {
            blade_count: self.blade_count,
            tip_radius: self.tip_radius,
            hub_radius: self.hub_radius,
            stations,
            twist,
            chord,
            airfoils,
            pitch_command: self.pitch_command,
            thrust_angle: self.thrust_angle,
            rotation: self.rotation,
            mode: self.mode,
            azimuth_stations: self.azimuth_stations,
            induced_hover_velocity: self.induced_hover_velocity,
            origin: self.origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_airfoils::ConstantPolar;
    use rf_core::units::{deg, m};

    fn base() -> BladeGeometryBuilder {
        BladeGeometry::builder(2, m(1.0), m(0.1))
            .station_count(10)
            .uniform_chord(m(0.1))
            .uniform_twist(deg(10.0))
    }

    #[test]
    fn default_stations_exclude_tip() {
        let g = base().build().unwrap();
        assert_eq!(g.station_count(), 10);
        assert!((g.stations()[0] - 0.1).abs() < 1e-15);
        assert!((g.stations()[9] - 0.91).abs() < 1e-12);
        assert!((g.delta_r() - 0.09).abs() < 1e-12);
        assert_eq!(g.azimuths().len(), DEFAULT_AZIMUTH_STATIONS);
    }

    #[test]
    fn total_pitch_adds_command() {
        let g = base().pitch_command(deg(5.0)).build().unwrap();
        let expected = 15.0_f64.to_radians();
        assert!(g.total_pitch().iter().all(|p| (p - expected).abs() < 1e-12));
    }

    #[test]
    fn rejects_zero_blades() {
        let err = BladeGeometry::builder(0, m(1.0), m(0.1))
            .station_count(4)
            .uniform_chord(m(0.1))
            .uniform_twist(deg(0.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, BemtError::InvalidGeometry { .. }));
    }

    #[test]
    fn rejects_non_monotonic_stations() {
        let err = base()
            .stations(vec![0.2, 0.5, 0.4, 0.9])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn rejects_stations_inside_hub() {
        let err = base().stations(vec![0.05, 0.5, 1.0]).build().unwrap_err();
        assert!(err.to_string().contains("must lie in"));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = base()
            .stations(vec![0.2, 0.5, 0.9])
            .chord(vec![0.1, 0.1])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("chord"));
    }

    #[test]
    fn rejects_hub_outside_tip() {
        assert!(
            BladeGeometry::builder(3, m(1.0), m(1.0))
                .station_count(4)
                .uniform_chord(m(0.1))
                .uniform_twist(deg(0.0))
                .build()
                .is_err()
        );
    }

    #[test]
    fn check_airfoils_against_set() {
        let mut set = PolarSet::new();
        let g = base().build().unwrap();
        assert!(g.check_airfoils(&set).is_err());
        set.insert(Box::new(ConstantPolar::new("flat", 0.5, 0.02)));
        assert!(g.check_airfoils(&set).is_ok());
    }

    #[test]
    fn rotation_sign() {
        assert_eq!(Rotation::Positive.sign(), 1.0);
        assert_eq!(Rotation::Negative.sign(), -1.0);
    }
}
