//! Distance-based [`TravelDataProvider`].

use log::debug;
use wayfarer_core::estimate::haversine_km;
use wayfarer_core::{
    EstimateProfile, Leg, ProviderError, TransportMode, TravelDataProvider, Waypoint,
};

/// Travel data derived from great-circle distance and a per-mode
/// [`EstimateProfile`].
///
/// A mode only serves distances strictly inside its viability range; other
/// pairs yield [`ProviderError::NotFound`] so the optimizer can exclude the
/// mode for that pair.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use wayfarer_core::{ProviderError, TransportMode, TravelDataProvider, Waypoint};
/// use wayfarer_data::EstimatedTravelDataProvider;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let paris = Waypoint::new("par", "Paris", Coord { x: 2.3522, y: 48.8566 })?;
/// let london = Waypoint::new("lon", "London", Coord { x: -0.1276, y: 51.5072 })?;
/// let provider = EstimatedTravelDataProvider::default();
///
/// let train = provider.base_leg(&paris, &london, TransportMode::Train)?;
/// assert!(train.base_cost > 0.0);
/// assert!(matches!(
///     provider.base_leg(&paris, &london, TransportMode::Taxi),
///     Err(ProviderError::NotFound { .. })
/// ));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EstimatedTravelDataProvider {
    profile: EstimateProfile,
}

impl EstimatedTravelDataProvider {
    /// Provider backed by `profile`.
    #[must_use]
    pub const fn new(profile: EstimateProfile) -> Self {
        Self { profile }
    }

    /// Estimation table in use.
    #[must_use]
    pub const fn profile(&self) -> &EstimateProfile {
        &self.profile
    }
}

impl TravelDataProvider for EstimatedTravelDataProvider {
    fn base_leg(
        &self,
        origin: &Waypoint,
        destination: &Waypoint,
        mode: TransportMode,
    ) -> Result<Leg, ProviderError> {
        let distance = haversine_km(origin.location, destination.location);
        if !self.profile.profile(mode).serves(distance) {
            debug!(
                "{mode} does not serve {} -> {} ({distance:.1} km)",
                origin.id, destination.id
            );
            return Err(ProviderError::NotFound {
                origin: origin.id.clone(),
                destination: destination.id.clone(),
                mode,
            });
        }
        Ok(self.profile.estimate_leg(origin, destination, mode))
    }
}
