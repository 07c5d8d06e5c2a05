use crate::dto::HealthRes;

/// Simple health service shared by the API front ends
///
/// This service provides a standardised way to check the health status of the catalog.
#[derive(Clone)]
pub struct HealthService;

impl HealthService {
    /// Static method to check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Wallpaper catalog is alive".into(),
        }
    }
}
