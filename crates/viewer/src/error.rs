use catalog::CatalogError;
use foundation::math::GeoError;
use scene::host::HostError;

use crate::config::ConfigError;

#[derive(Debug)]
pub enum ViewerError {
    Config(ConfigError),
    Catalog(CatalogError),
    Geo(GeoError),
    Host(HostError),
}

impl std::fmt::Display for ViewerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewerError::Config(e) => write!(f, "{e}"),
            ViewerError::Catalog(e) => write!(f, "{e}"),
            ViewerError::Geo(e) => write!(f, "marker placement failed: {e}"),
            ViewerError::Host(e) => write!(f, "scene host: {e}"),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewerError::Config(e) => Some(e),
            ViewerError::Catalog(e) => Some(e),
            ViewerError::Geo(e) => Some(e),
            ViewerError::Host(e) => Some(e),
        }
    }
}

impl From<ConfigError> for ViewerError {
    fn from(e: ConfigError) -> Self {
        ViewerError::Config(e)
    }
}

impl From<CatalogError> for ViewerError {
    fn from(e: CatalogError) -> Self {
        ViewerError::Catalog(e)
    }
}

impl From<GeoError> for ViewerError {
    fn from(e: GeoError) -> Self {
        ViewerError::Geo(e)
    }
}

impl From<HostError> for ViewerError {
    fn from(e: HostError) -> Self {
        ViewerError::Host(e)
    }
}
