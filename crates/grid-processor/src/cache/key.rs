//! Surface-tier keys and entries.

use std::fmt;
use std::sync::Arc;

use grib_common::LayerRef;

use crate::surface::Surface;
use crate::vector::VectorComponent;

/// Address of a cached surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SurfaceKey {
    /// One decoded layer
    Scalar(LayerRef),
    /// A U/V pair with both derived fields
    VectorPair { u: LayerRef, v: LayerRef },
    /// One derived field of a U/V pair
    VectorDerived {
        u: LayerRef,
        v: LayerRef,
        component: VectorComponent,
    },
}

impl SurfaceKey {
    pub fn scalar(layer: LayerRef) -> Self {
        Self::Scalar(layer)
    }

    pub fn derived(u: LayerRef, v: LayerRef, component: VectorComponent) -> Self {
        Self::VectorDerived { u, v, component }
    }
}

impl fmt::Display for SurfaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceKey::Scalar(layer) => write!(f, "{}", layer),
            SurfaceKey::VectorPair { u, v } => write!(f, "({}, {})", u, v),
            SurfaceKey::VectorDerived { u, v, component } => {
                write!(f, "{}({}, {})", component, u, v)
            }
        }
    }
}

/// Magnitude and azimuth surfaces of one U/V pair, on the U grid.
#[derive(Debug)]
pub struct VectorSurface {
    pub magnitude: Arc<Surface>,
    pub azimuth: Arc<Surface>,
}

impl VectorSurface {
    pub fn component(&self, component: VectorComponent) -> Arc<Surface> {
        match component {
            VectorComponent::Magnitude => Arc::clone(&self.magnitude),
            VectorComponent::Azimuth => Arc::clone(&self.azimuth),
        }
    }
}

/// A surface-tier entry.
#[derive(Debug, Clone)]
pub enum CachedSurface {
    Scalar(Arc<Surface>),
    Vector(Arc<VectorSurface>),
}
