//! Two-tier resource cache: open source files and interpolable surfaces.
//!
//! ```text
//! surface(key)
//!      │
//!      ├─► surface tier hit: return Arc<Surface>
//!      │
//!      └─► miss: layer(ref)
//!               │
//!               ├─► file tier hit: decode layer from the open handle
//!               │
//!               └─► miss: open source, evicting (and closing) the LRU handle
//! ```
//!
//! Each tier sits behind its own lock. File handles never leave the file
//! tier's lock; surfaces are handed out as `Arc`s so callers can use them
//! after the surface tier has evicted them.

mod key;
mod tier;

pub use key::{CachedSurface, SurfaceKey, VectorSurface};
pub use tier::{CacheStats, LruTier};

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use grib_common::{epoch_seconds, DecodedLayer, GribIndexError, LayerRef};
use projection::GridProjection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::{GridProcessorError, Result};
use crate::source::{GribFile, LayerSource};
use crate::surface::Surface;
use crate::vector::VectorFieldSynthesizer;

/// Counters of both tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCacheStats {
    pub files: CacheStats,
    pub surfaces: CacheStats,
}

/// Bounded LRU caches of open files and fitted surfaces.
pub struct ResourceCache {
    source: Arc<dyn LayerSource>,
    files: Mutex<LruTier<String, Box<dyn GribFile>>>,
    surfaces: Mutex<LruTier<SurfaceKey, CachedSurface>>,
    synthesizer: VectorFieldSynthesizer,
}

impl ResourceCache {
    pub fn new(source: Arc<dyn LayerSource>, config: &CacheConfig) -> Result<Self> {
        config.validate().map_err(GridProcessorError::ConfigError)?;
        let files = capacity(config.max_open_files, "max_open_files")?;
        let surfaces = capacity(config.max_surfaces, "max_surfaces")?;
        Ok(Self {
            source,
            files: Mutex::new(LruTier::new(files)),
            surfaces: Mutex::new(LruTier::new(surfaces)),
            synthesizer: VectorFieldSynthesizer::default(),
        })
    }

    fn lock_files(&self) -> MutexGuard<'_, LruTier<String, Box<dyn GribFile>>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_surfaces(&self) -> MutexGuard<'_, LruTier<SurfaceKey, CachedSurface>> {
        self.surfaces.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decode one layer through the file tier.
    ///
    /// A failed open leaves the tier untouched.
    pub fn layer(&self, layer: &LayerRef) -> Result<DecodedLayer> {
        let mut files = self.lock_files();

        if files.get(&layer.source).is_none() {
            let file = self.source.open(&layer.source).map_err(|e| match e {
                GribIndexError::ResourceUnavailable { message, .. } => {
                    GridProcessorError::open_failed(&layer.source, message)
                }
                other => GridProcessorError::open_failed(&layer.source, other.to_string()),
            })?;
            debug!(source = %layer.source, "Opened source file");

            if let Some((locator, mut evicted)) = files.insert(layer.source.clone(), file) {
                evicted.close();
                debug!(source = %locator, "Closed evicted source file");
            }
        }

        let file = files
            .peek_mut(&layer.source)
            .ok_or_else(|| GridProcessorError::open_failed(&layer.source, "handle not cached"))?;
        let count = file.layer_count();
        if layer.index == 0 || layer.index > count {
            return Err(GridProcessorError::LayerOutOfRange {
                locator: layer.source.clone(),
                index: layer.index,
                count,
            });
        }
        Ok(file.layer(layer.index)?)
    }

    /// Entry for `key`, building it on a miss.
    pub fn get(&self, key: &SurfaceKey) -> Result<CachedSurface> {
        if let Some(entry) = self.lock_surfaces().get(key) {
            return Ok(entry.clone());
        }
        debug!(key = %key, "Surface cache miss");

        let entry = match key {
            SurfaceKey::Scalar(layer) => {
                let layer = self.layer(layer)?;
                CachedSurface::Scalar(Arc::new(Surface::from_layer(&layer)?))
            }
            SurfaceKey::VectorPair { u, v } => CachedSurface::Vector(self.build_vector(u, v)?),
            SurfaceKey::VectorDerived { u, v, component } => {
                CachedSurface::Scalar(self.vector(u, v)?.component(*component))
            }
        };

        if let Some((evicted, _)) = self.lock_surfaces().insert(key.clone(), entry.clone()) {
            debug!(key = %evicted, "Evicted surface");
        }
        Ok(entry)
    }

    /// Single surface for a scalar or derived key.
    pub fn surface(&self, key: &SurfaceKey) -> Result<Arc<Surface>> {
        match self.get(key)? {
            CachedSurface::Scalar(surface) => Ok(surface),
            CachedSurface::Vector(_) => Err(GridProcessorError::NotScalar(key.to_string())),
        }
    }

    /// Magnitude/azimuth surfaces of a U/V pair, synthesized once per pair.
    pub fn vector(&self, u: &LayerRef, v: &LayerRef) -> Result<Arc<VectorSurface>> {
        let key = SurfaceKey::VectorPair {
            u: u.clone(),
            v: v.clone(),
        };
        match self.get(&key)? {
            CachedSurface::Vector(pair) => Ok(pair),
            CachedSurface::Scalar(_) => Err(GridProcessorError::NotScalar(key.to_string())),
        }
    }

    fn build_vector(&self, u: &LayerRef, v: &LayerRef) -> Result<Arc<VectorSurface>> {
        let u_layer = self.layer(u)?;
        let v_layer = self.layer(v)?;
        let field = self.synthesizer.synthesize(&u_layer, &v_layer)?;
        let grid = GridProjection::from_layer(&u_layer)?;
        let valid_time = epoch_seconds(&u_layer.valid_time);
        debug!(u = %u, v = %v, "Synthesized vector field");

        Ok(Arc::new(VectorSurface {
            magnitude: Arc::new(Surface::from_grid(grid.clone(), field.magnitude, valid_time)?),
            azimuth: Arc::new(Surface::from_grid(grid, field.azimuth, valid_time)?),
        }))
    }

    pub fn stats(&self) -> ResourceCacheStats {
        ResourceCacheStats {
            files: self.lock_files().stats(),
            surfaces: self.lock_surfaces().stats(),
        }
    }
}

impl Drop for ResourceCache {
    fn drop(&mut self) {
        let files = self.files.get_mut().unwrap_or_else(PoisonError::into_inner);
        while let Some((_, mut file)) = files.pop_lru() {
            file.close();
        }
    }
}

fn capacity(value: usize, name: &str) -> Result<NonZeroUsize> {
    NonZeroUsize::new(value)
        .ok_or_else(|| GridProcessorError::ConfigError(format!("{} must be > 0", name)))
}
