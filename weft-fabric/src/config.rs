// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Fabric geometry and sizing.
//!
//! Configuration merges three sources, later ones taking priority:
//! compiled-in defaults, an optional TOML file, and `WEFT_`-prefixed
//! environment variables.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use weft_engine::sim_error;
use weft_engine::types::{SimError, SimResult};

use crate::types::{CHANNEL_WIDTH, COMPONENT_WIDTH, TILE_X_WIDTH, TILE_Y_WIDTH};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FabricConfig {
    /// Tile grid width.
    pub tile_cols: u8,
    /// Tile grid height.
    pub tile_rows: u8,
    /// Compute components per tile.
    pub cores_per_tile: u8,
    /// Memory components per tile.
    pub banks_per_tile: u8,
    /// Addressable channels on each component.
    pub channels_per_component: u8,
    /// Receive buffer depth per channel, which is also the credit balance a
    /// sender claiming that channel starts with.
    pub buffer_depth: usize,
    /// Buffer depth on the credit network.
    pub credit_buffer_depth: usize,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            tile_cols: 2,
            tile_rows: 2,
            cores_per_tile: 2,
            banks_per_tile: 2,
            channels_per_component: 4,
            buffer_depth: 4,
            credit_buffer_depth: 4,
        }
    }
}

impl FabricConfig {
    /// Defaults, then `file` (if present), then `WEFT_*` environment
    /// variables.
    pub fn load(file: Option<&str>) -> Result<Self, SimError> {
        let mut figment = Figment::from(Serialized::defaults(FabricConfig::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        let config: FabricConfig = figment
            .merge(Env::prefixed("WEFT_"))
            .extract()
            .map_err(|e| SimError(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult {
        // One coordinate step past each edge must still be encodable, since
        // off-chip traffic is addressed beyond the grid
        if self.tile_cols < 1 || u32::from(self.tile_cols) > (1 << TILE_X_WIDTH) - 1 {
            sim_error!("config: tile_cols {} out of range", self.tile_cols);
        }
        if self.tile_rows < 1 || u32::from(self.tile_rows) > (1 << TILE_Y_WIDTH) - 1 {
            sim_error!("config: tile_rows {} out of range", self.tile_rows);
        }
        let components = u32::from(self.cores_per_tile) + u32::from(self.banks_per_tile);
        if components == 0 || components > (1 << COMPONENT_WIDTH) {
            sim_error!("config: {} components per tile out of range", components);
        }
        if self.channels_per_component == 0
            || u32::from(self.channels_per_component) > (1 << CHANNEL_WIDTH)
        {
            sim_error!(
                "config: channels_per_component {} out of range",
                self.channels_per_component
            );
        }
        if self.buffer_depth == 0 || self.credit_buffer_depth == 0 {
            sim_error!("config: buffer depths must be at least 1");
        }
        Ok(())
    }

    #[must_use]
    pub fn num_tiles(&self) -> usize {
        usize::from(self.tile_cols) * usize::from(self.tile_rows)
    }

    #[must_use]
    pub fn components_per_tile(&self) -> usize {
        usize::from(self.cores_per_tile) + usize::from(self.banks_per_tile)
    }

    #[must_use]
    pub fn endpoints_per_tile(&self) -> usize {
        self.components_per_tile() * usize::from(self.channels_per_component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = FabricConfig::default();
        config.validate().unwrap();
        assert_eq!(config.num_tiles(), 4);
        assert_eq!(config.endpoints_per_tile(), 16);
    }

    #[test]
    fn out_of_range_grid_is_rejected() {
        let config = FabricConfig {
            tile_cols: 8,
            ..FabricConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("tile_cols"));
    }

    #[test]
    fn too_many_components_rejected() {
        let config = FabricConfig {
            cores_per_tile: 10,
            banks_per_tile: 10,
            ..FabricConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
