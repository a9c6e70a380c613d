use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Non-colour parameters of a transmissive, glass-like surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlassPreset {
    pub metalness: f32,
    pub roughness: f32,
    pub transmission: f32,
    pub opacity: f32,
    pub ior: f32,
    pub thickness: f32,
    pub specular_intensity: f32,
}

impl GlassPreset {
    /// Clear, fully transmissive red glass of the Canada scene.
    pub const CANADA: GlassPreset = GlassPreset {
        metalness: 0.05,
        roughness: 0.0,
        transmission: 1.0,
        opacity: 1.0,
        ior: 1.5,
        thickness: 0.03,
        specular_intensity: 0.8,
    };

    /// Frosted white glass of the Quebec scene.
    pub const QUEBEC: GlassPreset = GlassPreset {
        metalness: 0.05,
        roughness: 0.15,
        transmission: 0.85,
        opacity: 0.9,
        ior: 1.3,
        thickness: 0.03,
        specular_intensity: 0.7,
    };

    /// General purpose tinted glass used for symbols.
    pub const GLASS: GlassPreset = GlassPreset {
        metalness: 0.15,
        roughness: 0.05,
        transmission: 0.75,
        opacity: 0.9,
        ior: 1.3,
        thickness: 0.03,
        specular_intensity: 1.0,
    };

    pub fn by_name(name: &str) -> Option<GlassPreset> {
        match name {
            "canada" => Some(Self::CANADA),
            "quebec" => Some(Self::QUEBEC),
            "glass" => Some(Self::GLASS),
            _ => None,
        }
    }

    /// Name of a built-in preset, or a fingerprint of the parameters for
    /// custom ones.
    pub fn label(&self) -> String {
        match *self {
            p if p == Self::CANADA => "canada".to_string(),
            p if p == Self::QUEBEC => "quebec".to_string(),
            p if p == Self::GLASS => "glass".to_string(),
            p => format!("custom{:08x}", p.fingerprint()),
        }
    }

    /// FNV-1a over the parameter bits; stable across runs.
    fn fingerprint(&self) -> u32 {
        [
            self.metalness,
            self.roughness,
            self.transmission,
            self.opacity,
            self.ior,
            self.thickness,
            self.specular_intensity,
        ]
        .iter()
        .flat_map(|v| v.to_bits().to_le_bytes())
        .fold(0x811c_9dc5u32, |hash, byte| {
            (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
        })
    }

    pub fn material(self, color: Color) -> Material {
        Material {
            base_color: color,
            metalness: self.metalness,
            roughness: self.roughness,
            transmission: self.transmission,
            opacity: self.opacity,
            ior: self.ior,
            thickness: self.thickness,
            specular_intensity: self.specular_intensity,
        }
    }
}

impl Default for GlassPreset {
    fn default() -> Self {
        Self::GLASS
    }
}

/// Immutable surface description shared by every mesh of one colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub base_color: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub transmission: f32,
    pub opacity: f32,
    pub ior: f32,
    pub thickness: f32,
    pub specular_intensity: f32,
}

impl Material {
    pub fn preset(&self) -> GlassPreset {
        GlassPreset {
            metalness: self.metalness,
            roughness: self.roughness,
            transmission: self.transmission,
            opacity: self.opacity,
            ior: self.ior,
            thickness: self.thickness,
            specular_intensity: self.specular_intensity,
        }
    }

    /// Export name built from the preset and the colour, so two presets
    /// sharing a colour stay apart.
    pub fn name(&self) -> String {
        format!("{}_{:06x}", self.preset().label(), self.base_color.to_hex())
    }

    pub fn uniform(&self) -> MaterialUniform {
        let c = self.base_color;
        MaterialUniform {
            base_color: [c.r, c.g, c.b, self.opacity],
            surface: [self.metalness, self.roughness, self.transmission, self.ior],
            extra: [self.thickness, self.specular_intensity, 0.0, 0.0],
        }
    }
}

/// Material block laid out for a uniform buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub surface: [f32; 4],
    pub extra: [f32; 4],
}

/// Hands out one shared material per distinct colour.
#[derive(Debug, Default)]
pub struct MaterialCache {
    preset: GlassPreset,
    entries: RwLock<HashMap<[u32; 3], Arc<Material>>>,
}

impl MaterialCache {
    pub fn new(preset: GlassPreset) -> Self {
        Self {
            preset,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn preset(&self) -> GlassPreset {
        self.preset
    }

    /// Returns the cached material for `color`, creating it on first use.
    pub fn get_or_create(&self, color: Color) -> Arc<Material> {
        let key = color.key();
        if let Some(existing) = self.entries.read().get(&key) {
            return Arc::clone(existing);
        }
        let mut entries = self.entries.write();
        Arc::clone(
            entries
                .entry(key)
                .or_insert_with(|| Arc::new(self.preset.material(color))),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
