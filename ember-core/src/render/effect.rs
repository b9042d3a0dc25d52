//! Effect selector

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Effects the dispatch loop can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u16)]
pub enum Effect {
    /// Strip blanked, pixel writes still pushed
    #[default]
    None = 0,
    /// Pixel buffer pushed as written over Modbus
    Static = 1,
    /// Simulated fire, recomputed every frame
    Fire = 2,
}

impl Effect {
    /// Decode a selector register value
    pub fn from_register(value: u16) -> Option<Self> {
        match value {
            0 => Some(Effect::None),
            1 => Some(Effect::Static),
            2 => Some(Effect::Fire),
            _ => None,
        }
    }

    /// Selector register value
    pub fn as_register(self) -> u16 {
        self as u16
    }

    /// Check whether the effect recomputes pixels every frame
    pub fn is_animated(self) -> bool {
        matches!(self, Effect::Fire)
    }
}
