//! Holding-register map
//!
//! | Address      | Access | Meaning                                  |
//! |--------------|--------|------------------------------------------|
//! | 0x0000       | RW     | effect selector (0 none, 1 static, 2 fire) |
//! | 0x0001       | W      | non-zero: forced refresh                 |
//! | 0x0002       | R      | pixel count                              |
//! | 0x0003       | RW     | fire cooling                             |
//! | 0x0004       | RW     | fire sparking                            |
//! | 0x0100 + 2i  | RW     | pixel i, red (high byte) and green       |
//! | 0x0101 + 2i  | RW     | pixel i, blue (low byte)                 |
//!
//! Register access happens inside [`Protocol::advance`], i.e. with
//! interrupts disabled. Pixel writes go straight into the strip buffer and
//! raise `updated`; selector and refresh writes are only recorded in the
//! [`ControlBlock`] and applied by the dispatch loop.
//!
//! [`Protocol::advance`]: crate::traits::Protocol::advance

use ember_rtu::{ExceptionCode, RegisterBank};

use crate::render::{Effect, RenderState};
use crate::traits::{LedStrip, Rgb};

/// Effect selector
pub const REG_EFFECT: u16 = 0x0000;
/// Forced refresh trigger
pub const REG_REFRESH: u16 = 0x0001;
/// Pixel count
pub const REG_PIXEL_COUNT: u16 = 0x0002;
/// Fire cooling
pub const REG_COOLING: u16 = 0x0003;
/// Fire sparking
pub const REG_SPARKING: u16 = 0x0004;
/// First pixel register
pub const REG_PIXEL_BASE: u16 = 0x0100;

/// Deferred requests written over Modbus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlBlock {
    effect: Effect,
    refresh: bool,
    dirty: bool,
}

impl Default for ControlBlock {
    fn default() -> Self {
        Self::new(Effect::None)
    }
}

impl ControlBlock {
    /// Control block selecting `effect`, nothing pending
    pub const fn new(effect: Effect) -> Self {
        Self {
            effect,
            refresh: false,
            dirty: false,
        }
    }

    /// Most recently requested effect
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// Record an effect request
    pub fn request_effect(&mut self, effect: Effect) {
        self.effect = effect;
        self.dirty = true;
    }

    /// Record a forced refresh request
    pub fn request_refresh(&mut self) {
        self.refresh = true;
        self.dirty = true;
    }

    /// Check whether anything changed since the last [`take_dirty`](Self::take_dirty)
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consume the change marker
    pub fn take_dirty(&mut self) -> bool {
        core::mem::take(&mut self.dirty)
    }

    /// Consume a pending refresh request
    pub fn take_refresh(&mut self) -> bool {
        core::mem::take(&mut self.refresh)
    }
}

/// Register view over the strip and control block
pub struct RegisterMap<'a, S> {
    strip: &'a mut S,
    control: &'a mut ControlBlock,
    render: &'a RenderState,
}

impl<'a, S: LedStrip> RegisterMap<'a, S> {
    /// Borrow the state backing the registers
    pub fn new(strip: &'a mut S, control: &'a mut ControlBlock, render: &'a RenderState) -> Self {
        Self {
            strip,
            control,
            render,
        }
    }

    fn pixel_slot(&self, address: u16) -> Result<(usize, bool), ExceptionCode> {
        let offset = (address - REG_PIXEL_BASE) as usize;
        let index = offset / 2;
        if index >= self.strip.len() {
            return Err(ExceptionCode::IllegalDataAddress);
        }
        Ok((index, offset % 2 == 0))
    }

    fn pixel(&self, index: usize) -> Result<Rgb, ExceptionCode> {
        self.strip
            .pixel(index)
            .ok_or(ExceptionCode::IllegalDataAddress)
    }
}

fn byte_value(value: u16) -> Result<u8, ExceptionCode> {
    u8::try_from(value).map_err(|_| ExceptionCode::IllegalDataValue)
}

impl<S: LedStrip> RegisterBank for RegisterMap<'_, S> {
    fn read_holding(&mut self, address: u16) -> Result<u16, ExceptionCode> {
        match address {
            REG_EFFECT => Ok(self.control.effect().as_register()),
            REG_REFRESH => Ok(0),
            REG_PIXEL_COUNT => Ok(self.strip.len() as u16),
            REG_COOLING => Ok(self.strip.fire_params().cooling as u16),
            REG_SPARKING => Ok(self.strip.fire_params().sparking as u16),
            REG_PIXEL_BASE..=u16::MAX => {
                let (index, high) = self.pixel_slot(address)?;
                let px = self.pixel(index)?;
                Ok(if high {
                    u16::from_be_bytes([px.r, px.g])
                } else {
                    px.b as u16
                })
            }
            _ => Err(ExceptionCode::IllegalDataAddress),
        }
    }

    fn write_holding(&mut self, address: u16, value: u16) -> Result<(), ExceptionCode> {
        self.check_write(address, value)?;
        match address {
            REG_EFFECT => {
                let effect = Effect::from_register(value).ok_or(ExceptionCode::IllegalDataValue)?;
                self.control.request_effect(effect);
            }
            REG_REFRESH => {
                if value != 0 {
                    self.control.request_refresh();
                }
            }
            REG_COOLING => {
                let mut params = self.strip.fire_params();
                params.cooling = byte_value(value)?;
                self.strip.set_fire_params(params);
            }
            REG_SPARKING => {
                let mut params = self.strip.fire_params();
                params.sparking = byte_value(value)?;
                self.strip.set_fire_params(params);
            }
            REG_PIXEL_BASE..=u16::MAX => {
                let (index, high) = self.pixel_slot(address)?;
                let mut px = self.pixel(index)?;
                if high {
                    let [r, g] = value.to_be_bytes();
                    px.r = r;
                    px.g = g;
                } else {
                    px.b = byte_value(value)?;
                }
                self.strip
                    .set_pixel(index, px)
                    .map_err(|_| ExceptionCode::IllegalDataAddress)?;
                self.render.mark_updated();
            }
            _ => return Err(ExceptionCode::IllegalDataAddress),
        }
        Ok(())
    }

    fn check_write(&self, address: u16, value: u16) -> Result<(), ExceptionCode> {
        match address {
            REG_EFFECT => Effect::from_register(value)
                .map(|_| ())
                .ok_or(ExceptionCode::IllegalDataValue),
            REG_REFRESH => Ok(()),
            REG_COOLING | REG_SPARKING => byte_value(value).map(|_| ()),
            REG_PIXEL_BASE..=u16::MAX => {
                let (_, high) = self.pixel_slot(address)?;
                if !high {
                    byte_value(value)?;
                }
                Ok(())
            }
            _ => Err(ExceptionCode::IllegalDataAddress),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockStrip;
    use super::*;

    struct Fixture {
        strip: MockStrip,
        control: ControlBlock,
        render: RenderState,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                strip: MockStrip::default(),
                control: ControlBlock::default(),
                render: RenderState::new(),
            }
        }

        fn map(&mut self) -> RegisterMap<'_, MockStrip> {
            RegisterMap::new(&mut self.strip, &mut self.control, &self.render)
        }
    }

    #[test]
    fn test_pixel_write_raises_updated() {
        let mut f = Fixture::new();
        f.map().write_holding(REG_PIXEL_BASE + 2, 0x1122).unwrap();
        f.map().write_holding(REG_PIXEL_BASE + 3, 0x0033).unwrap();

        assert_eq!(f.strip.pixels[1], Rgb::new(0x11, 0x22, 0x33));
        assert!(f.render.is_updated());
        assert!(!f.control.is_dirty());
        assert_eq!(f.map().read_holding(REG_PIXEL_BASE + 2), Ok(0x1122));
        assert_eq!(f.map().read_holding(REG_PIXEL_BASE + 3), Ok(0x0033));
    }

    #[test]
    fn test_pixel_out_of_range() {
        let mut f = Fixture::new();
        assert_eq!(
            f.map().read_holding(REG_PIXEL_BASE + 8),
            Err(ExceptionCode::IllegalDataAddress)
        );
        assert_eq!(
            f.map().write_holding(REG_PIXEL_BASE + 1, 0x0100),
            Err(ExceptionCode::IllegalDataValue)
        );
    }

    #[test]
    fn test_effect_write_sets_dirty() {
        let mut f = Fixture::new();
        f.map().write_holding(REG_EFFECT, 2).unwrap();

        assert_eq!(f.control.effect(), Effect::Fire);
        assert!(f.control.take_dirty());
        assert!(!f.control.take_dirty());
        assert_eq!(f.map().read_holding(REG_EFFECT), Ok(2));
    }

    #[test]
    fn test_bad_effect_value() {
        let mut f = Fixture::new();
        assert_eq!(
            f.map().write_holding(REG_EFFECT, 9),
            Err(ExceptionCode::IllegalDataValue)
        );
        assert!(!f.control.is_dirty());
    }

    #[test]
    fn test_refresh_zero_is_ignored() {
        let mut f = Fixture::new();
        f.map().write_holding(REG_REFRESH, 0).unwrap();
        assert!(!f.control.is_dirty());

        f.map().write_holding(REG_REFRESH, 1).unwrap();
        assert!(f.control.take_refresh());
        assert!(f.control.is_dirty());
    }

    #[test]
    fn test_fire_params() {
        let mut f = Fixture::new();
        f.map().write_holding(REG_COOLING, 80).unwrap();
        f.map().write_holding(REG_SPARKING, 200).unwrap();
        assert_eq!(f.strip.fire.cooling, 80);
        assert_eq!(f.map().read_holding(REG_SPARKING), Ok(200));
        assert_eq!(
            f.map().write_holding(REG_COOLING, 256),
            Err(ExceptionCode::IllegalDataValue)
        );
    }

    #[test]
    fn test_write_multiple_past_strip_end_is_atomic() {
        let mut f = Fixture::new();
        let mut out = heapless::Vec::new();
        // Pixel 3 and then one pixel past the end of the strip
        let pdu = [
            0x10, 0x01, 0x06, 0x00, 0x04, 0x08, 0x11, 0x22, 0x00, 0x33, 0x44, 0x55, 0x00, 0x66,
        ];
        let result = ember_rtu::pdu::process(&pdu, &mut f.map(), &mut out);

        assert_eq!(result, Some(ExceptionCode::IllegalDataAddress));
        assert_eq!(out.as_slice(), &[0x90, 0x02]);
        assert_eq!(f.strip.pixels[3], Rgb::BLACK);
        assert!(!f.render.is_updated());
    }

    #[test]
    fn test_check_write_has_no_effect() {
        let mut f = Fixture::new();
        let map = f.map();
        assert_eq!(map.check_write(REG_EFFECT, 2), Ok(()));
        assert_eq!(
            map.check_write(REG_EFFECT, 9),
            Err(ExceptionCode::IllegalDataValue)
        );
        assert_eq!(
            map.check_write(REG_PIXEL_BASE + 8, 0),
            Err(ExceptionCode::IllegalDataAddress)
        );
        assert_eq!(map.check_write(REG_PIXEL_BASE, 0xFFFF), Ok(()));
        assert!(!f.control.is_dirty());
        assert!(!f.render.is_updated());
    }

    #[test]
    fn test_read_only_and_unmapped() {
        let mut f = Fixture::new();
        assert_eq!(f.map().read_holding(REG_PIXEL_COUNT), Ok(4));
        assert_eq!(
            f.map().write_holding(REG_PIXEL_COUNT, 10),
            Err(ExceptionCode::IllegalDataAddress)
        );
        assert_eq!(
            f.map().read_holding(0x0050),
            Err(ExceptionCode::IllegalDataAddress)
        );
    }
}
