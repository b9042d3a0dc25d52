//! `embedded-hal` bus adapter

use ember_hal::spi::SpiBus;

/// Any blocking `embedded-hal` SPI bus as an Ember [`SpiBus`]
///
/// `write` returns once the data has been shifted out, so the strip sees
/// no gap longer than its latch time between segments unless an interrupt
/// intervenes.
#[derive(Debug)]
pub struct HalSpi<B>(pub B);

impl<B: embedded_hal::spi::SpiBus<u8>> SpiBus for HalSpi<B> {
    type Error = B::Error;

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        embedded_hal::spi::SpiBus::write(&mut self.0, data)?;
        embedded_hal::spi::SpiBus::flush(&mut self.0)
    }
}
