//! Framebuffer flush through DMA2 stream 0 (memory-to-memory).
//!
//! In memory-to-memory mode the stream reads from its peripheral port and
//! writes to its memory port, so the pixel buffer goes into PAR (incremented)
//! and the panel data register into M0AR (fixed). Each 32-bit word becomes
//! two 16-bit FSMC writes, low half first.

use embassy_stm32::Peri;
use embassy_stm32::pac;
use embassy_stm32::pac::dma::vals;
use embassy_stm32::peripherals::DMA2_CH0;
use embassy_time::{Duration, Instant};
use tft_common::framebuffer::{BlockTransfer, MAX_TRANSFER_WORDS};

use crate::fsmc::FsmcBus;

const STREAM: usize = 0;

/// Owns DMA2 stream 0 for panel flushes.
pub struct DmaTransfer {
    _stream: Peri<'static, DMA2_CH0>,
}

impl DmaTransfer {
    pub fn new(stream: Peri<'static, DMA2_CH0>) -> Self {
        pac::RCC.ahb1enr().modify(|w| w.set_dma2en(true));
        Self { _stream: stream }
    }

    fn disable(&mut self) {
        let st = pac::DMA2.st(STREAM);
        st.cr().modify(|w| w.set_en(false));
        while st.cr().read().en() {}
    }

    fn clear_flags(&mut self) {
        pac::DMA2.ifcr(STREAM / 4).write(|w| {
            w.set_tcif(STREAM % 4, true);
            w.set_htif(STREAM % 4, true);
            w.set_teif(STREAM % 4, true);
            w.set_dmeif(STREAM % 4, true);
            w.set_feif(STREAM % 4, true);
        });
    }
}

impl BlockTransfer<FsmcBus> for DmaTransfer {
    fn start(
        &mut self,
        bus: &mut FsmcBus,
        chunk: &[u16],
    ) {
        let words = (chunk.len() / 2).min(MAX_TRANSFER_WORDS);
        self.disable();
        self.clear_flags();

        let st = pac::DMA2.st(STREAM);
        st.par().write_value(chunk.as_ptr() as u32);
        st.m0ar().write_value(bus.data_address());
        st.ndtr().write(|w| w.set_ndt(words as u16));
        st.fcr().write(|w| {
            w.set_dmdis(vals::Dmdis::DISABLED);
            w.set_fth(vals::Fth::FULL);
        });
        st.cr().write(|w| {
            w.set_chsel(0);
            w.set_dir(vals::Dir::MEMORY_TO_MEMORY);
            w.set_pinc(true);
            w.set_minc(false);
            w.set_psize(vals::Size::BITS32);
            w.set_msize(vals::Size::BITS32);
            w.set_pl(vals::Pl::VERY_HIGH);
            w.set_pburst(vals::Burst::INCR4);
            w.set_mburst(vals::Burst::INCR4);
            w.set_en(true);
        });
    }

    fn wait(
        &mut self,
        timeout_ms: u32,
    ) -> bool {
        let deadline = Instant::now() + Duration::from_millis(u64::from(timeout_ms));
        loop {
            let isr = pac::DMA2.isr(STREAM / 4).read();
            if isr.tcif(STREAM % 4) {
                self.clear_flags();
                return true;
            }
            if isr.teif(STREAM % 4) || Instant::now() >= deadline {
                self.disable();
                self.clear_flags();
                return false;
            }
        }
    }
}
