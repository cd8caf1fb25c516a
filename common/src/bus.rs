//! Parallel command/data bus seam.
//!
//! Every controller is driven through two 16-bit locations: writing the
//! command location selects a register, the data location then carries its
//! arguments or pixel words. On the board both are memory-mapped FSMC
//! addresses; tests and the simulator decode the stream instead.

/// A 16-bit command/data bus to a display controller.
pub trait DisplayBus {
    /// Selects a register (RS low).
    fn write_command(
        &mut self,
        command: u16,
    );

    /// Writes one data word (RS high).
    fn write_data(
        &mut self,
        data: u16,
    );

    /// Reads one data word.
    fn read_data(&mut self) -> u16;

    /// Selects `register` and writes a single data word to it.
    #[inline]
    fn write_reg(
        &mut self,
        register: u16,
        data: u16,
    ) {
        self.write_command(register);
        self.write_data(data);
    }

    /// Writes the same data word `count` times.
    fn write_repeated(
        &mut self,
        data: u16,
        count: u32,
    ) {
        for _ in 0..count {
            self.write_data(data);
        }
    }

    /// Writes a run of data words.
    fn write_slice(
        &mut self,
        data: &[u16],
    ) {
        for &word in data {
            self.write_data(word);
        }
    }
}

impl<B: DisplayBus + ?Sized> DisplayBus for &mut B {
    #[inline]
    fn write_command(
        &mut self,
        command: u16,
    ) {
        (**self).write_command(command);
    }

    #[inline]
    fn write_data(
        &mut self,
        data: u16,
    ) {
        (**self).write_data(data);
    }

    #[inline]
    fn read_data(&mut self) -> u16 { (**self).read_data() }
}
