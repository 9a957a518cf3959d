use std::time::Instant;

use log::{info, trace};
use rand::{rngs::ThreadRng, Rng};

use crate::{
    decode::{Opcode, Word},
    display::{Screen, HEIGHT, WIDTH},
    error::EmuError,
    keyboard::{KeyEvent, Keypad},
    memory::{Memory, TypeAddr, FONT_START},
    quirks::Quirks,
    registers::Registers,
    timer::Timer,
};

/// The flag register; carry, borrow and sprite collision land here.
const VF: u8 = 0xF;

/// Byte source for the Cxkk instruction. Injected so a run can be made
/// deterministic by substituting a fixed sequence.
pub trait RandomSource {
    fn next_byte(&mut self) -> u8;
}

impl RandomSource for ThreadRng {
    fn next_byte(&mut self) -> u8 {
        self.gen()
    }
}

/// What a completed step tells the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Running,
    /// The frontend asked to quit: window closed, or escape while the
    /// program was waiting on a key.
    Halted,
}

/// The interpreter proper. Owns the whole machine: memory, registers,
/// timers, and the frontend it draws to and reads keys from. One call
/// to [`Emulator::step`] is one fetch-decode-execute cycle.
pub struct Emulator<F, R> {
    frontend: F,
    rng: R,
    quirks: Quirks,
    pub regs: Registers,
    pub mem: Memory,
    delay: Timer,
    sound: Timer,
}

impl<F: Screen + Keypad, R: RandomSource> Emulator<F, R> {
    pub fn new(frontend: F, rng: R, quirks: Quirks) -> Self {
        let now = Instant::now();
        Self {
            frontend,
            rng,
            quirks,
            regs: Registers::new(),
            mem: Memory::new(),
            delay: Timer::new(now),
            sound: Timer::new(now),
        }
    }

    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), EmuError> {
        info!("loading {} byte rom", rom.len());
        self.mem.load_rom(rom)
    }

    /// One fetch-decode-execute cycle.
    pub fn step(&mut self) -> Result<StepOutcome, EmuError> {
        let at = self.mem.pc.0;
        let word = Word(self.mem.next_instruction()?);
        let op = Opcode::decode(word, at)?;
        trace!("{at:#05x}: {:04x} {op:?}", word.0);
        self.execute(op, at, Instant::now())
    }

    /// Pump frontend events between steps; reports whether the run
    /// should go on. Key-down events are discarded here because Ex9E
    /// and ExA1 read key levels, not the queue.
    pub fn drain_events(&mut self) -> StepOutcome {
        loop {
            match self.frontend.poll_events() {
                KeyEvent::Quit => return StepOutcome::Halted,
                KeyEvent::Idle => return StepOutcome::Running,
                KeyEvent::Pressed(_) => {}
            }
        }
    }

    /// Push the current pixel buffer out, independent of any draw.
    pub fn render(&mut self) {
        self.frontend.present();
    }

    /// Is the sound timer still running? Observed by the beeper.
    pub fn sound_active(&self) -> bool {
        self.sound.is_running(Instant::now())
    }

    /// One line of machine state for fatal-error reports.
    pub fn dump(&self) -> String {
        format!(
            "pc={:#05x} i={:#05x} stack_depth={} v={:02x?}",
            self.mem.pc.0,
            self.mem.index.0,
            self.mem.stack.depth(),
            self.regs.as_slice()
        )
    }

    /// Every operation that writes VF as a side effect computes its
    /// inputs first and writes the destination register before the
    /// flag, so Vx = VF is legal and the flag wins.
    fn execute(
        &mut self,
        op: Opcode,
        at: TypeAddr,
        now: Instant,
    ) -> Result<StepOutcome, EmuError> {
        match op {
            Opcode::ClearScreen => self.frontend.clear(),
            Opcode::PopSubroutine => {
                let ret = self
                    .mem
                    .stack
                    .pop()
                    .ok_or(EmuError::StackUnderflow { pc: at })?;
                self.mem.set_pc(ret);
            }
            Opcode::Jump(addr) => self.mem.set_pc(addr),
            Opcode::PushSubroutine(addr) => {
                if !self.mem.stack.push(self.mem.pc.0) {
                    return Err(EmuError::StackOverflow { pc: at });
                }
                self.mem.set_pc(addr);
            }
            Opcode::SkipEqualConstant(x, kk) => {
                if self.regs.get(x) == kk {
                    self.mem.skip();
                }
            }
            Opcode::SkipNotEqualConstant(x, kk) => {
                if self.regs.get(x) != kk {
                    self.mem.skip();
                }
            }
            Opcode::SkipEqualRegister(x, y) => {
                if self.regs.get(x) == self.regs.get(y) {
                    self.mem.skip();
                }
            }
            Opcode::SkipNotEqualRegister(x, y) => {
                if self.regs.get(x) != self.regs.get(y) {
                    self.mem.skip();
                }
            }
            Opcode::SetRegister(x, kk) => self.regs.set(x, kk),
            Opcode::AddToRegister(x, kk) => {
                self.regs.set(x, self.regs.get(x).wrapping_add(kk));
            }
            Opcode::CopyRegister(x, y) => self.regs.set(x, self.regs.get(y)),
            Opcode::Or(x, y) => self.regs.set(x, self.regs.get(x) | self.regs.get(y)),
            Opcode::And(x, y) => self.regs.set(x, self.regs.get(x) & self.regs.get(y)),
            Opcode::XOr(x, y) => self.regs.set(x, self.regs.get(x) ^ self.regs.get(y)),
            Opcode::Add(x, y) => {
                let sum = self.regs.get(x) as u16 + self.regs.get(y) as u16;
                self.regs.set(x, sum as u8);
                self.regs.set(VF, (sum > 0xFF) as u8);
            }
            Opcode::SubtractForward(x, y) => {
                let (a, b) = (self.regs.get(x), self.regs.get(y));
                self.regs.set(x, a.wrapping_sub(b));
                self.regs.set(VF, (a >= b) as u8); // no borrow
            }
            Opcode::SubtractBackward(x, y) => {
                let (a, b) = (self.regs.get(x), self.regs.get(y));
                self.regs.set(x, b.wrapping_sub(a));
                self.regs.set(VF, (b >= a) as u8);
            }
            Opcode::RightShift(x, y) => {
                let src = if self.quirks.shift_copies_vy {
                    self.regs.get(y)
                } else {
                    self.regs.get(x)
                };
                self.regs.set(x, src >> 1);
                self.regs.set(VF, src & 1);
            }
            Opcode::LeftShift(x, y) => {
                let src = if self.quirks.shift_copies_vy {
                    self.regs.get(y)
                } else {
                    self.regs.get(x)
                };
                self.regs.set(x, src << 1);
                self.regs.set(VF, src >> 7);
            }
            Opcode::SetIndexRegister(addr) => self.mem.set_index(addr),
            Opcode::JumpWithOffset(x, addr) => {
                let offset = if self.quirks.jump_uses_vx {
                    self.regs.get(x)
                } else {
                    self.regs.get(0)
                };
                self.mem.set_pc(addr.wrapping_add(offset as u16));
            }
            Opcode::Random(x, kk) => {
                self.regs.set(x, self.rng.next_byte() & kk);
            }
            Opcode::Display(x, y, n) => self.draw(x, y, n)?,
            Opcode::SkipIfPressed(x) => {
                if self.frontend.is_key_down(self.regs.get(x)) {
                    self.mem.skip();
                }
            }
            Opcode::SkipIfNotPressed(x) => {
                if !self.frontend.is_key_down(self.regs.get(x)) {
                    self.mem.skip();
                }
            }
            Opcode::CopyDelayToRegister(x) => self.regs.set(x, self.delay.value(now)),
            Opcode::GetKey(x) => loop {
                // Timers keep decaying while we block here; their values
                // are derived from the wall clock on read.
                match self.frontend.poll_events() {
                    KeyEvent::Pressed(key) => {
                        self.regs.set(x, key);
                        break;
                    }
                    KeyEvent::Quit => return Ok(StepOutcome::Halted),
                    KeyEvent::Idle => {}
                }
            },
            Opcode::CopyRegisterToDelay(x) => self.delay.set(self.regs.get(x), now),
            Opcode::CopyRegisterToSound(x) => self.sound.set(self.regs.get(x), now),
            Opcode::AddToIndex(x) => {
                let index = self.mem.index.0.wrapping_add(self.regs.get(x) as u16);
                if self.quirks.index_add_carry && index > 0x0FFF {
                    self.regs.set(VF, 1);
                }
                self.mem.set_index(index);
            }
            Opcode::PointChar(x) => {
                let digit = self.regs.get(x) & 0xF;
                self.mem.set_index(FONT_START + 5 * digit as TypeAddr);
            }
            Opcode::ToDecimal(x) => {
                let value = self.regs.get(x);
                let index = self.mem.index.0;
                self.mem.set(index, value / 100)?;
                self.mem.set(index.wrapping_add(1), value / 10 % 10)?;
                self.mem.set(index.wrapping_add(2), value % 10)?;
            }
            Opcode::StoreRegisterToMemory(x) => {
                let index = self.mem.index.0;
                for reg in 0..=x {
                    self.mem
                        .set(index.wrapping_add(reg as u16), self.regs.get(reg))?;
                }
                if self.quirks.index_advances {
                    self.mem.set_index(index.wrapping_add(x as u16 + 1));
                }
            }
            Opcode::LoadRegisterFromMemory(x) => {
                let index = self.mem.index.0;
                for reg in 0..=x {
                    let val = self.mem.get(index.wrapping_add(reg as u16))?;
                    self.regs.set(reg, val);
                }
                if self.quirks.index_advances {
                    self.mem.set_index(index.wrapping_add(x as u16 + 1));
                }
            }
        }
        Ok(StepOutcome::Running)
    }

    /// Dxyn. The origin wraps modulo the display size; the sprite body
    /// clips at the edges instead of wrapping mid-row. The collision
    /// flag latches on the first pixel a toggle turns off, and the
    /// buffer is committed exactly once, after the last row.
    fn draw(&mut self, x: u8, y: u8, n: u8) -> Result<(), EmuError> {
        let col0 = self.regs.get(x) as usize % WIDTH;
        let row0 = self.regs.get(y) as usize % HEIGHT;
        self.regs.set(VF, 0);
        for i in 0..n as usize {
            let row = row0 + i;
            if row >= HEIGHT {
                break;
            }
            let data = self.mem.get(self.mem.index.0.wrapping_add(i as u16))?;
            for j in 0..8 {
                let col = col0 + j;
                if col >= WIDTH {
                    break;
                }
                if (data >> (7 - j)) & 1 == 1 {
                    let lit = self.frontend.get_pixel(row, col);
                    self.frontend.set_pixel(row, col, !lit);
                    if lit {
                        self.regs.set(VF, 1);
                    }
                }
            }
        }
        self.frontend.present();
        Ok(())
    }
}
