//! The host façade: owns memory, CPU, SID and VIC as peer components and
//! exposes the three operations a host uses to drive legacy music code —
//! `call`, `call_trace` and `run_frames` — plus PRG loading.
//!
//! Per §5, a `C64` is not `Sync`/shareable: it's meant to be constructed
//! once and driven repeatedly from a single thread. Nothing here spawns a
//! thread or blocks except [`C64::load_prg`], which is the one I/O
//! boundary the core touches.

use std::path::Path;

use crate::cpu::Cpu;
use crate::error::PrgError;
use crate::memory::Memory;
use crate::sid::{RegisterChange, Sid};
use crate::vic::{Model, Vic};

/// The byte the real C64 KERNAL leaves at $01 on cold boot: BASIC,
/// KERNAL and I/O all banked in. The emulator has no banking of its own
/// (§3), but legacy code routinely inspects this byte, so it's written
/// once at construction to match what such code expects to find.
const DEFAULT_BANK_CONFIG: u8 = 0x37;
const BANK_CONFIG_ADDR: u16 = 0x0001;

/// Owns the memory image, CPU, SID and VIC as peer components and wires
/// them together for scripted driving of legacy C64 music routines.
///
/// Direct field access to `cpu`, `memory`, `sid` and `vic` is expected —
/// this is a library for host code that wants to poke at emulator state
/// between calls, not an opaque black box.
pub struct C64 {
    pub cpu: Cpu,
    pub memory: Memory,
    pub sid: Sid,
    pub vic: Vic,
}

impl C64 {
    /// Allocate a fresh machine: zeroed memory (with the default bank
    /// byte written at $01), a CPU starting at `start`, a silent SID, and
    /// a VIC modelling `model`'s raster timing.
    pub fn new(model: Model, start: u16) -> C64 {
        let mut memory = Memory::new();
        memory.write(BANK_CONFIG_ADDR, DEFAULT_BANK_CONFIG);
        C64 {
            cpu: Cpu::new(start),
            memory,
            sid: Sid::new(),
            vic: Vic::new(model),
        }
    }

    /// Load a PRG image: the first two bytes are a little-endian load
    /// address, the rest is copied verbatim starting there. Payloads of
    /// length <= 2 are a no-op that returns load address 0 (§7) — use
    /// [`C64::load_prg`] if you want that case surfaced as an error.
    pub fn set_prg(&mut self, bytes: &[u8], pc_to_load_addr: bool) -> u16 {
        if bytes.len() <= 2 {
            return 0;
        }
        let load_addr = u16::from(bytes[0]) | (u16::from(bytes[1]) << 8);
        for (offset, &byte) in bytes[2..].iter().enumerate() {
            self.memory.write(load_addr.wrapping_add(offset as u16), byte);
        }
        if pc_to_load_addr {
            self.cpu.pc = load_addr;
        }
        load_addr
    }

    /// Read a PRG file off disk and [`C64::set_prg`] it. Unlike
    /// `set_prg`, a too-short payload is a real error here: this is the
    /// one I/O boundary the core touches, so anomalies are worth
    /// surfacing as a `Result` rather than silently returning 0.
    pub fn load_prg(&mut self, path: impl AsRef<Path>, pc_to_load_addr: bool) -> Result<u16, PrgError> {
        let bytes = std::fs::read(path)?;
        if bytes.len() <= 2 {
            return Err(PrgError::TooShort { len: bytes.len() });
        }
        Ok(self.set_prg(&bytes, pc_to_load_addr))
    }

    /// Reset status to 0, SP to $FF, PC to `addr`, and clear the SID's
    /// sticky `ext_written`/`ext_changed` flags — the shared prologue of
    /// [`C64::call`]/[`C64::call_trace`].
    fn prepare_call(&mut self, pc: u16) {
        self.cpu.set_status(0);
        self.cpu.sp = 0xFF;
        self.cpu.pc = pc;
        self.sid.begin_call();
    }

    /// Run the subroutine at `addr` to completion (RTS-at-empty-stack,
    /// BRK, an unmapped opcode, or the RTI-vector heuristic). Afterwards
    /// the SID's per-step `written`/`changed` mirror the sticky
    /// `ext_written`/`ext_changed` accumulated over the whole run, so
    /// callers can query "did this call touch the SID" exactly once.
    pub fn call(&mut self, addr: u16) {
        log::debug!("call(${addr:04x})");
        self.prepare_call(addr);
        self.drive();
        self.sid.written = self.sid.ext_written;
        self.sid.changed = self.sid.ext_changed;
    }

    /// Like [`C64::call`], but returns every semantically-changed SID
    /// register write observed during the run, in the order they
    /// occurred, with cycle timestamps.
    pub fn call_trace(&mut self, addr: u16) -> Vec<RegisterChange> {
        log::debug!("call_trace(${addr:04x})");
        self.prepare_call(addr);
        let mut trace = Vec::new();
        loop {
            let cycles = self.step_and_collect(&mut trace);
            if cycles == 0 {
                break;
            }
        }
        self.sid.written = self.sid.ext_written;
        self.sid.changed = self.sid.ext_changed;
        trace
    }

    /// Run from whatever PC is currently set, without touching SP or
    /// status first. Otherwise identical to [`C64::call`].
    pub fn run(&mut self) {
        log::debug!("run() from ${:04x}", self.cpu.pc);
        self.cpu.set_status(0);
        self.cpu.sp = 0xFF;
        self.sid.begin_call();
        self.drive();
        self.sid.written = self.sid.ext_written;
        self.sid.changed = self.sid.ext_changed;
    }

    /// Step the CPU until cumulative cycles reach `n` frames' worth of
    /// the current VIC model's budget, or the running program
    /// terminates on its own. Returns the number of whole frames
    /// actually advanced (which may be less than `n` if the program
    /// exited early). `n == 0` is a no-op that returns 0 immediately.
    pub fn run_frames(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        log::debug!("run_frames({n})");
        let per_frame = u64::from(self.vic.model().cycles_per_frame());
        let target = per_frame * u64::from(n);
        let mut total = 0u64;
        loop {
            if total >= target {
                break;
            }
            let cycles = self.cpu.run_step(&mut self.memory, &mut self.sid, &mut self.vic);
            if cycles == 0 {
                break;
            }
            total += u64::from(cycles);
        }
        u32::try_from(total / per_frame).unwrap_or(u32::MAX).min(n)
    }

    /// Loop `run_step` until it signals termination.
    fn drive(&mut self) {
        loop {
            let cycles = self.cpu.run_step(&mut self.memory, &mut self.sid, &mut self.vic);
            if cycles == 0 {
                break;
            }
        }
    }

    /// Like `drive`'s loop body, but records every non-null `last_change`
    /// into `trace` before the SID's next `begin_step` would clear it.
    fn step_and_collect(&mut self, trace: &mut Vec<RegisterChange>) -> u8 {
        let cycles = self.cpu.run_step(&mut self.memory, &mut self.sid, &mut self.vic);
        if let Some(change) = self.sid.last_change {
            trace.push(change);
        }
        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asm(cpu: &mut C64, at: u16, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            cpu.memory.write(at + i as u16, b);
        }
    }

    #[test]
    fn new_writes_default_bank_config() {
        let c64 = C64::new(Model::Pal, 0x0800);
        assert_eq!(c64.memory.read(0x0001), 0x37);
    }

    #[test]
    fn set_prg_loads_payload_at_its_header_address() {
        let mut c64 = C64::new(Model::Pal, 0x0800);
        let prg = [0x00, 0x08, 0xA9, 0xCF]; // load addr $0800, then LDA #$CF
        let addr = c64.set_prg(&prg, true);
        assert_eq!(addr, 0x0800);
        assert_eq!(c64.memory.read(0x0800), 0xA9);
        assert_eq!(c64.memory.read(0x0801), 0xCF);
        assert_eq!(c64.cpu.pc, 0x0800);
    }

    #[test]
    fn set_prg_is_a_noop_for_short_payloads() {
        let mut c64 = C64::new(Model::Pal, 0x0800);
        assert_eq!(c64.set_prg(&[0x00, 0x08], true), 0);
        assert_eq!(c64.cpu.pc, 0x0800);
    }

    #[test]
    fn call_runs_until_rts_with_empty_stack() {
        let mut c64 = C64::new(Model::Pal, 0x0800);
        // LDA #$CF; STA $D417; RTS
        asm(&mut c64, 0x0800, &[0xA9, 0xCF, 0x8D, 0x17, 0xD4, 0x60]);
        c64.call(0x0800);
        assert_eq!(c64.sid.get_registers()[23], 0xCF);
        assert!(c64.sid.changed);
    }

    #[test]
    fn call_trace_orders_sid_changes_with_nondecreasing_cycles() {
        let mut c64 = C64::new(Model::Pal, 0x0800);
        // LDA #$17; STA $D400
        // LDA #$01; STA $D401
        // LDA #$41; STA $D404
        // LDA #$40; STA $D404
        // RTS
        asm(
            &mut c64,
            0x0800,
            &[
                0xA9, 0x17, 0x8D, 0x00, 0xD4, 0xA9, 0x01, 0x8D, 0x01, 0xD4, 0xA9, 0x41, 0x8D, 0x04,
                0xD4, 0xA9, 0x40, 0x8D, 0x04, 0xD4, 0x60,
            ],
        );
        let trace = c64.call_trace(0x0800);
        assert_eq!(trace.len(), 4);
        assert_eq!(trace[0].new_value, 0x17);
        assert_eq!(trace[1].new_value, 0x01);
        assert_eq!(trace[2].new_value, 0x41);
        assert_eq!(trace[3].new_value, 0x40);
        for pair in trace.windows(2) {
            assert!(pair[1].cycle >= pair[0].cycle);
        }
    }

    #[test]
    fn run_frames_zero_is_a_noop() {
        let mut c64 = C64::new(Model::Pal, 0x0800);
        assert_eq!(c64.run_frames(0), 0);
    }

    #[test]
    fn run_frames_advances_by_the_requested_count() {
        let mut c64 = C64::new(Model::Pal, 0x0800);
        // Tight loop: JMP $0800, never terminates on its own.
        asm(&mut c64, 0x0800, &[0x4C, 0x00, 0x08]);
        let frames = c64.run_frames(3);
        assert_eq!(frames, 3);
    }

    #[test]
    fn run_frames_stops_early_if_the_program_terminates() {
        let mut c64 = C64::new(Model::Pal, 0x0800);
        asm(&mut c64, 0x0800, &[0x60]); // RTS with empty stack, terminates immediately
        let frames = c64.run_frames(5);
        assert_eq!(frames, 0);
    }

    #[test]
    fn load_prg_surfaces_too_short_payload_as_an_error() {
        let mut path = std::env::temp_dir();
        path.push("c64sid_test_too_short.prg");
        std::fs::write(&path, [0x00, 0x08]).unwrap();
        let mut c64 = C64::new(Model::Pal, 0x0800);
        let err = c64.load_prg(&path, false).unwrap_err();
        assert!(matches!(err, PrgError::TooShort { len: 2 }));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_prg_reads_and_loads_a_real_file() {
        let mut path = std::env::temp_dir();
        path.push("c64sid_test_ok.prg");
        std::fs::write(&path, [0x00, 0x08, 0xEA, 0xEA]).unwrap(); // NOP NOP at $0800
        let mut c64 = C64::new(Model::Pal, 0x0000);
        let addr = c64.load_prg(&path, true).unwrap();
        assert_eq!(addr, 0x0800);
        assert_eq!(c64.cpu.pc, 0x0800);
        assert_eq!(c64.memory.read(0x0800), 0xEA);
        std::fs::remove_file(&path).ok();
    }
}
