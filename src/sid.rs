//! SID ($D400) register-file observer.
//!
//! This module never touches main memory directly — it's driven by the
//! CPU's write gate, which mirrors every store into the SID's address
//! range through [`Sid::write_register`] *and* into main memory. The SID
//! itself only keeps a 25-byte shadow plus the bookkeeping needed to
//! answer "what changed, and what did it mean" for a host driving music
//! routines.

pub const REGISTER_COUNT: usize = 25;
pub const DEFAULT_BASE: u16 = 0xD400;

/// Which oscillator (1, 2 or 3) a register-change concerns, where that's
/// meaningful; `None` for the shared filter/volume registers.
pub type Osc = u8;

/// Semantic meaning of a single SID register write, independent of its
/// raw byte value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterMeaning {
    OscFreqLow(Osc),
    OscFreqHigh(Osc),
    OscPulseWidthLow(Osc),
    OscPulseWidthHigh(Osc),
    Waveform(Osc),
    AttackDecay(Osc),
    SustainRelease(Osc),
    FilterFreqLow,
    FilterFreqHigh,
    FilterResControl,
    FilterModeVolume,
}

/// Oscillator control register, bit-decoded.
///
/// Bit layout: {gate:0, sync:1, ring:2, test:3, triangle:4, sawtooth:5,
/// pulse:6, noise:7}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveformControl {
    pub gate: bool,
    pub sync: bool,
    pub ring: bool,
    pub test: bool,
    pub triangle: bool,
    pub sawtooth: bool,
    pub pulse: bool,
    pub noise: bool,
}

impl WaveformControl {
    pub fn from_byte(byte: u8) -> Self {
        WaveformControl {
            gate: byte & 0x01 != 0,
            sync: byte & 0x02 != 0,
            ring: byte & 0x04 != 0,
            test: byte & 0x08 != 0,
            triangle: byte & 0x10 != 0,
            sawtooth: byte & 0x20 != 0,
            pulse: byte & 0x40 != 0,
            noise: byte & 0x80 != 0,
        }
    }
}

/// Attack/decay register, nibble-decoded: {decay:0-3, attack:4-7}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackDecay {
    pub attack: u8,
    pub decay: u8,
}

impl AttackDecay {
    pub fn from_byte(byte: u8) -> Self {
        AttackDecay {
            attack: byte >> 4,
            decay: byte & 0x0F,
        }
    }
}

/// Sustain/release register, nibble-decoded: {release:0-3, sustain:4-7}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SustainRelease {
    pub sustain: u8,
    pub release: u8,
}

impl SustainRelease {
    pub fn from_byte(byte: u8) -> Self {
        SustainRelease {
            sustain: byte >> 4,
            release: byte & 0x0F,
        }
    }
}

/// Filter resonance + routing register: {osc1:0, osc2:1, osc3:2, ext:3,
/// resonance:4-7}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterResControl {
    pub osc_1: bool,
    pub osc_2: bool,
    pub osc_3: bool,
    pub ext: bool,
    pub resonance: u8,
}

impl FilterResControl {
    pub fn from_byte(byte: u8) -> Self {
        FilterResControl {
            osc_1: byte & 0x01 != 0,
            osc_2: byte & 0x02 != 0,
            osc_3: byte & 0x04 != 0,
            ext: byte & 0x08 != 0,
            resonance: byte >> 4,
        }
    }
}

/// Filter mode + master volume register: {volume:0-3, low_pass:4,
/// band_pass:5, high_pass:6, osc3_off:7}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterModeVolume {
    pub volume: u8,
    pub low_pass: bool,
    pub band_pass: bool,
    pub high_pass: bool,
    pub osc_3_off: bool,
}

impl FilterModeVolume {
    pub fn from_byte(byte: u8) -> Self {
        FilterModeVolume {
            volume: byte & 0x0F,
            low_pass: byte & 0x10 != 0,
            band_pass: byte & 0x20 != 0,
            high_pass: byte & 0x40 != 0,
            osc_3_off: byte & 0x80 != 0,
        }
    }
}

/// The decoded payload of a [`RegisterChange`], tagged by meaning
/// category. These are view structs built fresh from the byte, never
/// in-place aliases over the shadow register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDetails {
    Raw(u8),
    Waveform(WaveformControl),
    AttackDecay(AttackDecay),
    SustainRelease(SustainRelease),
    FilterRes(FilterResControl),
    FilterMode(FilterModeVolume),
}

impl ChangeDetails {
    fn decode(meaning: RegisterMeaning, value: u8) -> ChangeDetails {
        match meaning {
            RegisterMeaning::Waveform(_) => ChangeDetails::Waveform(WaveformControl::from_byte(value)),
            RegisterMeaning::AttackDecay(_) => ChangeDetails::AttackDecay(AttackDecay::from_byte(value)),
            RegisterMeaning::SustainRelease(_) => {
                ChangeDetails::SustainRelease(SustainRelease::from_byte(value))
            }
            RegisterMeaning::FilterResControl => {
                ChangeDetails::FilterRes(FilterResControl::from_byte(value))
            }
            RegisterMeaning::FilterModeVolume => {
                ChangeDetails::FilterMode(FilterModeVolume::from_byte(value))
            }
            _ => ChangeDetails::Raw(value),
        }
    }

    pub fn as_filter_res(&self) -> Option<&FilterResControl> {
        match self {
            ChangeDetails::FilterRes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_filter_mode(&self) -> Option<&FilterModeVolume> {
        match self {
            ChangeDetails::FilterMode(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_waveform(&self) -> Option<&WaveformControl> {
        match self {
            ChangeDetails::Waveform(v) => Some(v),
            _ => None,
        }
    }
}

/// A single observed, semantically-decoded SID register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterChange {
    pub meaning: RegisterMeaning,
    pub old_value: u8,
    pub new_value: u8,
    pub details: ChangeDetails,
    pub cycle: u32,
}

impl RegisterChange {
    pub fn volume_changed(&self) -> bool {
        matches!(self.meaning, RegisterMeaning::FilterModeVolume)
    }

    pub fn filter_mode_changed(&self) -> bool {
        matches!(self.meaning, RegisterMeaning::FilterModeVolume)
    }

    pub fn filter_freq_changed(&self) -> bool {
        matches!(
            self.meaning,
            RegisterMeaning::FilterFreqLow | RegisterMeaning::FilterFreqHigh
        )
    }

    pub fn filter_res_changed(&self) -> bool {
        matches!(self.meaning, RegisterMeaning::FilterResControl)
    }

    pub fn osc_freq_changed(&self, osc: Osc) -> bool {
        matches!(
            self.meaning,
            RegisterMeaning::OscFreqLow(o) | RegisterMeaning::OscFreqHigh(o) if o == osc
        )
    }

    pub fn osc_pulse_width_changed(&self, osc: Osc) -> bool {
        matches!(
            self.meaning,
            RegisterMeaning::OscPulseWidthLow(o) | RegisterMeaning::OscPulseWidthHigh(o) if o == osc
        )
    }

    pub fn osc_waveform_changed(&self, osc: Osc) -> bool {
        matches!(self.meaning, RegisterMeaning::Waveform(o) if o == osc)
    }

    pub fn osc_attack_decay_changed(&self, osc: Osc) -> bool {
        matches!(self.meaning, RegisterMeaning::AttackDecay(o) if o == osc)
    }

    pub fn osc_sustain_release_changed(&self, osc: Osc) -> bool {
        matches!(self.meaning, RegisterMeaning::SustainRelease(o) if o == osc)
    }
}

/// Map a shadow-register index (0..=24) to its semantic meaning.
fn meaning_of(index: u8) -> RegisterMeaning {
    match index {
        0 => RegisterMeaning::OscFreqLow(1),
        1 => RegisterMeaning::OscFreqHigh(1),
        2 => RegisterMeaning::OscPulseWidthLow(1),
        3 => RegisterMeaning::OscPulseWidthHigh(1),
        4 => RegisterMeaning::Waveform(1),
        5 => RegisterMeaning::AttackDecay(1),
        6 => RegisterMeaning::SustainRelease(1),
        7 => RegisterMeaning::OscFreqLow(2),
        8 => RegisterMeaning::OscFreqHigh(2),
        9 => RegisterMeaning::OscPulseWidthLow(2),
        10 => RegisterMeaning::OscPulseWidthHigh(2),
        11 => RegisterMeaning::Waveform(2),
        12 => RegisterMeaning::AttackDecay(2),
        13 => RegisterMeaning::SustainRelease(2),
        14 => RegisterMeaning::OscFreqLow(3),
        15 => RegisterMeaning::OscFreqHigh(3),
        16 => RegisterMeaning::OscPulseWidthLow(3),
        17 => RegisterMeaning::OscPulseWidthHigh(3),
        18 => RegisterMeaning::Waveform(3),
        19 => RegisterMeaning::AttackDecay(3),
        20 => RegisterMeaning::SustainRelease(3),
        21 => RegisterMeaning::FilterFreqLow,
        22 => RegisterMeaning::FilterFreqHigh,
        23 => RegisterMeaning::FilterResControl,
        24 => RegisterMeaning::FilterModeVolume,
        _ => unreachable!("meaning_of called with out-of-range index {index}"),
    }
}

/// Shadow copy of the 25-byte SID register file, plus change tracking.
pub struct Sid {
    base: u16,
    registers: [u8; REGISTER_COUNT],

    /// Set on any write this step, regardless of whether the value changed.
    pub written: bool,
    /// Set when a write this step actually changed a register's value.
    pub changed: bool,
    /// Sticky `written`, cleared only at the start of `C64::call`.
    pub ext_written: bool,
    /// Sticky `changed`, cleared only at the start of `C64::call`.
    pub ext_changed: bool,

    reg_written_idx: Option<u8>,
    reg_written_val: u8,

    /// The most recent actual change, cleared by the CPU at step start.
    pub last_change: Option<RegisterChange>,
}

impl Sid {
    pub fn new() -> Sid {
        Sid::with_base(DEFAULT_BASE)
    }

    pub fn with_base(base: u16) -> Sid {
        Sid {
            base,
            registers: [0u8; REGISTER_COUNT],
            written: false,
            changed: false,
            ext_written: false,
            ext_changed: false,
            reg_written_idx: None,
            reg_written_val: 0,
            last_change: None,
        }
    }

    pub fn base(&self) -> u16 {
        self.base
    }

    /// Record a write at shadow index `index` with cycle timestamp
    /// `cycle`. Out-of-range indices (> 24) are silently ignored, per §7.
    pub fn write_register(&mut self, index: u8, value: u8, cycle: u32) {
        if index as usize >= REGISTER_COUNT {
            return;
        }
        self.written = true;
        self.ext_written = true;
        self.reg_written_idx = Some(index);
        self.reg_written_val = value;

        let old = self.registers[index as usize];
        if value != old {
            self.changed = true;
            self.ext_changed = true;
            let meaning = meaning_of(index);
            let details = ChangeDetails::decode(meaning, value);
            self.last_change = Some(RegisterChange {
                meaning,
                old_value: old,
                new_value: value,
                details,
                cycle,
            });
        }
        self.registers[index as usize] = value;
    }

    /// Clear the per-step flags. Called by the CPU at the start of every
    /// `run_step`.
    pub fn begin_step(&mut self) {
        self.written = false;
        self.changed = false;
        self.last_change = None;
    }

    /// Clear the sticky flags. Called by the façade at the start of every
    /// `call`.
    pub fn begin_call(&mut self) {
        self.ext_written = false;
        self.ext_changed = false;
    }

    pub fn get_registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.registers
    }

    pub fn last_written(&self) -> Option<(u8, u8)> {
        self.reg_written_idx.map(|idx| (idx, self.reg_written_val))
    }

    /// Human-readable dump of all 25 shadow registers.
    pub fn print_registers(&self) -> String {
        let mut out = String::new();
        for (i, byte) in self.registers.iter().enumerate() {
            out.push_str(&format!("${:02X}: {:02X}\n", self.base + i as u16, byte));
        }
        out
    }
}

impl Default for Sid {
    fn default() -> Self {
        Sid::new()
    }
}
