//! HuC6280 programmable sound generator register model.
//!
//! Six channels share one port window: the CPU selects a channel, then writes
//! its frequency, control, balance, wavetable and noise registers. Channels
//! in direct (DDA) mode feed raw samples through a per-channel ring buffer
//! that the audio mixer drains at the channel's frequency.
//!
//! ## Port map (`offset & 0x0F`)
//!
//! | Port | Register                               |
//! |------|----------------------------------------|
//! | 0    | Channel select (values 6-7 ignored)    |
//! | 1    | Master balance                         |
//! | 2    | Frequency low byte                     |
//! | 3    | Frequency high nibble                  |
//! | 4    | Control: enable, direct access, volume |
//! | 5    | Channel balance                        |
//! | 6    | Wavetable / DDA data                   |
//! | 7    | Noise (channels 4 and 5 only)          |
//! | 8    | LFO frequency                          |
//! | 9    | LFO control                            |

use emu_core::logging::{log, LogCategory, LogLevel};

pub const CHANNEL_COUNT: usize = 6;
pub const WAVE_SIZE: usize = 32;
pub const DDA_BUFFER_SIZE: usize = 1024;

/// PSG input clock: the 21.47727 MHz master clock divided by 6.
pub const CLOCK_PSG: u32 = 21_477_270 / 6;

const CTRL_ENABLE: u8 = 0x80;
const CTRL_DIRECT: u8 = 0x40;
const NOISE_CAPABLE_FIRST: usize = 4;

/// Ring buffer of raw DDA samples for one channel.
#[derive(Clone)]
pub struct DdaBuffer {
    data: [u8; DDA_BUFFER_SIZE],
    read: usize,
    len: usize,
    last: u8,
    phase: u32,
}

impl DdaBuffer {
    fn new() -> Self {
        Self {
            data: [0; DDA_BUFFER_SIZE],
            read: 0,
            len: 0,
            last: 0,
            phase: 0,
        }
    }

    /// Append a sample; returns false (and drops it) when full.
    pub fn push(&mut self, sample: u8) -> bool {
        if self.len == DDA_BUFFER_SIZE {
            return false;
        }
        self.data[(self.read + self.len) % DDA_BUFFER_SIZE] = sample;
        self.len += 1;
        true
    }

    /// Next sample, or the last one again on underrun.
    pub fn pop(&mut self) -> u8 {
        if self.len > 0 {
            self.last = self.data[self.read];
            self.read = (self.read + 1) % DDA_BUFFER_SIZE;
            self.len -= 1;
        }
        self.last
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn last_sample(&self) -> u8 {
        self.last
    }
}

#[derive(Clone)]
pub struct PsgChannel {
    pub frequency: u16,
    pub control: u8,
    pub balance: u8,
    pub noise: u8,
    pub wave: [u8; WAVE_SIZE],
    pub wave_index: usize,
    pub dda: DdaBuffer,
}

impl PsgChannel {
    fn new() -> Self {
        Self {
            frequency: 0,
            control: 0,
            balance: 0,
            noise: 0,
            wave: [0; WAVE_SIZE],
            wave_index: 0,
            dda: DdaBuffer::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.control & CTRL_ENABLE != 0
    }

    pub fn direct_access(&self) -> bool {
        self.control & CTRL_DIRECT != 0
    }

    pub fn volume(&self) -> u8 {
        self.control & 0x1F
    }

    pub fn left_volume(&self) -> u8 {
        self.balance >> 4
    }

    pub fn right_volume(&self) -> u8 {
        self.balance & 0x0F
    }

    pub fn noise_enabled(&self) -> bool {
        self.noise & 0x80 != 0
    }

    pub fn noise_frequency(&self) -> u8 {
        self.noise & 0x1F
    }

    /// Tone frequency in Hz. A divisor of 0 behaves as 4096.
    pub fn tone_hz(&self) -> f64 {
        let divisor = match self.frequency {
            0 => 0x1000,
            d => d as u32,
        };
        CLOCK_PSG as f64 / (32.0 * divisor as f64)
    }

    fn write_wave(&mut self, value: u8) {
        if self.direct_access() {
            if !self.dda.push(value) {
                log(LogCategory::Audio, LogLevel::Trace, || {
                    "DDA buffer full, sample dropped".to_string()
                });
            }
        } else {
            self.wave[self.wave_index] = value & 0x1F;
            self.wave_index = (self.wave_index + 1) % WAVE_SIZE;
        }
    }

    fn write_control(&mut self, value: u8) {
        if value & (CTRL_ENABLE | CTRL_DIRECT) == CTRL_DIRECT {
            self.wave_index = 0;
        }
        self.control = value;
    }
}

#[derive(Clone)]
pub struct Psg {
    select: usize,
    master_balance: u8,
    lfo_frequency: u8,
    lfo_control: u8,
    channels: [PsgChannel; CHANNEL_COUNT],
}

impl Psg {
    pub fn new() -> Self {
        Self {
            select: 0,
            master_balance: 0,
            lfo_frequency: 0,
            lfo_control: 0,
            channels: std::array::from_fn(|_| PsgChannel::new()),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Write to port `port` (0-15) of the PSG window.
    pub fn write(&mut self, port: u16, value: u8) {
        let ch = self.select;
        match port & 0x0F {
            0 => {
                let sel = (value & 0x07) as usize;
                if sel < CHANNEL_COUNT {
                    self.select = sel;
                } else {
                    log(LogCategory::Audio, LogLevel::Debug, || {
                        format!("Ignoring PSG channel select {}", sel)
                    });
                }
            }
            1 => self.master_balance = value,
            2 => {
                let c = &mut self.channels[ch];
                c.frequency = (c.frequency & 0x0F00) | value as u16;
            }
            3 => {
                let c = &mut self.channels[ch];
                c.frequency = (c.frequency & 0x00FF) | (((value & 0x0F) as u16) << 8);
            }
            4 => self.channels[ch].write_control(value),
            5 => self.channels[ch].balance = value,
            6 => self.channels[ch].write_wave(value),
            7 => {
                if ch >= NOISE_CAPABLE_FIRST {
                    self.channels[ch].noise = value;
                }
            }
            8 => self.lfo_frequency = value,
            9 => self.lfo_control = value,
            p => log(LogCategory::Audio, LogLevel::Debug, || {
                format!("Write to unused PSG port {:X} = {:02X}", p, value)
            }),
        }
    }

    pub fn selected_channel(&self) -> usize {
        self.select
    }

    pub fn master_balance(&self) -> u8 {
        self.master_balance
    }

    pub fn lfo_frequency(&self) -> u8 {
        self.lfo_frequency
    }

    pub fn lfo_control(&self) -> u8 {
        self.lfo_control
    }

    pub fn channel(&self, ch: usize) -> Option<&PsgChannel> {
        self.channels.get(ch)
    }

    pub fn channels(&self) -> &[PsgChannel; CHANNEL_COUNT] {
        &self.channels
    }

    /// Pop one DDA sample from channel `ch`. Out-of-range channels read 0.
    pub fn next_dda_sample(&mut self, ch: usize) -> u8 {
        self.channels.get_mut(ch).map_or(0, |c| c.dda.pop())
    }

    /// Advance channel `ch` by `psg_cycles` PSG clocks, consuming one sample
    /// per frequency period. Returns the channel's current DDA output.
    pub fn clock_dda(&mut self, ch: usize, psg_cycles: u32) -> u8 {
        let Some(c) = self.channels.get_mut(ch) else {
            return 0;
        };
        let period = (c.frequency as u64).max(1);
        let total = c.dda.phase as u64 + psg_cycles as u64;
        let steps = total / period;
        c.dda.phase = (total % period) as u32;
        for _ in 0..steps.min(c.dda.len() as u64) {
            c.dda.pop();
        }
        c.dda.last_sample()
    }
}

impl Default for Psg {
    fn default() -> Self {
        Self::new()
    }
}
