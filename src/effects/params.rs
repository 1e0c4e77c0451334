//! Parameter blocks of the built-in effects.
//!
//! Every numeric field is a [`Param`] carrying its legal range. Values
//! outside the range are clamped on assignment; there is no error path.

use crate::math::Vec3;
use std::fmt::Debug;

/// Values that can be clamped into an inclusive range.
pub trait ParamValue: Copy + PartialEq + Debug {
    fn clamp_to(self, min: Self, max: Self) -> Self;
}

impl ParamValue for f32 {
    fn clamp_to(self, min: Self, max: Self) -> Self {
        // `max` first so NaN collapses to the lower bound
        self.max(min).min(max)
    }
}

impl ParamValue for i32 {
    fn clamp_to(self, min: Self, max: Self) -> Self {
        self.max(min).min(max)
    }
}

impl ParamValue for Vec3 {
    fn clamp_to(self, min: Self, max: Self) -> Self {
        self.max(min).min(max)
    }
}

/// A bounded effect parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param<T> {
    value: T,
    min: T,
    max: T,
}

impl<T: ParamValue> Param<T> {
    pub fn new(value: T, min: T, max: T) -> Self {
        Self {
            value: value.clamp_to(min, max),
            min,
            max,
        }
    }

    pub fn get(&self) -> T {
        self.value
    }

    /// Stores `value` clamped to `[min, max]`.
    pub fn set(&mut self, value: T) {
        self.value = value.clamp_to(self.min, self.max);
    }

    pub fn min(&self) -> T {
        self.min
    }

    pub fn max(&self) -> T {
        self.max
    }
}

fn pan() -> Param<Vec3> {
    Param::new(Vec3::ZERO, Vec3::splat(-1.0), Vec3::ONE)
}

#[derive(Debug, Clone, PartialEq)]
pub struct EaxReverbParams {
    pub density: Param<f32>,
    pub diffusion: Param<f32>,
    pub gain: Param<f32>,
    pub gain_hf: Param<f32>,
    pub gain_lf: Param<f32>,
    /// Seconds
    pub decay_time: Param<f32>,
    pub decay_hf_ratio: Param<f32>,
    pub decay_lf_ratio: Param<f32>,
    pub reflections_gain: Param<f32>,
    /// Seconds
    pub reflections_delay: Param<f32>,
    pub reflections_pan: Param<Vec3>,
    pub late_reverb_gain: Param<f32>,
    /// Seconds
    pub late_reverb_delay: Param<f32>,
    pub late_reverb_pan: Param<Vec3>,
    pub echo_time: Param<f32>,
    pub echo_depth: Param<f32>,
    /// Seconds
    pub modulation_time: Param<f32>,
    pub modulation_depth: Param<f32>,
    pub air_absorption_gain_hf: Param<f32>,
    /// Hz
    pub hf_reference: Param<f32>,
    /// Hz
    pub lf_reference: Param<f32>,
    pub room_rolloff_factor: Param<f32>,
    pub decay_hf_limit: bool,
}

impl Default for EaxReverbParams {
    fn default() -> Self {
        Self {
            density: Param::new(1.0, 0.0, 1.0),
            diffusion: Param::new(1.0, 0.0, 1.0),
            gain: Param::new(0.32, 0.0, 1.0),
            gain_hf: Param::new(0.89, 0.0, 1.0),
            gain_lf: Param::new(1.0, 0.0, 1.0),
            decay_time: Param::new(1.49, 0.1, 20.0),
            decay_hf_ratio: Param::new(0.83, 0.1, 2.0),
            decay_lf_ratio: Param::new(1.0, 0.1, 2.0),
            reflections_gain: Param::new(0.05, 0.0, 3.16),
            reflections_delay: Param::new(0.007, 0.0, 0.3),
            reflections_pan: pan(),
            late_reverb_gain: Param::new(1.26, 0.0, 10.0),
            late_reverb_delay: Param::new(0.011, 0.0, 0.1),
            late_reverb_pan: pan(),
            echo_time: Param::new(0.25, 0.075, 0.25),
            echo_depth: Param::new(0.0, 0.0, 1.0),
            modulation_time: Param::new(0.25, 0.004, 4.0),
            modulation_depth: Param::new(0.0, 0.0, 1.0),
            air_absorption_gain_hf: Param::new(0.994, 0.892, 1.0),
            hf_reference: Param::new(5000.0, 1000.0, 20000.0),
            lf_reference: Param::new(250.0, 20.0, 1000.0),
            room_rolloff_factor: Param::new(0.0, 0.0, 10.0),
            decay_hf_limit: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReverbParams {
    pub density: Param<f32>,
    pub diffusion: Param<f32>,
    pub gain: Param<f32>,
    pub gain_hf: Param<f32>,
    pub decay_time: Param<f32>,
    pub decay_hf_ratio: Param<f32>,
    pub reflections_gain: Param<f32>,
    pub reflections_delay: Param<f32>,
    pub late_reverb_gain: Param<f32>,
    pub late_reverb_delay: Param<f32>,
    pub air_absorption_gain_hf: Param<f32>,
    pub room_rolloff_factor: Param<f32>,
    pub decay_hf_limit: bool,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            density: Param::new(1.0, 0.0, 1.0),
            diffusion: Param::new(1.0, 0.0, 1.0),
            gain: Param::new(0.32, 0.0, 1.0),
            gain_hf: Param::new(0.89, 0.0, 1.0),
            decay_time: Param::new(1.49, 0.1, 20.0),
            decay_hf_ratio: Param::new(0.83, 0.1, 2.0),
            reflections_gain: Param::new(0.05, 0.0, 3.16),
            reflections_delay: Param::new(0.007, 0.0, 0.3),
            late_reverb_gain: Param::new(1.26, 0.0, 10.0),
            late_reverb_delay: Param::new(0.011, 0.0, 0.1),
            air_absorption_gain_hf: Param::new(0.994, 0.892, 1.0),
            room_rolloff_factor: Param::new(0.0, 0.0, 10.0),
            decay_hf_limit: true,
        }
    }
}

/// LFO shape of modulation effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    Sinusoid,
    #[default]
    Triangle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChorusParams {
    pub waveform: Waveform,
    /// Degrees
    pub phase: Param<i32>,
    /// Hz
    pub rate: Param<f32>,
    pub depth: Param<f32>,
    pub feedback: Param<f32>,
    /// Seconds
    pub delay: Param<f32>,
}

impl Default for ChorusParams {
    fn default() -> Self {
        Self {
            waveform: Waveform::Triangle,
            phase: Param::new(90, -180, 180),
            rate: Param::new(1.1, 0.0, 10.0),
            depth: Param::new(0.1, 0.0, 1.0),
            feedback: Param::new(0.25, -1.0, 1.0),
            delay: Param::new(0.016, 0.0, 0.016),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistortionParams {
    pub edge: Param<f32>,
    pub gain: Param<f32>,
    pub lowpass_cutoff: Param<f32>,
    pub eq_center: Param<f32>,
    pub eq_bandwidth: Param<f32>,
}

impl Default for DistortionParams {
    fn default() -> Self {
        Self {
            edge: Param::new(0.2, 0.0, 1.0),
            gain: Param::new(0.05, 0.01, 1.0),
            lowpass_cutoff: Param::new(8000.0, 80.0, 24000.0),
            eq_center: Param::new(3600.0, 80.0, 24000.0),
            eq_bandwidth: Param::new(3600.0, 80.0, 24000.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EchoParams {
    pub delay: Param<f32>,
    pub lr_delay: Param<f32>,
    pub damping: Param<f32>,
    pub feedback: Param<f32>,
    pub spread: Param<f32>,
}

impl Default for EchoParams {
    fn default() -> Self {
        Self {
            delay: Param::new(0.1, 0.0, 0.207),
            lr_delay: Param::new(0.1, 0.0, 0.404),
            damping: Param::new(0.5, 0.0, 0.99),
            feedback: Param::new(0.5, 0.0, 1.0),
            spread: Param::new(-1.0, -1.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlangerParams {
    pub waveform: Waveform,
    pub phase: Param<i32>,
    pub rate: Param<f32>,
    pub depth: Param<f32>,
    pub feedback: Param<f32>,
    pub delay: Param<f32>,
}

impl Default for FlangerParams {
    fn default() -> Self {
        Self {
            waveform: Waveform::Triangle,
            phase: Param::new(90, -180, 180),
            rate: Param::new(0.27, 0.0, 10.0),
            depth: Param::new(1.0, 0.0, 1.0),
            feedback: Param::new(-0.5, -1.0, 1.0),
            delay: Param::new(0.002, 0.0, 0.004),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftDirection {
    #[default]
    Down,
    Up,
    Off,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyShifterParams {
    /// Hz
    pub frequency: Param<f32>,
    pub left_direction: ShiftDirection,
    pub right_direction: ShiftDirection,
}

impl Default for FrequencyShifterParams {
    fn default() -> Self {
        Self {
            frequency: Param::new(0.0, 0.0, 24000.0),
            left_direction: ShiftDirection::Down,
            right_direction: ShiftDirection::Down,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MorpherWaveform {
    #[default]
    Sinusoid,
    Triangle,
    Sawtooth,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VocalMorpherParams {
    /// Phoneme index, 0 ("A") to 29 ("Z")
    pub phoneme_a: Param<i32>,
    pub phoneme_b: Param<i32>,
    /// Semitones
    pub phoneme_a_coarse_tuning: Param<i32>,
    /// Semitones
    pub phoneme_b_coarse_tuning: Param<i32>,
    pub waveform: MorpherWaveform,
    pub rate: Param<f32>,
}

impl Default for VocalMorpherParams {
    fn default() -> Self {
        Self {
            phoneme_a: Param::new(0, 0, 29),
            phoneme_b: Param::new(10, 0, 29),
            phoneme_a_coarse_tuning: Param::new(0, -24, 24),
            phoneme_b_coarse_tuning: Param::new(0, -24, 24),
            waveform: MorpherWaveform::Sinusoid,
            rate: Param::new(1.41, 0.0, 10.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PitchShifterParams {
    /// Semitones
    pub coarse_tune: Param<i32>,
    /// Cents
    pub fine_tune: Param<i32>,
}

impl Default for PitchShifterParams {
    fn default() -> Self {
        Self {
            coarse_tune: Param::new(12, -12, 12),
            fine_tune: Param::new(0, -50, 50),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModulatorWaveform {
    #[default]
    Sinusoid,
    Sawtooth,
    Square,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RingModulatorParams {
    pub frequency: Param<f32>,
    pub highpass_cutoff: Param<f32>,
    pub waveform: ModulatorWaveform,
}

impl Default for RingModulatorParams {
    fn default() -> Self {
        Self {
            frequency: Param::new(440.0, 0.0, 8000.0),
            highpass_cutoff: Param::new(800.0, 0.0, 24000.0),
            waveform: ModulatorWaveform::Sinusoid,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AutowahParams {
    pub attack_time: Param<f32>,
    pub release_time: Param<f32>,
    pub resonance: Param<f32>,
    pub peak_gain: Param<f32>,
}

impl Default for AutowahParams {
    fn default() -> Self {
        Self {
            attack_time: Param::new(0.06, 0.0001, 1.0),
            release_time: Param::new(0.06, 0.0001, 1.0),
            resonance: Param::new(1000.0, 2.0, 1000.0),
            peak_gain: Param::new(11.22, 0.00003, 31621.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompressorParams {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EqualizerParams {
    pub low_gain: Param<f32>,
    pub low_cutoff: Param<f32>,
    pub mid1_gain: Param<f32>,
    pub mid1_center: Param<f32>,
    pub mid1_width: Param<f32>,
    pub mid2_gain: Param<f32>,
    pub mid2_center: Param<f32>,
    pub mid2_width: Param<f32>,
    pub high_gain: Param<f32>,
    pub high_cutoff: Param<f32>,
}

impl Default for EqualizerParams {
    fn default() -> Self {
        Self {
            low_gain: Param::new(1.0, 0.126, 7.943),
            low_cutoff: Param::new(200.0, 50.0, 800.0),
            mid1_gain: Param::new(1.0, 0.126, 7.943),
            mid1_center: Param::new(500.0, 200.0, 3000.0),
            mid1_width: Param::new(1.0, 0.01, 1.0),
            mid2_gain: Param::new(1.0, 0.126, 7.943),
            mid2_center: Param::new(3000.0, 1000.0, 8000.0),
            mid2_width: Param::new(1.0, 0.01, 1.0),
            high_gain: Param::new(1.0, 0.126, 7.943),
            high_cutoff: Param::new(6000.0, 4000.0, 16000.0),
        }
    }
}

/// DSP type of a hardware effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    EaxReverb,
    Reverb,
    Chorus,
    Distortion,
    Echo,
    Flanger,
    FrequencyShifter,
    VocalMorpher,
    PitchShifter,
    RingModulator,
    Autowah,
    Compressor,
    Equalizer,
}

/// Parameter block for one of the built-in effect kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectParams {
    EaxReverb(EaxReverbParams),
    Reverb(ReverbParams),
    Chorus(ChorusParams),
    Distortion(DistortionParams),
    Echo(EchoParams),
    Flanger(FlangerParams),
    FrequencyShifter(FrequencyShifterParams),
    VocalMorpher(VocalMorpherParams),
    PitchShifter(PitchShifterParams),
    RingModulator(RingModulatorParams),
    Autowah(AutowahParams),
    Compressor(CompressorParams),
    Equalizer(EqualizerParams),
}

impl EffectParams {
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::EaxReverb(_) => EffectKind::EaxReverb,
            Self::Reverb(_) => EffectKind::Reverb,
            Self::Chorus(_) => EffectKind::Chorus,
            Self::Distortion(_) => EffectKind::Distortion,
            Self::Echo(_) => EffectKind::Echo,
            Self::Flanger(_) => EffectKind::Flanger,
            Self::FrequencyShifter(_) => EffectKind::FrequencyShifter,
            Self::VocalMorpher(_) => EffectKind::VocalMorpher,
            Self::PitchShifter(_) => EffectKind::PitchShifter,
            Self::RingModulator(_) => EffectKind::RingModulator,
            Self::Autowah(_) => EffectKind::Autowah,
            Self::Compressor(_) => EffectKind::Compressor,
            Self::Equalizer(_) => EffectKind::Equalizer,
        }
    }

    /// Parameter block with every field at its default.
    pub fn default_for(kind: EffectKind) -> Self {
        match kind {
            EffectKind::EaxReverb => Self::EaxReverb(Default::default()),
            EffectKind::Reverb => Self::Reverb(Default::default()),
            EffectKind::Chorus => Self::Chorus(Default::default()),
            EffectKind::Distortion => Self::Distortion(Default::default()),
            EffectKind::Echo => Self::Echo(Default::default()),
            EffectKind::Flanger => Self::Flanger(Default::default()),
            EffectKind::FrequencyShifter => Self::FrequencyShifter(Default::default()),
            EffectKind::VocalMorpher => Self::VocalMorpher(Default::default()),
            EffectKind::PitchShifter => Self::PitchShifter(Default::default()),
            EffectKind::RingModulator => Self::RingModulator(Default::default()),
            EffectKind::Autowah => Self::Autowah(Default::default()),
            EffectKind::Compressor => Self::Compressor(Default::default()),
            EffectKind::Equalizer => Self::Equalizer(Default::default()),
        }
    }
}

impl Default for EffectParams {
    fn default() -> Self {
        Self::Reverb(ReverbParams::default())
    }
}

macro_rules! impl_from_params {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for EffectParams {
                fn from(params: $ty) -> Self {
                    Self::$variant(params)
                }
            }
        )*
    };
}

impl_from_params!(
    EaxReverb(EaxReverbParams),
    Reverb(ReverbParams),
    Chorus(ChorusParams),
    Distortion(DistortionParams),
    Echo(EchoParams),
    Flanger(FlangerParams),
    FrequencyShifter(FrequencyShifterParams),
    VocalMorpher(VocalMorpherParams),
    PitchShifter(PitchShifterParams),
    RingModulator(RingModulatorParams),
    Autowah(AutowahParams),
    Compressor(CompressorParams),
    Equalizer(EqualizerParams),
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_values_clamp_silently() {
        let mut reverb = ReverbParams::default();
        reverb.gain.set(4.0);
        reverb.decay_time.set(0.0);
        assert_eq!(reverb.gain.get(), 1.0);
        assert_eq!(reverb.decay_time.get(), 0.1);

        reverb.gain.set(0.5);
        assert_eq!(reverb.gain.get(), 0.5);
    }

    #[test]
    fn nan_clamps_to_lower_bound() {
        let mut echo = EchoParams::default();
        echo.damping.set(f32::NAN);
        assert_eq!(echo.damping.get(), 0.0);
    }

    #[test]
    fn integer_and_vector_params_clamp() {
        let mut pitch = PitchShifterParams::default();
        pitch.fine_tune.set(-90);
        assert_eq!(pitch.fine_tune.get(), -50);

        let mut eax = EaxReverbParams::default();
        eax.late_reverb_pan.set(Vec3::new(2.0, -0.5, -3.0));
        assert_eq!(eax.late_reverb_pan.get(), Vec3::new(1.0, -0.5, -1.0));
    }

    #[test]
    fn defaults_sit_inside_their_ranges() {
        let autowah = AutowahParams::default();
        assert_eq!(autowah.attack_time.get(), 0.06);
        assert_eq!(autowah.attack_time.min(), 0.0001);
        assert!(!CompressorParams::default().enabled);
        assert_eq!(FlangerParams::default().phase.get(), 90);
    }

    #[test]
    fn default_for_matches_kind() {
        for kind in [
            EffectKind::EaxReverb,
            EffectKind::Chorus,
            EffectKind::VocalMorpher,
            EffectKind::Equalizer,
        ] {
            assert_eq!(EffectParams::default_for(kind).kind(), kind);
        }
        let params: EffectParams = DistortionParams::default().into();
        assert_eq!(params.kind(), EffectKind::Distortion);
    }
}
