#![allow(dead_code)]

use gw_eccentricity::constants::{ModeDict, MODE_22};
use gw_eccentricity::waveform::WaveformBundle;
use num_complex::Complex64;

/// Orbital frequency of the synthetic binary.
pub const ORBITAL_FREQ: f64 = 0.02;
/// Duration of the synthetic waveform; the merger (amplitude peak) is at its end.
pub const DURATION: f64 = 10_000.0;
/// Initial modulation depth of the frequency.
pub const MODULATION: f64 = 0.1;
/// Decay time of the modulation depth.
pub const DECAY_TIME: f64 = 20_000.0;

/// Modulation depth `B(t)` on the input grid `[0, DURATION]`.
pub fn modulation(t_input: f64) -> f64 {
    MODULATION * (-t_input / DECAY_TIME).exp()
}

/// Eccentricity expected from `ω_p = 2n(1 + B)` and `ω_a = 2n(1 - B)`, with `t` on the
/// merger-origin grid.
pub fn expected_ecc(t: f64) -> f64 {
    let b = modulation(t + DURATION);
    let (sp, sa) = ((1.0 + b).sqrt(), (1.0 - b).sqrt());
    (sp - sa) / (sp + sa)
}

/// Eccentric-like (2,2) mode: `h22 = A(t) exp(-i φ22(t))` with
/// `φ22 = 2 n t + 2 B(t) sin(n t)`, so that the frequency oscillates once per orbit,
/// peaking at `n t = 2πk` and dipping at `n t = π(2k + 1)`.
///
/// The amplitude grows monotonically, so the merger is the last sample and the
/// merger-origin grid is `[-DURATION, 0]`.
pub fn eccentric_bundle(dt: f64) -> WaveformBundle {
    let n = (DURATION / dt).round() as usize;
    let t: Vec<f64> = (0..=n).map(|i| i as f64 * dt).collect();
    let h22 = t
        .iter()
        .map(|&ti| {
            let phase = 2.0 * ORBITAL_FREQ * ti + 2.0 * modulation(ti) * (ORBITAL_FREQ * ti).sin();
            Complex64::from_polar(1.0 + ti / DURATION, -phase)
        })
        .collect();
    WaveformBundle::new(t, ModeDict::from([(MODE_22, h22)]))
}

/// Same binary without modulation, on the same grid.
pub fn circular_h22(t: &[f64]) -> Vec<Complex64> {
    t.iter()
        .map(|&ti| Complex64::from_polar(1.0 + ti / DURATION, -2.0 * ORBITAL_FREQ * ti))
        .collect()
}

/// Eccentric waveform together with its quasicircular counterpart.
pub fn eccentric_bundle_with_zeroecc(dt: f64) -> WaveformBundle {
    let bundle = eccentric_bundle(dt);
    let h22_zeroecc = circular_h22(&bundle.t);
    let t_zeroecc = bundle.t.clone();
    bundle.with_zeroecc(t_zeroecc, ModeDict::from([(MODE_22, h22_zeroecc)]))
}

/// Duration of the chirping waveform; its amplitude also peaks at the last sample.
pub const CHIRP_DURATION: f64 = 3_000.0;
/// Orbital frequency of the chirping binary at the first sample.
pub const CHIRP_INITIAL_FREQ: f64 = 0.04;
/// Time over which the orbital frequency of the chirping binary doubles.
pub const CHIRP_TIME: f64 = 6_000.0;
/// Initial frequency modulation depth of the chirping binary.
pub const CHIRP_MODULATION: f64 = 0.05;
/// Initial amplitude modulation depth of the chirping binary; it vanishes at the merger.
pub const CHIRP_AMP_MODULATION: f64 = 0.1;

/// Orbital phase `l(t) = n0 (t + t² / 2τ)` on the input grid.
fn chirp_orbital_phase(t_input: f64) -> f64 {
    CHIRP_INITIAL_FREQ * (t_input + t_input * t_input / (2.0 * CHIRP_TIME))
}

/// Orbital frequency `n(t) = n0 (1 + t / τ)` on the input grid `[0, CHIRP_DURATION]`.
pub fn chirp_orbital_freq(t_input: f64) -> f64 {
    CHIRP_INITIAL_FREQ * (1.0 + t_input / CHIRP_TIME)
}

fn chirp_modulation(t_input: f64) -> f64 {
    CHIRP_MODULATION * (-t_input / CHIRP_TIME).exp()
}

fn chirp_growth(t_input: f64) -> f64 {
    1.0 + 0.5 * t_input / CHIRP_DURATION
}

/// Eccentricity of the chirping binary, with `t` on the merger-origin grid.
pub fn chirp_expected_ecc(t: f64) -> f64 {
    let b = chirp_modulation(t + CHIRP_DURATION);
    let (sp, sa) = ((1.0 + b).sqrt(), (1.0 - b).sqrt());
    (sp - sa) / (sp + sa)
}

/// Chirping binary whose amplitude and frequency both oscillate once per orbit.
///
/// `h22 = A(t) exp(-i φ22(t))` with `φ22 = 2l + 2B(t) sin l` and
/// `A = g(t) (1 + a(t) cos l)`: the amplitude peaks with the frequency at `l = 2πk`.
/// The orbital frequency grows by half over the waveform while `a(t)` falls linearly
/// to zero, so the steadily growing `g(t)` puts the merger at the last sample and
/// the merger-origin grid is `[-CHIRP_DURATION, 0]`.
pub fn chirping_bundle(dt: f64) -> WaveformBundle {
    let n = (CHIRP_DURATION / dt).round() as usize;
    let t: Vec<f64> = (0..=n).map(|i| i as f64 * dt).collect();
    let h22 = t
        .iter()
        .map(|&ti| {
            let l = chirp_orbital_phase(ti);
            let amp_mod = CHIRP_AMP_MODULATION * (1.0 - ti / CHIRP_DURATION);
            let amp = chirp_growth(ti) * (1.0 + amp_mod * l.cos());
            let phase = 2.0 * l + 2.0 * chirp_modulation(ti) * l.sin();
            Complex64::from_polar(amp, -phase)
        })
        .collect();
    WaveformBundle::new(t, ModeDict::from([(MODE_22, h22)]))
}

/// Chirping binary together with its unmodulated counterpart on the same grid.
pub fn chirping_bundle_with_zeroecc(dt: f64) -> WaveformBundle {
    let bundle = chirping_bundle(dt);
    let h22_zeroecc = bundle
        .t
        .iter()
        .map(|&ti| Complex64::from_polar(chirp_growth(ti), -2.0 * chirp_orbital_phase(ti)))
        .collect();
    let t_zeroecc = bundle.t.clone();
    bundle.with_zeroecc(t_zeroecc, ModeDict::from([(MODE_22, h22_zeroecc)]))
}

/// Route `tracing` output through the test harness; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
