//! Pitch helpers for the frequency control: note names ↔ Hz.
//!
//! Equal temperament with A4 = 440 Hz (MIDI 69).

use serde::Serialize;

/// Reference pitch for A4.
pub const A4_HZ: f64 = 440.0;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Semitone offset from C for a note name like "C#", "Eb", "A".
///
/// Accidentals may step outside the octave: "Cb" is -1 and "B#" is 12, so
/// `note_to_midi` carries into the neighbouring octave. Unknown names
/// resolve to C.
pub fn note_semitone(note: &str) -> i32 {
    let mut chars = note.chars();
    let base = match chars.next() {
        Some('C') => 0,
        Some('D') => 2,
        Some('E') => 4,
        Some('F') => 5,
        Some('G') => 7,
        Some('A') => 9,
        Some('B') => 11,
        _ => return 0,
    };
    match chars.as_str() {
        "" => base,
        "#" => base + 1,
        "b" => base - 1,
        _ => 0,
    }
}

/// MIDI note number: C4 = 60.
pub fn note_to_midi(note: &str, octave: i32) -> i32 {
    12 + octave * 12 + note_semitone(note)
}

/// Convert a MIDI note number to Hz.
pub fn midi_to_frequency(midi: f64) -> f64 {
    A4_HZ * (2.0_f64).powf((midi - 69.0) / 12.0)
}

/// Frequency of `note` in `octave`, e.g. `("A", 4)` → 440 Hz.
pub fn note_to_frequency(note: &str, octave: i32) -> f64 {
    midi_to_frequency(note_to_midi(note, octave) as f64)
}

/// The equal-tempered note closest to a frequency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestNote {
    pub note: &'static str,
    pub octave: i32,
    /// Offset from the note in cents, rounded, within ±50.
    pub cents: i32,
}

/// Find the nearest note to `frequency`. `None` unless the frequency is
/// finite and positive.
pub fn nearest_note(frequency: f64) -> Option<NearestNote> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return None;
    }
    let midi = 12.0 * (frequency / A4_HZ).log2() + 69.0;
    let rounded = midi.round();
    let cents = ((midi - rounded) * 100.0).round() as i32;
    let rounded = rounded as i32;
    Some(NearestNote {
        note: NOTE_NAMES[rounded.rem_euclid(12) as usize],
        octave: (rounded - 12).div_euclid(12),
        cents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_440() {
        assert!((note_to_frequency("A", 4) - 440.0).abs() < 1e-9);
    }

    #[test]
    fn c4_is_middle_c() {
        assert_eq!(note_to_midi("C", 4), 60);
        let f = note_to_frequency("C", 4);
        assert!((f - 261.626).abs() < 0.01, "C4 should be ~261.63Hz, got {f}");
    }

    #[test]
    fn accidentals_are_enharmonic() {
        assert_eq!(note_semitone("F#"), note_semitone("Gb"));
        assert_eq!(note_semitone("Db"), 1);
        assert_eq!(note_semitone("Cb"), -1);
        assert_eq!(note_semitone("H"), 0);
    }

    #[test]
    fn accidentals_carry_across_octaves() {
        assert_eq!(note_to_midi("Cb", 4), note_to_midi("B", 3));
        assert_eq!(note_to_midi("B#", 4), note_to_midi("C", 5));
        assert_eq!(note_to_midi("E#", 4), note_to_midi("F", 4));
        let f = note_to_frequency("Cb", 4);
        assert!((f - 246.94).abs() < 0.01, "Cb4 should be B3 ~246.94Hz, got {f}");
        let f = note_to_frequency("B#", 4);
        assert!((f - 523.25).abs() < 0.01, "B#4 should be C5 ~523.25Hz, got {f}");
    }

    #[test]
    fn nearest_note_rejects_non_positive() {
        assert_eq!(nearest_note(0.0), None);
        assert_eq!(nearest_note(-220.0), None);
        assert_eq!(nearest_note(f64::NAN), None);
        assert_eq!(nearest_note(f64::INFINITY), None);
    }

    #[test]
    fn nearest_note_of_default_pitch() {
        let n = nearest_note(220.0).unwrap();
        assert_eq!(n, NearestNote { note: "A", octave: 3, cents: 0 });
    }

    #[test]
    fn nearest_note_reports_cents() {
        let f = midi_to_frequency(60.0 + 0.2);
        let n = nearest_note(f).unwrap();
        assert_eq!(n.note, "C");
        assert_eq!(n.octave, 4);
        assert_eq!(n.cents, 20);
    }

    #[test]
    fn round_trip_every_note_in_range() {
        for octave in 1..7 {
            for name in NOTE_NAMES {
                let n = nearest_note(note_to_frequency(name, octave)).unwrap();
                assert_eq!((n.note, n.octave, n.cents), (name, octave, 0));
            }
        }
    }
}
