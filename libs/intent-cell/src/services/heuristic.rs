//! Local scoring classifier used when the remote tier is unavailable.
//!
//! Each intent owns a list of weighted cues in English, romanised Hindi and
//! Marathi, and Devanagari. A cue scores once if it occurs anywhere in the
//! lowercased utterance. The best intent wins only with a score of at least
//! [`MIN_SCORE`] and a strict lead over the runner-up; anything else is
//! inconclusive and left to the keyword tier.

use crate::models::Intent;

pub const MIN_SCORE: u32 = 2;

const BOOKING_CUES: &[(&str, u32)] = &[
    ("appointment", 2),
    ("book", 2),
    ("schedule", 2),
    ("consult", 2),
    ("checkup", 2),
    ("check-up", 2),
    ("see a doctor", 2),
    ("doctor", 1),
    ("visit", 1),
    ("slot", 1),
    ("milna", 1),
    ("dikhana", 2),
    ("अपॉइंटमेंट", 2),
    ("बुक", 2),
    ("दिखाना", 2),
    ("तपासणी", 2),
    ("डॉक्टर", 1),
    ("भेट", 1),
];

const INFO_CUES: &[(&str, u32)] = &[
    ("address", 2),
    ("location", 2),
    ("where is", 2),
    ("timing", 2),
    ("opening hours", 2),
    ("facilities", 2),
    ("kahan", 2),
    ("services", 1),
    ("hours", 1),
    ("about", 1),
    ("hospital", 1),
    ("पता", 2),
    ("पत्ता", 2),
    ("कहाँ", 2),
    ("कुठे", 2),
    ("अस्पताल", 1),
    ("रुग्णालय", 1),
];

const CONTACT_CUES: &[(&str, u32)] = &[
    ("contact", 2),
    ("phone", 2),
    ("email", 2),
    ("e-mail", 2),
    ("helpline", 2),
    ("number", 1),
    ("call", 1),
    ("reach", 1),
    ("संपर्क", 2),
    ("फोन", 2),
    ("ईमेल", 2),
    ("नंबर", 1),
];

fn score(text: &str, cues: &[(&str, u32)]) -> u32 {
    cues.iter()
        .filter(|(cue, _)| text.contains(cue))
        .map(|(_, weight)| weight)
        .sum()
}

/// `None` when the utterance carries no conclusive signal.
pub fn classify(text: &str) -> Option<Intent> {
    let text = text.to_lowercase();

    let mut scores = [
        (Intent::BookAppointment, score(&text, BOOKING_CUES)),
        (Intent::HospitalInfo, score(&text, INFO_CUES)),
        (Intent::ContactInfo, score(&text, CONTACT_CUES)),
    ];
    scores.sort_by(|a, b| b.1.cmp(&a.1));

    let (best, best_score) = scores[0];
    let runner_up = scores[1].1;

    if best_score >= MIN_SCORE && best_score > runner_up {
        Some(best)
    } else {
        None
    }
}
