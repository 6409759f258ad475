mod controller;

pub use controller::{VoiceInputController, VoiceSignal, VoiceUpdate};
