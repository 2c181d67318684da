//! Button and rotary encoder inputs.
//!
//! Pins are wired active-low with pull-ups: a pressed button reads `false`.

use anyhow::Result;

/// The five digital inputs, numbered by their BCM GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pin {
    EncoderButton,
    EncoderA,
    EncoderB,
    ViewButton,
    ConfirmButton,
}

impl Pin {
    pub const ALL: [Pin; 5] = [
        Pin::EncoderButton,
        Pin::EncoderA,
        Pin::EncoderB,
        Pin::ViewButton,
        Pin::ConfirmButton,
    ];

    pub fn bcm(self) -> u32 {
        match self {
            Pin::EncoderButton => 17,
            Pin::EncoderA => 15,
            Pin::EncoderB => 14,
            Pin::ViewButton => 18,
            Pin::ConfirmButton => 27,
        }
    }
}

/// Source of raw pin levels. A failed read is fatal to the caller.
pub trait InputPins {
    fn read_pin(&mut self, pin: Pin) -> Result<bool>;
}

impl<T: InputPins + ?Sized> InputPins for Box<T> {
    fn read_pin(&mut self, pin: Pin) -> Result<bool> {
        (**self).read_pin(pin)
    }
}

/// Raw levels of every pin at one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLevels {
    pub view: bool,
    pub confirm: bool,
    pub encoder_a: bool,
    pub encoder_b: bool,
    pub encoder_button: bool,
}

impl Default for InputLevels {
    /// Everything released.
    fn default() -> Self {
        Self {
            view: true,
            confirm: true,
            encoder_a: true,
            encoder_b: true,
            encoder_button: true,
        }
    }
}

impl InputLevels {
    pub fn read(pins: &mut impl InputPins) -> Result<Self> {
        Ok(Self {
            view: pins.read_pin(Pin::ViewButton)?,
            confirm: pins.read_pin(Pin::ConfirmButton)?,
            encoder_a: pins.read_pin(Pin::EncoderA)?,
            encoder_b: pins.read_pin(Pin::EncoderB)?,
            encoder_button: pins.read_pin(Pin::EncoderButton)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderDirection {
    Forward,
    Back,
}

/// Discrete input events derived from two consecutive polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputEdges {
    pub view_pressed: bool,
    pub confirm_pressed: bool,
    pub encoder_rotated: Option<EncoderDirection>,
    /// Level-triggered: true on every poll while the button is held
    pub encoder_button_held: bool,
}

/// Compares each poll with the previous one.
#[derive(Debug)]
pub struct EdgeDetector {
    last: InputLevels,
}

impl EdgeDetector {
    /// Starts from the levels read at startup so a button held during boot
    /// does not register as a press.
    pub fn new(initial: InputLevels) -> Self {
        Self { last: initial }
    }

    pub fn update(&mut self, now: InputLevels) -> InputEdges {
        let falling = |prev: bool, cur: bool| prev && !cur;

        // Direction is B's level at the moment A changes
        let encoder_rotated = if now.encoder_a != self.last.encoder_a {
            Some(if now.encoder_b {
                EncoderDirection::Forward
            } else {
                EncoderDirection::Back
            })
        } else {
            None
        };

        let edges = InputEdges {
            view_pressed: falling(self.last.view, now.view),
            confirm_pressed: falling(self.last.confirm, now.confirm),
            encoder_rotated,
            encoder_button_held: !now.encoder_button,
        };
        self.last = now;
        edges
    }
}
