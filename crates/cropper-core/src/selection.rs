//! Crop selection state machine.
//!
//! The selection is a value: every event consumes the current [`CropState`]
//! and returns the next one. The session owns the value and swaps it
//! wholesale, so there is never a half-updated rectangle visible to an
//! in-flight extraction.
//!
//! # States
//!
//! ```text
//!            Load                 PointerDown
//!   Idle ───────────▶ Ready ───────────────────▶ Dragging
//!                       ▲                            │
//!                       └── PointerUp / PointerLeave ┘
//! ```
//!
//! `Load` is accepted in every state and always lands in `Ready` with the
//! default centered crop. Events that do not apply to the current state
//! leave it untouched.

use serde::{Deserialize, Serialize};

use crate::geometry::{self, ClampPolicy, CropRect, Dimensions, Point};
use crate::CropperConfig;

/// Natural and displayed size of the loaded image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub natural: Dimensions,
    pub displayed: Dimensions,
}

/// One of the four numeric crop fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropField {
    X,
    Y,
    Width,
    Height,
}

impl CropField {
    /// Look a field up by its form name (`"x"`, `"y"`, `"width"`, `"height"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "x" => Some(CropField::X),
            "y" => Some(CropField::Y),
            "width" => Some(CropField::Width),
            "height" => Some(CropField::Height),
            _ => None,
        }
    }

    fn merge(self, rect: CropRect, value: f64) -> CropRect {
        match self {
            CropField::X => CropRect { x: value, ..rect },
            CropField::Y => CropRect { y: value, ..rect },
            CropField::Width => CropRect {
                width: value,
                ..rect
            },
            CropField::Height => CropRect {
                height: value,
                ..rect
            },
        }
    }
}

/// Input events driving the selection.
#[derive(Debug, Clone, PartialEq)]
pub enum CropEvent {
    /// A new image became measurable.
    Load {
        natural: Dimensions,
        displayed: Dimensions,
    },
    PointerDown(Point),
    PointerMove(Point),
    PointerUp,
    PointerLeave,
    /// Raw text typed into one of the numeric fields.
    SetField(CropField, String),
}

/// Current selection state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CropState {
    /// No image loaded.
    #[default]
    Idle,
    /// Image loaded; the rectangle may be zero-area right after a click.
    Ready { frame: Frame, rect: CropRect },
    /// Pointer held since `anchor`.
    Dragging {
        frame: Frame,
        rect: CropRect,
        anchor: Point,
    },
}

/// Parameters the transitions need from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRules {
    pub min_size: f64,
    pub default_crop_fraction: f64,
    pub clamp_policy: ClampPolicy,
}

impl Default for SelectionRules {
    fn default() -> Self {
        Self {
            min_size: geometry::MIN_SIZE,
            default_crop_fraction: geometry::DEFAULT_CROP_FRACTION,
            clamp_policy: ClampPolicy::Reference,
        }
    }
}

impl From<&CropperConfig> for SelectionRules {
    fn from(config: &CropperConfig) -> Self {
        Self {
            min_size: config.min_size,
            default_crop_fraction: config.default_crop_fraction,
            clamp_policy: config.clamp_policy,
        }
    }
}

impl SelectionRules {
    fn clamp(&self, rect: CropRect, displayed: Dimensions) -> CropRect {
        geometry::clamp_with(self.clamp_policy, rect, displayed, self.min_size)
    }
}

impl CropState {
    /// Apply one event and return the resulting state.
    pub fn apply(self, event: CropEvent, rules: &SelectionRules) -> CropState {
        match (self, event) {
            (_, CropEvent::Load { natural, displayed }) => CropState::Ready {
                frame: Frame { natural, displayed },
                rect: geometry::default_crop_with_fraction(displayed, rules.default_crop_fraction),
            },

            (CropState::Ready { frame, .. }, CropEvent::PointerDown(point)) => {
                CropState::Dragging {
                    frame,
                    rect: CropRect::at(point),
                    anchor: point,
                }
            }

            (CropState::Dragging { frame, anchor, .. }, CropEvent::PointerMove(point)) => {
                let candidate = geometry::rect_from_drag(anchor, point);
                CropState::Dragging {
                    frame,
                    rect: rules.clamp(candidate, frame.displayed),
                    anchor,
                }
            }

            (
                CropState::Dragging { frame, rect, .. },
                CropEvent::PointerUp | CropEvent::PointerLeave,
            ) => CropState::Ready { frame, rect },

            (CropState::Ready { frame, rect }, CropEvent::SetField(field, text)) => {
                let merged = field.merge(rect, parse_field_value(&text));
                CropState::Ready {
                    frame,
                    rect: rules.clamp(merged, frame.displayed),
                }
            }

            (
                CropState::Dragging {
                    frame,
                    rect,
                    anchor,
                },
                CropEvent::SetField(field, text),
            ) => {
                let merged = field.merge(rect, parse_field_value(&text));
                CropState::Dragging {
                    frame,
                    rect: rules.clamp(merged, frame.displayed),
                    anchor,
                }
            }

            (state, _) => state,
        }
    }

    /// Current rectangle, or `None` while idle.
    pub fn rect(&self) -> Option<CropRect> {
        match self {
            CropState::Idle => None,
            CropState::Ready { rect, .. } | CropState::Dragging { rect, .. } => Some(*rect),
        }
    }

    pub fn frame(&self) -> Option<Frame> {
        match self {
            CropState::Idle => None,
            CropState::Ready { frame, .. } | CropState::Dragging { frame, .. } => Some(*frame),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, CropState::Dragging { .. })
    }
}

/// Parse numeric field text the way a lenient integer parse does.
///
/// Leading whitespace and an optional sign are accepted, then an optional
/// `0x` prefix switching to hexadecimal, then as many digits as are present;
/// anything after them is ignored. Text with no leading digits parses as 0,
/// so `"42px"` is 42, `"12.9"` is 12, `"0x1A"` is 26 and `"abc"` is 0.
pub fn parse_field_value(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (radix, digits) = match unsigned.get(..2) {
        Some("0x") | Some("0X") => (16, &unsigned[2..]),
        _ => (10, unsigned),
    };

    let value = digits
        .chars()
        .map_while(|c| c.to_digit(radix))
        .fold(0.0f64, |acc, d| acc * f64::from(radix) + f64::from(d));

    if value == 0.0 {
        0.0
    } else if negative {
        -value
    } else {
        value
    }
}
