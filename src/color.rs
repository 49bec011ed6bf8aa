use crate::sensor::AveragedSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorLabel {
    Red,
    Green,
    Blue,
    Black,
    White,
    Orange,
    Yellow,
    Purple,
    Brown,
    Absent,
}

impl ColorLabel {
    /// Every label that names a tile, in classification order.
    pub const TILES: [ColorLabel; 9] = [
        ColorLabel::Red,
        ColorLabel::Green,
        ColorLabel::Blue,
        ColorLabel::Black,
        ColorLabel::White,
        ColorLabel::Orange,
        ColorLabel::Yellow,
        ColorLabel::Purple,
        ColorLabel::Brown,
    ];

    /// Name used in outbound reports.
    pub fn as_str(self) -> &'static str {
        match self {
            ColorLabel::Red => "red",
            ColorLabel::Green => "green",
            ColorLabel::Blue => "blue",
            ColorLabel::Black => "black",
            ColorLabel::White => "white",
            ColorLabel::Orange => "orange",
            ColorLabel::Yellow => "yellow",
            ColorLabel::Purple => "purple",
            ColorLabel::Brown => "brown",
            ColorLabel::Absent => "absent",
        }
    }

    /// Looks up a configuration key (`Red`, `Green`, ...). `Absent` has no key.
    pub fn from_key(key: &[u8]) -> Option<Self> {
        let label = match key {
            b"Red" => ColorLabel::Red,
            b"Green" => ColorLabel::Green,
            b"Blue" => ColorLabel::Blue,
            b"Black" => ColorLabel::Black,
            b"White" => ColorLabel::White,
            b"Orange" => ColorLabel::Orange,
            b"Yellow" => ColorLabel::Yellow,
            b"Purple" => ColorLabel::Purple,
            b"Brown" => ColorLabel::Brown,
            _ => return None,
        };
        Some(label)
    }

    pub fn is_tile(self) -> bool {
        self != ColorLabel::Absent
    }
}

/// Test applied to one averaged channel.
#[derive(Debug, Clone, Copy)]
enum Level {
    /// `>= min`
    AtLeast(u16),
    /// `> min`
    Above(u16),
    /// `min < x < max`
    Between(u16, u16),
}

impl Level {
    fn matches(self, x: u16) -> bool {
        match self {
            Level::AtLeast(min) => x >= min,
            Level::Above(min) => x > min,
            Level::Between(min, max) => x > min && x < max,
        }
    }
}

// Calibration for the VEML3328 at 4x gain, 400 ms integration, lamp on.

const RED_R_MIN: u16 = 50000;
const RED_G: (u16, u16) = (21000, 26000);
const RED_B: (u16, u16) = (21000, 26000);

const GREEN_R: (u16, u16) = (9000, 13000);
const GREEN_G: (u16, u16) = (31000, 36500);
const GREEN_B: (u16, u16) = (30000, 35000);

const BLUE_R: (u16, u16) = (10500, 15000);
const BLUE_G: (u16, u16) = (46000, 52500);
const BLUE_B_MIN: u16 = 63000;

const BLACK_R: (u16, u16) = (7000, 11000);
const BLACK_G: (u16, u16) = (12000, 16500);
const BLACK_B: (u16, u16) = (17500, 22000);
const BLACK_DARK_R: (u16, u16) = (5500, 8500);
const BLACK_DARK_G: (u16, u16) = (9000, 12000);
const BLACK_DARK_B: (u16, u16) = (11000, 15000);

const WHITE_R_MIN: u16 = 62000;
const WHITE_G_MIN: u16 = 64500;
const WHITE_B_MIN: u16 = 64500;
const WHITE_DIM_R: (u16, u16) = (25000, 33000);
const WHITE_DIM_G: (u16, u16) = (33000, 44000);
const WHITE_DIM_B_MIN: u16 = 50000;

const ORANGE_R_MIN: u16 = 57000;
const ORANGE_G: (u16, u16) = (22500, 27500);
const ORANGE_B: (u16, u16) = (16000, 23500);

const YELLOW_R_MIN: u16 = 63000;
const YELLOW_G_MIN: u16 = 64000;
const YELLOW_B: (u16, u16) = (33000, 39000);

const PURPLE_R_MIN: u16 = 48000;
const PURPLE_G: (u16, u16) = (21000, 27500);
const PURPLE_B: (u16, u16) = (31000, 37500);

const BROWN_R: (u16, u16) = (12000, 17000);
const BROWN_G: (u16, u16) = (14000, 18500);
const BROWN_B: (u16, u16) = (17000, 23500);

const fn between(range: (u16, u16)) -> Level {
    Level::Between(range.0, range.1)
}

/// Bands in precedence order. The first band whose three channel tests all
/// pass decides the label. Black and white each have a second, darker band.
const BANDS: [(ColorLabel, [Level; 3]); 11] = [
    (
        ColorLabel::Red,
        [Level::AtLeast(RED_R_MIN), between(RED_G), between(RED_B)],
    ),
    (
        ColorLabel::Green,
        [between(GREEN_R), between(GREEN_G), between(GREEN_B)],
    ),
    (
        ColorLabel::Blue,
        [between(BLUE_R), between(BLUE_G), Level::Above(BLUE_B_MIN)],
    ),
    (
        ColorLabel::Black,
        [between(BLACK_R), between(BLACK_G), between(BLACK_B)],
    ),
    (
        ColorLabel::Black,
        [
            between(BLACK_DARK_R),
            between(BLACK_DARK_G),
            between(BLACK_DARK_B),
        ],
    ),
    (
        ColorLabel::White,
        [
            Level::Above(WHITE_R_MIN),
            Level::Above(WHITE_G_MIN),
            Level::Above(WHITE_B_MIN),
        ],
    ),
    (
        ColorLabel::White,
        [
            between(WHITE_DIM_R),
            between(WHITE_DIM_G),
            Level::Above(WHITE_DIM_B_MIN),
        ],
    ),
    (
        ColorLabel::Orange,
        [Level::Above(ORANGE_R_MIN), between(ORANGE_G), between(ORANGE_B)],
    ),
    (
        ColorLabel::Yellow,
        [
            Level::Above(YELLOW_R_MIN),
            Level::Above(YELLOW_G_MIN),
            between(YELLOW_B),
        ],
    ),
    (
        ColorLabel::Purple,
        [Level::Above(PURPLE_R_MIN), between(PURPLE_G), between(PURPLE_B)],
    ),
    (
        ColorLabel::Brown,
        [between(BROWN_R), between(BROWN_G), between(BROWN_B)],
    ),
];

/// Maps an averaged reading to a label. First matching band wins; no match
/// means no tile is in front of the sensor.
pub fn classify(sample: AveragedSample) -> ColorLabel {
    let channels = [sample.red, sample.green, sample.blue];

    for (label, levels) in BANDS {
        if levels
            .iter()
            .zip(channels)
            .all(|(level, value)| level.matches(value))
        {
            return label;
        }
    }

    ColorLabel::Absent
}
