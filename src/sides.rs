use crate::color::ColorLabel;
use crate::protocol::LEFT_MARKER;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    Left,
    #[default]
    Right,
}

impl Side {
    /// Name used in outbound reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Which side each tile color is sorted to. Everything starts on the right.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SideAssignment {
    sides: [Side; ColorLabel::TILES.len()],
}

fn slot(label: ColorLabel) -> Option<usize> {
    ColorLabel::TILES.iter().position(|&l| l == label)
}

impl SideAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Absent` always maps to the default side.
    pub fn get(&self, label: ColorLabel) -> Side {
        slot(label).map_or(Side::default(), |i| self.sides[i])
    }

    pub fn set(&mut self, label: ColorLabel, side: Side) {
        if let Some(i) = slot(label) {
            self.sides[i] = side;
        }
    }

    /// Applies parsed `(key, value)` pairs. `L` selects left, any other value
    /// selects right. Unknown keys are ignored and colors not named keep
    /// their side. Returns how many entries were written.
    pub fn apply_config<'a, I>(&mut self, assignments: I) -> usize
    where
        I: IntoIterator<Item = (&'a [u8], u8)>,
    {
        let mut applied = 0;
        for (key, value) in assignments {
            let Some(label) = ColorLabel::from_key(key) else {
                log::debug!("Ignoring unknown config key {:?}", key);
                continue;
            };
            let side = if value == LEFT_MARKER {
                Side::Left
            } else {
                Side::Right
            };
            self.set(label, side);
            applied += 1;
        }
        applied
    }
}
