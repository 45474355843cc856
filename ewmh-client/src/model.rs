use std::{convert, fmt};

use crate::{EwmhError, EwmhResult};

/// Orientation of the desktop grid in `_NET_DESKTOP_LAYOUT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Horz = 0,
    Vert = 1,
}

// Implement format! support
impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

impl convert::TryFrom<u32> for Orientation {
    type Error = EwmhError;

    fn try_from(val: u32) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(Orientation::Horz),
            1 => Ok(Orientation::Vert),
            _ => Err(EwmhError::InvalidLayout(format!("orientation {}", val))),
        }
    }
}

// Convert from &str to Orientation
impl convert::TryFrom<&str> for Orientation {
    type Error = EwmhError;

    fn try_from(val: &str) -> Result<Self, Self::Error> {
        match val.to_lowercase().as_ref() {
            "horz" | "horizontal" => Ok(Orientation::Horz),
            "vert" | "vertical" => Ok(Orientation::Vert),
            _ => Err(EwmhError::InvalidLayout(format!("orientation {}", val))),
        }
    }
}

/// Corner of the desktop grid holding the first desktop in `_NET_DESKTOP_LAYOUT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Corner {
    #[default]
    TopLeft = 0,
    TopRight = 1,
    BottomRight = 2,
    BottomLeft = 3,
}

// Implement format! support
impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomRight => "bottom-right",
            Corner::BottomLeft => "bottom-left",
        };
        write!(f, "{}", name)
    }
}

impl convert::TryFrom<u32> for Corner {
    type Error = EwmhError;

    fn try_from(val: u32) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(Corner::TopLeft),
            1 => Ok(Corner::TopRight),
            2 => Ok(Corner::BottomRight),
            3 => Ok(Corner::BottomLeft),
            _ => Err(EwmhError::InvalidLayout(format!("corner {}", val))),
        }
    }
}

// Convert from &str to Corner
impl convert::TryFrom<&str> for Corner {
    type Error = EwmhError;

    fn try_from(val: &str) -> Result<Self, Self::Error> {
        match val.to_lowercase().as_ref() {
            "top-left" => Ok(Corner::TopLeft),
            "top-right" => Ok(Corner::TopRight),
            "bottom-right" => Ok(Corner::BottomRight),
            "bottom-left" => Ok(Corner::BottomLeft),
            _ => Err(EwmhError::InvalidLayout(format!("corner {}", val))),
        }
    }
}

/// Layout of the virtual desktops as published by a pager.
///
/// Either `columns` or `rows` may be 0, in which case it is derived from the number of desktops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DesktopLayout {
    pub orientation: Orientation,
    pub columns: u32,
    pub rows: u32,
    pub corner: Corner,
}

impl DesktopLayout {
    /// Decode the CARDINAL values of the property. Pagers implementing an early draft only set
    /// the first three, the corner is then top left.
    pub fn from_values(values: &[u32]) -> EwmhResult<DesktopLayout> {
        let (orientation, columns, rows, corner) = match *values {
            [orientation, columns, rows] => (orientation, columns, rows, 0),
            [orientation, columns, rows, corner, ..] => (orientation, columns, rows, corner),
            _ => return Err(EwmhError::InvalidLayout(format!("{} values", values.len())).into()),
        };
        Ok(DesktopLayout {
            orientation: Orientation::try_from(orientation)?,
            columns,
            rows,
            corner: Corner::try_from(corner)?,
        })
    }

    /// Encode as the CARDINAL values of the property
    pub fn to_values(&self) -> [u32; 4] {
        [self.orientation as u32, self.columns, self.rows, self.corner as u32]
    }
}

// Implement format! support
impl fmt::Display for DesktopLayout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}x{} from {}", self.orientation, self.columns, self.rows, self.corner)
    }
}

/// Work area of one desktop, relative to its viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WorkArea {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl From<[u32; 4]> for WorkArea {
    fn from([x, y, width, height]: [u32; 4]) -> Self {
        WorkArea { x, y, width, height }
    }
}

// Implement format! support
impl fmt::Display for WorkArea {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "x: {}, y: {}, w: {}, h: {}", self.x, self.y, self.width, self.height)
    }
}
