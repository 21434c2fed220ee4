// Layered drawing surface. The host owns the actual canvases; the board only ever talks to
// this trait. All layers have the same size in device pixels.

use std::fmt;

use enum_map::{Enum, EnumMap};
use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::display::PixelPoint;
use crate::piece::Piece;


// Bottom to top.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Enum, EnumIter)]
pub enum Layer {
    Squares,
    Pieces,
    Overlay,
}

// Serialized as "#rrggbb".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TextAlign {
    TopLeft,
    BottomRight,
}

#[derive(Clone, PartialEq, Debug)]
pub enum DrawCommand {
    FillRect {
        pivot: PixelPoint,
        width: f64,
        height: f64,
        color: Color,
        opacity: f64,
    },
    FillCircle {
        center: PixelPoint,
        radius: f64,
        color: Color,
        opacity: f64,
    },
    StrokeCircle {
        center: PixelPoint,
        radius: f64,
        line_width: f64,
        color: Color,
        opacity: f64,
    },
    Polyline {
        points: Vec<PixelPoint>,
        line_width: f64,
        color: Color,
        opacity: f64,
    },
    Polygon {
        points: Vec<PixelPoint>,
        color: Color,
        opacity: f64,
    },
    // Piece art is resolved by the host. `pivot` is the top-left corner of a `size`x`size` box.
    Piece {
        piece: Piece,
        pivot: PixelPoint,
        size: f64,
    },
    Text {
        text: String,
        anchor: PixelPoint,
        align: TextAlign,
        font_size: f64,
        color: Color,
    },
}

pub trait Surface {
    fn resize(&mut self, width_px: u32, height_px: u32);
    fn pixel_size(&self) -> (u32, u32);
    fn clear(&mut self, layer: Layer);
    fn draw(&mut self, layer: Layer, command: DrawCommand);
}

// Headless surface that keeps the commands issued since the last `clear` of each layer.
// Hosts can replay them onto real canvases; tests inspect them.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    width_px: u32,
    height_px: u32,
    layers: EnumMap<Layer, Vec<DrawCommand>>,
    clear_counts: EnumMap<Layer, usize>,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self { Color { r, g, b } }

    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Color { r: channel(0)?, g: channel(2)?, b: channel(4)? })
    }

    pub fn to_hex(self) -> String { format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b) }
}

impl TryFrom<String> for Color {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::from_hex(&s).ok_or_else(|| format!("invalid color: {s}"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self { color.to_hex() }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Color({})", self.to_hex()) }
}

impl RecordingSurface {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        RecordingSurface { width_px, height_px, ..Default::default() }
    }

    pub fn commands(&self, layer: Layer) -> &[DrawCommand] { &self.layers[layer] }
    pub fn clear_count(&self, layer: Layer) -> usize { self.clear_counts[layer] }

    pub fn pieces(&self) -> impl Iterator<Item = (Piece, PixelPoint, f64)> + '_ {
        self.layers[Layer::Pieces].iter().filter_map(|cmd| match cmd {
            DrawCommand::Piece { piece, pivot, size } => Some((*piece, *pivot, *size)),
            _ => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn resize(&mut self, width_px: u32, height_px: u32) {
        self.width_px = width_px;
        self.height_px = height_px;
        for commands in self.layers.values_mut() {
            commands.clear();
        }
    }
    fn pixel_size(&self) -> (u32, u32) { (self.width_px, self.height_px) }
    fn clear(&mut self, layer: Layer) {
        self.layers[layer].clear();
        self.clear_counts[layer] += 1;
    }
    fn draw(&mut self, layer: Layer, command: DrawCommand) { self.layers[layer].push(command); }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_hex() {
        assert_eq!(Color::from_hex("#ff8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(Color::rgb(1, 2, 254).to_hex(), "#0102fe");
        assert_eq!(Color::from_hex("ff8000"), None);
        assert_eq!(Color::from_hex("#ff80"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
    }

    #[test]
    fn recording_surface_layers() {
        let mut surface = RecordingSurface::new(80, 80);
        let rect = DrawCommand::FillRect {
            pivot: PixelPoint::new(0., 0.),
            width: 10.,
            height: 10.,
            color: Color::rgb(0, 0, 0),
            opacity: 1.,
        };
        surface.draw(Layer::Squares, rect.clone());
        surface.draw(Layer::Overlay, rect);
        surface.clear(Layer::Overlay);
        assert_eq!(surface.commands(Layer::Squares).len(), 1);
        assert!(surface.commands(Layer::Overlay).is_empty());
        assert_eq!(surface.clear_count(Layer::Overlay), 1);
        surface.resize(160, 100);
        assert_eq!(surface.pixel_size(), (160, 100));
        assert!(surface.commands(Layer::Squares).is_empty());
    }
}
