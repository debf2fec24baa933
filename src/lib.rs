mod canvas;
mod color;
mod error;
mod geom;
mod parse;
mod path;
mod types;
mod write;
mod xml;

pub use canvas::{Background, Frame, FrameId, Image, ObjId, Object, Shape};
pub use color::{Color, ColorStop, LinearGradient, Paint, Pattern, RadialGradient};
pub use error::{LoadError, SaveError};
pub use geom::{Matrix, Point, Rect, Size, Tri};
pub use parse::{ImportOptions, parse_document, parse_string};
pub use path::PathSeg;
pub use types::{
    Arrow, Cap, FillRule, FillStyle, HAlign, Join, LineStyle, RasterStyle, Settings, VAlign,
};
pub use write::{ExportOptions, to_svg, write};
