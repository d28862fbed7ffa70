//! Output options shared by every task of a batch.

use clap::ValueEnum;
use std::fmt;
use std::path::PathBuf;

/// Raster data type written by the ortho processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum BitDepth {
    #[value(name = "Byte")]
    Byte,
    #[value(name = "UInt16")]
    UInt16,
    #[value(name = "Float32")]
    Float32,
}

impl BitDepth {
    /// Short tag embedded in output filenames
    pub fn tag(self) -> &'static str {
        match self {
            BitDepth::Byte => "u8",
            BitDepth::UInt16 => "u16",
            BitDepth::Float32 => "f32",
        }
    }

    /// Name understood by the ortho processor's `--outtype` option
    pub fn gdal_name(self) -> &'static str {
        match self {
            BitDepth::Byte => "Byte",
            BitDepth::UInt16 => "UInt16",
            BitDepth::Float32 => "Float32",
        }
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.gdal_name())
    }
}

/// Radiometric stretch applied during orthorectification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Stretch {
    /// No stretch
    Ns,
    /// Top-of-atmosphere reflectance
    Rf,
    /// Modified reflectance
    Mr,
    /// Absolute radiance
    Rd,
    /// Automatic
    Au,
}

impl Stretch {
    pub fn tag(self) -> &'static str {
        match self {
            Stretch::Ns => "ns",
            Stretch::Rf => "rf",
            Stretch::Mr => "mr",
            Stretch::Rd => "rd",
            Stretch::Au => "au",
        }
    }
}

impl fmt::Display for Stretch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Per-task pipeline parameters.
///
/// Every task receives its own clone; nothing mutates it after the batch
/// starts. Stage-specific adjustments (such as the multispectral resolution)
/// are derived into locals by the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputOptions {
    pub bit_depth: BitDepth,
    pub stretch: Stretch,
    pub epsg: u32,
    pub dem: Option<PathBuf>,
    /// Target ground resolution in meters for the pansharpened product
    pub resolution: Option<f64>,
    /// Scratch directory; the destination directory is used when unset
    pub working_dir: Option<PathBuf>,
    pub save_temps: bool,
}

impl OutputOptions {
    pub fn new(bit_depth: BitDepth, stretch: Stretch, epsg: u32) -> Self {
        Self {
            bit_depth,
            stretch,
            epsg,
            dem: None,
            resolution: None,
            working_dir: None,
            save_temps: false,
        }
    }

    /// The `<bitDepthTag><stretchTag><epsg>` fragment shared by all outputs
    pub fn product_tag(&self) -> String {
        format!("{}{}{}", self.bit_depth.tag(), self.stretch.tag(), self.epsg)
    }
}
