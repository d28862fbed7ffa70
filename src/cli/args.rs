//! CLI argument structures

use crate::config::{BitDepth, OutputOptions, Stretch};
use clap::Parser;
use std::path::PathBuf;

/// Orthorectify and pansharpen a batch of satellite image pairs
#[derive(Parser, Debug, Clone)]
#[command(name = "panbatch")]
#[command(about = "panbatch - Orthorectify and pansharpen satellite image pairs in batch", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Source: a directory, a .txt file listing image paths, or a single image
    pub src: PathBuf,

    /// Destination directory for pansharpened products
    pub dst: PathBuf,

    /// Output data type
    #[arg(short = 't', long = "outtype", value_enum, default_value_t = BitDepth::Byte)]
    pub bit_depth: BitDepth,

    /// Radiometric stretch: ns (none), rf (reflectance), mr (modified reflectance),
    /// rd (absolute radiance), au (auto)
    #[arg(short = 'c', long, value_enum, default_value_t = Stretch::Rf)]
    pub stretch: Stretch,

    /// EPSG code of the output projection
    #[arg(short = 'p', long)]
    pub epsg: u32,

    /// DEM used for orthorectification
    #[arg(short = 'd', long)]
    pub dem: Option<PathBuf>,

    /// Output resolution in meters
    #[arg(short = 'r', long)]
    pub resolution: Option<f64>,

    /// Local working directory for intermediate files
    #[arg(long = "wd", value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Keep intermediate files in the working directory
    #[arg(long)]
    pub save_temps: bool,

    /// PBS resource request passed verbatim to qsub
    #[arg(short = 'l', value_name = "RESOURCES")]
    pub resources: Option<String>,

    /// qsub script to submit with --pbs
    #[arg(long = "qsubscript", value_name = "PATH")]
    pub qsub_script: Option<PathBuf>,

    /// Submit one PBS job per image instead of running locally
    #[arg(long)]
    pub pbs: bool,

    /// Number of images processed concurrently on this machine
    #[arg(long, default_value_t = 1)]
    pub parallel_processes: usize,

    /// Print the planned actions without running or submitting anything
    #[arg(long = "dryrun")]
    pub dry_run: bool,

    /// Tool configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            bit_depth: self.bit_depth,
            stretch: self.stretch,
            epsg: self.epsg,
            dem: self.dem.clone(),
            resolution: self.resolution,
            working_dir: self.working_dir.clone(),
            save_temps: self.save_temps,
        }
    }

    /// Arguments that re-run this batch's configuration on one image.
    ///
    /// Dispatch options are dropped: a submitted job always runs serially on
    /// its single image. Source and destination are appended per task.
    pub fn single_image_args(&self, program: &str) -> Vec<String> {
        let mut args = vec![
            program.to_string(),
            "-t".to_string(),
            self.bit_depth.gdal_name().to_string(),
            "-c".to_string(),
            self.stretch.tag().to_string(),
            "-p".to_string(),
            self.epsg.to_string(),
        ];
        if let Some(dem) = &self.dem {
            args.push("-d".to_string());
            args.push(dem.to_string_lossy().into_owned());
        }
        if let Some(resolution) = self.resolution {
            args.push("-r".to_string());
            args.push(resolution.to_string());
        }
        if let Some(working_dir) = &self.working_dir {
            args.push("--wd".to_string());
            args.push(working_dir.to_string_lossy().into_owned());
        }
        if self.save_temps {
            args.push("--save-temps".to_string());
        }
        if let Some(config) = &self.config {
            args.push("--config".to_string());
            args.push(config.to_string_lossy().into_owned());
        }
        if self.verbose > 0 {
            args.push(format!("-{}", "v".repeat(self.verbose as usize)));
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["panbatch", "-p", "3413", "src", "dst"]);
        assert_eq!(cli.bit_depth, BitDepth::Byte);
        assert_eq!(cli.stretch, Stretch::Rf);
        assert_eq!(cli.parallel_processes, 1);
        assert!(!cli.pbs);
        assert!(!cli.dry_run);
        assert_eq!(cli.output_options().product_tag(), "u8rf3413");
    }

    #[test]
    fn test_epsg_is_required() {
        assert!(Cli::try_parse_from(["panbatch", "src", "dst"]).is_err());
    }

    #[test]
    fn test_value_enums() {
        let cli = parse(&["panbatch", "-t", "UInt16", "-c", "mr", "-p", "3031", "src", "dst"]);
        assert_eq!(cli.output_options().product_tag(), "u16mr3031");
        assert!(Cli::try_parse_from(["panbatch", "-t", "Int8", "-p", "1", "src", "dst"]).is_err());
    }

    #[test]
    fn test_single_image_args_drop_dispatch_options() {
        let cli = parse(&[
            "panbatch",
            "-p",
            "3413",
            "-r",
            "0.5",
            "--wd",
            "/scratch",
            "--save-temps",
            "--pbs",
            "-l",
            "walltime=40:00:00",
            "--qsubscript",
            "/opt/q.sh",
            "--dryrun",
            "-vv",
            "src",
            "dst",
        ]);

        let args = cli.single_image_args("/usr/local/bin/panbatch");
        assert_eq!(
            args,
            vec![
                "/usr/local/bin/panbatch",
                "-t",
                "Byte",
                "-c",
                "rf",
                "-p",
                "3413",
                "-r",
                "0.5",
                "--wd",
                "/scratch",
                "--save-temps",
                "-vv",
            ]
        );

        // The reconstructed arguments parse back to the same output options
        let mut reparsed = args.clone();
        reparsed.extend(["src".to_string(), "dst".to_string()]);
        let again = Cli::try_parse_from(reparsed).unwrap();
        assert_eq!(again.output_options(), cli.output_options());
        assert!(!again.pbs);
    }
}
