// Copyright @yucwang 2026

use std::path::PathBuf;

use clap::Parser;

use crate::core::material::{ MaterialParam, ParamValue };
use crate::core::settings_loader::{ parse_floats, parse_vec3, ExplorerSettings };
use crate::math::constants::{ Float, Vector3f };
use crate::shapes::lobe_mesh::RadianceMetric;

#[derive(Parser, Debug, Clone)]
#[command(name = "brdf-explorer", version, about = "Visualize reflectance lobes of built-in and plugin materials")]
pub struct Cli {
    /// Log debug messages
    #[arg(short, long)]
    pub verbose: bool,

    /// Material library to load instead of the built-in one
    #[arg(short, long, value_name = "NAME")]
    pub library: Option<String>,

    /// Validate every material result
    #[arg(short = 'g', long)]
    pub debug: bool,

    /// Record every material call into DIR
    #[arg(long, value_name = "DIR")]
    pub trace: Option<PathBuf>,

    /// Do not create or read the default layout file
    #[arg(long = "noDefaultLayout")]
    pub no_default_layout: bool,

    /// Settings file, overrides the default layout
    #[arg(long, value_name = "XML")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "NAME")]
    pub subtype: Option<String>,

    /// Parameter assignment, e.g. `roughness=0.3` or `baseColor=1,0.5,0`
    #[arg(long = "set", value_name = "NAME=V[,V...]", value_parser = parse_assignment, allow_hyphen_values = true)]
    pub set: Vec<MaterialParam>,

    /// Light direction
    #[arg(long, value_name = "X,Y,Z", value_parser = parse_direction, allow_hyphen_values = true)]
    pub light: Option<Vector3f>,

    #[arg(long, value_name = "I")]
    pub intensity: Option<Float>,

    /// Lobe resolution
    #[arg(long, value_name = "N")]
    pub segments: Option<usize>,

    /// green, luminance, max or length
    #[arg(long, value_parser = parse_metric)]
    pub metric: Option<RadianceMetric>,

    /// Lobe mesh, .obj or .ply
    #[arg(short, long, value_name = "MESH")]
    pub output: Option<PathBuf>,

    /// Importance samples, .obj or .ply
    #[arg(long, value_name = "PATH")]
    pub samples: Option<PathBuf>,

    #[arg(long, value_name = "N")]
    pub sample_count: Option<usize>,

    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Hemisphere slice image, .exr or .png
    #[arg(long, value_name = "IMAGE")]
    pub slice: Option<PathBuf>,

    /// Read commands from stdin
    #[arg(short, long)]
    pub interactive: bool,

    #[arg(long)]
    pub no_progress: bool,
}

pub fn parse_assignment(arg: &str) -> Result<MaterialParam, String> {
    let (name, values) = arg.split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {}", arg))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in {}", arg));
    }
    let components = parse_floats(values).map_err(|e| e.to_string())?;
    let value = ParamValue::from_components(&components)
        .ok_or_else(|| format!("{} needs 1 to 4 values, got {}", name, components.len()))?;
    Ok(MaterialParam::new(name, value))
}

fn parse_direction(arg: &str) -> Result<Vector3f, String> {
    parse_vec3(arg).map_err(|e| e.to_string())
}

fn parse_metric(arg: &str) -> Result<RadianceMetric, String> {
    arg.parse::<RadianceMetric>().map_err(|e| e.to_string())
}

impl Cli {
    pub fn show_progress(&self) -> bool {
        !self.no_progress && !self.interactive
    }

    /// Command line values take precedence over the settings file.
    pub fn apply_to(&self, settings: &mut ExplorerSettings) {
        if let Some(subtype) = &self.subtype {
            settings.subtype = Some(subtype.clone());
        }
        settings.params.extend(self.set.iter().cloned());
        if let Some(light) = self.light {
            settings.light.direction = light;
        }
        if let Some(intensity) = self.intensity {
            settings.light.intensity = intensity;
        }
        if let Some(segments) = self.segments {
            settings.lobe.segments = segments;
        }
        if let Some(metric) = self.metric {
            settings.lobe.metric = metric;
        }
        if let Some(count) = self.sample_count {
            settings.samples.count = count;
        }
        if let Some(seed) = self.seed {
            settings.samples.seed = seed;
        }
        let show_progress = self.show_progress();
        settings.lobe.show_progress = show_progress;
        settings.slice.show_progress = show_progress;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "brdf-explorer", "-v", "-l", "my_materials", "-g", "--trace", "/tmp/trace", "--noDefaultLayout",
            "--subtype", "PBM", "--set", "roughness=0.3", "--set", "baseColor=1,0.5,0",
            "--light", "0,1,0", "--segments", "64", "--metric", "max", "-o", "lobe.ply", "--no-progress",
        ]).unwrap();
        assert!(cli.verbose && cli.debug && cli.no_default_layout && cli.no_progress);
        assert_eq!(cli.library.as_deref(), Some("my_materials"));
        assert_eq!(cli.trace, Some(PathBuf::from("/tmp/trace")));
        assert_eq!(cli.set, vec![
            MaterialParam::float("roughness", 0.3),
            MaterialParam::float3("baseColor", Vector3f::new(1.0, 0.5, 0.0)),
        ]);
        assert_eq!(cli.metric, Some(RadianceMetric::Max));

        let mut settings = ExplorerSettings::default();
        cli.apply_to(&mut settings);
        assert_eq!(settings.subtype.as_deref(), Some("PBM"));
        assert_eq!(settings.light.direction, Vector3f::new(0.0, 1.0, 0.0));
        assert_eq!(settings.lobe.segments, 64);
        assert!(!settings.lobe.show_progress);
        assert_eq!(settings.params.len(), 2);
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(Cli::try_parse_from(["brdf-explorer", "--set", "roughness"]).is_err());
        assert!(Cli::try_parse_from(["brdf-explorer", "--set", "x=1,2,3,4,5"]).is_err());
        assert!(Cli::try_parse_from(["brdf-explorer", "--light", "1,1"]).is_err());
        assert!(Cli::try_parse_from(["brdf-explorer", "--metric", "blue"]).is_err());
    }

    #[test]
    fn test_negative_values_are_not_flags() {
        let cli = Cli::try_parse_from([
            "brdf-explorer", "--light", "-1,1,0", "--set", "baseColor=-0.5,1,1", "-v",
        ]).unwrap();
        assert_eq!(cli.light, Some(Vector3f::new(-1.0, 1.0, 0.0)));
        assert_eq!(cli.set, vec![MaterialParam::float3("baseColor", Vector3f::new(-0.5, 1.0, 1.0))]);
        assert!(cli.verbose);

        let cli = Cli::try_parse_from(["brdf-explorer", "--light=-1,-1,0"]).unwrap();
        assert_eq!(cli.light, Some(Vector3f::new(-1.0, -1.0, 0.0)));
    }

    #[test]
    fn test_defaults_keep_settings() {
        let cli = Cli::try_parse_from(["brdf-explorer"]).unwrap();
        let mut settings = ExplorerSettings::default();
        cli.apply_to(&mut settings);
        assert_eq!(settings, ExplorerSettings::default());
    }
}
