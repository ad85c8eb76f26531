// Copyright @yucwang 2026

use std::fmt;
use std::io::{ self, BufRead, Write };
use std::path::PathBuf;
use std::str::FromStr;

use console::style;

use crate::core::explorer::{ Explorer, ExplorerError };
use crate::core::material::{ MaterialParam, ParamValue };
use crate::io::{ export_lobe, export_samples, export_slice, ExportError };
use crate::math::constants::{ Float, Vector3f };

pub const HELP: &str = "\
subtypes                 list the subtypes of the library
params                   list the parameters of the current material
subtype <name>           switch the material subtype
set <name> <v> [v ...]   set a parameter (1 to 4 values)
light <x> <y> <z>        set the light direction
export <path>            write the lobe mesh (.obj or .ply)
samples <path>           write importance samples (.obj or .ply)
slice <path>             write a hemisphere slice (.exr or .png)
help                     show this message
quit                     leave the console";

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Subtypes,
    Params,
    Subtype(String),
    Set(MaterialParam),
    Light(Vector3f),
    Export(PathBuf),
    Samples(PathBuf),
    Slice(PathBuf),
    Help,
    Quit,
}

#[derive(Debug)]
pub enum CommandError {
    Empty,
    Unknown(String),
    Usage(&'static str),
    InvalidNumber(String),
    Explorer(ExplorerError),
    Export(ExportError),
    Io(io::Error),
}

impl From<ExplorerError> for CommandError {
    fn from(err: ExplorerError) -> Self {
        CommandError::Explorer(err)
    }
}

impl From<ExportError> for CommandError {
    fn from(err: ExportError) -> Self {
        CommandError::Export(err)
    }
}

impl From<io::Error> for CommandError {
    fn from(err: io::Error) -> Self {
        CommandError::Io(err)
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => write!(f, "empty command"),
            CommandError::Unknown(name) => write!(f, "unknown command: {} (try help)", name),
            CommandError::Usage(usage) => write!(f, "usage: {}", usage),
            CommandError::InvalidNumber(value) => write!(f, "invalid number: {}", value),
            CommandError::Explorer(err) => write!(f, "{}", err),
            CommandError::Export(err) => write!(f, "{}", err),
            CommandError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for CommandError {}

fn parse_number(value: &str) -> Result<Float, CommandError> {
    value.parse::<Float>().map_err(|_| CommandError::InvalidNumber(value.to_string()))
}

fn single_path(args: &[&str], usage: &'static str) -> Result<PathBuf, CommandError> {
    match args {
        [path] => Ok(PathBuf::from(path)),
        _ => Err(CommandError::Usage(usage)),
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let (name, args) = words.split_first().ok_or(CommandError::Empty)?;
        match (*name, args) {
            ("subtypes", []) => Ok(Command::Subtypes),
            ("params", []) => Ok(Command::Params),
            ("subtype", [subtype]) => Ok(Command::Subtype(subtype.to_string())),
            ("subtype", _) => Err(CommandError::Usage("subtype <name>")),
            ("set", [param, values @ ..]) if !values.is_empty() && values.len() <= 4 => {
                let components = values.iter().map(|v| parse_number(v)).collect::<Result<Vec<_>, _>>()?;
                let value = ParamValue::from_components(&components)
                    .ok_or(CommandError::Usage("set <name> <v> [v ...]"))?;
                Ok(Command::Set(MaterialParam::new(*param, value)))
            }
            ("set", _) => Err(CommandError::Usage("set <name> <v> [v ...]")),
            ("light", [x, y, z]) => Ok(Command::Light(Vector3f::new(parse_number(x)?, parse_number(y)?, parse_number(z)?))),
            ("light", _) => Err(CommandError::Usage("light <x> <y> <z>")),
            ("export", _) => single_path(args, "export <path>").map(Command::Export),
            ("samples", _) => single_path(args, "samples <path>").map(Command::Samples),
            ("slice", _) => single_path(args, "slice <path>").map(Command::Slice),
            ("help", _) | ("?", _) => Ok(Command::Help),
            ("quit", _) | ("exit", _) => Ok(Command::Quit),
            (other, _) => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn print_subtypes<W: Write>(explorer: &Explorer, out: &mut W) -> io::Result<()> {
    for subtype in explorer.subtypes() {
        let marker = if subtype == explorer.subtype() { "*" } else { " " };
        writeln!(out, "{} {}", marker, style(subtype).cyan())?;
    }
    Ok(())
}

pub fn print_parameters<W: Write>(explorer: &Explorer, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", style(explorer.subtype()).bold())?;
    for param in explorer.parameters() {
        writeln!(out, "  {} ({}) = {}", style(&param.name).cyan(), param.data_type(), param.value)?;
    }
    Ok(())
}

pub fn execute<W: Write>(explorer: &mut Explorer, command: Command, out: &mut W) -> Result<Flow, CommandError> {
    match command {
        Command::Subtypes => print_subtypes(explorer, out)?,
        Command::Params => print_parameters(explorer, out)?,
        Command::Subtype(subtype) => {
            if explorer.select_subtype(&subtype)? {
                print_parameters(explorer, out)?;
            }
        }
        Command::Set(param) => {
            let set = explorer.set_parameter(&param)?;
            writeln!(out, "{} = {}", set.name, set.value)?;
        }
        Command::Light(direction) => {
            explorer.set_light_dir(direction)?;
            let d = explorer.light().direction;
            writeln!(out, "light = {}, {}, {}", d.x, d.y, d.z)?;
        }
        Command::Export(path) => {
            let mesh = explorer.lobe_mesh()?;
            export_lobe(&path, mesh)?;
            writeln!(out, "wrote {}", path.display())?;
        }
        Command::Samples(path) => {
            export_samples(&path, &explorer.sample_points())?;
            writeln!(out, "wrote {}", path.display())?;
        }
        Command::Slice(path) => {
            export_slice(&path, &explorer.render_slice()?)?;
            writeln!(out, "wrote {}", path.display())?;
        }
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Reads one command per line until `quit` or end of input. Failed commands
/// are reported and the loop goes on.
pub fn run_console<R: BufRead, W: Write>(explorer: &mut Explorer,
                                         input: R,
                                         out: &mut W,
                                         prompt: bool) -> io::Result<usize> {
    let mut executed = 0;
    if prompt {
        write!(out, "{} ", style(">").green().bold())?;
        out.flush()?;
    }
    for line in input.lines() {
        let line = line?;
        if !line.trim().is_empty() && !line.trim_start().starts_with('#') {
            let flow = line.parse::<Command>().and_then(|command| execute(explorer, command, out));
            executed += 1;
            match flow {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => writeln!(out, "{} {}", style("error:").red().bold(), e)?,
            }
        }
        if prompt {
            write!(out, "{} ", style(">").green().bold())?;
            out.flush()?;
        }
    }
    Ok(executed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::standard::{ StandardLibrary, MATTE, PBM };
    use crate::renderers::slice::SliceSettings;
    use crate::shapes::lobe_mesh::{ LobeSettings, RadianceMetric };

    fn explorer() -> Explorer {
        let material = Explorer::create_material(&StandardLibrary, None).unwrap();
        let mut explorer = Explorer::new(Box::new(StandardLibrary), material);
        explorer.set_lobe_settings(LobeSettings { segments: 8, metric: RadianceMetric::Green, show_progress: false });
        explorer.set_slice_settings(SliceSettings { width: 8, height: 4, show_progress: false });
        explorer
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("subtypes".parse::<Command>().unwrap(), Command::Subtypes);
        assert_eq!("subtype PBM".parse::<Command>().unwrap(), Command::Subtype(PBM.to_string()));
        assert_eq!("set roughness 0.5".parse::<Command>().unwrap(),
                   Command::Set(MaterialParam::float("roughness", 0.5)));
        assert_eq!("set baseColor 1 0.5 0".parse::<Command>().unwrap(),
                   Command::Set(MaterialParam::float3("baseColor", Vector3f::new(1.0, 0.5, 0.0))));
        assert_eq!("  light 0 1 0 ".parse::<Command>().unwrap(), Command::Light(Vector3f::new(0.0, 1.0, 0.0)));
        assert_eq!("export lobe.obj".parse::<Command>().unwrap(), Command::Export(PathBuf::from("lobe.obj")));
        assert_eq!("quit".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("".parse::<Command>(), Err(CommandError::Empty)));
        assert!(matches!("dance".parse::<Command>(), Err(CommandError::Unknown(_))));
        assert!(matches!("set roughness".parse::<Command>(), Err(CommandError::Usage(_))));
        assert!(matches!("set roughness abc".parse::<Command>(), Err(CommandError::InvalidNumber(_))));
        assert!(matches!("light 1 2".parse::<Command>(), Err(CommandError::Usage(_))));
        assert!(matches!("export".parse::<Command>(), Err(CommandError::Usage(_))));
    }

    #[test]
    fn test_console_session() {
        console::set_colors_enabled(false);
        let mut explorer = explorer();
        let script = "subtypes\nsubtype PBM\nset roughness 2\nbogus\nset color 1 1 1\n# comment\nquit\nparams\n";
        let mut out = Vec::new();
        let executed = run_console(&mut explorer, script.as_bytes(), &mut out, false).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(executed, 6);
        assert_eq!(explorer.subtype(), PBM);
        assert_eq!(explorer.material().get_parameter("roughness"), Some(MaterialParam::float("roughness", 1.0)));
        assert!(text.contains(&format!("* {}", MATTE)));
        assert!(text.contains("roughness = 1"));
        assert!(text.contains("unknown command: bogus"));
        assert!(text.contains("has no parameter named color"));
    }

    #[test]
    fn test_export_commands_write_files() {
        let mut explorer = explorer();
        let dir = std::env::temp_dir().join(format!("brdf_explorer_console_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut out = Vec::new();
        for (command, file) in [("export", "lobe.obj"), ("samples", "samples.ply"), ("slice", "slice.exr")] {
            let path = dir.join(file);
            let line = format!("{} {}", command, path.display());
            assert_eq!(execute(&mut explorer, line.parse().unwrap(), &mut out).unwrap(), Flow::Continue);
            assert!(path.exists());
        }
        assert!(matches!(execute(&mut explorer, Command::Export(dir.join("lobe.txt")), &mut out),
                         Err(CommandError::Export(ExportError::UnsupportedFormat { .. }))));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
