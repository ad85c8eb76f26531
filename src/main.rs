// Copyright 2020 TwoCookingMice

use std::error::Error;
use std::io;

use clap::Parser;
use console::Term;

use brdf_explorer::cli::Cli;
use brdf_explorer::commands::{ print_parameters, print_subtypes, run_console };
use brdf_explorer::core::explorer::Explorer;
use brdf_explorer::core::library::MaterialLibrary;
use brdf_explorer::core::material::Material;
use brdf_explorer::core::settings_loader::{ self, ExplorerSettings };
use brdf_explorer::io::{ export_lobe, export_samples, export_slice };
use brdf_explorer::materials::debug::{ TracingMaterial, ValidatingMaterial };
use brdf_explorer::materials::standard::StandardLibrary;
use brdf_explorer::plugin::library::PluginLibrary;

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_cli_settings(cli: &Cli) -> Result<ExplorerSettings, Box<dyn Error>> {
    let mut settings = settings_loader::load_base_settings(".", !cli.no_default_layout, cli.config.as_deref())?;
    cli.apply_to(&mut settings);
    Ok(settings)
}

fn load_library(cli: &Cli) -> Result<Box<dyn MaterialLibrary>, Box<dyn Error>> {
    match &cli.library {
        Some(name) => Ok(Box::new(PluginLibrary::load(name)?)),
        None => Ok(Box::new(StandardLibrary)),
    }
}

fn wrap_material(cli: &Cli, material: Box<dyn Material>) -> Result<Box<dyn Material>, Box<dyn Error>> {
    let mut material = material;
    if cli.debug {
        log::info!("Validating material results.");
        material = Box::new(ValidatingMaterial::new(material));
    }
    if let Some(dir) = &cli.trace {
        material = Box::new(TracingMaterial::create(material, dir)?);
    }
    Ok(material)
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let settings = load_cli_settings(cli)?;
    let library = load_library(cli)?;
    let material = Explorer::create_material(library.as_ref(), settings.subtype.as_deref())?;
    let material = wrap_material(cli, material)?;

    let mut explorer = Explorer::new(library, material);
    explorer.apply_settings(&settings)?;

    let mut wrote_output = false;
    if let Some(path) = &cli.output {
        export_lobe(path, explorer.lobe_mesh()?)?;
        wrote_output = true;
    }
    if let Some(path) = &cli.samples {
        export_samples(path, &explorer.sample_points())?;
        wrote_output = true;
    }
    if let Some(path) = &cli.slice {
        export_slice(path, &explorer.render_slice()?)?;
        wrote_output = true;
    }

    if cli.interactive {
        let prompt = Term::stdout().is_term();
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let executed = run_console(&mut explorer, stdin.lock(), &mut stdout, prompt)?;
        log::debug!("Console executed {} commands.", executed);
    } else if !wrote_output {
        let mut stdout = io::stdout();
        print_subtypes(&explorer, &mut stdout)?;
        print_parameters(&explorer, &mut stdout)?;
        let mesh = explorer.lobe_mesh()?;
        log::info!("Lobe: {} vertices, {} triangles, peak radius {}.",
                   mesh.vertex_count(), mesh.triangle_count(), mesh.max_radius());
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if let Err(e) = run(&cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
