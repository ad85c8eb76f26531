// Copyright @yucwang 2026

use std::env;
use std::fs;
use std::path::{ Path, PathBuf };
use std::sync::Mutex;

use brdf_explorer::core::library::MaterialLibrary;
use brdf_explorer::core::material::{ Material, MaterialParam };
use brdf_explorer::materials::standard::{ StandardMaterial, MATTE, PBM };
use brdf_explorer::math::constants::Vector3f;
use brdf_explorer::math::spectrum::RGBSpectrum;
use brdf_explorer::plugin::abi::{ AbiVersionFn, ABI_VERSION_SYMBOL, PLUGIN_ABI_VERSION };
use brdf_explorer::plugin::library::{ PluginApi, PluginLibrary };
use brdf_explorer::plugin::loader::{ library_file_name, library_location, load_plugin };

const NAME: &str = "brdf_explorer";

// Tests that load by name depend on the working directory.
static WORKING_DIR: Mutex<()> = Mutex::new(());

/// Makes sure the crate's own cdylib sits next to the test binary. Cargo
/// builds it into `target/<profile>/deps` and links a copy one level up.
fn anchored_library() -> PathBuf {
    let dir = library_location().expect("test binary has a location");
    let file = library_file_name(NAME);
    let anchored = dir.join(&file);
    if !anchored.is_file() {
        let built = dir.parent().map(|parent| parent.join(&file)).expect("target directory");
        fs::copy(&built, &anchored).expect("the brdf_explorer cdylib is built with the tests");
    }
    anchored
}

fn up() -> Vector3f {
    Vector3f::new(0.0, 1.0, 0.0)
}

#[test]
fn test_load_falls_back_to_executable_directory() {
    let _guard = WORKING_DIR.lock().unwrap_or_else(|e| e.into_inner());
    let anchored = anchored_library();
    assert!(!Path::new(".").join(library_file_name(NAME)).exists());

    let library = PluginLibrary::load(NAME).unwrap();
    assert_eq!(library.name(), NAME);
    assert_eq!(library.supported_subtypes(), vec![MATTE.to_string(), PBM.to_string()]);
    assert_eq!(library.supported_params(PBM), StandardMaterial::supported_params(PBM));
    assert!(library.supported_params(PBM).contains(&MaterialParam::float("ior", 1.0)));

    let mut material = library.create_instance(PBM).expect("PBM instance");
    let mut builtin = StandardMaterial::new(PBM).unwrap();
    let roughness = MaterialParam::float("roughness", 0.25);
    material.set_parameter(&roughness).unwrap();
    builtin.set_parameter(&roughness).unwrap();
    assert_eq!(material.get_parameter("roughness"), Some(roughness));

    let light = Vector3f::new(1.0, 1.0, 0.0);
    let view = Vector3f::new(-1.0, 1.0, 0.0);
    let expected = builtin.eval(up(), up(), view, light, RGBSpectrum::splat(1.0));
    assert_eq!(material.eval(up(), up(), view, light, RGBSpectrum::splat(1.0)), expected);

    // The live instance keeps the library mapped past release.
    assert!(library.release().is_ok());
    assert_eq!(material.eval(up(), up(), view, light, RGBSpectrum::splat(1.0)), expected);
    drop(material);

    let plugin = load_plugin(NAME).unwrap();
    assert_eq!(plugin.path(), anchored.as_path());
    assert!(plugin.release().is_ok());
}

#[test]
fn test_load_prefers_working_directory() {
    let _guard = WORKING_DIR.lock().unwrap_or_else(|e| e.into_inner());
    let anchored = anchored_library();
    let previous = env::current_dir().unwrap();
    let dir = env::temp_dir().join(format!("brdf_explorer_plugin_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::copy(&anchored, dir.join(library_file_name(NAME))).unwrap();
    env::set_current_dir(&dir).unwrap();

    let loaded = load_plugin(NAME);
    env::set_current_dir(&previous).unwrap();

    let plugin = loaded.unwrap();
    assert_eq!(plugin.path(), Path::new(".").join(library_file_name(NAME)).as_path());
    assert!(PluginLibrary::from_plugin(plugin).unwrap().release().is_ok());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_symbols_of_a_loaded_library() {
    let _guard = WORKING_DIR.lock().unwrap_or_else(|e| e.into_inner());
    anchored_library();
    let plugin = load_plugin(NAME).unwrap();

    unsafe {
        let version = plugin.symbol::<AbiVersionFn>(ABI_VERSION_SYMBOL).expect("version symbol");
        assert_eq!(version(), PLUGIN_ABI_VERSION);
        assert!(plugin.symbol::<AbiVersionFn>("brdf_plugin_does_not_exist").is_none());
    }
    assert!(PluginApi::resolve(&plugin).unwrap().is_complete());
    assert!(plugin.release().is_ok());
}
