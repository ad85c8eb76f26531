// Copyright @yucwang 2026

use std::cell::{ Cell, RefCell };
use std::fs::{ self, File };
use std::io::{ self, BufWriter, Write };
use std::path::{ Path, PathBuf };

use crate::core::material::{ Material, MaterialError, MaterialParam, MaterialSample };
use crate::math::constants::Vector3f;
use crate::math::spectrum::RGBSpectrum;

pub const TRACE_FILE_NAME: &str = "brdf_explorer_trace.log";

/// Checks every eval result and replaces non-finite or negative radiance
/// with zero, logging a warning for each offending call.
pub struct ValidatingMaterial<M: Material> {
    inner: M,
    violations: Cell<usize>,
}

impl<M: Material> ValidatingMaterial<M> {
    pub fn new(inner: M) -> Self {
        Self { inner, violations: Cell::new(0) }
    }

    pub fn violations(&self) -> usize {
        self.violations.get()
    }
}

impl<M: Material> Material for ValidatingMaterial<M> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn subtype(&self) -> &str {
        self.inner.subtype()
    }

    fn eval(&self,
            ng: Vector3f,
            ns: Vector3f,
            view_dir: Vector3f,
            light_dir: Vector3f,
            light_intensity: RGBSpectrum) -> RGBSpectrum {
        let value = self.inner.eval(ng, ns, view_dir, light_dir, light_intensity);
        if value.is_finite() && value.min_component() >= 0.0 {
            return value;
        }

        self.violations.set(self.violations.get() + 1);
        log::warn!("{} ({}) returned invalid radiance {:?} for view {:?}, light {:?}",
                   self.inner.name(), self.inner.subtype(), value.to_vector(), view_dir, light_dir);
        value.clamp_non_negative()
    }

    fn set_subtype(&mut self, subtype: &str) -> Result<(), MaterialError> {
        self.inner.set_subtype(subtype)
    }

    fn set_parameter(&mut self, param: &MaterialParam) -> Result<(), MaterialError> {
        if let Some(current) = self.inner.get_parameter(&param.name) {
            if current.data_type() != param.data_type() {
                log::warn!("parameter {} changes type from {} to {}",
                           param.name, current.data_type(), param.data_type());
            }
        }
        self.inner.set_parameter(param)
    }

    fn get_parameter(&self, name: &str) -> Option<MaterialParam> {
        self.inner.get_parameter(name)
    }

    fn sample(&self, ng: Vector3f, ns: Vector3f, wi: Vector3f, u: Vector3f) -> Option<MaterialSample> {
        let sample = self.inner.sample(ng, ns, wi, u)?;
        if !sample.pdf.is_finite() || sample.pdf <= 0.0 {
            log::warn!("{} produced a sample with pdf {}", self.inner.name(), sample.pdf);
            return None;
        }
        Some(sample)
    }
}

/// Writes one line per material API call into a trace file.
pub struct TracingMaterial<M: Material> {
    inner: M,
    path: PathBuf,
    writer: RefCell<BufWriter<File>>,
    calls: Cell<usize>,
}

impl<M: Material> TracingMaterial<M> {
    pub fn create<P: AsRef<Path>>(inner: M, trace_dir: P) -> io::Result<Self> {
        let trace_dir = trace_dir.as_ref();
        fs::create_dir_all(trace_dir)?;
        let path = trace_dir.join(TRACE_FILE_NAME);
        let file = File::create(&path)?;
        log::info!("Tracing material calls to: {}.", path.display());
        Ok(Self {
            inner,
            path,
            writer: RefCell::new(BufWriter::new(file)),
            calls: Cell::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn record(&self, line: String) {
        self.calls.set(self.calls.get() + 1);
        if let Err(e) = writeln!(self.writer.borrow_mut(), "{}", line) {
            log::warn!("failed to write trace line: {}", e);
        }
    }
}

fn fmt_vec(v: &Vector3f) -> String {
    format!("({}, {}, {})", v.x, v.y, v.z)
}

impl<M: Material> Material for TracingMaterial<M> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn subtype(&self) -> &str {
        self.inner.subtype()
    }

    fn eval(&self,
            ng: Vector3f,
            ns: Vector3f,
            view_dir: Vector3f,
            light_dir: Vector3f,
            light_intensity: RGBSpectrum) -> RGBSpectrum {
        let value = self.inner.eval(ng, ns, view_dir, light_dir, light_intensity);
        self.record(format!("eval ng={} ns={} view={} light={} intensity={} -> {}",
                            fmt_vec(&ng), fmt_vec(&ns), fmt_vec(&view_dir), fmt_vec(&light_dir),
                            fmt_vec(&light_intensity.to_vector()), fmt_vec(&value.to_vector())));
        value
    }

    fn set_subtype(&mut self, subtype: &str) -> Result<(), MaterialError> {
        let result = self.inner.set_subtype(subtype);
        self.record(format!("set_subtype {} -> {:?}", subtype, result));
        result
    }

    fn set_parameter(&mut self, param: &MaterialParam) -> Result<(), MaterialError> {
        let result = self.inner.set_parameter(param);
        self.record(format!("set_parameter {} {} [{}] -> {:?}",
                            param.name, param.data_type(), param.value, result));
        result
    }

    fn get_parameter(&self, name: &str) -> Option<MaterialParam> {
        let param = self.inner.get_parameter(name);
        match &param {
            Some(p) => self.record(format!("get_parameter {} -> {} [{}]", name, p.data_type(), p.value)),
            None => self.record(format!("get_parameter {} -> none", name)),
        }
        param
    }

    fn sample(&self, ng: Vector3f, ns: Vector3f, wi: Vector3f, u: Vector3f) -> Option<MaterialSample> {
        let sample = self.inner.sample(ng, ns, wi, u);
        self.record(format!("sample wi={} u={} -> {:?}", fmt_vec(&wi), fmt_vec(&u), sample));
        sample
    }
}

impl<M: Material> Drop for TracingMaterial<M> {
    fn drop(&mut self) {
        if let Err(e) = self.writer.get_mut().flush() {
            log::warn!("failed to flush trace {}: {}", self.path.display(), e);
        }
        log::info!("Traced {} material calls to {}.", self.calls.get(), self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::standard::{ StandardMaterial, PBM };

    struct BrokenMaterial;

    impl Material for BrokenMaterial {
        fn subtype(&self) -> &str {
            "Broken"
        }

        fn eval(&self, _: Vector3f, _: Vector3f, _: Vector3f, _: Vector3f, _: RGBSpectrum) -> RGBSpectrum {
            RGBSpectrum::new(std::f32::NAN, -1.0, 0.5)
        }

        fn set_subtype(&mut self, subtype: &str) -> Result<(), MaterialError> {
            Err(MaterialError::UnknownSubtype(subtype.to_string()))
        }

        fn set_parameter(&mut self, param: &MaterialParam) -> Result<(), MaterialError> {
            Err(MaterialError::UnknownParameter { subtype: "Broken".to_string(), name: param.name.clone() })
        }

        fn get_parameter(&self, _name: &str) -> Option<MaterialParam> {
            None
        }
    }

    #[test]
    fn test_validating_material_clamps_invalid_radiance() {
        let mat = ValidatingMaterial::new(BrokenMaterial);
        let n = Vector3f::new(0.0, 1.0, 0.0);
        let value = mat.eval(n, n, n, n, RGBSpectrum::splat(1.0));
        assert_eq!(value, RGBSpectrum::new(0.0, 0.0, 0.5));
        assert_eq!(mat.violations(), 1);
    }

    #[test]
    fn test_validating_material_passes_valid_radiance() {
        let mat = ValidatingMaterial::new(StandardMaterial::default());
        let n = Vector3f::new(0.0, 1.0, 0.0);
        let value = mat.eval(n, n, n, n, RGBSpectrum::splat(1.0));
        assert!(value.g() > 0.0);
        assert_eq!(mat.violations(), 0);
    }

    #[test]
    fn test_tracing_material_writes_calls() {
        let dir = std::env::temp_dir().join(format!("brdf_explorer_trace_{}", std::process::id()));
        let path = {
            let mut mat = TracingMaterial::create(StandardMaterial::default(), &dir).unwrap();
            let n = Vector3f::new(0.0, 1.0, 0.0);
            mat.set_subtype(PBM).unwrap();
            mat.set_parameter(&MaterialParam::float("roughness", 0.25)).unwrap();
            assert!(mat.set_subtype("Velvet").is_err());
            mat.eval(n, n, n, n, RGBSpectrum::splat(1.0));
            assert_eq!(mat.calls(), 4);
            assert_eq!(mat.subtype(), PBM);
            mat.path().to_path_buf()
        };

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("set_subtype PBM -> Ok"));
        assert!(lines[1].starts_with("set_parameter roughness float [0.25]"));
        assert!(lines[2].contains("UnknownSubtype"));
        assert!(lines[3].starts_with("eval "));
        let _ = fs::remove_dir_all(&dir);
    }
}
