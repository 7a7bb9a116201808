// ============================================================
// Layer 2: RegistryUseCase
// ============================================================
// `register` and `show`: the two registry operations that are
// not part of a training run.

use anyhow::Result;
use std::path::PathBuf;

use crate::infra::registry::{ModelEntry, ModelRegistry};
use crate::ml::model::ModelKind;

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub name:       String,
    pub model_type: String,
    /// Defaults to the Rust path of the model type
    pub class_path: Option<String>,
    pub code_path:  Option<String>,
    pub overwrite:  bool,
}

pub struct RegistryUseCase {
    path: PathBuf,
}

impl RegistryUseCase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn register(&self, req: &RegisterRequest) -> Result<ModelEntry> {
        let kind: ModelKind = req.model_type.parse()?;
        let mut registry    = ModelRegistry::open(&self.path)?;
        registry.register(
            &req.name,
            kind,
            req.class_path.as_deref(),
            req.code_path.as_deref(),
            req.overwrite,
        )
    }

    /// One entry as YAML, ready to print, with every stored key.
    pub fn show(&self, name: &str) -> Result<String> {
        let registry = ModelRegistry::open(&self.path)?;
        Ok(serde_yaml::to_string(registry.raw(name)?)?)
    }

    pub fn list(&self) -> Result<Vec<String>> {
        let registry = ModelRegistry::open(&self.path)?;
        Ok(registry.names().map(str::to_string).collect())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::PipelineError;

    fn request(name: &str, model_type: &str) -> RegisterRequest {
        RegisterRequest {
            name:       name.into(),
            model_type: model_type.into(),
            class_path: None,
            code_path:  Some("src/ml/svr.rs".into()),
            overwrite:  false,
        }
    }

    #[test]
    fn test_register_then_show() {
        let dir = tempfile::tempdir().unwrap();
        let uc  = RegistryUseCase::new(dir.path().join("models.yaml"));

        let entry = uc.register(&request("svr_baseline", "svr")).unwrap();
        assert_eq!(entry.code_path, "src/ml/svr.rs");

        let yaml = uc.show("svr_baseline").unwrap();
        assert!(yaml.contains("model_type: svr"));
        assert_eq!(uc.list().unwrap(), vec!["svr_baseline".to_string()]);
    }

    #[test]
    fn test_unknown_type_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let uc  = RegistryUseCase::new(dir.path().join("models.yaml"));

        let err = uc.register(&request("boosted", "xgboost")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::UnknownModelType(_))
        ));
        assert!(uc.list().unwrap().is_empty());
    }
}
