// ============================================================
// Layer 5: ML / Model Layer
// ============================================================
// The only layer that talks to linfa and burn.
//
//   model.rs    ModelKind (closed set parsed from the registry's
//               model_type) and Model, the enum every use case
//               trains, evaluates, saves and restores
//
//   svr.rs      epsilon-SVR from linfa-svm, rbf or linear kernel
//
//   linear.rs   single dense layer in burn; standardises x and y
//               and maps predictions back
//
//   trainer.rs  full-batch Adam loop for linear.rs
//
//   tuning.rs   grid search with contiguous k-fold scoring
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            linfa documentation

pub mod linear;
pub mod model;
pub mod svr;
pub mod trainer;
pub mod tuning;
