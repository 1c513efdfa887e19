use serde::{Deserialize, Serialize};

/// Recognized options of a refinement sweep.
/// ```
/// let options: adze_refine::AdaptOptions = serde_json::from_str(
///     r#"{ "should_transfer_parametric": true, "should_handle_matching": false }"#,
/// ).unwrap();
/// assert!(options.should_transfer_parametric);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptOptions {
    /// Interpolate geometric-model parameters onto split vertices. Enable
    /// when vertices classified on curved model boundaries will be snapped
    /// after the sweep.
    pub should_transfer_parametric: bool,
    /// Propagate periodic matches onto the children of matched entities.
    pub should_handle_matching: bool,
}
