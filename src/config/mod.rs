pub mod params;
pub mod schema;
pub mod steps;

pub use params::{ParamDef, Params};
pub use schema::{
    BrowserConfig, Expectation, Extract, OnFailure, Readiness, Scenario, SessionMode, Suite,
    TargetUrl, Viewport, Waits,
};
pub use steps::Step;
