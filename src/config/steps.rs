use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Text typed into a named element.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeStep {
    pub locator: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PauseStep {
    pub ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteStep {
    pub js: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogStep {
    pub message: String,
}

/// One UI action inside a scenario. Element arguments are locator names.
#[derive(Debug, Clone)]
pub enum Step {
    Navigate,
    Click(String),
    Clear(String),
    Type(TypeStep),
    /// Clear, then type.
    Fill(TypeStep),
    WaitForPageLoad,
    WaitForVisible(String),
    Pause(PauseStep),
    Execute(ExecuteStep),
    Log(LogStep),
}

impl Step {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Navigate => "navigate",
            Self::Click(_) => "click",
            Self::Clear(_) => "clear",
            Self::Type(_) => "type",
            Self::Fill(_) => "fill",
            Self::WaitForPageLoad => "wait_for_page_load",
            Self::WaitForVisible(_) => "wait_for_visible",
            Self::Pause(_) => "pause",
            Self::Execute(_) => "execute",
            Self::Log(_) => "log",
        }
    }

    /// Locator name the step touches, if any.
    pub fn locator(&self) -> Option<&str> {
        match self {
            Self::Click(name) | Self::Clear(name) | Self::WaitForVisible(name) => Some(name),
            Self::Type(t) | Self::Fill(t) => Some(&t.locator),
            _ => None,
        }
    }
}

const STEP_NAMES: &[&str] = &[
    "navigate",
    "click",
    "clear",
    "type",
    "fill",
    "wait_for_page_load",
    "wait_for_visible",
    "pause",
    "execute",
    "log",
];

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(StepVisitor)
    }
}

struct StepVisitor;

impl<'de> Visitor<'de> for StepVisitor {
    type Value = Step;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a step (bare name, or map with a single key)")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        match value {
            "navigate" => Ok(Step::Navigate),
            "wait_for_page_load" => Ok(Step::WaitForPageLoad),
            other => Err(de::Error::unknown_variant(
                other,
                &["navigate", "wait_for_page_load"],
            )),
        }
    }

    fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let key: String = map
            .next_key()?
            .ok_or_else(|| de::Error::custom("expected step type key"))?;

        let step = match key.as_str() {
            "navigate" => {
                let _: serde_yaml::Value = map.next_value()?;
                Step::Navigate
            }
            "wait_for_page_load" => {
                let _: serde_yaml::Value = map.next_value()?;
                Step::WaitForPageLoad
            }
            "click" => Step::Click(map.next_value()?),
            "clear" => Step::Clear(map.next_value()?),
            "type" => Step::Type(map.next_value()?),
            "fill" => Step::Fill(map.next_value()?),
            "wait_for_visible" => Step::WaitForVisible(map.next_value()?),
            "pause" => Step::Pause(map.next_value()?),
            "execute" => Step::Execute(map.next_value()?),
            "log" => Step::Log(map.next_value()?),
            other => return Err(de::Error::unknown_variant(other, STEP_NAMES)),
        };

        if map.next_key::<String>()?.is_some() {
            return Err(de::Error::custom(format!(
                "step '{}' must be the only key in its map",
                key
            )));
        }
        Ok(step)
    }
}
