use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// Placeholder bound to each literal of a parameterized scenario.
pub const CASE_PARAM: &str = "value";

/// Runtime parameters for `${name}` substitution.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Params binding one scenario case.
    pub fn for_case(input: i64) -> Self {
        Self::new().set(CASE_PARAM, input.to_string())
    }

    /// Parse `KEY=VALUE` command-line arguments.
    pub fn from_args(args: &[String]) -> Result<Self> {
        args.iter().try_fold(Self::new(), |params, arg| {
            let (key, value) = arg.split_once('=').ok_or_else(|| {
                Error::Config(format!("invalid param '{}', expected key=value", arg))
            })?;
            if key.is_empty() {
                return Err(Error::Config(format!("invalid param '{}', empty key", arg)));
            }
            Ok(params.set(key, value))
        })
    }
}

/// Parameter declaration in a suite file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParamDef {
    #[serde(default)]
    pub required: bool,

    pub default: Option<String>,

    pub description: Option<String>,
}

/// Replace every `${name}` in `template`.
///
/// Supplied params win over declared defaults. A declared param with neither
/// becomes an error if required and empty otherwise. Undeclared names are
/// left in place so a later pass (scenario cases) can bind them.
pub fn substitute(
    template: &str,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("${") {
        let Some(close) = rest[open..].find('}').map(|i| open + i) else {
            break;
        };
        out.push_str(&rest[..open]);
        let name = &rest[open + 2..close];

        match resolve(name, params, defs)? {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[open..=close]),
        }
        rest = &rest[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

fn resolve(
    name: &str,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<Option<String>> {
    if let Some(value) = params.get(name) {
        return Ok(Some(value.to_string()));
    }
    let Some(def) = defs.get(name) else {
        return Ok(None);
    };
    match (&def.default, def.required) {
        (Some(default), _) => Ok(Some(default.clone())),
        (None, true) => Err(Error::Config(format!(
            "missing required parameter: {}",
            name
        ))),
        (None, false) => Ok(Some(String::new())),
    }
}

/// Apply [`substitute`] to every string inside a YAML tree.
pub fn substitute_value(
    value: &mut serde_yaml::Value,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<()> {
    match value {
        serde_yaml::Value::String(s) => *s = substitute(s, params, defs)?,
        serde_yaml::Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                substitute_value(v, params, defs)?;
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for v in seq.iter_mut() {
                substitute_value(v, params, defs)?;
            }
        }
        serde_yaml::Value::Tagged(tagged) => substitute_value(&mut tagged.value, params, defs)?,
        _ => {}
    }
    Ok(())
}
