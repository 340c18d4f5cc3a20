use pipeline_core::PollError;

/// Resolve a required input from its flag, then from the `INPUT_*` variable the
/// Actions runner exports for it. Blank values count as missing.
pub fn required(
    name: &'static str,
    explicit: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, PollError> {
    explicit
        .or_else(|| lookup(&runner_env_key(name)))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(PollError::MissingInput(name))
}

/// `github-token` → `INPUT_GITHUB-TOKEN`, matching how the runner names inputs.
fn runner_env_key(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn explicit_value_wins() {
        let value = required("pipeline-name", Some(" web ".into()), |_| Some("other".into()));
        assert_eq!(value.unwrap(), "web");
    }

    #[test]
    fn falls_back_to_runner_variable() {
        let value = required("github-token", None, |key| {
            (key == "INPUT_GITHUB-TOKEN").then(|| "ghs_abc".to_string())
        });
        assert_eq!(value.unwrap(), "ghs_abc");
    }

    #[test]
    fn blank_or_absent_is_missing() {
        let err = required("pipeline-name", Some("   ".into()), none).unwrap_err();
        assert!(err.is_config());
        assert_eq!(
            err.to_string(),
            "input required and not supplied: pipeline-name"
        );
        assert!(required("github-token", None, none).is_err());
    }
}
