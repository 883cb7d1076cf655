// starlift-core/src/domain/context.rs

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Timelike, Utc};
use regex::Regex;

use crate::domain::error::DomainError;

/// Everything a task may need from the run that scheduled it: the scheduled
/// timestamp plus operator-declared static parameters.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub scheduled_at: DateTime<Utc>,
    pub params: HashMap<String, String>,
}

impl RunContext {
    pub fn new(scheduled_at: DateTime<Utc>) -> Self {
        Self {
            scheduled_at,
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Operator params win over builtins, so a backfill can pin `run_date`.
    pub fn lookup(&self, name: &str) -> Option<String> {
        self.params
            .get(name)
            .cloned()
            .or_else(|| self.builtin(name))
    }

    fn builtin(&self, name: &str) -> Option<String> {
        match name {
            "run_date" => Some(self.scheduled_at.format("%Y-%m-%d").to_string()),
            "run_ts" => Some(self.scheduled_at.to_rfc3339()),
            "year" => Some(self.scheduled_at.year().to_string()),
            "month" => Some(format!("{:02}", self.scheduled_at.month())),
            "day" => Some(format!("{:02}", self.scheduled_at.day())),
            "hour" => Some(format!("{:02}", self.scheduled_at.hour())),
            _ => None,
        }
    }
}

#[allow(clippy::expect_used)]
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// Resolve every `{placeholder}` in a key template against the run context.
///
/// Every placeholder must resolve; a single missing one fails the whole
/// template before any statement is issued.
pub fn resolve_template(template: &str, ctx: &RunContext) -> Result<String, DomainError> {
    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let name = &caps[1];
        if ctx.lookup(name).is_none() {
            return Err(DomainError::UnresolvedPlaceholder {
                placeholder: name.to_string(),
                template: template.to_string(),
            });
        }
    }

    let resolved = PLACEHOLDER_RE.replace_all(template, |caps: &regex::Captures| {
        ctx.lookup(&caps[1]).unwrap_or_default()
    });

    Ok(resolved.into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ctx_at(y: i32, m: u32, d: u32) -> RunContext {
        RunContext::new(Utc.with_ymd_and_hms(y, m, d, 6, 30, 0).unwrap())
    }

    #[test]
    fn test_resolve_param() {
        let ctx = ctx_at(2024, 1, 1).with_param("run_date", "2024-01-01");
        let resolved = resolve_template("events/{run_date}", &ctx).unwrap();
        assert_eq!(resolved, "events/2024-01-01");
    }

    #[test]
    fn test_resolve_builtin_date() {
        let ctx = ctx_at(2024, 3, 7);
        let resolved = resolve_template("logs/{year}/{month}/{day}", &ctx).unwrap();
        assert_eq!(resolved, "logs/2024/03/07");
    }

    #[test]
    fn test_param_overrides_builtin() {
        let ctx = ctx_at(2024, 3, 7).with_param("run_date", "2019-12-31");
        let resolved = resolve_template("events/{run_date}", &ctx).unwrap();
        assert_eq!(resolved, "events/2019-12-31");
    }

    #[test]
    fn test_missing_placeholder_fails() {
        let ctx = ctx_at(2024, 1, 1);
        let result = resolve_template("events/{run_date}/{shard}", &ctx);
        assert!(matches!(
            result,
            Err(DomainError::UnresolvedPlaceholder { ref placeholder, .. }) if placeholder == "shard"
        ));
    }

    #[test]
    fn test_plain_template_untouched() {
        let ctx = ctx_at(2024, 1, 1);
        let resolved = resolve_template("song_data", &ctx).unwrap();
        assert_eq!(resolved, "song_data");
    }
}
