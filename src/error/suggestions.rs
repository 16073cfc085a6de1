//! Context-aware error suggestions.

use serde_json::Value;

use super::codes::ErrorCode;

/// Generate a suggestion for an error, using its JSON context when present.
pub fn suggest_for_error(code: ErrorCode, context: Option<&Value>) -> String {
    match code {
        ErrorCode::CapabilityNotFound => suggest_capability_not_found(context),
        ErrorCode::ParameterRequired => suggest_parameter_required(context),
        ErrorCode::MissingProvider => suggest_missing_provider(context),
        ErrorCode::ComponentNotFound => suggest_component_not_found(context),
        _ => code.suggestion().to_string(),
    }
}

fn ctx_str<'a>(context: Option<&'a Value>, key: &str) -> Option<&'a str> {
    context.and_then(|c| c.get(key)).and_then(Value::as_str)
}

fn suggest_capability_not_found(context: Option<&Value>) -> String {
    match ctx_str(context, "capability") {
        Some(name) => match name.split_once('/') {
            Some((center, _)) => format!(
                "Capability '{name}' is not synced. Try `capkit center sync {center}` first"
            ),
            None => format!(
                "Capability '{name}' is not installed. Run `capkit cap list` to see what can be installed"
            ),
        },
        None => ErrorCode::CapabilityNotFound.suggestion().to_string(),
    }
}

fn suggest_parameter_required(context: Option<&Value>) -> String {
    match ctx_str(context, "parameter") {
        Some(param) => format!("Pass the parameter with `--set {param}=<value>`"),
        None => ErrorCode::ParameterRequired.suggestion().to_string(),
    }
}

fn suggest_missing_provider(context: Option<&Value>) -> String {
    match ctx_str(context, "provider") {
        Some(provider) => format!(
            "The cluster does not serve {provider}. Install its controller, then retry the install"
        ),
        None => ErrorCode::MissingProvider.suggestion().to_string(),
    }
}

fn suggest_component_not_found(context: Option<&Value>) -> String {
    match (ctx_str(context, "application"), ctx_str(context, "component")) {
        (Some(app), Some(component)) => format!(
            "Application '{app}' has no component '{component}'. Create it with `capkit run` first"
        ),
        _ => ErrorCode::ComponentNotFound.suggestion().to_string(),
    }
}
