//! Absence sentinels
//!
//! The remote reports a missing subject only through text on stdout. These
//! substrings separate "absent" from "failed" and every adapter goes through
//! the matchers below instead of inlining its own strings.

/// Trailing part of every "missing subject" message
pub const DOES_NOT_EXIST: &str = "does not exist";
/// Listing a port-less app
pub const NO_PORT_MAPPINGS: &str = "No port mappings configured for app";
/// Unlinking or querying a link that is not there
pub const NOT_LINKED: &str = "is not linked to";

/// `App <name> does not exist`
pub fn app_missing(app: &str) -> String {
    format!("App {} {}", app, DOES_NOT_EXIST)
}

/// `<Plugin> service <name> does not exist`
pub fn service_missing(service: &str) -> String {
    format!("service {} {}", service, DOES_NOT_EXIST)
}

/// `Service <service> is not linked to <app>`
pub fn not_linked(service: &str, app: &str) -> String {
    format!("Service {} {} {}", service, NOT_LINKED, app)
}

pub fn is_app_missing(output: &str, app: &str) -> bool {
    output.contains(&app_missing(app))
}

/// Service messages are capitalized per plugin (`Postgres service ...`)
pub fn is_service_missing(output: &str, service: &str) -> bool {
    output
        .to_ascii_lowercase()
        .contains(&service_missing(service).to_ascii_lowercase())
}

pub fn is_not_linked(output: &str) -> bool {
    output.contains(NOT_LINKED)
}

pub fn is_no_port_mappings(output: &str) -> bool {
    output.contains(NO_PORT_MAPPINGS)
}

/// Generic fallback for subjects without a dedicated message
pub fn is_missing(output: &str) -> bool {
    output.contains(DOES_NOT_EXIST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_missing() {
        assert!(is_app_missing(" !     App web does not exist", "web"));
        assert!(!is_app_missing(" !     App web2 does not exist", "web"));
    }

    #[test]
    fn test_service_missing_is_case_insensitive() {
        assert!(is_service_missing(" !     Postgres service db does not exist", "db"));
        assert!(is_service_missing(" !     service db does not exist", "db"));
        assert!(!is_service_missing(" !     Postgres service other does not exist", "db"));
    }

    #[test]
    fn test_not_linked() {
        assert!(is_not_linked(&not_linked("db", "web")));
        assert!(is_no_port_mappings(" !     No port mappings configured for app web"));
    }
}
