//! Type-erased resource
//!
//! The engine works on heterogeneous lists of resources. [`AnyResource`]
//! is a closed enum over every kind, serialized with a `kind` tag, and
//! forwards each lifecycle operation to the generic controller drivers.

use crate::controller::{self, Context, Model};
use crate::diagnostics::{AttributePath, Diagnostic, DiagnosticKind, Diagnostics};
use crate::resources::*;
use serde::{Deserialize, Serialize};

/// Apply order class; deletes run from the highest tier down
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Apps
    App,
    /// Host-wide resources and services
    Shared,
    /// Settings that live on an app
    AppSetting,
    /// Links between services and apps
    Link,
}

macro_rules! any_resource {
    ($($variant:ident($ty:ty) => $tier:expr),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "kind", rename_all = "snake_case")]
        pub enum AnyResource {
            $($variant($ty),)*
        }

        $(
            impl From<$ty> for AnyResource {
                fn from(resource: $ty) -> Self {
                    AnyResource::$variant(resource)
                }
            }
        )*

        impl AnyResource {
            pub fn kind(&self) -> &'static str {
                match self {
                    $(AnyResource::$variant(_) => <$ty as Model>::KIND,)*
                }
            }

            /// State key (`<kind>:<identity>`)
            pub fn key(&self) -> String {
                match self {
                    $(AnyResource::$variant(r) => r.key(),)*
                }
            }

            pub fn tier(&self) -> Tier {
                match self {
                    $(AnyResource::$variant(_) => $tier,)*
                }
            }

            pub fn validate(&self, diags: &mut Diagnostics) {
                match self {
                    $(AnyResource::$variant(r) => r.validate(diags),)*
                }
            }

            /// Immutable attributes changed from `self` to `planned`;
            /// `None` when the two are different kinds
            pub fn immutable_changes(&self, planned: &Self) -> Option<Vec<AttributePath>> {
                match (self, planned) {
                    $((AnyResource::$variant(prior), AnyResource::$variant(plan)) => {
                        Some(prior.immutable_changes(plan))
                    })*
                    _ => None,
                }
            }

            pub async fn create(&self, ctx: &Context) -> (Option<Self>, Diagnostics) {
                match self {
                    $(AnyResource::$variant(r) => {
                        let (state, diags) = controller::create(ctx, r).await;
                        (state.map(AnyResource::$variant), diags)
                    })*
                }
            }

            pub async fn read(&self, ctx: &Context) -> (Option<Self>, Diagnostics) {
                match self {
                    $(AnyResource::$variant(r) => {
                        let (state, diags) = controller::read(ctx, r).await;
                        (state.map(AnyResource::$variant), diags)
                    })*
                }
            }

            /// Update from `prior` (tracked state) to `self` (plan)
            pub async fn update(&self, prior: &Self, ctx: &Context) -> (Option<Self>, Diagnostics) {
                match (prior, self) {
                    $((AnyResource::$variant(prior), AnyResource::$variant(plan)) => {
                        let (state, diags) = controller::update(ctx, prior, plan).await;
                        (state.map(AnyResource::$variant), diags)
                    })*
                    _ => {
                        let mut diags = Diagnostics::new();
                        diags.push(
                            Diagnostic::error(DiagnosticKind::ImmutableFieldChanged, "Resource kind changed")
                                .with_detail(format!("{} cannot become {}", prior.kind(), self.kind()))
                                .at("kind"),
                        );
                        (None, diags)
                    }
                }
            }

            pub async fn delete(&self, ctx: &Context) -> Diagnostics {
                match self {
                    $(AnyResource::$variant(r) => controller::delete(ctx, r).await,)*
                }
            }
        }
    };
}

any_resource! {
    App(App) => Tier::App,
    Plugin(Plugin) => Tier::Shared,
    Service(Service) => Tier::Shared,
    GlobalDomain(GlobalDomain) => Tier::Shared,
    GitAuth(GitAuth) => Tier::Shared,
    Config(Config) => Tier::AppSetting,
    Checks(Checks) => Tier::AppSetting,
    Deploy(Deploy) => Tier::AppSetting,
    DockerOption(DockerOption) => Tier::AppSetting,
    Domain(Domain) => Tier::AppSetting,
    HttpAuth(HttpAuth) => Tier::AppSetting,
    Letsencrypt(Letsencrypt) => Tier::AppSetting,
    Network(Network) => Tier::AppSetting,
    Nginx(Nginx) => Tier::AppSetting,
    Port(Port) => Tier::AppSetting,
    Proxy(Proxy) => Tier::AppSetting,
    Registry(Registry) => Tier::AppSetting,
    Storage(Storage) => Tier::AppSetting,
    ServiceLink(ServiceLink) => Tier::Link,
}

/// Top-level attribute names whose values differ
///
/// Values are not reported, so secrets never leave the resource.
pub fn changed_attributes(prior: &AnyResource, planned: &AnyResource) -> Vec<String> {
    let (Ok(serde_json::Value::Object(before)), Ok(serde_json::Value::Object(after))) =
        (serde_json::to_value(prior), serde_json::to_value(planned))
    else {
        return Vec::new();
    };
    let mut names: Vec<String> = before
        .keys()
        .chain(after.keys())
        .filter(|name| before.get(*name) != after.get(*name))
        .cloned()
        .collect();
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use dokkuflow_client::{ChecksStatus, ServiceKind};

    #[test]
    fn test_kind_tag_matches_key_prefix() {
        let resource = AnyResource::from(Config::new("web", "PORT", "5000"));
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["kind"], "config");
        assert_eq!(resource.key(), "config:web/PORT");

        let link = AnyResource::from(ServiceLink {
            service_type: ServiceKind::Redis,
            service_name: "cache".into(),
            app_name: "web".into(),
            alias: None,
        });
        assert_eq!(serde_json::to_value(&link).unwrap()["kind"], link.kind());
    }

    #[test]
    fn test_deploy_round_trips_through_state_json() {
        let resource = AnyResource::from(Deploy {
            app_name: "web".into(),
            source: DeploySource::DockerImage {
                image: "nginx:1.25".into(),
            },
        });
        let json = serde_json::to_string(&resource).unwrap();
        let back: AnyResource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resource);
    }

    #[test]
    fn test_tiers_order_links_last() {
        let app = AnyResource::from(App::new("web"));
        let checks = AnyResource::from(Checks {
            app_name: "web".into(),
            status: ChecksStatus::Disabled,
        });
        assert!(app.tier() < checks.tier());
        assert!(checks.tier() < Tier::Link);
    }

    #[test]
    fn test_changed_attributes_names_only() {
        let prior = AnyResource::from(Config::new("web", "TOKEN", "old-secret"));
        let plan = AnyResource::from(Config::new("web", "TOKEN", "new-secret"));
        assert_eq!(changed_attributes(&prior, &plan), vec!["value"]);
        assert!(
            changed_attributes(&prior, &prior).is_empty()
        );
    }

    #[test]
    fn test_kind_mismatch_has_no_immutable_diff() {
        let app = AnyResource::from(App::new("web"));
        let plugin = AnyResource::from(Plugin {
            name: "web".into(),
            url: String::new(),
        });
        assert!(app.immutable_changes(&plugin).is_none());
    }
}
