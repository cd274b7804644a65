//! The scenario catalogue: API checks and browser flows against a live server

use crate::runner::Scenario;

/// Declare a unit struct implementing [`Scenario`] by delegating to an async fn.
///
/// ```ignore
/// scenario!(UserCreatesProject {
///     name: "user_creates_project",
///     description: "User should be able to create project",
///     tags: ["api", "regression"],
/// } => user_creates_project);
/// ```
macro_rules! scenario {
    (
        $ty:ident {
            name: $name:literal,
            description: $description:literal,
            tags: [$($tag:literal),* $(,)?]
            $(, browsers: [$($browser:ident),* $(,)?])?
            $(,)?
        } => $body:path
    ) => {
        pub struct $ty;

        #[async_trait::async_trait]
        impl $crate::runner::Scenario for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn description(&self) -> &'static str {
                $description
            }

            fn tags(&self) -> &'static [&'static str] {
                &[$($tag),*]
            }

            $(
                fn browsers(&self) -> &'static [$crate::playwright::Browser] {
                    &[$($crate::playwright::Browser::$browser),*]
                }
            )?

            async fn run(&self, ctx: &mut $crate::context::TestContext) -> anyhow::Result<()> {
                $body(ctx).await
            }
        }
    };
}

pub mod api;
pub mod ui;

/// Every scenario, in the order a full run executes them
pub fn all() -> Vec<Box<dyn Scenario>> {
    let mut scenarios = api::scenarios();
    scenarios.extend(ui::scenarios());
    scenarios
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playwright::Browser;
    use std::collections::HashSet;

    #[test]
    fn test_scenario_names_are_unique() {
        let all = all();
        let names: HashSet<_> = all.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn test_every_scenario_is_tagged_api_or_ui() {
        for scenario in all() {
            let tags = scenario.tags();
            assert!(
                tags.contains(&"api") ^ tags.contains(&"ui"),
                "{} must be tagged api or ui",
                scenario.name()
            );
        }
    }

    #[test]
    fn test_build_type_ui_flows_are_browser_restricted() {
        let all = all();
        let restricted: Vec<_> = all.iter().filter(|s| !s.browsers().is_empty()).collect();
        assert_eq!(restricted.len(), 2);
        for scenario in restricted {
            assert_eq!(scenario.browsers(), &[Browser::Chromium, Browser::Firefox]);
        }
    }
}
