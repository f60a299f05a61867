//! Description resolution for containers.
//!
//! Resolution order: the `app.description` label, then a description
//! generated earlier and still pending, then the configured text generator,
//! then a default built from the container name. A generator failure
//! degrades to the default and is only logged.

use std::sync::Arc;

use dockboard_common::constants::{DESCRIPTION_LABEL, UNKNOWN_IMAGE};
use dockboard_common::error::{DockboardError, Result};
use dockboard_common::types::Container;
use serde::{Deserialize, Serialize};

use crate::pending::PendingLabels;

/// Produces free text from a prompt.
pub trait TextGenerator: Send + Sync {
    /// Returns the generated text for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns `ExternalService` on transport failure, timeout, a non-2xx
    /// answer, or a response without text.
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Where a description came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionSource {
    /// Read from the container's label.
    Cached,
    /// Produced by the text generator, now or by an earlier request.
    Generated,
    /// Built from the container name.
    Default,
}

impl DescriptionSource {
    /// Lowercase name, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::Generated => "generated",
            Self::Default => "default",
        }
    }
}

/// A resolved description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    /// Text shown to users.
    pub text: String,
    /// Origin of `text`.
    pub source: DescriptionSource,
}

impl Description {
    fn fallback(container: &Container) -> Self {
        Self {
            text: default_description(&container.name),
            source: DescriptionSource::Default,
        }
    }
}

/// Resolves descriptions, optionally backed by a text generator.
#[derive(Clone)]
pub struct DescriptionProvider {
    generator: Option<Arc<dyn TextGenerator>>,
    pending: Arc<PendingLabels>,
}

impl std::fmt::Debug for DescriptionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptionProvider")
            .field("generator", &self.generator.is_some())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl DescriptionProvider {
    /// Creates a provider; `None` disables generation.
    #[must_use]
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, pending: Arc<PendingLabels>) -> Self {
        Self { generator, pending }
    }

    /// Returns whether a generator is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    /// Stash of generated descriptions awaiting recreation.
    #[must_use]
    pub fn pending(&self) -> &Arc<PendingLabels> {
        &self.pending
    }

    /// Resolves the description of `container`.
    ///
    /// A generated description is reused until the container is recreated,
    /// so repeated calls give the same text and call the generator once.
    /// With `force_regenerate`, both the label and the pending description
    /// are ignored and the generator is asked for a fresh one.
    ///
    /// # Errors
    ///
    /// Returns `Validation` only when `force_regenerate` is set and no
    /// generator is configured. Generator failures never surface.
    pub fn describe(&self, container: &Container, force_regenerate: bool) -> Result<Description> {
        if !force_regenerate {
            if let Some(label) = container.label(DESCRIPTION_LABEL) {
                return Ok(Description {
                    text: label.to_string(),
                    source: DescriptionSource::Cached,
                });
            }
            if let Some(text) = self.pending.peek(&container.name) {
                return Ok(Description {
                    text,
                    source: DescriptionSource::Generated,
                });
            }
        }

        let Some(generator) = &self.generator else {
            if force_regenerate {
                return Err(DockboardError::Validation {
                    message: "AI API key not configured".into(),
                });
            }
            return Ok(Description::fallback(container));
        };

        let image = container.primary_tag().unwrap_or(UNKNOWN_IMAGE);
        match generator.generate(&prompt(&container.name, image)) {
            Ok(text) if !text.trim().is_empty() => {
                let text = text.trim().to_string();
                self.pending.record(&container.name, &text);
                tracing::debug!(name = %container.name, "generated description");
                Ok(Description {
                    text,
                    source: DescriptionSource::Generated,
                })
            }
            Ok(_) => {
                tracing::warn!(name = %container.name, "generator returned an empty description");
                Ok(Description::fallback(container))
            }
            Err(e) => {
                tracing::warn!(name = %container.name, error = %e, "description generation failed");
                Ok(Description::fallback(container))
            }
        }
    }
}

/// Description used when nothing better is available.
#[must_use]
pub fn default_description(name: &str) -> String {
    format!("Container: {name}")
}

/// Builds the one-sentence generation prompt.
#[must_use]
pub fn prompt(name: &str, image: &str) -> String {
    format!(
        "Based on this Docker container information, provide a brief 1-sentence \
         description of what this application does:\n\n\
         Container name: {name}\n\
         Image: {image}\n\n\
         Respond with ONLY the description, no additional text."
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use dockboard_common::types::{ContainerId, ContainerStatus, PortBindings, RecreateConfig};

    use super::*;

    struct Scripted {
        reply: Result<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(reply: Result<String>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    impl TextGenerator for Scripted {
        fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(DockboardError::ExternalService {
                    message: e.to_string(),
                }),
            }
        }
    }

    fn container(label: Option<&str>, tags: &[&str]) -> Container {
        let mut labels = BTreeMap::new();
        if let Some(label) = label {
            let _ = labels.insert(DESCRIPTION_LABEL.to_string(), label.to_string());
        }
        Container {
            id: ContainerId::new("4f66ad9a0b2e8c1d"),
            name: "web".into(),
            image_tags: tags.iter().map(ToString::to_string).collect(),
            status: ContainerStatus::Running,
            created: None,
            ports: PortBindings::new(),
            labels,
            state: serde_json::Value::Null,
            config: RecreateConfig::default(),
        }
    }

    fn provider(generator: Option<Arc<dyn TextGenerator>>) -> DescriptionProvider {
        DescriptionProvider::new(generator, Arc::new(PendingLabels::new()))
    }

    #[test]
    fn label_is_used_without_calling_the_generator() {
        let generator = Scripted::new(Ok("unused".into()));
        let p = provider(Some(generator.clone()));
        let d = p.describe(&container(Some("Landing page"), &["nginx"]), false).unwrap();
        assert_eq!(d.text, "Landing page");
        assert_eq!(d.source, DescriptionSource::Cached);
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn no_generator_and_no_label_gives_default() {
        let d = provider(None).describe(&container(None, &[]), false).unwrap();
        assert_eq!(d.text, "Container: web");
        assert_eq!(d.source, DescriptionSource::Default);
    }

    #[test]
    fn generated_text_is_trimmed_and_stashed() {
        let generator = Scripted::new(Ok("  Serves the landing page.\n".into()));
        let p = provider(Some(generator.clone()));
        let d = p.describe(&container(None, &["nginx:1.27"]), false).unwrap();
        assert_eq!(d.text, "Serves the landing page.");
        assert_eq!(d.source, DescriptionSource::Generated);
        assert_eq!(p.pending().peek("web").as_deref(), Some("Serves the landing page."));

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("Container name: web"));
        assert!(prompts[0].contains("Image: nginx:1.27"));
    }

    #[test]
    fn untagged_image_is_prompted_as_unknown() {
        let generator = Scripted::new(Ok("x".into()));
        let p = provider(Some(generator.clone()));
        let _ = p.describe(&container(None, &[]), false).unwrap();
        assert!(generator.prompts.lock().unwrap()[0].contains("Image: unknown"));
    }

    #[test]
    fn generator_failure_falls_back_to_default() {
        let generator = Scripted::new(Err(DockboardError::ExternalService {
            message: "HTTP 529".into(),
        }));
        let p = provider(Some(generator));
        let d = p.describe(&container(None, &["nginx"]), false).unwrap();
        assert_eq!(d.source, DescriptionSource::Default);
        assert!(p.pending().is_empty());
    }

    #[test]
    fn blank_generation_falls_back_to_default() {
        let p = provider(Some(Scripted::new(Ok("   ".into()))));
        let d = p.describe(&container(None, &["nginx"]), false).unwrap();
        assert_eq!(d.source, DescriptionSource::Default);
    }

    #[test]
    fn forcing_bypasses_the_label() {
        let p = provider(Some(Scripted::new(Ok("Fresh".into()))));
        let d = p.describe(&container(Some("Stale"), &["nginx"]), true).unwrap();
        assert_eq!(d.text, "Fresh");
        assert_eq!(d.source, DescriptionSource::Generated);
    }

    #[test]
    fn forcing_without_generator_is_rejected() {
        let err = provider(None)
            .describe(&container(Some("Stale"), &[]), true)
            .unwrap_err();
        assert_eq!(err.to_string(), "AI API key not configured");
    }

    struct Counting {
        calls: Mutex<usize>,
    }

    impl TextGenerator for Counting {
        fn generate(&self, _prompt: &str) -> Result<String> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            Ok(format!("description #{calls}"))
        }
    }

    #[test]
    fn generated_description_is_reused() {
        let generator = Arc::new(Counting {
            calls: Mutex::new(0),
        });
        let p = provider(Some(generator.clone()));
        let c = container(None, &["nginx"]);
        let first = p.describe(&c, false).unwrap();
        let second = p.describe(&c, false).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.source, DescriptionSource::Generated);
        assert_eq!(*generator.calls.lock().unwrap(), 1);
    }

    #[test]
    fn forcing_replaces_the_pending_description() {
        let generator = Arc::new(Counting {
            calls: Mutex::new(0),
        });
        let p = provider(Some(generator));
        let c = container(None, &["nginx"]);
        let _ = p.describe(&c, false).unwrap();
        let forced = p.describe(&c, true).unwrap();
        assert_eq!(forced.text, "description #2");
        assert_eq!(p.describe(&c, false).unwrap().text, "description #2");
    }

    #[test]
    fn source_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DescriptionSource::Generated).unwrap(),
            "\"generated\""
        );
    }
}
