//! Gemini model discovery — list, filter, rank, select.
//!
//! Runs once per request; nothing is cached. The listing endpoints return
//! namespaced names (`models/gemini-1.5-flash`) while the generation endpoint
//! wants the bare identifier, see [`bare_model_name`].
//!
//! ```text
//!   ListV1 ──(v1 needs fallback)──▶ ListV1Beta ──▶ Select ──▶ SelectedModel
//!     │                                              │
//!     └──────────────(otherwise)──────────────▶ Select ──▶ DiscoveryFailure
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use nilgiri_core::config::DiscoveryFallback;
use nilgiri_core::error::DiscoveryFailure;
use nilgiri_core::ApiVersion;

/// Capability a model must advertise to be eligible.
pub const GENERATE_CONTENT: &str = "generateContent";

// ─────────────────────────────────────────────
// Listing data
// ─────────────────────────────────────────────

/// One entry of a `GET /{version}/models` response.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ListedModel {
    pub name: String,
    pub supported_generation_methods: Vec<String>,
}

impl ListedModel {
    pub fn new(name: impl Into<String>, methods: &[&str]) -> Self {
        ListedModel {
            name: name.into(),
            supported_generation_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn supports_generation(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == GENERATE_CONTENT)
    }
}

/// Result of listing one API version. A failed listing carries its error
/// message and an empty model set.
#[derive(Clone, Debug, PartialEq)]
pub struct ListingOutcome {
    pub version: ApiVersion,
    pub models: Vec<ListedModel>,
    pub error: Option<String>,
}

impl ListingOutcome {
    pub fn fetched(version: ApiVersion, models: Vec<ListedModel>) -> Self {
        ListingOutcome {
            version,
            models,
            error: None,
        }
    }

    pub fn failed(version: ApiVersion, error: impl Into<String>) -> Self {
        ListingOutcome {
            version,
            models: Vec::new(),
            error: Some(error.into()),
        }
    }

    fn names(&self) -> Vec<String> {
        self.models.iter().map(|m| m.name.clone()).collect()
    }
}

/// The model a Gemini call will be sent to.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedModel {
    pub version: ApiVersion,
    /// Namespaced name as listed (e.g. `models/gemini-1.5-flash`).
    pub name: String,
}

impl SelectedModel {
    pub fn bare_name(&self) -> &str {
        bare_model_name(&self.name)
    }
}

/// Strip the namespace: `models/gemini-1.5-flash-8b` → `gemini-1.5-flash-8b`.
pub fn bare_model_name(name: &str) -> &str {
    name.rsplit_once('/').map_or(name, |(_, bare)| bare)
}

// ─────────────────────────────────────────────
// Ranking
// ─────────────────────────────────────────────

fn tier(name: &str) -> u8 {
    let lower = name.to_lowercase();
    if lower.contains("flash") {
        0
    } else if lower.contains("pro") {
        1
    } else {
        2
    }
}

/// Generation-capable models, best first: `flash` < `pro` < anything else.
/// Ties keep listing order (`sort_by_key` is stable).
pub fn rank_models(models: &[ListedModel]) -> Vec<&ListedModel> {
    let mut capable: Vec<&ListedModel> =
        models.iter().filter(|m| m.supports_generation()).collect();
    capable.sort_by_key(|m| tier(&m.name));
    capable
}

// ─────────────────────────────────────────────
// State machine
// ─────────────────────────────────────────────

/// Source of model listings (the Gemini adapter, or a fixture in tests).
#[async_trait]
pub trait ModelLister: Send + Sync {
    /// List the models of one API version. Never fails: errors are folded
    /// into the outcome.
    async fn list(&self, version: ApiVersion) -> ListingOutcome;
}

enum DiscoveryState {
    ListV1,
    ListV1Beta {
        v1: ListingOutcome,
    },
    Select {
        v1: ListingOutcome,
        v1beta: Option<ListingOutcome>,
    },
}

fn needs_fallback(policy: DiscoveryFallback, v1: &ListingOutcome) -> bool {
    match policy {
        DiscoveryFallback::WhenEmpty => v1.models.is_empty(),
        DiscoveryFallback::WhenNoneCapable => rank_models(&v1.models).is_empty(),
    }
}

/// Run discovery: list `v1`, list `v1beta` only if `policy` asks for it,
/// then [`select`].
pub async fn discover<L>(
    lister: &L,
    policy: DiscoveryFallback,
) -> Result<SelectedModel, DiscoveryFailure>
where
    L: ModelLister + ?Sized,
{
    let mut state = DiscoveryState::ListV1;
    loop {
        state = match state {
            DiscoveryState::ListV1 => {
                let v1 = lister.list(ApiVersion::V1).await;
                if needs_fallback(policy, &v1) {
                    debug!(models = v1.models.len(), "v1 listing unusable, trying v1beta");
                    DiscoveryState::ListV1Beta { v1 }
                } else {
                    DiscoveryState::Select { v1, v1beta: None }
                }
            }
            DiscoveryState::ListV1Beta { v1 } => {
                let v1beta = lister.list(ApiVersion::V1Beta).await;
                DiscoveryState::Select {
                    v1,
                    v1beta: Some(v1beta),
                }
            }
            DiscoveryState::Select { v1, v1beta } => return select(&v1, v1beta.as_ref()),
        };
    }
}

/// Pick the best capable model, preferring `v1` over `v1beta`.
pub fn select(
    v1: &ListingOutcome,
    v1beta: Option<&ListingOutcome>,
) -> Result<SelectedModel, DiscoveryFailure> {
    for listing in std::iter::once(v1).chain(v1beta) {
        if let Some(best) = rank_models(&listing.models).first() {
            debug!(version = %listing.version, model = %best.name, "selected Gemini model");
            return Ok(SelectedModel {
                version: listing.version,
                name: best.name.clone(),
            });
        }
    }

    Err(DiscoveryFailure {
        v1_error: v1.error.clone(),
        v1beta_error: v1beta.and_then(|l| l.error.clone()),
        v1_models: v1.names(),
        v1beta_models: v1beta.map(ListingOutcome::names).unwrap_or_default(),
    })
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
