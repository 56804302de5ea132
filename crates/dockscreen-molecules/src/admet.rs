//! ADMET property prediction through a remote service.
//!
//! The service response varies between deployments: fields may be nested
//! under `data` or `result`, carry different names, and use different units.
//! Each metric is therefore looked up through an ordered alias table where
//! every alias names its own transform into [0, 1]. Anything the response
//! does not supply falls back to a conservative default.

use crate::error::AdmetServiceError;
use async_trait::async_trait;
use dockscreen_common::{Compound, CompoundId, SandboxClient, ScreenError};
use dockscreen_db::{AdmetProfile, AdmetRecord, AdmetResultRepository, Database, DbError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub const DEFAULT_API_URL: &str = "https://admetmesh.scbdd.com/service/evaluation/index";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// ADMET service connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmetSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub profile: AdmetProfile,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for AdmetSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            profile: AdmetProfile::default(),
        }
    }
}

// =============================================================================
// Service seam
// =============================================================================

/// Remote ADMET prediction endpoint.
#[async_trait]
pub trait AdmetService: Send + Sync {
    /// POST `request` and return the decoded JSON body.
    async fn fetch(&self, request: &Value) -> Result<Value, AdmetServiceError>;
}

/// [`AdmetService`] over HTTP, restricted to the configured host.
pub struct HttpAdmetClient {
    client: SandboxClient,
    url: String,
}

impl HttpAdmetClient {
    pub fn new(settings: &AdmetSettings) -> Result<Self, ScreenError> {
        let mut client = SandboxClient::with_timeout(Duration::from_secs(settings.timeout_secs))?;
        client.allow_url(&settings.api_url)?;
        Ok(Self {
            client,
            url: settings.api_url.clone(),
        })
    }
}

#[async_trait]
impl AdmetService for HttpAdmetClient {
    async fn fetch(&self, request: &Value) -> Result<Value, AdmetServiceError> {
        let response = self.client.post(&self.url)?.json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdmetServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| AdmetServiceError::Body(e.to_string()))
    }
}

// =============================================================================
// Alias table
// =============================================================================

/// A metric stored on [`AdmetRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    HergToxicity,
    AmesToxicity,
    LiverToxicity,
    Absorption,
    Metabolism,
    Distribution,
    Excretion,
    Toxicity,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::HergToxicity => "herg_toxicity",
            Metric::AmesToxicity => "ames_toxicity",
            Metric::LiverToxicity => "liver_toxicity",
            Metric::Absorption => "absorption",
            Metric::Metabolism => "metabolism",
            Metric::Distribution => "distribution",
            Metric::Excretion => "excretion",
            Metric::Toxicity => "toxicity",
        }
    }

    /// Value assumed when the service does not supply one.
    pub fn default_value(self) -> f64 {
        match self {
            Metric::HergToxicity => 0.3,
            Metric::AmesToxicity | Metric::LiverToxicity => 0.0,
            Metric::Absorption => 0.7,
            Metric::Metabolism | Metric::Distribution | Metric::Excretion => 0.6,
            Metric::Toxicity => 0.3,
        }
    }

    pub fn get(self, record: &AdmetRecord) -> Option<f64> {
        match self {
            Metric::HergToxicity => record.herg_toxicity,
            Metric::AmesToxicity => record.ames_toxicity,
            Metric::LiverToxicity => record.liver_toxicity,
            Metric::Absorption => record.absorption,
            Metric::Metabolism => record.metabolism,
            Metric::Distribution => record.distribution,
            Metric::Excretion => record.excretion,
            Metric::Toxicity => record.toxicity,
        }
    }

    /// Stored value, or the default when the record lacks it.
    pub fn value_or_default(self, record: &AdmetRecord) -> f64 {
        self.get(record).unwrap_or_else(|| self.default_value())
    }

    fn slot(self, record: &mut AdmetRecord) -> &mut Option<f64> {
        match self {
            Metric::HergToxicity => &mut record.herg_toxicity,
            Metric::AmesToxicity => &mut record.ames_toxicity,
            Metric::LiverToxicity => &mut record.liver_toxicity,
            Metric::Absorption => &mut record.absorption,
            Metric::Metabolism => &mut record.metabolism,
            Metric::Distribution => &mut record.distribution,
            Metric::Excretion => &mut record.excretion,
            Metric::Toxicity => &mut record.toxicity,
        }
    }
}

/// Conversion from a raw response value into [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// Already a probability or fraction
    Identity,
    /// Positive (>= 0.5) becomes 1.0, otherwise 0.0
    Flag,
    /// Caco-2 permeability, log cm/s in roughly [-7, -3]
    Caco2,
    /// Binary call mapped onto two fixed scores
    Binary { negative: f64, positive: f64 },
    /// Half-life in hours, 10 h or more counts as fully stable
    HalfLife,
    /// Clearance in mL/min/kg, 100 or more counts as fully unstable
    Clearance,
}

impl Transform {
    pub fn apply(self, raw: f64) -> f64 {
        match self {
            Transform::Identity => raw,
            Transform::Flag => {
                if raw >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Transform::Caco2 => (raw + 7.0) / 4.0,
            Transform::Binary { negative, positive } => {
                if raw >= 0.5 {
                    positive
                } else {
                    negative
                }
            }
            Transform::HalfLife => raw / 10.0,
            Transform::Clearance => 1.0 - raw / 100.0,
        }
    }
}

/// Ordered aliases for one metric; the first alias present wins.
#[derive(Debug)]
pub struct MetricRule {
    pub metric: Metric,
    pub aliases: &'static [(&'static str, Transform)],
}

pub const STANDARD_RULES: &[MetricRule] = &[
    MetricRule {
        metric: Metric::HergToxicity,
        aliases: &[
            ("herg_toxicity", Transform::Identity),
            ("hERG", Transform::Identity),
            ("Cardiotoxicity", Transform::Identity),
        ],
    },
    MetricRule {
        metric: Metric::AmesToxicity,
        aliases: &[
            ("ames_toxicity", Transform::Flag),
            ("AMES", Transform::Flag),
            ("Mutagenicity", Transform::Flag),
        ],
    },
    MetricRule {
        metric: Metric::LiverToxicity,
        aliases: &[
            ("liver_toxicity", Transform::Flag),
            ("DILI", Transform::Flag),
            ("Hepatotoxicity", Transform::Flag),
        ],
    },
    MetricRule {
        metric: Metric::Absorption,
        aliases: &[
            ("absorption", Transform::Identity),
            ("Caco2", Transform::Caco2),
            ("HIA", Transform::Identity),
            ("Bioavailability", Transform::Identity),
        ],
    },
    MetricRule {
        metric: Metric::Metabolism,
        aliases: &[
            ("metabolism", Transform::Identity),
            ("CYP", Transform::Binary { negative: 0.8, positive: 0.4 }),
            ("CYP3A4_Substrate", Transform::Binary { negative: 0.7, positive: 0.5 }),
            ("Half_Life", Transform::HalfLife),
            ("Clearance", Transform::Clearance),
        ],
    },
];

pub const LEGACY_RULES: &[MetricRule] = &[
    MetricRule {
        metric: Metric::Absorption,
        aliases: &[("absorption", Transform::Identity), ("Absorption", Transform::Identity)],
    },
    MetricRule {
        metric: Metric::Distribution,
        aliases: &[("distribution", Transform::Identity), ("Distribution", Transform::Identity)],
    },
    MetricRule {
        metric: Metric::Metabolism,
        aliases: &[("metabolism", Transform::Identity), ("Metabolism", Transform::Identity)],
    },
    MetricRule {
        metric: Metric::Excretion,
        aliases: &[("excretion", Transform::Identity), ("Excretion", Transform::Identity)],
    },
    MetricRule {
        metric: Metric::Toxicity,
        aliases: &[("toxicity", Transform::Identity), ("Toxicity", Transform::Identity)],
    },
];

pub fn rules_for(profile: AdmetProfile) -> &'static [MetricRule] {
    match profile {
        AdmetProfile::Standard => STANDARD_RULES,
        AdmetProfile::Legacy => LEGACY_RULES,
    }
}

/// Number, boolean or numeric string. Non-finite values count as absent.
fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

/// The object holding the metrics: `data`, then `result`, then the root.
fn unwrap_payload(payload: &Value) -> &Value {
    payload
        .get("data")
        .or_else(|| payload.get("result"))
        .unwrap_or(payload)
}

/// First alias present in `body` for `rule`, transformed.
fn lookup(body: &Value, rule: &MetricRule) -> Option<(&'static str, f64)> {
    rule.aliases.iter().find_map(|(alias, transform)| {
        let raw = body.get(*alias).and_then(as_number)?;
        let value = transform.apply(raw);
        value.is_finite().then_some((*alias, value))
    })
}

/// Build a record from a service response. Every metric of the profile is
/// set, either from the response or from its default, and clamped to [0, 1].
pub fn normalize(compound_id: CompoundId, profile: AdmetProfile, payload: &Value) -> AdmetRecord {
    let body = unwrap_payload(payload);
    let mut record = AdmetRecord::new(compound_id, profile);

    for rule in rules_for(profile) {
        let value = match lookup(body, rule) {
            Some((alias, value)) => {
                debug!(metric = rule.metric.name(), alias, value, "ADMET metric resolved");
                value
            }
            None => {
                warn!(
                    compound_id,
                    metric = rule.metric.name(),
                    default = rule.metric.default_value(),
                    "ADMET response lacks metric, using default"
                );
                rule.metric.default_value()
            }
        };
        *rule.metric.slot(&mut record) = Some(value.clamp(0.0, 1.0));
    }

    record
}

/// Record holding only defaults, used when the service is unreachable.
pub fn default_record(compound_id: CompoundId, profile: AdmetProfile) -> AdmetRecord {
    let mut record = AdmetRecord::new(compound_id, profile);
    backfill(&mut record);
    record
}

/// Fill missing metrics of the record's profile with defaults. Present values
/// are never touched. Returns the metrics that were filled.
pub fn backfill(record: &mut AdmetRecord) -> Vec<Metric> {
    let mut filled = Vec::new();
    for rule in rules_for(record.profile) {
        let slot = rule.metric.slot(record);
        if slot.is_none() {
            *slot = Some(rule.metric.default_value());
            filled.push(rule.metric);
        }
    }
    filled
}

/// Request body for a compound.
pub fn build_request(compound: &Compound, profile: AdmetProfile) -> Value {
    match profile {
        AdmetProfile::Standard => json!({ "smiles": compound.smiles }),
        AdmetProfile::Legacy => json!({ "compoundId": compound.ligand_stem }),
    }
}

// =============================================================================
// Predictor
// =============================================================================

/// Produces and stores one ADMET record per compound.
#[derive(Clone)]
pub struct AdmetPredictor {
    service: Arc<dyn AdmetService>,
    records: AdmetResultRepository,
    profile: AdmetProfile,
}

impl AdmetPredictor {
    pub fn new(service: Arc<dyn AdmetService>, db: Arc<Database>, profile: AdmetProfile) -> Self {
        Self {
            service,
            records: AdmetResultRepository::new(db),
            profile,
        }
    }

    pub fn profile(&self) -> AdmetProfile {
        self.profile
    }

    /// ADMET record for a compound.
    ///
    /// A stored record is reused: missing fields are backfilled with defaults
    /// and the service is not queried again. Service failures never surface;
    /// they are logged and the record falls back to defaults.
    #[instrument(skip(self, compound), fields(compound_id = compound.id))]
    pub async fn predict(&self, compound: &Compound) -> Result<AdmetRecord, DbError> {
        if let Some(mut existing) = self.records.find_by_compound(compound.id).await? {
            let filled = backfill(&mut existing);
            if filled.is_empty() {
                debug!("Reusing stored ADMET record");
                return Ok(existing);
            }
            info!(filled = filled.len(), "Backfilled stored ADMET record with defaults");
            return self.records.save(&existing).await;
        }

        let request = build_request(compound, self.profile);
        let record = match self.service.fetch(&request).await {
            Ok(payload) => normalize(compound.id, self.profile, &payload),
            Err(e) => {
                warn!(error = %e, "ADMET service unavailable, storing default metrics");
                default_record(compound.id, self.profile)
            }
        };

        let stored = self.records.save(&record).await?;
        info!(record_id = %stored.id, "ADMET record stored");
        Ok(stored)
    }

    pub async fn result_for(&self, compound_id: CompoundId) -> Result<Option<AdmetRecord>, DbError> {
        self.records.find_by_compound(compound_id).await
    }

    pub async fn result(&self, id: Uuid) -> Result<Option<AdmetRecord>, DbError> {
        self.records.find_by_id(id).await
    }
}
