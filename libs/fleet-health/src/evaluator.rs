//! StatusEvaluator - root-cause attribution for one snapshot
//!
//! Layers are evaluated top-down, each guarded by the layers it depends on:
//!
//! ```text
//! gateway ─▶ host ─┬▶ storage
//!                  ├▶ login
//!                  └▶ video
//! ```
//!
//! When a layer is down, every layer below it is attributed as down too and
//! its raw reading is discarded. The single root cause is the first failed
//! layer in [`IssueCategory::PRECEDENCE`].

use serde::{Deserialize, Serialize};

use crate::severity::classify;
use crate::types::{EffectiveStatus, IssueCategory, RawSnapshot, SeverityTier};

/// Result of evaluating one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Evaluation {
    pub status: EffectiveStatus,
    pub category: IssueCategory,
}

impl Evaluation {
    pub fn severity(&self) -> SeverityTier {
        classify(self.category)
    }

    pub fn into_parts(self) -> (EffectiveStatus, IssueCategory) {
        (self.status, self.category)
    }
}

/// A guard returns `Some(status)` when its layer is down and evaluation
/// must stop there, `None` to continue with the next guard.
type LayerGuard = fn(&RawSnapshot) -> Option<EffectiveStatus>;

/// Guards for the layers everything else depends on, in order
const DEPENDENCY_GUARDS: [LayerGuard; 2] = [gateway_guard, host_guard];

fn gateway_guard(snapshot: &RawSnapshot) -> Option<EffectiveStatus> {
    (!snapshot.gateway_reachable).then_some(EffectiveStatus::DOWN)
}

fn host_guard(snapshot: &RawSnapshot) -> Option<EffectiveStatus> {
    (!snapshot.host_reachable).then_some(EffectiveStatus {
        gateway: true,
        ..EffectiveStatus::DOWN
    })
}

/// Leaf layers, read only once gateway and host are both up
///
/// Login is attributed from host reachability; the raw `login_ok` reading
/// does not feed the verdict.
fn leaf_status(snapshot: &RawSnapshot) -> EffectiveStatus {
    EffectiveStatus {
        gateway: true,
        host: true,
        storage: snapshot.storage_healthy,
        login: true,
        video: snapshot.video_normal,
    }
}

/// Stateless evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusEvaluator;

impl StatusEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Map a raw snapshot to its attributed status and single root cause
    pub fn evaluate(&self, snapshot: &RawSnapshot) -> Evaluation {
        evaluate(snapshot)
    }
}

/// Map a raw snapshot to its attributed status and single root cause
pub fn evaluate(snapshot: &RawSnapshot) -> Evaluation {
    let status = DEPENDENCY_GUARDS
        .iter()
        .find_map(|guard| guard(snapshot))
        .unwrap_or_else(|| leaf_status(snapshot));

    Evaluation {
        status,
        category: status.root_cause(),
    }
}
