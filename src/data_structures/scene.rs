//! The scene host: what is currently loaded and ready to be drawn.
//!
//! A [`Scene`] owns at most one model node and at most one environment map.
//! Both arrive asynchronously and in any order through [`Scene::apply`]; the
//! [`LoadJoin`] inside the scene records every outcome and decides when the
//! scene is [`Phase::Ready`].
//!
//! The scene is generic over its payloads so the bookkeeping can be used with
//! plain values. The viewer itself uses the defaults, [`Model`] and
//! [`EnvironmentMap`].

use crate::{
    data_structures::{model::Model, tilt::Tilt},
    resources::{AssetKind, LoadError, environment::EnvironmentMap},
};

/// The loaded model together with the only attribute mutated after loading.
#[derive(Debug)]
pub struct ModelNode<M> {
    pub model: M,
    pub tilt: Tilt,
}

impl<M> ModelNode<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            tilt: Tilt::ZERO,
        }
    }
}

/// A successfully loaded asset.
#[derive(Debug)]
pub enum Loaded<M, E> {
    Model(M),
    Environment(E),
}

impl<M, E> Loaded<M, E> {
    pub fn kind(&self) -> AssetKind {
        match self {
            Loaded::Model(_) => AssetKind::Model,
            Loaded::Environment(_) => AssetKind::Environment,
        }
    }
}

/// The single result every asset load produces.
pub type LoadOutcome<M, E> = Result<Loaded<M, E>, LoadError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// At least one asset has not arrived (or failed to).
    Loading,
    /// Model and environment are both available.
    Ready,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settled {
    Succeeded,
    Failed,
}

/// Join over the two asset loads.
///
/// Each kind settles exactly once. `Ready` needs both to have succeeded; a
/// failed load keeps the join short of `Ready` for good since loads are never
/// retried.
#[derive(Clone, Debug, Default)]
pub struct LoadJoin {
    model: Option<Settled>,
    environment: Option<Settled>,
}

impl LoadJoin {
    fn slot(&mut self, kind: AssetKind) -> &mut Option<Settled> {
        match kind {
            AssetKind::Model => &mut self.model,
            AssetKind::Environment => &mut self.environment,
        }
    }

    /// Records an outcome. Returns `false` if `kind` had already settled, in
    /// which case nothing changes.
    pub fn record(&mut self, kind: AssetKind, settled: Settled) -> bool {
        let slot = self.slot(kind);
        if slot.is_some() {
            return false;
        }
        *slot = Some(settled);
        true
    }

    pub fn get(&self, kind: AssetKind) -> Option<Settled> {
        match kind {
            AssetKind::Model => self.model,
            AssetKind::Environment => self.environment,
        }
    }

    pub fn phase(&self) -> Phase {
        match (self.model, self.environment) {
            (Some(Settled::Succeeded), Some(Settled::Succeeded)) => Phase::Ready,
            _ => Phase::Loading,
        }
    }

    /// Whether every load has finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        self.model.is_some() && self.environment.is_some()
    }

    pub fn pending(&self) -> Vec<AssetKind> {
        [AssetKind::Model, AssetKind::Environment]
            .into_iter()
            .filter(|kind| self.get(*kind).is_none())
            .collect()
    }
}

#[derive(Debug)]
pub struct Scene<M = Model, E = EnvironmentMap> {
    model: Option<ModelNode<M>>,
    environment: Option<E>,
    loads: LoadJoin,
}

impl<M, E> Default for Scene<M, E> {
    fn default() -> Self {
        Self {
            model: None,
            environment: None,
            loads: LoadJoin::default(),
        }
    }
}

impl<M, E> Scene<M, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> Option<&ModelNode<M>> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut ModelNode<M>> {
        self.model.as_mut()
    }

    pub fn environment(&self) -> Option<&E> {
        self.environment.as_ref()
    }

    pub fn loads(&self) -> &LoadJoin {
        &self.loads
    }

    pub fn phase(&self) -> Phase {
        self.loads.phase()
    }

    /// Nothing to draw yet.
    pub fn is_empty(&self) -> bool {
        self.model.is_none() && self.environment.is_none()
    }

    /// Applies one load outcome and returns the resulting phase.
    ///
    /// Failures are logged and leave the scene rendering without that asset.
    /// A second outcome for an already settled kind is ignored.
    pub fn apply(&mut self, outcome: LoadOutcome<M, E>) -> Phase {
        let kind = match &outcome {
            Ok(loaded) => loaded.kind(),
            Err(e) => e.kind,
        };
        let settled = match &outcome {
            Ok(_) => Settled::Succeeded,
            Err(_) => Settled::Failed,
        };
        if !self.loads.record(kind, settled) {
            log::warn!("{kind} already settled, ignoring another load result");
            return self.phase();
        }

        match outcome {
            Ok(Loaded::Model(model)) => {
                log::info!("{kind} loaded");
                self.model = Some(ModelNode::new(model));
            }
            Ok(Loaded::Environment(environment)) => {
                log::info!("{kind} loaded");
                self.environment = Some(environment);
            }
            Err(e) => {
                log::error!("{:#}", anyhow::Error::new(e));
            }
        }

        let phase = self.phase();
        if phase == Phase::Ready {
            log::info!("scene ready");
        } else if self.loads.is_settled() {
            log::warn!("all loads settled, rendering without the failed assets");
        }
        phase
    }
}
