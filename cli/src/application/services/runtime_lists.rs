//! Application service: deduplicated runtime list queries.
//!
//! Concurrent requests for the same list share one engine invocation. The
//! shared slot is cleared once the invocation settles, so the next request
//! after completion starts fresh.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures_util::FutureExt;
use futures_util::future::{LocalBoxFuture, Shared};

use crate::application::ports::ContainerEngine;
use crate::application::services::engine_session::{EngineSession, RuntimeList};
use crate::domain::engine::{ContainerInfo, ImageInfo, VolumeInfo};

/// At most one in-flight future per slot.
pub struct Inflight<T: Clone> {
    slot: RefCell<Option<(u64, Shared<LocalBoxFuture<'static, T>>)>>,
    generation: Cell<u64>,
}

impl<T: Clone> Default for Inflight<T> {
    fn default() -> Self {
        Self {
            slot: RefCell::new(None),
            generation: Cell::new(0),
        }
    }
}

impl<T: Clone + 'static> Inflight<T> {
    /// Join the in-flight future if there is one, otherwise start a new one
    /// with `start`.
    pub async fn get_or_start(&self, start: impl FnOnce() -> LocalBoxFuture<'static, T>) -> T {
        let (generation, future) = {
            let mut slot = self.slot.borrow_mut();
            match slot.as_ref() {
                Some((generation, future)) => (*generation, future.clone()),
                None => {
                    let generation = self.generation.get() + 1;
                    self.generation.set(generation);
                    let future = start().shared();
                    *slot = Some((generation, future.clone()));
                    (generation, future)
                }
            }
        };
        let value = future.await;
        let mut slot = self.slot.borrow_mut();
        if slot.as_ref().is_some_and(|(g, _)| *g == generation) {
            *slot = None;
        }
        value
    }

    /// Whether a request is currently outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

/// Image, container, and volume lists over one engine session.
///
/// Share one instance between every caller that lists resources; overlapping
/// calls for the same kind then run a single engine command. `a0 engine`
/// makes one call per process, so the sharing only matters to embedders.
pub struct RuntimeLists<E: ContainerEngine + 'static> {
    session: Rc<EngineSession<E>>,
    images: Inflight<RuntimeList<ImageInfo>>,
    containers: Inflight<RuntimeList<ContainerInfo>>,
    volumes: Inflight<RuntimeList<VolumeInfo>>,
}

impl<E: ContainerEngine + 'static> RuntimeLists<E> {
    pub fn new(session: Rc<EngineSession<E>>) -> Self {
        Self {
            session,
            images: Inflight::default(),
            containers: Inflight::default(),
            volumes: Inflight::default(),
        }
    }

    pub async fn images(&self) -> RuntimeList<ImageInfo> {
        let session = Rc::clone(&self.session);
        self.images
            .get_or_start(move || async move { session.list_images().await }.boxed_local())
            .await
    }

    pub async fn containers(&self) -> RuntimeList<ContainerInfo> {
        let session = Rc::clone(&self.session);
        self.containers
            .get_or_start(move || async move { session.list_containers().await }.boxed_local())
            .await
    }

    pub async fn volumes(&self) -> RuntimeList<VolumeInfo> {
        let session = Rc::clone(&self.session);
        self.volumes
            .get_or_start(move || async move { session.list_volumes().await }.boxed_local())
            .await
    }
}
